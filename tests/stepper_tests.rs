// Integration tests for the stepper state machine driving a replayed trace

use structed::editor::SourceView;
use structed::graph::{Address, LayoutConfig, VariableKey};
use structed::session::Session;
use structed::stepper::engine::{ExecutionEngine, TraceEngine};
use structed::stepper::trace::Trace;
use structed::stepper::{Direction, ExecutionStepper, StepCommand, StepSignal, StepperState};

const LIMIT: usize = 1 << 20;

/// Three statements: `p` is declared, then a node is allocated, then `p` points at it
const THREE_STEPS: &str = r#"{
  "steps": [
    { "line": 3, "variables": [{ "label": "p", "target": null }] },
    { "line": 4,
      "structs": [{ "address": "0x10", "type": "struct node", "fields": [] }],
      "variables": [{ "label": "p", "target": null }] },
    { "line": 5,
      "structs": [{ "address": "0x10", "type": "struct node", "fields": [] }],
      "variables": [{ "label": "p", "target": "0x10" }] }
  ]
}"#;

fn engine(text: &str) -> Box<dyn ExecutionEngine> {
    let trace = Trace::parse(text).expect("trace parses");
    Box::new(TraceEngine::new(trace, LIMIT).expect("trace fits"))
}

fn stepper(text: &str) -> ExecutionStepper {
    ExecutionStepper::new(engine(text))
}

fn source() -> SourceView {
    SourceView::new("int main() {\n  struct node *p;\n  p = NULL;\n  n = alloc();\n  p = n;\n}\n")
}

#[test]
fn test_play_stops_at_first_statement() {
    let mut s = stepper(THREE_STEPS);
    assert_eq!(s.state(), StepperState::Idle);
    assert_eq!(s.current_line(), None);

    let out = s.dispatch(StepCommand::Play);
    assert_eq!(out.state, StepperState::AtBreak);
    assert_eq!(out.line, Some(3));
    assert_eq!(s.current_line(), Some(3));
}

#[test]
fn test_empty_program_finishes_immediately() {
    let mut s = stepper(r#"{"steps": []}"#);
    let out = s.dispatch(StepCommand::Play);
    assert_eq!(out.state, StepperState::Finished);
    assert_eq!(out.signal, Some(StepSignal::EmptyProgram));
    assert_eq!(out.line, None);
    assert_eq!(s.current_line(), None);

    let out = s.dispatch(StepCommand::Previous);
    assert!(matches!(out.signal, Some(StepSignal::Rejected { .. })));
}

#[test]
fn test_next_past_last_statement_finishes_without_moving() {
    let mut s = stepper(THREE_STEPS);
    s.dispatch(StepCommand::Play);
    assert_eq!(s.dispatch(StepCommand::Next).line, Some(4));
    assert_eq!(s.dispatch(StepCommand::Next).line, Some(5));

    let out = s.dispatch(StepCommand::Next);
    assert_eq!(out.state, StepperState::Finished);
    assert_eq!(out.signal, Some(StepSignal::Boundary(Direction::Forward)));
    assert_eq!(out.line, None);
    assert_eq!(s.current_line(), Some(5));

    // Repeating keeps reporting the boundary
    let out = s.dispatch(StepCommand::Next);
    assert_eq!(out.signal, Some(StepSignal::Boundary(Direction::Forward)));
}

#[test]
fn test_previous_at_first_statement_is_a_boundary() {
    let mut s = stepper(THREE_STEPS);
    s.dispatch(StepCommand::Play);
    let out = s.dispatch(StepCommand::Previous);
    assert_eq!(out.state, StepperState::AtBreak);
    assert_eq!(out.signal, Some(StepSignal::Boundary(Direction::Backward)));
    assert_eq!(s.current_line(), Some(3));
}

#[test]
fn test_previous_leaves_finished() {
    let mut s = stepper(THREE_STEPS);
    s.dispatch(StepCommand::Play);
    for _ in 0..3 {
        s.dispatch(StepCommand::Next);
    }
    assert_eq!(s.state(), StepperState::Finished);

    let out = s.dispatch(StepCommand::Previous);
    assert_eq!(out.state, StepperState::AtBreak);
    assert_eq!(out.line, Some(4));
}

#[test]
fn test_commands_rejected_while_idle() {
    let mut s = stepper(THREE_STEPS);
    for command in [
        StepCommand::Next,
        StepCommand::Previous,
        StepCommand::Resume,
        StepCommand::Pause,
    ] {
        let out = s.dispatch(command);
        assert_eq!(
            out.signal,
            Some(StepSignal::Rejected {
                command,
                state: StepperState::Idle
            })
        );
        assert_eq!(s.state(), StepperState::Idle);
    }
}

#[test]
fn test_play_rejected_mid_run() {
    let mut s = stepper(THREE_STEPS);
    s.dispatch(StepCommand::Play);
    s.dispatch(StepCommand::Next);
    let out = s.dispatch(StepCommand::Play);
    assert!(matches!(out.signal, Some(StepSignal::Rejected { .. })));
    assert_eq!(s.current_line(), Some(4));
}

#[test]
fn test_stop_from_every_state() {
    let mut s = stepper(THREE_STEPS);
    assert_eq!(s.dispatch(StepCommand::Stop).state, StepperState::Idle);

    s.dispatch(StepCommand::Play);
    assert_eq!(s.dispatch(StepCommand::Stop).state, StepperState::Idle);
    assert_eq!(s.current_line(), None);

    s.dispatch(StepCommand::Play);
    s.dispatch(StepCommand::Resume);
    assert_eq!(s.state(), StepperState::Running);
    assert_eq!(s.dispatch(StepCommand::Stop).state, StepperState::Idle);
    assert!(s.tick().is_none());
    assert_eq!(s.engine().position(), None);
}

#[test]
fn test_auto_play_runs_to_the_end() {
    let mut s = stepper(THREE_STEPS);
    s.dispatch(StepCommand::Play);
    assert!(s.tick().is_none());
    s.dispatch(StepCommand::Resume);

    let lines: Vec<Option<usize>> = std::iter::from_fn(|| s.tick())
        .take(5)
        .map(|out| out.line)
        .collect();
    assert_eq!(lines, vec![Some(4), Some(5), None]);
    assert_eq!(s.state(), StepperState::Finished);
}

#[test]
fn test_next_while_running_pauses() {
    let mut s = stepper(THREE_STEPS);
    s.dispatch(StepCommand::Play);
    s.dispatch(StepCommand::Resume);
    let out = s.dispatch(StepCommand::Next);
    assert_eq!(out.state, StepperState::AtBreak);
    assert_eq!(out.line, Some(4));
}

#[test]
fn test_play_again_after_finishing_restarts() {
    let mut session = Session::new(engine(THREE_STEPS), LayoutConfig::default(), 16);
    let mut view = source();
    session.command(StepCommand::Play, &mut view).unwrap();
    for _ in 0..3 {
        session.command(StepCommand::Next, &mut view).unwrap();
    }
    assert_eq!(session.state(), StepperState::Finished);
    assert!(session.graph().resolve(Address(0x10)).is_some());

    let out = session.command(StepCommand::Play, &mut view).unwrap();
    assert_eq!(out.line, Some(3));
    assert!(session.graph().resolve(Address(0x10)).is_none());
    assert_eq!(view.current_line(), Some(3));
}

#[test]
fn test_session_keeps_graph_and_editor_in_step() {
    structed::logging::ensure_test_logging();
    let mut session = Session::new(engine(THREE_STEPS), LayoutConfig::default(), 16);
    let mut view = source();
    let p = VariableKey::free("p");

    session.command(StepCommand::Play, &mut view).unwrap();
    assert!(session.graph().variable(&p).unwrap().is_dangling());
    assert_eq!(view.current_line(), Some(3));

    session.command(StepCommand::Next, &mut view).unwrap();
    session.command(StepCommand::Next, &mut view).unwrap();
    assert_eq!(view.current_line(), Some(5));
    assert_eq!(
        session.graph().variable(&p).unwrap().target(),
        Some(Address(0x10))
    );

    session.command(StepCommand::Previous, &mut view).unwrap();
    assert_eq!(view.current_line(), Some(4));
    assert_eq!(session.graph().variable(&p).unwrap().target(), None);

    session.command(StepCommand::Stop, &mut view).unwrap();
    assert_eq!(view.current_line(), None);
    assert_eq!(session.graph().variable_count(), 0);
    assert!(session.graph().registry().is_empty());
}

#[test]
fn test_boundary_sets_editor_flags() {
    let mut session = Session::new(engine(THREE_STEPS), LayoutConfig::default(), 16);
    let mut view = source();
    session.command(StepCommand::Play, &mut view).unwrap();
    session.command(StepCommand::Previous, &mut view).unwrap();
    assert!(view.backward_blocked());
    assert_eq!(view.take_boundary(), Some(Direction::Backward));

    session.command(StepCommand::Next, &mut view).unwrap();
    assert!(!view.backward_blocked());
}

#[test]
fn test_owned_variable_survives_struct_field_change() {
    let text = r#"{
      "steps": [
        { "line": 3,
          "structs": [{ "address": "0x10", "type": "struct box",
                        "fields": [{ "name": "v", "type": "int", "value": { "scalar": "1" } }] }],
          "variables": [{ "owner": "0x10", "label": "x", "target": "0x10" }] },
        { "line": 4,
          "structs": [{ "address": "0x10", "type": "struct box",
                        "fields": [{ "name": "v", "type": "int", "value": { "scalar": "2" } }] }],
          "variables": [{ "owner": "0x10", "label": "x", "target": "0x10" }] }
      ]
    }"#;
    let mut session = Session::new(engine(text), LayoutConfig::default(), 16);
    let mut view = source();
    let x = VariableKey::field(Address(0x10), "x");

    session.command(StepCommand::Play, &mut view).unwrap();
    session.command(StepCommand::Next, &mut view).unwrap();
    let var = session.graph().variable(&x).expect("x kept across the field change");
    assert_eq!(var.target(), Some(Address(0x10)));

    session.command(StepCommand::Previous, &mut view).unwrap();
    assert!(session.graph().variable(&x).is_some());
}
