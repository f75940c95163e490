// Integration tests for loading traces from disk and replaying the bundled demo

use std::fs;
use std::path::{Path, PathBuf};
use structed::editor::SourceView;
use structed::graph::{Address, LayoutConfig, StructGraph, VariableKey};
use structed::logging;
use structed::session::Session;
use structed::stepper::engine::TraceEngine;
use structed::stepper::trace::{Trace, TraceError};
use structed::stepper::{Direction, StepCommand, StepSignal, StepperState};
use tempfile::TempDir;

fn demo_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/list.json")
}

fn demo_session() -> (Session, SourceView) {
    logging::ensure_test_logging();
    let path = demo_path();
    let trace = Trace::load(&path).expect("demo trace loads");
    let source_path = trace.source_path(&path).expect("demo names its source");
    let source = fs::read_to_string(source_path).expect("demo source exists");
    let engine = TraceEngine::new(trace, 1 << 20).expect("demo fits");
    (
        Session::new(Box::new(engine), LayoutConfig::default(), 16),
        SourceView::new(&source),
    )
}

/// Structs and pointer targets, order-independent
fn state_of(graph: &StructGraph) -> (Vec<Address>, Vec<(String, Option<Address>)>) {
    let mut structs: Vec<Address> = graph.structs().map(|s| s.address()).collect();
    structs.sort();
    let mut targets: Vec<(String, Option<Address>)> = graph
        .variables()
        .map(|v| (v.key().to_string(), v.target()))
        .collect();
    targets.sort();
    (structs, targets)
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.json");
    fs::write(
        &path,
        r#"{"source": "prog.c", "steps": [{"line": 1}, {"line": 2}]}"#,
    )
    .unwrap();

    let trace = Trace::load(&path).unwrap();
    assert_eq!(trace.steps.len(), 2);
    assert_eq!(trace.source_path(&path), Some(dir.path().join("prog.c")));
}

#[test]
fn test_absolute_source_is_kept() {
    let trace = Trace {
        source: Some(PathBuf::from("/abs/prog.c")),
        steps: Vec::new(),
    };
    assert_eq!(
        trace.source_path(Path::new("/elsewhere/run.json")),
        Some(PathBuf::from("/abs/prog.c"))
    );
    assert_eq!(Trace::default().source_path(Path::new("run.json")), None);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Trace::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, TraceError::Io { .. }));
}

#[test]
fn test_malformed_json_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ steps: ").unwrap();
    assert!(matches!(Trace::load(&path), Err(TraceError::Json(_))));
}

#[test]
fn test_step_with_dead_owner_is_rejected() {
    let err = Trace::parse(
        r#"{"steps": [{"line": 1, "variables": [{"owner": "0x10", "label": "next", "target": null}]}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, TraceError::InvalidStep { step: 0, .. }));
}

#[test]
fn test_snapshot_limit_is_enforced() {
    let trace = Trace::parse(r#"{"steps": [{"line": 1}, {"line": 2}, {"line": 3}]}"#).unwrap();
    let err = TraceEngine::new(trace, 16).unwrap_err();
    assert!(matches!(err, TraceError::Snapshot(_)));
}

#[test]
fn test_demo_walks_forward_and_back_exactly() {
    let (mut session, mut view) = demo_session();
    session.command(StepCommand::Play, &mut view).unwrap();

    let mut forward = vec![state_of(session.graph())];
    loop {
        let out = session.command(StepCommand::Next, &mut view).unwrap();
        session.graph().check_consistency().unwrap();
        if out.signal.is_some() {
            break;
        }
        forward.push(state_of(session.graph()));
    }
    assert_eq!(session.state(), StepperState::Finished);
    assert_eq!(forward.len(), 14);
    assert_eq!(view.current_line(), Some(22));

    let mut backward = vec![state_of(session.graph())];
    loop {
        let out = session.command(StepCommand::Previous, &mut view).unwrap();
        session.graph().check_consistency().unwrap();
        if out.signal.is_some() {
            assert_eq!(out.signal, Some(StepSignal::Boundary(Direction::Backward)));
            break;
        }
        backward.push(state_of(session.graph()));
    }
    backward.reverse();
    assert_eq!(forward, backward);
    assert_eq!(view.current_line(), Some(9));
}

#[test]
fn test_demo_free_leaves_dangling_pointers() {
    let (mut session, mut view) = demo_session();
    session.command(StepCommand::Play, &mut view).unwrap();
    while view.current_line() != Some(19) {
        let out = session.command(StepCommand::Next, &mut view).unwrap();
        assert!(out.signal.is_none(), "demo never reached line 19");
    }

    let graph = session.graph();
    assert!(graph.resolve(Address(0x1020)).is_none());
    let tail = graph.variable(&VariableKey::free("tail")).unwrap();
    assert!(tail.is_dangling());
    assert_eq!(tail.raw_address(), Some(Address(0x1020)));
    let next = graph
        .variable(&VariableKey::field(Address(0x1000), "next"))
        .unwrap();
    assert!(next.is_dangling());

    // Stepping back over the free brings the struct and both arrows back
    session.command(StepCommand::Previous, &mut view).unwrap();
    let graph = session.graph();
    assert!(graph.resolve(Address(0x1020)).is_some());
    assert_eq!(
        graph.variable(&VariableKey::free("tail")).unwrap().target(),
        Some(Address(0x1020))
    );
}
