//! Main TUI application state and event loop

use crate::editor::completion::Completer;
use crate::editor::SourceView;
use crate::graph::{Address, Point, VariableKey};
use crate::session::Session;
use crate::stepper::{Direction, StepCommand, StepOutcome, StepSignal, StepperState};
use crate::ui::panes::{self, GraphRenderData, StatusRenderData};
use crate::ui::search::{PromptAction, SearchPrompt};
use crate::ui::theme::Theme;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

/// Hit-test slack around arrows, in cells
const CLICK_TOLERANCE: f64 = 0.75;

const ZOOM_STEP: f64 = 1.25;
const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 4.0;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Graph,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Graph,
            FocusedPane::Graph => FocusedPane::Source,
        }
    }
}

pub struct App {
    session: Session,
    view: SourceView,
    completer: Completer,
    theme: Theme,
    play_interval: Duration,

    focused_pane: FocusedPane,
    selected_struct: Option<Address>,
    selected_variable: Option<VariableKey>,
    /// Graph point at the top-left of the graph pane
    pan: Point,
    zoom: f64,
    /// Inner graph area from the last frame, for mouse mapping
    graph_area: Option<Rect>,

    search: Option<SearchPrompt>,
    search_hit: Option<usize>,

    status_message: String,
    status_is_error: bool,
    blocked: Option<Direction>,
    should_quit: bool,
    last_play_time: Instant,
    last_space_press: Instant,
}

impl App {
    pub fn new(
        session: Session,
        view: SourceView,
        completer: Completer,
        theme: Theme,
        play_interval: Duration,
    ) -> Self {
        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .unwrap_or_else(Instant::now);
        App {
            session,
            view,
            completer,
            theme,
            play_interval,
            focused_pane: FocusedPane::Source,
            selected_struct: None,
            selected_variable: None,
            pan: Point::default(),
            zoom: 1.0,
            graph_area: None,
            search: None,
            search_hit: None,
            status_message: String::from("Press p to play"),
            status_is_error: false,
            blocked: None,
            should_quit: false,
            last_play_time: long_ago,
            last_space_press: long_ago,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &SourceView {
        &self.view
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.session.state() == StepperState::Running
                && self.last_play_time.elapsed() >= self.play_interval
            {
                self.last_play_time = Instant::now();
                let result = self.session.tick(&mut self.view);
                match result {
                    Ok(Some(outcome)) => self.report(StepCommand::Next, outcome),
                    Ok(None) => {}
                    Err(err) => self.show_error(format!("Bad step: {}", err)),
                }
            }

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
                    Event::Mouse(mouse) => self.handle_mouse_event(mouse),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(main_chunks[0]);

        panes::render_source_pane(
            frame,
            columns[0],
            &mut self.view,
            self.search_hit,
            self.focused_pane == FocusedPane::Source,
            &self.theme,
        );

        let data = GraphRenderData {
            graph: self.session.graph(),
            selected_struct: self.selected_struct,
            selected_variable: self.selected_variable.as_ref(),
            pan: self.pan,
            zoom: self.zoom,
            is_focused: self.focused_pane == FocusedPane::Graph,
        };
        self.graph_area = Some(panes::render_graph_pane(frame, columns[1], &data, &self.theme));

        match &self.search {
            Some(prompt) => {
                let completions = prompt.completions(&self.completer);
                panes::render_search_prompt(
                    frame,
                    main_chunks[1],
                    prompt.input(),
                    &completions,
                    prompt.selected(),
                    &self.theme,
                );
            }
            None => {
                let engine = self.session.stepper().engine();
                let status = StatusRenderData {
                    message: &self.status_message,
                    state: self.session.state(),
                    position: engine.position(),
                    total_steps: engine.total_steps(),
                    blocked: self.blocked,
                    is_error: self.status_is_error,
                };
                panes::render_status_bar(frame, main_chunks[1], &status, &self.theme);
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.search.is_some() {
            self.handle_search_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('p') => self.command(StepCommand::Play),
            KeyCode::Char('n') => self.command(StepCommand::Next),
            KeyCode::Char('b') => self.command(StepCommand::Previous),
            KeyCode::Char('s') => self.command(StepCommand::Stop),
            KeyCode::Char(' ') => self.toggle_auto_play(),
            KeyCode::Char('/') => self.search = Some(SearchPrompt::default()),
            KeyCode::Esc => self.search_hit = None,
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::Char('[') => self.cycle_variable(false),
            KeyCode::Char(']') => self.cycle_variable(true),
            KeyCode::Char(c @ ('H' | 'J' | 'K' | 'L')) => {
                let (dx, dy) = direction_delta(c.to_ascii_lowercase());
                self.pan = self.pan.offset(dx * 4.0 / self.zoom, dy * 2.0 / self.zoom);
            }
            KeyCode::Char('+' | '=') => self.zoom_by(ZOOM_STEP),
            KeyCode::Char('-') => self.zoom_by(1.0 / ZOOM_STEP),
            KeyCode::Char('0') => self.set_zoom(1.0),
            KeyCode::Char('f') => self.fit_view(),
            code => match self.focused_pane {
                FocusedPane::Graph => self.handle_graph_key(code),
                FocusedPane::Source => self.handle_source_key(code),
            },
        }
    }

    fn handle_source_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left => self.command(StepCommand::Previous),
            KeyCode::Right => self.command(StepCommand::Next),
            KeyCode::Up | KeyCode::Char('k') => {
                // Scrolling up makes the current line move down visually
                if let Some(row) = self.view.scroll().target_row {
                    self.view.set_target_row(row.saturating_add(1));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(row) = self.view.scroll().target_row {
                    self.view.set_target_row(row.saturating_sub(1));
                }
            }
            _ => {}
        }
    }

    fn handle_graph_key(&mut self, code: KeyCode) {
        let c = match code {
            KeyCode::Left => 'h',
            KeyCode::Down => 'j',
            KeyCode::Up => 'k',
            KeyCode::Right => 'l',
            KeyCode::Char(c @ ('h' | 'j' | 'k' | 'l')) => c,
            _ => return,
        };
        let Some(address) = self.selected_struct.or_else(|| {
            self.session.graph().structs().next().map(|s| s.address())
        }) else {
            return;
        };
        self.selected_struct = Some(address);
        let (dx, dy) = direction_delta(c);
        if let Some(node) = self.session.graph().resolve(address) {
            // Cells are about twice as tall as they are wide
            let to = node.position().offset(dx * 2.0, dy);
            self.session.graph_mut().move_struct(address, to);
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.search.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.search = None,
            KeyCode::Char(c) => prompt.type_char(c),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Up => prompt.move_selection(&self.completer, false),
            KeyCode::Down => prompt.move_selection(&self.completer, true),
            KeyCode::Tab => {
                prompt.accept(&self.completer);
            }
            KeyCode::Enter => match prompt.enter(&self.completer) {
                PromptAction::Editing => {}
                PromptAction::Cancel => self.search = None,
                PromptAction::Submit(word) => {
                    self.search = None;
                    self.find(&word);
                }
            },
            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(inner) = self.graph_area else {
            return;
        };
        let Some(point) = panes::cell_to_graph(inner, self.pan, self.zoom, mouse.column, mouse.row)
        else {
            return;
        };
        self.focused_pane = FocusedPane::Graph;
        let graph = self.session.graph();
        if let Some(var) = graph.variable_at(point, CLICK_TOLERANCE) {
            self.selected_variable = Some(var.key().clone());
            self.status_message = describe_variable(var);
            self.status_is_error = false;
        } else if let Some(node) = graph.struct_at(point) {
            self.selected_struct = Some(node.address());
            self.status_message = format!("Selected {}", node.header_text());
            self.status_is_error = false;
        } else {
            self.selected_struct = None;
            self.selected_variable = None;
        }
    }

    fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    /// Change the zoom keeping the centre of the graph pane in place
    fn set_zoom(&mut self, zoom: f64) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if let Some(inner) = self.graph_area {
            let (half_w, half_h) = (inner.width as f64 / 2.0, inner.height as f64 / 2.0);
            let centre = self.pan.offset(half_w / self.zoom, half_h / self.zoom);
            self.pan = centre.offset(-half_w / zoom, -half_h / zoom);
        }
        self.zoom = zoom;
        self.status_message = format!("Zoom {:.0}%", self.zoom * 100.0);
        self.status_is_error = false;
    }

    /// Pan and zoom so every struct and arrow is on screen
    fn fit_view(&mut self) {
        let Some(extent) = self.session.graph().extent() else {
            self.pan = Point::default();
            self.zoom = 1.0;
            return;
        };
        if let Some(inner) = self.graph_area {
            let fit_w = inner.width.max(1) as f64 / (extent.width + 2.0);
            let fit_h = inner.height.max(1) as f64 / (extent.height + 2.0);
            self.zoom = fit_w.min(fit_h).clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.pan = Point::new(extent.x - 1.0, extent.y - 1.0);
        self.status_message = format!("Zoom {:.0}%", self.zoom * 100.0);
        self.status_is_error = false;
    }

    fn find(&mut self, word: &str) {
        let from = self.search_hit.or(self.view.current_line()).map_or(1, |l| l + 1);
        match self.view.find_identifier(word, from) {
            Some(line) => {
                self.search_hit = Some(line);
                self.status_message = format!("'{}' on line {}", word, line);
                self.status_is_error = false;
            }
            None => self.show_error(format!("'{}' not found", word)),
        }
    }

    fn toggle_auto_play(&mut self) {
        // Debounce key repeat
        if self.last_space_press.elapsed() < Duration::from_millis(200) {
            return;
        }
        self.last_space_press = Instant::now();
        match self.session.state() {
            StepperState::Running => self.command(StepCommand::Pause),
            StepperState::AtBreak => self.command(StepCommand::Resume),
            StepperState::Idle | StepperState::Finished => {
                self.command(StepCommand::Play);
                if self.session.state() == StepperState::AtBreak {
                    self.command(StepCommand::Resume);
                }
            }
        }
        self.last_play_time = Instant::now();
    }

    fn cycle_variable(&mut self, forward: bool) {
        let keys: Vec<&VariableKey> = self.session.graph().variables().map(|v| v.key()).collect();
        if keys.is_empty() {
            self.selected_variable = None;
            return;
        }
        let current = self
            .selected_variable
            .as_ref()
            .and_then(|sel| keys.iter().position(|k| *k == sel));
        let index = match (current, forward) {
            (Some(i), true) => (i + 1) % keys.len(),
            (Some(i), false) => (i + keys.len() - 1) % keys.len(),
            (None, true) => 0,
            (None, false) => keys.len() - 1,
        };
        let key = keys[index].clone();
        if let Some(var) = self.session.graph().variable(&key) {
            self.status_message = describe_variable(var);
            self.status_is_error = false;
        }
        self.selected_variable = Some(key);
    }

    fn command(&mut self, command: StepCommand) {
        let result = self.session.command(command, &mut self.view);
        match result {
            Ok(outcome) => self.report(command, outcome),
            Err(err) => self.show_error(format!("Bad step: {}", err)),
        }
        self.search_hit = None;
        self.prune_selection();
    }

    fn report(&mut self, command: StepCommand, outcome: StepOutcome) {
        debug!(?command, state = ?outcome.state, line = ?outcome.line, "step outcome");
        self.status_is_error = false;
        self.blocked = match outcome.signal {
            Some(StepSignal::Boundary(direction)) => Some(direction),
            _ => None,
        };
        self.status_message = match (outcome.signal, outcome.line) {
            (Some(StepSignal::Boundary(Direction::Forward)), _) => "Reached the end".to_string(),
            (Some(StepSignal::Boundary(Direction::Backward)), _) => {
                "Already at the first statement".to_string()
            }
            (Some(StepSignal::EmptyProgram), _) => "Nothing to run".to_string(),
            (Some(StepSignal::Rejected { command, state }), _) => {
                format!("Cannot {:?} while {:?}", command, state)
            }
            (None, Some(line)) => {
                let redrawn = self
                    .session
                    .last_report()
                    .map_or(0, |report| report.redrawn.len());
                format!("Line {} ({} arrows redrawn)", line, redrawn)
            }
            (None, None) => match command {
                StepCommand::Stop => "Stopped".to_string(),
                StepCommand::Resume => "Playing...".to_string(),
                StepCommand::Pause => "Paused".to_string(),
                _ => String::new(),
            },
        };
        if matches!(outcome.signal, Some(StepSignal::Rejected { .. })) {
            self.status_is_error = true;
        }
    }

    fn show_error(&mut self, message: String) {
        self.status_message = message;
        self.status_is_error = true;
    }

    fn prune_selection(&mut self) {
        let graph = self.session.graph();
        if self.selected_struct.is_some_and(|a| graph.resolve(a).is_none()) {
            self.selected_struct = None;
        }
        if self
            .selected_variable
            .as_ref()
            .is_some_and(|k| graph.variable(k).is_none())
        {
            self.selected_variable = None;
        }
    }
}

fn direction_delta(c: char) -> (f64, f64) {
    match c {
        'h' => (-1.0, 0.0),
        'j' => (0.0, 1.0),
        'k' => (0.0, -1.0),
        _ => (1.0, 0.0),
    }
}

fn describe_variable(var: &crate::graph::Variable) -> String {
    match (var.target(), var.raw_address()) {
        (Some(target), _) => format!("{} -> {}", var.key(), target),
        (None, Some(raw)) => format!("{} -> {} (dangling)", var.key(), raw),
        (None, None) => format!("{} -> NULL", var.key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::completion::WordList;
    use crate::graph::{Field, LayoutConfig, StructSpec, VariableUpdate};
    use crate::snapshot::Snapshot;
    use crate::stepper::engine::TraceEngine;
    use crate::stepper::trace::Trace;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let node = StructSpec::new(
            Address(0x10),
            "struct node",
            vec![Field::pointer("next", "struct node *", None)],
        );
        let steps = vec![
            Snapshot {
                line: 1,
                structs: Vec::new(),
                variables: vec![VariableUpdate::new(None, "head", None)],
            },
            Snapshot {
                line: 2,
                structs: vec![node],
                variables: vec![VariableUpdate::new(None, "head", Some(Address(0x10)))],
            },
        ];
        let engine = TraceEngine::new(Trace { source: None, steps }, 1 << 20).unwrap();
        let session = Session::new(Box::new(engine), LayoutConfig::default(), 16);
        App::new(
            session,
            SourceView::new("struct node *head = NULL;\nhead = malloc(sizeof(struct node));\n"),
            Completer::new(WordList::parse("head\nmalloc"), 10),
            Theme::default(),
            Duration::from_millis(10),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_keys_drive_stepper() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.view().current_line(), Some(1));
        press(&mut app, KeyCode::Right);
        assert_eq!(app.view().current_line(), Some(2));
        assert_eq!(app.session().graph().registry().len(), 1);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.status_message(), "Reached the end");
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.view().current_line(), Some(1));
        assert!(app.session().graph().registry().is_empty());
    }

    #[test]
    fn test_graph_keys_move_struct() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Tab);
        let before = app.session().graph().resolve(Address(0x10)).unwrap().position();
        press(&mut app, KeyCode::Char('l'));
        let after = app.session().graph().resolve(Address(0x10)).unwrap().position();
        assert_eq!(after.x, before.x + 2.0);
        assert_eq!(app.session().graph().check_consistency(), Ok(()));
    }

    #[test]
    fn test_search_jumps_to_line() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        for c in "mal".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.search_hit, Some(2));
        assert!(app.search.is_none());
    }

    #[test]
    fn test_cycle_variable_selects() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.selected_variable, Some(VariableKey::free("head")));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.selected_variable, None);
    }

    #[test]
    fn test_zoom_keys_clamp_and_reset() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.zoom, 1.25);
        assert_eq!(app.status_message(), "Zoom 125%");
        for _ in 0..20 {
            press(&mut app, KeyCode::Char('='));
        }
        assert_eq!(app.zoom, MAX_ZOOM);
        for _ in 0..40 {
            press(&mut app, KeyCode::Char('-'));
        }
        assert_eq!(app.zoom, MIN_ZOOM);
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.zoom, 1.0);
    }

    #[test]
    fn test_zoom_keeps_pane_centre() {
        let mut app = app();
        app.graph_area = Some(Rect::new(0, 0, 40, 20));
        press(&mut app, KeyCode::Char('0'));
        app.set_zoom(2.0);
        // centre (20, 10) stays put: 20 - 20 / 2, 10 - 10 / 2
        assert_eq!(app.pan, Point::new(10.0, 5.0));
        let centre = panes::cell_to_graph(Rect::new(0, 0, 40, 20), app.pan, app.zoom, 20, 10);
        assert_eq!(centre, Some(Point::new(20.25, 10.25)));
    }

    #[test]
    fn test_fit_view_frames_the_graph() {
        let mut app = app();
        app.graph_area = Some(Rect::new(0, 0, 200, 100));
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('n'));
        let extent = app.session().graph().extent().unwrap();

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.pan, Point::new(extent.x - 1.0, extent.y - 1.0));
        assert!(app.zoom <= MAX_ZOOM && app.zoom >= MIN_ZOOM);
        let inner = app.graph_area.unwrap();
        assert!((extent.width + 2.0) * app.zoom <= inner.width as f64 + 1e-9);
        assert!((extent.height + 2.0) * app.zoom <= inner.height as f64 + 1e-9);
    }
}
