//! A debug session: stepper, graph and editor wired together
//!
//! Every command runs the stepper, applies the resulting batch to the graph and
//! then tells the editor where execution is. The graph is updated before the
//! editor, so a redraw triggered by the line change sees the new graph.

use crate::editor::EditorSync;
use crate::graph::{BatchReport, GraphError, LayoutConfig, StructGraph};
use crate::stepper::engine::ExecutionEngine;
use crate::stepper::{ExecutionStepper, StepCommand, StepOutcome, StepSignal, StepperState};
use tracing::{info, warn};

pub struct Session {
    stepper: ExecutionStepper,
    graph: StructGraph,
    last_report: Option<BatchReport>,
}

impl Session {
    pub fn new(engine: Box<dyn ExecutionEngine>, layout: LayoutConfig, history_capacity: usize) -> Self {
        Session {
            stepper: ExecutionStepper::new(engine),
            graph: StructGraph::new(layout, history_capacity),
            last_report: None,
        }
    }

    pub fn graph(&self) -> &StructGraph {
        &self.graph
    }

    /// For direct manipulation such as dragging a struct
    pub fn graph_mut(&mut self) -> &mut StructGraph {
        &mut self.graph
    }

    pub fn stepper(&self) -> &ExecutionStepper {
        &self.stepper
    }

    pub fn state(&self) -> StepperState {
        self.stepper.state()
    }

    /// Report of the most recently applied batch
    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    /// Run one command and propagate its effects.
    ///
    /// A batch the graph rejects is returned as an error. The stepper has
    /// already moved by then, so the graph is rebuilt from the engine's full
    /// state when it can describe one, and left unchanged otherwise. The editor
    /// is still told the new line.
    pub fn command(
        &mut self,
        command: StepCommand,
        editor: &mut dyn EditorSync,
    ) -> Result<StepOutcome, GraphError> {
        if matches!(command, StepCommand::Play | StepCommand::Stop) && self.accepts(command) {
            self.graph.clear();
            self.last_report = None;
        }
        let outcome = self.stepper.dispatch(command);
        if command == StepCommand::Stop {
            editor.reset();
        }
        self.propagate(outcome, editor)
    }

    /// One auto-play step; `Ok(None)` unless auto-play is on
    pub fn tick(&mut self, editor: &mut dyn EditorSync) -> Result<Option<StepOutcome>, GraphError> {
        match self.stepper.tick() {
            Some(outcome) => self.propagate(outcome, editor).map(Some),
            None => Ok(None),
        }
    }

    fn accepts(&self, command: StepCommand) -> bool {
        match command {
            StepCommand::Play => matches!(self.state(), StepperState::Idle | StepperState::Finished),
            _ => true,
        }
    }

    fn propagate(
        &mut self,
        outcome: StepOutcome,
        editor: &mut dyn EditorSync,
    ) -> Result<StepOutcome, GraphError> {
        let applied = match &outcome.batch {
            Some(batch) => match self.graph.apply_delta(batch) {
                Ok(report) => {
                    self.last_report = Some(report);
                    Ok(())
                }
                Err(err) => {
                    warn!(line = batch.new_line, error = %err, "rejected delta batch");
                    self.resync();
                    Err(err)
                }
            },
            None => Ok(()),
        };

        if let Some(line) = outcome.line {
            editor.line_changed(line);
        }
        if let Some(StepSignal::Boundary(direction)) = outcome.signal {
            editor.boundary_reached(direction);
        }

        applied.map(|()| outcome)
    }

    fn resync(&mut self) {
        let Some(full) = self.stepper.engine().resync() else {
            return;
        };
        self.graph.clear();
        match self.graph.apply_delta(&full) {
            Ok(report) => {
                info!(line = full.new_line, structs = report.created, "graph resynchronised");
                self.last_report = Some(report);
            }
            Err(err) => {
                warn!(line = full.new_line, error = %err, "resync failed, graph left empty");
                self.last_report = None;
            }
        }
    }
}
