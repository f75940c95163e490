//! Execution stepper: the Play/Next/Previous/Stop state machine
//!
//! ```text
//!            Play                 Next (no next statement)
//!   Idle ───────────▶ AtBreak ─────────────────────────────▶ Finished
//!    ▲  (empty: Finished)  │ ▲                                   │
//!    │                     │ │ Previous                          │
//!    │          Resume     ▼ │                                   │
//!    │                   Running ── tick at end ────────────────▶│
//!    └──────────────── Stop (from any state) ◀───────────────────┘
//! ```
//!
//! Each command is a separate transition function. Expected conditions are
//! reported as a [`StepSignal`], never as an error: hitting either end of the
//! program, playing an empty program, or issuing a command the current state
//! does not accept.
//!
//! The engine is called synchronously and hands back one complete
//! [`DeltaBatch`] per move, which the outcome carries to the caller.

pub mod engine;
pub mod trace;

use crate::graph::DeltaBatch;
use engine::ExecutionEngine;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    Idle,
    /// Auto-play: every tick executes the next statement
    Running,
    AtBreak,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    Play,
    Next,
    Previous,
    Stop,
    Resume,
    Pause,
}

/// Non-error conditions a command can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSignal {
    /// No further statement in that direction; the line did not move
    Boundary(Direction),
    /// Play found nothing to execute
    EmptyProgram,
    /// The command does not apply in the current state
    Rejected {
        command: StepCommand,
        state: StepperState,
    },
}

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: StepperState,
    /// New current line, only when execution moved
    pub line: Option<usize>,
    /// Graph changes for this move
    pub batch: Option<DeltaBatch>,
    pub signal: Option<StepSignal>,
}

impl StepOutcome {
    fn moved(state: StepperState, batch: DeltaBatch) -> Self {
        StepOutcome {
            state,
            line: Some(batch.new_line),
            batch: Some(batch),
            signal: None,
        }
    }

    fn still(state: StepperState, signal: Option<StepSignal>) -> Self {
        StepOutcome {
            state,
            line: None,
            batch: None,
            signal,
        }
    }
}

pub struct ExecutionStepper {
    engine: Box<dyn ExecutionEngine>,
    state: StepperState,
    line: Option<usize>,
}

impl ExecutionStepper {
    pub fn new(engine: Box<dyn ExecutionEngine>) -> Self {
        ExecutionStepper {
            engine,
            state: StepperState::Idle,
            line: None,
        }
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    /// Line execution is stopped at, `None` when idle or the program is empty
    pub fn current_line(&self) -> Option<usize> {
        self.line
    }

    pub fn engine(&self) -> &dyn ExecutionEngine {
        self.engine.as_ref()
    }

    pub fn dispatch(&mut self, command: StepCommand) -> StepOutcome {
        match command {
            StepCommand::Play => self.play(),
            StepCommand::Next => self.next(),
            StepCommand::Previous => self.previous(),
            StepCommand::Stop => self.stop(),
            StepCommand::Resume => self.resume(),
            StepCommand::Pause => self.pause(),
        }
    }

    /// Start from the first statement. Accepted when idle or finished.
    pub fn play(&mut self) -> StepOutcome {
        if !matches!(self.state, StepperState::Idle | StepperState::Finished) {
            return self.reject(StepCommand::Play);
        }
        match self.engine.reset() {
            Some(batch) => {
                self.line = Some(batch.new_line);
                self.transition(StepperState::AtBreak);
                StepOutcome::moved(self.state, batch)
            }
            None => {
                self.line = None;
                self.transition(StepperState::Finished);
                StepOutcome::still(self.state, Some(StepSignal::EmptyProgram))
            }
        }
    }

    /// Execute one statement
    pub fn next(&mut self) -> StepOutcome {
        match self.state {
            StepperState::Running => {
                self.transition(StepperState::AtBreak);
                self.forward()
            }
            StepperState::AtBreak => self.forward(),
            StepperState::Finished => {
                StepOutcome::still(self.state, Some(StepSignal::Boundary(Direction::Forward)))
            }
            StepperState::Idle => self.reject(StepCommand::Next),
        }
    }

    /// Undo one statement; also steps back out of `Finished`
    pub fn previous(&mut self) -> StepOutcome {
        match self.state {
            StepperState::Running => {
                self.transition(StepperState::AtBreak);
                self.backward()
            }
            StepperState::AtBreak | StepperState::Finished if self.line.is_some() => {
                self.backward()
            }
            _ => self.reject(StepCommand::Previous),
        }
    }

    /// Halt from any state. Nothing in flight survives.
    pub fn stop(&mut self) -> StepOutcome {
        self.engine.halt();
        self.line = None;
        self.transition(StepperState::Idle);
        StepOutcome::still(self.state, None)
    }

    /// Enter auto-play
    pub fn resume(&mut self) -> StepOutcome {
        if self.state != StepperState::AtBreak {
            return self.reject(StepCommand::Resume);
        }
        self.transition(StepperState::Running);
        StepOutcome::still(self.state, None)
    }

    /// Leave auto-play
    pub fn pause(&mut self) -> StepOutcome {
        if self.state != StepperState::Running {
            return self.reject(StepCommand::Pause);
        }
        self.transition(StepperState::AtBreak);
        StepOutcome::still(self.state, None)
    }

    /// One auto-play step; `None` unless running
    pub fn tick(&mut self) -> Option<StepOutcome> {
        if self.state != StepperState::Running {
            return None;
        }
        match self.engine.step_forward() {
            Some(batch) => {
                self.line = Some(batch.new_line);
                Some(StepOutcome::moved(self.state, batch))
            }
            None => {
                self.transition(StepperState::Finished);
                Some(StepOutcome::still(
                    self.state,
                    Some(StepSignal::Boundary(Direction::Forward)),
                ))
            }
        }
    }

    fn forward(&mut self) -> StepOutcome {
        match self.engine.step_forward() {
            Some(batch) => {
                self.line = Some(batch.new_line);
                StepOutcome::moved(self.state, batch)
            }
            None => {
                self.transition(StepperState::Finished);
                StepOutcome::still(self.state, Some(StepSignal::Boundary(Direction::Forward)))
            }
        }
    }

    fn backward(&mut self) -> StepOutcome {
        match self.engine.step_backward() {
            Some(batch) => {
                self.line = Some(batch.new_line);
                self.transition(StepperState::AtBreak);
                StepOutcome::moved(self.state, batch)
            }
            None => StepOutcome::still(self.state, Some(StepSignal::Boundary(Direction::Backward))),
        }
    }

    fn reject(&self, command: StepCommand) -> StepOutcome {
        debug!(?command, state = ?self.state, "command rejected");
        StepOutcome::still(
            self.state,
            Some(StepSignal::Rejected {
                command,
                state: self.state,
            }),
        )
    }

    fn transition(&mut self, to: StepperState) {
        if self.state != to {
            info!(from = ?self.state, ?to, line = ?self.line, "stepper state changed");
            self.state = to;
        }
    }
}
