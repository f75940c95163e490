//! # Introduction
//!
//! structed steps through a recorded program execution and keeps a live graph
//! of its memory: every struct the program allocates is a box, every pointer an
//! arrow. Stepping backward is as exact as stepping forward.
//!
//! ## Control flow
//!
//! ```text
//! key → ExecutionStepper → ExecutionEngine → DeltaBatch ─┬→ StructGraph (apply, redraw arrows)
//!                                                        └→ EditorSync  (move the current line)
//! ```
//!
//! 1. [`stepper`]: the Play/Next/Previous/Stop state machine and the
//!    [`stepper::engine::ExecutionEngine`] it drives. The bundled engine replays a
//!    JSON [`stepper::trace::Trace`].
//! 2. [`snapshot`]: the per-statement memory snapshots a trace is made of, and
//!    the diffing that turns two snapshots into a [`graph::DeltaBatch`].
//! 3. [`graph`]: [`graph::StructGraph`], the structs and pointer variables,
//!    with arrow geometry kept in step with every mutation.
//! 4. [`editor`]: the [`editor::EditorSync`] boundary, the source view and
//!    word-list completion.
//! 5. [`session`]: wires the three together for one debug session.
//! 6. [`config`] and [`logging`]: user settings and file logging.
//! 7. [`ui`]: ratatui-based TUI; not part of the stable library API.

pub mod config;
pub mod editor;
pub mod graph;
pub mod logging;
pub mod session;
pub mod snapshot;
pub mod stepper;
pub mod ui;
