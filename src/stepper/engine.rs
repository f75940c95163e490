//! Execution engines
//!
//! An [`ExecutionEngine`] is whatever actually runs the debugged program. The
//! stepper only ever asks it for one complete [`DeltaBatch`] per move.
//!
//! [`TraceEngine`] replays a recorded [`Trace`]: it keeps one snapshot per
//! statement and computes each batch by diffing the snapshot it leaves against
//! the one it arrives at, so a backward step is the exact inverse of the
//! matching forward step.

use super::trace::{Trace, TraceError};
use crate::graph::DeltaBatch;
use crate::snapshot::SnapshotManager;
use tracing::debug;

/// Something that can run, rewind and reset the debugged program one statement at a time
pub trait ExecutionEngine {
    /// Go back to the first statement. `None` when the program has no statements.
    ///
    /// The batch describes the full state at the first statement, starting from
    /// an empty graph.
    fn reset(&mut self) -> Option<DeltaBatch>;

    /// Execute one statement. `None` when there is no next statement.
    fn step_forward(&mut self) -> Option<DeltaBatch>;

    /// Undo one statement. `None` when already at the first statement.
    fn step_backward(&mut self) -> Option<DeltaBatch>;

    /// Stop executing and drop any in-flight work
    fn halt(&mut self);

    /// Index of the current statement, `None` when not running
    fn position(&self) -> Option<usize>;

    /// Number of statements, if known up front
    fn total_steps(&self) -> Option<usize>;

    /// The full state at the current statement, starting from an empty graph.
    ///
    /// Used to rebuild the graph after a batch was rejected. `None` when the
    /// engine cannot describe its state from scratch.
    fn resync(&self) -> Option<DeltaBatch> {
        None
    }
}

/// Replays a recorded trace
#[derive(Debug)]
pub struct TraceEngine {
    history: SnapshotManager,
    position: Option<usize>,
}

impl TraceEngine {
    pub fn new(trace: Trace, snapshot_limit: usize) -> Result<Self, TraceError> {
        let mut history = SnapshotManager::new(snapshot_limit);
        for snapshot in trace.steps {
            history.push(snapshot)?;
        }
        debug!(
            steps = history.len(),
            bytes = history.memory_usage(),
            limit = history.memory_limit(),
            "trace loaded"
        );
        Ok(TraceEngine {
            history,
            position: None,
        })
    }

    pub fn history(&self) -> &SnapshotManager {
        &self.history
    }

    fn move_to(&mut self, from: usize, to: usize) -> Option<DeltaBatch> {
        let target = self.history.get(to)?;
        let batch = target.delta_from(self.history.get(from));
        self.position = Some(to);
        Some(batch)
    }
}

impl ExecutionEngine for TraceEngine {
    fn reset(&mut self) -> Option<DeltaBatch> {
        self.position = None;
        let first = self.history.get(0)?;
        let batch = first.delta_from(None);
        self.position = Some(0);
        Some(batch)
    }

    fn step_forward(&mut self) -> Option<DeltaBatch> {
        let current = self.position?;
        if current + 1 >= self.history.len() {
            return None;
        }
        self.move_to(current, current + 1)
    }

    fn step_backward(&mut self) -> Option<DeltaBatch> {
        let current = self.position?;
        if current == 0 {
            return None;
        }
        self.move_to(current, current - 1)
    }

    fn halt(&mut self) {
        self.position = None;
    }

    fn position(&self) -> Option<usize> {
        self.position
    }

    fn total_steps(&self) -> Option<usize> {
        Some(self.history.len())
    }

    fn resync(&self) -> Option<DeltaBatch> {
        let current = self.history.get(self.position?)?;
        Some(current.delta_from(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Address, VariableUpdate};
    use crate::snapshot::Snapshot;

    fn engine(lines: &[usize]) -> TraceEngine {
        let steps = lines
            .iter()
            .enumerate()
            .map(|(i, &line)| Snapshot {
                line,
                structs: Vec::new(),
                variables: vec![VariableUpdate::new(None, "i", Some(Address(i as u64 + 1)))],
            })
            .collect();
        TraceEngine::new(Trace { source: None, steps }, 1 << 20).unwrap()
    }

    #[test]
    fn test_reset_on_empty_trace() {
        let mut e = engine(&[]);
        assert!(e.reset().is_none());
        assert_eq!(e.position(), None);
        assert!(e.step_forward().is_none());
    }

    #[test]
    fn test_walk_forward_and_back() {
        let mut e = engine(&[3, 4, 6]);
        assert_eq!(e.reset().map(|b| b.new_line), Some(3));
        assert_eq!(e.step_forward().map(|b| b.new_line), Some(4));
        assert_eq!(e.step_forward().map(|b| b.new_line), Some(6));
        assert!(e.step_forward().is_none());
        assert_eq!(e.position(), Some(2));
        assert_eq!(e.step_backward().map(|b| b.new_line), Some(4));
        assert_eq!(e.step_backward().map(|b| b.new_line), Some(3));
        assert!(e.step_backward().is_none());
        assert_eq!(e.position(), Some(0));
    }

    #[test]
    fn test_backward_batch_inverts_forward() {
        let mut e = engine(&[1, 2]);
        e.reset();
        let forward = e.step_forward().unwrap();
        let backward = e.step_backward().unwrap();
        assert_eq!(forward.variable_updates[0].target, Some(Address(2)));
        assert_eq!(backward.variable_updates[0].target, Some(Address(1)));
    }

    #[test]
    fn test_halt_stops_stepping() {
        let mut e = engine(&[1, 2]);
        e.reset();
        e.halt();
        assert!(e.step_forward().is_none());
        assert_eq!(e.total_steps(), Some(2));
        assert!(e.resync().is_none());
    }

    #[test]
    fn test_resync_describes_current_step_from_scratch() {
        let mut e = engine(&[1, 2]);
        assert_eq!(e.history().memory_limit(), 1 << 20);
        assert!(e.resync().is_none());
        e.reset();
        e.step_forward();
        let batch = e.resync().unwrap();
        assert_eq!(batch.new_line, 2);
        assert!(batch.destroyed_addresses.is_empty());
        assert!(batch.removed_variables.is_empty());
        assert_eq!(batch.variable_updates[0].target, Some(Address(2)));
        assert_eq!(e.position(), Some(1));
    }
}
