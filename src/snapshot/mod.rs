// Snapshot history for stepping backward and forward

use crate::graph::{Address, DeltaBatch, StructSpec, VariableKey, VariableRef, VariableUpdate};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory state at one executed statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// 1-based source line about to execute
    pub line: usize,
    /// Live structs, with their pointer fields
    #[serde(default)]
    pub structs: Vec<StructSpec>,
    /// Pointer variables in scope (locals and globals)
    #[serde(default)]
    pub variables: Vec<VariableUpdate>,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Rough: a fixed cost per struct and variable plus the text they carry
        let structs: usize = self
            .structs
            .iter()
            .map(|s| {
                64 + s.type_name.len()
                    + s.fields
                        .iter()
                        .map(|f| 48 + f.name.len() + f.type_name.len())
                        .sum::<usize>()
            })
            .sum();
        let variables: usize = self.variables.iter().map(|v| 48 + v.label.len()).sum();
        32 + structs + variables
    }

    /// Changes that turn the state `from` (nothing when `None`) into `self`
    pub fn delta_from(&self, from: Option<&Snapshot>) -> DeltaBatch {
        let empty = Snapshot::default();
        let from = from.unwrap_or(&empty);

        let old_structs: FxHashMap<Address, &StructSpec> =
            from.structs.iter().map(|s| (s.address, s)).collect();
        let new_structs: FxHashMap<Address, &StructSpec> =
            self.structs.iter().map(|s| (s.address, s)).collect();

        let mut destroyed_addresses: Vec<Address> = from
            .structs
            .iter()
            .map(|s| s.address)
            .filter(|addr| !new_structs.contains_key(addr))
            .collect();
        destroyed_addresses.sort();

        let created_structs: Vec<StructSpec> = self
            .structs
            .iter()
            .filter(|s| old_structs.get(&s.address).copied() != Some(*s))
            .cloned()
            .collect();

        let old_vars: FxHashMap<VariableKey, Option<Address>> = from
            .variables
            .iter()
            .map(|v| (v.key(), v.target))
            .collect();
        let new_keys: FxHashMap<VariableKey, Option<Address>> = self
            .variables
            .iter()
            .map(|v| (v.key(), v.target))
            .collect();

        let variable_updates: Vec<VariableUpdate> = self
            .variables
            .iter()
            .filter(|v| old_vars.get(&v.key()) != Some(&v.target))
            .cloned()
            .collect();

        let removed_variables: Vec<VariableRef> = from
            .variables
            .iter()
            .filter(|v| !new_keys.contains_key(&v.key()))
            .map(|v| VariableRef::from(v.key()))
            .collect();

        DeltaBatch {
            created_structs,
            destroyed_addresses,
            variable_updates,
            removed_variables,
            new_line: self.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot memory limit exceeded: {current} + {requested} > {limit} bytes")]
pub struct SnapshotLimitExceeded {
    pub current: usize,
    pub requested: usize,
    pub limit: usize,
}

/// Manages execution history for reverse execution
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), SnapshotLimitExceeded> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(SnapshotLimitExceeded {
                current: self.current_memory,
                requested: snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}
