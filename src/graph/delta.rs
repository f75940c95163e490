//! Delta batches: the graph changes produced by one execution step
//!
//! A batch is applied as a unit by [`StructGraph::apply_delta`]. Listing an
//! address in `created_structs` that is already live updates its fields in place.
//!
//! [`StructGraph::apply_delta`]: super::StructGraph::apply_delta

use super::address::Address;
use super::node::Field;
use super::variable::VariableKey;
use serde::{Deserialize, Serialize};

/// A struct to create, or to update if its address is live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructSpec {
    pub address: Address,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl StructSpec {
    pub fn new(address: Address, type_name: &str, fields: Vec<Field>) -> Self {
        StructSpec {
            address,
            type_name: type_name.to_string(),
            fields,
        }
    }
}

/// Re-target a variable, creating it if needed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
    pub label: String,
    /// `None` is NULL
    #[serde(default)]
    pub target: Option<Address>,
}

impl VariableUpdate {
    pub fn new(owner: Option<Address>, label: &str, target: Option<Address>) -> Self {
        VariableUpdate {
            owner,
            label: label.to_string(),
            target,
        }
    }

    pub fn key(&self) -> VariableKey {
        VariableKey::new(self.owner, &self.label)
    }
}

/// A variable that went out of scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
    pub label: String,
}

impl VariableRef {
    pub fn key(&self) -> VariableKey {
        VariableKey::new(self.owner, &self.label)
    }
}

impl From<VariableKey> for VariableRef {
    fn from(key: VariableKey) -> Self {
        VariableRef {
            owner: key.owner,
            label: key.label,
        }
    }
}

/// All graph changes for one step, plus the line execution stopped at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaBatch {
    #[serde(default)]
    pub created_structs: Vec<StructSpec>,
    #[serde(default)]
    pub destroyed_addresses: Vec<Address>,
    #[serde(default)]
    pub variable_updates: Vec<VariableUpdate>,
    #[serde(default)]
    pub removed_variables: Vec<VariableRef>,
    pub new_line: usize,
}

impl DeltaBatch {
    pub fn at_line(line: usize) -> Self {
        DeltaBatch {
            new_line: line,
            ..Default::default()
        }
    }

    /// Whether the batch changes nothing in the graph (the line may still move)
    pub fn is_empty(&self) -> bool {
        self.created_structs.is_empty()
            && self.destroyed_addresses.is_empty()
            && self.variable_updates.is_empty()
            && self.removed_variables.is_empty()
    }
}
