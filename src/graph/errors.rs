//! Graph errors
//!
//! Only invariant violations are errors. A pointer whose target is not live is a
//! normal variable state (dangling), not a failure.

use super::address::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An address was registered while already live; destroy it first
    #[error("address {0} is already live")]
    DuplicateAddress(Address),

    /// A variable update names an owner that is not live once the batch is applied
    #[error("variable '{label}' is owned by {owner}, which is not live")]
    UnknownOwner { owner: Address, label: String },

    #[error("no live struct at {0}")]
    UnknownStruct(Address),
}
