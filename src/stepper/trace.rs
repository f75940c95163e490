//! Recorded execution traces
//!
//! A trace is a JSON file with one memory [`Snapshot`] per executed statement:
//!
//! ```json
//! {
//!   "source": "list.c",
//!   "steps": [
//!     { "line": 12, "variables": [{ "label": "head", "target": null }] },
//!     { "line": 13,
//!       "structs": [{ "address": "0x1000", "type": "struct node",
//!                     "fields": [{ "name": "next", "type": "struct node *",
//!                                  "value": { "pointer": null } }] }],
//!       "variables": [{ "label": "head", "target": "0x1000" }] }
//!   ]
//! }
//! ```
//!
//! `source` is resolved relative to the trace file.

use crate::snapshot::{Snapshot, SnapshotLimitExceeded};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed trace: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid trace step {step}: {message}")]
    InvalidStep { step: usize, message: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotLimitExceeded),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Source file the trace was recorded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub steps: Vec<Snapshot>,
}

impl Trace {
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let trace: Trace = serde_json::from_str(text)?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let text = fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Source path, relative paths taken from the trace file's directory
    pub fn source_path(&self, trace_path: &Path) -> Option<PathBuf> {
        let source = self.source.as_ref()?;
        if source.is_absolute() {
            return Some(source.clone());
        }
        let dir = trace_path.parent().unwrap_or_else(|| Path::new("."));
        Some(dir.join(source))
    }

    fn validate(&self) -> Result<(), TraceError> {
        for (step, snapshot) in self.steps.iter().enumerate() {
            let invalid = |message: String| TraceError::InvalidStep { step, message };
            if snapshot.line == 0 {
                return Err(invalid("line numbers start at 1".to_string()));
            }
            let mut seen = FxHashSet::default();
            for s in &snapshot.structs {
                if s.address.is_null() {
                    return Err(invalid("a struct cannot live at NULL".to_string()));
                }
                if !seen.insert(s.address) {
                    return Err(invalid(format!("address {} appears twice", s.address)));
                }
            }
            for v in &snapshot.variables {
                if let Some(owner) = v.owner {
                    if !seen.contains(&owner) {
                        return Err(invalid(format!(
                            "variable '{}' is owned by {}, which is not live",
                            v.label, owner
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Address;

    #[test]
    fn test_parse_minimal_trace() {
        let trace = Trace::parse(
            r#"{"steps": [{"line": 1}, {"line": 2, "variables": [{"label": "p", "target": "0x10"}]}]}"#,
        )
        .unwrap();
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.steps[1].variables[0].target, Some(Address(0x10)));
        assert!(trace.source.is_none());
    }

    #[test]
    fn test_rejects_zero_line() {
        let err = Trace::parse(r#"{"steps": [{"line": 0}]}"#).unwrap_err();
        assert!(matches!(err, TraceError::InvalidStep { step: 0, .. }));
    }

    #[test]
    fn test_rejects_duplicate_address() {
        let err = Trace::parse(
            r#"{"steps": [{"line": 1, "structs": [
                {"address": "0x10", "type": "a"}, {"address": 16, "type": "b"}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn test_source_path_is_relative_to_trace() {
        let trace = Trace {
            source: Some(PathBuf::from("list.c")),
            steps: Vec::new(),
        };
        assert_eq!(
            trace.source_path(Path::new("demos/list.json")),
            Some(PathBuf::from("demos/list.c"))
        );
    }
}
