use thiserror::Error;

/// Fatal errors surfaced while setting up a scenario.
///
/// Allocation problems are never errors: they degrade into
/// [`crate::models::AllocationIssue`] records on the layout.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Configuration error in {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported schema version: found {found}, expected {expected}")]
    UnsupportedSchema { found: u8, expected: u8 },
}

impl ScenarioError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScenarioError::Configuration { field: field.into(), reason: reason.into() }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ScenarioError::Configuration { .. })
    }
}

/// Rejected history writes. Never fatal to a running scenario.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Frame {frame_id} is older than the newest recorded frame {last}")]
    OutOfOrder { frame_id: u32, last: u32 },
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
