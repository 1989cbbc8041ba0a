//! Recoverable errors surfaced to callers.
//!
//! Invariant violations inside the engine are not represented here; they are
//! programming errors and are asserted instead.

use thiserror::Error;

/// Failure to read metadata supplied through a format editor or stored on a node.
///
/// The `Display` text is meant to be shown to the user as-is.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Metadata does not match the expected shape: {0}")]
    SchemaMismatch(#[source] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<serde_json::Error> for MetadataError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_data() {
            MetadataError::SchemaMismatch(error)
        } else {
            MetadataError::Malformed(error)
        }
    }
}

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to parse editor options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("maxSnapshotSize must be greater than zero")]
    ZeroSnapshotSize,
}
