//! Error types for the extraction core.
//!
//! Stage 1 is infallible by contract; the only fallible surface is writing
//! records through a sink. Unresolved references are not errors and never
//! surface here.

use thiserror::Error;

/// Failure while appending a record to a sink.
///
/// Surfaced verbatim to the caller; the core does not retry.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The underlying writer failed.
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
