//! Error types for payload transformation.

use thiserror::Error;

/// Result type alias using TransformError.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised while turning a queue payload into an outbound summary.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The payload is not JSON, or its JSON does not fit the observation layout.
    /// Redelivery cannot fix this.
    #[error("Invalid observation payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Observation payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Failed to encode weather summary: {0}")]
    Encode(#[source] serde_json::Error),
}
