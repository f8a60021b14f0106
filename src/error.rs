//! Error types for the tone engine

use thiserror::Error;

/// Errors surfaced by the engine and its audio sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The output device could not be opened (missing, busy, or denied).
    #[error("audio sink unavailable: {0}")]
    SinkUnavailable(String),

    /// A parameter snapshot was rejected at the `start`/`update` boundary.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The sink failed mid-stream (device disconnected or stream error).
    #[error("audio sink write failed: {0}")]
    SinkWriteFailure(String),
}
