//! Error types for the wire layer.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Serialization failed (turning an event into a frame).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, an unknown event tag.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
