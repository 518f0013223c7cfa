//! Codec trait and the JSON implementation.
//!
//! A codec converts between event types and the text frames the
//! transport carries. The rest of the stack only sees the [`Codec`]
//! trait, so the frame format can change without touching the session
//! or room layers.

use serde::{Serialize, de::DeserializeOwned};

use crate::WireError;

/// Encodes events to text frames and decodes frames back.
///
/// `Send + Sync + 'static` because the codec is shared across every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one text frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, WireError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns [`WireError::Decode`] if the frame is malformed,
    /// truncated, or does not match the expected type.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, WireError>;
}

/// A [`Codec`] speaking JSON via `serde_json`.
///
/// Human-readable, trivially inspectable in browser dev tools — the
/// right trade for a protocol whose clients are web pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, WireError> {
        serde_json::to_string(value).map_err(WireError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, WireError> {
        serde_json::from_str(frame).map_err(WireError::Decode)
    }
}
