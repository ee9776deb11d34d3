//! Stream Codec
//!
//! Decodes text frames from the Polygon streaming channel. Frames are JSON
//! arrays of tagged records; each record's `ev` field selects its type.
//! A bare object is accepted as a one-record frame for tolerance.

use super::messages::{AggregateMessage, FeedMessage, StatusMessage};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record carries an `ev` tag outside the known set.
    #[error("unknown event tag: {0}")]
    UnknownEventTag(String),

    /// Record is missing its `ev` tag.
    #[error("record missing event tag")]
    MissingEventTag,

    /// Frame is neither a JSON array nor an object.
    #[error("invalid frame format: {0}")]
    InvalidFormat(String),
}

/// JSON codec for the streaming channel.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into its records, preserving arrival order.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON parsing fails or a record carries an
    /// unknown or missing `ev` tag.
    pub fn decode(&self, text: &str) -> Result<Vec<FeedMessage>, CodecError> {
        let trimmed = text.trim();

        if trimmed.starts_with('[') {
            let raw: Vec<serde_json::Value> = serde_json::from_str(trimmed)?;
            raw.into_iter().map(decode_record).collect()
        } else if trimmed.starts_with('{') {
            let value: serde_json::Value = serde_json::from_str(trimmed)?;
            Ok(vec![decode_record(value)?])
        } else {
            // Truncate on a char boundary; byte slicing could panic here.
            let preview: String = trimmed.chars().take(50).collect();
            Err(CodecError::InvalidFormat(format!(
                "expected JSON array or object, got: {preview}..."
            )))
        }
    }

    /// Encode a value to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

fn decode_record(value: serde_json::Value) -> Result<FeedMessage, CodecError> {
    let tag = value
        .get("ev")
        .and_then(|v| v.as_str())
        .ok_or(CodecError::MissingEventTag)?;

    match tag {
        "status" => {
            let msg: StatusMessage = serde_json::from_value(value)?;
            Ok(FeedMessage::Status(msg))
        }
        "AM" | "A" => {
            let msg: AggregateMessage = serde_json::from_value(value)?;
            Ok(FeedMessage::Aggregate(msg))
        }
        other => Err(CodecError::UnknownEventTag(other.to_string())),
    }
}
