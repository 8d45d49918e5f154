//! Conversion between domain entities and stored records.
//!
//! A record is the JSON object persisted for an entity. Field names match the
//! domain model (camelCase) and timestamps are ISO-8601 strings.
//!
//! Serialization renders timestamps at any depth. Deserialization only
//! canonicalizes the top-level fields named in [`TIMESTAMP_FIELDS`]; nested
//! objects (`readyMealData`, `ingredients`, `dishes`) carry no timestamps
//! today. Extending an entity with a nested timestamp means extending that
//! list, and `test_timestamps_only_live_in_declared_fields` will fail until
//! you do.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::serde::{format_timestamp, parse_timestamp};

/// A stored record: the JSON object kept for one entity.
pub type Record = Map<String, Value>;

/// Field holding the primary key of every record.
pub const KEY_PATH: &str = "id";

/// Timestamp-bearing field paths shared by every entity.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt"];

/// Errors raised while encoding or decoding records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
    #[error("Stored value is not a record")]
    NotARecord,
    #[error("Record is missing its key `{KEY_PATH}`")]
    MissingKey,
    #[error("Invalid timestamp in field `{field}`: {value}")]
    InvalidTimestamp { field: String, value: String },
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Serializes an entity into a record.
pub fn serialize<T: Serialize>(entity: &T) -> Result<Record> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(CodecError::NotARecord),
        Err(e) => Err(CodecError::SerializeFailed(e.to_string())),
    }
}

/// Materializes an entity from a record, canonicalizing the named timestamp
/// fields first. Other fields are used as stored.
pub fn deserialize<T: DeserializeOwned>(mut record: Record, timestamp_fields: &[&str]) -> Result<T> {
    for field in timestamp_fields {
        if let Some(Value::String(raw)) = record.get(*field) {
            let parsed = parse_timestamp(raw).map_err(|_| CodecError::InvalidTimestamp {
                field: (*field).to_string(),
                value: raw.clone(),
            })?;
            record.insert((*field).to_string(), Value::String(format_timestamp(&parsed)));
        }
    }

    serde_json::from_value(Value::Object(record))
        .map_err(|e| CodecError::DeserializeFailed(e.to_string()))
}

/// Returns the primary key of a record.
pub fn record_key(record: &Record) -> Result<&str> {
    record
        .get(KEY_PATH)
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingKey)
}

/// Encodes a record as JSON text for storage.
pub fn encode_record(record: &Record) -> Result<String> {
    serde_json::to_string(record).map_err(|e| CodecError::SerializeFailed(e.to_string()))
}

/// Decodes JSON text read from storage into a record.
pub fn decode_record(text: &str) -> Result<Record> {
    match serde_json::from_str(text) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(CodecError::NotARecord),
        Err(e) => Err(CodecError::DeserializeFailed(e.to_string())),
    }
}
