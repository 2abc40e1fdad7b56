//! Value codecs: the serialization collaborator of a [`Store`](crate::Store).
//!
//! The store itself only moves bytes. A codec turns caller values into those
//! bytes and back. Whatever a codec produces is framed by the expiry envelope,
//! which refuses payloads that would be mistaken for an expiry marker.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Errors from encoding or decoding a value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Serialize values to bytes and back.
pub trait ValueCodec: Send + Sync {
    /// Short codec name, used in log fields.
    fn name(&self) -> &'static str;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON via `serde_json`. The default codec.
///
/// JSON text never begins with `#`, so it cannot collide with the expiry
/// marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact binary encoding via `bincode`.
///
/// Binary output can start with any byte. A non-expiring value whose encoding
/// begins with the marker tag is rejected at write time.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl ValueCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Returns `true` for values that are never persisted.
///
/// A value is empty when it is null-like (`None`, `()`), an empty string, an
/// empty sequence or an empty map. `false` and `0` are values, not absence.
///
/// The test goes through `serde_json::Value`, which has no representation for
/// NaN or the infinities and maps them to `null`. Non-finite floats are
/// therefore empty too; JSON could not read them back as floats anyway.
pub fn is_empty_value<T: Serialize + ?Sized>(value: &T) -> bool {
    match serde_json::to_value(value) {
        Ok(Value::Null) => true,
        Ok(Value::String(s)) => s.is_empty(),
        Ok(Value::Array(items)) => items.is_empty(),
        Ok(Value::Object(map)) => map.is_empty(),
        // Numbers, booleans, and values JSON cannot represent (e.g. maps with
        // non-string keys) count as present.
        Ok(_) | Err(_) => false,
    }
}
