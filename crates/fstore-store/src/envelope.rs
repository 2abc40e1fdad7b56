//! Expiry envelope: the optional first line of an entry file.
//!
//! On-disk format:
//! ```text
//! [optional: "#^e:" <decimal unix seconds> "\n"]
//! [N bytes: serialized value]
//! ```
//!
//! A file that does not start with the tag is a non-expiring entry and all of
//! its bytes are the payload. The marker is always the very first line, which
//! lets existence checks read a bounded prefix instead of the whole file.

use fstore_types::Timestamp;

use crate::error::{StoreError, StoreResult};

/// Tag opening the expiry marker line.
pub const EXPIRY_TAG: &[u8] = b"#^e:";

/// Longest possible marker line: tag, `i64::MIN` in decimal, newline.
pub const MAX_HEADER_LEN: usize = EXPIRY_TAG.len() + 20 + 1;

/// What the head of an entry file says about expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Header {
    /// No marker; the whole file is payload.
    Plain,
    /// A well-formed marker; the payload starts at `body_offset`.
    Expiring {
        expire_at: Timestamp,
        body_offset: usize,
    },
    /// The tag is present but the line is unterminated or not an integer.
    Malformed,
}

/// Outcome of decoding a full entry file.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// Unexpired payload bytes.
    Live(&'a [u8]),
    /// The marker's instant has passed; the expiry callback has run.
    Expired,
    /// Unusable marker line.
    Malformed,
}

/// Frame `payload` with an optional expiry marker.
///
/// Fails with [`StoreError::SentinelCollision`] when a non-expiring payload
/// itself starts with [`EXPIRY_TAG`]. Expiring payloads may start with
/// anything because only the first line is ever parsed as a marker.
pub fn encode(payload: &[u8], expire_at: Option<Timestamp>) -> StoreResult<Vec<u8>> {
    match expire_at {
        Some(at) => {
            let secs = at.to_string();
            let mut out = Vec::with_capacity(EXPIRY_TAG.len() + secs.len() + 1 + payload.len());
            out.extend_from_slice(EXPIRY_TAG);
            out.extend_from_slice(secs.as_bytes());
            out.push(b'\n');
            out.extend_from_slice(payload);
            Ok(out)
        }
        None if payload.starts_with(EXPIRY_TAG) => Err(StoreError::SentinelCollision),
        None => Ok(payload.to_vec()),
    }
}

/// Inspect the first line of an entry.
///
/// `head` may be the whole file or only its first line; at most
/// [`MAX_HEADER_LEN`] bytes are examined either way.
pub fn read_header(head: &[u8]) -> Header {
    let Some(rest) = head.strip_prefix(EXPIRY_TAG) else {
        return Header::Plain;
    };

    let window = &rest[..rest.len().min(MAX_HEADER_LEN - EXPIRY_TAG.len())];
    let Some(newline) = window.iter().position(|&b| b == b'\n') else {
        return Header::Malformed;
    };

    let parsed = std::str::from_utf8(&window[..newline])
        .ok()
        .and_then(|digits| digits.parse::<Timestamp>().ok());

    match parsed {
        Some(expire_at) => Header::Expiring {
            expire_at,
            body_offset: EXPIRY_TAG.len() + newline + 1,
        },
        None => Header::Malformed,
    }
}

/// Strip the envelope from a full entry file, applying lazy expiration.
///
/// `on_expire` runs exactly once when the marker's instant is strictly before
/// `now`; it is expected to remove the backing file.
pub fn decode<'a>(bytes: &'a [u8], now: Timestamp, on_expire: impl FnOnce()) -> Decoded<'a> {
    match read_header(bytes) {
        Header::Plain => Decoded::Live(bytes),
        Header::Expiring {
            expire_at,
            body_offset,
        } => {
            if expire_at.is_expired_at(now) {
                on_expire();
                Decoded::Expired
            } else {
                Decoded::Live(&bytes[body_offset..])
            }
        }
        Header::Malformed => Decoded::Malformed,
    }
}
