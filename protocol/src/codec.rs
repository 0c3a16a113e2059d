//! Binary wire codec.
//!
//! Every structure that crosses the wire or gets signed goes through these
//! helpers, so the canonical byte form is defined in exactly one place:
//! bincode with fixed-width integers, no trailing bytes, and a hard size cap.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::MAX_MESSAGE_SIZE;
use crate::crypto::hash256;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .with_limit(MAX_MESSAGE_SIZE)
}

/// Canonical encoding of `value`.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    options().serialize(value)
}

/// Decode a `T`, rejecting oversized input and trailing bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    options().deserialize(bytes)
}

/// Hex SHA-256 of the canonical encoding: the string every signature in the
/// protocol is computed over.
pub fn signing_hash<T: Serialize>(value: &T) -> Result<String, bincode::Error> {
    Ok(hash256(&encode(value)?))
}
