//! Parsed envelope header.

use serde::{Deserialize, Serialize};

use super::status::{MessageType, StatusCode};

/// Everything the envelope says about the message it carries.
///
/// Readable without any keys. For encrypted envelopes the payload stays in
/// `encrypted_message` until a recipient private key opens it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMessageMetadata {
    pub version: u32,
    pub status_code: StatusCode,
    pub message_type: MessageType,
    pub status_message: String,
    pub identifier: String,
    pub encrypted: bool,
    pub encrypted_message: Option<String>,
    pub recipient_public_key_pem: Option<String>,
    pub sender_public_key_pem: Option<String>,
    /// Unix seconds at which the encrypted envelope was sealed.
    pub nonce: Option<u64>,
    pub signature: Option<String>,
}
