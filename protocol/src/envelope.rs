//! # Protocol Envelope
//!
//! Every TransactID message travels inside an envelope that carries the
//! status pair, the message type and a correlation identifier. Two shapes
//! exist:
//!
//! - **Plain**: the serialized message is embedded as-is.
//! - **Encrypted**: the serialized message is sealed for the recipient
//!   (see [`crate::crypto::encryption`]) and the envelope is signed with the
//!   sender's secp256k1 key.
//!
//! The shapes are tagged on the wire ([`Envelope`] is a serde enum), so
//! decoding never guesses.
//!
//! ## Envelope signature scope
//!
//! The ECDSA signature covers every field of the encrypted envelope except
//! the signature itself and the status pair (`status_code`,
//! `status_message`). Those are zeroed before hashing. This is what lets
//! [`change_status`] update the status without the sender's private key
//! while the signature stays valid. The status pair is therefore
//! unauthenticated and must not drive trust decisions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec;
use crate::config::PROTOCOL_VERSION;
use crate::crypto::{self, hash256, EncryptionError};
use crate::error::{Result, TransactIdError};
use crate::model::{
    MessageInformation, MessageType, ProtocolMessageMetadata, RecipientParameters,
    SenderParameters, StatusCode,
};

const ENVELOPE_NAME: &str = "ProtocolMessage";

/// Unencrypted envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainEnvelope {
    pub version: u32,
    pub status_code: u32,
    pub message_type: MessageType,
    pub serialized_message: Vec<u8>,
    pub status_message: String,
    pub identifier: String,
}

/// Envelope whose payload is sealed for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub version: u32,
    pub status_code: u32,
    pub message_type: MessageType,
    pub status_message: String,
    pub identifier: String,
    pub receiver_public_key: String,
    pub sender_public_key: String,
    /// Unix seconds at sealing time.
    pub nonce: u64,
    pub encrypted_message: String,
    /// Base64 DER ECDSA-SHA256 signature by the sender key.
    pub signature: String,
}

impl EncryptedEnvelope {
    /// The form the envelope signature is computed over.
    fn signing_form(&self) -> Self {
        Self {
            status_code: 0,
            status_message: String::new(),
            signature: String::new(),
            ..self.clone()
        }
    }

    fn sign(&mut self, sender_private_key_pem: &str) -> Result<()> {
        let hash = codec::signing_hash(&self.signing_form())?;
        self.signature = crypto::sign_ecdsa(&hash, sender_private_key_pem)?;
        Ok(())
    }

    /// Check the envelope signature against the embedded sender key.
    pub fn verify_signature(&self) -> Result<bool> {
        let hash = codec::signing_hash(&self.signing_form())?;
        Ok(crypto::verify_ecdsa(&self.signature, &hash, &self.sender_public_key)?)
    }
}

/// A decoded envelope of either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    Plain(PlainEnvelope),
    Encrypted(EncryptedEnvelope),
}

impl Envelope {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes).map_err(|e| TransactIdError::invalid_object(ENVELOPE_NAME, e))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(codec::encode(self)?)
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Plain(envelope) => envelope.message_type,
            Self::Encrypted(envelope) => envelope.message_type,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::Plain(envelope) => &envelope.identifier,
            Self::Encrypted(envelope) => &envelope.identifier,
        }
    }

    /// The envelope header. Fails on an unknown status code.
    pub fn metadata(&self) -> Result<ProtocolMessageMetadata> {
        let metadata = match self {
            Self::Plain(envelope) => ProtocolMessageMetadata {
                version: envelope.version,
                status_code: status_from_wire(envelope.status_code)?,
                message_type: envelope.message_type,
                status_message: envelope.status_message.clone(),
                identifier: envelope.identifier.clone(),
                encrypted: false,
                encrypted_message: None,
                recipient_public_key_pem: None,
                sender_public_key_pem: None,
                nonce: None,
                signature: None,
            },
            Self::Encrypted(envelope) => ProtocolMessageMetadata {
                version: envelope.version,
                status_code: status_from_wire(envelope.status_code)?,
                message_type: envelope.message_type,
                status_message: envelope.status_message.clone(),
                identifier: envelope.identifier.clone(),
                encrypted: true,
                encrypted_message: Some(envelope.encrypted_message.clone()),
                recipient_public_key_pem: Some(envelope.receiver_public_key.clone()),
                sender_public_key_pem: Some(envelope.sender_public_key.clone()),
                nonce: Some(envelope.nonce),
                signature: Some(envelope.signature.clone()),
            },
        };
        Ok(metadata)
    }

    /// The serialized message, decrypted with the recipient's private key
    /// when the envelope is encrypted.
    pub fn open(&self, recipient: Option<&RecipientParameters>) -> Result<Vec<u8>> {
        match self {
            Self::Plain(envelope) => Ok(envelope.serialized_message.clone()),
            Self::Encrypted(envelope) => {
                let recipient_private_key = recipient
                    .and_then(|r| r.encryption_parameters.as_ref())
                    .and_then(|p| p.private_key_pem.as_deref())
                    .ok_or(EncryptionError::MissingRecipientPrivateKey)?;
                let plain_base64 = crypto::decrypt(
                    &envelope.encrypted_message,
                    recipient_private_key,
                    &envelope.sender_public_key,
                )?;
                let serialized = BASE64
                    .decode(plain_base64)
                    .map_err(|e| EncryptionError::DecryptFailed(e.to_string()))?;
                debug!(identifier = %envelope.identifier, "Envelope decrypted");
                Ok(serialized)
            }
        }
    }

    /// For encrypted envelopes, require a valid envelope signature. Plain
    /// envelopes carry none and pass.
    pub fn verify(&self) -> Result<()> {
        if let Self::Encrypted(envelope) = self {
            if !matches!(envelope.verify_signature(), Ok(true)) {
                warn!(identifier = %envelope.identifier, "Envelope signature rejected");
                return Err(TransactIdError::InvalidSignature(
                    "sender signature invalid".into(),
                ));
            }
        }
        Ok(())
    }

    fn set_status(&mut self, status_code: StatusCode, status_message: &str) {
        let (code, message) = match self {
            Self::Plain(envelope) => (&mut envelope.status_code, &mut envelope.status_message),
            Self::Encrypted(envelope) => (&mut envelope.status_code, &mut envelope.status_message),
        };
        *code = status_code.code();
        *message = status_message.to_string();
    }
}

fn status_from_wire(code: u32) -> Result<StatusCode> {
    StatusCode::from_code(code).ok_or_else(|| {
        TransactIdError::invalid_object(ENVELOPE_NAME, format!("unknown status code {code}"))
    })
}

/// `hash256(payload)` followed by the current unix time in seconds.
///
/// A correlation tag, not a uniqueness guarantee: two identical payloads
/// wrapped in the same second get the same identifier.
pub fn generate_identifier(payload: &[u8]) -> String {
    format!("{}{}", hash256(payload), Utc::now().timestamp())
}

/// Wrap a serialized message in an envelope.
///
/// With `message_information.encrypt_message` set, the recipient's public
/// key and the sender's secp256k1 key pair are required; the payload is
/// sealed and the envelope signed. Otherwise a plain envelope is built.
pub fn wrap(
    message_type: MessageType,
    serialized_message: Vec<u8>,
    message_information: &MessageInformation,
    sender: &SenderParameters,
    recipient: Option<&RecipientParameters>,
    identifier: Option<String>,
) -> Result<Vec<u8>> {
    let identifier = identifier.unwrap_or_else(|| generate_identifier(&serialized_message));

    let envelope = if message_information.encrypt_message {
        let recipient_public_key = recipient
            .and_then(|r| r.encryption_parameters.as_ref())
            .map(|p| p.public_key_pem.as_str())
            .filter(|pem| !pem.is_empty())
            .ok_or(EncryptionError::MissingRecipientKeys)?;
        let sender_keys = sender
            .encryption_parameters
            .as_ref()
            .filter(|p| !p.public_key_pem.is_empty())
            .ok_or(EncryptionError::MissingSenderKeys)?;
        let sender_private_key = sender_keys
            .private_key_pem
            .as_deref()
            .ok_or(EncryptionError::MissingSenderKeys)?;
        if !crypto::is_ecdsa_key(sender_private_key) {
            return Err(EncryptionError::IncorrectKeyFormat.into());
        }

        let encrypted_message = crypto::encrypt(
            &BASE64.encode(&serialized_message),
            recipient_public_key,
            &sender_keys.public_key_pem,
            sender_private_key,
        )?;
        let mut envelope = EncryptedEnvelope {
            version: PROTOCOL_VERSION,
            status_code: message_information.status_code.code(),
            message_type,
            status_message: message_information.status_message.clone(),
            identifier,
            receiver_public_key: recipient_public_key.to_string(),
            sender_public_key: sender_keys.public_key_pem.clone(),
            nonce: unix_now(),
            encrypted_message,
            signature: String::new(),
        };
        envelope.sign(sender_private_key)?;
        Envelope::Encrypted(envelope)
    } else {
        Envelope::Plain(PlainEnvelope {
            version: PROTOCOL_VERSION,
            status_code: message_information.status_code.code(),
            message_type,
            serialized_message,
            status_message: message_information.status_message.clone(),
            identifier,
        })
    };

    debug!(
        message_type = %message_type,
        identifier = envelope.identifier(),
        encrypted = envelope.is_encrypted(),
        "Envelope built"
    );
    envelope.encode()
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// Decode the envelope header without opening the payload.
pub fn extract_metadata(bytes: &[u8]) -> Result<ProtocolMessageMetadata> {
    Envelope::decode(bytes)?.metadata()
}

/// Replace the status pair and nothing else.
///
/// Identifier, nonce, payload and envelope signature are carried over
/// verbatim. The envelope is not re-signed.
pub fn change_status(bytes: &[u8], status_code: StatusCode, status_message: &str) -> Result<Vec<u8>> {
    let mut envelope = Envelope::decode(bytes)?;
    envelope.set_status(status_code, status_message);
    debug!(
        identifier = envelope.identifier(),
        status_code = status_code.code(),
        "Envelope status changed"
    );
    envelope.encode()
}
