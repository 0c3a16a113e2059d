//! # Protocol Messages
//!
//! One processor per message type, all speaking the same four operations
//! ([`MessageProcessor`]):
//!
//! | operation                  | what it does                                      |
//! |----------------------------|---------------------------------------------------|
//! | `create`                   | validate owners, sign, wrap (and maybe encrypt)   |
//! | `is_valid`                 | open, then check every signature and certificate  |
//! | `parse`                    | open and decode, no validation at all             |
//! | `parse_with_addresses_info`| `parse` plus address risk lookups                 |
//!
//! `parse` never validates. Callers that need trust call `is_valid`.
//!
//! ## Validation order
//!
//! Validation is fail-fast. The first failing check aborts with a typed
//! error naming what failed:
//!
//! 1. envelope signature (encrypted envelopes only)
//! 2. sender certificate, then sender signature (InvoiceRequest and
//!    PaymentRequest)
//! 3. sender EV certificate, when one is present (InvoiceRequest)
//! 4. every attestation certificate, plus the attestation signature for
//!    owners that sign

pub mod invoice_request;
pub mod payment;
pub mod payment_ack;
pub mod payment_request;

pub use invoice_request::{InvoiceRequest, InvoiceRequestProcessor};
pub use payment::{Payment, PaymentProcessor};
pub use payment_ack::{PaymentAck, PaymentAckProcessor};
pub use payment_request::{PaymentDetails, PaymentRequest, PaymentRequestMessage, PaymentRequestProcessor};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::codec;
use crate::crypto;
use crate::envelope::Envelope;
use crate::error::{Result, TransactIdError};
use crate::model::{
    MessageType, Output, Owner, OwnerType, PkiType, ProtocolMessageMetadata, RecipientParameters,
    SenderParameters,
};
use crate::pki::CertificateValidator;
use crate::services::AddressInformationService;

// ---------------------------------------------------------------------------
// Processor contract
// ---------------------------------------------------------------------------

/// The operations every message type supports.
pub trait MessageProcessor {
    /// Parsed, caller-facing message.
    type Message;
    /// Inputs to [`MessageProcessor::create`].
    type Parameters;

    const MESSAGE_TYPE: MessageType;

    /// Build, sign and wrap a message. `identifier` overrides the derived
    /// one.
    fn create(&self, parameters: &Self::Parameters, identifier: Option<String>) -> Result<Vec<u8>>;

    /// Run every check. `Ok(true)` or the first failure.
    fn is_valid(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<bool>;

    /// Decode without validating.
    fn parse(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<Self::Message>;

    /// [`MessageProcessor::parse`], then attach address information to every
    /// output the message type carries.
    fn parse_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<Self::Message>;
}

/// Collaborators shared by every processor.
#[derive(Clone)]
pub struct ProcessorContext {
    pub validator: CertificateValidator,
    pub address_information: Option<Arc<dyn AddressInformationService>>,
}

impl ProcessorContext {
    pub fn new(
        validator: CertificateValidator,
        address_information: Option<Arc<dyn AddressInformationService>>,
    ) -> Self {
        Self {
            validator,
            address_information,
        }
    }

    /// Look up and attach address information for every output.
    pub(crate) fn enrich_outputs(&self, outputs: &mut [Output]) -> Result<()> {
        let service = self.address_information.as_ref().ok_or_else(|| {
            TransactIdError::UnsupportedOperation(
                "no address information service configured".into(),
            )
        })?;
        for output in outputs.iter_mut() {
            output.address_information =
                service.get_address_information(output.currency, &output.script)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProcessorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorContext")
            .field("validator", &self.validator)
            .field("address_information", &self.address_information.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

/// A decoded envelope with its header and opened payload.
pub(crate) struct OpenedEnvelope {
    pub envelope: Envelope,
    pub metadata: ProtocolMessageMetadata,
    pub payload: Vec<u8>,
}

/// Decode the envelope, check it carries `expected`, and open the payload.
pub(crate) fn open_envelope(
    bytes: &[u8],
    expected: MessageType,
    recipient: Option<&RecipientParameters>,
) -> Result<OpenedEnvelope> {
    let envelope = Envelope::decode(bytes)?;
    let metadata = envelope.metadata()?;
    if metadata.message_type != expected {
        return Err(TransactIdError::invalid_object(
            expected.name(),
            format!("envelope carries a {}", metadata.message_type),
        ));
    }
    let payload = envelope.open(recipient)?;
    Ok(OpenedEnvelope {
        envelope,
        metadata,
        payload,
    })
}

pub(crate) fn decode_message<T: DeserializeOwned>(payload: &[u8], message_type: MessageType) -> Result<T> {
    codec::decode(payload).map_err(|e| TransactIdError::invalid_object(message_type.name(), e))
}

// ---------------------------------------------------------------------------
// Sender signature
// ---------------------------------------------------------------------------

/// Sender PKI fields as they go on the wire: type, certificate, and the
/// signing key when the type is X.509.
pub(crate) fn sender_pki(sender: &SenderParameters) -> (PkiType, String) {
    match &sender.pki_data_parameters {
        Some(parameters) => (parameters.pki_type, parameters.certificate_pem.clone()),
        None => (PkiType::None, String::new()),
    }
}

/// Top-level sender signature over `unsigned`, whose signature field must
/// already be empty. Empty for unsigned senders.
pub(crate) fn sign_as_sender<T: Serialize>(sender: &SenderParameters, unsigned: &T) -> Result<String> {
    match &sender.pki_data_parameters {
        Some(parameters) if parameters.pki_type == PkiType::X509Sha256 => {
            let hash = codec::signing_hash(unsigned)?;
            Ok(crypto::sign(&hash, &parameters.private_key_pem)?)
        }
        _ => Ok(String::new()),
    }
}

/// Validate the sender certificate, then the sender signature over
/// `unsigned`.
pub(crate) fn verify_sender<T: Serialize>(
    validator: &CertificateValidator,
    pki_type: PkiType,
    certificate_pem: &str,
    signature: &str,
    unsigned: &T,
) -> Result<()> {
    validator.validate_certificate(pki_type, certificate_pem)?;
    if pki_type == PkiType::None {
        return Ok(());
    }
    let hash = codec::signing_hash(unsigned)?;
    if !matches!(crypto::verify(signature, &hash, certificate_pem), Ok(true)) {
        warn!("Sender message signature rejected");
        return Err(TransactIdError::InvalidSignature(
            "sender message signature invalid".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Attestations
// ---------------------------------------------------------------------------

/// Validate every attestation certificate of every owner. When
/// `check_signatures` is set, the primary owner's attestation signatures
/// must verify too.
pub(crate) fn validate_attestations(
    validator: &CertificateValidator,
    owners: &[Owner],
    owner_type: OwnerType,
    check_signatures: bool,
) -> Result<()> {
    for owner in owners {
        for pki_data in &owner.pki_data_set {
            let attestation = pki_data.attestation_name();
            if let Err(err) = validator.validate_certificate(pki_data.pki_type, &pki_data.certificate_pem) {
                warn!(%owner_type, attestation, error = %err, "Attestation certificate rejected");
                return Err(TransactIdError::InvalidCertificateChain(format!(
                    "invalid {owner_type} certificate for attestation {attestation}: {err}"
                )));
            }

            if check_signatures
                && owner.primary_for_transaction
                && !matches!(pki_data.verify_signature(), Ok(true))
            {
                warn!(%owner_type, attestation, "Attestation signature rejected");
                return Err(TransactIdError::InvalidSignature(format!(
                    "invalid {owner_type} signature for attestation {attestation}"
                )));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Any message
// ---------------------------------------------------------------------------

/// A parsed message of any type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "message_type", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolMessageKind {
    InvoiceRequest(InvoiceRequest),
    PaymentRequest(PaymentRequest),
    Payment(Payment),
    PaymentAck(PaymentAck),
}

impl ProtocolMessageKind {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::InvoiceRequest(_) => MessageType::InvoiceRequest,
            Self::PaymentRequest(_) => MessageType::PaymentRequest,
            Self::Payment(_) => MessageType::Payment,
            Self::PaymentAck(_) => MessageType::PaymentAck,
        }
    }

    pub fn metadata(&self) -> Option<&ProtocolMessageMetadata> {
        match self {
            Self::InvoiceRequest(m) => m.protocol_message_metadata.as_ref(),
            Self::PaymentRequest(m) => m.protocol_message_metadata.as_ref(),
            Self::Payment(m) => m.protocol_message_metadata.as_ref(),
            Self::PaymentAck(m) => m.protocol_message_metadata.as_ref(),
        }
    }
}
