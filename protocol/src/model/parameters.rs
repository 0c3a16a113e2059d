//! Caller-supplied inputs to the create operations.
//!
//! Every parameter struct deserializes from JSON with sensible defaults, so
//! the CLI can build messages from a parameters file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::attestation::Attestation;
use super::output::Output;
use super::owner::OwnerParameters;
use super::pki_data::PkiDataParameters;
use super::status::MessageInformation;
use crate::config::DEFAULT_NETWORK;
use crate::messages::Payment;

/// secp256k1 keys used to seal or open an envelope.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionParameters {
    pub public_key_pem: String,
    /// Needed by the sender to encrypt and by the recipient to decrypt.
    #[serde(default)]
    pub private_key_pem: Option<String>,
}

impl EncryptionParameters {
    pub fn new(public_key_pem: impl Into<String>, private_key_pem: Option<String>) -> Self {
        Self {
            public_key_pem: public_key_pem.into(),
            private_key_pem,
        }
    }
}

impl fmt::Debug for EncryptionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionParameters")
            .field("public_key_pem", &self.public_key_pem)
            .field(
                "private_key_pem",
                &self.private_key_pem.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// The party creating a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderParameters {
    /// Key and certificate for the top-level sender signature.
    #[serde(default)]
    pub pki_data_parameters: Option<PkiDataParameters>,
    /// An EV certificate offered alongside the sender certificate.
    #[serde(default)]
    pub ev_certificate_pem: Option<String>,
    #[serde(default)]
    pub encryption_parameters: Option<EncryptionParameters>,
}

/// The party a message is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientParameters {
    #[serde(default)]
    pub vasp_name: String,
    #[serde(default)]
    pub chain_address: Option<String>,
    #[serde(default)]
    pub encryption_parameters: Option<EncryptionParameters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequestParameters {
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub notification_url: String,
    #[serde(default)]
    pub originators_addresses: Vec<Output>,
    #[serde(default)]
    pub originator_parameters: Vec<OwnerParameters>,
    #[serde(default)]
    pub beneficiary_parameters: Vec<OwnerParameters>,
    #[serde(default)]
    pub sender_parameters: SenderParameters,
    #[serde(default)]
    pub attestations_requested: Vec<Attestation>,
    #[serde(default)]
    pub recipient_parameters: Option<RecipientParameters>,
    #[serde(default)]
    pub message_information: MessageInformation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestParameters {
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default)]
    pub beneficiaries_addresses: Vec<Output>,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub payment_url: String,
    #[serde(default)]
    pub merchant_data: String,
    #[serde(default)]
    pub beneficiary_parameters: Vec<OwnerParameters>,
    #[serde(default)]
    pub sender_parameters: SenderParameters,
    #[serde(default)]
    pub attestations_requested: Vec<Attestation>,
    #[serde(default)]
    pub recipient_parameters: Option<RecipientParameters>,
    #[serde(default)]
    pub message_information: MessageInformation,
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

impl Default for PaymentRequestParameters {
    fn default() -> Self {
        Self {
            network: default_network(),
            beneficiaries_addresses: Vec::new(),
            time: Utc::now(),
            expires: None,
            memo: String::new(),
            payment_url: String::new(),
            merchant_data: String::new(),
            beneficiary_parameters: Vec::new(),
            sender_parameters: SenderParameters::default(),
            attestations_requested: Vec::new(),
            recipient_parameters: None,
            message_information: MessageInformation::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentParameters {
    #[serde(default)]
    pub merchant_data: Option<String>,
    /// Signed transactions, opaque to this crate.
    #[serde(default)]
    pub transactions: Vec<Vec<u8>>,
    /// Refund outputs.
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub originator_parameters: Vec<OwnerParameters>,
    #[serde(default)]
    pub beneficiary_parameters: Vec<OwnerParameters>,
    /// Only the encryption keys are used: Payment carries no sender
    /// signature.
    #[serde(default)]
    pub sender_parameters: SenderParameters,
    #[serde(default)]
    pub recipient_parameters: Option<RecipientParameters>,
    #[serde(default)]
    pub message_information: MessageInformation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAckParameters {
    /// The payment being acknowledged.
    pub payment: Payment,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub sender_parameters: SenderParameters,
    #[serde(default)]
    pub recipient_parameters: Option<RecipientParameters>,
    #[serde(default)]
    pub message_information: MessageInformation,
}
