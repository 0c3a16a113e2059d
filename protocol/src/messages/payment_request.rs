//! # PaymentRequest
//!
//! The beneficiary VASP's answer to an InvoiceRequest: where to pay, until
//! when, and who the beneficiaries are.
//!
//! On the wire the payment terms live in a separately serialized
//! [`PaymentDetails`] blob inside [`PaymentRequestMessage`], and the sender
//! signature covers the message including those bytes. Callers never see
//! that split: [`PaymentRequest`] is the flattened view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    decode_message, open_envelope, sender_pki, sign_as_sender, validate_attestations,
    verify_sender, MessageProcessor, ProcessorContext,
};
use crate::codec;
use crate::config::PAYMENT_DETAILS_VERSION;
use crate::envelope;
use crate::error::{Result, TransactIdError};
use crate::model::{
    to_owners, validate_owners, Attestation, Beneficiary, MessageType, Output, OwnerType,
    PaymentRequestParameters, PkiType, ProtocolMessageMetadata, RecipientParameters,
};

/// Payment terms. Times are whole unix seconds, as in BIP-70 PaymentDetails;
/// `expires == 0` means no expiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub network: String,
    pub beneficiaries_addresses: Vec<Output>,
    pub time: u64,
    pub expires: u64,
    pub memo: String,
    pub payment_url: String,
    pub merchant_data: String,
}

/// Wire form of a PaymentRequest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequestMessage {
    pub payment_details_version: u32,
    pub serialized_payment_details: Vec<u8>,
    pub beneficiaries: Vec<Beneficiary>,
    pub attestations_requested: Vec<Attestation>,
    pub sender_pki_type: PkiType,
    pub sender_pki_data: String,
    pub sender_signature: String,
}

impl PaymentRequestMessage {
    pub fn unsigned(&self) -> Self {
        Self {
            sender_signature: String::new(),
            ..self.clone()
        }
    }
}

/// A parsed PaymentRequest with its payment details flattened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payment_details_version: u32,
    pub network: String,
    pub beneficiaries_addresses: Vec<Output>,
    pub time: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub memo: String,
    pub payment_url: String,
    pub merchant_data: String,
    pub beneficiaries: Vec<Beneficiary>,
    pub attestations_requested: Vec<Attestation>,
    pub sender_pki_type: PkiType,
    pub sender_pki_data: String,
    pub sender_signature: String,
    #[serde(skip)]
    pub protocol_message_metadata: Option<ProtocolMessageMetadata>,
}

impl PaymentRequest {
    fn from_wire(message: PaymentRequestMessage, metadata: ProtocolMessageMetadata) -> Result<Self> {
        let details: PaymentDetails =
            codec::decode(&message.serialized_payment_details).map_err(|e| {
                TransactIdError::invalid_object("PaymentDetails", e)
            })?;
        let time = from_unix(details.time)?;
        let expires = match details.expires {
            0 => None,
            seconds => Some(from_unix(seconds)?),
        };
        Ok(Self {
            payment_details_version: message.payment_details_version,
            network: details.network,
            beneficiaries_addresses: details.beneficiaries_addresses,
            time,
            expires,
            memo: details.memo,
            payment_url: details.payment_url,
            merchant_data: details.merchant_data,
            beneficiaries: message.beneficiaries,
            attestations_requested: message.attestations_requested,
            sender_pki_type: message.sender_pki_type,
            sender_pki_data: message.sender_pki_data,
            sender_signature: message.sender_signature,
            protocol_message_metadata: Some(metadata),
        })
    }

    /// Whether the request has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| now > expires)
    }
}

/// Whole unix seconds; sub-second precision is dropped. Times before the
/// epoch have no wire form.
fn to_unix(field: &str, time: DateTime<Utc>) -> Result<u64> {
    u64::try_from(time.timestamp()).map_err(|_| {
        TransactIdError::invalid_object("PaymentDetails", format!("{field} before 1970: {time}"))
    })
}

/// `0` is reserved for "no expiry", so an expiry must fall after the epoch.
fn expires_to_unix(expires: Option<DateTime<Utc>>) -> Result<u64> {
    let Some(expires) = expires else {
        return Ok(0);
    };
    match to_unix("expires", expires)? {
        0 => Err(TransactIdError::invalid_object(
            "PaymentDetails",
            "expires must be after 1970-01-01T00:00:00Z",
        )),
        seconds => Ok(seconds),
    }
}

fn from_unix(seconds: u64) -> Result<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| {
            TransactIdError::invalid_object("PaymentDetails", format!("time out of range: {seconds}"))
        })
}

#[derive(Debug, Clone)]
pub struct PaymentRequestProcessor {
    context: ProcessorContext,
}

impl PaymentRequestProcessor {
    pub fn new(context: ProcessorContext) -> Self {
        Self { context }
    }

    fn decode(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<(PaymentRequestMessage, ProtocolMessageMetadata, crate::envelope::Envelope)> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        let message: PaymentRequestMessage = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        Ok((message, opened.metadata, opened.envelope))
    }
}

impl MessageProcessor for PaymentRequestProcessor {
    type Message = PaymentRequest;
    type Parameters = PaymentRequestParameters;

    const MESSAGE_TYPE: MessageType = MessageType::PaymentRequest;

    fn create(&self, parameters: &PaymentRequestParameters, identifier: Option<String>) -> Result<Vec<u8>> {
        validate_owners(&parameters.beneficiary_parameters, true, OwnerType::Beneficiary)?;

        let details = PaymentDetails {
            network: parameters.network.clone(),
            beneficiaries_addresses: parameters.beneficiaries_addresses.clone(),
            time: to_unix("time", parameters.time)?,
            expires: expires_to_unix(parameters.expires)?,
            memo: parameters.memo.clone(),
            payment_url: parameters.payment_url.clone(),
            merchant_data: parameters.merchant_data.clone(),
        };

        let sender = &parameters.sender_parameters;
        let (sender_pki_type, sender_pki_data) = sender_pki(sender);
        let mut message = PaymentRequestMessage {
            payment_details_version: PAYMENT_DETAILS_VERSION,
            serialized_payment_details: codec::encode(&details)?,
            beneficiaries: to_owners(&parameters.beneficiary_parameters, true)?,
            attestations_requested: parameters.attestations_requested.clone(),
            sender_pki_type,
            sender_pki_data,
            sender_signature: String::new(),
        };
        message.sender_signature = sign_as_sender(sender, &message)?;

        debug!(
            beneficiaries = message.beneficiaries.len(),
            outputs = details.beneficiaries_addresses.len(),
            "PaymentRequest assembled"
        );

        envelope::wrap(
            Self::MESSAGE_TYPE,
            codec::encode(&message)?,
            &parameters.message_information,
            sender,
            parameters.recipient_parameters.as_ref(),
            identifier,
        )
    }

    fn is_valid(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<bool> {
        let (message, metadata, envelope) = self.decode(bytes, recipient)?;
        envelope.verify()?;
        let validator = &self.context.validator;

        verify_sender(
            validator,
            message.sender_pki_type,
            &message.sender_pki_data,
            &message.sender_signature,
            &message.unsigned(),
        )?;
        validate_attestations(validator, &message.beneficiaries, OwnerType::Beneficiary, true)?;

        debug!(identifier = %metadata.identifier, "PaymentRequest valid");
        Ok(true)
    }

    fn parse(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<PaymentRequest> {
        let (message, metadata, _) = self.decode(bytes, recipient)?;
        PaymentRequest::from_wire(message, metadata)
    }

    fn parse_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<PaymentRequest> {
        let mut request = self.parse(bytes, recipient)?;
        self.context
            .enrich_outputs(&mut request.beneficiaries_addresses)?;
        Ok(request)
    }
}
