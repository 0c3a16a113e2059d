//! # InvoiceRequest
//!
//! Sent by the originating VASP to ask the beneficiary's VASP for a
//! PaymentRequest. Carries the originators (required, primary one signs its
//! attestations), optional unsigned beneficiaries, the originator funding
//! addresses and the attestations the sender wants back.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    decode_message, open_envelope, sender_pki, sign_as_sender, validate_attestations,
    verify_sender, MessageProcessor, ProcessorContext,
};
use crate::envelope;
use crate::error::{Result, TransactIdError};
use crate::model::{
    to_owners, validate_owners, Attestation, Beneficiary, InvoiceRequestParameters, MessageType,
    Originator, Output, OwnerType, PkiType, ProtocolMessageMetadata, RecipientParameters,
};

/// An InvoiceRequest, as sent on the wire and as handed to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub amount: u64,
    pub memo: String,
    pub notification_url: String,
    pub originators_addresses: Vec<Output>,
    pub originators: Vec<Originator>,
    pub beneficiaries: Vec<Beneficiary>,
    pub attestations_requested: Vec<Attestation>,
    pub sender_pki_type: PkiType,
    pub sender_pki_data: String,
    pub sender_signature: String,
    pub sender_ev_cert: String,
    pub recipient_vasp_name: String,
    pub recipient_chain_address: String,
    /// Envelope header, set by parse only.
    #[serde(skip)]
    pub protocol_message_metadata: Option<ProtocolMessageMetadata>,
}

impl InvoiceRequest {
    /// Copy with the sender signature emptied.
    pub fn unsigned(&self) -> Self {
        Self {
            sender_signature: String::new(),
            protocol_message_metadata: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceRequestProcessor {
    context: ProcessorContext,
}

impl InvoiceRequestProcessor {
    pub fn new(context: ProcessorContext) -> Self {
        Self { context }
    }

    fn decode(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<InvoiceRequest> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        let mut message: InvoiceRequest = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        message.protocol_message_metadata = Some(opened.metadata);
        Ok(message)
    }
}

impl MessageProcessor for InvoiceRequestProcessor {
    type Message = InvoiceRequest;
    type Parameters = InvoiceRequestParameters;

    const MESSAGE_TYPE: MessageType = MessageType::InvoiceRequest;

    fn create(&self, parameters: &InvoiceRequestParameters, identifier: Option<String>) -> Result<Vec<u8>> {
        validate_owners(&parameters.originator_parameters, true, OwnerType::Originator)?;
        validate_owners(&parameters.beneficiary_parameters, false, OwnerType::Beneficiary)?;

        let sender = &parameters.sender_parameters;
        let (sender_pki_type, sender_pki_data) = sender_pki(sender);
        let recipient = parameters.recipient_parameters.as_ref();

        let mut message = InvoiceRequest {
            amount: parameters.amount,
            memo: parameters.memo.clone(),
            notification_url: parameters.notification_url.clone(),
            originators_addresses: parameters.originators_addresses.clone(),
            originators: to_owners(&parameters.originator_parameters, true)?,
            beneficiaries: to_owners(&parameters.beneficiary_parameters, false)?,
            attestations_requested: parameters.attestations_requested.clone(),
            sender_pki_type,
            sender_pki_data,
            sender_signature: String::new(),
            sender_ev_cert: sender.ev_certificate_pem.clone().unwrap_or_default(),
            recipient_vasp_name: recipient.map(|r| r.vasp_name.clone()).unwrap_or_default(),
            recipient_chain_address: recipient
                .and_then(|r| r.chain_address.clone())
                .unwrap_or_default(),
            protocol_message_metadata: None,
        };
        message.sender_signature = sign_as_sender(sender, &message)?;

        debug!(
            originators = message.originators.len(),
            beneficiaries = message.beneficiaries.len(),
            signed = !message.sender_signature.is_empty(),
            "InvoiceRequest assembled"
        );

        envelope::wrap(
            Self::MESSAGE_TYPE,
            crate::codec::encode(&message)?,
            &parameters.message_information,
            sender,
            recipient,
            identifier,
        )
    }

    fn is_valid(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<bool> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        opened.envelope.verify()?;
        let message: InvoiceRequest = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        let validator = &self.context.validator;

        verify_sender(
            validator,
            message.sender_pki_type,
            &message.sender_pki_data,
            &message.sender_signature,
            &message.unsigned(),
        )?;

        if !message.sender_ev_cert.trim().is_empty()
            && !matches!(validator.is_ev_certificate(&message.sender_ev_cert), Ok(true))
        {
            warn!(identifier = %opened.metadata.identifier, "Sender EV certificate rejected");
            return Err(TransactIdError::InvalidCertificate(
                "sender EV certificate is not an EV certificate".into(),
            ));
        }

        validate_attestations(validator, &message.originators, OwnerType::Originator, true)?;
        validate_attestations(validator, &message.beneficiaries, OwnerType::Beneficiary, false)?;

        debug!(identifier = %opened.metadata.identifier, "InvoiceRequest valid");
        Ok(true)
    }

    fn parse(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<InvoiceRequest> {
        self.decode(bytes, recipient)
    }

    fn parse_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<InvoiceRequest> {
        let mut message = self.decode(bytes, recipient)?;
        self.context
            .enrich_outputs(&mut message.originators_addresses)?;
        Ok(message)
    }
}
