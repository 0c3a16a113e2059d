//! # Payment
//!
//! The originator's payment: signed transactions, refund outputs and the
//! parties involved. There is no top-level sender signature; trust comes
//! from the attestations alone. Both owner lists are optional, and when
//! present each needs exactly one primary owner. Only the primary
//! originator signs its attestations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    decode_message, open_envelope, validate_attestations, MessageProcessor, ProcessorContext,
};
use crate::codec;
use crate::envelope;
use crate::error::{Result, TransactIdError};
use crate::model::{
    to_owners, validate_owners, Beneficiary, MessageType, Originator, Output, OwnerType,
    PaymentParameters, ProtocolMessageMetadata, RecipientParameters,
};
use crate::pki::CertificateValidator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub merchant_data: Option<String>,
    /// Signed transactions, opaque to this crate.
    pub transactions: Vec<Vec<u8>>,
    /// Where to send refunds.
    pub outputs: Vec<Output>,
    pub memo: Option<String>,
    pub beneficiaries: Vec<Beneficiary>,
    pub originators: Vec<Originator>,
    #[serde(skip)]
    pub protocol_message_metadata: Option<ProtocolMessageMetadata>,
}

impl Payment {
    /// Build the wire payment from parameters, validating both owner lists.
    pub(crate) fn from_parameters(parameters: &PaymentParameters) -> Result<Self> {
        validate_owners(&parameters.originator_parameters, false, OwnerType::Originator)?;
        validate_owners(&parameters.beneficiary_parameters, false, OwnerType::Beneficiary)?;
        Ok(Self {
            merchant_data: parameters.merchant_data.clone(),
            transactions: parameters.transactions.clone(),
            outputs: parameters.outputs.clone(),
            memo: parameters.memo.clone(),
            beneficiaries: to_owners(&parameters.beneficiary_parameters, false)?,
            originators: to_owners(&parameters.originator_parameters, true)?,
            protocol_message_metadata: None,
        })
    }

    /// Certificate checks for every attestation, signature checks for the
    /// primary originator's.
    pub(crate) fn validate_attestations(&self, validator: &CertificateValidator) -> Result<()> {
        validate_owners(&self.originators, false, OwnerType::Originator)?;
        validate_owners(&self.beneficiaries, false, OwnerType::Beneficiary)?;
        validate_attestations(validator, &self.originators, OwnerType::Originator, true)?;
        validate_attestations(validator, &self.beneficiaries, OwnerType::Beneficiary, false)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentProcessor {
    context: ProcessorContext,
}

impl PaymentProcessor {
    pub fn new(context: ProcessorContext) -> Self {
        Self { context }
    }
}

impl MessageProcessor for PaymentProcessor {
    type Message = Payment;
    type Parameters = PaymentParameters;

    const MESSAGE_TYPE: MessageType = MessageType::Payment;

    fn create(&self, parameters: &PaymentParameters, identifier: Option<String>) -> Result<Vec<u8>> {
        let payment = Payment::from_parameters(parameters)?;
        debug!(
            transactions = payment.transactions.len(),
            originators = payment.originators.len(),
            "Payment assembled"
        );
        envelope::wrap(
            Self::MESSAGE_TYPE,
            codec::encode(&payment)?,
            &parameters.message_information,
            &parameters.sender_parameters,
            parameters.recipient_parameters.as_ref(),
            identifier,
        )
    }

    fn is_valid(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<bool> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        opened.envelope.verify()?;
        let payment: Payment = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        payment.validate_attestations(&self.context.validator)?;
        debug!(identifier = %opened.metadata.identifier, "Payment valid");
        Ok(true)
    }

    fn parse(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<Payment> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        let mut payment: Payment = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        payment.protocol_message_metadata = Some(opened.metadata);
        Ok(payment)
    }

    fn parse_with_addresses_info(
        &self,
        _bytes: &[u8],
        _recipient: Option<&RecipientParameters>,
    ) -> Result<Payment> {
        Err(TransactIdError::UnsupportedOperation(
            "Payment carries no addresses to look up".into(),
        ))
    }
}
