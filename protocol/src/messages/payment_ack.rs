//! # PaymentAck
//!
//! The beneficiary VASP's receipt for a Payment. It echoes the full payment
//! back with a memo. Validation covers the envelope and the embedded
//! payment's attestations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{decode_message, open_envelope, MessageProcessor, Payment, ProcessorContext};
use crate::codec;
use crate::envelope;
use crate::error::{Result, TransactIdError};
use crate::model::{MessageType, PaymentAckParameters, ProtocolMessageMetadata, RecipientParameters};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAck {
    pub payment: Payment,
    pub memo: String,
    #[serde(skip)]
    pub protocol_message_metadata: Option<ProtocolMessageMetadata>,
}

#[derive(Debug, Clone)]
pub struct PaymentAckProcessor {
    context: ProcessorContext,
}

impl PaymentAckProcessor {
    pub fn new(context: ProcessorContext) -> Self {
        Self { context }
    }
}

impl MessageProcessor for PaymentAckProcessor {
    type Message = PaymentAck;
    type Parameters = PaymentAckParameters;

    const MESSAGE_TYPE: MessageType = MessageType::PaymentAck;

    fn create(&self, parameters: &PaymentAckParameters, identifier: Option<String>) -> Result<Vec<u8>> {
        let ack = PaymentAck {
            payment: Payment {
                protocol_message_metadata: None,
                ..parameters.payment.clone()
            },
            memo: parameters.memo.clone(),
            protocol_message_metadata: None,
        };
        debug!("PaymentAck assembled");
        envelope::wrap(
            Self::MESSAGE_TYPE,
            codec::encode(&ack)?,
            &parameters.message_information,
            &parameters.sender_parameters,
            parameters.recipient_parameters.as_ref(),
            identifier,
        )
    }

    fn is_valid(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<bool> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        opened.envelope.verify()?;
        let ack: PaymentAck = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        ack.payment.validate_attestations(&self.context.validator)?;
        debug!(identifier = %opened.metadata.identifier, "PaymentAck valid");
        Ok(true)
    }

    fn parse(&self, bytes: &[u8], recipient: Option<&RecipientParameters>) -> Result<PaymentAck> {
        let opened = open_envelope(bytes, Self::MESSAGE_TYPE, recipient)?;
        let mut ack: PaymentAck = decode_message(&opened.payload, Self::MESSAGE_TYPE)?;
        ack.protocol_message_metadata = Some(opened.metadata);
        Ok(ack)
    }

    fn parse_with_addresses_info(
        &self,
        _bytes: &[u8],
        _recipient: Option<&RecipientParameters>,
    ) -> Result<PaymentAck> {
        Err(TransactIdError::UnsupportedOperation(
            "PaymentAck carries no addresses to look up".into(),
        ))
    }
}
