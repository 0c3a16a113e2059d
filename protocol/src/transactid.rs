//! # TransactId Facade
//!
//! One entry point for applications. A [`TransactId`] owns the certificate
//! validator and the optional address information service, and exposes
//! create / parse / validate for every message type plus the envelope
//! operations.
//!
//! ```no_run
//! use transactid_protocol::TransactId;
//! use transactid_protocol::model::InvoiceRequestParameters;
//!
//! let transactid = TransactId::builder().build()?;
//! # let parameters = InvoiceRequestParameters::default();
//! let bytes = transactid.create_invoice_request(&parameters, None)?;
//! assert!(transactid.is_invoice_request_valid(&bytes, None)?);
//! # Ok::<(), transactid_protocol::TransactIdError>(())
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::envelope;
use crate::error::{Result, TransactIdError};
use crate::messages::{
    InvoiceRequest, InvoiceRequestProcessor, MessageProcessor, Payment, PaymentAck,
    PaymentAckProcessor, PaymentProcessor, PaymentRequest, PaymentRequestProcessor,
    ProcessorContext, ProtocolMessageKind,
};
use crate::model::{
    InvoiceRequestParameters, MessageType, PaymentAckParameters, PaymentParameters,
    PaymentRequestParameters, ProtocolMessageMetadata, RecipientParameters, StatusCode,
};
use crate::pki::{CertificateValidator, CrlFetcher, HttpCrlFetcher, TrustSettings};
use crate::services::AddressInformationService;

/// The TransactID message API.
#[derive(Debug, Clone)]
pub struct TransactId {
    invoice_request: InvoiceRequestProcessor,
    payment_request: PaymentRequestProcessor,
    payment: PaymentProcessor,
    payment_ack: PaymentAckProcessor,
}

impl TransactId {
    pub fn builder() -> TransactIdBuilder {
        TransactIdBuilder::default()
    }

    fn from_context(context: ProcessorContext) -> Self {
        Self {
            invoice_request: InvoiceRequestProcessor::new(context.clone()),
            payment_request: PaymentRequestProcessor::new(context.clone()),
            payment: PaymentProcessor::new(context.clone()),
            payment_ack: PaymentAckProcessor::new(context),
        }
    }

    // -- InvoiceRequest -----------------------------------------------------

    pub fn create_invoice_request(
        &self,
        parameters: &InvoiceRequestParameters,
        identifier: Option<String>,
    ) -> Result<Vec<u8>> {
        self.invoice_request.create(parameters, identifier)
    }

    pub fn is_invoice_request_valid(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<bool> {
        self.invoice_request.is_valid(bytes, recipient)
    }

    pub fn parse_invoice_request(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<InvoiceRequest> {
        self.invoice_request.parse(bytes, recipient)
    }

    pub fn parse_invoice_request_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<InvoiceRequest> {
        self.invoice_request.parse_with_addresses_info(bytes, recipient)
    }

    // -- PaymentRequest -----------------------------------------------------

    pub fn create_payment_request(
        &self,
        parameters: &PaymentRequestParameters,
        identifier: Option<String>,
    ) -> Result<Vec<u8>> {
        self.payment_request.create(parameters, identifier)
    }

    pub fn is_payment_request_valid(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<bool> {
        self.payment_request.is_valid(bytes, recipient)
    }

    pub fn parse_payment_request(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<PaymentRequest> {
        self.payment_request.parse(bytes, recipient)
    }

    pub fn parse_payment_request_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<PaymentRequest> {
        self.payment_request.parse_with_addresses_info(bytes, recipient)
    }

    // -- Payment ------------------------------------------------------------

    pub fn create_payment(
        &self,
        parameters: &PaymentParameters,
        identifier: Option<String>,
    ) -> Result<Vec<u8>> {
        self.payment.create(parameters, identifier)
    }

    pub fn is_payment_valid(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<bool> {
        self.payment.is_valid(bytes, recipient)
    }

    pub fn parse_payment(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<Payment> {
        self.payment.parse(bytes, recipient)
    }

    /// Always [`TransactIdError::UnsupportedOperation`].
    pub fn parse_payment_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<Payment> {
        self.payment.parse_with_addresses_info(bytes, recipient)
    }

    // -- PaymentAck ---------------------------------------------------------

    pub fn create_payment_ack(
        &self,
        parameters: &PaymentAckParameters,
        identifier: Option<String>,
    ) -> Result<Vec<u8>> {
        self.payment_ack.create(parameters, identifier)
    }

    pub fn is_payment_ack_valid(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<bool> {
        self.payment_ack.is_valid(bytes, recipient)
    }

    pub fn parse_payment_ack(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<PaymentAck> {
        self.payment_ack.parse(bytes, recipient)
    }

    /// Always [`TransactIdError::UnsupportedOperation`].
    pub fn parse_payment_ack_with_addresses_info(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<PaymentAck> {
        self.payment_ack.parse_with_addresses_info(bytes, recipient)
    }

    // -- Any message --------------------------------------------------------

    /// Envelope header, readable without keys.
    pub fn get_protocol_message_metadata(&self, bytes: &[u8]) -> Result<ProtocolMessageMetadata> {
        envelope::extract_metadata(bytes)
    }

    /// Replace the status pair, keeping identifier, nonce, payload and
    /// signature.
    pub fn change_status_protocol_message(
        &self,
        bytes: &[u8],
        status_code: StatusCode,
        status_message: &str,
    ) -> Result<Vec<u8>> {
        envelope::change_status(bytes, status_code, status_message)
    }

    /// Parse whatever message the envelope carries.
    pub fn parse_protocol_message(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<ProtocolMessageKind> {
        Ok(match self.get_protocol_message_metadata(bytes)?.message_type {
            MessageType::InvoiceRequest => {
                ProtocolMessageKind::InvoiceRequest(self.parse_invoice_request(bytes, recipient)?)
            }
            MessageType::PaymentRequest => {
                ProtocolMessageKind::PaymentRequest(self.parse_payment_request(bytes, recipient)?)
            }
            MessageType::Payment => ProtocolMessageKind::Payment(self.parse_payment(bytes, recipient)?),
            MessageType::PaymentAck => {
                ProtocolMessageKind::PaymentAck(self.parse_payment_ack(bytes, recipient)?)
            }
        })
    }

    /// Validate whatever message the envelope carries.
    pub fn is_protocol_message_valid(
        &self,
        bytes: &[u8],
        recipient: Option<&RecipientParameters>,
    ) -> Result<bool> {
        match self.get_protocol_message_metadata(bytes)?.message_type {
            MessageType::InvoiceRequest => self.is_invoice_request_valid(bytes, recipient),
            MessageType::PaymentRequest => self.is_payment_request_valid(bytes, recipient),
            MessageType::Payment => self.is_payment_valid(bytes, recipient),
            MessageType::PaymentAck => self.is_payment_ack_valid(bytes, recipient),
        }
    }
}

/// Assembles a [`TransactId`].
///
/// Without an explicit fetcher, CRLs are downloaded over HTTP(S) with
/// `TrustSettings::crl_timeout`.
#[derive(Default)]
pub struct TransactIdBuilder {
    crl_fetcher: Option<Arc<dyn CrlFetcher>>,
    address_information: Option<Arc<dyn AddressInformationService>>,
    trust_settings: TrustSettings,
}

impl TransactIdBuilder {
    pub fn crl_fetcher(mut self, fetcher: Arc<dyn CrlFetcher>) -> Self {
        self.crl_fetcher = Some(fetcher);
        self
    }

    pub fn address_information_service(mut self, service: Arc<dyn AddressInformationService>) -> Self {
        self.address_information = Some(service);
        self
    }

    pub fn crl_timeout(mut self, timeout: Duration) -> Self {
        self.trust_settings.crl_timeout = timeout;
        self
    }

    pub fn trust_settings(mut self, settings: TrustSettings) -> Self {
        self.trust_settings = settings;
        self
    }

    pub fn build(self) -> Result<TransactId> {
        if self.trust_settings.crl_timeout.is_zero() {
            return Err(TransactIdError::Configuration(
                "CRL timeout must be greater than zero".into(),
            ));
        }
        let fetcher: Arc<dyn CrlFetcher> = match self.crl_fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                HttpCrlFetcher::new(self.trust_settings.crl_timeout)
                    .map_err(|e| TransactIdError::Configuration(e.to_string()))?,
            ),
        };
        info!(
            crl_timeout_ms = self.trust_settings.crl_timeout.as_millis() as u64,
            address_information = self.address_information.is_some(),
            "TransactId initialized"
        );
        let context = ProcessorContext::new(CertificateValidator::new(fetcher), self.address_information);
        Ok(TransactId::from_context(context))
    }
}
