//! Message types, status codes and per-message envelope options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The four TransactID messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    InvoiceRequest,
    PaymentRequest,
    Payment,
    PaymentAck,
}

impl MessageType {
    /// Type name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvoiceRequest => "InvoiceRequest",
            Self::PaymentRequest => "PaymentRequest",
            Self::Payment => "Payment",
            Self::PaymentAck => "PaymentAck",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "invoicerequest" => Ok(Self::InvoiceRequest),
            "paymentrequest" => Ok(Self::PaymentRequest),
            "payment" => Ok(Self::Payment),
            "paymentack" => Ok(Self::PaymentAck),
            _ => Err(format!("unknown message type: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusCode
// ---------------------------------------------------------------------------

/// Status carried in every envelope. Travels as its numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    #[default]
    Ok,
    Cancel,
    GeneralUnknownError,
    VersionTooHigh,
    AuthenticationFailed,
    EncryptedMessageRequired,
    AmountTooHigh,
    AmountTooLow,
    AmountInvalid,
    PaymentDoesNotCoverInvoice,
    CertificateRequired,
    CertificateExpired,
    CertificateInvalidForTransaction,
    CertificateRevoked,
    CertificateNotWellRooted,
}

impl StatusCode {
    pub const ALL: [StatusCode; 15] = [
        Self::Ok,
        Self::Cancel,
        Self::GeneralUnknownError,
        Self::VersionTooHigh,
        Self::AuthenticationFailed,
        Self::EncryptedMessageRequired,
        Self::AmountTooHigh,
        Self::AmountTooLow,
        Self::AmountInvalid,
        Self::PaymentDoesNotCoverInvoice,
        Self::CertificateRequired,
        Self::CertificateExpired,
        Self::CertificateInvalidForTransaction,
        Self::CertificateRevoked,
        Self::CertificateNotWellRooted,
    ];

    /// Numeric wire code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Ok => 1,
            Self::Cancel => 2,
            Self::GeneralUnknownError => 100,
            Self::VersionTooHigh => 101,
            Self::AuthenticationFailed => 102,
            Self::EncryptedMessageRequired => 103,
            Self::AmountTooHigh => 200,
            Self::AmountTooLow => 201,
            Self::AmountInvalid => 202,
            Self::PaymentDoesNotCoverInvoice => 203,
            Self::CertificateRequired => 300,
            Self::CertificateExpired => 301,
            Self::CertificateInvalidForTransaction => 302,
            Self::CertificateRevoked => 303,
            Self::CertificateNotWellRooted => 304,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancel => "CANCEL",
            Self::GeneralUnknownError => "GENERAL_UNKNOWN_ERROR",
            Self::VersionTooHigh => "VERSION_TOO_HIGH",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::EncryptedMessageRequired => "ENCRYPTED_MESSAGE_REQUIRED",
            Self::AmountTooHigh => "AMOUNT_TOO_HIGH",
            Self::AmountTooLow => "AMOUNT_TOO_LOW",
            Self::AmountInvalid => "AMOUNT_INVALID",
            Self::PaymentDoesNotCoverInvoice => "PAYMENT_DOES_NOT_COVER_INVOICE",
            Self::CertificateRequired => "CERTIFICATE_REQUIRED",
            Self::CertificateExpired => "CERTIFICATE_EXPIRED",
            Self::CertificateInvalidForTransaction => "CERTIFICATE_INVALID_FOR_TRANSACTION",
            Self::CertificateRevoked => "CERTIFICATE_REVOKED",
            Self::CertificateNotWellRooted => "CERTIFICATE_NOT_WELL_ROOTED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl FromStr for StatusCode {
    type Err = String;

    /// Accepts either the name (`CANCEL`) or the numeric code (`2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown status code: {code}"));
        }
        let wanted = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.name() == wanted)
            .ok_or_else(|| format!("unknown status code: {s}"))
    }
}

// ---------------------------------------------------------------------------
// MessageInformation
// ---------------------------------------------------------------------------

/// Envelope options supplied with every create call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInformation {
    #[serde(default)]
    pub status_code: StatusCode,
    #[serde(default)]
    pub status_message: String,
    /// Seal the payload for the recipient's public key.
    #[serde(default)]
    pub encrypt_message: bool,
}
