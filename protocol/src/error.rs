//! Crate-level error type.
//!
//! Every public create / parse / validate / change-status operation returns
//! [`Result<T>`]. The per-concern errors (`KeyError`, `SignatureError`,
//! `EncryptionError`, `CertificateError`, `OwnerValidationError`) convert
//! into [`TransactIdError`] with `?`, so callers branch on one enum.

use thiserror::Error;

use crate::crypto::{EncryptionError, KeyError, SignatureError};
use crate::model::OwnerValidationError;
use crate::pki::CertificateError;
use crate::services::ProviderError;

/// Every way a TransactID operation can fail.
#[derive(Debug, Error)]
pub enum TransactIdError {
    /// An originator or beneficiary list broke the primary-owner rules.
    #[error("invalid owners: {0}")]
    InvalidOwners(#[from] OwnerValidationError),

    /// Bytes could not be decoded into the expected structure.
    #[error("invalid {message_type}: {reason}")]
    InvalidObject {
        message_type: String,
        reason: String,
    },

    /// An envelope, sender or attestation signature did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The sender certificate failed expiration, revocation or EV checks.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// An attestation certificate failed validation.
    #[error("invalid certificate chain: {0}")]
    InvalidCertificateChain(String),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Key(#[from] KeyError),

    /// Structure could not be serialized for signing or transport.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The certificate provider rejected or failed a request.
    #[error("certificate provider error: {0}")]
    CertificateProvider(String),

    /// The certificate provider refused the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The address information service failed.
    #[error("address information lookup failed: {0}")]
    AddressInformation(String),

    /// The operation is not available for this message type or setup.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The facade was assembled with unusable settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TransactIdError>;

impl TransactIdError {
    pub(crate) fn invalid_object(message_type: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidObject {
            message_type: message_type.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<CertificateError> for TransactIdError {
    fn from(err: CertificateError) -> Self {
        Self::InvalidCertificate(err.to_string())
    }
}

impl From<SignatureError> for TransactIdError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Key(key) => Self::Key(key),
            other => Self::InvalidSignature(other.to_string()),
        }
    }
}

impl From<ProviderError> for TransactIdError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unauthorized(reason) => Self::Unauthorized(reason),
            ProviderError::AddressInformation(reason) => Self::AddressInformation(reason),
            other => Self::CertificateProvider(other.to_string()),
        }
    }
}

impl From<bincode::Error> for TransactIdError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
