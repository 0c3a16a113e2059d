//! # External Services
//!
//! Interfaces to the collaborators TransactID depends on but does not
//! implement: the certificate provider that turns CSRs into attestation
//! certificates, and the address risk lookup used when parsing messages.
//! Concrete clients live outside this crate; tests use in-memory fakes.

pub mod address_information;
pub mod key_generation;

pub use address_information::AddressInformationService;
pub use key_generation::{
    AttestationCertificate, AttestationInformation, CertificateAttestationResponse,
    CertificateResponse, CsrAttestation, IvmsConstraint, KeyGenerationService, KeyProvider,
};

use thiserror::Error;

/// Failures reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider refused the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The certificate provider failed or rejected the request.
    #[error("{0}")]
    CertificateProvider(String),

    /// Attestation data contains characters a certificate subject cannot hold.
    #[error("data '{data}' for attestation {attestation} must be alphanumeric")]
    InvalidAttestationData { data: String, attestation: String },

    /// The address information service failed.
    #[error("{0}")]
    AddressInformation(String),
}
