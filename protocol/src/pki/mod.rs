//! # Certificate Trust Engine
//!
//! Decides whether an X.509 certificate bundle is acceptable for signing a
//! TransactID message. The checks, in order:
//!
//! 1. The bundle parses and contains a client certificate.
//! 2. The client certificate is inside its validity window.
//! 3. No CRL listed by the client certificate revokes it.
//!
//! EV status is a separate query ([`CertificateValidator::is_ev_certificate`])
//! applied only when the caller asks for it.
//!
//! Building a path to a trusted root is not attempted: the chain is only
//! classified, never verified link by link.

pub mod certificate;
pub mod error;
pub mod ev;
pub mod revocation;

pub use certificate::{client_certificate, Certificate, CertificateChain, CertificateRole};
pub use error::CertificateError;
pub use ev::{is_ev_policy, EV_POLICY_OIDS};
pub use revocation::{CrlFetcher, HttpCrlFetcher, StaticCrlFetcher};

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::CRL_FETCH_TIMEOUT;
use crate::model::PkiType;

/// Knobs for the trust engine.
#[derive(Debug, Clone)]
pub struct TrustSettings {
    /// Per-request timeout of the default HTTP CRL fetcher.
    pub crl_timeout: Duration,
}

impl Default for TrustSettings {
    fn default() -> Self {
        Self {
            crl_timeout: CRL_FETCH_TIMEOUT,
        }
    }
}

/// Validates certificate bundles. Cheap to clone; the fetcher is shared.
#[derive(Clone)]
pub struct CertificateValidator {
    fetcher: Arc<dyn CrlFetcher>,
}

impl CertificateValidator {
    pub fn new(fetcher: Arc<dyn CrlFetcher>) -> Self {
        Self { fetcher }
    }

    /// Validator backed by an [`HttpCrlFetcher`].
    pub fn from_settings(settings: &TrustSettings) -> Result<Self, CertificateError> {
        let fetcher = HttpCrlFetcher::new(settings.crl_timeout)?;
        Ok(Self::new(Arc::new(fetcher)))
    }

    /// Validate a bundle declared with `pki_type`.
    ///
    /// `PkiType::None` trivially passes. For X.509 bundles the client
    /// certificate must exist, be within its validity window and not be
    /// revoked.
    pub fn validate_certificate(
        &self,
        pki_type: PkiType,
        bundle: &str,
    ) -> Result<bool, CertificateError> {
        match pki_type {
            PkiType::None => Ok(true),
            PkiType::X509Sha256 => {
                let chain = CertificateChain::from_pem(bundle)?;
                self.validate_chain(&chain)?;
                Ok(true)
            }
        }
    }

    /// Expiration then revocation of the chain's client certificate.
    pub fn validate_chain(&self, chain: &CertificateChain) -> Result<(), CertificateError> {
        let client = chain.client()?;
        self.validate_expiration(client)?;
        self.validate_revocation(client)?;
        debug!(subject = client.subject(), "Certificate accepted");
        Ok(())
    }

    pub fn validate_expiration(&self, certificate: &Certificate) -> Result<(), CertificateError> {
        certificate.check_validity_at(Utc::now())
    }

    pub fn validate_revocation(&self, certificate: &Certificate) -> Result<(), CertificateError> {
        revocation::check_revocation(certificate, self.fetcher.as_ref())
    }

    /// Whether the bundle's client certificate carries a known EV policy.
    pub fn is_ev_certificate(&self, bundle: &str) -> Result<bool, CertificateError> {
        let chain = CertificateChain::from_pem(bundle)?;
        Ok(chain.client()?.is_extended_validation())
    }
}

impl fmt::Debug for CertificateValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateValidator").finish_non_exhaustive()
    }
}
