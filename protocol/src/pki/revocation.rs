//! # Revocation Checking
//!
//! A client certificate is checked against every CRL listed in its CRL
//! Distribution Points extension. Certificates without that extension pass.
//!
//! Fetching is behind the [`CrlFetcher`] trait so tests and offline
//! deployments can serve CRLs from memory. The default
//! [`HttpCrlFetcher`] speaks HTTP(S) only; `ftp://` and `ldap://` points
//! fail closed.
//!
//! CRLs are accepted in DER or PEM. The CRL's own signature is not checked
//! against the issuing CA.

use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, warn};
use x509_parser::parse_x509_crl;
use x509_parser::pem::parse_x509_pem;

use super::certificate::Certificate;
use super::error::CertificateError;
use crate::config::MAX_CRL_SIZE;

/// Source of CRL bytes for a distribution point URI.
pub trait CrlFetcher: Send + Sync {
    /// Download the CRL published at `distribution_point`.
    fn fetch(&self, distribution_point: &str) -> Result<Vec<u8>, CertificateError>;
}

/// Blocking HTTP(S) fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpCrlFetcher {
    client: reqwest::blocking::Client,
}

impl HttpCrlFetcher {
    pub fn new(timeout: Duration) -> Result<Self, CertificateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| CertificateError::FetcherSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

impl CrlFetcher for HttpCrlFetcher {
    fn fetch(&self, distribution_point: &str) -> Result<Vec<u8>, CertificateError> {
        if !is_http(distribution_point) {
            return Err(CertificateError::UnsupportedDistributionPoint(
                distribution_point.to_string(),
            ));
        }

        debug!(distribution_point, "Fetching CRL");
        let unavailable = |e: reqwest::Error| CertificateError::CrlUnavailable {
            distribution_point: distribution_point.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(distribution_point)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(unavailable)?;
        read_capped(response, MAX_CRL_SIZE, distribution_point)
    }
}

/// Read at most `limit` bytes; a longer body is an error.
fn read_capped(
    reader: impl Read,
    limit: u64,
    distribution_point: &str,
) -> Result<Vec<u8>, CertificateError> {
    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| CertificateError::CrlUnavailable {
            distribution_point: distribution_point.to_string(),
            reason: e.to_string(),
        })?;
    if body.len() as u64 > limit {
        return Err(CertificateError::CrlUnavailable {
            distribution_point: distribution_point.to_string(),
            reason: format!("CRL larger than {limit} bytes"),
        });
    }
    Ok(body)
}

/// In-memory fetcher keyed by distribution point URI.
///
/// Unknown URIs answer [`CertificateError::CrlUnavailable`], the same way an
/// unreachable server would.
#[derive(Debug, Clone, Default)]
pub struct StaticCrlFetcher {
    crls: HashMap<String, Vec<u8>>,
}

impl StaticCrlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crl(mut self, distribution_point: impl Into<String>, crl: impl Into<Vec<u8>>) -> Self {
        self.crls.insert(distribution_point.into(), crl.into());
        self
    }
}

impl CrlFetcher for StaticCrlFetcher {
    fn fetch(&self, distribution_point: &str) -> Result<Vec<u8>, CertificateError> {
        self.crls
            .get(distribution_point)
            .cloned()
            .ok_or_else(|| CertificateError::CrlUnavailable {
                distribution_point: distribution_point.to_string(),
                reason: "no CRL registered".into(),
            })
    }
}

fn is_http(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Whether `serial` appears in the revoked list of `crl` (DER or PEM).
pub fn is_serial_revoked(crl: &[u8], serial: &[u8]) -> Result<bool, String> {
    let pem_body;
    let der: &[u8] = if crl.starts_with(b"-----BEGIN") {
        let (_, pem) = parse_x509_pem(crl).map_err(|e| e.to_string())?;
        pem_body = pem.contents;
        &pem_body
    } else {
        crl
    };

    let (_, list) = parse_x509_crl(der).map_err(|e| e.to_string())?;
    let revoked = list
        .iter_revoked_certificates()
        .any(|entry| entry.raw_serial() == serial);
    Ok(revoked)
}

/// Check `certificate` against every CRL it points at.
///
/// Stops at the first distribution point that lists the serial, or at the
/// first one that cannot be fetched or parsed.
pub fn check_revocation(
    certificate: &Certificate,
    fetcher: &dyn CrlFetcher,
) -> Result<(), CertificateError> {
    for distribution_point in certificate.crl_distribution_points() {
        let crl = fetcher.fetch(distribution_point)?;
        let revoked = is_serial_revoked(&crl, certificate.serial()).map_err(|reason| {
            CertificateError::InvalidCrl {
                distribution_point: distribution_point.clone(),
                reason,
            }
        })?;
        if revoked {
            warn!(
                subject = certificate.subject(),
                serial = %certificate.serial_hex(),
                distribution_point = distribution_point.as_str(),
                "Certificate is revoked"
            );
            return Err(CertificateError::Revoked {
                distribution_point: distribution_point.clone(),
            });
        }
    }
    Ok(())
}
