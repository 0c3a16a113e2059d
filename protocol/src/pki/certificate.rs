//! X.509 parsing and classification.
//!
//! A certificate field in a TransactID message is a *bundle*: the client
//! certificate, optionally followed by intermediates and a root, as
//! concatenated PEM blocks. [`CertificateChain::from_pem`] parses the bundle
//! once and sorts every certificate into its role, so the rest of the
//! pipeline works with a structured chain instead of re-parsing strings.
//!
//! Classification rules:
//!
//! | role         | self-signed | keyUsage keyCertSign | basicConstraints CA |
//! |--------------|-------------|----------------------|---------------------|
//! | root         | yes         | yes                  | yes                 |
//! | intermediate | no          | yes                  | yes                 |
//! | client       | no          | no (or no keyUsage)  | no                  |
//!
//! Anything else (a self-signed leaf, say) is kept but unclassified.

use chrono::{DateTime, Utc};
use std::fmt;
use x509_parser::extensions::{DistributionPointName, GeneralName, ParsedExtension};
use x509_parser::certificate::X509Certificate;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::Pem;

use super::error::CertificateError;
use crate::config::PEM_CERTIFICATE_LABEL;
use crate::crypto::keys::{KeyError, PublicKeyMaterial};
use crate::crypto::signatures::verify_bytes;

const SHA256_WITH_RSA_OID: &str = "1.2.840.113549.1.1.11";
const ECDSA_WITH_SHA256_OID: &str = "1.2.840.10045.4.3.2";

/// Role of a certificate inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateRole {
    Root,
    Intermediate,
    Client,
    Unclassified,
}

/// A parsed X.509 certificate with the facts the trust engine needs
/// extracted up front.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    serial: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    self_signed: bool,
    key_usage_present: bool,
    key_cert_sign: bool,
    ca: bool,
    public_key_der: Vec<u8>,
    crl_distribution_points: Vec<String>,
    policy_oids: Vec<String>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (_, x509) =
            parse_x509_certificate(der).map_err(|e| CertificateError::Parse(e.to_string()))?;

        let key_usage = x509
            .key_usage()
            .map_err(|e| CertificateError::Parse(e.to_string()))?;
        let basic_constraints = x509
            .basic_constraints()
            .map_err(|e| CertificateError::Parse(e.to_string()))?;

        let mut crl_distribution_points = Vec::new();
        let mut policy_oids = Vec::new();
        for extension in x509.extensions() {
            match extension.parsed_extension() {
                ParsedExtension::CRLDistributionPoints(points) => {
                    for point in points.iter() {
                        if let Some(DistributionPointName::FullName(names)) =
                            &point.distribution_point
                        {
                            for name in names {
                                if let GeneralName::URI(uri) = name {
                                    crl_distribution_points.push(uri.to_string());
                                }
                            }
                        }
                    }
                }
                ParsedExtension::CertificatePolicies(policies) => {
                    for policy in policies.iter() {
                        policy_oids.push(policy.policy_id.to_id_string());
                    }
                }
                _ => {}
            }
        }

        let validity = x509.validity();
        Ok(Self {
            der: der.to_vec(),
            subject: x509.subject().to_string(),
            issuer: x509.issuer().to_string(),
            serial: x509.raw_serial().to_vec(),
            not_before: to_datetime(validity.not_before.timestamp())?,
            not_after: to_datetime(validity.not_after.timestamp())?,
            self_signed: signed_by_own_key(&x509),
            key_usage_present: key_usage.is_some(),
            key_cert_sign: key_usage
                .map(|usage| usage.value.key_cert_sign())
                .unwrap_or(false),
            ca: basic_constraints
                .map(|constraints| constraints.value.ca)
                .unwrap_or(false),
            public_key_der: x509.public_key().raw.to_vec(),
            crl_distribution_points,
            policy_oids,
        })
    }

    /// Parse the first `CERTIFICATE` block of a PEM string.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        CertificateChain::from_pem(pem)?
            .all()
            .next()
            .cloned()
            .ok_or(CertificateError::EmptyBundle)
    }

    /// The certificate's signature verifies with its own public key.
    pub fn is_self_signed(&self) -> bool {
        self.self_signed
    }

    pub fn is_root(&self) -> bool {
        self.self_signed && self.key_cert_sign && self.ca
    }

    pub fn is_intermediate(&self) -> bool {
        !self.self_signed && self.key_cert_sign && self.ca
    }

    pub fn is_client(&self) -> bool {
        !self.self_signed && !self.key_cert_sign && !self.ca
    }

    pub fn role(&self) -> CertificateRole {
        if self.is_root() {
            CertificateRole::Root
        } else if self.is_intermediate() {
            CertificateRole::Intermediate
        } else if self.is_client() {
            CertificateRole::Client
        } else {
            CertificateRole::Unclassified
        }
    }

    /// Fails with [`CertificateError::NotYetValid`] or
    /// [`CertificateError::Expired`] when `now` is outside
    /// `[notBefore, notAfter]`.
    pub fn check_validity_at(&self, now: DateTime<Utc>) -> Result<(), CertificateError> {
        if now < self.not_before {
            return Err(CertificateError::NotYetValid {
                not_before: self.not_before.to_rfc3339(),
            });
        }
        if now > self.not_after {
            return Err(CertificateError::Expired {
                not_after: self.not_after.to_rfc3339(),
            });
        }
        Ok(())
    }

    /// The subject public key, ready for signature verification.
    pub fn public_key(&self) -> Result<PublicKeyMaterial, KeyError> {
        PublicKeyMaterial::from_spki_der(&self.public_key_der)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Raw big-endian serial number bytes, as encoded in the certificate.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn has_key_usage(&self) -> bool {
        self.key_usage_present
    }

    /// URIs from the CRL Distribution Points extension, in order.
    pub fn crl_distribution_points(&self) -> &[String] {
        &self.crl_distribution_points
    }

    /// Dotted OIDs from the Certificate Policies extension.
    pub fn policy_oids(&self) -> &[String] {
        &self.policy_oids
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("serial", &self.serial_hex())
            .field("role", &self.role())
            .field("not_after", &self.not_after)
            .finish()
    }
}

/// Whether `x509` carries a signature made with its own key.
///
/// x509-parser only verifies the algorithms its backend supports, which
/// leaves out secp256k1 and RSA keys under 2048 bits. Those are checked with
/// the crate's own verifiers. A certificate whose signature nobody here can
/// check counts as self-signed when its issuer equals its subject, so it can
/// never pass as a client certificate.
fn signed_by_own_key(x509: &X509Certificate<'_>) -> bool {
    if x509.verify_signature(None).is_ok() {
        return true;
    }

    let algorithm = x509.signature_algorithm.algorithm.to_id_string();
    let own_key = PublicKeyMaterial::from_spki_der(x509.public_key().raw);
    let verified = match (algorithm.as_str(), own_key) {
        (SHA256_WITH_RSA_OID, Ok(key @ PublicKeyMaterial::Rsa(_)))
        | (ECDSA_WITH_SHA256_OID, Ok(key @ PublicKeyMaterial::Ec(_))) => verify_bytes(
            &x509.signature_value.data,
            x509.tbs_certificate.as_ref(),
            &key,
        )
        .ok(),
        _ => None,
    };

    verified.unwrap_or_else(|| x509.subject().as_raw() == x509.issuer().as_raw())
}

fn to_datetime(timestamp: i64) -> Result<DateTime<Utc>, CertificateError> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| CertificateError::Parse(format!("validity out of range: {timestamp}")))
}

/// A certificate bundle, classified once at parse time.
#[derive(Debug, Clone, Default)]
pub struct CertificateChain {
    clients: Vec<Certificate>,
    intermediates: Vec<Certificate>,
    roots: Vec<Certificate>,
    unclassified: Vec<Certificate>,
}

impl CertificateChain {
    /// Parse every `CERTIFICATE` block of `bundle`. Non-certificate blocks are
    /// skipped; a bundle with no certificates is an error.
    pub fn from_pem(bundle: &str) -> Result<Self, CertificateError> {
        let mut chain = Self::default();
        for pem in Pem::iter_from_buffer(bundle.as_bytes()) {
            let pem = pem.map_err(|e| CertificateError::Parse(e.to_string()))?;
            if pem.label != PEM_CERTIFICATE_LABEL {
                continue;
            }
            chain.push(Certificate::from_der(&pem.contents)?);
        }
        if chain.is_empty() {
            return Err(CertificateError::EmptyBundle);
        }
        Ok(chain)
    }

    fn push(&mut self, certificate: Certificate) {
        match certificate.role() {
            CertificateRole::Client => self.clients.push(certificate),
            CertificateRole::Intermediate => self.intermediates.push(certificate),
            CertificateRole::Root => self.roots.push(certificate),
            CertificateRole::Unclassified => self.unclassified.push(certificate),
        }
    }

    /// The client (leaf) certificate: the first one in bundle order that
    /// satisfies the client predicate.
    pub fn client(&self) -> Result<&Certificate, CertificateError> {
        self.clients
            .first()
            .ok_or(CertificateError::ClientCertificateNotFound)
    }

    pub fn intermediates(&self) -> &[Certificate] {
        &self.intermediates
    }

    pub fn roots(&self) -> &[Certificate] {
        &self.roots
    }

    /// Certificates matching none of the three roles.
    pub fn unclassified(&self) -> &[Certificate] {
        &self.unclassified
    }

    /// Every certificate: clients, intermediates, roots, then unclassified.
    pub fn all(&self) -> impl Iterator<Item = &Certificate> {
        self.clients
            .iter()
            .chain(&self.intermediates)
            .chain(&self.roots)
            .chain(&self.unclassified)
    }

    pub fn len(&self) -> usize {
        self.clients.len() + self.intermediates.len() + self.roots.len() + self.unclassified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse `bundle` and return its client certificate.
pub fn client_certificate(bundle: &str) -> Result<Certificate, CertificateError> {
    CertificateChain::from_pem(bundle)?.client().cloned()
}
