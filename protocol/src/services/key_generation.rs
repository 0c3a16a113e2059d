//! # Attestation Certificate Generation
//!
//! Turns identity data into signed attestation certificates through an
//! external [`KeyProvider`]:
//!
//! 1. Reject data that is not alphanumeric (spaces allowed).
//! 2. Ask the provider for a transaction id covering the attestations.
//! 3. Generate one RSA key pair and one CSR per attestation, all sharing
//!    that key.
//! 4. Submit the CSRs, then collect the issued certificates.
//!
//! Every returned [`AttestationCertificate`] carries the shared private key,
//! ready to be used as [`PkiDataParameters`](crate::model::PkiDataParameters).

use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, KeyPair};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::ProviderError;
use crate::config::RSA_KEY_BITS;
use crate::crypto::keys::generate_rsa_key_pair;
use crate::error::{Result, TransactIdError};
use crate::model::Attestation;

/// OID of the X.520 `title` attribute, used to carry the IVMS constraint.
const TITLE_OID: &[u64] = &[2, 5, 4, 12];
/// OID of the basicConstraints extension.
const BASIC_CONSTRAINTS_OID: &[u64] = &[2, 5, 29, 19];
/// DER of `BasicConstraints { cA: FALSE }`: an empty SEQUENCE.
const BASIC_CONSTRAINTS_NOT_CA: &[u8] = &[0x30, 0x00];

/// IVMS101 name and address type codes a certificate may be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IvmsConstraint {
    /// Legal name.
    Legl,
    /// Doing-business-as name.
    Dban,
    /// Trading name.
    Trad,
    /// Alias.
    Alia,
    /// Name at birth.
    Birt,
    /// Maiden name.
    Maid,
    /// Short name.
    Shrt,
    Misc,
    /// Geographic address.
    Geog,
    /// Business address.
    Bizz,
    /// Home address.
    Home,
}

impl IvmsConstraint {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Legl => "LEGL",
            Self::Dban => "DBAN",
            Self::Trad => "TRAD",
            Self::Alia => "ALIA",
            Self::Birt => "BIRT",
            Self::Maid => "MAID",
            Self::Shrt => "SHRT",
            Self::Misc => "MISC",
            Self::Geog => "GEOG",
            Self::Bizz => "BIZZ",
            Self::Home => "HOME",
        }
    }
}

/// One piece of identity data to certify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationInformation {
    pub attestation: Attestation,
    pub data: String,
    #[serde(default)]
    pub ivms_constraint: Option<IvmsConstraint>,
}

/// A CSR submitted to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrAttestation {
    pub csr: String,
    pub attestation: Attestation,
    pub public_key_pem: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAttestationResponse {
    pub attestation: Attestation,
    pub certificate_pem: String,
}

/// What the provider returns for a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateResponse {
    pub count: usize,
    pub certificates: Vec<CertificateAttestationResponse>,
}

/// An issued attestation certificate and the key it certifies.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationCertificate {
    pub attestation: Attestation,
    pub certificate_pem: String,
    pub private_key_pem: String,
}

impl fmt::Debug for AttestationCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationCertificate")
            .field("attestation", &self.attestation)
            .field("certificate_pem", &self.certificate_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// The certificate authority that issues attestation certificates.
pub trait KeyProvider: Send + Sync {
    fn request_transaction_id(
        &self,
        attestations: &[Attestation],
    ) -> std::result::Result<String, ProviderError>;

    fn submit_csrs_attestations(
        &self,
        transaction_id: &str,
        csrs: &[CsrAttestation],
    ) -> std::result::Result<(), ProviderError>;

    fn get_certificates(
        &self,
        transaction_id: &str,
    ) -> std::result::Result<CertificateResponse, ProviderError>;
}

/// Drives the CSR round-trip against a [`KeyProvider`].
#[derive(Clone)]
pub struct KeyGenerationService {
    provider: Arc<dyn KeyProvider>,
}

impl KeyGenerationService {
    pub fn new(provider: Arc<dyn KeyProvider>) -> Self {
        Self { provider }
    }

    /// Generate one certificate per attestation.
    ///
    /// Returns an empty list when the provider reports no certificates.
    pub fn generate_certificates(
        &self,
        attestations_information: &[AttestationInformation],
    ) -> Result<Vec<AttestationCertificate>> {
        for information in attestations_information {
            validate_attestation_data(information)?;
        }

        let attestations: Vec<Attestation> = attestations_information
            .iter()
            .map(|information| information.attestation)
            .collect();
        let transaction_id = self.provider.request_transaction_id(&attestations)?;
        debug!(%transaction_id, count = attestations.len(), "Transaction id issued");

        let key_pair = generate_rsa_key_pair(RSA_KEY_BITS)?;
        let csrs = attestations_information
            .iter()
            .map(|information| {
                Ok(CsrAttestation {
                    csr: build_csr(information, &key_pair.private_key_pem)?,
                    attestation: information.attestation,
                    public_key_pem: key_pair.public_key_pem.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.provider
            .submit_csrs_attestations(&transaction_id, &csrs)?;
        let response = self.provider.get_certificates(&transaction_id)?;
        info!(%transaction_id, issued = response.count, "Attestation certificates received");

        if response.count == 0 {
            return Ok(Vec::new());
        }
        Ok(response
            .certificates
            .into_iter()
            .map(|certificate| AttestationCertificate {
                attestation: certificate.attestation,
                certificate_pem: certificate.certificate_pem,
                private_key_pem: key_pair.private_key_pem.clone(),
            })
            .collect())
    }
}

impl fmt::Debug for KeyGenerationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerationService").finish_non_exhaustive()
    }
}

fn validate_attestation_data(information: &AttestationInformation) -> Result<()> {
    let valid = information
        .data
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ');
    if valid {
        Ok(())
    } else {
        Err(ProviderError::InvalidAttestationData {
            data: information.data.clone(),
            attestation: information.attestation.to_string(),
        }
        .into())
    }
}

/// PKCS#10 CSR with subject `CN=<data>, OU=<attestation>[, title=<ivms>]`
/// and a critical `basicConstraints CA=false` extension request.
fn build_csr(information: &AttestationInformation, private_key_pem: &str) -> Result<String> {
    let csr_error = |e: rcgen::Error| TransactIdError::CertificateProvider(format!("CSR generation failed: {e}"));

    let key_pair = KeyPair::from_pem(private_key_pem).map_err(csr_error)?;
    let mut params = CertificateParams::new(Vec::<String>::new()).map_err(csr_error)?;

    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, information.data.as_str());
    subject.push(DnType::OrganizationalUnitName, information.attestation.as_str());
    if let Some(constraint) = information.ivms_constraint {
        subject.push(DnType::CustomDnType(TITLE_OID.to_vec()), constraint.code());
    }
    params.distinguished_name = subject;

    let mut basic_constraints =
        CustomExtension::from_oid_content(BASIC_CONSTRAINTS_OID, BASIC_CONSTRAINTS_NOT_CA.to_vec());
    basic_constraints.set_criticality(true);
    params.custom_extensions.push(basic_constraints);

    let csr = params.serialize_request(&key_pair).map_err(csr_error)?;
    csr.pem().map_err(csr_error)
}
