//! Per-attestation PKI data and its signing rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::attestation::Attestation;
use crate::codec;
use crate::crypto;
use crate::error::Result;

/// Whether a structure carries a certificate and signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PkiType {
    /// Unsigned. Certificate and signature fields stay empty.
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// X.509 certificate with an RSA-SHA256 signature.
    #[serde(rename = "X509SHA256")]
    X509Sha256,
}

impl fmt::Display for PkiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::X509Sha256 => write!(f, "X509SHA256"),
        }
    }
}

/// An attestation as it travels on the wire.
///
/// The signature, when present, covers this same structure with
/// `signature` set to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkiData {
    pub attestation: Option<Attestation>,
    /// PEM bundle: client certificate, optionally intermediates and root.
    pub certificate_pem: String,
    #[serde(rename = "type")]
    pub pki_type: PkiType,
    /// Base64 RSA-SHA256 signature, empty when unsigned.
    pub signature: String,
}

impl PkiData {
    /// Copy with the signature field emptied: the form that gets signed.
    pub fn unsigned(&self) -> Self {
        Self {
            signature: String::new(),
            ..self.clone()
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Attestation name for error messages, `"UNSPECIFIED"` when absent.
    pub fn attestation_name(&self) -> &'static str {
        self.attestation
            .map(|attestation| attestation.as_str())
            .unwrap_or("UNSPECIFIED")
    }

    /// Verify the attestation signature against its own certificate.
    ///
    /// `PkiType::None` attestations have nothing to verify and pass.
    pub fn verify_signature(&self) -> Result<bool> {
        if self.pki_type == PkiType::None {
            return Ok(true);
        }
        let hash = codec::signing_hash(&self.unsigned())?;
        Ok(crypto::verify(&self.signature, &hash, &self.certificate_pem)?)
    }
}

/// Caller-side description of an attestation, including the key that signs
/// it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkiDataParameters {
    pub attestation: Option<Attestation>,
    #[serde(default)]
    pub private_key_pem: String,
    #[serde(default)]
    pub certificate_pem: String,
    #[serde(default, rename = "type")]
    pub pki_type: PkiType,
}

impl PkiDataParameters {
    /// Build the wire attestation, signing it when `require_signature` is set
    /// and the type is X.509. Otherwise the signature is left empty.
    pub fn to_pki_data(&self, require_signature: bool) -> Result<PkiData> {
        let mut pki_data = PkiData {
            attestation: self.attestation,
            certificate_pem: self.certificate_pem.clone(),
            pki_type: self.pki_type,
            signature: String::new(),
        };
        if require_signature && self.pki_type == PkiType::X509Sha256 {
            let hash = codec::signing_hash(&pki_data)?;
            pki_data.signature = crypto::sign(&hash, &self.private_key_pem)?;
        }
        Ok(pki_data)
    }
}

impl fmt::Debug for PkiDataParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkiDataParameters")
            .field("attestation", &self.attestation)
            .field("private_key_pem", &"<redacted>")
            .field("certificate_pem", &self.certificate_pem)
            .field("pki_type", &self.pki_type)
            .finish()
    }
}
