//! # Key Management
//!
//! PEM in, typed keys out. TransactID carries every key and certificate as
//! PEM text, so this module is the single place where that text turns into
//! something a signer or a cipher can use.
//!
//! Two key families are in play:
//!
//! - **RSA** (PKCS#8 or PKCS#1) for owner attestations and sender signatures,
//!   the keys that sit behind X.509 certificates.
//! - **secp256k1** (PKCS#8 or SEC1) for envelope encryption and the envelope
//!   signature.
//!
//! Key material is never logged and never shows up in error messages.

use k256::{PublicKey as EcPublicKey, SecretKey as EcSecretKey};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use thiserror::Error;

use crate::config::RSA_KEY_BITS;
use crate::pki::CertificateChain;

/// Errors raised while decoding or generating keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The text is not a PEM block, or the block body is not a valid key.
    #[error("malformed PEM key: {0}")]
    MalformedPem(String),

    /// The PEM decodes, but to a key type this operation cannot use.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Key generation or encoding failed.
    #[error("key generation failed: {0}")]
    Generation(String),
}

/// Label of the first PEM block in `pem` (`"PRIVATE KEY"`, `"CERTIFICATE"`, ...).
pub fn pem_label(pem: &str) -> Option<&str> {
    let start = pem.find("-----BEGIN ")? + "-----BEGIN ".len();
    let rest = &pem[start..];
    let end = rest.find("-----")?;
    Some(&rest[..end])
}

/// Decode an RSA private key from PKCS#8 (`PRIVATE KEY`) or PKCS#1
/// (`RSA PRIVATE KEY`) PEM.
pub fn rsa_private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, KeyError> {
    match pem_label(pem) {
        Some("RSA PRIVATE KEY") => RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| KeyError::MalformedPem(e.to_string())),
        Some("PRIVATE KEY") => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| {
            if EcSecretKey::from_pkcs8_pem(pem).is_ok() {
                KeyError::UnsupportedKeyType("expected an RSA key, found an EC key".into())
            } else {
                KeyError::MalformedPem(e.to_string())
            }
        }),
        Some(other) => Err(KeyError::UnsupportedKeyType(format!(
            "expected an RSA private key, found {other}"
        ))),
        None => Err(KeyError::MalformedPem("no PEM block found".into())),
    }
}

/// Decode a secp256k1 private key from PKCS#8 (`PRIVATE KEY`) or SEC1
/// (`EC PRIVATE KEY`) PEM.
pub fn ec_secret_key_from_pem(pem: &str) -> Result<EcSecretKey, KeyError> {
    match pem_label(pem) {
        Some("EC PRIVATE KEY") => {
            EcSecretKey::from_sec1_pem(pem).map_err(|e| KeyError::MalformedPem(e.to_string()))
        }
        Some("PRIVATE KEY") => EcSecretKey::from_pkcs8_pem(pem).map_err(|_| {
            KeyError::UnsupportedKeyType("expected a secp256k1 private key".into())
        }),
        Some(other) => Err(KeyError::UnsupportedKeyType(format!(
            "expected an EC private key, found {other}"
        ))),
        None => Err(KeyError::MalformedPem("no PEM block found".into())),
    }
}

/// Decode a secp256k1 public key from SubjectPublicKeyInfo (`PUBLIC KEY`) PEM.
pub fn ec_public_key_from_pem(pem: &str) -> Result<EcPublicKey, KeyError> {
    match pem_label(pem) {
        Some("PUBLIC KEY") => EcPublicKey::from_public_key_pem(pem).map_err(|_| {
            KeyError::UnsupportedKeyType("expected a secp256k1 public key".into())
        }),
        Some(other) => Err(KeyError::UnsupportedKeyType(format!(
            "expected an EC public key, found {other}"
        ))),
        None => Err(KeyError::MalformedPem("no PEM block found".into())),
    }
}

/// Whether `private_key_pem` holds a secp256k1 key usable for envelope
/// encryption. RSA keys, other curves and garbage all answer `false`.
pub fn is_ecdsa_key(private_key_pem: &str) -> bool {
    ec_secret_key_from_pem(private_key_pem).is_ok()
}

/// A verification key pulled out of a certificate or a public key PEM.
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKeyMaterial {
    Rsa(RsaPublicKey),
    Ec(EcPublicKey),
}

impl PublicKeyMaterial {
    /// Decode a DER SubjectPublicKeyInfo, trying RSA first, then secp256k1.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, KeyError> {
        if let Ok(key) = RsaPublicKey::from_public_key_der(der) {
            return Ok(Self::Rsa(key));
        }
        EcPublicKey::from_public_key_der(der)
            .map(Self::Ec)
            .map_err(|_| KeyError::UnsupportedKeyType("neither RSA nor secp256k1".into()))
    }

    /// Accepts a certificate bundle (the client certificate's key is used),
    /// an SPKI `PUBLIC KEY` block or a PKCS#1 `RSA PUBLIC KEY` block.
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        match pem_label(pem) {
            Some("CERTIFICATE") => {
                let chain = CertificateChain::from_pem(pem)
                    .map_err(|e| KeyError::MalformedPem(e.to_string()))?;
                let client = chain
                    .client()
                    .map_err(|e| KeyError::MalformedPem(e.to_string()))?;
                client.public_key()
            }
            Some("PUBLIC KEY") => {
                if let Ok(key) = RsaPublicKey::from_public_key_pem(pem) {
                    return Ok(Self::Rsa(key));
                }
                EcPublicKey::from_public_key_pem(pem)
                    .map(Self::Ec)
                    .map_err(|e| KeyError::MalformedPem(e.to_string()))
            }
            Some("RSA PUBLIC KEY") => RsaPublicKey::from_pkcs1_pem(pem)
                .map(Self::Rsa)
                .map_err(|e| KeyError::MalformedPem(e.to_string())),
            Some(other) => Err(KeyError::UnsupportedKeyType(format!(
                "expected a certificate or public key, found {other}"
            ))),
            None => Err(KeyError::MalformedPem("no PEM block found".into())),
        }
    }

    /// Short algorithm tag, handy for logs.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::Ec(_) => "EC",
        }
    }
}

impl fmt::Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyMaterial({})", self.algorithm())
    }
}

/// A freshly generated keypair, both halves PEM-encoded.
#[derive(Clone)]
pub struct KeyPairPem {
    pub private_key_pem: String,
    pub public_key_pem: String,
}

impl fmt::Debug for KeyPairPem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairPem")
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem", &self.public_key_pem)
            .finish()
    }
}

/// Generate an RSA keypair of `bits` (PKCS#8 private, SPKI public).
pub fn generate_rsa_key_pair(bits: usize) -> Result<KeyPairPem, KeyError> {
    let private_key =
        RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| KeyError::Generation(e.to_string()))?;
    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(e.to_string()))?
        .to_string();
    let public_key_pem = RsaPublicKey::from(&private_key)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(e.to_string()))?;
    Ok(KeyPairPem {
        private_key_pem,
        public_key_pem,
    })
}

/// Generate an RSA keypair of the default size ([`RSA_KEY_BITS`]).
pub fn generate_default_rsa_key_pair() -> Result<KeyPairPem, KeyError> {
    generate_rsa_key_pair(RSA_KEY_BITS)
}

/// Generate a secp256k1 keypair (PKCS#8 private, SPKI public).
pub fn generate_ec_key_pair() -> Result<KeyPairPem, KeyError> {
    let secret = EcSecretKey::random(&mut OsRng);
    let private_key_pem = secret
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(e.to_string()))?
        .to_string();
    let public_key_pem = secret
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(e.to_string()))?;
    Ok(KeyPairPem {
        private_key_pem,
        public_key_pem,
    })
}

/// Derive the SPKI public key PEM matching an RSA or secp256k1 private key.
pub fn public_key_pem_from_private(private_key_pem: &str) -> Result<String, KeyError> {
    if let Ok(secret) = ec_secret_key_from_pem(private_key_pem) {
        return secret
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(e.to_string()));
    }
    let private_key = rsa_private_key_from_pem(private_key_pem)?;
    RsaPublicKey::from(&private_key)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(e.to_string()))
}
