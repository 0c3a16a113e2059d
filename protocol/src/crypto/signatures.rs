//! # Digital Signatures
//!
//! Signing and verification for the two signature schemes TransactID uses:
//!
//! - **RSA-SHA256** (PKCS#1 v1.5): owner attestations and the top-level
//!   sender signature on InvoiceRequest / PaymentRequest. The verifying key
//!   comes from the signer's X.509 certificate.
//! - **ECDSA-SHA256** over secp256k1 (DER-encoded): the encrypted envelope
//!   signature, verified with the sender public key carried in the envelope.
//!
//! Signatures travel as standard base64 text.
//!
//! ## Error contract
//!
//! Verification distinguishes two outcomes on purpose:
//!
//! - a well-formed signature that simply does not match returns `Ok(false)`;
//! - malformed input (bad base64, bad DER, unreadable key or certificate)
//!   returns `Err`, and callers surface it as a validation failure.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use k256::ecdsa::{
    signature::{Signer as _, Verifier as _},
    Signature as EcdsaSignature, SigningKey as EcdsaSigningKey, VerifyingKey as EcdsaVerifyingKey,
};
use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use rsa::signature::SignatureEncoding;
use sha2::Sha256;
use thiserror::Error;

use super::keys::{ec_secret_key_from_pem, rsa_private_key_from_pem, KeyError, PublicKeyMaterial};

/// Errors during signing or signature decoding.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The key (or the certificate holding it) could not be decoded.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The signature is not valid base64.
    #[error("invalid base64 signature: {0}")]
    InvalidEncoding(String),

    /// The signature bytes are not a valid signature for the scheme.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The signer refused to produce a signature.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Sign `string_to_sign` with an RSA private key (RSA-SHA256, PKCS#1 v1.5).
///
/// Returns the base64 signature.
pub fn sign(string_to_sign: &str, private_key_pem: &str) -> Result<String, SignatureError> {
    let private_key = rsa_private_key_from_pem(private_key_pem)?;
    let signing_key = RsaSigningKey::<Sha256>::new(private_key);
    let signature = signing_key
        .try_sign(string_to_sign.as_bytes())
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Sign `string_to_sign` with a secp256k1 private key (ECDSA-SHA256).
///
/// Returns the base64 of the DER-encoded signature. Signatures are always
/// produced in low-S form.
pub fn sign_ecdsa(string_to_sign: &str, private_key_pem: &str) -> Result<String, SignatureError> {
    let secret = ec_secret_key_from_pem(private_key_pem)?;
    let signing_key = EcdsaSigningKey::from(&secret);
    let signature: EcdsaSignature = signing_key
        .try_sign(string_to_sign.as_bytes())
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok(BASE64.encode(signature.to_der().as_bytes()))
}

/// Verify a base64 signature over `data` against the key in
/// `certificate_or_key_pem`.
///
/// The PEM may be a certificate bundle (the client certificate is used) or
/// a bare public key. RSA keys verify RSA-SHA256, EC keys verify
/// ECDSA-SHA256.
///
/// # Example
///
/// ```no_run
/// use transactid_protocol::crypto::signatures::{sign, verify};
///
/// # let private_key_pem = "";
/// # let certificate_pem = "";
/// let signature = sign("payload", private_key_pem)?;
/// assert!(verify(&signature, "payload", certificate_pem)?);
/// # Ok::<(), transactid_protocol::crypto::signatures::SignatureError>(())
/// ```
pub fn verify(
    signature: &str,
    data: &str,
    certificate_or_key_pem: &str,
) -> Result<bool, SignatureError> {
    let signature_bytes = decode_signature(signature)?;
    let public_key = PublicKeyMaterial::from_pem(certificate_or_key_pem)?;
    verify_bytes(&signature_bytes, data.as_bytes(), &public_key)
}

/// Verify a raw signature over raw bytes: RSA-SHA256 (PKCS#1 v1.5) for RSA
/// keys, DER ECDSA-SHA256 for secp256k1 keys.
pub fn verify_bytes(
    signature: &[u8],
    data: &[u8],
    public_key: &PublicKeyMaterial,
) -> Result<bool, SignatureError> {
    match public_key {
        PublicKeyMaterial::Rsa(public_key) => {
            let signature = RsaSignature::try_from(signature)
                .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
            let verifying_key = RsaVerifyingKey::<Sha256>::new(public_key.clone());
            Ok(verifying_key.verify(data, &signature).is_ok())
        }
        PublicKeyMaterial::Ec(public_key) => {
            verify_ecdsa_bytes(signature, data, &EcdsaVerifyingKey::from(public_key))
        }
    }
}

/// Verify a base64 ECDSA-SHA256 signature with a secp256k1 public key PEM.
pub fn verify_ecdsa(signature: &str, data: &str, public_key_pem: &str) -> Result<bool, SignatureError> {
    let signature_bytes = decode_signature(signature)?;
    match PublicKeyMaterial::from_pem(public_key_pem)? {
        PublicKeyMaterial::Ec(public_key) => verify_ecdsa_bytes(
            &signature_bytes,
            data.as_bytes(),
            &EcdsaVerifyingKey::from(&public_key),
        ),
        PublicKeyMaterial::Rsa(_) => Err(SignatureError::Key(KeyError::UnsupportedKeyType(
            "ECDSA verification needs an EC public key".into(),
        ))),
    }
}

fn decode_signature(signature: &str) -> Result<Vec<u8>, SignatureError> {
    BASE64
        .decode(signature.trim())
        .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))
}

fn verify_ecdsa_bytes(
    signature_bytes: &[u8],
    data: &[u8],
    verifying_key: &EcdsaVerifyingKey,
) -> Result<bool, SignatureError> {
    let signature = EcdsaSignature::from_der(signature_bytes)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
    // Peers on other stacks may emit high-S signatures; k256 only accepts low-S.
    let signature = signature.normalize_s().unwrap_or(signature);
    Ok(verifying_key.verify(data, &signature).is_ok())
}
