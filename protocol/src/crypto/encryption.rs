//! # Envelope Encryption
//!
//! Sender and recipient each hold a secp256k1 keypair. The sender combines
//! its private key with the recipient's public key (ECDH), the recipient
//! combines its private key with the sender's public key, and both arrive at
//! the same shared secret. That secret is stretched with HKDF-SHA256 into an
//! AES-256-GCM key which seals the base64-encoded serialized message.
//!
//! ## Key binding
//!
//! The HKDF `info` is `ENCRYPTION_KDF_INFO || sender_pub || recipient_pub`
//! (compressed SEC1 points). A ciphertext only opens for the exact
//! sender/recipient pair it was sealed for.
//!
//! ## Wire format
//!
//! `encrypt()` returns `base64(nonce || ciphertext)`: a 12-byte random nonce
//! followed by the ciphertext and its 16-byte GCM tag.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hkdf::Hkdf;
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

use super::keys::{ec_public_key_from_pem, ec_secret_key_from_pem, KeyError};
use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH, ENCRYPTION_KDF_INFO};

/// Errors that can occur while sealing or opening an envelope payload.
///
/// The precondition variants name exactly which key is missing or wrong;
/// the decryption failure itself stays vague.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption requires the recipient public key")]
    MissingRecipientKeys,

    #[error("encryption requires the sender public and private keys")]
    MissingSenderKeys,

    #[error("encryption requires an ECDSA (secp256k1) sender private key")]
    IncorrectKeyFormat,

    #[error("decryption requires the recipient private key")]
    MissingRecipientPrivateKey,

    #[error("sender public key does not match the sender private key")]
    SenderKeyMismatch,

    #[error("invalid encryption key: {0}")]
    Key(#[from] KeyError),

    #[error("encryption failed")]
    EncryptFailed,

    #[error("unable to decrypt message: {0}")]
    DecryptFailed(String),
}

/// Seal `plain_base64` for the holder of `recipient_public_key_pem`.
///
/// # Errors
///
/// - [`EncryptionError::IncorrectKeyFormat`] if the sender private key is
///   not a secp256k1 key.
/// - [`EncryptionError::SenderKeyMismatch`] if the sender public key is not
///   the one derived from the sender private key.
/// - [`EncryptionError::Key`] for unreadable public keys.
pub fn encrypt(
    plain_base64: &str,
    recipient_public_key_pem: &str,
    sender_public_key_pem: &str,
    sender_private_key_pem: &str,
) -> Result<String, EncryptionError> {
    let sender_secret =
        ec_secret_key_from_pem(sender_private_key_pem).map_err(|_| EncryptionError::IncorrectKeyFormat)?;
    let sender_public = ec_public_key_from_pem(sender_public_key_pem)?;
    if sender_secret.public_key() != sender_public {
        return Err(EncryptionError::SenderKeyMismatch);
    }
    let recipient_public = ec_public_key_from_pem(recipient_public_key_pem)?;

    let key = derive_key(&sender_secret, &recipient_public, &sender_public, &recipient_public)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plain_base64.as_bytes())
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut sealed = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

/// Open a payload sealed by [`encrypt`].
///
/// Returns the original base64 plaintext. Wrong keys and tampered
/// ciphertexts both end in [`EncryptionError::DecryptFailed`].
pub fn decrypt(
    ciphertext: &str,
    recipient_private_key_pem: &str,
    sender_public_key_pem: &str,
) -> Result<String, EncryptionError> {
    let recipient_secret = ec_secret_key_from_pem(recipient_private_key_pem)?;
    let sender_public = ec_public_key_from_pem(sender_public_key_pem)?;
    let recipient_public = recipient_secret.public_key();

    let sealed = BASE64
        .decode(ciphertext.trim())
        .map_err(|e| EncryptionError::DecryptFailed(e.to_string()))?;
    if sealed.len() < AES_NONCE_LENGTH + AES_TAG_LENGTH {
        return Err(EncryptionError::DecryptFailed("ciphertext too short".into()));
    }
    let (nonce_bytes, body) = sealed.split_at(AES_NONCE_LENGTH);

    let key = derive_key(&recipient_secret, &sender_public, &sender_public, &recipient_public)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| EncryptionError::DecryptFailed("invalid key".into()))?;
    let plain = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), body)
        .map_err(|_| EncryptionError::DecryptFailed("wrong key or corrupted ciphertext".into()))?;

    String::from_utf8(plain).map_err(|e| EncryptionError::DecryptFailed(e.to_string()))
}

/// ECDH between `own` and `peer`, then HKDF-SHA256 bound to both public keys.
fn derive_key(
    own: &SecretKey,
    peer: &PublicKey,
    sender_public: &PublicKey,
    recipient_public: &PublicKey,
) -> Result<[u8; AES_KEY_LENGTH], EncryptionError> {
    let shared = k256::ecdh::diffie_hellman(own.to_nonzero_scalar(), peer.as_affine());

    let mut info = ENCRYPTION_KDF_INFO.to_vec();
    info.extend_from_slice(sender_public.to_encoded_point(true).as_bytes());
    info.extend_from_slice(recipient_public.to_encoded_point(true).as_bytes());

    let hkdf = Hkdf::<Sha256>::new(None, shared.raw_secret_bytes());
    let mut key = [0u8; AES_KEY_LENGTH];
    hkdf.expand(&info, &mut key)
        .map_err(|_| EncryptionError::EncryptFailed)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER_KEY: &str = include_str!("../../tests/fixtures/sender_ec.key.pem");
    const SENDER_PUB: &str = include_str!("../../tests/fixtures/sender_ec.pub.pem");
    const RECIPIENT_KEY: &str = include_str!("../../tests/fixtures/recipient_ec.key.pem");
    const RECIPIENT_PUB: &str = include_str!("../../tests/fixtures/recipient_ec.pub.pem");
    const STRANGER_KEY: &str = include_str!("../../tests/fixtures/stranger_ec.key.pem");
    const RSA_KEY: &str = include_str!("../../tests/fixtures/sender.key.pem");

    const MESSAGE: &str = "dHJhdmVsIHJ1bGUgcGF5bG9hZA==";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let sealed = encrypt(MESSAGE, RECIPIENT_PUB, SENDER_PUB, SENDER_KEY).unwrap();
        assert_ne!(sealed, MESSAGE);
        let opened = decrypt(&sealed, RECIPIENT_KEY, SENDER_PUB).unwrap();
        assert_eq!(opened, MESSAGE);
    }

    #[test]
    fn test_unrelated_recipient_cannot_decrypt() {
        let sealed = encrypt(MESSAGE, RECIPIENT_PUB, SENDER_PUB, SENDER_KEY).unwrap();
        let err = decrypt(&sealed, STRANGER_KEY, SENDER_PUB).unwrap_err();
        assert!(matches!(err, EncryptionError::DecryptFailed(_)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let sealed = encrypt(MESSAGE, RECIPIENT_PUB, SENDER_PUB, SENDER_KEY).unwrap();
        let mut raw = BASE64.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let err = decrypt(&BASE64.encode(raw), RECIPIENT_KEY, SENDER_PUB).unwrap_err();
        assert!(matches!(err, EncryptionError::DecryptFailed(_)));
    }

    #[test]
    fn test_nonce_is_random() {
        let a = encrypt(MESSAGE, RECIPIENT_PUB, SENDER_PUB, SENDER_KEY).unwrap();
        let b = encrypt(MESSAGE, RECIPIENT_PUB, SENDER_PUB, SENDER_KEY).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rsa_sender_key_rejected() {
        let err = encrypt(MESSAGE, RECIPIENT_PUB, SENDER_PUB, RSA_KEY).unwrap_err();
        assert!(matches!(err, EncryptionError::IncorrectKeyFormat));
    }

    #[test]
    fn test_mismatched_sender_public_key_rejected() {
        let err = encrypt(MESSAGE, RECIPIENT_PUB, RECIPIENT_PUB, SENDER_KEY).unwrap_err();
        assert!(matches!(err, EncryptionError::SenderKeyMismatch));
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let err = decrypt(&BASE64.encode([0u8; 4]), RECIPIENT_KEY, SENDER_PUB).unwrap_err();
        assert!(matches!(err, EncryptionError::DecryptFailed(_)));
    }
}
