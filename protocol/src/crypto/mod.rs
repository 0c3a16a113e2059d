//! # Cryptographic Primitives
//!
//! Hashing, key decoding, signatures and envelope encryption. Everything
//! security-related in the message pipeline flows through here.
//!
//! - **SHA-256** hex digests as the signing input.
//! - **RSA-SHA256** for owner attestations and sender signatures.
//! - **ECDSA-SHA256 / secp256k1** for the encrypted envelope signature.
//! - **ECDH + HKDF + AES-256-GCM** for envelope encryption.
//!
//! Nothing here is novel. Each function is a thin, typed wrapper around an
//! audited RustCrypto implementation.

pub mod encryption;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use encryption::{decrypt, encrypt, EncryptionError};
pub use hash::{hash256, hash256_str, sha256};
pub use keys::{is_ecdsa_key, KeyError, KeyPairPem, PublicKeyMaterial};
pub use signatures::{sign, sign_ecdsa, verify, verify_ecdsa, SignatureError};
