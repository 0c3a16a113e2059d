//! # Protocol Configuration & Constants
//!
//! Every fixed number the TransactID stack depends on lives here: the
//! envelope version, the crypto parameter sizes, CRL timeouts, and the
//! default shape of generated keys.
//!
//! Changing any of the wire-related values breaks interoperability with
//! every peer that already speaks version 1, so treat them as frozen.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Version stamped into every plain and encrypted envelope.
pub const PROTOCOL_VERSION: u32 = 1;

/// Version stamped into `PaymentRequest.payment_details_version`.
pub const PAYMENT_DETAILS_VERSION: u32 = 1;

/// Network named in a PaymentRequest when the caller gives none.
pub const DEFAULT_NETWORK: &str = "main";

/// Upper bound on a decoded envelope or message. Anything larger is rejected
/// before allocation. Travel-rule payloads are a few kilobytes; certificate
/// bundles push that to tens of kilobytes at most.
pub const MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Cryptography
// ---------------------------------------------------------------------------

/// AES-256 key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes (96 bits).
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// HKDF `info` label for deriving the envelope key from the ECDH secret.
/// Both public keys are appended to it, so a key is bound to one
/// sender/recipient pair.
pub const ENCRYPTION_KDF_INFO: &[u8] = b"transactid-envelope/v1";

/// Modulus size for RSA keys produced by the key generation service.
pub const RSA_KEY_BITS: usize = 2048;

// ---------------------------------------------------------------------------
// Certificate trust
// ---------------------------------------------------------------------------

/// How long a single CRL download may take before the revocation check
/// fails. Timeouts count as failures, never as "not revoked".
pub const CRL_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest CRL body a download may return. Bigger responses fail the
/// revocation check.
pub const MAX_CRL_SIZE: u64 = 32 * 1024 * 1024;

/// PEM label of an X.509 certificate block.
pub const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";
