// Copyright (c) 2026 TransactID Contributors. MIT License.
// See LICENSE for details.

//! # TransactID Protocol Core Library
//!
//! BIP-75 style payment messaging between Virtual Asset Service Providers.
//! Two VASPs exchange four messages (InvoiceRequest, PaymentRequest, Payment,
//! PaymentAck), each wrapped in a versioned envelope, optionally encrypted
//! with ECDH + AES-256-GCM, and carrying X.509-backed attestations about the
//! parties behind the transfer.
//!
//! ## Architecture
//!
//! - **transactid**: The [`TransactId`] facade. Start here.
//! - **messages**: One processor per message type: create, parse, validate.
//! - **envelope**: The outer protocol message, its status and its encryption.
//! - **model**: Attestations, owners, outputs, parameters, status codes.
//! - **pki**: Certificate parsing, chain / expiry / CRL checks, EV detection.
//! - **crypto**: Hashing, RSA and ECDSA signatures, message encryption, keys.
//! - **services**: Pluggable address lookups and attestation key generation.
//! - **codec**: The canonical byte encoding everything is signed over.
//! - **config**: Protocol constants.
//!
//! ## Ground rules
//!
//! 1. `parse` never validates; `is_valid` checks everything and fails fast.
//! 2. Every failure is a typed [`TransactIdError`] naming what failed.
//! 3. Status changes never touch the signed parts of a message.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod model;
pub mod pki;
pub mod services;
pub mod transactid;

pub use error::{Result, TransactIdError};
pub use messages::{InvoiceRequest, Payment, PaymentAck, PaymentRequest, ProtocolMessageKind};
pub use transactid::{TransactId, TransactIdBuilder};
