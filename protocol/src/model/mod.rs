//! # Data Model
//!
//! The vocabulary shared by every message: attestation tags, PKI data,
//! owners, outputs, status codes, envelope metadata and the parameter
//! structs callers fill in to create messages.
//!
//! Wire structures and caller-facing structures are the same types where
//! the fields line up. Values that never go on the wire (address lookups,
//! parsed envelope metadata) are `#[serde(skip)]`.

pub mod address_information;
pub mod attestation;
pub mod metadata;
pub mod output;
pub mod owner;
pub mod parameters;
pub mod pki_data;
pub mod status;

pub use address_information::{AddressAlert, AddressInformation};
pub use attestation::Attestation;
pub use metadata::ProtocolMessageMetadata;
pub use output::{AddressCurrency, Output};
pub use owner::{
    to_owners, validate_owners, Beneficiary, Originator, Owner, OwnerParameters, OwnerType,
    OwnerValidationError, PrimaryOwner,
};
pub use parameters::{
    EncryptionParameters, InvoiceRequestParameters, PaymentAckParameters, PaymentParameters,
    PaymentRequestParameters, RecipientParameters, SenderParameters,
};
pub use pki_data::{PkiData, PkiDataParameters, PkiType};
pub use status::{MessageInformation, MessageType, StatusCode};
