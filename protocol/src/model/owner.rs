//! Originators and beneficiaries.
//!
//! An owner is a party to the transfer together with the attestations that
//! identify it. Lists of owners follow one rule: when the list is in play,
//! exactly one owner is primary for the transaction. Only the primary
//! owner's attestations are signed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::pki_data::{PkiData, PkiDataParameters};
use crate::error::Result;

/// Which side of the transfer an owner list describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerType {
    Originator,
    Beneficiary,
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Originator => write!(f, "originator"),
            Self::Beneficiary => write!(f, "beneficiary"),
        }
    }
}

/// Owner-list policy violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerValidationError {
    #[error("empty, {0} required")]
    Empty(OwnerType),

    #[error("no primary owner for {0}")]
    NoPrimary(OwnerType),

    #[error("multiple primary owners for {0}")]
    MultiplePrimary(OwnerType),
}

impl OwnerValidationError {
    pub fn owner_type(&self) -> OwnerType {
        match self {
            Self::Empty(owner_type)
            | Self::NoPrimary(owner_type)
            | Self::MultiplePrimary(owner_type) => *owner_type,
        }
    }
}

/// Anything that can be primary for a transaction.
pub trait PrimaryOwner {
    fn is_primary_for_transaction(&self) -> bool;
}

/// Enforce the owner-list policy.
///
/// An empty list fails only when `required`. A non-empty list needs exactly
/// one primary owner.
///
/// ```
/// use transactid_protocol::model::{validate_owners, OwnerParameters, OwnerType};
///
/// let owners: Vec<OwnerParameters> = Vec::new();
/// assert!(validate_owners(&owners, false, OwnerType::Beneficiary).is_ok());
/// assert!(validate_owners(&owners, true, OwnerType::Originator).is_err());
/// ```
pub fn validate_owners<O: PrimaryOwner>(
    owners: &[O],
    required: bool,
    owner_type: OwnerType,
) -> std::result::Result<(), OwnerValidationError> {
    if owners.is_empty() {
        return if required {
            Err(OwnerValidationError::Empty(owner_type))
        } else {
            Ok(())
        };
    }

    match owners
        .iter()
        .filter(|owner| owner.is_primary_for_transaction())
        .count()
    {
        0 => Err(OwnerValidationError::NoPrimary(owner_type)),
        1 => Ok(()),
        _ => Err(OwnerValidationError::MultiplePrimary(owner_type)),
    }
}

/// An owner with its attestations, as it travels on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub primary_for_transaction: bool,
    pub pki_data_set: Vec<PkiData>,
}

pub type Originator = Owner;
pub type Beneficiary = Owner;

impl PrimaryOwner for Owner {
    fn is_primary_for_transaction(&self) -> bool {
        self.primary_for_transaction
    }
}

/// Caller-side owner description, holding the signing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerParameters {
    #[serde(default)]
    pub primary_for_transaction: bool,
    #[serde(default)]
    pub pki_data_parameters_sets: Vec<PkiDataParameters>,
}

impl PrimaryOwner for OwnerParameters {
    fn is_primary_for_transaction(&self) -> bool {
        self.primary_for_transaction
    }
}

impl OwnerParameters {
    /// Build the wire owner, signing attestations when `sign_primary` is set
    /// and this owner is primary.
    pub fn to_owner(&self, sign_primary: bool) -> Result<Owner> {
        let require_signature = sign_primary && self.primary_for_transaction;
        let pki_data_set = self
            .pki_data_parameters_sets
            .iter()
            .map(|parameters| parameters.to_pki_data(require_signature))
            .collect::<Result<Vec<_>>>()?;
        Ok(Owner {
            primary_for_transaction: self.primary_for_transaction,
            pki_data_set,
        })
    }
}

/// Convert a whole owner list.
pub fn to_owners(parameters: &[OwnerParameters], sign_primary: bool) -> Result<Vec<Owner>> {
    parameters
        .iter()
        .map(|owner| owner.to_owner(sign_primary))
        .collect()
}
