//! Travel-rule attestation tags.
//!
//! Each tag names one IVMS101-style data field about a person or entity.
//! Tags appear in two places: in `attestations_requested` (what the sender
//! asks the counterparty for) and on every [`PkiData`](super::PkiData) (what
//! that certificate attests to).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One attestable identity field.
///
/// Serializes as its `SCREAMING_SNAKE_CASE` name in JSON and as its variant
/// index on the binary wire, so the variant order is part of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attestation {
    LegalPersonName,
    LegalPersonPhoneticNameIdentifier,
    AddressDepartment,
    AddressSubDepartment,
    AddressStreetName,
    AddressBuildingNumber,
    AddressBuildingName,
    AddressFloor,
    AddressPostbox,
    AddressRoom,
    AddressPostcode,
    AddressTownName,
    AddressTownLocationName,
    AddressDistrictName,
    AddressCountrySubDivision,
    AddressAddressLine,
    AddressCountry,
    NaturalPersonPrimaryIdentifier,
    NaturalPersonSecondaryIdentifier,
    NaturalPersonPhoneticNameIdentifier,
    DateOfBirth,
    PlaceOfBirth,
    CountryOfResidence,
    CountryOfIssue,
    CountryOfRegistration,
    NationalIdentifier,
    AccountNumber,
    CustomerIdentification,
    RegistrationAuthority,
}

impl Attestation {
    /// Every tag, in wire order.
    pub const ALL: [Attestation; 29] = [
        Self::LegalPersonName,
        Self::LegalPersonPhoneticNameIdentifier,
        Self::AddressDepartment,
        Self::AddressSubDepartment,
        Self::AddressStreetName,
        Self::AddressBuildingNumber,
        Self::AddressBuildingName,
        Self::AddressFloor,
        Self::AddressPostbox,
        Self::AddressRoom,
        Self::AddressPostcode,
        Self::AddressTownName,
        Self::AddressTownLocationName,
        Self::AddressDistrictName,
        Self::AddressCountrySubDivision,
        Self::AddressAddressLine,
        Self::AddressCountry,
        Self::NaturalPersonPrimaryIdentifier,
        Self::NaturalPersonSecondaryIdentifier,
        Self::NaturalPersonPhoneticNameIdentifier,
        Self::DateOfBirth,
        Self::PlaceOfBirth,
        Self::CountryOfResidence,
        Self::CountryOfIssue,
        Self::CountryOfRegistration,
        Self::NationalIdentifier,
        Self::AccountNumber,
        Self::CustomerIdentification,
        Self::RegistrationAuthority,
    ];

    /// The canonical upper-case name, e.g. `"LEGAL_PERSON_NAME"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegalPersonName => "LEGAL_PERSON_NAME",
            Self::LegalPersonPhoneticNameIdentifier => "LEGAL_PERSON_PHONETIC_NAME_IDENTIFIER",
            Self::AddressDepartment => "ADDRESS_DEPARTMENT",
            Self::AddressSubDepartment => "ADDRESS_SUB_DEPARTMENT",
            Self::AddressStreetName => "ADDRESS_STREET_NAME",
            Self::AddressBuildingNumber => "ADDRESS_BUILDING_NUMBER",
            Self::AddressBuildingName => "ADDRESS_BUILDING_NAME",
            Self::AddressFloor => "ADDRESS_FLOOR",
            Self::AddressPostbox => "ADDRESS_POSTBOX",
            Self::AddressRoom => "ADDRESS_ROOM",
            Self::AddressPostcode => "ADDRESS_POSTCODE",
            Self::AddressTownName => "ADDRESS_TOWN_NAME",
            Self::AddressTownLocationName => "ADDRESS_TOWN_LOCATION_NAME",
            Self::AddressDistrictName => "ADDRESS_DISTRICT_NAME",
            Self::AddressCountrySubDivision => "ADDRESS_COUNTRY_SUB_DIVISION",
            Self::AddressAddressLine => "ADDRESS_ADDRESS_LINE",
            Self::AddressCountry => "ADDRESS_COUNTRY",
            Self::NaturalPersonPrimaryIdentifier => "NATURAL_PERSON_PRIMARY_IDENTIFIER",
            Self::NaturalPersonSecondaryIdentifier => "NATURAL_PERSON_SECONDARY_IDENTIFIER",
            Self::NaturalPersonPhoneticNameIdentifier => "NATURAL_PERSON_PHONETIC_NAME_IDENTIFIER",
            Self::DateOfBirth => "DATE_OF_BIRTH",
            Self::PlaceOfBirth => "PLACE_OF_BIRTH",
            Self::CountryOfResidence => "COUNTRY_OF_RESIDENCE",
            Self::CountryOfIssue => "COUNTRY_OF_ISSUE",
            Self::CountryOfRegistration => "COUNTRY_OF_REGISTRATION",
            Self::NationalIdentifier => "NATIONAL_IDENTIFIER",
            Self::AccountNumber => "ACCOUNT_NUMBER",
            Self::CustomerIdentification => "CUSTOMER_IDENTIFICATION",
            Self::RegistrationAuthority => "REGISTRATION_AUTHORITY",
        }
    }
}

impl fmt::Display for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attestation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|attestation| attestation.as_str() == wanted)
            .ok_or_else(|| format!("unknown attestation: {s}"))
    }
}
