//! Payment outputs: an amount paid to a script on some chain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::address_information::AddressInformation;

/// Chains an output can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressCurrency {
    Bitcoin,
    Ethereum,
    Litecoin,
    BitcoinCash,
}

impl AddressCurrency {
    pub fn ticker(&self) -> &'static str {
        match self {
            Self::Bitcoin => "BTC",
            Self::Ethereum => "ETH",
            Self::Litecoin => "LTC",
            Self::BitcoinCash => "BCH",
        }
    }
}

impl fmt::Display for AddressCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitcoin => write!(f, "BITCOIN"),
            Self::Ethereum => write!(f, "ETHEREUM"),
            Self::Litecoin => write!(f, "LITECOIN"),
            Self::BitcoinCash => write!(f, "BITCOIN_CASH"),
        }
    }
}

impl FromStr for AddressCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BITCOIN" | "BTC" => Ok(Self::Bitcoin),
            "ETHEREUM" | "ETH" => Ok(Self::Ethereum),
            "LITECOIN" | "LTC" => Ok(Self::Litecoin),
            "BITCOIN_CASH" | "BCH" => Ok(Self::BitcoinCash),
            other => Err(format!("unknown currency: {other}")),
        }
    }
}

/// An amount sent to `script`.
///
/// `address_information` is filled in by address lookups after parsing and
/// never goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Amount in the chain's smallest unit.
    pub amount: i64,
    /// Address or locking script.
    pub script: String,
    pub currency: AddressCurrency,
    #[serde(skip)]
    pub address_information: Option<AddressInformation>,
}

impl Output {
    pub fn new(amount: i64, script: impl Into<String>, currency: AddressCurrency) -> Self {
        Self {
            amount,
            script: script.into(),
            currency,
            address_information: None,
        }
    }
}
