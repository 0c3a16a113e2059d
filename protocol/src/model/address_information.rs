//! Risk information about a blockchain address, as returned by an
//! [`AddressInformationService`](crate::services::AddressInformationService).

use serde::{Deserialize, Serialize};

/// One alert raised against an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressAlert {
    pub category: String,
    pub service: Option<String>,
    pub level: Option<String>,
    pub alert_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInformation {
    pub identifier: Option<String>,
    #[serde(default)]
    pub alerts: Vec<AddressAlert>,
    #[serde(default)]
    pub currency_verbose: Vec<String>,
    pub earliest_transaction_time: Option<String>,
    pub latest_transaction_time: Option<String>,
    pub risk_level: Option<i32>,
    pub risk_reason: Option<String>,
    pub risk_score: Option<f64>,
    pub transaction_count: Option<u64>,
    pub total_incoming_value: Option<String>,
    pub total_incoming_value_usd: Option<String>,
}
