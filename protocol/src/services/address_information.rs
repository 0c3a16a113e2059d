//! Address risk lookups.

use super::ProviderError;
use crate::model::{AddressCurrency, AddressInformation};

/// Looks up risk information for a blockchain address.
///
/// `Ok(None)` means the service knows nothing about the address.
pub trait AddressInformationService: Send + Sync {
    fn get_address_information(
        &self,
        currency: AddressCurrency,
        script: &str,
    ) -> Result<Option<AddressInformation>, ProviderError>;
}
