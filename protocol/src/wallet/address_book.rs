//! A fixed address ownership table.
//!
//! Answers [`AddressOracle`] queries from memory. The CLI uses it for
//! offline translation, where the ownership facts come from a JSON bundle
//! exported earlier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{AddressOracle, AddressValidation, WalletError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: HashMap<String, AddressValidation>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a wallet-owned address at `account/branch/index`.
    pub fn insert_owned(&mut self, address: impl Into<String>, account: u32, internal: bool, index: u32) {
        self.entries.insert(
            address.into(),
            AddressValidation {
                is_valid: true,
                is_mine: true,
                is_internal: internal,
                account,
                index,
                is_script: false,
            },
        );
    }

    /// Records a valid address the wallet does not own.
    pub fn insert_foreign(&mut self, address: impl Into<String>, is_script: bool) {
        self.entries.insert(
            address.into(),
            AddressValidation {
                is_valid: true,
                is_script,
                ..Default::default()
            },
        );
    }

    pub fn insert(&mut self, address: impl Into<String>, validation: AddressValidation) {
        self.entries.insert(address.into(), validation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AddressOracle for AddressBook {
    /// Unknown addresses are reported invalid.
    async fn validate_address(&self, address: &str) -> Result<AddressValidation, WalletError> {
        Ok(self.entries.get(address).copied().unwrap_or_default())
    }
}
