use std::fmt;

use serde::{Deserialize, Serialize};

pub type AccountId = String;
pub type Amount = u128;
pub type Timestamp = u64;
pub type LoanId = u64;

/// A uniquely identified non-fungible asset: issuing contract plus token id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetRef {
    pub contract: String,
    pub token_id: u64,
}

impl AssetRef {
    pub fn new(contract: impl Into<String>, token_id: u64) -> Self {
        Self {
            contract: contract.into(),
            token_id,
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.contract, self.token_id)
    }
}

/// Who is calling and when. Injected into every ledger operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: impl Into<AccountId>, now: Timestamp) -> Self {
        Self {
            caller: caller.into(),
            now,
        }
    }
}

/// Amounts travel as decimal strings so 128-bit values survive JSON readers
/// and internally tagged enums.
pub(crate) mod amount_str {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(D::Error::custom)
    }
}
