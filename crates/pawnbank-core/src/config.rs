use serde::{Deserialize, Serialize};

use crate::types::AccountId;

pub const DEFAULT_SETTLEMENT_BUFFER_SECS: u64 = 120;
pub const DEFAULT_ESCROW_ACCOUNT: &str = "pawnbank";
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Period over which `interest_rate` percent is earned.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// The rate covers the whole funded term, first bid to expiry.
    #[default]
    LoanTerm,
    /// The rate is per 365-day year.
    Annual,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BankConfig {
    /// Seconds added to `now` when quoting underwrite and repay values,
    /// so a quote still covers interest at execution time.
    pub settlement_buffer_secs: u64,
    pub rate_basis: RateBasis,
    /// Identity under which the ledger holds escrowed value and pledged assets.
    pub escrow_account: AccountId,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            settlement_buffer_secs: DEFAULT_SETTLEMENT_BUFFER_SECS,
            rate_basis: RateBasis::default(),
            escrow_account: DEFAULT_ESCROW_ACCOUNT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: BankConfig = serde_json::from_str(r#"{"rate_basis":"annual"}"#).unwrap();
        assert_eq!(cfg.rate_basis, RateBasis::Annual);
        assert_eq!(cfg.settlement_buffer_secs, 120);
        assert_eq!(cfg.escrow_account, "pawnbank");
    }
}
