#![allow(dead_code)]

use std::sync::Once;

use pawnbank_core::{AssetRef, BankConfig, CallContext, PawnBank, Timestamp, Vault, UNIT};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Installs a test subscriber once per test binary; `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Block time every fixture starts from.
pub const START: Timestamp = 1_626_804_926;
pub const EXPIRY: Timestamp = START + 3_600;

pub const OWNER: &str = "snowfro";
pub const LENDER_ONE: &str = "binance";
pub const LENDER_TWO: &str = "kraken";
pub const BYSTANDER: &str = "passerby";

pub fn squiggle() -> AssetRef {
    AssetRef::new("chromie-squiggle", 0)
}

pub fn at(caller: &str, now: Timestamp) -> CallContext {
    CallContext::new(caller, now)
}

/// Funded accounts and loan 0: 5% over the term, 10 unit ceiling, 1h expiry.
pub fn scaffold_loan() -> PawnBank<Vault> {
    init_test_logging();
    let config = BankConfig::default();
    let mut vault = Vault::new(config.escrow_account.clone());
    vault.mint(squiggle(), OWNER.into());
    for who in [OWNER, LENDER_ONE, LENDER_TWO, BYSTANDER] {
        vault.credit_account(&who.into(), 10_000 * UNIT).unwrap();
    }
    let mut bank = PawnBank::new(config, vault);
    let id = bank
        .create(&at(OWNER, START), squiggle(), 5, 10 * UNIT, EXPIRY)
        .unwrap();
    assert_eq!(id, 0);
    bank
}

pub fn balance(bank: &PawnBank<Vault>, who: &str) -> u128 {
    bank.settlement().balance_of(who)
}

pub fn holder(bank: &PawnBank<Vault>) -> Option<String> {
    use pawnbank_core::AssetCustody;
    bank.settlement().owner_of(&squiggle())
}
