//! Core of the PawnBank lending ledger.
//!
//! An owner pledges a non-fungible asset, lenders bid to fund a loan against it
//! up to a ceiling, interest accrues continuously, the owner draws capital as
//! bids raise it, and the loan ends in exactly one of repayment, cancellation
//! or seizure by the lender after expiry.
//!
//! * [`ledger`]: [`PawnBank`], the loan book and its six guarded transitions.
//! * [`interest`]: pure interest and repayment projections.
//! * [`custody`]: traits for the collaborators that move assets and value,
//!   and the settlement plans the ledger hands them.
//! * [`vault`]: an in-memory, all-or-nothing implementation of those
//!   collaborators.
//! * [`snapshot`]: sha256 merkle state root over the loan book.

pub mod clock;
pub mod config;
pub mod custody;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod snapshot;
pub mod types;
pub mod units;
pub mod vault;

mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BankConfig, RateBasis};
pub use custody::{AssetCustody, PaymentRail, Settlement, SettlementPlan, Transfer};
pub use error::{LoanError, TransferError};
pub use events::LoanEvent;
pub use ledger::{PawnBank, Repayment};
pub use loan::LoanRecord;
pub use snapshot::LedgerSnapshot;
pub use types::{AccountId, Amount, AssetRef, CallContext, LoanId, Timestamp};
pub use units::{format_units, parse_units, UnitsError, UNIT};
pub use vault::Vault;
