use thiserror::Error;

use crate::types::{AccountId, Amount, AssetRef, LoanId};

/// Failure reported by a custody or payment collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    /// The asset is unknown to the custodian.
    #[error("unknown asset {0}")]
    UnknownAsset(AssetRef),

    /// The party asked to release the asset does not hold it.
    #[error("{account} does not hold asset {asset}")]
    NotHolder { asset: AssetRef, account: AccountId },

    /// A debit would take the account below zero.
    #[error("insufficient funds in account {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// A credit would overflow the account balance.
    #[error("balance overflow in account {0}")]
    BalanceOverflow(AccountId),

    /// The custodian's own account appeared as the other side of a transfer.
    #[error("escrow account {0} can't be a transfer counterparty")]
    EscrowCounterparty(AccountId),
}

/// Canonical rejection reasons of the loan ledger.
///
/// Every variant aborts the whole operation; no record or balance is touched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoanError {
    #[error("loan {0} does not exist")]
    UnknownLoan(LoanId),

    #[error("can't create loan in past")]
    InvalidSchedule,

    #[error("max loan amount must be > 0")]
    InvalidCeiling,

    /// Interest on the ceiling over the full term would not fit in an [`Amount`].
    #[error("max loan amount too large for rate and term")]
    CeilingTooLarge,

    #[error("transfer rejected: {0}")]
    TransferRejected(#[from] TransferError),

    #[error("can't underwrite a closed loan")]
    AlreadyClosed,

    #[error("can't underwrite with 0 value")]
    ZeroBid,

    #[error("loan has expired")]
    Expired,

    #[error("can't underwrite > max loan")]
    OverCeiling,

    #[error("can't underwrite < top lender")]
    InsufficientBid,

    #[error("must be asset owner")]
    NotOwner,

    #[error("no capacity to draw loan")]
    NoCapacity,

    #[error("max draw capacity reached")]
    MaxCapacity,

    #[error("loan has no bids")]
    NoBids,

    #[error("repayment of {provided} is below required {required}")]
    InsufficientRepayment { required: Amount, provided: Amount },

    #[error("can't cancel loan with >0 bids")]
    NonZeroBids,

    #[error("can't seize before expiry")]
    NotExpired,

    #[error("loan already repaid")]
    AlreadyRepaid,

    #[error("arithmetic overflow")]
    Overflow,
}

impl LoanError {
    /// Stable reason code, independent of the human readable message.
    pub fn code(&self) -> &'static str {
        match self {
            LoanError::UnknownLoan(_) => "UnknownLoan",
            LoanError::InvalidSchedule => "InvalidSchedule",
            LoanError::InvalidCeiling => "InvalidCeiling",
            LoanError::CeilingTooLarge => "CeilingTooLarge",
            LoanError::TransferRejected(_) => "TransferRejected",
            LoanError::AlreadyClosed => "AlreadyClosed",
            LoanError::ZeroBid => "ZeroBid",
            LoanError::Expired => "Expired",
            LoanError::OverCeiling => "OverCeiling",
            LoanError::InsufficientBid => "InsufficientBid",
            LoanError::NotOwner => "NotOwner",
            LoanError::NoCapacity => "NoCapacity",
            LoanError::MaxCapacity => "MaxCapacity",
            LoanError::NoBids => "NoBids",
            LoanError::InsufficientRepayment { .. } => "InsufficientRepayment",
            LoanError::NonZeroBids => "NonZeroBids",
            LoanError::NotExpired => "NotExpired",
            LoanError::AlreadyRepaid => "AlreadyRepaid",
            LoanError::Overflow => "Overflow",
        }
    }
}
