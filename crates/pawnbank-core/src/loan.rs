use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount, AssetRef, Timestamp};

/// One pledged asset and the auction/funding state built on top of it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanRecord {
    pub asset: AssetRef,
    /// Original pledger. `None` once the loan is repaid, cancelled or seized.
    pub token_owner: Option<AccountId>,
    /// Current top bidder.
    pub lender: Option<AccountId>,
    /// Whole percent.
    pub interest_rate: u32,
    #[serde(with = "crate::types::amount_str")]
    pub loan_amount: Amount,
    #[serde(with = "crate::types::amount_str")]
    pub max_loan_amount: Amount,
    #[serde(with = "crate::types::amount_str")]
    pub loan_amount_drawn: Amount,
    /// 0 until the first underwrite.
    pub first_bid_time: Timestamp,
    pub last_bid_time: Timestamp,
    /// Interest earned by displaced lenders and still owed by the borrower.
    #[serde(with = "crate::types::amount_str")]
    pub historic_interest: Amount,
    pub loan_complete_time: Timestamp,
}

impl LoanRecord {
    pub fn new(
        owner: AccountId,
        asset: AssetRef,
        interest_rate: u32,
        max_loan_amount: Amount,
        loan_complete_time: Timestamp,
    ) -> Self {
        Self {
            asset,
            token_owner: Some(owner),
            lender: None,
            interest_rate,
            loan_amount: 0,
            max_loan_amount,
            loan_amount_drawn: 0,
            first_bid_time: 0,
            last_bid_time: 0,
            historic_interest: 0,
            loan_complete_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.token_owner.is_some()
    }

    pub fn has_bids(&self) -> bool {
        self.first_bid_time != 0
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.loan_complete_time
    }

    pub fn is_owned_by(&self, account: &str) -> bool {
        self.token_owner.as_deref() == Some(account)
    }

    /// Capital the owner can still draw.
    pub fn undrawn(&self) -> Amount {
        self.loan_amount.saturating_sub(self.loan_amount_drawn)
    }

    /// `loan_amount_drawn <= loan_amount <= max_loan_amount`, and the lender,
    /// amount and first bid time are either all set or all empty.
    pub fn invariants_hold(&self) -> bool {
        let bounded = self.loan_amount_drawn <= self.loan_amount
            && self.loan_amount <= self.max_loan_amount;
        let unbid = self.lender.is_none();
        let consistent = unbid == (self.loan_amount == 0) && unbid == (self.first_bid_time == 0);
        bounded && consistent
    }
}
