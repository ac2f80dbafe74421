use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount, AssetRef, LoanId, Timestamp};

/// Record of a committed transition, for off-ledger indexing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoanEvent {
    LoanCreated {
        id: LoanId,
        owner: AccountId,
        asset: AssetRef,
        #[serde(with = "crate::types::amount_str")]
        max_loan_amount: Amount,
        loan_complete_time: Timestamp,
    },
    LoanUnderwritten {
        id: LoanId,
        lender: AccountId,
        #[serde(with = "crate::types::amount_str")]
        loan_amount: Amount,
    },
    LoanDrawn {
        id: LoanId,
        owner: AccountId,
        #[serde(with = "crate::types::amount_str")]
        amount: Amount,
    },
    LoanRepaid {
        id: LoanId,
        repayer: AccountId,
        lender: AccountId,
        #[serde(with = "crate::types::amount_str")]
        amount: Amount,
    },
    LoanCancelled {
        id: LoanId,
    },
    LoanSeized {
        id: LoanId,
        lender: AccountId,
        caller: AccountId,
    },
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            LoanEvent::LoanCreated { id, .. }
            | LoanEvent::LoanUnderwritten { id, .. }
            | LoanEvent::LoanDrawn { id, .. }
            | LoanEvent::LoanRepaid { id, .. }
            | LoanEvent::LoanCancelled { id }
            | LoanEvent::LoanSeized { id, .. } => *id,
        }
    }
}
