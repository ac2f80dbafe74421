//! Boundary between the ledger and the systems that actually move assets and
//! value.

use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::types::{AccountId, Amount, AssetRef};

/// Moves uniquely identified assets between holders.
pub trait AssetCustody {
    /// Pull `asset` from `from` into ledger custody.
    fn transfer_in(&mut self, asset: &AssetRef, from: &AccountId) -> Result<(), TransferError>;
    /// Release `asset` from ledger custody to `to`.
    fn transfer_out(&mut self, asset: &AssetRef, to: &AccountId) -> Result<(), TransferError>;
    fn owner_of(&self, asset: &AssetRef) -> Option<AccountId>;
}

/// Moves fungible value between callers and the ledger.
pub trait PaymentRail {
    /// Value attached to a call by `from`, now held by the ledger.
    fn receive(&mut self, from: &AccountId, amount: Amount) -> Result<(), TransferError>;
    /// Pay `amount` of ledger-held value to `to`.
    fn pay(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError>;
}

/// One step of a settlement plan.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transfer {
    Receive {
        from: AccountId,
        #[serde(with = "crate::types::amount_str")]
        amount: Amount,
    },
    Pay {
        to: AccountId,
        #[serde(with = "crate::types::amount_str")]
        amount: Amount,
    },
    AssetIn { asset: AssetRef, from: AccountId },
    AssetOut { asset: AssetRef, to: AccountId },
}

/// Executes the transfers an operation needs.
///
/// The default applies the plan step by step and stops at the first failure.
/// Implementations that can stage their state should override `settle` so a
/// failed plan leaves nothing applied.
pub trait Settlement: AssetCustody + PaymentRail {
    fn settle(&mut self, plan: &[Transfer]) -> Result<(), TransferError> {
        for step in plan {
            apply_step(self, step)?;
        }
        Ok(())
    }
}

pub(crate) fn apply_step<S>(target: &mut S, step: &Transfer) -> Result<(), TransferError>
where
    S: AssetCustody + PaymentRail + ?Sized,
{
    match step {
        Transfer::Receive { from, amount } => target.receive(from, *amount),
        Transfer::Pay { to, amount } => target.pay(to, *amount),
        Transfer::AssetIn { asset, from } => target.transfer_in(asset, from),
        Transfer::AssetOut { asset, to } => target.transfer_out(asset, to),
    }
}

/// Builder for a settlement plan; zero-value payments are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettlementPlan {
    steps: Vec<Transfer>,
}

impl SettlementPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(mut self, from: &AccountId, amount: Amount) -> Self {
        if amount > 0 {
            self.steps.push(Transfer::Receive {
                from: from.clone(),
                amount,
            });
        }
        self
    }

    pub fn pay(mut self, to: &AccountId, amount: Amount) -> Self {
        if amount > 0 {
            self.steps.push(Transfer::Pay {
                to: to.clone(),
                amount,
            });
        }
        self
    }

    pub fn asset_in(mut self, asset: &AssetRef, from: &AccountId) -> Self {
        self.steps.push(Transfer::AssetIn {
            asset: asset.clone(),
            from: from.clone(),
        });
        self
    }

    pub fn asset_out(mut self, asset: &AssetRef, to: &AccountId) -> Self {
        self.steps.push(Transfer::AssetOut {
            asset: asset.clone(),
            to: to.clone(),
        });
        self
    }

    pub fn steps(&self) -> &[Transfer] {
        &self.steps
    }

    /// Value the plan pulls into the ledger.
    pub fn received(&self) -> Amount {
        self.steps.iter().fold(0, |acc: Amount, step| match step {
            Transfer::Receive { amount, .. } => acc.saturating_add(*amount),
            _ => acc,
        })
    }

    /// Value the plan pays out of the ledger.
    pub fn paid_out(&self) -> Amount {
        self.steps.iter().fold(0, |acc: Amount, step| match step {
            Transfer::Pay { amount, .. } => acc.saturating_add(*amount),
            _ => acc,
        })
    }
}
