//! In-memory custody and payment collaborator.
//!
//! Keeps fungible balances per account and the current holder of every known
//! asset. The ledger's own holdings live under the configured escrow account.
//! `settle` stages the whole plan on a copy, so a failing plan leaves the
//! vault untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::custody::{apply_step, AssetCustody, PaymentRail, Settlement, Transfer};
use crate::error::TransferError;
use crate::types::{AccountId, Amount, AssetRef};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vault {
    escrow: AccountId,
    balances: BTreeMap<AccountId, Amount>,
    #[serde(with = "holder_entries")]
    holders: BTreeMap<AssetRef, AccountId>,
}

impl Vault {
    pub fn new(escrow: impl Into<AccountId>) -> Self {
        Self {
            escrow: escrow.into(),
            balances: BTreeMap::new(),
            holders: BTreeMap::new(),
        }
    }

    pub fn escrow_account(&self) -> &AccountId {
        &self.escrow
    }

    pub fn balance_of(&self, account: &str) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Value currently held by the ledger.
    pub fn escrow_balance(&self) -> Amount {
        self.balance_of(&self.escrow)
    }

    pub fn balances(&self) -> &BTreeMap<AccountId, Amount> {
        &self.balances
    }

    pub fn holdings(&self) -> impl Iterator<Item = (&AssetRef, &AccountId)> {
        self.holders.iter()
    }

    /// Adds external value to an account.
    pub fn credit_account(&mut self, account: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::BalanceOverflow(account.clone()))?;
        Ok(())
    }

    pub fn debit_account(&mut self, account: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                account: account.clone(),
                needed: amount,
                available,
            });
        }
        if let Some(balance) = self.balances.get_mut(account) {
            *balance -= amount;
        }
        Ok(())
    }

    /// Registers an asset held by `holder`, replacing any previous holder.
    pub fn mint(&mut self, asset: AssetRef, holder: AccountId) {
        self.holders.insert(asset, holder);
    }

    /// The escrow account only ever sits on the ledger side of a transfer.
    fn counterparty<'a>(&self, account: &'a AccountId) -> Result<&'a AccountId, TransferError> {
        if *account == self.escrow {
            return Err(TransferError::EscrowCounterparty(account.clone()));
        }
        Ok(account)
    }

    fn move_value(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        self.debit_account(from, amount)?;
        self.credit_account(to, amount)
    }

    fn move_asset(&mut self, asset: &AssetRef, from: &AccountId, to: &AccountId) -> Result<(), TransferError> {
        let holder = self
            .holders
            .get_mut(asset)
            .ok_or_else(|| TransferError::UnknownAsset(asset.clone()))?;
        if *holder != *from {
            return Err(TransferError::NotHolder {
                asset: asset.clone(),
                account: from.clone(),
            });
        }
        *holder = to.clone();
        Ok(())
    }
}

impl AssetCustody for Vault {
    fn transfer_in(&mut self, asset: &AssetRef, from: &AccountId) -> Result<(), TransferError> {
        let from = self.counterparty(from)?;
        let escrow = self.escrow.clone();
        self.move_asset(asset, from, &escrow)
    }

    fn transfer_out(&mut self, asset: &AssetRef, to: &AccountId) -> Result<(), TransferError> {
        let to = self.counterparty(to)?;
        let escrow = self.escrow.clone();
        self.move_asset(asset, &escrow, to)
    }

    fn owner_of(&self, asset: &AssetRef) -> Option<AccountId> {
        self.holders.get(asset).cloned()
    }
}

impl PaymentRail for Vault {
    fn receive(&mut self, from: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let from = self.counterparty(from)?;
        let escrow = self.escrow.clone();
        self.move_value(from, &escrow, amount)
    }

    fn pay(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let to = self.counterparty(to)?;
        let escrow = self.escrow.clone();
        self.move_value(&escrow, to, amount)
    }
}

impl Settlement for Vault {
    fn settle(&mut self, plan: &[Transfer]) -> Result<(), TransferError> {
        let mut staged = self.clone();
        for step in plan {
            apply_step(&mut staged, step)?;
        }
        *self = staged;
        Ok(())
    }
}

mod holder_entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::types::{AccountId, AssetRef};

    #[derive(Serialize, Deserialize)]
    struct Entry {
        asset: AssetRef,
        holder: AccountId,
    }

    pub fn serialize<S>(value: &BTreeMap<AssetRef, AccountId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<Entry> = value
            .iter()
            .map(|(asset, holder)| Entry {
                asset: asset.clone(),
                holder: holder.clone(),
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<AssetRef, AccountId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.asset, e.holder)).collect())
    }
}
