//! The loan ledger: an append-only book of [`LoanRecord`]s and the six guarded
//! transitions over it.
//!
//! Every operation validates its guards against a staged copy of one record,
//! builds a settlement plan, and only after the collaborator settled the plan
//! writes the record back and appends events. A rejected operation therefore
//! leaves both the book and the collaborator untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BankConfig;
use crate::custody::{Settlement, SettlementPlan};
use crate::error::LoanError;
use crate::events::LoanEvent;
use crate::interest;
use crate::loan::LoanRecord;
use crate::snapshot::LedgerSnapshot;
use crate::types::{AccountId, Amount, AssetRef, CallContext, LoanId, Timestamp};

/// Outcome of a successful [`PawnBank::repay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repayment {
    /// Principal plus interest paid to the lender.
    pub paid_to_lender: Amount,
    /// Overpayment returned to the repayer.
    pub refunded: Amount,
    /// Undrawn capital released to the owner.
    pub released_to_owner: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PawnBank<S> {
    config: BankConfig,
    loans: Vec<LoanRecord>,
    events: Vec<LoanEvent>,
    settlement: S,
}

impl<S: Settlement> PawnBank<S> {
    pub fn new(config: BankConfig, settlement: S) -> Self {
        Self {
            config,
            loans: Vec::new(),
            events: Vec::new(),
            settlement,
        }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// The custody/payment collaborator.
    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    pub fn settlement_mut(&mut self) -> &mut S {
        &mut self.settlement
    }

    pub fn loan_count(&self) -> u64 {
        self.loans.len() as u64
    }

    pub fn loan(&self, loan_id: LoanId) -> Result<&LoanRecord, LoanError> {
        usize::try_from(loan_id)
            .ok()
            .and_then(|idx| self.loans.get(idx))
            .ok_or(LoanError::UnknownLoan(loan_id))
    }

    pub fn loans(&self) -> &[LoanRecord] {
        &self.loans
    }

    pub fn events(&self) -> &[LoanEvent] {
        &self.events
    }

    pub fn events_for(&self, loan_id: LoanId) -> impl Iterator<Item = &LoanEvent> {
        self.events.iter().filter(move |e| e.loan_id() == loan_id)
    }

    pub fn snapshot(&self, taken_at: Timestamp) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.loans, self.events.len(), taken_at)
    }

    // ---- projections ----

    pub fn interest_accrued(&self, loan_id: LoanId, now: Timestamp, future: u64) -> Result<Amount, LoanError> {
        interest::interest_accrued(self.loan(loan_id)?, self.config.rate_basis, now.saturating_add(future))
    }

    pub fn total_interest(&self, loan_id: LoanId, now: Timestamp, future: u64) -> Result<Amount, LoanError> {
        interest::total_interest(self.loan(loan_id)?, self.config.rate_basis, now.saturating_add(future))
    }

    pub fn required_repayment(&self, loan_id: LoanId, now: Timestamp, future: u64) -> Result<Amount, LoanError> {
        interest::required_repayment(self.loan(loan_id)?, self.config.rate_basis, now.saturating_add(future))
    }

    /// Value to attach to `underwrite` so the loan is raised to at least
    /// `new_loan_amount`, with interest buffered by the settlement delay.
    pub fn quote_underwrite(&self, loan_id: LoanId, new_loan_amount: Amount, now: Timestamp) -> Result<Amount, LoanError> {
        let loan = self.loan(loan_id)?;
        if !loan.has_bids() {
            return Ok(new_loan_amount);
        }
        self.total_interest(loan_id, now, self.config.settlement_buffer_secs)?
            .checked_add(new_loan_amount)
            .ok_or(LoanError::Overflow)
    }

    /// Repayment due after the settlement delay; `repay` refunds the excess.
    pub fn quote_repayment(&self, loan_id: LoanId, now: Timestamp) -> Result<Amount, LoanError> {
        self.required_repayment(loan_id, now, self.config.settlement_buffer_secs)
    }

    // ---- transitions ----

    /// Pledges `asset` and opens a loan for bids. Returns the new loan id.
    pub fn create(
        &mut self,
        ctx: &CallContext,
        asset: AssetRef,
        interest_rate: u32,
        max_loan_amount: Amount,
        loan_complete_time: Timestamp,
    ) -> Result<LoanId, LoanError> {
        let loan_id = self.loan_count();
        let result = self.try_create(ctx, loan_id, asset, interest_rate, max_loan_amount, loan_complete_time);
        log_rejection("create", loan_id, ctx, result)
    }

    fn try_create(
        &mut self,
        ctx: &CallContext,
        loan_id: LoanId,
        asset: AssetRef,
        interest_rate: u32,
        max_loan_amount: Amount,
        loan_complete_time: Timestamp,
    ) -> Result<LoanId, LoanError> {
        if loan_complete_time <= ctx.now {
            return Err(LoanError::InvalidSchedule);
        }
        if max_loan_amount == 0 {
            return Err(LoanError::InvalidCeiling);
        }
        let term = loan_complete_time - ctx.now;
        if interest::worst_case_repayment(max_loan_amount, interest_rate, term).is_none() {
            return Err(LoanError::CeilingTooLarge);
        }
        let plan = SettlementPlan::new().asset_in(&asset, &ctx.caller);
        let record = LoanRecord::new(
            ctx.caller.clone(),
            asset.clone(),
            interest_rate,
            max_loan_amount,
            loan_complete_time,
        );
        let event = LoanEvent::LoanCreated {
            id: loan_id,
            owner: ctx.caller.clone(),
            asset,
            max_loan_amount,
            loan_complete_time,
        };
        self.commit(loan_id, record, plan, vec![event])?;
        Ok(loan_id)
    }

    /// Bids `value` on a loan. A first bid funds it directly; a later bid must
    /// also carry the interest owed to the lender it displaces, who is paid
    /// out principal plus interest in the same transition. Returns the new
    /// loan amount.
    pub fn underwrite(&mut self, ctx: &CallContext, loan_id: LoanId, value: Amount) -> Result<Amount, LoanError> {
        let result = self.try_underwrite(ctx, loan_id, value);
        log_rejection("underwrite", loan_id, ctx, result)
    }

    fn try_underwrite(&mut self, ctx: &CallContext, loan_id: LoanId, value: Amount) -> Result<Amount, LoanError> {
        let loan = self.loan(loan_id)?;
        if !loan.is_active() {
            return Err(LoanError::AlreadyClosed);
        }
        if value == 0 {
            return Err(LoanError::ZeroBid);
        }
        if loan.is_expired(ctx.now) {
            return Err(LoanError::Expired);
        }

        let mut next = loan.clone();
        let plan = match &loan.lender {
            None => {
                if value > loan.max_loan_amount {
                    return Err(LoanError::OverCeiling);
                }
                next.loan_amount = value;
                next.first_bid_time = ctx.now;
                SettlementPlan::new().receive(&ctx.caller, value)
            }
            Some(outgoing) => {
                let owed_interest = interest::total_interest(loan, self.config.rate_basis, ctx.now)?;
                let new_amount = value
                    .checked_sub(owed_interest)
                    .ok_or(LoanError::InsufficientBid)?;
                if new_amount > loan.max_loan_amount {
                    return Err(LoanError::OverCeiling);
                }
                if new_amount <= loan.loan_amount {
                    return Err(LoanError::InsufficientBid);
                }
                let buyout = loan
                    .loan_amount
                    .checked_add(owed_interest)
                    .ok_or(LoanError::Overflow)?;
                next.loan_amount = new_amount;
                next.historic_interest = owed_interest;
                SettlementPlan::new()
                    .receive(&ctx.caller, value)
                    .pay(outgoing, buyout)
            }
        };
        next.lender = Some(ctx.caller.clone());
        next.last_bid_time = ctx.now;

        let loan_amount = next.loan_amount;
        let event = LoanEvent::LoanUnderwritten {
            id: loan_id,
            lender: ctx.caller.clone(),
            loan_amount,
        };
        self.commit(loan_id, next, plan, vec![event])?;
        Ok(loan_amount)
    }

    /// Pays the owner whatever the current top bid made available since the
    /// last draw. Returns the amount paid.
    pub fn draw(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<Amount, LoanError> {
        let result = self.try_draw(ctx, loan_id);
        log_rejection("draw", loan_id, ctx, result)
    }

    fn try_draw(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<Amount, LoanError> {
        let loan = self.loan(loan_id)?;
        if !loan.is_owned_by(&ctx.caller) {
            return Err(LoanError::NotOwner);
        }
        if loan.loan_amount == 0 {
            return Err(LoanError::NoCapacity);
        }
        if loan.loan_amount_drawn >= loan.loan_amount {
            return Err(LoanError::MaxCapacity);
        }

        let amount = loan.undrawn();
        let mut next = loan.clone();
        next.loan_amount_drawn = loan.loan_amount;
        let plan = SettlementPlan::new().pay(&ctx.caller, amount);
        let event = LoanEvent::LoanDrawn {
            id: loan_id,
            owner: ctx.caller.clone(),
            amount,
        };
        self.commit(loan_id, next, plan, vec![event])?;
        Ok(amount)
    }

    /// Repays principal plus interest to the lender and returns the asset to
    /// its owner. Anyone may repay; overpayment is refunded to the caller and
    /// undrawn capital goes back to the owner.
    pub fn repay(&mut self, ctx: &CallContext, loan_id: LoanId, value: Amount) -> Result<Repayment, LoanError> {
        let result = self.try_repay(ctx, loan_id, value);
        log_rejection("repay", loan_id, ctx, result)
    }

    fn try_repay(&mut self, ctx: &CallContext, loan_id: LoanId, value: Amount) -> Result<Repayment, LoanError> {
        let loan = self.loan(loan_id)?;
        if !loan.has_bids() {
            return Err(LoanError::NoBids);
        }
        if loan.is_expired(ctx.now) {
            return Err(LoanError::Expired);
        }
        let (Some(owner), Some(lender)) = (loan.token_owner.clone(), loan.lender.clone()) else {
            return Err(LoanError::AlreadyRepaid);
        };

        let required = interest::required_repayment(loan, self.config.rate_basis, ctx.now)?;
        if value < required {
            return Err(LoanError::InsufficientRepayment {
                required,
                provided: value,
            });
        }
        let repayment = Repayment {
            paid_to_lender: required,
            refunded: value - required,
            released_to_owner: loan.undrawn(),
        };

        let plan = SettlementPlan::new()
            .receive(&ctx.caller, value)
            .pay(&lender, repayment.paid_to_lender)
            .pay(&ctx.caller, repayment.refunded)
            .pay(&owner, repayment.released_to_owner)
            .asset_out(&loan.asset, &owner);
        let mut next = loan.clone();
        let mut events = close_out(loan_id, &mut next, &owner);
        events.push(LoanEvent::LoanRepaid {
            id: loan_id,
            repayer: ctx.caller.clone(),
            lender,
            amount: required,
        });
        self.commit(loan_id, next, plan, events)?;
        Ok(repayment)
    }

    /// Withdraws an unbid loan and returns the asset to its owner.
    pub fn cancel(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<(), LoanError> {
        let result = self.try_cancel(ctx, loan_id);
        log_rejection("cancel", loan_id, ctx, result)
    }

    fn try_cancel(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<(), LoanError> {
        let loan = self.loan(loan_id)?;
        if !loan.is_owned_by(&ctx.caller) {
            return Err(LoanError::NotOwner);
        }
        if loan.loan_amount != 0 {
            return Err(LoanError::NonZeroBids);
        }
        let plan = SettlementPlan::new().asset_out(&loan.asset, &ctx.caller);
        let mut next = loan.clone();
        next.token_owner = None;
        self.commit(loan_id, next, plan, vec![LoanEvent::LoanCancelled { id: loan_id }])
    }

    /// Hands the asset of an expired, unrepaid loan to its lender. Anyone may
    /// call it; the beneficiary is always the recorded lender. Undrawn capital
    /// goes back to the former owner.
    pub fn seize(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<(), LoanError> {
        let result = self.try_seize(ctx, loan_id);
        log_rejection("seize", loan_id, ctx, result)
    }

    fn try_seize(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<(), LoanError> {
        let loan = self.loan(loan_id)?;
        let Some(owner) = loan.token_owner.clone() else {
            return Err(LoanError::AlreadyRepaid);
        };
        if !loan.is_expired(ctx.now) {
            return Err(LoanError::NotExpired);
        }
        let lender = loan.lender.clone().ok_or(LoanError::NoBids)?;

        let plan = SettlementPlan::new()
            .asset_out(&loan.asset, &lender)
            .pay(&owner, loan.undrawn());
        let mut next = loan.clone();
        let mut events = close_out(loan_id, &mut next, &owner);
        events.push(LoanEvent::LoanSeized {
            id: loan_id,
            lender,
            caller: ctx.caller.clone(),
        });
        self.commit(loan_id, next, plan, events)
    }

    /// Settles `plan`, then writes `record` at `loan_id` (appending when the
    /// id is new) and records `events`.
    fn commit(
        &mut self,
        loan_id: LoanId,
        record: LoanRecord,
        plan: SettlementPlan,
        events: Vec<LoanEvent>,
    ) -> Result<(), LoanError> {
        if let Err(err) = self.settlement.settle(plan.steps()) {
            warn!(loan_id, error = %err, steps = plan.steps().len(), "settlement failed");
            return Err(err.into());
        }
        debug!(
            loan_id,
            received = %plan.received(),
            paid_out = %plan.paid_out(),
            steps = plan.steps().len(),
            "settled"
        );

        let idx = loan_id as usize;
        if idx == self.loans.len() {
            self.loans.push(record);
        } else {
            self.loans[idx] = record;
        }
        for event in events {
            info!(loan_id, event = ?event, "loan transition");
            self.events.push(event);
        }
        Ok(())
    }
}

/// Marks the record closed and, when capital is still undrawn, releases it to
/// the owner.
fn close_out(loan_id: LoanId, loan: &mut LoanRecord, owner: &AccountId) -> Vec<LoanEvent> {
    let mut events = Vec::new();
    let undrawn = loan.undrawn();
    if undrawn > 0 {
        loan.loan_amount_drawn = loan.loan_amount;
        events.push(LoanEvent::LoanDrawn {
            id: loan_id,
            owner: owner.clone(),
            amount: undrawn,
        });
    }
    loan.token_owner = None;
    events
}

fn log_rejection<T>(op: &'static str, loan_id: LoanId, ctx: &CallContext, result: Result<T, LoanError>) -> Result<T, LoanError> {
    if let Err(err) = &result {
        debug!(op, loan_id, caller = %ctx.caller, now = ctx.now, code = err.code(), "rejected: {}", err);
    }
    result
}
