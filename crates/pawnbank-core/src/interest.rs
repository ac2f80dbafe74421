//! Interest and repayment projections over a [`LoanRecord`].
//!
//! All functions are pure: they read the record and a point in time and never
//! mutate anything. Integer arithmetic throughout, floor division, 128-bit
//! intermediates; overflow is reported instead of wrapping.

use crate::config::{RateBasis, SECONDS_PER_YEAR};
use crate::error::LoanError;
use crate::loan::LoanRecord;
use crate::types::{Amount, Timestamp};

const PERCENT: u128 = 100;

/// Seconds over which `interest_rate` percent is earned.
fn basis_seconds(loan: &LoanRecord, basis: RateBasis) -> u64 {
    match basis {
        RateBasis::LoanTerm => loan
            .loan_complete_time
            .saturating_sub(loan.first_bid_time),
        RateBasis::Annual => SECONDS_PER_YEAR,
    }
}

/// Interest earned by the current lender between `last_bid_time` and `at`.
pub fn interest_accrued(
    loan: &LoanRecord,
    basis: RateBasis,
    at: Timestamp,
) -> Result<Amount, LoanError> {
    if !loan.has_bids() {
        return Ok(0);
    }
    let period = basis_seconds(loan, basis);
    if period == 0 {
        return Ok(0);
    }
    let elapsed = at.saturating_sub(loan.last_bid_time) as u128;
    let numerator = loan
        .loan_amount
        .checked_mul(loan.interest_rate as u128)
        .and_then(|v| v.checked_mul(elapsed))
        .ok_or(LoanError::Overflow)?;
    Ok(numerator / (PERCENT * period as u128))
}

/// Accrued interest of the current lender plus interest carried from
/// displaced lenders.
pub fn total_interest(
    loan: &LoanRecord,
    basis: RateBasis,
    at: Timestamp,
) -> Result<Amount, LoanError> {
    interest_accrued(loan, basis, at)?
        .checked_add(loan.historic_interest)
        .ok_or(LoanError::Overflow)
}

/// Upper bound on what a loan can ever owe while repayable: the ceiling plus
/// the rate earned on it over `term` seconds. `None` when that does not fit,
/// in which case some repayment before expiry could overflow.
pub fn worst_case_repayment(max_loan_amount: Amount, interest_rate: u32, term: u64) -> Option<Amount> {
    max_loan_amount
        .checked_mul(interest_rate as u128)?
        .checked_mul(term as u128)
        .map(|numerator| numerator / PERCENT)?
        .checked_add(max_loan_amount)
}

/// Principal plus total interest: what the lender is owed at `at`.
pub fn required_repayment(
    loan: &LoanRecord,
    basis: RateBasis,
    at: Timestamp,
) -> Result<Amount, LoanError> {
    total_interest(loan, basis, at)?
        .checked_add(loan.loan_amount)
        .ok_or(LoanError::Overflow)
}
