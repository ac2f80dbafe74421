mod common;

use common::*;
use pawnbank_core::{LoanError, LoanEvent, UNIT};

#[test]
fn underwrite_then_expiry_blocks_new_bids() {
    let mut bank = scaffold_loan();

    bank.underwrite(&at(LENDER_ONE, START + 5), 0, UNIT).unwrap();
    let loan = bank.loan(0).unwrap();
    assert_eq!(loan.loan_amount, UNIT);
    assert_eq!(loan.lender.as_deref(), Some(LENDER_ONE));

    let err = bank
        .underwrite(&at(LENDER_TWO, START + 3_601), 0, 2 * UNIT)
        .unwrap_err();
    assert_eq!(err, LoanError::Expired);
}

#[test]
fn draw_pays_owner_exactly_once_per_bid() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 5), 0, 5 * UNIT).unwrap();

    let before = balance(&bank, OWNER);
    let drawn = bank.draw(&at(OWNER, START + 6), 0).unwrap();
    assert_eq!(drawn, 5 * UNIT);
    assert_eq!(balance(&bank, OWNER), before + 5 * UNIT);

    assert_eq!(bank.draw(&at(OWNER, START + 7), 0), Err(LoanError::MaxCapacity));
    assert_eq!(balance(&bank, OWNER), before + 5 * UNIT);
}

#[test]
fn repay_closes_the_loan_and_returns_the_asset() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 5), 0, UNIT).unwrap();
    bank.draw(&at(OWNER, START + 6), 0).unwrap();
    let lender_before = balance(&bank, LENDER_ONE);

    let now = START + 3_500;
    let required = bank.required_repayment(0, now, 0).unwrap();
    bank.repay(&at(OWNER, now), 0, required).unwrap();

    let loan = bank.loan(0).unwrap();
    assert_eq!(loan.token_owner, None);
    assert_eq!(holder(&bank).as_deref(), Some(OWNER));
    assert!(balance(&bank, LENDER_ONE) >= lender_before + UNIT);
    assert_eq!(balance(&bank, LENDER_ONE), lender_before + required);
    assert!(loan.invariants_hold());
}

#[test]
fn projections_accept_a_future_offset() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 5), 0, UNIT).unwrap();

    let now = START + 600;
    let in_two_minutes = bank.required_repayment(0, now, 120).unwrap();
    assert_eq!(in_two_minutes, bank.required_repayment(0, now + 120, 0).unwrap());
    assert!(in_two_minutes > bank.required_repayment(0, now, 0).unwrap());
    assert_eq!(
        bank.total_interest(0, now, 0).unwrap(),
        bank.interest_accrued(0, now, 0).unwrap()
    );
}

#[test]
fn historic_interest_follows_the_loan_through_two_outbids() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 100), 0, UNIT).unwrap();

    // Lender two buys out lender one.
    let t1 = START + 1_000;
    let owed_one = bank.total_interest(0, t1, 0).unwrap();
    let one_before = balance(&bank, LENDER_ONE);
    bank.underwrite(&at(LENDER_TWO, t1), 0, 3 * UNIT + owed_one).unwrap();
    assert_eq!(balance(&bank, LENDER_ONE), one_before + UNIT + owed_one);
    assert_eq!(bank.loan(0).unwrap().historic_interest, owed_one);

    // Lender one comes back and buys out lender two, inheriting both claims.
    let t2 = START + 2_000;
    let accrued_two = bank.interest_accrued(0, t2, 0).unwrap();
    let owed_two = bank.total_interest(0, t2, 0).unwrap();
    assert_eq!(owed_two, owed_one + accrued_two);
    let two_before = balance(&bank, LENDER_TWO);
    bank.underwrite(&at(LENDER_ONE, t2), 0, 4 * UNIT + owed_two).unwrap();
    assert_eq!(balance(&bank, LENDER_TWO), two_before + 3 * UNIT + owed_two);

    let loan = bank.loan(0).unwrap();
    assert_eq!(loan.historic_interest, owed_two);
    assert_eq!(loan.loan_amount, 4 * UNIT);

    // A bystander repays: the final lender recovers principal, its own
    // interest, and everything it paid out to displaced lenders.
    let t3 = START + 3_000;
    let required = bank.required_repayment(0, t3, 0).unwrap();
    assert_eq!(
        required,
        4 * UNIT + owed_two + bank.interest_accrued(0, t3, 0).unwrap()
    );
    let one_before = balance(&bank, LENDER_ONE);
    let repayment = bank.repay(&at(BYSTANDER, t3), 0, required).unwrap();
    assert_eq!(balance(&bank, LENDER_ONE), one_before + required);
    assert_eq!(repayment.released_to_owner, 4 * UNIT);
    assert_eq!(holder(&bank).as_deref(), Some(OWNER));
    assert_eq!(bank.settlement().escrow_balance(), 0);
}

#[test]
fn seize_after_expiry_goes_to_the_recorded_lender() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 5), 0, UNIT).unwrap();
    bank.draw(&at(OWNER, START + 6), 0).unwrap();

    assert_eq!(bank.seize(&at(BYSTANDER, START + 3_599), 0), Err(LoanError::NotExpired));
    bank.seize(&at(BYSTANDER, START + 3_601), 0).unwrap();

    assert_eq!(holder(&bank).as_deref(), Some(LENDER_ONE));
    assert_eq!(bank.loan(0).unwrap().token_owner, None);
    assert_eq!(bank.repay(&at(OWNER, START + 3_602), 0, 2 * UNIT), Err(LoanError::Expired));
    assert_eq!(bank.seize(&at(LENDER_ONE, START + 3_602), 0), Err(LoanError::AlreadyRepaid));
    assert_eq!(bank.draw(&at(OWNER, START + 3_602), 0), Err(LoanError::NotOwner));
}

#[test]
fn seized_loan_releases_undrawn_capital_to_the_owner() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 5), 0, 5 * UNIT).unwrap();
    let before = balance(&bank, OWNER);

    bank.seize(&at(LENDER_ONE, EXPIRY), 0).unwrap();
    assert_eq!(balance(&bank, OWNER), before + 5 * UNIT);
    assert_eq!(bank.settlement().escrow_balance(), 0);
}

#[test]
fn every_transition_emits_an_event() {
    let mut bank = scaffold_loan();
    bank.underwrite(&at(LENDER_ONE, START + 5), 0, UNIT).unwrap();
    bank.draw(&at(OWNER, START + 6), 0).unwrap();
    let required = bank.quote_repayment(0, START + 7).unwrap();
    bank.repay(&at(OWNER, START + 7), 0, required).unwrap();

    let kinds: Vec<&str> = bank
        .events_for(0)
        .map(|e| match e {
            LoanEvent::LoanCreated { .. } => "created",
            LoanEvent::LoanUnderwritten { .. } => "underwritten",
            LoanEvent::LoanDrawn { .. } => "drawn",
            LoanEvent::LoanRepaid { .. } => "repaid",
            LoanEvent::LoanCancelled { .. } => "cancelled",
            LoanEvent::LoanSeized { .. } => "seized",
        })
        .collect();
    assert_eq!(kinds, ["created", "underwritten", "drawn", "repaid"]);
}

#[test]
fn loans_are_numbered_sequentially() {
    let mut bank = scaffold_loan();
    for token_id in 1..=3 {
        let asset = pawnbank_core::AssetRef::new("chromie-squiggle", token_id);
        bank.settlement_mut().mint(asset.clone(), OWNER.into());
        let id = bank.create(&at(OWNER, START), asset, 5, UNIT, EXPIRY).unwrap();
        assert_eq!(id, token_id);
    }
    assert_eq!(bank.loan_count(), 4);
    assert_eq!(bank.loan(4), Err(LoanError::UnknownLoan(4)));
}

#[test]
fn snapshot_root_changes_with_the_book() {
    let mut bank = scaffold_loan();
    let before = bank.snapshot(START);
    assert_eq!(before.state_root, bank.snapshot(START + 1).state_root);

    bank.underwrite(&at(LENDER_ONE, START + 5), 0, UNIT).unwrap();
    let after = bank.snapshot(START + 5);
    assert_ne!(before.state_root, after.state_root);
    assert_eq!(after.event_count, 2);
}
