//! # End-to-End Lifecycle Scenarios
//!
//! Drives full issue/accept/cancel/transfer sequences through
//! `StockMachine::apply` and checks the resulting state label and ledger
//! totals after every step.

use rust_decimal::Decimal;

use captrack_core::{Quantity, SecurityId, SharePrice, StakeholderId, StockClassId};
use captrack_state::{
    EventOutcome, LedgerError, SplitLot, StockError, StockEvent, StockLifecycleState, StockMachine,
};

fn qty(n: u64) -> Quantity {
    Quantity::new(Decimal::from(n)).unwrap()
}

fn issuance(s: &StakeholderId, c: &StockClassId, id: &SecurityId, n: u64) -> StockEvent {
    StockEvent::StockIssuance {
        stakeholder_id: s.clone(),
        stock_class_id: c.clone(),
        security_id: id.clone(),
        quantity: qty(n),
        share_price: SharePrice::new(Decimal::new(125, 2)).unwrap(),
    }
}

fn acceptance(s: &StakeholderId, id: &SecurityId) -> StockEvent {
    StockEvent::StockAcceptance {
        stakeholder_id: s.clone(),
        security_id: id.clone(),
    }
}

fn cancellation(s: &StakeholderId, id: &SecurityId, n: u64) -> StockEvent {
    StockEvent::StockCancellation {
        stakeholder_id: s.clone(),
        security_id: id.clone(),
        quantity: qty(n),
    }
}

fn transfer(s: &StakeholderId, c: &StockClassId, n: u64) -> StockEvent {
    StockEvent::StockTransfer {
        stakeholder_id: s.clone(),
        stock_class_id: c.clone(),
        quantity: qty(n),
    }
}

/// Pull the remainder lot out of a transfer outcome.
fn transfer_remainder(outcome: EventOutcome) -> Option<SplitLot> {
    match outcome {
        EventOutcome::Transferred { remainder, .. } => remainder,
        other => panic!("expected a transfer outcome, got {other:?}"),
    }
}

#[test]
fn scenario_issue_accept_transfer_then_exact_drain() {
    let mut machine = StockMachine::new();
    let (s, c, lot_a) = (StakeholderId::new(), StockClassId::new(), SecurityId::new());

    // Issue lot A (qty 100): one live lot, state ISSUED.
    machine.apply(issuance(&s, &c, &lot_a, 100)).unwrap();
    assert_eq!(machine.state(), StockLifecycleState::Issued);
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(100));

    // Accept A: state ACCEPTED.
    machine.apply(acceptance(&s, &lot_a)).unwrap();
    assert_eq!(machine.state(), StockLifecycleState::Accepted);

    // Transfer 40: A is deleted, a fresh 60-lot replaces it, state ISSUED.
    let remainder = transfer_remainder(machine.apply(transfer(&s, &c, 40)).unwrap())
        .expect("overshoot must leave a remainder");
    assert_ne!(remainder.security_id, lot_a);
    assert_eq!(remainder.quantity, qty(60));
    assert_eq!(machine.state(), StockLifecycleState::Issued);
    assert!(machine.ledger().position(&s, &lot_a).is_none());
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(60));

    // Accept the remainder, then transfer exactly 60: full consumption,
    // no remainder lot, zero live lots.
    machine.apply(acceptance(&s, &remainder.security_id)).unwrap();
    let outcome = machine.apply(transfer(&s, &c, 60)).unwrap();
    assert!(transfer_remainder(outcome).is_none());
    assert_eq!(machine.state(), StockLifecycleState::Issued);
    assert_eq!(machine.ledger().positions_for(&s).count(), 0);
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::ZERO);
}

#[test]
fn scenario_partial_cancellation_resets_then_reissues() {
    let mut machine = StockMachine::new();
    let (s, c, lot_b) = (StakeholderId::new(), StockClassId::new(), SecurityId::new());

    machine.apply(issuance(&s, &c, &lot_b, 50)).unwrap();
    machine.apply(acceptance(&s, &lot_b)).unwrap();

    // Cancel 20 of 50: a 30-unit remainder lot appears and the machine is
    // back at UNISSUED with no intermediate resting state.
    let outcome = machine.apply(cancellation(&s, &lot_b, 20)).unwrap();
    let EventOutcome::Cancelled { remainder: Some(remainder) } = outcome else {
        panic!("expected a partial cancellation remainder");
    };
    assert_eq!(remainder.quantity, qty(30));
    assert_eq!(machine.state(), StockLifecycleState::Unissued);
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(30));

    // The next issuance moves to ISSUED again.
    machine.apply(issuance(&s, &c, &SecurityId::new(), 10)).unwrap();
    assert_eq!(machine.state(), StockLifecycleState::Issued);
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(40));
}

#[test]
fn scenario_over_cancellation_changes_nothing() {
    let mut machine = StockMachine::new();
    let (s, c, id) = (StakeholderId::new(), StockClassId::new(), SecurityId::new());
    machine.apply(issuance(&s, &c, &id, 50)).unwrap();

    let result = machine.apply(cancellation(&s, &id, 999));
    assert!(matches!(
        result,
        Err(StockError::Ledger(LedgerError::OverCancellation { .. }))
    ));
    assert_eq!(machine.state(), StockLifecycleState::Issued);
    assert_eq!(machine.ledger().position(&s, &id).unwrap().quantity, qty(50));
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(50));
}

#[test]
fn scenario_acceptance_of_unknown_lot_fails_cleanly() {
    let mut machine = StockMachine::new();
    let (s, c, id) = (StakeholderId::new(), StockClassId::new(), SecurityId::new());
    machine.apply(issuance(&s, &c, &id, 50)).unwrap();

    let result = machine.apply(acceptance(&s, &SecurityId::new()));
    assert!(matches!(
        result,
        Err(StockError::Ledger(LedgerError::PositionNotFound { .. }))
    ));
    assert_eq!(machine.state(), StockLifecycleState::Issued);
}

#[test]
fn scenario_quantity_is_conserved_across_mixed_splits() {
    let mut machine = StockMachine::new();
    let (s, c) = (StakeholderId::new(), StockClassId::new());

    // Build three lots through the accept-then-reissue gate.
    let mut issued_total = 0u64;
    let mut lots = Vec::new();
    for units in [120u64, 80, 40] {
        let id = SecurityId::new();
        machine.apply(issuance(&s, &c, &id, units)).unwrap();
        machine.apply(acceptance(&s, &id)).unwrap();
        issued_total += units;
        lots.push(id);
    }
    let last_lot = lots[2].clone();
    assert_eq!(
        machine.ledger().total_quantity(&s, &c),
        Decimal::from(issued_total)
    );

    // Transfer 150 out: 120 + 80 overshoots, remainder 50 re-issued.
    let remainder = transfer_remainder(machine.apply(transfer(&s, &c, 150)).unwrap())
        .expect("overshoot must leave a remainder");
    assert_eq!(remainder.quantity, qty(50));
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(90));

    // Cancel 15 of the untouched 40-lot: total drops to 75.
    machine.apply(acceptance(&s, &remainder.security_id)).unwrap();
    let outcome = machine.apply(cancellation(&s, &last_lot, 15)).unwrap();
    assert!(matches!(
        outcome,
        EventOutcome::Cancelled { remainder: Some(_) }
    ));
    assert_eq!(machine.state(), StockLifecycleState::Unissued);
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(75));
}

#[test]
fn scenario_fifo_order_survives_repeated_partial_transfers() {
    let mut machine = StockMachine::new();
    let (s, c) = (StakeholderId::new(), StockClassId::new());

    let first = SecurityId::new();
    machine.apply(issuance(&s, &c, &first, 30)).unwrap();
    machine.apply(acceptance(&s, &first)).unwrap();
    let second = SecurityId::new();
    machine.apply(issuance(&s, &c, &second, 70)).unwrap();
    machine.apply(acceptance(&s, &second)).unwrap();

    // 10 out of the first lot: first is consumed, its 20-unit remainder
    // moves to the back of the FIFO order.
    let outcome = machine.apply(transfer(&s, &c, 10)).unwrap();
    let EventOutcome::Transferred { consumed, remainder } = outcome else {
        panic!("expected a transfer outcome");
    };
    assert_eq!(consumed, vec![first]);
    let remainder = remainder.unwrap();
    assert_eq!(remainder.quantity, qty(20));
    assert_eq!(
        machine.ledger().fifo_security_ids(&s, &c),
        &[second.clone(), remainder.security_id.clone()]
    );

    // The next transfer therefore consumes the second (now earliest) lot.
    machine.apply(acceptance(&s, &remainder.security_id)).unwrap();
    let outcome = machine.apply(transfer(&s, &c, 70)).unwrap();
    let EventOutcome::Transferred { consumed, remainder } = outcome else {
        panic!("expected a transfer outcome");
    };
    assert_eq!(consumed, vec![second]);
    assert!(remainder.is_none());
    assert_eq!(machine.ledger().total_quantity(&s, &c), Decimal::from(20));
}
