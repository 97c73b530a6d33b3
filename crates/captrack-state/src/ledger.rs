//! # Position Ledger — FIFO Lot Tracking
//!
//! The mutable data store behind the stock lifecycle machine: per-stakeholder
//! live lots (`Position` records keyed by security id) plus a per-stakeholder,
//! per-stock-class ordered index of security ids in issuance order. The index
//! is the FIFO consumption order for transfers.
//!
//! ## Algorithms
//!
//! - **Lot splitting** ([`PositionLedger::cancel`]): cancels part or all of a
//!   single named lot. A partial cancellation deletes the original lot and
//!   issues the remainder as a brand-new lot under a fresh [`SecurityId`].
//!
//! - **Lot consumption** ([`PositionLedger::transfer`]): walks the
//!   stakeholder's lots for one stock class in issuance order, consuming
//!   whole lots until the requested quantity is met. When the final lot
//!   overshoots, the excess is re-issued as one remainder lot under a fresh
//!   [`SecurityId`].
//!
//! ## Invariants
//!
//! - The FIFO index is compacted on every deletion: it never holds the id of
//!   a dead lot, and every indexed id maps to a live position of the same
//!   stock class.
//! - Splits conserve quantity exactly: the sum of live quantities for a
//!   stakeholder and stock class changes only by the amount cancelled or
//!   transferred out.
//! - Every operation validates completely before its first mutation. On any
//!   error the ledger is unchanged.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use captrack_core::{Quantity, SecurityId, SharePrice, StakeholderId, StockClassId, Timestamp};

// ─── Position ────────────────────────────────────────────────────────

/// One lot of an equity instrument held by one stakeholder.
///
/// A lot is created by issuance or by a split, mutated in place only by
/// acceptance, and destroyed by full cancellation or transfer consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Unique identifier of this lot. Matches the key it is stored under.
    pub security_id: SecurityId,
    /// The stock class this lot belongs to.
    pub stock_class_id: StockClassId,
    /// Units held in this lot. Strictly positive by construction.
    pub quantity: Quantity,
    /// Price attached at issuance. Carried through splits unchanged.
    pub share_price: SharePrice,
    /// When this lot record was created. A split remainder gets a fresh
    /// timestamp, not the original's.
    pub timestamp: Timestamp,
    /// False until an acceptance event targets this exact lot.
    pub accepted: bool,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by ledger operations.
///
/// Every error aborts its operation before the first mutation; the ledger
/// is left exactly as it was.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The referenced security id has no live lot for this stakeholder.
    #[error("no live position under {security_id} for {stakeholder_id}")]
    PositionNotFound {
        /// The stakeholder the lookup ran against.
        stakeholder_id: StakeholderId,
        /// The security id that has no live lot.
        security_id: SecurityId,
    },

    /// The stakeholder holds no live lots in this stock class.
    #[error("no active position in {stock_class_id} for {stakeholder_id}")]
    NoActivePosition {
        /// The stakeholder the walk ran against.
        stakeholder_id: StakeholderId,
        /// The stock class with no live lots.
        stock_class_id: StockClassId,
    },

    /// Cancellation quantity exceeds the lot's quantity.
    #[error("cannot cancel {requested} against lot {security_id} holding {available}")]
    OverCancellation {
        /// The lot the cancellation targeted.
        security_id: SecurityId,
        /// The quantity the caller asked to cancel.
        requested: Decimal,
        /// The quantity the lot actually holds.
        available: Decimal,
    },

    /// The FIFO walk cannot satisfy the requested transfer quantity.
    #[error("transfer of {requested} exceeds the {available} held in {stock_class_id}")]
    InsufficientQuantity {
        /// The stock class the transfer ran against.
        stock_class_id: StockClassId,
        /// The quantity the caller asked to transfer.
        requested: Decimal,
        /// The total quantity available across all live lots.
        available: Decimal,
    },
}

// ─── Operation Outcomes ──────────────────────────────────────────────

/// A remainder lot created by a split, reported back to the caller so
/// downstream indexing can track the replacement id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitLot {
    /// Fresh identifier of the remainder lot.
    pub security_id: SecurityId,
    /// Quantity carried by the remainder lot.
    pub quantity: Quantity,
}

/// Outcome of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelOutcome {
    /// The entire lot was cancelled and deleted.
    Full,
    /// Part of the lot was cancelled; the rest lives on under a fresh id.
    Partial {
        /// The remainder lot that replaced the original.
        remainder: SplitLot,
    },
}

/// Outcome of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Lots fully consumed by the walk, in issuance order.
    pub consumed: Vec<SecurityId>,
    /// Remainder lot issued when the final consumed lot overshot the
    /// requested quantity. `None` on exact consumption.
    pub remainder: Option<SplitLot>,
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// Point-in-time copy of both ledger maps, for persistence or inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Live lots, keyed by stakeholder then security id.
    pub active_positions: HashMap<StakeholderId, HashMap<SecurityId, Position>>,
    /// Issuance-ordered security ids, keyed by stakeholder then stock class.
    pub fifo_order: HashMap<StakeholderId, HashMap<StockClassId, Vec<SecurityId>>>,
}

/// The per-machine-instance position store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    active_positions: HashMap<StakeholderId, HashMap<SecurityId, Position>>,
    fifo_order: HashMap<StakeholderId, HashMap<StockClassId, Vec<SecurityId>>>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new live lot exactly as given and append its id to the
    /// stakeholder/stock-class FIFO index.
    ///
    /// This is the primitive behind every mutating action, including the
    /// split algorithms. It performs no duplicate-id validation; callers own
    /// identifier uniqueness.
    pub fn issue(
        &mut self,
        stakeholder_id: StakeholderId,
        stock_class_id: StockClassId,
        security_id: SecurityId,
        quantity: Quantity,
        share_price: SharePrice,
    ) {
        debug!(%stakeholder_id, %security_id, %quantity, "issuing lot");
        let position = Position {
            security_id: security_id.clone(),
            stock_class_id: stock_class_id.clone(),
            quantity,
            share_price,
            timestamp: Timestamp::now(),
            accepted: false,
        };
        self.active_positions
            .entry(stakeholder_id.clone())
            .or_default()
            .insert(security_id.clone(), position);
        self.fifo_order
            .entry(stakeholder_id)
            .or_default()
            .entry(stock_class_id)
            .or_default()
            .push(security_id);
    }

    /// Mark a live lot as accepted.
    ///
    /// # Errors
    ///
    /// [`LedgerError::PositionNotFound`] if the lot does not exist.
    pub fn accept(
        &mut self,
        stakeholder_id: &StakeholderId,
        security_id: &SecurityId,
    ) -> Result<(), LedgerError> {
        let position = self
            .active_positions
            .get_mut(stakeholder_id)
            .and_then(|lots| lots.get_mut(security_id))
            .ok_or_else(|| LedgerError::PositionNotFound {
                stakeholder_id: stakeholder_id.clone(),
                security_id: security_id.clone(),
            })?;
        position.accepted = true;
        debug!(%stakeholder_id, %security_id, "accepted lot");
        Ok(())
    }

    /// Cancel `quantity` units of one named lot (the lot splitting
    /// algorithm).
    ///
    /// Cancelling the lot's full quantity deletes it. Cancelling less
    /// deletes the original and issues the remainder as a brand-new lot
    /// under a fresh id: same stock class and share price, `accepted` reset,
    /// fresh timestamp.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::PositionNotFound`] if the lot does not exist.
    /// - [`LedgerError::OverCancellation`] if `quantity` exceeds the lot's
    ///   quantity. The ledger is unchanged.
    pub fn cancel(
        &mut self,
        stakeholder_id: &StakeholderId,
        security_id: &SecurityId,
        quantity: Quantity,
    ) -> Result<CancelOutcome, LedgerError> {
        let position = self
            .position(stakeholder_id, security_id)
            .cloned()
            .ok_or_else(|| LedgerError::PositionNotFound {
                stakeholder_id: stakeholder_id.clone(),
                security_id: security_id.clone(),
            })?;

        if quantity.value() > position.quantity.value() {
            return Err(LedgerError::OverCancellation {
                security_id: security_id.clone(),
                requested: quantity.value(),
                available: position.quantity.value(),
            });
        }

        // Over-cancellation is excluded above, so no positive remainder
        // means the quantities were equal: a full cancellation.
        let remainder_quantity = position.quantity.checked_sub(quantity);

        self.remove_lot(stakeholder_id, security_id, &position.stock_class_id);

        match remainder_quantity {
            None => {
                debug!(%stakeholder_id, %security_id, "full cancellation");
                Ok(CancelOutcome::Full)
            }
            Some(remainder_quantity) => {
                let replacement = SecurityId::new();
                debug!(
                    %stakeholder_id, %security_id,
                    remainder = %remainder_quantity, replacement = %replacement,
                    "partial cancellation"
                );
                self.issue(
                    stakeholder_id.clone(),
                    position.stock_class_id.clone(),
                    replacement.clone(),
                    remainder_quantity,
                    position.share_price,
                );
                Ok(CancelOutcome::Partial {
                    remainder: SplitLot {
                        security_id: replacement,
                        quantity: remainder_quantity,
                    },
                })
            }
        }
    }

    /// Transfer `quantity` units out of one stock class (the lot consumption
    /// algorithm).
    ///
    /// Walks the stakeholder's lots in issuance order, consuming whole lots
    /// until the requested quantity is met. Exact consumption deletes the
    /// final lot with no remainder. An overshoot deletes every walked lot
    /// and re-issues the excess as one remainder lot under a fresh id,
    /// keeping the split lot's share price.
    ///
    /// The walk is planned before any mutation, so a failure leaves the
    /// ledger untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoActivePosition`] if the stakeholder holds no live
    ///   lots in this stock class.
    /// - [`LedgerError::InsufficientQuantity`] if the lots cannot cover the
    ///   requested quantity.
    pub fn transfer(
        &mut self,
        stakeholder_id: &StakeholderId,
        stock_class_id: &StockClassId,
        quantity: Quantity,
    ) -> Result<TransferOutcome, LedgerError> {
        let order = match self
            .fifo_order
            .get(stakeholder_id)
            .and_then(|by_class| by_class.get(stock_class_id))
        {
            Some(order) if !order.is_empty() => order,
            _ => {
                return Err(LedgerError::NoActivePosition {
                    stakeholder_id: stakeholder_id.clone(),
                    stock_class_id: stock_class_id.clone(),
                })
            }
        };

        // Plan the walk without touching the ledger.
        let requested = quantity.value();
        let mut running = Decimal::ZERO;
        let mut consumed: Vec<SecurityId> = Vec::new();
        let mut split_price: Option<SharePrice> = None;
        if let Some(lots) = self.active_positions.get(stakeholder_id) {
            for security_id in order {
                let Some(position) = lots.get(security_id) else {
                    // The compact index never holds a dead id.
                    continue;
                };
                running += position.quantity.value();
                consumed.push(security_id.clone());
                split_price = Some(position.share_price);
                if running >= requested {
                    break;
                }
            }
        }

        let Some(split_price) = split_price else {
            return Err(LedgerError::NoActivePosition {
                stakeholder_id: stakeholder_id.clone(),
                stock_class_id: stock_class_id.clone(),
            });
        };
        if running < requested {
            return Err(LedgerError::InsufficientQuantity {
                stock_class_id: stock_class_id.clone(),
                requested,
                available: running,
            });
        }

        // Checks passed; apply the plan.
        for security_id in &consumed {
            self.remove_lot(stakeholder_id, security_id, stock_class_id);
        }

        // Exact consumption leaves no positive excess, so the constructor
        // failing here means no remainder lot is due.
        let remainder = match Quantity::new(running - requested) {
            Ok(remainder_quantity) => {
                let replacement = SecurityId::new();
                debug!(
                    %stakeholder_id, %stock_class_id, %requested,
                    lots = consumed.len(), remainder = %remainder_quantity,
                    "partial transfer"
                );
                self.issue(
                    stakeholder_id.clone(),
                    stock_class_id.clone(),
                    replacement.clone(),
                    remainder_quantity,
                    split_price,
                );
                Some(SplitLot {
                    security_id: replacement,
                    quantity: remainder_quantity,
                })
            }
            Err(_) => {
                debug!(
                    %stakeholder_id, %stock_class_id, %requested,
                    lots = consumed.len(),
                    "complete transfer"
                );
                None
            }
        };

        Ok(TransferOutcome {
            consumed,
            remainder,
        })
    }

    // ─── Read surface ────────────────────────────────────────────────

    /// The live lot under this security id, if any.
    pub fn position(
        &self,
        stakeholder_id: &StakeholderId,
        security_id: &SecurityId,
    ) -> Option<&Position> {
        self.active_positions
            .get(stakeholder_id)
            .and_then(|lots| lots.get(security_id))
    }

    /// All live lots held by a stakeholder, across stock classes.
    pub fn positions_for(
        &self,
        stakeholder_id: &StakeholderId,
    ) -> impl Iterator<Item = &Position> {
        self.active_positions
            .get(stakeholder_id)
            .into_iter()
            .flat_map(|lots| lots.values())
    }

    /// The issuance-ordered security ids for one stakeholder and stock
    /// class. Every returned id has a live position.
    pub fn fifo_security_ids(
        &self,
        stakeholder_id: &StakeholderId,
        stock_class_id: &StockClassId,
    ) -> &[SecurityId] {
        self.fifo_order
            .get(stakeholder_id)
            .and_then(|by_class| by_class.get(stock_class_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total quantity currently held across all live lots of one stock
    /// class.
    pub fn total_quantity(
        &self,
        stakeholder_id: &StakeholderId,
        stock_class_id: &StockClassId,
    ) -> Decimal {
        self.positions_for(stakeholder_id)
            .filter(|position| &position.stock_class_id == stock_class_id)
            .map(|position| position.quantity.value())
            .sum()
    }

    /// Point-in-time copy of both ledger maps.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            active_positions: self.active_positions.clone(),
            fifo_order: self.fifo_order.clone(),
        }
    }

    // ─── Internals ───────────────────────────────────────────────────

    /// Delete a live lot and compact its id out of the FIFO index.
    fn remove_lot(
        &mut self,
        stakeholder_id: &StakeholderId,
        security_id: &SecurityId,
        stock_class_id: &StockClassId,
    ) {
        if let Some(lots) = self.active_positions.get_mut(stakeholder_id) {
            lots.remove(security_id);
        }
        if let Some(order) = self
            .fifo_order
            .get_mut(stakeholder_id)
            .and_then(|by_class| by_class.get_mut(stock_class_id))
        {
            order.retain(|id| id != security_id);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn qty(n: u64) -> Quantity {
        Quantity::new(Decimal::from(n)).unwrap()
    }

    fn price(n: u64) -> SharePrice {
        SharePrice::new(Decimal::from(n)).unwrap()
    }

    /// A handful of lot quantities plus a transfer amount that the lots can
    /// cover.
    fn lots_and_amount() -> impl Strategy<Value = (Vec<u64>, u64)> {
        prop::collection::vec(1u64..=1_000, 1..8).prop_flat_map(|lots| {
            let total: u64 = lots.iter().sum();
            (Just(lots), 1..=total)
        })
    }

    fn build_ledger(lots: &[u64]) -> (PositionLedger, StakeholderId, StockClassId, Vec<SecurityId>) {
        let mut ledger = PositionLedger::new();
        let (s, c) = (StakeholderId::new(), StockClassId::new());
        let mut ids = Vec::new();
        for &n in lots {
            let id = SecurityId::new();
            ledger.issue(s.clone(), c.clone(), id.clone(), qty(n), price(1));
            ids.push(id);
        }
        (ledger, s, c, ids)
    }

    proptest! {
        /// A transfer removes exactly the requested quantity, never more or
        /// less.
        #[test]
        fn transfer_conserves_total((lots, amount) in lots_and_amount()) {
            let (mut ledger, s, c, _) = build_ledger(&lots);
            let total: u64 = lots.iter().sum();

            ledger.transfer(&s, &c, qty(amount)).unwrap();
            prop_assert_eq!(
                ledger.total_quantity(&s, &c),
                Decimal::from(total - amount)
            );
        }

        /// Transfer consumes a prefix of the issuance order.
        #[test]
        fn transfer_consumes_in_issue_order((lots, amount) in lots_and_amount()) {
            let (mut ledger, s, c, ids) = build_ledger(&lots);

            let outcome = ledger.transfer(&s, &c, qty(amount)).unwrap();
            prop_assert!(!outcome.consumed.is_empty());
            prop_assert_eq!(outcome.consumed.as_slice(), &ids[..outcome.consumed.len()]);
        }

        /// A partial cancellation conserves the non-cancelled quantity.
        #[test]
        fn cancel_split_conserves((held, cancelled) in (2u64..=1_000).prop_flat_map(|q| (Just(q), 1..q))) {
            let (mut ledger, s, c, ids) = build_ledger(&[held]);

            ledger.cancel(&s, &ids[0], qty(cancelled)).unwrap();
            prop_assert_eq!(
                ledger.total_quantity(&s, &c),
                Decimal::from(held - cancelled)
            );
        }

        /// A failed transfer mutates nothing.
        #[test]
        fn over_transfer_is_a_no_op(lots in prop::collection::vec(1u64..=1_000, 1..8)) {
            let (mut ledger, s, c, ids) = build_ledger(&lots);
            let total: u64 = lots.iter().sum();

            let result = ledger.transfer(&s, &c, qty(total + 1));
            prop_assert!(result.is_err());
            prop_assert_eq!(ledger.total_quantity(&s, &c), Decimal::from(total));
            prop_assert_eq!(ledger.fifo_security_ids(&s, &c), &ids[..]);
        }
    }
}
