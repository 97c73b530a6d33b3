//! # Stock Lifecycle State Machine
//!
//! Models the lifecycle of a security position for a single stakeholder
//! within a single stock class, as it moves through issuance, acceptance,
//! cancellation, and transfer.
//!
//! ## States
//!
//! ```text
//! Unissued ──issuance──▶ Issued ──acceptance──▶ Accepted
//!     ▲                    │  ▲                  │  │
//!     │                    │  └────transfer──────┘  │
//!     │                    │       (re-issuance)────┤
//!     └───cancellation─────┴────────cancellation────┘
//! ```
//!
//! Issuance is illegal while in `Issued`: a position must be accepted
//! before another can be issued against the same machine instance.
//! Cancellation lands back at `Unissued` in one atomic step — there is no
//! observable `Cancelled` resting state.
//!
//! ## Design Decision
//!
//! The machine is an enum-tagged state with a pure legality check followed
//! by the ledger action and the transition. The legality check runs first
//! and the state only advances after the ledger action succeeds, so a
//! rejected event — illegal or failed — leaves both the state and the
//! ledger exactly as they were.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use captrack_core::{Quantity, SecurityId, SharePrice, StakeholderId, StockClassId, Timestamp};

use crate::ledger::{CancelOutcome, LedgerError, LedgerSnapshot, PositionLedger, SplitLot};

// ─── Lifecycle State ─────────────────────────────────────────────────

/// The lifecycle state of the tracked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLifecycleState {
    /// No position is outstanding; issuance is the only legal event.
    Unissued,
    /// A position has been issued and awaits acknowledgement.
    Issued,
    /// The outstanding position has been accepted by the stakeholder.
    Accepted,
}

impl StockLifecycleState {
    /// The canonical string name of this state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unissued => "UNISSUED",
            Self::Issued => "ISSUED",
            Self::Accepted => "ACCEPTED",
        }
    }
}

impl std::fmt::Display for StockLifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Events ──────────────────────────────────────────────────────────

/// A lifecycle event emitted by an external collaborator.
///
/// The event producer owns identifier generation for issuances; the
/// machine generates fresh ids only for split remainders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StockEvent {
    /// Issue a new lot to the stakeholder.
    StockIssuance {
        /// The holder of record.
        stakeholder_id: StakeholderId,
        /// The stock class the lot belongs to.
        stock_class_id: StockClassId,
        /// Producer-assigned identifier for the new lot.
        security_id: SecurityId,
        /// Units issued.
        quantity: Quantity,
        /// Price attached at issuance.
        share_price: SharePrice,
    },
    /// Acknowledge the outstanding lot.
    StockAcceptance {
        /// The holder of record.
        stakeholder_id: StakeholderId,
        /// The lot being accepted.
        security_id: SecurityId,
    },
    /// Cancel part or all of one named lot.
    StockCancellation {
        /// The holder of record.
        stakeholder_id: StakeholderId,
        /// The lot being cancelled.
        security_id: SecurityId,
        /// Units to cancel.
        quantity: Quantity,
    },
    /// Transfer units out of one stock class, consuming lots FIFO.
    StockTransfer {
        /// The holder of record.
        stakeholder_id: StakeholderId,
        /// The stock class to consume from.
        stock_class_id: StockClassId,
        /// Units to transfer out.
        quantity: Quantity,
    },
}

impl StockEvent {
    /// The canonical name of this event kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StockIssuance { .. } => "STOCK_ISSUANCE",
            Self::StockAcceptance { .. } => "STOCK_ACCEPTANCE",
            Self::StockCancellation { .. } => "STOCK_CANCELLATION",
            Self::StockTransfer { .. } => "STOCK_TRANSFER",
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised when applying an event to the machine.
#[derive(Error, Debug)]
pub enum StockError {
    /// The event is not legal in the current state. Neither the state nor
    /// the ledger changed; retrying the same event will fail again.
    #[error("event {event} is not legal in state {state}")]
    IllegalTransition {
        /// The state the machine was in.
        state: StockLifecycleState,
        /// The rejected event kind.
        event: String,
    },

    /// The ledger action failed. The state did not advance.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ─── Outcomes and Records ────────────────────────────────────────────

/// The effect of a successfully applied event.
///
/// Split remainders surface their fresh ids here so downstream indexing
/// can track the replacement lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// A new lot was issued.
    Issued {
        /// The lot that was created.
        security_id: SecurityId,
    },
    /// A lot was accepted.
    Accepted {
        /// The lot that was accepted.
        security_id: SecurityId,
    },
    /// A lot was cancelled, possibly leaving a remainder.
    Cancelled {
        /// The remainder lot from a partial cancellation.
        remainder: Option<SplitLot>,
    },
    /// Units were transferred out, possibly leaving a remainder.
    Transferred {
        /// Lots fully consumed, in issuance order.
        consumed: Vec<SecurityId>,
        /// The remainder lot from a partial consumption of the final lot.
        remainder: Option<SplitLot>,
    },
}

/// Record of one applied event and the state change it caused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the event.
    pub from_state: StockLifecycleState,
    /// State after the event.
    pub to_state: StockLifecycleState,
    /// The event kind that was applied.
    pub event: String,
    /// When the transition occurred.
    pub timestamp: Timestamp,
}

/// Serializable view of the machine: the state label plus both ledger maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Current lifecycle state.
    pub state: StockLifecycleState,
    /// Point-in-time copy of the ledger.
    pub ledger: LedgerSnapshot,
}

// ─── Machine ─────────────────────────────────────────────────────────

/// The stock lifecycle machine: an enum-tagged state, the position ledger
/// it governs, and an ordered log of applied transitions.
///
/// One machine instance owns its ledger exclusively. Events are processed
/// to completion synchronously; callers serialize events per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMachine {
    state: StockLifecycleState,
    ledger: PositionLedger,
    transitions: Vec<TransitionRecord>,
}

impl StockMachine {
    /// Create a machine in `Unissued` with an empty ledger.
    pub fn new() -> Self {
        Self {
            state: StockLifecycleState::Unissued,
            ledger: PositionLedger::new(),
            transitions: Vec::new(),
        }
    }

    /// Apply one lifecycle event.
    ///
    /// The legality of the event in the current state is checked first;
    /// an illegal event runs no ledger action. The state advances only
    /// after the ledger action succeeds, so any failure leaves the machine
    /// in its pre-event state.
    ///
    /// # Errors
    ///
    /// - [`StockError::IllegalTransition`] if the event is not legal in the
    ///   current state.
    /// - [`StockError::Ledger`] if the ledger action fails.
    pub fn apply(&mut self, event: StockEvent) -> Result<EventOutcome, StockError> {
        let to_state = self.next_state(&event)?;

        let outcome = match &event {
            StockEvent::StockIssuance {
                stakeholder_id,
                stock_class_id,
                security_id,
                quantity,
                share_price,
            } => {
                self.ledger.issue(
                    stakeholder_id.clone(),
                    stock_class_id.clone(),
                    security_id.clone(),
                    *quantity,
                    *share_price,
                );
                EventOutcome::Issued {
                    security_id: security_id.clone(),
                }
            }
            StockEvent::StockAcceptance {
                stakeholder_id,
                security_id,
            } => {
                self.ledger.accept(stakeholder_id, security_id)?;
                EventOutcome::Accepted {
                    security_id: security_id.clone(),
                }
            }
            StockEvent::StockCancellation {
                stakeholder_id,
                security_id,
                quantity,
            } => {
                let outcome = self.ledger.cancel(stakeholder_id, security_id, *quantity)?;
                EventOutcome::Cancelled {
                    remainder: match outcome {
                        CancelOutcome::Full => None,
                        CancelOutcome::Partial { remainder } => Some(remainder),
                    },
                }
            }
            StockEvent::StockTransfer {
                stakeholder_id,
                stock_class_id,
                quantity,
            } => {
                let outcome = self
                    .ledger
                    .transfer(stakeholder_id, stock_class_id, *quantity)?;
                EventOutcome::Transferred {
                    consumed: outcome.consumed,
                    remainder: outcome.remainder,
                }
            }
        };

        self.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state,
            event: event.name().to_string(),
            timestamp: Timestamp::now(),
        });
        self.state = to_state;
        Ok(outcome)
    }

    /// The state this event would move the machine to, or an error if the
    /// event is not legal in the current state.
    fn next_state(&self, event: &StockEvent) -> Result<StockLifecycleState, StockError> {
        use StockLifecycleState::{Accepted, Issued, Unissued};

        let to_state = match (self.state, event) {
            (Unissued, StockEvent::StockIssuance { .. }) => Issued,
            (Issued, StockEvent::StockAcceptance { .. }) => Accepted,
            // Cancellation lands back at UNISSUED in a single step; the
            // reference model's CANCELLED state is a pure pass-through.
            (Issued, StockEvent::StockCancellation { .. }) => Unissued,
            (Accepted, StockEvent::StockIssuance { .. }) => Issued,
            (Accepted, StockEvent::StockTransfer { .. }) => Issued,
            (Accepted, StockEvent::StockCancellation { .. }) => Unissued,
            _ => {
                return Err(StockError::IllegalTransition {
                    state: self.state,
                    event: event.name().to_string(),
                })
            }
        };
        Ok(to_state)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StockLifecycleState {
        self.state
    }

    /// Read access to the governed ledger.
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Ordered log of all applied transitions.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Serializable view of the state label and both ledger maps.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            state: self.state,
            ledger: self.ledger.snapshot(),
        }
    }
}

impl Default for StockMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
