//! # captrack-state — Security Position Lifecycle
//!
//! Tracks the lifecycle of an equity instrument's holdings for a single
//! stakeholder within a single stock class: issuance, acceptance,
//! cancellation, and transfer.
//!
//! Two tightly coupled layers:
//!
//! - **Stock machine** (`stock.rs`): an enum-tagged finite-state machine
//!   (`Unissued → Issued → Accepted`) that decides which lifecycle events
//!   are legal in which state and dispatches them to the ledger. A rejected
//!   event changes nothing.
//!
//! - **Position ledger** (`ledger.rs`): the mutable lot store — live
//!   `Position` records plus a per-stock-class FIFO index in issuance
//!   order — with the lot splitting (cancellation) and lot consumption
//!   (transfer) algorithms.
//!
//! ## Guarantees
//!
//! - Quantity is conserved exactly through every split.
//! - Transfers consume the earliest-issued lots first.
//! - Every split remainder gets a fresh [`captrack_core::SecurityId`],
//!   surfaced in the operation outcome.
//! - Every event either completes or fails with no partial writes.
//!
//! One machine instance owns its ledger exclusively; callers serialize
//! events per instance. All operations are synchronous, pure data
//! transformations.

pub mod ledger;
pub mod stock;

// ─── Ledger re-exports ──────────────────────────────────────────────

pub use ledger::{
    CancelOutcome, LedgerError, LedgerSnapshot, Position, PositionLedger, SplitLot,
    TransferOutcome,
};

// ─── Machine re-exports ─────────────────────────────────────────────

pub use stock::{
    EventOutcome, MachineSnapshot, StockError, StockEvent, StockLifecycleState, StockMachine,
    TransitionRecord,
};
