//! # captrack-core — Foundational Types for Position Tracking
//!
//! This crate defines the primitives shared by every other crate in the
//! captrack workspace. It depends on nothing internal — it is the leaf of
//! the dependency DAG.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `StakeholderId`,
//!    `StockClassId`, `SecurityId` — distinct types over `Uuid`. You cannot
//!    pass a stakeholder identifier where a security identifier is expected.
//!
//! 2. **Validated amounts.** `Quantity` can only be constructed from a
//!    strictly positive decimal; `SharePrice` rejects negative values. A live
//!    lot with a zero or negative quantity cannot exist by construction.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with seconds
//!    precision, so lot creation times serialize deterministically.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `captrack-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod quantity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::CoreError;
pub use identity::{SecurityId, StakeholderId, StockClassId};
pub use quantity::{Quantity, SharePrice};
pub use temporal::Timestamp;
