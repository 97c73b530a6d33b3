//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers in the captrack domain. These
//! prevent accidental identifier confusion — you cannot pass a
//! `StakeholderId` where a `SecurityId` is expected, even though both wrap
//! a `Uuid`.
//!
//! `SecurityId::new()` is also the generator used when a lot split produces
//! a remainder lot: every remainder gets a fresh random identifier, never a
//! shared placeholder.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stakeholder (the holder of record for lots).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StakeholderId(pub Uuid);

/// Unique identifier for a stock class (a category of equity instrument).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockClassId(pub Uuid);

/// Unique identifier for a security lot.
///
/// Assigned by the event producer at issuance; generated fresh by the
/// ledger for split remainders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityId(pub Uuid);

impl StakeholderId {
    /// Generate a new random stakeholder identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl StockClassId {
    /// Generate a new random stock class identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl SecurityId {
    /// Generate a new random security identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StakeholderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for StockClassId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SecurityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StakeholderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stakeholder:{}", self.0)
    }
}

impl std::fmt::Display for StockClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stock-class:{}", self.0)
    }
}

impl std::fmt::Display for SecurityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "security:{}", self.0)
    }
}
