//! # Validated Amount Newtypes
//!
//! `Quantity` and `SharePrice` wrap `rust_decimal::Decimal` with validated
//! constructors. The ledger's core invariant — a live lot never holds a zero
//! or negative quantity — is enforced here, at construction, rather than
//! checked at every use site.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A strictly positive count of units in a lot.
///
/// Construction rejects zero and negative values, so any `Quantity` held by
/// a live position is known positive without further checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a quantity, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, CoreError> {
        if value <= Decimal::ZERO {
            return Err(CoreError::InvalidQuantity(value));
        }
        Ok(Self(value))
    }

    /// The inner decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Subtract another quantity, returning `None` when the result would
    /// not be a legal (strictly positive) quantity.
    ///
    /// A `None` from equal operands is how the split algorithms detect
    /// full consumption: no positive remainder means no remainder lot.
    pub fn checked_sub(&self, other: Quantity) -> Option<Quantity> {
        let diff = self.0 - other.0;
        if diff > Decimal::ZERO {
            Some(Self(diff))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The price attached to a lot at issuance.
///
/// Carried through splits unchanged. Zero is legal (e.g. founder grants);
/// negative values are rejected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SharePrice(Decimal);

impl SharePrice {
    /// Create a share price, rejecting negative values.
    pub fn new(value: Decimal) -> Result<Self, CoreError> {
        if value < Decimal::ZERO {
            return Err(CoreError::InvalidPrice(value));
        }
        Ok(Self(value))
    }

    /// The inner decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for SharePrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
