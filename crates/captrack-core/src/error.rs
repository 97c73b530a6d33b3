//! # Error Types
//!
//! Validation errors for the foundational newtypes. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations and
//! carry the rejected value so callers can report it without re-deriving
//! context.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the validated constructors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A share quantity must be strictly positive.
    #[error("quantity must be strictly positive, got {0}")]
    InvalidQuantity(Decimal),

    /// A share price must not be negative.
    #[error("share price must not be negative, got {0}")]
    InvalidPrice(Decimal),

    /// A timestamp string failed validation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
