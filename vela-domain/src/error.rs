//! Domain error taxonomy
//!
//! Validation errors are rejected at construction time and never enter an
//! event log. `DataIntegrity` is reserved for conditions that indicate a
//! corrupt event stream rather than a caller mistake.

use crate::enums::{OrderEventKind, OrderState};
use crate::value_objects::Symbol;

/// Errors produced by domain validation and aggregate event application
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Identifier failed format validation
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Price must be positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be non-negative
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Symbol must be a valid instrument code
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Currency must be a valid ISO-style code
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Expire time is only legal on GTD orders and must not precede creation
    #[error("Invalid expire time: {0}")]
    InvalidExpireTime(String),

    /// Attempted event is not legal for the order's current state.
    ///
    /// The aggregate is left unchanged; retrying the same event without a
    /// state change will fail again.
    #[error("Invalid state transition: {current} -> {attempted}")]
    InvalidStateTransition {
        /// State the order was in when the event arrived
        current: OrderState,
        /// Kind of the rejected event
        attempted: OrderEventKind,
    },

    /// A tick was offered to a position for a different instrument
    #[error("Symbol mismatch: expected {expected}, got {actual}")]
    SymbolMismatch {
        /// The aggregate's instrument
        expected: Symbol,
        /// The instrument on the offered data
        actual: Symbol,
    },

    /// The event stream contradicts itself (wrong aggregate id, mutated
    /// immutable fields, duplicate execution id). Not recoverable by retry.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}
