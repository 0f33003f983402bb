//! Value objects
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Price
// =============================================================================

/// Price represents a positive decimal price
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must be positive".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Constructable internally for derived averages (weighted means of validated
// fill prices are themselves positive).
impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Quantity represents a non-negative decimal quantity
///
/// Zero is a legal value: derived totals (unfilled orders, flat positions)
/// pass through here. Fill events additionally require `is_positive()`.
///
/// # Invariants
/// - Must be >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new Quantity with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if value < 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::InvalidQuantity("Quantity must be non-negative".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Create a zero quantity
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Whether the quantity is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Whether the quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Constructable internally for derived totals (absolute values of signed
// sums over validated fill quantities).
impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

// =============================================================================
// Symbol
// =============================================================================

/// Symbol represents a tradeable instrument code (e.g., AUDUSD, BTCUSDT)
///
/// # Invariants
/// - Non-empty, at most 32 characters, no embedded whitespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a Symbol with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSymbol` if format is invalid
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        if code.is_empty() {
            return Err(DomainError::InvalidSymbol("Symbol must be non-empty".to_string()));
        }
        if code.len() > 32 {
            return Err(DomainError::InvalidSymbol(format!(
                "Symbol exceeds 32 characters: {}",
                code
            )));
        }
        if code.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidSymbol(format!(
                "Symbol contains whitespace: {:?}",
                code
            )));
        }
        Ok(Self(code))
    }

    /// Get the instrument code
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Currency represents an ISO-style currency code (e.g., USD, AUD)
///
/// # Invariants
/// - 3 to 8 ASCII alphanumeric characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Create a Currency with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCurrency` if format is invalid
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        if code.len() < 3 || code.len() > 8 {
            return Err(DomainError::InvalidCurrency(format!(
                "Currency code must be 3-8 characters: {:?}",
                code
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidCurrency(format!(
                "Currency code must be alphanumeric: {:?}",
                code
            )));
        }
        Ok(Self(code))
    }

    /// Get the currency code
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
