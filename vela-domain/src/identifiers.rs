//! Typed identifiers
//!
//! One newtype per identifier class. All identifiers share the same
//! validation: non-empty, at most 100 characters, no embedded whitespace.
//! Equality, hashing and ordering follow the canonical string value, so
//! parsing a canonical string round-trips to an equal identifier.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_IDENTIFIER_LEN: usize = 100;

fn validate(kind: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::InvalidIdentifier(format!("{kind} must be non-empty")));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(DomainError::InvalidIdentifier(format!(
            "{kind} exceeds {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidIdentifier(format!(
            "{kind} contains whitespace: {value:?}"
        )));
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier with validation
            ///
            /// # Errors
            /// Returns `DomainError::InvalidIdentifier` if validation fails
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                validate(stringify!($name), &value)?;
                Ok(Self(value))
            }

            /// Get the canonical string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

identifier!(
    /// Identifier for a trader
    TraderId
);
identifier!(
    /// Identifier for a trading strategy
    StrategyId
);
identifier!(
    /// Identifier for a brokerage account
    AccountId
);
identifier!(
    /// Client-assigned identifier for an order
    OrderId
);
identifier!(
    /// Identifier for a position
    PositionId
);
identifier!(
    /// Identifier for a single execution (fill)
    ExecutionId
);
identifier!(
    /// Identifier for a brokerage
    BrokerId
);
identifier!(
    /// Broker-assigned identifier for an order
    BrokerOrderId
);
identifier!(
    /// Broker-assigned identifier for a position (ticket)
    BrokerPositionId
);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(OrderId::new("O-19700101-000000-001-001-1").is_ok());
        assert!(OrderId::new("").is_err());
        assert!(OrderId::new("O 123").is_err());
        assert!(OrderId::new("O\t123").is_err());
        assert!(OrderId::new("x".repeat(100)).is_ok());
        assert!(OrderId::new("x".repeat(101)).is_err());
    }

    #[test]
    fn test_identifier_equality_by_value() {
        let a = TraderId::new("TESTER-000").unwrap();
        let b = TraderId::new("TESTER-000").unwrap();
        let c = TraderId::new("TESTER-001").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_identifier_round_trip() {
        let id = PositionId::new("P-123456").unwrap();
        let parsed: PositionId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_identifier_ordering() {
        let a = ExecutionId::new("E-001").unwrap();
        let b = ExecutionId::new("E-002").unwrap();
        assert!(a < b);
    }
}
