//! Key schema for the backing store
//!
//! A pure module of typed key constructors. Event logs live under
//! `<kind>:<id>` stream keys; derived indices live under `index:*`. Nothing
//! here touches the store, so the schema can be unit-tested and the indices
//! rebuilt from the log keys alone.

use std::fmt;
use vela_domain::{AccountId, OrderId, PositionId, StrategyId, TraderId};

/// Prefix under which order event logs are stored
pub const ORDERS_PREFIX: &str = "orders:";
/// Prefix under which position event logs are stored
pub const POSITIONS_PREFIX: &str = "positions:";
/// Prefix under which account event logs are stored
pub const ACCOUNTS_PREFIX: &str = "accounts:";

/// An opaque, fully-qualified storage key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// Get the key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Event log keys
// -----------------------------------------------------------------------------

/// Event log key for an order
pub fn order_events(id: &OrderId) -> Key {
    Key(format!("{ORDERS_PREFIX}{id}"))
}

/// Event log key for a position
pub fn position_events(id: &PositionId) -> Key {
    Key(format!("{POSITIONS_PREFIX}{id}"))
}

/// Event log key for an account
pub fn account_events(id: &AccountId) -> Key {
    Key(format!("{ACCOUNTS_PREFIX}{id}"))
}

/// Recover the raw aggregate id from an enumerated log key
pub fn strip_prefix<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}

// -----------------------------------------------------------------------------
// Index sets
// -----------------------------------------------------------------------------

/// Set of all known trader ids
pub fn index_traders() -> Key {
    Key("index:traders".to_string())
}

/// Set of order ids owned by a trader
pub fn index_trader_orders(trader_id: &TraderId) -> Key {
    Key(format!("index:trader:{trader_id}:orders"))
}

/// Set of position ids owned by a trader
pub fn index_trader_positions(trader_id: &TraderId) -> Key {
    Key(format!("index:trader:{trader_id}:positions"))
}

/// Set of strategy ids a trader has traded
pub fn index_trader_strategies(trader_id: &TraderId) -> Key {
    Key(format!("index:trader:{trader_id}:strategies"))
}

/// Set of order ids for one (trader, strategy) pair
pub fn index_strategy_orders(trader_id: &TraderId, strategy_id: &StrategyId) -> Key {
    Key(format!("index:trader:{trader_id}:strategy:{strategy_id}:orders"))
}

/// Set of position ids for one (trader, strategy) pair
pub fn index_strategy_positions(trader_id: &TraderId, strategy_id: &StrategyId) -> Key {
    Key(format!("index:trader:{trader_id}:strategy:{strategy_id}:positions"))
}

/// Set of order ids submitted under an account
pub fn index_account_orders(account_id: &AccountId) -> Key {
    Key(format!("index:account:{account_id}:orders"))
}

/// Set of position ids held under an account
pub fn index_account_positions(account_id: &AccountId) -> Key {
    Key(format!("index:account:{account_id}:positions"))
}

/// Set of order ids a position comprises
pub fn index_position_orders(position_id: &PositionId) -> Key {
    Key(format!("index:position:{position_id}:orders"))
}

/// Set of all order ids
pub fn index_orders() -> Key {
    Key("index:orders".to_string())
}

/// Set of working order ids
pub fn index_orders_working() -> Key {
    Key("index:orders:working".to_string())
}

/// Set of completed order ids
pub fn index_orders_completed() -> Key {
    Key("index:orders:completed".to_string())
}

/// Set of all position ids
pub fn index_positions() -> Key {
    Key("index:positions".to_string())
}

/// Set of open position ids
pub fn index_positions_open() -> Key {
    Key("index:positions:open".to_string())
}

/// Set of closed position ids
pub fn index_positions_closed() -> Key {
    Key("index:positions:closed".to_string())
}

// -----------------------------------------------------------------------------
// Index hashes (1:1 maps)
// -----------------------------------------------------------------------------

/// Hash: order id -> trader id
pub fn index_order_trader() -> Key {
    Key("index:order-trader".to_string())
}

/// Hash: order id -> account id
pub fn index_order_account() -> Key {
    Key("index:order-account".to_string())
}

/// Hash: order id -> position id
pub fn index_order_position() -> Key {
    Key("index:order-position".to_string())
}

/// Hash: order id -> strategy id
pub fn index_order_strategy() -> Key {
    Key("index:order-strategy".to_string())
}

/// Hash: position id -> trader id
pub fn index_position_trader() -> Key {
    Key("index:position-trader".to_string())
}

/// Hash: position id -> account id
pub fn index_position_account() -> Key {
    Key("index:position-account".to_string())
}

/// Hash: position id -> strategy id
pub fn index_position_strategy() -> Key {
    Key("index:position-strategy".to_string())
}

/// Hash: position id -> broker position id
pub fn index_position_broker() -> Key {
    Key("index:position-broker".to_string())
}

/// Hash, per account: broker position id -> position id.
///
/// Used to correlate broker execution reports back to positions.
pub fn index_broker_positions(account_id: &AccountId) -> Key {
    Key(format!("index:account:{account_id}:broker-positions"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keys_are_prefixed_stream_keys() {
        let order_id = OrderId::new("O-001").unwrap();
        assert_eq!(order_events(&order_id).as_str(), "orders:O-001");

        let position_id = PositionId::new("P-001").unwrap();
        assert_eq!(position_events(&position_id).as_str(), "positions:P-001");

        let account_id = AccountId::new("FXCM-123456").unwrap();
        assert_eq!(account_events(&account_id).as_str(), "accounts:FXCM-123456");
    }

    #[test]
    fn test_strip_prefix_round_trips() {
        let order_id = OrderId::new("O-001").unwrap();
        let key = order_events(&order_id);
        assert_eq!(strip_prefix(key.as_str(), ORDERS_PREFIX), Some("O-001"));
        assert_eq!(strip_prefix(key.as_str(), POSITIONS_PREFIX), None);
    }

    #[test]
    fn test_scoped_index_keys() {
        let trader = TraderId::new("TESTER-000").unwrap();
        let strategy = StrategyId::new("S-001").unwrap();
        assert_eq!(
            index_strategy_orders(&trader, &strategy).as_str(),
            "index:trader:TESTER-000:strategy:S-001:orders"
        );
    }
}
