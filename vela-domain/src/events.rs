//! Domain events
//!
//! Events are immutable, timestamped, uniquely-identified facts about one
//! aggregate. They are serialized for persistence and replayed to
//! reconstruct state; an aggregate's state is always a fold over its ordered
//! event sequence.

use crate::enums::{OrderEventKind, OrderSide, OrderType, TimeInForce};
use crate::identifiers::{
    AccountId, BrokerId, BrokerOrderId, BrokerPositionId, ExecutionId, OrderId,
};
use crate::value_objects::{Currency, Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order created locally. Always the first event in an order's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInitialized {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Instrument to trade
    pub symbol: Symbol,
    /// Order direction
    pub side: OrderSide,
    /// Order type
    pub order_type: OrderType,
    /// Requested quantity
    pub quantity: Quantity,
    /// Requested price (None for market orders)
    pub price: Option<Price>,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Expire time; present iff `time_in_force == Gtd`
    pub expire_time: Option<DateTime<Utc>>,
    /// When the order was created
    pub timestamp: DateTime<Utc>,
}

/// Order failed local validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInvalid {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Why the order was invalidated
    pub reason: String,
    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,
}

/// Order denied by pre-trade risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDenied {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Why the order was denied
    pub reason: String,
    /// When the denial occurred
    pub timestamp: DateTime<Utc>,
}

/// Order sent to the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Account the order was submitted under
    pub account_id: AccountId,
    /// When the submission occurred
    pub timestamp: DateTime<Utc>,
}

/// Order acknowledged by the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAccepted {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Broker-assigned order identifier
    pub broker_order_id: BrokerOrderId,
    /// When the acknowledgement occurred
    pub timestamp: DateTime<Utc>,
}

/// Order rejected by the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejected {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Broker-supplied rejection reason
    pub reason: String,
    /// When the rejection occurred
    pub timestamp: DateTime<Utc>,
}

/// Order working at the venue
///
/// Echoes the order's immutable fields so the aggregate can verify the
/// broker is working the order that was actually placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWorking {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Broker-assigned order identifier
    pub broker_order_id: BrokerOrderId,
    /// Instrument as working at the venue
    pub symbol: Symbol,
    /// Direction as working at the venue
    pub side: OrderSide,
    /// Order type as working at the venue
    pub order_type: OrderType,
    /// Quantity as working at the venue
    pub quantity: Quantity,
    /// Price as working at the venue
    pub price: Option<Price>,
    /// Time in force as working at the venue
    pub time_in_force: TimeInForce,
    /// Expire time as working at the venue
    pub expire_time: Option<DateTime<Utc>>,
    /// When the order went working
    pub timestamp: DateTime<Utc>,
}

/// Order quantity/price amended at the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderModified {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// Broker-assigned order identifier
    pub broker_order_id: BrokerOrderId,
    /// Quantity after the amendment
    pub modified_quantity: Quantity,
    /// Price after the amendment
    pub modified_price: Price,
    /// When the amendment occurred
    pub timestamp: DateTime<Utc>,
}

/// Order cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// When the cancellation occurred
    pub timestamp: DateTime<Utc>,
}

/// Order expired at the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExpired {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this event belongs to
    pub order_id: OrderId,
    /// When the expiry occurred
    pub timestamp: DateTime<Utc>,
}

/// Some or all of an order's quantity executed
///
/// Shared by the partial-fill and full-fill variants of [`OrderEvent`]; a
/// full fill carries `leaves_quantity == 0`. `filled_quantity` and
/// `average_price` are cumulative for the order, so the latest fill event
/// alone determines the order's filled quantity and average price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFillEvent {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Order this fill belongs to
    pub order_id: OrderId,
    /// Account the execution settled under
    pub account_id: AccountId,
    /// Unique execution identifier
    pub execution_id: ExecutionId,
    /// Broker-assigned position (ticket) identifier
    pub broker_position_id: BrokerPositionId,
    /// Instrument that traded
    pub symbol: Symbol,
    /// Direction of the execution
    pub side: OrderSide,
    /// Cumulative filled quantity for the order
    pub filled_quantity: Quantity,
    /// Quantity still unfilled (zero on a full fill)
    pub leaves_quantity: Quantity,
    /// Cumulative average fill price for the order
    pub average_price: Price,
    /// Settlement currency of the execution
    pub currency: Currency,
    /// When the execution occurred
    pub timestamp: DateTime<Utc>,
}

/// Domain events for the order lifecycle
///
/// A closed union: aggregate `apply` is a single exhaustive match, so adding
/// a variant is a compile error everywhere it is not handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    /// Order created
    Initialized(OrderInitialized),
    /// Order failed local validation
    Invalid(OrderInvalid),
    /// Order denied by pre-trade risk
    Denied(OrderDenied),
    /// Order sent to the broker
    Submitted(OrderSubmitted),
    /// Order acknowledged by the broker
    Accepted(OrderAccepted),
    /// Order rejected by the broker
    Rejected(OrderRejected),
    /// Order working at the venue
    Working(OrderWorking),
    /// Order quantity/price amended
    Modified(OrderModified),
    /// Order cancelled
    Cancelled(OrderCancelled),
    /// Order expired at the venue
    Expired(OrderExpired),
    /// Order partially executed
    PartiallyFilled(OrderFillEvent),
    /// Order completely executed
    Filled(OrderFillEvent),
}

impl OrderEvent {
    /// Get the event kind, for state machine lookup
    pub fn kind(&self) -> OrderEventKind {
        match self {
            OrderEvent::Initialized(_) => OrderEventKind::Initialized,
            OrderEvent::Invalid(_) => OrderEventKind::Invalid,
            OrderEvent::Denied(_) => OrderEventKind::Denied,
            OrderEvent::Submitted(_) => OrderEventKind::Submitted,
            OrderEvent::Accepted(_) => OrderEventKind::Accepted,
            OrderEvent::Rejected(_) => OrderEventKind::Rejected,
            OrderEvent::Working(_) => OrderEventKind::Working,
            OrderEvent::Modified(_) => OrderEventKind::Modified,
            OrderEvent::Cancelled(_) => OrderEventKind::Cancelled,
            OrderEvent::Expired(_) => OrderEventKind::Expired,
            OrderEvent::PartiallyFilled(_) => OrderEventKind::PartiallyFilled,
            OrderEvent::Filled(_) => OrderEventKind::Filled,
        }
    }

    /// Get the order ID from any event
    pub fn order_id(&self) -> &OrderId {
        match self {
            OrderEvent::Initialized(e) => &e.order_id,
            OrderEvent::Invalid(e) => &e.order_id,
            OrderEvent::Denied(e) => &e.order_id,
            OrderEvent::Submitted(e) => &e.order_id,
            OrderEvent::Accepted(e) => &e.order_id,
            OrderEvent::Rejected(e) => &e.order_id,
            OrderEvent::Working(e) => &e.order_id,
            OrderEvent::Modified(e) => &e.order_id,
            OrderEvent::Cancelled(e) => &e.order_id,
            OrderEvent::Expired(e) => &e.order_id,
            OrderEvent::PartiallyFilled(e) => &e.order_id,
            OrderEvent::Filled(e) => &e.order_id,
        }
    }

    /// Get the unique event identifier from any event
    pub fn event_id(&self) -> Uuid {
        match self {
            OrderEvent::Initialized(e) => e.event_id,
            OrderEvent::Invalid(e) => e.event_id,
            OrderEvent::Denied(e) => e.event_id,
            OrderEvent::Submitted(e) => e.event_id,
            OrderEvent::Accepted(e) => e.event_id,
            OrderEvent::Rejected(e) => e.event_id,
            OrderEvent::Working(e) => e.event_id,
            OrderEvent::Modified(e) => e.event_id,
            OrderEvent::Cancelled(e) => e.event_id,
            OrderEvent::Expired(e) => e.event_id,
            OrderEvent::PartiallyFilled(e) => e.event_id,
            OrderEvent::Filled(e) => e.event_id,
        }
    }

    /// Get the timestamp from any event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Initialized(e) => e.timestamp,
            OrderEvent::Invalid(e) => e.timestamp,
            OrderEvent::Denied(e) => e.timestamp,
            OrderEvent::Submitted(e) => e.timestamp,
            OrderEvent::Accepted(e) => e.timestamp,
            OrderEvent::Rejected(e) => e.timestamp,
            OrderEvent::Working(e) => e.timestamp,
            OrderEvent::Modified(e) => e.timestamp,
            OrderEvent::Cancelled(e) => e.timestamp,
            OrderEvent::Expired(e) => e.timestamp,
            OrderEvent::PartiallyFilled(e) => e.timestamp,
            OrderEvent::Filled(e) => e.timestamp,
        }
    }

    /// Get the fill payload, if this event is a fill
    pub fn as_fill(&self) -> Option<&OrderFillEvent> {
        match self {
            OrderEvent::PartiallyFilled(fill) | OrderEvent::Filled(fill) => Some(fill),
            _ => None,
        }
    }
}

/// Snapshot of an account's state at the broker
///
/// Account aggregates are a fold over these; the first one creates the
/// account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStateEvent {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Account this event belongs to
    pub account_id: AccountId,
    /// Brokerage holding the account
    pub broker_id: BrokerId,
    /// Broker-side account number
    pub account_number: String,
    /// Account base currency
    pub currency: Currency,
    /// Cash balance
    pub cash_balance: Decimal,
    /// Cash balance at start of day
    pub cash_start_day: Decimal,
    /// Net cash activity for the day
    pub cash_activity_day: Decimal,
    /// Margin held against maintenance requirements
    pub margin_used_maintenance: Decimal,
    /// Margin held against liquidation requirements
    pub margin_used_liquidation: Decimal,
    /// Current margin ratio
    pub margin_ratio: Decimal,
    /// Broker-reported margin call status
    pub margin_call_status: String,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_initialized() -> OrderEvent {
        OrderEvent::Initialized(OrderInitialized {
            event_id: Uuid::new_v4(),
            order_id: OrderId::new("O-001").unwrap(),
            symbol: Symbol::new("AUDUSD").unwrap(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::new(dec!(100000)).unwrap(),
            price: None,
            time_in_force: TimeInForce::Day,
            expire_time: None,
            timestamp: Utc::now(),
        })
    }

    fn sample_fill() -> OrderEvent {
        OrderEvent::Filled(OrderFillEvent {
            event_id: Uuid::new_v4(),
            order_id: OrderId::new("O-001").unwrap(),
            account_id: AccountId::new("FXCM-123456").unwrap(),
            execution_id: ExecutionId::new("E-001").unwrap(),
            broker_position_id: BrokerPositionId::new("BP-001").unwrap(),
            symbol: Symbol::new("AUDUSD").unwrap(),
            side: OrderSide::Buy,
            filled_quantity: Quantity::new(dec!(100000)).unwrap(),
            leaves_quantity: Quantity::zero(),
            average_price: Price::new(dec!(1.1000)).unwrap(),
            currency: Currency::new("AUD").unwrap(),
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(sample_initialized().kind(), OrderEventKind::Initialized);
        assert_eq!(sample_fill().kind(), OrderEventKind::Filled);
    }

    #[test]
    fn test_event_order_id_accessor() {
        let event = sample_fill();
        assert_eq!(event.order_id().as_str(), "O-001");
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = sample_fill();
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_event_json_format() {
        let json = serde_json::to_string(&sample_initialized()).unwrap();
        assert!(json.contains("\"type\":\"initialized\""));
        assert!(json.contains("\"order_id\":\"O-001\""));
    }

    #[test]
    fn test_as_fill() {
        assert!(sample_fill().as_fill().is_some());
        assert!(sample_initialized().as_fill().is_none());
    }
}
