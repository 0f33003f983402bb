//! Vela Domain Layer
//!
//! Pure domain logic with zero I/O dependencies: typed identifiers, the
//! order lifecycle state machine, and the event-sourced Order, Position and
//! Account aggregates.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod account;
pub mod aggregate;
pub mod enums;
pub mod error;
pub mod events;
pub mod identifiers;
pub mod market;
pub mod order;
pub mod position;
pub mod state_machine;
pub mod value_objects;

// Re-export commonly used types
pub use account::Account;
pub use aggregate::Aggregate;
pub use enums::{MarketPosition, OrderEventKind, OrderSide, OrderState, OrderType, TimeInForce};
pub use error::DomainError;
pub use events::{
    AccountStateEvent, OrderAccepted, OrderCancelled, OrderDenied, OrderEvent, OrderExpired,
    OrderFillEvent, OrderInitialized, OrderInvalid, OrderModified, OrderRejected, OrderSubmitted,
    OrderWorking,
};
pub use identifiers::{
    AccountId, BrokerId, BrokerOrderId, BrokerPositionId, ExecutionId, OrderId, PositionId,
    StrategyId, TraderId,
};
pub use market::QuoteTick;
pub use order::Order;
pub use position::Position;
pub use value_objects::{Currency, Price, Quantity, Symbol};
