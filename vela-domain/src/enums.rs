//! Domain enumerations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OrderSide represents the order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl OrderSide {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order (immediate execution)
    Market,
    /// Limit order (price guaranteed)
    Limit,
    /// Stop market order
    Stop,
    /// Stop limit order
    StopLimit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Stop => write!(f, "STOP"),
            OrderType::StopLimit => write!(f, "STOP_LIMIT"),
        }
    }
}

/// Time in force for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancelled
    Gtc,
    /// Good till date (requires an expire time)
    Gtd,
    /// Good for the trading day
    Day,
    /// Immediate or cancel
    Ioc,
    /// Fill or kill
    Fok,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Gtd => write!(f, "GTD"),
            TimeInForce::Day => write!(f, "DAY"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Fok => write!(f, "FOK"),
        }
    }
}

/// Order lifecycle states
///
/// Legal movements between states are defined by the transition table in
/// [`crate::state_machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Created locally, not yet submitted
    Initialized,
    /// Failed local validation (terminal)
    Invalid,
    /// Denied by pre-trade risk (terminal)
    Denied,
    /// Submitted to the broker
    Submitted,
    /// Acknowledged by the broker
    Accepted,
    /// Rejected by the broker (terminal)
    Rejected,
    /// Working at the venue
    Working,
    /// Cancelled (terminal)
    Cancelled,
    /// Expired at the venue (terminal)
    Expired,
    /// Some quantity executed, remainder still live
    PartiallyFilled,
    /// Completely executed (terminal)
    Filled,
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderState::Initialized => write!(f, "INITIALIZED"),
            OrderState::Invalid => write!(f, "INVALID"),
            OrderState::Denied => write!(f, "DENIED"),
            OrderState::Submitted => write!(f, "SUBMITTED"),
            OrderState::Accepted => write!(f, "ACCEPTED"),
            OrderState::Rejected => write!(f, "REJECTED"),
            OrderState::Working => write!(f, "WORKING"),
            OrderState::Cancelled => write!(f, "CANCELLED"),
            OrderState::Expired => write!(f, "EXPIRED"),
            OrderState::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderState::Filled => write!(f, "FILLED"),
        }
    }
}

/// Kinds of order event, used for state machine lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventKind {
    /// Order created
    Initialized,
    /// Order failed local validation
    Invalid,
    /// Order denied by pre-trade risk
    Denied,
    /// Order sent to the broker
    Submitted,
    /// Order acknowledged by the broker
    Accepted,
    /// Order rejected by the broker
    Rejected,
    /// Order working at the venue
    Working,
    /// Order quantity/price amended
    Modified,
    /// Order cancelled
    Cancelled,
    /// Order expired
    Expired,
    /// Order partially executed
    PartiallyFilled,
    /// Order completely executed
    Filled,
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderEventKind::Initialized => write!(f, "INITIALIZED"),
            OrderEventKind::Invalid => write!(f, "INVALID"),
            OrderEventKind::Denied => write!(f, "DENIED"),
            OrderEventKind::Submitted => write!(f, "SUBMITTED"),
            OrderEventKind::Accepted => write!(f, "ACCEPTED"),
            OrderEventKind::Rejected => write!(f, "REJECTED"),
            OrderEventKind::Working => write!(f, "WORKING"),
            OrderEventKind::Modified => write!(f, "MODIFIED"),
            OrderEventKind::Cancelled => write!(f, "CANCELLED"),
            OrderEventKind::Expired => write!(f, "EXPIRED"),
            OrderEventKind::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderEventKind::Filled => write!(f, "FILLED"),
        }
    }
}

/// Net directional exposure implied by accumulated fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPosition {
    /// No exposure
    Flat,
    /// Net long
    Long,
    /// Net short
    Short,
}

impl MarketPosition {
    /// Derive the market position from a signed relative quantity
    pub fn from_relative(relative: Decimal) -> Self {
        if relative > Decimal::ZERO {
            MarketPosition::Long
        } else if relative < Decimal::ZERO {
            MarketPosition::Short
        } else {
            MarketPosition::Flat
        }
    }
}

impl fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketPosition::Flat => write!(f, "FLAT"),
            MarketPosition::Long => write!(f, "LONG"),
            MarketPosition::Short => write!(f, "SHORT"),
        }
    }
}
