//! Order aggregate
//!
//! Replays [`OrderEvent`]s through the lifecycle state machine and keeps the
//! derived fill metrics (filled quantity, average price, slippage) in step.
//! All validation happens before the first field write, so a rejected event
//! leaves the aggregate untouched.

use crate::aggregate::Aggregate;
use crate::enums::{OrderSide, OrderState, OrderType, TimeInForce};
use crate::error::DomainError;
use crate::events::{OrderEvent, OrderFillEvent, OrderInitialized};
use crate::identifiers::{AccountId, BrokerOrderId, BrokerPositionId, ExecutionId, OrderId};
use crate::state_machine::transition;
use crate::value_objects::{Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// An order's lifecycle as a fold over its event sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Client-assigned order identifier
    pub id: OrderId,
    /// Instrument to trade
    pub symbol: Symbol,
    /// Order direction
    pub side: OrderSide,
    /// Order type
    pub order_type: OrderType,
    /// Requested quantity
    pub quantity: Quantity,
    /// Cumulative filled quantity, taken from the latest fill event
    pub filled_quantity: Quantity,
    /// Requested price (None for market orders)
    pub price: Option<Price>,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Expire time; present iff `time_in_force == Gtd`
    pub expire_time: Option<DateTime<Utc>>,
    /// Current lifecycle state
    pub state: OrderState,
    /// Broker-assigned order identifier, once known
    pub broker_order_id: Option<BrokerOrderId>,
    /// Account the order was submitted under, once known
    pub account_id: Option<AccountId>,
    /// Broker position (ticket) the order's fills settled into, once known
    pub broker_position_id: Option<BrokerPositionId>,
    /// Execution ids in arrival order; each is unique within the order
    pub execution_ids: Vec<ExecutionId>,
    /// Average fill price, taken from the latest fill event
    pub average_price: Option<Price>,
    /// Requested price minus realized average, signed so that worse is
    /// positive (zero while either price is absent)
    pub slippage: Decimal,
    /// Whether the order is working at the venue
    pub is_working: bool,
    /// Whether the order has reached a terminal state
    pub is_completed: bool,
    events: Vec<OrderEvent>,
}

impl Order {
    /// Create an order from its initialization event
    ///
    /// # Errors
    /// Returns `DomainError::InvalidExpireTime` if the expire-time invariant
    /// is violated: `expire_time` must be present iff the time in force is
    /// GTD, and must not precede the creation timestamp.
    pub fn new(init: &OrderInitialized) -> Result<Self, DomainError> {
        match (init.time_in_force, init.expire_time) {
            (TimeInForce::Gtd, None) => {
                return Err(DomainError::InvalidExpireTime(
                    "GTD order requires an expire time".to_string(),
                ));
            },
            (TimeInForce::Gtd, Some(expire)) if expire < init.timestamp => {
                return Err(DomainError::InvalidExpireTime(format!(
                    "Expire time {} precedes order creation {}",
                    expire, init.timestamp
                )));
            },
            (tif, Some(_)) if tif != TimeInForce::Gtd => {
                return Err(DomainError::InvalidExpireTime(format!(
                    "Expire time is only legal with GTD time in force, got {}",
                    tif
                )));
            },
            _ => {},
        }

        Ok(Self {
            id: init.order_id.clone(),
            symbol: init.symbol.clone(),
            side: init.side,
            order_type: init.order_type,
            quantity: init.quantity,
            filled_quantity: Quantity::zero(),
            price: init.price,
            time_in_force: init.time_in_force,
            expire_time: init.expire_time,
            state: OrderState::Initialized,
            broker_order_id: None,
            account_id: None,
            broker_position_id: None,
            execution_ids: Vec::new(),
            average_price: None,
            slippage: Decimal::ZERO,
            is_working: false,
            is_completed: false,
            events: vec![OrderEvent::Initialized(init.clone())],
        })
    }

    /// Apply a lifecycle event
    ///
    /// The state machine runs on the event's kind first; field mutation
    /// happens only after every check passes, so the aggregate is unchanged
    /// on any error.
    ///
    /// # Errors
    /// - `InvalidStateTransition` if the event is not legal for the current
    ///   state
    /// - `DataIntegrity` if the event belongs to a different order, a
    ///   Working event contradicts the order's immutable fields, or a fill
    ///   repeats an execution id (not recoverable by retry)
    pub fn apply(&mut self, event: OrderEvent) -> Result<(), DomainError> {
        if event.order_id() != &self.id {
            return Err(DomainError::DataIntegrity(format!(
                "Event for order {} applied to order {}",
                event.order_id(),
                self.id
            )));
        }

        let next = transition(self.state, event.kind())?;

        match &event {
            OrderEvent::Working(working) => self.check_working_unchanged(working)?,
            OrderEvent::PartiallyFilled(fill) | OrderEvent::Filled(fill) => {
                if self.execution_ids.contains(&fill.execution_id) {
                    return Err(DomainError::DataIntegrity(format!(
                        "Duplicate execution id {} on order {}",
                        fill.execution_id, self.id
                    )));
                }
            },
            _ => {},
        }

        // Checks are complete; mutation from here on.
        match &event {
            OrderEvent::Initialized(_) => {
                // Unreachable: the transition table has no entry for
                // Initialized event kinds.
            },
            OrderEvent::Invalid(_) | OrderEvent::Denied(_) | OrderEvent::Rejected(_) => {
                self.set_completed();
            },
            OrderEvent::Submitted(submitted) => {
                self.account_id = Some(submitted.account_id.clone());
            },
            OrderEvent::Accepted(accepted) => {
                self.broker_order_id = Some(accepted.broker_order_id.clone());
            },
            OrderEvent::Working(working) => {
                self.broker_order_id = Some(working.broker_order_id.clone());
                self.is_working = true;
            },
            OrderEvent::Modified(modified) => {
                self.broker_order_id = Some(modified.broker_order_id.clone());
                self.quantity = modified.modified_quantity;
                self.price = Some(modified.modified_price);
            },
            OrderEvent::Cancelled(_) | OrderEvent::Expired(_) => {
                self.set_completed();
            },
            OrderEvent::PartiallyFilled(fill) => {
                self.apply_fill(fill);
            },
            OrderEvent::Filled(fill) => {
                self.apply_fill(fill);
                self.set_completed();
            },
        }

        self.state = next;
        self.events.push(event);
        Ok(())
    }

    /// The latest fill payload, if the order has any executions
    pub fn last_fill(&self) -> Option<&OrderFillEvent> {
        self.events.iter().rev().find_map(OrderEvent::as_fill)
    }

    /// Ordered event sequence, starting with the initialization event
    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }

    fn set_completed(&mut self) {
        self.is_completed = true;
        self.is_working = false;
    }

    // A Working event echoes the order's immutable fields; any drift means
    // the broker is working a different order than the one placed.
    fn check_working_unchanged(
        &self,
        working: &crate::events::OrderWorking,
    ) -> Result<(), DomainError> {
        if working.symbol != self.symbol
            || working.side != self.side
            || working.order_type != self.order_type
            || working.quantity != self.quantity
            || working.time_in_force != self.time_in_force
        {
            return Err(DomainError::DataIntegrity(format!(
                "Working event contradicts immutable fields of order {}",
                self.id
            )));
        }
        Ok(())
    }

    // Fill metrics are always taken from the latest fill event, never
    // accumulated independently, which prevents drift between the order and
    // the broker's cumulative figures.
    fn apply_fill(&mut self, fill: &OrderFillEvent) {
        self.execution_ids.push(fill.execution_id.clone());
        self.broker_position_id = Some(fill.broker_position_id.clone());
        self.filled_quantity = fill.filled_quantity;
        self.average_price = Some(fill.average_price);
        self.slippage = match self.price {
            Some(price) => match self.side {
                OrderSide::Buy => fill.average_price.as_decimal() - price.as_decimal(),
                OrderSide::Sell => price.as_decimal() - fill.average_price.as_decimal(),
            },
            None => Decimal::ZERO,
        };
    }
}

impl Aggregate for Order {
    type Id = OrderId;
    type Event = OrderEvent;

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn last_event(&self) -> Option<&OrderEvent> {
        self.events.last()
    }

    fn event_count(&self) -> usize {
        self.events.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
