//! Event builders with test defaults
//!
//! Everything validates through the domain constructors; invalid input
//! panics, which is the right failure mode in a test.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;
use vela_domain::{
    Account, AccountId, AccountStateEvent, BrokerId, BrokerOrderId, BrokerPositionId, Currency,
    ExecutionId, Order, OrderAccepted, OrderCancelled, OrderEvent, OrderFillEvent, OrderId,
    OrderInitialized, OrderSide, OrderSubmitted, OrderType, OrderWorking, Price, Quantity, Symbol,
    TimeInForce,
};

/// Default test account id
pub const ACCOUNT: &str = "FXCM-123456";
/// Default test symbol
pub const SYMBOL: &str = "AUDUSD";

/// A DAY market order initialization event
pub fn market_order_initialized(order_id: &str, side: OrderSide, quantity: Decimal) -> OrderInitialized {
    OrderInitialized {
        event_id: Uuid::new_v4(),
        order_id: OrderId::new(order_id).expect("valid order id"),
        symbol: Symbol::new(SYMBOL).expect("valid symbol"),
        side,
        order_type: OrderType::Market,
        quantity: Quantity::new(quantity).expect("valid quantity"),
        price: None,
        time_in_force: TimeInForce::Day,
        expire_time: None,
        timestamp: Utc::now(),
    }
}

/// A submitted event for the order, under the default account
pub fn submitted(order: &Order) -> OrderEvent {
    OrderEvent::Submitted(OrderSubmitted {
        event_id: Uuid::new_v4(),
        order_id: order.id.clone(),
        account_id: AccountId::new(ACCOUNT).expect("valid account id"),
        timestamp: Utc::now(),
    })
}

/// An accepted event for the order
pub fn accepted(order: &Order) -> OrderEvent {
    OrderEvent::Accepted(OrderAccepted {
        event_id: Uuid::new_v4(),
        order_id: order.id.clone(),
        broker_order_id: BrokerOrderId::new(format!("B-{}", order.id)).expect("valid broker id"),
        timestamp: Utc::now(),
    })
}

/// A working event echoing the order's own fields
pub fn working(order: &Order) -> OrderEvent {
    OrderEvent::Working(OrderWorking {
        event_id: Uuid::new_v4(),
        order_id: order.id.clone(),
        broker_order_id: BrokerOrderId::new(format!("B-{}", order.id)).expect("valid broker id"),
        symbol: order.symbol.clone(),
        side: order.side,
        order_type: order.order_type,
        quantity: order.quantity,
        price: order.price,
        time_in_force: order.time_in_force,
        expire_time: order.expire_time,
        timestamp: Utc::now(),
    })
}

/// A cancelled event for the order
pub fn cancelled(order: &Order) -> OrderEvent {
    OrderEvent::Cancelled(OrderCancelled {
        event_id: Uuid::new_v4(),
        order_id: order.id.clone(),
        timestamp: Utc::now(),
    })
}

/// A full-fill event for the order at the given price
pub fn fill_for(order: &Order, execution_id: &str, price: Decimal) -> OrderEvent {
    OrderEvent::Filled(OrderFillEvent {
        event_id: Uuid::new_v4(),
        order_id: order.id.clone(),
        account_id: AccountId::new(ACCOUNT).expect("valid account id"),
        execution_id: ExecutionId::new(execution_id).expect("valid execution id"),
        broker_position_id: BrokerPositionId::new(format!("BP-{}", order.id))
            .expect("valid broker position id"),
        symbol: order.symbol.clone(),
        side: order.side,
        filled_quantity: order.quantity,
        leaves_quantity: Quantity::zero(),
        average_price: Price::new(price).expect("valid price"),
        currency: Currency::new("AUD").expect("valid currency"),
        timestamp: Utc::now(),
    })
}

/// A standalone fill event, for seeding positions directly
pub fn fill(
    order_id: &str,
    execution_id: &str,
    side: OrderSide,
    quantity: Decimal,
    price: Decimal,
) -> OrderFillEvent {
    OrderFillEvent {
        event_id: Uuid::new_v4(),
        order_id: OrderId::new(order_id).expect("valid order id"),
        account_id: AccountId::new(ACCOUNT).expect("valid account id"),
        execution_id: ExecutionId::new(execution_id).expect("valid execution id"),
        broker_position_id: BrokerPositionId::new(format!("BP-{order_id}"))
            .expect("valid broker position id"),
        symbol: Symbol::new(SYMBOL).expect("valid symbol"),
        side,
        filled_quantity: Quantity::new(quantity).expect("valid quantity"),
        leaves_quantity: Quantity::zero(),
        average_price: Price::new(price).expect("valid price"),
        currency: Currency::new("AUD").expect("valid currency"),
        timestamp: Utc::now(),
    }
}

/// An account state snapshot with the given cash balance
pub fn account_state(account_id: &str, cash_balance: Decimal) -> AccountStateEvent {
    AccountStateEvent {
        event_id: Uuid::new_v4(),
        account_id: AccountId::new(account_id).expect("valid account id"),
        broker_id: BrokerId::new("FXCM").expect("valid broker id"),
        account_number: "123456".to_string(),
        currency: Currency::new("USD").expect("valid currency"),
        cash_balance,
        cash_start_day: cash_balance,
        cash_activity_day: dec!(0),
        margin_used_maintenance: dec!(0),
        margin_used_liquidation: dec!(0),
        margin_ratio: dec!(0),
        margin_call_status: "N".to_string(),
        timestamp: Utc::now(),
    }
}

/// Convenience: an account aggregate created from [`account_state`]
pub fn account(account_id: &str, cash_balance: Decimal) -> Account {
    Account::new(&account_state(account_id, cash_balance))
}
