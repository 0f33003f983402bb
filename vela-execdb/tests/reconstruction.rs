//! Cold-start reconstruction and index lifecycle scenarios
//!
//! Each test drives a database over a shared in-memory store, then builds a
//! second database over the same store to simulate a process restart. The
//! logs are the only state carried across; caches and indices must come
//! back from replay.

use std::sync::Arc;

use rust_decimal_macros::dec;
use vela_domain::{
    AccountId, Order, OrderSide, OrderState, Position, PositionId, StrategyId, TraderId,
};
use vela_execdb::{
    keys, BackingStore, EventSerializer, ExecDbConfig, ExecutionDatabase, JsonEventSerializer,
    MemoryStore,
};
use vela_testkit as testkit;

fn database(store: Arc<MemoryStore>) -> ExecutionDatabase {
    ExecutionDatabase::new(
        ExecDbConfig { load_caches_on_start: false },
        store,
        Box::new(JsonEventSerializer::new()),
    )
}

fn trader() -> TraderId {
    TraderId::new("TESTER-000").unwrap()
}

fn strategy() -> StrategyId {
    StrategyId::new("S-001").unwrap()
}

fn account_id() -> AccountId {
    AccountId::new(testkit::builders::ACCOUNT).unwrap()
}

fn position_id(id: &str) -> PositionId {
    PositionId::new(id).unwrap()
}

/// Drive an order through submit/accept/work/fill, persisting each step.
fn fill_order_through_lifecycle(db: &mut ExecutionDatabase, order_id: &str, pos: &str) -> Order {
    let init = testkit::market_order_initialized(order_id, OrderSide::Buy, dec!(100000));
    let mut order = Order::new(&init).unwrap();
    db.add_order(order.clone(), &trader(), &account_id(), &strategy(), &position_id(pos))
        .unwrap();

    for event in [
        testkit::submitted(&order),
        testkit::accepted(&order),
        testkit::working(&order),
    ] {
        order.apply(event).unwrap();
        db.update_order(order.clone()).unwrap();
    }

    order
        .apply(testkit::fill_for(&order, &format!("E-{order_id}"), dec!(1.1005)))
        .unwrap();
    db.update_order(order.clone()).unwrap();
    order
}

#[test]
fn cold_start_rebuilds_orders_positions_accounts() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());

    let (order, position, account) = {
        let mut db = database(store.clone());

        let account = testkit::account(testkit::builders::ACCOUNT, dec!(100000));
        db.add_account(account.clone()).unwrap();

        let order = fill_order_through_lifecycle(&mut db, "O-001", "P-001");

        let seed = testkit::fill("O-001", "E-P1", OrderSide::Buy, dec!(100000), dec!(1.1005));
        let mut position = Position::new(position_id("P-001"), &seed);
        db.add_position(position.clone()).unwrap();

        let close = testkit::fill("O-002", "E-P2", OrderSide::Sell, dec!(100000), dec!(1.1050));
        position.update(&close);
        db.update_position(position.clone()).unwrap();

        db.flush_pending().unwrap();
        (order, position, account)
    };

    // Restart: fresh database over the same store.
    let mut db = database(store);
    db.load_accounts_cache().unwrap();
    db.load_orders_cache().unwrap();
    db.load_positions_cache().unwrap();

    let reloaded_order = db.order(&order.id).expect("order reloaded");
    assert_eq!(reloaded_order, &order);
    assert_eq!(reloaded_order.state, OrderState::Filled);

    let reloaded_position = db.position(&position.id).expect("position reloaded");
    assert_eq!(reloaded_position, &position);
    assert!(reloaded_position.is_closed());
    assert_eq!(reloaded_position.realized_points, dec!(0.0045));

    let reloaded_account = db.account(&account.id).expect("account reloaded");
    assert_eq!(reloaded_account, &account);
}

#[test]
fn start_honors_load_on_start_config() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    {
        let mut db = database(store.clone());
        db.add_account(testkit::account(testkit::builders::ACCOUNT, dec!(100000))).unwrap();
    }

    let mut db = ExecutionDatabase::new(
        ExecDbConfig::default(),
        store,
        Box::new(JsonEventSerializer::new()),
    );
    assert_eq!(db.account_count(), 0);
    db.start().unwrap();
    assert_eq!(db.account_count(), 1);
}

#[test]
fn load_skips_order_log_with_wrong_first_event() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store.clone());

    fill_order_through_lifecycle(&mut db, "O-001", "P-001");

    // A log whose first entry is a fill, not an initialization.
    let serializer = JsonEventSerializer::new();
    let rogue_id = vela_domain::OrderId::new("O-BAD").unwrap();
    let rogue = Order::new(&testkit::market_order_initialized("O-BAD", OrderSide::Buy, dec!(1)))
        .unwrap();
    let fill_event = testkit::fill_for(&rogue, "E-BAD", dec!(1.1));
    store
        .list_push(
            &keys::order_events(&rogue_id),
            serializer.serialize_order_event(&fill_event).unwrap(),
        )
        .unwrap();

    db.load_orders_cache().unwrap();

    assert_eq!(db.order_count(), 1);
    assert!(db.order(&rogue_id).is_none());
    assert!(db.order(&vela_domain::OrderId::new("O-001").unwrap()).is_some());
}

#[test]
fn load_skips_undeserializable_log_entries() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store.clone());

    fill_order_through_lifecycle(&mut db, "O-001", "P-001");

    let rogue_id = vela_domain::OrderId::new("O-GARBAGE").unwrap();
    store.list_push(&keys::order_events(&rogue_id), b"not json".to_vec()).unwrap();

    db.load_orders_cache().unwrap();
    assert_eq!(db.order_count(), 1);
    assert!(db.order(&rogue_id).is_none());
}

#[test]
fn duplicate_add_order_leaves_indices_unchanged() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store);

    let init = testkit::market_order_initialized("O-001", OrderSide::Buy, dec!(100000));
    let order = Order::new(&init).unwrap();
    db.add_order(order.clone(), &trader(), &account_id(), &strategy(), &position_id("P-001"))
        .unwrap();

    let order_ids = db.order_ids().unwrap();
    let scoped = db.order_ids_for(&trader(), Some(&strategy())).unwrap();

    let err = db
        .add_order(order, &trader(), &account_id(), &strategy(), &position_id("P-001"))
        .unwrap_err();
    assert!(matches!(err, vela_execdb::StoreError::Duplicate { .. }));

    assert_eq!(db.order_ids().unwrap(), order_ids);
    assert_eq!(db.order_ids_for(&trader(), Some(&strategy())).unwrap(), scoped);
    assert_eq!(db.order_count(), 1);
}

#[test]
fn working_and_completed_sets_follow_order_flags() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store);

    let init = testkit::market_order_initialized("O-001", OrderSide::Buy, dec!(100000));
    let mut order = Order::new(&init).unwrap();
    db.add_order(order.clone(), &trader(), &account_id(), &strategy(), &position_id("P-001"))
        .unwrap();

    for event in [
        testkit::submitted(&order),
        testkit::accepted(&order),
        testkit::working(&order),
    ] {
        order.apply(event).unwrap();
        db.update_order(order.clone()).unwrap();
    }

    assert_eq!(db.working_order_ids().unwrap().len(), 1);
    assert!(db.completed_order_ids().unwrap().is_empty());
    assert_eq!(db.working_order_ids_for(&trader(), Some(&strategy())).unwrap().len(), 1);

    order.apply(testkit::cancelled(&order)).unwrap();
    db.update_order(order.clone()).unwrap();

    assert!(db.working_order_ids().unwrap().is_empty());
    assert_eq!(db.completed_order_ids().unwrap().len(), 1);
    assert_eq!(db.completed_order_ids_for(&trader(), None).unwrap().len(), 1);
}

#[test]
fn open_and_closed_sets_follow_position_flags() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store);

    let seed = testkit::fill("O-001", "E-001", OrderSide::Buy, dec!(100), dec!(1.1000));
    let mut position = Position::new(position_id("P-001"), &seed);
    db.add_position(position.clone()).unwrap();

    assert_eq!(db.open_position_ids().unwrap().len(), 1);
    assert!(db.closed_position_ids().unwrap().is_empty());

    position.update(&testkit::fill("O-002", "E-002", OrderSide::Sell, dec!(100), dec!(1.1050)));
    db.update_position(position).unwrap();

    assert!(db.open_position_ids().unwrap().is_empty());
    assert_eq!(db.closed_position_ids().unwrap().len(), 1);
}

#[test]
fn broker_position_correlation_round_trips() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store);

    let seed = testkit::fill("O-001", "E-001", OrderSide::Buy, dec!(100), dec!(1.1000));
    let position = Position::new(position_id("P-001"), &seed);
    let broker_position_id = position.broker_position_id.clone();
    let account = position.account_id.clone();
    db.add_position(position).unwrap();

    assert_eq!(
        db.get_position_id_broker(&position_id("P-001")).unwrap(),
        Some(broker_position_id.clone())
    );
    assert_eq!(
        db.get_position_id_for_broker(&account, &broker_position_id).unwrap(),
        Some(position_id("P-001"))
    );
    // Miss is an explicit absence, not an error
    assert_eq!(
        db.get_position_id_broker(&position_id("P-404")).unwrap(),
        None
    );
}

#[test]
fn scope_lookups_resolve_after_add_order() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store);

    let init = testkit::market_order_initialized("O-001", OrderSide::Buy, dec!(100000));
    let order = Order::new(&init).unwrap();
    db.add_order(order.clone(), &trader(), &account_id(), &strategy(), &position_id("P-001"))
        .unwrap();

    assert_eq!(db.get_trader_id(&order.id).unwrap(), Some(trader()));
    assert_eq!(db.get_account_id(&order.id).unwrap(), Some(account_id()));
    assert_eq!(db.get_position_id(&order.id).unwrap(), Some(position_id("P-001")));
    assert_eq!(db.get_strategy_id(&order.id).unwrap(), Some(strategy()));
    assert_eq!(db.get_trader_id_for_position(&position_id("P-001")).unwrap(), Some(trader()));
    assert_eq!(db.trader_ids().unwrap().len(), 1);
    assert_eq!(db.strategy_ids(&trader()).unwrap().len(), 1);
    assert_eq!(db.position_order_ids(&position_id("P-001")).unwrap().len(), 1);
    assert_eq!(db.position_ids_for(&trader(), Some(&strategy())).unwrap().len(), 1);
    assert_eq!(db.account_order_ids(&account_id()).unwrap().len(), 1);
    assert_eq!(db.account_position_ids(&account_id()).unwrap().len(), 1);
}

#[test]
fn flush_clears_caches_logs_and_indices() {
    testkit::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut db = database(store.clone());

    fill_order_through_lifecycle(&mut db, "O-001", "P-001");
    let seed = testkit::fill("O-001", "E-P1", OrderSide::Buy, dec!(100), dec!(1.1000));
    db.add_position(Position::new(position_id("P-001"), &seed)).unwrap();
    db.add_account(testkit::account(testkit::builders::ACCOUNT, dec!(100000))).unwrap();

    db.flush().unwrap();

    assert_eq!(db.order_count(), 0);
    assert_eq!(db.position_count(), 0);
    assert_eq!(db.account_count(), 0);
    assert!(db.order_ids().unwrap().is_empty());
    assert!(db.position_ids().unwrap().is_empty());
    assert!(db.open_position_ids().unwrap().is_empty());
    assert!(db.trader_ids().unwrap().is_empty());
    assert!(store.keys_with_prefix("").unwrap().is_empty());

    // A reload after flush finds nothing.
    db.load_orders_cache().unwrap();
    assert_eq!(db.order_count(), 0);
}
