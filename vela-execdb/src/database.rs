//! Execution database
//!
//! Durable append-only event log per aggregate id, a fast in-memory cache of
//! live aggregates, and secondary indices for query access. The logs are the
//! source of truth: the cache and every index are rebuildable from them via
//! the `load_*_cache` routines, so index writes may be issued fire-and-forget
//! without cross-write atomicity.
//!
//! Aggregates are single-writer: every command/event for one id is routed
//! through one serial handler upstream, so methods here take `&mut self` and
//! never block.

use crate::config::ExecDbConfig;
use crate::error::StoreError;
use crate::keys::{self, Key};
use crate::serializer::EventSerializer;
use crate::store::BackingStore;
use ahash::AHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vela_domain::{
    Account, AccountId, Aggregate, BrokerPositionId, DomainError, Order, OrderEvent, OrderId,
    Position, PositionId, StrategyId, TraderId,
};

/// Cache, indices and event logs for execution aggregates
pub struct ExecutionDatabase {
    config: ExecDbConfig,
    store: Arc<dyn BackingStore>,
    serializer: Box<dyn EventSerializer>,
    cached_orders: AHashMap<OrderId, Order>,
    cached_positions: AHashMap<PositionId, Position>,
    cached_accounts: AHashMap<AccountId, Account>,
}

impl ExecutionDatabase {
    /// Create an execution database over the given store and serializer
    pub fn new(
        config: ExecDbConfig,
        store: Arc<dyn BackingStore>,
        serializer: Box<dyn EventSerializer>,
    ) -> Self {
        Self {
            config,
            store,
            serializer,
            cached_orders: AHashMap::new(),
            cached_positions: AHashMap::new(),
            cached_accounts: AHashMap::new(),
        }
    }

    /// Run configured startup work: cold-start cache reconstruction
    ///
    /// # Errors
    /// Returns the first store-level failure. Per-aggregate integrity
    /// problems are logged and skipped, never returned.
    pub fn start(&mut self) -> Result<(), StoreError> {
        if self.config.load_caches_on_start {
            self.load_accounts_cache()?;
            self.load_orders_cache()?;
            self.load_positions_cache()?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Add
    // -------------------------------------------------------------------------

    /// Add a new order with its owning scope, index it, and log its
    /// initiating event
    ///
    /// Index updates are individually durable but not atomic as a group;
    /// the cache insert happens last so a reader never observes a cached
    /// order with no indices at all.
    ///
    /// # Errors
    /// Returns `StoreError::Duplicate` if the order id is already cached.
    pub fn add_order(
        &mut self,
        order: Order,
        trader_id: &TraderId,
        account_id: &AccountId,
        strategy_id: &StrategyId,
        position_id: &PositionId,
    ) -> Result<(), StoreError> {
        if self.cached_orders.contains_key(&order.id) {
            return Err(StoreError::duplicate("order", order.id.as_str()));
        }

        let order_id = order.id.as_str();
        let position = position_id.as_str();

        self.store.set_add(&keys::index_traders(), trader_id.as_str())?;
        self.store.set_add(&keys::index_trader_orders(trader_id), order_id)?;
        self.store.set_add(&keys::index_trader_positions(trader_id), position)?;
        self.store.set_add(&keys::index_trader_strategies(trader_id), strategy_id.as_str())?;
        self.store.set_add(&keys::index_strategy_orders(trader_id, strategy_id), order_id)?;
        self.store.set_add(&keys::index_strategy_positions(trader_id, strategy_id), position)?;
        self.store.set_add(&keys::index_account_orders(account_id), order_id)?;
        self.store.set_add(&keys::index_account_positions(account_id), position)?;
        self.store.hash_set(&keys::index_order_trader(), order_id, trader_id.as_str())?;
        self.store.hash_set(&keys::index_order_account(), order_id, account_id.as_str())?;
        self.store.hash_set(&keys::index_order_position(), order_id, position)?;
        self.store.hash_set(&keys::index_order_strategy(), order_id, strategy_id.as_str())?;
        self.store.hash_set(&keys::index_position_trader(), position, trader_id.as_str())?;
        self.store.hash_set(&keys::index_position_account(), position, account_id.as_str())?;
        self.store.hash_set(&keys::index_position_strategy(), position, strategy_id.as_str())?;
        self.store.set_add(&keys::index_position_orders(position_id), order_id)?;
        self.store.set_add(&keys::index_orders(), order_id)?;

        self.append_order_event(&order)?;

        debug!(order_id = %order.id, trader_id = %trader_id, "Order added");
        self.cached_orders.insert(order.id.clone(), order);
        Ok(())
    }

    /// Add a new position, index it, and log its establishing fill
    ///
    /// Positions must always be created in the open state; a closed one is
    /// logged as an error but still stored.
    ///
    /// # Errors
    /// Returns `StoreError::Duplicate` if the position id is already cached.
    pub fn add_position(&mut self, position: Position) -> Result<(), StoreError> {
        if self.cached_positions.contains_key(&position.id) {
            return Err(StoreError::duplicate("position", position.id.as_str()));
        }

        if !position.is_open() {
            error!(position_id = %position.id, "Position added while not open");
        }

        let position_id = position.id.as_str();
        self.store.set_add(&keys::index_positions(), position_id)?;
        if position.is_open() {
            self.store.set_add(&keys::index_positions_open(), position_id)?;
        } else {
            self.store.set_add(&keys::index_positions_closed(), position_id)?;
        }
        self.store.hash_set(
            &keys::index_position_broker(),
            position_id,
            position.broker_position_id.as_str(),
        )?;
        self.store.hash_set(
            &keys::index_broker_positions(&position.account_id),
            position.broker_position_id.as_str(),
            position_id,
        )?;

        self.append_position_event(&position)?;

        debug!(position_id = %position.id, "Position added");
        self.cached_positions.insert(position.id.clone(), position);
        Ok(())
    }

    /// Add a new account and log its latest state event
    ///
    /// # Errors
    /// Returns `StoreError::Duplicate` if the account id is already cached.
    pub fn add_account(&mut self, account: Account) -> Result<(), StoreError> {
        if self.cached_accounts.contains_key(&account.id) {
            return Err(StoreError::duplicate("account", account.id.as_str()));
        }

        self.append_account_event(&account)?;

        debug!(account_id = %account.id, "Account added");
        self.cached_accounts.insert(account.id.clone(), account);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Persist an order's latest event and re-index its working/completed
    /// membership
    ///
    /// The order is assumed already validated and mutated by its aggregate;
    /// no business rules are re-checked here.
    ///
    /// # Errors
    /// Returns `StoreError::DataIntegrity` if the order has no events.
    pub fn update_order(&mut self, order: Order) -> Result<(), StoreError> {
        self.append_order_event(&order)?;

        let order_id = order.id.as_str();
        if order.is_working {
            self.store.set_add(&keys::index_orders_working(), order_id)?;
        } else {
            self.store.set_remove(&keys::index_orders_working(), order_id)?;
        }
        if order.is_completed {
            self.store.set_add(&keys::index_orders_completed(), order_id)?;
        } else {
            self.store.set_remove(&keys::index_orders_completed(), order_id)?;
        }

        self.cached_orders.insert(order.id.clone(), order);
        Ok(())
    }

    /// Persist a position's latest fill and re-index its open/closed
    /// membership
    ///
    /// # Errors
    /// Returns `StoreError::DataIntegrity` if the position has no fills.
    pub fn update_position(&mut self, position: Position) -> Result<(), StoreError> {
        self.append_position_event(&position)?;

        let position_id = position.id.as_str();
        if position.is_open() {
            self.store.set_add(&keys::index_positions_open(), position_id)?;
            self.store.set_remove(&keys::index_positions_closed(), position_id)?;
        } else {
            self.store.set_add(&keys::index_positions_closed(), position_id)?;
            self.store.set_remove(&keys::index_positions_open(), position_id)?;
        }

        self.cached_positions.insert(position.id.clone(), position);
        Ok(())
    }

    /// Persist an account's latest state event
    ///
    /// # Errors
    /// Returns `StoreError::DataIntegrity` if the account has no events.
    pub fn update_account(&mut self, account: Account) -> Result<(), StoreError> {
        self.append_account_event(&account)?;
        self.cached_accounts.insert(account.id.clone(), account);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cache reads
    // -------------------------------------------------------------------------

    /// Look up a cached order
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.cached_orders.get(id)
    }

    /// Look up a cached position
    pub fn position(&self, id: &PositionId) -> Option<&Position> {
        self.cached_positions.get(id)
    }

    /// Look up a cached account
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.cached_accounts.get(id)
    }

    /// Number of cached orders
    pub fn order_count(&self) -> usize {
        self.cached_orders.len()
    }

    /// Number of cached positions
    pub fn position_count(&self) -> usize {
        self.cached_positions.len()
    }

    /// Number of cached accounts
    pub fn account_count(&self) -> usize {
        self.cached_accounts.len()
    }

    // -------------------------------------------------------------------------
    // Index lookups (1:1 maps)
    // -------------------------------------------------------------------------

    /// The trader an order belongs to, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry;
    /// a plain miss is `Ok(None)`.
    pub fn get_trader_id(&self, order_id: &OrderId) -> Result<Option<TraderId>, StoreError> {
        self.lookup(keys::index_order_trader(), order_id.as_str(), TraderId::new)
    }

    /// The account an order belongs to, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_account_id(&self, order_id: &OrderId) -> Result<Option<AccountId>, StoreError> {
        self.lookup(keys::index_order_account(), order_id.as_str(), AccountId::new)
    }

    /// The position an order fills into, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_position_id(&self, order_id: &OrderId) -> Result<Option<PositionId>, StoreError> {
        self.lookup(keys::index_order_position(), order_id.as_str(), PositionId::new)
    }

    /// The strategy an order was placed by, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_strategy_id(&self, order_id: &OrderId) -> Result<Option<StrategyId>, StoreError> {
        self.lookup(keys::index_order_strategy(), order_id.as_str(), StrategyId::new)
    }

    /// The trader a position belongs to, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_trader_id_for_position(
        &self,
        position_id: &PositionId,
    ) -> Result<Option<TraderId>, StoreError> {
        self.lookup(keys::index_position_trader(), position_id.as_str(), TraderId::new)
    }

    /// The account a position belongs to, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_account_id_for_position(
        &self,
        position_id: &PositionId,
    ) -> Result<Option<AccountId>, StoreError> {
        self.lookup(keys::index_position_account(), position_id.as_str(), AccountId::new)
    }

    /// The strategy a position belongs to, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_strategy_id_for_position(
        &self,
        position_id: &PositionId,
    ) -> Result<Option<StrategyId>, StoreError> {
        self.lookup(keys::index_position_strategy(), position_id.as_str(), StrategyId::new)
    }

    /// The broker's id for a position, if indexed
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_position_id_broker(
        &self,
        position_id: &PositionId,
    ) -> Result<Option<BrokerPositionId>, StoreError> {
        self.lookup(keys::index_position_broker(), position_id.as_str(), BrokerPositionId::new)
    }

    /// Correlate a broker execution report back to a position
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable entry.
    pub fn get_position_id_for_broker(
        &self,
        account_id: &AccountId,
        broker_position_id: &BrokerPositionId,
    ) -> Result<Option<PositionId>, StoreError> {
        self.lookup(
            keys::index_broker_positions(account_id),
            broker_position_id.as_str(),
            PositionId::new,
        )
    }

    // -------------------------------------------------------------------------
    // Index queries (id sets)
    // -------------------------------------------------------------------------

    /// All known trader ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn trader_ids(&self) -> Result<BTreeSet<TraderId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_traders())?, TraderId::new)
    }

    /// Strategy ids a trader has traded
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn strategy_ids(&self, trader_id: &TraderId) -> Result<BTreeSet<StrategyId>, StoreError> {
        parse_ids(
            self.store.set_members(&keys::index_trader_strategies(trader_id))?,
            StrategyId::new,
        )
    }

    /// All order ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn order_ids(&self) -> Result<BTreeSet<OrderId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_orders())?, OrderId::new)
    }

    /// Order ids scoped to a trader, optionally narrowed to one strategy
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn order_ids_for(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<OrderId>, StoreError> {
        parse_ids(self.scoped_orders(trader_id, strategy_id)?, OrderId::new)
    }

    /// Working order ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn working_order_ids(&self) -> Result<BTreeSet<OrderId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_orders_working())?, OrderId::new)
    }

    /// Working order ids scoped to a trader, optionally one strategy
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn working_order_ids_for(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<OrderId>, StoreError> {
        let scoped = self.scoped_orders(trader_id, strategy_id)?;
        let working = self.store.set_members(&keys::index_orders_working())?;
        parse_ids(intersect(&scoped, &working), OrderId::new)
    }

    /// Completed order ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn completed_order_ids(&self) -> Result<BTreeSet<OrderId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_orders_completed())?, OrderId::new)
    }

    /// Completed order ids scoped to a trader, optionally one strategy
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn completed_order_ids_for(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<OrderId>, StoreError> {
        let scoped = self.scoped_orders(trader_id, strategy_id)?;
        let completed = self.store.set_members(&keys::index_orders_completed())?;
        parse_ids(intersect(&scoped, &completed), OrderId::new)
    }

    /// All position ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn position_ids(&self) -> Result<BTreeSet<PositionId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_positions())?, PositionId::new)
    }

    /// Position ids scoped to a trader, optionally one strategy
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn position_ids_for(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<PositionId>, StoreError> {
        parse_ids(self.scoped_positions(trader_id, strategy_id)?, PositionId::new)
    }

    /// Open position ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn open_position_ids(&self) -> Result<BTreeSet<PositionId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_positions_open())?, PositionId::new)
    }

    /// Open position ids scoped to a trader, optionally one strategy
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn open_position_ids_for(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<PositionId>, StoreError> {
        let scoped = self.scoped_positions(trader_id, strategy_id)?;
        let open = self.store.set_members(&keys::index_positions_open())?;
        parse_ids(intersect(&scoped, &open), PositionId::new)
    }

    /// Closed position ids
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn closed_position_ids(&self) -> Result<BTreeSet<PositionId>, StoreError> {
        parse_ids(self.store.set_members(&keys::index_positions_closed())?, PositionId::new)
    }

    /// Closed position ids scoped to a trader, optionally one strategy
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn closed_position_ids_for(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<PositionId>, StoreError> {
        let scoped = self.scoped_positions(trader_id, strategy_id)?;
        let closed = self.store.set_members(&keys::index_positions_closed())?;
        parse_ids(intersect(&scoped, &closed), PositionId::new)
    }

    /// Order ids submitted under an account
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn account_order_ids(
        &self,
        account_id: &AccountId,
    ) -> Result<BTreeSet<OrderId>, StoreError> {
        parse_ids(
            self.store.set_members(&keys::index_account_orders(account_id))?,
            OrderId::new,
        )
    }

    /// Position ids held under an account
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn account_position_ids(
        &self,
        account_id: &AccountId,
    ) -> Result<BTreeSet<PositionId>, StoreError> {
        parse_ids(
            self.store.set_members(&keys::index_account_positions(account_id))?,
            PositionId::new,
        )
    }

    /// Order ids a position comprises
    ///
    /// # Errors
    /// Returns a store failure or `DataIntegrity` on an unparseable member.
    pub fn position_order_ids(
        &self,
        position_id: &PositionId,
    ) -> Result<BTreeSet<OrderId>, StoreError> {
        parse_ids(
            self.store.set_members(&keys::index_position_orders(position_id))?,
            OrderId::new,
        )
    }

    // -------------------------------------------------------------------------
    // Cold-start reconstruction
    // -------------------------------------------------------------------------

    /// Rebuild the accounts cache from the event logs
    ///
    /// Aggregates with integrity problems (empty log, undeserializable or
    /// wrong-kind first event) are logged and skipped; the rest load.
    ///
    /// # Errors
    /// Returns only store-level enumeration failures.
    pub fn load_accounts_cache(&mut self) -> Result<(), StoreError> {
        self.cached_accounts.clear();
        for key in self.store.keys_with_prefix(keys::ACCOUNTS_PREFIX)? {
            match self.load_account(&key) {
                Ok(account) => {
                    self.cached_accounts.insert(account.id.clone(), account);
                },
                Err(e) => {
                    error!(key = %key, error = %e, "Skipping unloadable account log");
                },
            }
        }
        info!(count = self.cached_accounts.len(), "Accounts cache loaded");
        Ok(())
    }

    /// Rebuild the orders cache from the event logs
    ///
    /// # Errors
    /// Returns only store-level enumeration failures.
    pub fn load_orders_cache(&mut self) -> Result<(), StoreError> {
        self.cached_orders.clear();
        for key in self.store.keys_with_prefix(keys::ORDERS_PREFIX)? {
            match self.load_order(&key) {
                Ok(order) => {
                    self.cached_orders.insert(order.id.clone(), order);
                },
                Err(e) => {
                    error!(key = %key, error = %e, "Skipping unloadable order log");
                },
            }
        }
        info!(count = self.cached_orders.len(), "Orders cache loaded");
        Ok(())
    }

    /// Rebuild the positions cache from the event logs
    ///
    /// # Errors
    /// Returns only store-level enumeration failures.
    pub fn load_positions_cache(&mut self) -> Result<(), StoreError> {
        self.cached_positions.clear();
        for key in self.store.keys_with_prefix(keys::POSITIONS_PREFIX)? {
            match self.load_position(&key) {
                Ok(position) => {
                    self.cached_positions.insert(position.id.clone(), position);
                },
                Err(e) => {
                    error!(key = %key, error = %e, "Skipping unloadable position log");
                },
            }
        }
        info!(count = self.cached_positions.len(), "Positions cache loaded");
        Ok(())
    }

    /// Clear every cache and erase all persisted logs and indices.
    ///
    /// Destructive and irreversible; for test contexts only.
    ///
    /// # Errors
    /// Returns a store failure if the erase fails.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.cached_orders.clear();
        self.cached_positions.clear();
        self.cached_accounts.clear();
        self.store.remove_all()?;
        warn!("Execution database flushed");
        Ok(())
    }

    /// Block until every previously issued write is durable
    ///
    /// # Errors
    /// Returns a store failure if the barrier fails.
    pub fn flush_pending(&self) -> Result<(), StoreError> {
        self.store.flush_pending()
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    fn append_order_event(&self, order: &Order) -> Result<(), StoreError> {
        let event = order.last_event().ok_or_else(|| {
            StoreError::DataIntegrity(format!("Order {} has no events", order.id))
        })?;
        let bytes = self.serializer.serialize_order_event(event)?;
        self.store.list_push(&keys::order_events(&order.id), bytes)
    }

    fn append_position_event(&self, position: &Position) -> Result<(), StoreError> {
        let fill = position.last_event().ok_or_else(|| {
            StoreError::DataIntegrity(format!("Position {} has no fills", position.id))
        })?;
        let bytes = self.serializer.serialize_fill(fill)?;
        self.store.list_push(&keys::position_events(&position.id), bytes)
    }

    fn append_account_event(&self, account: &Account) -> Result<(), StoreError> {
        let event = account.last_event().ok_or_else(|| {
            StoreError::DataIntegrity(format!("Account {} has no events", account.id))
        })?;
        let bytes = self.serializer.serialize_account_event(event)?;
        self.store.list_push(&keys::account_events(&account.id), bytes)
    }

    fn load_account(&self, key: &str) -> Result<Account, StoreError> {
        let id = keys::strip_prefix(key, keys::ACCOUNTS_PREFIX)
            .ok_or_else(|| StoreError::DataIntegrity(format!("Malformed account key {key:?}")))?;
        let id = AccountId::new(id)?;
        let entries = self.store.list_read(&keys::account_events(&id))?;
        let Some(first) = entries.first() else {
            return Err(StoreError::DataIntegrity(format!("Account log {key} has no events")));
        };
        let first = self.serializer.deserialize_account_event(first)?;
        let mut account = Account::new(&first);
        for bytes in &entries[1..] {
            let event = self.serializer.deserialize_account_event(bytes)?;
            account.apply(&event)?;
        }
        Ok(account)
    }

    fn load_order(&self, key: &str) -> Result<Order, StoreError> {
        let id = keys::strip_prefix(key, keys::ORDERS_PREFIX)
            .ok_or_else(|| StoreError::DataIntegrity(format!("Malformed order key {key:?}")))?;
        let id = OrderId::new(id)?;
        let entries = self.store.list_read(&keys::order_events(&id))?;
        let Some(first) = entries.first() else {
            return Err(StoreError::DataIntegrity(format!("Order log {key} has no events")));
        };
        let first = self.serializer.deserialize_order_event(first)?;
        let OrderEvent::Initialized(init) = first else {
            return Err(StoreError::DataIntegrity(format!(
                "Order log {key} starts with {}, expected INITIALIZED",
                first.kind()
            )));
        };
        let mut order = Order::new(&init)?;
        for bytes in &entries[1..] {
            let event = self.serializer.deserialize_order_event(bytes)?;
            order.apply(event)?;
        }
        Ok(order)
    }

    fn load_position(&self, key: &str) -> Result<Position, StoreError> {
        let id = keys::strip_prefix(key, keys::POSITIONS_PREFIX)
            .ok_or_else(|| StoreError::DataIntegrity(format!("Malformed position key {key:?}")))?;
        let id = PositionId::new(id)?;
        let entries = self.store.list_read(&keys::position_events(&id))?;
        let Some(first) = entries.first() else {
            return Err(StoreError::DataIntegrity(format!("Position log {key} has no events")));
        };
        let first = self.serializer.deserialize_fill(first)?;
        let mut position = Position::new(id, &first);
        for bytes in &entries[1..] {
            let fill = self.serializer.deserialize_fill(bytes)?;
            position.update(&fill);
        }
        Ok(position)
    }

    fn lookup<T>(
        &self,
        key: Key,
        field: &str,
        parse: impl FnOnce(String) -> Result<T, DomainError>,
    ) -> Result<Option<T>, StoreError> {
        match self.store.hash_get(&key, field)? {
            Some(value) => parse(value)
                .map(Some)
                .map_err(|e| StoreError::DataIntegrity(format!("Bad index entry at {key}: {e}"))),
            None => Ok(None),
        }
    }

    fn scoped_orders(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let key = match strategy_id {
            Some(strategy_id) => keys::index_strategy_orders(trader_id, strategy_id),
            None => keys::index_trader_orders(trader_id),
        };
        self.store.set_members(&key)
    }

    fn scoped_positions(
        &self,
        trader_id: &TraderId,
        strategy_id: Option<&StrategyId>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let key = match strategy_id {
            Some(strategy_id) => keys::index_strategy_positions(trader_id, strategy_id),
            None => keys::index_trader_positions(trader_id),
        };
        self.store.set_members(&key)
    }
}

fn intersect(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    a.intersection(b).cloned().collect()
}

fn parse_ids<T, F>(members: BTreeSet<String>, parse: F) -> Result<BTreeSet<T>, StoreError>
where
    T: Ord,
    F: Fn(String) -> Result<T, DomainError>,
{
    members
        .into_iter()
        .map(|member| {
            let display = member.clone();
            parse(member)
                .map_err(|e| StoreError::DataIntegrity(format!("Bad index member {display:?}: {e}")))
        })
        .collect()
}
