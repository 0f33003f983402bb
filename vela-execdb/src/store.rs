//! Backing store abstraction
//!
//! The execution database needs three shapes from its store: an ordered
//! append-only list per key (event logs), sets of strings (id indices), and
//! string-to-string hashes (1:1 id maps). Any key-value engine offering
//! these satisfies the contract.
//!
//! Writes carry an EVENTUAL durability tier: an implementation may buffer or
//! dispatch them fire-and-forget, and the caller gets no durability
//! acknowledgement. [`BackingStore::flush_pending`] is the explicit barrier
//! for tests and shutdown paths that need deterministic ordering.

use crate::error::StoreError;
use crate::keys::Key;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// Ordered-log + set + hash key-value store contract
pub trait BackingStore: Send + Sync {
    /// Append a value to the list at `key`, creating the list if absent.
    /// Eventual durability tier.
    fn list_push(&self, key: &Key, value: Vec<u8>) -> Result<(), StoreError>;

    /// Read the full list at `key`, in append order. Missing key reads as
    /// an empty list.
    fn list_read(&self, key: &Key) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Add a member to the set at `key`. Eventual durability tier.
    fn set_add(&self, key: &Key, member: &str) -> Result<(), StoreError>;

    /// Remove a member from the set at `key`. Removing from a missing set
    /// is a no-op. Eventual durability tier.
    fn set_remove(&self, key: &Key, member: &str) -> Result<(), StoreError>;

    /// Read the members of the set at `key`. Missing key reads as empty.
    fn set_members(&self, key: &Key) -> Result<BTreeSet<String>, StoreError>;

    /// Set a field in the hash at `key`. Eventual durability tier.
    fn hash_set(&self, key: &Key, field: &str, value: &str) -> Result<(), StoreError>;

    /// Read a field from the hash at `key`.
    fn hash_get(&self, key: &Key, field: &str) -> Result<Option<String>, StoreError>;

    /// Enumerate every key starting with `prefix`, across all shapes.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Erase every key of every shape. Destructive and irreversible.
    fn remove_all(&self) -> Result<(), StoreError>;

    /// Block until every previously issued write is durable.
    fn flush_pending(&self) -> Result<(), StoreError>;
}

/// In-memory backing store
///
/// Used for testing and development without an external engine.
/// Thread-safe using RwLock for concurrent access; writes are immediately
/// visible, so `flush_pending` is a no-op.
pub struct MemoryStore {
    lists: RwLock<HashMap<String, Vec<Vec<u8>>>>,
    sets: RwLock<HashMap<String, BTreeSet<String>>>,
    hashes: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            lists: RwLock::new(HashMap::new()),
            sets: RwLock::new(HashMap::new()),
            hashes: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of event logs held
    pub fn list_count(&self) -> usize {
        self.lists.read().unwrap().len()
    }

    /// Get the number of index sets held
    pub fn set_count(&self) -> usize {
        self.sets.read().unwrap().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for MemoryStore {
    fn list_push(&self, key: &Key, value: Vec<u8>) -> Result<(), StoreError> {
        let mut lists = self.lists.write().unwrap();
        lists.entry(key.as_str().to_string()).or_default().push(value);
        Ok(())
    }

    fn list_read(&self, key: &Key) -> Result<Vec<Vec<u8>>, StoreError> {
        let lists = self.lists.read().unwrap();
        Ok(lists.get(key.as_str()).cloned().unwrap_or_default())
    }

    fn set_add(&self, key: &Key, member: &str) -> Result<(), StoreError> {
        let mut sets = self.sets.write().unwrap();
        sets.entry(key.as_str().to_string()).or_default().insert(member.to_string());
        Ok(())
    }

    fn set_remove(&self, key: &Key, member: &str) -> Result<(), StoreError> {
        let mut sets = self.sets.write().unwrap();
        if let Some(set) = sets.get_mut(key.as_str()) {
            set.remove(member);
        }
        Ok(())
    }

    fn set_members(&self, key: &Key) -> Result<BTreeSet<String>, StoreError> {
        let sets = self.sets.read().unwrap();
        Ok(sets.get(key.as_str()).cloned().unwrap_or_default())
    }

    fn hash_set(&self, key: &Key, field: &str, value: &str) -> Result<(), StoreError> {
        let mut hashes = self.hashes.write().unwrap();
        hashes
            .entry(key.as_str().to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hash_get(&self, key: &Key, field: &str) -> Result<Option<String>, StoreError> {
        let hashes = self.hashes.read().unwrap();
        Ok(hashes.get(key.as_str()).and_then(|hash| hash.get(field)).cloned())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let lists = self.lists.read().unwrap();
        let sets = self.sets.read().unwrap();
        let hashes = self.hashes.read().unwrap();
        let mut keys: Vec<String> = lists
            .keys()
            .chain(sets.keys())
            .chain(hashes.keys())
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    fn remove_all(&self) -> Result<(), StoreError> {
        self.lists.write().unwrap().clear();
        self.sets.write().unwrap().clear();
        self.hashes.write().unwrap().clear();
        Ok(())
    }

    fn flush_pending(&self) -> Result<(), StoreError> {
        // Memory writes are immediately visible.
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use vela_domain::OrderId;

    fn order_key(id: &str) -> Key {
        keys::order_events(&OrderId::new(id).unwrap())
    }

    #[test]
    fn test_list_push_preserves_order() {
        let store = MemoryStore::new();
        let key = order_key("O-001");
        store.list_push(&key, b"one".to_vec()).unwrap();
        store.list_push(&key, b"two".to_vec()).unwrap();

        let entries = store.list_read(&key).unwrap();
        assert_eq!(entries, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn test_missing_list_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.list_read(&order_key("O-404")).unwrap().is_empty());
    }

    #[test]
    fn test_set_add_remove_members() {
        let store = MemoryStore::new();
        let key = keys::index_orders();
        store.set_add(&key, "O-001").unwrap();
        store.set_add(&key, "O-002").unwrap();
        store.set_add(&key, "O-001").unwrap();

        let members = store.set_members(&key).unwrap();
        assert_eq!(members.len(), 2);

        store.set_remove(&key, "O-001").unwrap();
        assert!(!store.set_members(&key).unwrap().contains("O-001"));

        // Removing from a missing set is a no-op
        store.set_remove(&keys::index_positions(), "P-001").unwrap();
    }

    #[test]
    fn test_hash_set_get() {
        let store = MemoryStore::new();
        let key = keys::index_order_trader();
        store.hash_set(&key, "O-001", "TESTER-000").unwrap();

        assert_eq!(store.hash_get(&key, "O-001").unwrap().as_deref(), Some("TESTER-000"));
        assert_eq!(store.hash_get(&key, "O-404").unwrap(), None);
    }

    #[test]
    fn test_keys_with_prefix() {
        let store = MemoryStore::new();
        store.list_push(&order_key("O-001"), b"x".to_vec()).unwrap();
        store.list_push(&order_key("O-002"), b"x".to_vec()).unwrap();
        store.set_add(&keys::index_orders(), "O-001").unwrap();

        let keys = store.keys_with_prefix(keys::ORDERS_PREFIX).unwrap();
        assert_eq!(keys, vec!["orders:O-001".to_string(), "orders:O-002".to_string()]);
    }

    #[test]
    fn test_remove_all() {
        let store = MemoryStore::new();
        store.list_push(&order_key("O-001"), b"x".to_vec()).unwrap();
        store.set_add(&keys::index_orders(), "O-001").unwrap();
        store.hash_set(&keys::index_order_trader(), "O-001", "T").unwrap();

        store.remove_all().unwrap();
        assert_eq!(store.list_count(), 0);
        assert_eq!(store.set_count(), 0);
        assert!(store.keys_with_prefix("").unwrap().is_empty());
    }
}
