//! Event (de)serialization boundary
//!
//! The database treats persisted log entries as opaque bytes; the concrete
//! wire format is owned by whoever provides the serializer.

use crate::error::StoreError;
use vela_domain::{AccountStateEvent, OrderEvent, OrderFillEvent};

/// Round-trips domain events through an opaque byte representation
pub trait EventSerializer: Send + Sync {
    /// Serialize an order lifecycle event
    fn serialize_order_event(&self, event: &OrderEvent) -> Result<Vec<u8>, StoreError>;

    /// Deserialize an order lifecycle event
    fn deserialize_order_event(&self, bytes: &[u8]) -> Result<OrderEvent, StoreError>;

    /// Serialize a position fill event
    fn serialize_fill(&self, fill: &OrderFillEvent) -> Result<Vec<u8>, StoreError>;

    /// Deserialize a position fill event
    fn deserialize_fill(&self, bytes: &[u8]) -> Result<OrderFillEvent, StoreError>;

    /// Serialize an account state event
    fn serialize_account_event(&self, event: &AccountStateEvent) -> Result<Vec<u8>, StoreError>;

    /// Deserialize an account state event
    fn deserialize_account_event(&self, bytes: &[u8]) -> Result<AccountStateEvent, StoreError>;
}

/// JSON event serializer
#[derive(Debug, Default)]
pub struct JsonEventSerializer;

impl JsonEventSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self
    }
}

impl EventSerializer for JsonEventSerializer {
    fn serialize_order_event(&self, event: &OrderEvent) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(event).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize_order_event(&self, bytes: &[u8]) -> Result<OrderEvent, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    fn serialize_fill(&self, fill: &OrderFillEvent) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(fill).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize_fill(&self, bytes: &[u8]) -> Result<OrderFillEvent, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    fn serialize_account_event(&self, event: &AccountStateEvent) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(event).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize_account_event(&self, bytes: &[u8]) -> Result<AccountStateEvent, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}
