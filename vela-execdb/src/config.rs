//! Execution database configuration

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::database::ExecutionDatabase`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecDbConfig {
    /// Rebuild the in-memory caches from the event logs on `start()`
    pub load_caches_on_start: bool,
}

impl Default for ExecDbConfig {
    fn default() -> Self {
        Self { load_caches_on_start: true }
    }
}
