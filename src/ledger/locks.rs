//! Per-deal async lock registry.

use crate::domain::DealId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one async mutex per deal id.
///
/// Serializes vote read-modify-write cycles on the same deal while letting
/// votes on different deals proceed without contention. Locks are created on
/// first use and retained for the life of the process.
#[derive(Debug, Default)]
pub struct DealLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DealLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for a deal, creating it if this is the first use.
    pub fn lock_for(&self, deal_id: &DealId) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().expect("deal lock registry poisoned");
        map.entry(deal_id.as_str().to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
