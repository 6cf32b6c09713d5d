//! In-memory handoff store.

use super::{DesignHandoff, HandoffError, HandoffResult, HandoffStore};
use crate::BoxFuture;
use std::collections::HashMap;
use std::sync::RwLock;

/// Keeps handoffs for the lifetime of the process.
#[derive(Default)]
pub struct MemoryHandoffStore {
    handoffs: RwLock<HashMap<String, DesignHandoff>>,
}

impl MemoryHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> HandoffError {
    HandoffError::Other(format!("Lock error: {}", e))
}

impl HandoffStore for MemoryHandoffStore {
    fn save(&self, key: &str, handoff: &DesignHandoff) -> BoxFuture<'_, HandoffResult<()>> {
        let key = key.to_string();
        let handoff = handoff.clone();
        Box::pin(async move {
            self.handoffs.write().map_err(lock_error)?.insert(key, handoff);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, HandoffResult<DesignHandoff>> {
        let key = key.to_string();
        Box::pin(async move {
            let handoffs = self.handoffs.read().map_err(lock_error)?;
            handoffs
                .get(&key)
                .cloned()
                .ok_or(HandoffError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, HandoffResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.handoffs.write().map_err(lock_error)?.remove(&key);
            Ok(())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, HandoffResult<bool>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.handoffs.read().map_err(lock_error)?.contains_key(&key)) })
    }
}
