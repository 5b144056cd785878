//! Keyed Mutual Exclusion
//!
//! One async mutex per entity id, created on first use. The ledger holds a
//! wallet's lock across balance-check + debit + holding mutation so two
//! operations on the same wallet can never interleave a double-spend;
//! the order book holds a token's lock across an evaluation pass so two
//! concurrent ticks cannot double-trigger one order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting if another task holds it.
    pub async fn acquire(&self, key: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
