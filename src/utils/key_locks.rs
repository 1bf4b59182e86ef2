//! Per-key async locks.
//!
//! Serializes mutations of one (rep, month) summary with its recalculation
//! so a concurrent writer can never publish totals computed from stale
//! entries. Unrelated keys proceed in parallel.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

use crate::model::SummaryKey;

type LockMap = HashMap<SummaryKey, Arc<tokio::sync::Mutex<()>>>;
type Registry = Mutex<LockMap>;

fn registry_lock(registry: &Registry) -> MutexGuard<'_, LockMap> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Guards held while mutating one or more summary keys.
///
/// Dropping releases every key and forgets the locks nobody else is
/// holding or waiting on.
pub struct KeyGuards {
    registry: Arc<Registry>,
    held: Vec<(SummaryKey, OwnedMutexGuard<()>)>,
}

impl Drop for KeyGuards {
    fn drop(&mut self) {
        let keys: Vec<SummaryKey> = std::mem::take(&mut self.held)
            .into_iter()
            .map(|(key, _guard)| key)
            .collect();
        let mut locks = registry_lock(&self.registry);
        for key in keys {
            if locks.get(&key).is_some_and(|m| Arc::strong_count(m) == 1) {
                locks.remove(&key);
            }
        }
    }
}

#[derive(Default)]
pub struct KeyLocks {
    locks: Arc<Registry>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &SummaryKey) -> Arc<tokio::sync::Mutex<()>> {
        registry_lock(&self.locks)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Lock a single key.
    pub async fn lock(&self, key: &SummaryKey) -> KeyGuards {
        self.lock_all([key]).await
    }

    /// Lock every key in `keys`, in sorted order. Duplicates are locked once.
    pub async fn lock_all<'k>(
        &self,
        keys: impl IntoIterator<Item = &'k SummaryKey>,
    ) -> KeyGuards {
        let ordered: BTreeSet<&SummaryKey> = keys.into_iter().collect();
        let mut guards = KeyGuards {
            registry: self.locks.clone(),
            held: Vec::with_capacity(ordered.len()),
        };
        for key in ordered {
            let guard = self.handle(key).lock_owned().await;
            guards.held.push((key.clone(), guard));
        }
        guards
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        registry_lock(&self.locks).len()
    }
}
