use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-filename mutual exclusion.
///
/// Entries are dropped once no lease references them, so the map only holds
/// names with an operation in flight.
#[derive(Default)]
pub struct NameLocks {
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held locks for one operation. Released on drop.
pub struct NameLease {
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
    held: Vec<(String, OwnedMutexGuard<()>)>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every name in `names`. Names are taken in sorted order so two
    /// renames over the same pair cannot deadlock.
    pub async fn acquire(&self, names: &[&str]) -> NameLease {
        let mut sorted: Vec<&str> = names.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut held = Vec::with_capacity(sorted.len());
        for name in sorted {
            // Clone out of the map before awaiting; a shard guard must not
            // live across the lock wait.
            let slot = Arc::clone(&self.slots.entry(name.to_string()).or_default());
            let guard = slot.lock_owned().await;
            held.push((name.to_string(), guard));
        }

        NameLease {
            slots: self.slots.clone(),
            held,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for NameLease {
    fn drop(&mut self) {
        for (name, guard) in self.held.drain(..) {
            drop(guard);
            self.slots
                .remove_if(&name, |_, slot| Arc::strong_count(slot) == 1);
        }
    }
}
