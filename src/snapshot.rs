use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tracing::{debug, info};

use crate::game_log::GameLogTable;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: Arc<GameLogTable>,
    pub loaded_at: SystemTime,
}

/// Time-boxed holder of the canonical table. The caller passes the "as of"
/// instant, so expiry is decided outside the analytical code and tests can
/// drive it without a clock.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    slot: RwLock<Option<Snapshot>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Cached snapshot if still fresh at `as_of`.
    pub fn current(&self, as_of: SystemTime) -> Option<Arc<GameLogTable>> {
        let guard = self.slot.read().unwrap_or_else(|e| e.into_inner());
        let snap = guard.as_ref()?;
        let age = as_of.duration_since(snap.loaded_at).unwrap_or(Duration::ZERO);
        (age < self.ttl).then(|| Arc::clone(&snap.table))
    }

    pub fn get_or_load(
        &self,
        as_of: SystemTime,
        loader: impl FnOnce() -> Result<GameLogTable>,
    ) -> Result<Arc<GameLogTable>> {
        if let Some(table) = self.current(as_of) {
            debug!("snapshot cache hit");
            return Ok(table);
        }
        let table = loader()?;
        info!(rows = table.len(), "snapshot reloaded");
        Ok(self.replace(table, as_of))
    }

    /// Swap in a new table. Readers holding the old `Arc` keep a complete copy.
    pub fn replace(&self, table: GameLogTable, as_of: SystemTime) -> Arc<GameLogTable> {
        let table = Arc::new(table);
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Snapshot {
            table: Arc::clone(&table),
            loaded_at: as_of,
        });
        table
    }

    pub fn invalidate(&self) {
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn reloads_only_after_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(3600));
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(GameLogTable::default())
        };

        cache.get_or_load(t0, load).unwrap();
        cache.get_or_load(t0 + Duration::from_secs(60), load).unwrap();
        assert_eq!(loads.get(), 1);
        cache.get_or_load(t0 + Duration::from_secs(3600), load).unwrap();
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn old_readers_keep_their_snapshot() {
        let cache = SnapshotCache::new(Duration::from_secs(10));
        let t0 = SystemTime::UNIX_EPOCH;
        let before = cache.replace(GameLogTable::default(), t0);
        cache.invalidate();
        assert!(cache.current(t0).is_none());
        assert!(before.is_empty());
    }
}
