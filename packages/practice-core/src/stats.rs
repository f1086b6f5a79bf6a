//! Population-wide item statistics.
//!
//! The store is the one piece of state shared across learners: every
//! submitted answer writes to it and every calibration reads from it. Each
//! item's counters sit behind their own mutex so concurrent submissions for
//! the same item never lose an increment, while the outer map lock is only
//! held long enough to find or create the entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::types::{ItemId, ItemStats};

#[derive(Debug, Default)]
pub struct ItemStatsStore {
    entries: RwLock<HashMap<ItemId, Arc<Mutex<ItemStats>>>>,
}

impl ItemStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: BTreeMap<ItemId, ItemStats>) -> Self {
        let entries = snapshot
            .into_iter()
            .map(|(id, stats)| (id, Arc::new(Mutex::new(stats))))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Current counters for `item_id`; `None` until the first response lands.
    pub fn get(&self, item_id: ItemId) -> Option<ItemStats> {
        let entry = self.entries.read().get(&item_id).cloned()?;
        let stats = *entry.lock();
        Some(stats)
    }

    /// Counts one response against `item_id`, creating the entry on first use.
    pub fn record(&self, item_id: ItemId, is_correct: bool) -> ItemStats {
        let entry = self.entry(item_id);
        let mut stats = entry.lock();
        stats.record(is_correct);
        *stats
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<ItemId, ItemStats> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| (*id, *entry.lock()))
            .collect()
    }

    fn entry(&self, item_id: ItemId) -> Arc<Mutex<ItemStats>> {
        if let Some(entry) = self.entries.read().get(&item_id) {
            return Arc::clone(entry);
        }
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(item_id).or_default())
    }
}
