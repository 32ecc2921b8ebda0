//! In-process cache for reference-table lookups. Search results never go
//! through here.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::{LookupItem, LookupKind};

/// One cached list: a whole table, or the children of one parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub kind: LookupKind,
    pub parent_id: Option<i32>,
}

struct CachedLookup {
    items: Arc<[LookupItem]>,
    expires_at: Instant,
    last_hit: Instant,
}

/// Lookup lists keyed by table and parent. Only non-empty results are
/// stored, so parent ids that match nothing never take up a slot and the
/// entry count stays bounded by the real reference data.
pub struct LookupCache {
    entries: DashMap<LookupKey, CachedLookup>,
    ttl: Duration,
    capacity: usize,
}

impl LookupCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &LookupKey) -> Option<Arc<[LookupItem]>> {
        let now = Instant::now();
        let mut entry = self.entries.get_mut(key)?;
        if now >= entry.expires_at {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        entry.last_hit = now;
        Some(entry.items.clone())
    }

    /// Stores `items` under `key` unless the list is empty. Returns the
    /// shared list either way.
    pub fn insert(&self, key: LookupKey, items: Vec<LookupItem>) -> Arc<[LookupItem]> {
        let items: Arc<[LookupItem]> = items.into();
        if items.is_empty() {
            return items;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.make_room();
        }

        let now = Instant::now();
        self.entries.insert(
            key,
            CachedLookup {
                items: items.clone(),
                expires_at: now + self.ttl,
                last_hit: now,
            },
        );
        items
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops expired lists; if the cache is still full, drops the list that
    /// was read least recently.
    fn make_room(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        if self.entries.len() < self.capacity {
            return;
        }

        let coldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_hit)
            .map(|entry| *entry.key());
        if let Some(key) = coldest {
            self.entries.remove(&key);
            tracing::debug!("🗑️  Lookup cache full, evicted {:?}", key);
        }
    }
}
