use super::ChunkTable;
use crate::config::DbConfig;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Memoization store for chunk tables, keyed by [`cache_key`](super::cache_key).
///
/// Entries are never invalidated by the planner; a store may expire or evict
/// them on its own.
pub trait ChunkStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Option<ChunkTable>> + Send;

    fn set(&self, key: &str, table: ChunkTable) -> impl Future<Output = ()> + Send;
}

/// In-process chunk table store.
///
/// Unbounded by default. With a capacity it keeps the most recently used
/// tables; a capacity of zero caches nothing.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    inner: Mutex<Recency>,
}

/// Tables plus their keys from least to most recently used.
///
/// `order` holds exactly the keys of `tables`.
#[derive(Debug, Default)]
struct Recency {
    capacity: Option<usize>,
    tables: HashMap<String, ChunkTable>,
    order: VecDeque<String>,
}

impl MemoryChunkStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding at most `capacity` tables.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Recency {
                capacity: Some(capacity),
                ..Recency::default()
            }),
        }
    }

    /// Create a store sized by [`DbConfig::chunk_cache_capacity`].
    pub fn from_config(config: &DbConfig) -> Self {
        config
            .chunk_cache_capacity
            .map_or_else(Self::new, Self::with_capacity)
    }

    pub fn len(&self) -> usize {
        self.lock().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the table cached for `key`.
    pub fn remove(&self, key: &str) -> Option<ChunkTable> {
        let mut inner = self.lock();
        let removed = inner.tables.remove(key)?;
        inner.forget(key);
        Some(removed)
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.tables.clear();
        inner.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Recency> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChunkStore for MemoryChunkStore {
    async fn get(&self, key: &str) -> Option<ChunkTable> {
        let mut inner = self.lock();
        let table = Arc::clone(inner.tables.get(key)?);
        inner.promote(key);
        Some(table)
    }

    async fn set(&self, key: &str, table: ChunkTable) {
        self.lock().insert(key, table);
    }
}

impl Recency {
    fn forget(&mut self, key: &str) {
        self.order.retain(|k| k.as_str() != key);
    }

    fn promote(&mut self, key: &str) {
        self.forget(key);
        self.order.push_back(key.to_owned());
    }

    fn insert(&mut self, key: &str, table: ChunkTable) {
        if self.capacity == Some(0) {
            return;
        }
        self.tables.insert(key.to_owned(), table);
        self.promote(key);

        let Some(capacity) = self.capacity else {
            return;
        };
        let excess = self.order.len().saturating_sub(capacity);
        for stale in self.order.drain(..excess) {
            self.tables.remove(&stale);
            tracing::trace!(target: "sqlchunk.chunk", key = %stale, "evicted chunk table");
        }
    }
}
