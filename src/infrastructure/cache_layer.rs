// Snapshot Cache - L1 in-memory LRU over a persistent L2 backend, write-through
// Based on the multi-tier cache: reads hit L1 first, every write lands in both tiers

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, instrument};

use crate::core::PageId;
use crate::error::AppResult;
use crate::infrastructure::snapshot::CacheSnapshot;
use crate::infrastructure::traits::SnapshotBackend;

#[derive(Debug, Clone)]
pub struct SnapshotCacheConfig {
    pub l1_max_entries: usize,
}

impl Default for SnapshotCacheConfig {
    fn default() -> Self {
        Self { l1_max_entries: 256 }
    }
}

/// Page snapshot store owned by the controller and the reconciliation engine.
///
/// Reads are served from L1 when possible; every mutation is written through
/// to L2 before the next one starts.
pub struct SnapshotCache {
    l1: Mutex<LruCache<PageId, CacheSnapshot>>,
    l2: Arc<dyn SnapshotBackend>,
    write_lock: AsyncMutex<()>,
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("l1_entries", &self.l1.lock().len())
            .finish()
    }
}

impl SnapshotCache {
    pub fn new(l2: Arc<dyn SnapshotBackend>, config: SnapshotCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.l1_max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            l1: Mutex::new(LruCache::new(capacity)),
            l2,
            write_lock: AsyncMutex::new(()),
        }
    }

    /// Cache backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySnapshotBackend::new()), SnapshotCacheConfig::default())
    }

    /// L1 lookup without touching storage
    pub fn peek(&self, page_id: &PageId) -> Option<CacheSnapshot> {
        self.l1.lock().get(page_id).cloned()
    }

    /// Read a snapshot, warming L1 from L2 on a miss. Absent pages read as empty.
    #[instrument(skip(self))]
    pub async fn get(&self, page_id: &PageId) -> AppResult<CacheSnapshot> {
        if let Some(snapshot) = self.peek(page_id) {
            return Ok(snapshot);
        }

        let loaded = self.l2.load(page_id).await?.unwrap_or_default();
        debug!("L2 load for page {}", page_id);

        // Another task may have written L1 while we were loading
        let mut l1 = self.l1.lock();
        if let Some(existing) = l1.get(page_id) {
            return Ok(existing.clone());
        }
        l1.put(page_id.clone(), loaded.clone());
        Ok(loaded)
    }

    /// Replace a snapshot in both tiers
    pub async fn put(&self, page_id: &PageId, snapshot: CacheSnapshot) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.l1.lock().put(page_id.clone(), snapshot.clone());
        self.persist(page_id, &snapshot).await
    }

    /// Read-modify-write. Writers are serialized end to end, and the closure
    /// runs against L1 without suspension.
    pub async fn update<R>(&self, page_id: &PageId, f: impl FnOnce(&mut CacheSnapshot) -> R) -> AppResult<R> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.get(page_id).await?;
        let result = f(&mut snapshot);
        self.l1.lock().put(page_id.clone(), snapshot.clone());
        self.persist(page_id, &snapshot).await?;
        Ok(result)
    }

    /// Drop a page from both tiers
    #[instrument(skip(self))]
    pub async fn remove(&self, page_id: &PageId) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.l1.lock().pop(page_id);
        self.l2.remove(page_id).await
    }

    async fn persist(&self, page_id: &PageId, snapshot: &CacheSnapshot) -> AppResult<()> {
        if snapshot.is_empty() {
            self.l2.remove(page_id).await
        } else {
            self.l2.store(page_id, snapshot).await
        }
    }
}

/// In-memory L2, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemorySnapshotBackend {
    entries: RwLock<HashMap<PageId, CacheSnapshot>>,
}

impl MemorySnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SnapshotBackend for MemorySnapshotBackend {
    async fn load(&self, page_id: &PageId) -> AppResult<Option<CacheSnapshot>> {
        Ok(self.entries.read().await.get(page_id).cloned())
    }

    async fn store(&self, page_id: &PageId, snapshot: &CacheSnapshot) -> AppResult<()> {
        self.entries
            .write()
            .await
            .insert(page_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn remove(&self, page_id: &PageId) -> AppResult<()> {
        self.entries.write().await.remove(page_id);
        Ok(())
    }
}
