use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::source::AssetLoader;

pub type AssetBytes = Arc<Vec<u8>>;

type Slot = Arc<OnceCell<Option<AssetBytes>>>;

/// Process-wide memo of asset bytes keyed by URL or logical name.
///
/// Each key is resolved at most once: concurrent `get`s for the same
/// uncached key share a single load, and failures are remembered as `None`
/// so they are never retried.
pub struct AssetCache {
    loader: AssetLoader,
    slots: Mutex<HashMap<String, Slot>>,
}

impl AssetCache {
    pub fn new(loader: AssetLoader) -> Self {
        Self {
            loader,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Resolve `key`, loading it on first use
    pub async fn get(&self, key: &str) -> Option<AssetBytes> {
        let slot = self.slot(key);
        slot.get_or_init(|| async {
            match self.loader.load(key).await {
                Ok(bytes) => {
                    debug!("Cached asset {} ({} bytes)", key, bytes.len());
                    Some(Arc::new(bytes))
                }
                Err(e) => {
                    warn!("Asset {} unavailable: {}", key, e);
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Resolved state of `key` without loading: `None` when not yet
    /// resolved, `Some(None)` for a cached failure
    pub fn peek(&self, key: &str) -> Option<Option<AssetBytes>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Seed an entry directly. Has no effect if `key` is already resolved.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        let slot = self.slot(key);
        let _ = slot.set(Some(Arc::new(bytes)));
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve every key with at most `concurrency` loads in flight.
    /// Returns how many keys resolved to bytes.
    pub async fn prefetch(self: &Arc<Self>, keys: &[String], concurrency: usize) -> usize {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for key in keys {
            let cache = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let key = key.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                cache.get(&key).await
            });
        }

        let mut resolved = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Some(_)) => resolved += 1,
                Ok(None) => {}
                Err(e) => warn!("Prefetch task failed: {}", e),
            }
        }
        resolved
    }

    /// Owned copy of the resolved bytes for `keys`
    pub fn snapshot<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> ResolvedAssets {
        let entries = keys
            .into_iter()
            .filter_map(|key| match self.peek(key) {
                Some(Some(bytes)) => Some((key.clone(), bytes)),
                _ => None,
            })
            .collect();
        ResolvedAssets { entries }
    }
}

/// Assets available to one synchronous layout pass
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    entries: HashMap<String, AssetBytes>,
}

impl ResolvedAssets {
    pub fn get(&self, key: &str) -> Option<&AssetBytes> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(key.into(), Arc::new(bytes));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
