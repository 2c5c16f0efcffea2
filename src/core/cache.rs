//! Process-wide cache of loaded models.
//!
//! Running the mask-prediction action again from the menu reuses the weights loaded
//! the first time instead of mapping the checkpoint a second time.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Trait implemented by model option types to generate a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

/// Models keyed by type and a string key (model id plus device).
///
/// Models are cheap to clone: candle tensors share their storage, so a cache hit
/// hands out a clone backed by the same weights.
pub struct ModelCache {
    cache: Arc<Mutex<CacheStorage>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached model for `key`, or awaits `loader` and caches its result.
    ///
    /// A failed load is not cached, so the next call tries again.
    pub async fn get_or_create<M, Fut, F>(&self, key: &str, loader: F) -> anyhow::Result<M>
    where
        M: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<M>>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let cache = self.cache.lock().await;
            if let Some(model) = cache
                .get(&cache_key)
                .and_then(|cached| cached.downcast_ref::<M>())
            {
                tracing::debug!(key, "model cache hit");
                return Ok(model.clone());
            }
        }

        let model = loader().await?;

        {
            let mut cache = self.cache.lock().await;
            cache.insert(cache_key, Arc::new(model.clone()) as Arc<dyn Any + Send + Sync>);
        }

        Ok(model)
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        cache.clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.lock().await;
        cache.len()
    }

    pub async fn is_empty(&self) -> bool {
        let cache = self.cache.lock().await;
        cache.is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

/// Get a reference to the global model cache.
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}
