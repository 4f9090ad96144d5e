//! Decoded-preview cache.
//!
//! Holds decoded preview textures keyed by asset id so preload
//! completions and export share one copy of each image. LRU eviction
//! bounds memory.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::error::RenderResult;
use crate::texture::{decode_preview, TextureData};

/// Configuration for the preview cache.
#[derive(Debug, Clone)]
pub struct PreviewCacheConfig {
    /// Maximum cache size in bytes.
    pub max_size_bytes: usize,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for PreviewCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 256 * 1024 * 1024,
            max_entries: 500,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    data: TextureData,
    last_accessed: Instant,
    size_bytes: usize,
}

/// LRU cache of decoded preview textures, keyed by asset id.
#[derive(Debug)]
pub struct PreviewCache {
    entries: HashMap<String, CacheEntry>,
    config: PreviewCacheConfig,
    current_size: usize,
}

impl PreviewCache {
    /// Create a cache with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PreviewCacheConfig::default())
    }

    /// Create a cache with custom limits.
    #[must_use]
    pub fn with_config(config: PreviewCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
        }
    }

    /// Get a texture, refreshing its recency.
    pub fn get(&mut self, asset_id: &str) -> Option<&TextureData> {
        let entry = self.entries.get_mut(asset_id)?;
        entry.last_accessed = Instant::now();
        Some(&entry.data)
    }

    /// Insert a texture, evicting old entries if limits are exceeded.
    pub fn insert(&mut self, asset_id: String, data: TextureData) {
        let size_bytes = data.data.len();

        if let Some(old) = self.entries.remove(&asset_id) {
            self.current_size -= old.size_bytes;
        }
        self.evict_if_needed(size_bytes);

        self.current_size += size_bytes;
        self.entries.insert(
            asset_id,
            CacheEntry {
                data,
                last_accessed: Instant::now(),
                size_bytes,
            },
        );
    }

    /// Check if a texture is cached.
    #[must_use]
    pub fn contains(&self, asset_id: &str) -> bool {
        self.entries.contains_key(asset_id)
    }

    /// Drop all cached textures.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Number of cached textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cache size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    fn evict_if_needed(&mut self, needed_bytes: usize) {
        while self.current_size + needed_bytes > self.config.max_size_bytes
            && !self.entries.is_empty()
        {
            self.evict_lru();
        }
        while self.entries.len() >= self.config.max_entries && !self.entries.is_empty() {
            self.evict_lru();
        }
    }

    fn evict_lru(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest_key {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                tracing::debug!("evicted preview texture for {key}");
            }
        }
    }
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe preview cache shared between preload completion
/// handlers and the exporter.
#[derive(Debug, Clone, Default)]
pub struct SharedPreviewCache {
    inner: Arc<RwLock<PreviewCache>>,
}

impl SharedPreviewCache {
    /// Create a shared cache with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared cache with custom limits.
    #[must_use]
    pub fn with_config(config: PreviewCacheConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PreviewCache::with_config(config))),
        }
    }

    /// Decode fetched preview bytes and cache the texture under the
    /// asset id, returning the natural dimensions.
    ///
    /// This is the seam a preview-loader implementation calls after a
    /// successful fetch; the returned dimensions feed media sizing.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded.
    pub fn insert_decoded(&self, asset_id: &str, bytes: &[u8]) -> RenderResult<(u32, u32)> {
        let texture = decode_preview(bytes)?;
        let dims = (texture.width, texture.height);
        if let Ok(mut cache) = self.inner.write() {
            cache.insert(asset_id.to_string(), texture);
        }
        Ok(dims)
    }

    /// Get a cloned texture from the cache.
    #[must_use]
    pub fn get(&self, asset_id: &str) -> Option<TextureData> {
        let mut cache = self.inner.write().ok()?;
        cache.get(asset_id).cloned()
    }

    /// Check if a texture is cached.
    #[must_use]
    pub fn contains(&self, asset_id: &str) -> bool {
        self.inner
            .read()
            .map(|cache| cache.contains(asset_id))
            .unwrap_or(false)
    }

    /// Drop all cached textures, e.g. when the active collection
    /// changes.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.write() {
            cache.clear();
        }
    }
}
