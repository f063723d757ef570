// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Cache of parsed manifest lists and manifests.
//!
//! Scans of the all-snapshots tables visit the same immutable manifests from
//! many snapshots, and repeated scans of one table visit them again. The
//! [`ObjectCache`] keeps the parsed objects keyed by path, weighted by a
//! rough estimate of their in-memory size.
//!
//! It is configured from the `iceberg.io.manifest.cache*` table properties
//! (see [`TableProperties`]), which [`TableBuilder`](crate::table::TableBuilder)
//! settings override.
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! use iceberg_files::io::object_cache::ObjectCacheConfig;
//! use iceberg_files::spec::TableProperties;
//!
//! let props = HashMap::from([(
//!     TableProperties::PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS.to_string(),
//!     "60000".to_string(),
//! )]);
//! let config = ObjectCacheConfig::from(&TableProperties::try_from(&props).unwrap());
//! assert!(config.enabled);
//! assert_eq!(config.time_to_live, Some(Duration::from_secs(60)));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use super::ManifestLoaderRef;
use crate::spec::{Manifest, ManifestFile, ManifestList, Snapshot, TableProperties};
use crate::{Error, ErrorKind, Result};

/// Resolved settings of an [`ObjectCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCacheConfig {
    /// Whether anything is cached at all.
    pub enabled: bool,
    /// Weighted capacity in estimated bytes. Zero disables the cache.
    pub max_total_bytes: u64,
    /// How long an entry lives after insertion; `None` keeps it until evicted.
    pub time_to_live: Option<Duration>,
}

impl Default for ObjectCacheConfig {
    fn default() -> Self {
        Self::from(&TableProperties::default())
    }
}

impl From<&TableProperties> for ObjectCacheConfig {
    fn from(properties: &TableProperties) -> Self {
        let ttl_ms = properties.manifest_cache_expiration_interval_ms;
        Self {
            enabled: properties.manifest_cache_enabled,
            max_total_bytes: properties.manifest_cache_max_total_bytes,
            time_to_live: (ttl_ms > 0).then(|| Duration::from_millis(ttl_ms)),
        }
    }
}

/// Point-in-time view of the cache's occupancy.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of entries currently held.
    pub entry_count: u64,
    /// Sum of the entries' estimated sizes.
    pub weighted_size: u64,
    /// Capacity in estimated bytes.
    pub max_capacity: u64,
    /// Whether the cache is enabled.
    pub enabled: bool,
}

impl CacheStats {
    /// Fraction of the capacity in use, 0.0 when disabled.
    pub fn utilization(&self) -> f64 {
        if !self.enabled || self.max_capacity == 0 {
            return 0.0;
        }
        self.weighted_size as f64 / self.max_capacity as f64
    }
}

/// Lookup counters since the cache was created.
///
/// A disabled cache counts every lookup as a miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the loader.
    pub misses: u64,
    /// Objects the loader returned successfully.
    pub loads: u64,
}

impl CacheMetrics {
    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn read(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
enum CacheKey {
    ManifestList(String),
    Manifest(String),
}

#[derive(Clone, Debug)]
enum CachedItem {
    ManifestList(Arc<ManifestList>),
    Manifest(Arc<Manifest>),
}

impl CachedItem {
    /// Rough in-memory size. Manifest entries dominate, and their column
    /// statistics dominate the entries.
    fn weight(&self) -> u32 {
        const LIST_ENTRY: usize = 256;
        const MANIFEST_ENTRY: usize = 512;
        const STAT: usize = 24;

        let bytes = match self {
            CachedItem::ManifestList(list) => 64 + list.entries().len() * LIST_ENTRY,
            CachedItem::Manifest(manifest) => manifest
                .entries()
                .iter()
                .map(|entry| {
                    let file = &entry.data_file;
                    let stats = file.column_sizes().map_or(0, |m| m.len())
                        + file.value_counts().map_or(0, |m| m.len())
                        + file.null_value_counts().map_or(0, |m| m.len())
                        + file.nan_value_counts().map_or(0, |m| m.len())
                        + file.lower_bounds().map_or(0, |m| m.len())
                        + file.upper_bounds().map_or(0, |m| m.len());
                    MANIFEST_ENTRY + stats * STAT
                })
                .fold(256, usize::saturating_add),
        };
        u32::try_from(bytes).unwrap_or(u32::MAX)
    }
}

/// Caches manifest lists and manifests read through a [`ManifestLoader`].
///
/// Entries are evicted least-recently-used first once the weighted capacity
/// is reached. Concurrent lookups of the same missing key share one load.
///
/// [`ManifestLoader`]: super::ManifestLoader
#[derive(Clone, Debug)]
pub struct ObjectCache {
    loader: ManifestLoaderRef,
    cache: Option<Cache<CacheKey, CachedItem>>,
    counters: Arc<Counters>,
}

impl ObjectCache {
    /// Creates a cache in front of `loader`.
    pub fn new(loader: ManifestLoaderRef, config: &ObjectCacheConfig) -> Self {
        let cache = (config.enabled && config.max_total_bytes > 0).then(|| {
            let mut builder = Cache::builder()
                .eviction_policy(EvictionPolicy::lru())
                .weigher(|_, item: &CachedItem| item.weight())
                .max_capacity(config.max_total_bytes);
            if let Some(ttl) = config.time_to_live {
                builder = builder.time_to_live(ttl);
            }
            builder.build()
        });

        Self {
            loader,
            cache,
            counters: Arc::default(),
        }
    }

    /// Creates a pass-through cache that always calls the loader.
    pub fn disabled(loader: ManifestLoaderRef) -> Self {
        Self {
            loader,
            cache: None,
            counters: Arc::default(),
        }
    }

    /// Whether lookups can be answered from memory.
    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Current occupancy.
    pub fn stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => CacheStats {
                entry_count: cache.entry_count(),
                weighted_size: cache.weighted_size(),
                max_capacity: cache.policy().max_capacity().unwrap_or(0),
                enabled: true,
            },
            None => CacheStats::default(),
        }
    }

    /// Lookup counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.counters.read()
    }

    /// Returns the manifest list of `snapshot`, loading it on a miss.
    pub(crate) async fn get_manifest_list(&self, snapshot: &Snapshot) -> Result<Arc<ManifestList>> {
        let key = CacheKey::ManifestList(snapshot.manifest_list().to_string());
        let load = async {
            let list = self.loader.load_manifest_list(snapshot).await?;
            Ok(CachedItem::ManifestList(Arc::new(list)))
        };

        match self.get_or_load(key, load).await? {
            CachedItem::ManifestList(list) => Ok(list),
            CachedItem::Manifest(_) => Err(mismatched_entry(snapshot.manifest_list())),
        }
    }

    /// Returns the manifest `manifest_file` points to, loading it on a miss.
    pub(crate) async fn get_manifest(&self, manifest_file: &ManifestFile) -> Result<Arc<Manifest>> {
        let key = CacheKey::Manifest(manifest_file.manifest_path.clone());
        let load = async {
            let manifest = self.loader.load_manifest(manifest_file).await?;
            Ok(CachedItem::Manifest(Arc::new(manifest)))
        };

        match self.get_or_load(key, load).await? {
            CachedItem::Manifest(manifest) => Ok(manifest),
            CachedItem::ManifestList(_) => Err(mismatched_entry(&manifest_file.manifest_path)),
        }
    }

    async fn get_or_load(
        &self,
        key: CacheKey,
        load: impl Future<Output = Result<CachedItem>>,
    ) -> Result<CachedItem> {
        let counted_load = async {
            let item = load.await?;
            Counters::bump(&self.counters.loads);
            Ok(item)
        };

        let Some(cache) = &self.cache else {
            Counters::bump(&self.counters.misses);
            return counted_load.await;
        };

        let entry = cache
            .entry_by_ref(&key)
            .or_try_insert_with(counted_load)
            .await
            .map_err(|err: Arc<Error>| {
                // Only shared when another lookup awaited the same failed load.
                Arc::try_unwrap(err).unwrap_or_else(|shared| {
                    Error::new(shared.kind(), shared.message().to_string())
                        .with_context("key", format!("{key:?}"))
                })
            })?;

        if entry.is_fresh() {
            Counters::bump(&self.counters.misses);
            tracing::trace!(?key, "manifest cache miss");
        } else {
            Counters::bump(&self.counters.hits);
            tracing::trace!(?key, "manifest cache hit");
        }
        Ok(entry.into_value())
    }
}

fn mismatched_entry(path: &str) -> Error {
    Error::new(
        ErrorKind::Unexpected,
        "Cached object does not match the requested kind",
    )
    .with_context("path", path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::io::MemoryManifestLoader;
    use crate::spec::{
        DataFileBuilder, DataFileFormat, ManifestContentType, ManifestEntry, ManifestStatus,
    };

    struct CacheFixture {
        loader: Arc<MemoryManifestLoader>,
        snapshot: Snapshot,
        manifest_files: Vec<ManifestFile>,
    }

    impl CacheFixture {
        fn new(manifest_count: usize) -> Self {
            let loader = Arc::new(MemoryManifestLoader::new());
            let manifest_files: Vec<ManifestFile> = (0..manifest_count)
                .map(|idx| {
                    ManifestFile::builder()
                        .manifest_path(format!("memory://metadata/manifest_{idx}.avro"))
                        .added_snapshot_id(1)
                        .build()
                })
                .collect();

            for (idx, manifest_file) in manifest_files.iter().enumerate() {
                let data_file = DataFileBuilder::default()
                    .file_path(format!("memory://data/{idx}.parquet"))
                    .file_format(DataFileFormat::Parquet)
                    .file_size_in_bytes(100)
                    .record_count(1)
                    .build()
                    .unwrap();
                loader.add_manifest(
                    manifest_file.manifest_path.clone(),
                    Manifest::new(ManifestContentType::Data, vec![
                        ManifestEntry::builder()
                            .status(ManifestStatus::Added)
                            .data_file(data_file)
                            .build(),
                    ]),
                );
            }
            loader.add_manifest_list(
                "memory://metadata/snap-1.avro",
                ManifestList::new(manifest_files.clone()),
            );

            let snapshot = Snapshot::builder()
                .snapshot_id(1)
                .timestamp_ms(0)
                .manifest_list("memory://metadata/snap-1.avro")
                .build();

            Self {
                loader,
                snapshot,
                manifest_files,
            }
        }

        fn cache(&self, config: &ObjectCacheConfig) -> ObjectCache {
            ObjectCache::new(self.loader.clone(), config)
        }
    }

    #[tokio::test]
    async fn test_disabled_cache_always_loads() {
        let fixture = CacheFixture::new(1);
        let object_cache = ObjectCache::disabled(fixture.loader.clone());
        assert!(!object_cache.is_enabled());

        for _ in 0..2 {
            let list = object_cache
                .get_manifest_list(&fixture.snapshot)
                .await
                .unwrap();
            assert_eq!(list.entries().len(), 1);
        }
        let manifest = object_cache
            .get_manifest(&fixture.manifest_files[0])
            .await
            .unwrap();
        assert_eq!(manifest.entries()[0].file_path(), "memory://data/0.parquet");

        assert_eq!(fixture.loader.manifest_list_load_count(), 2);
        assert_eq!(object_cache.metrics(), CacheMetrics {
            hits: 0,
            misses: 3,
            loads: 3,
        });
        assert_eq!(object_cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_repeated_lookups_hit_the_cache() {
        let fixture = CacheFixture::new(1);
        let object_cache = fixture.cache(&ObjectCacheConfig::default());

        for _ in 0..2 {
            object_cache
                .get_manifest_list(&fixture.snapshot)
                .await
                .unwrap();
            object_cache
                .get_manifest(&fixture.manifest_files[0])
                .await
                .unwrap();
        }

        assert_eq!(fixture.loader.manifest_list_load_count(), 1);
        assert_eq!(fixture.loader.manifest_load_count(), 1);
        let metrics = object_cache.metrics();
        assert_eq!(metrics, CacheMetrics {
            hits: 2,
            misses: 2,
            loads: 2,
        });
        assert_eq!(metrics.hit_rate(), 0.5);

        let cache = object_cache.cache.as_ref().unwrap();
        cache.run_pending_tasks().await;
        let stats = object_cache.stats();
        assert_eq!(stats.entry_count, 2);
        assert!(stats.utilization() > 0.0);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let fixture = CacheFixture::new(0);
        let object_cache = fixture.cache(&ObjectCacheConfig::default());

        let missing = ManifestFile::builder()
            .manifest_path("memory://metadata/missing.avro")
            .added_snapshot_id(1)
            .build();
        for _ in 0..2 {
            let err = object_cache.get_manifest(&missing).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unexpected);
            assert!(err.to_string().contains("memory://metadata/missing.avro"));
        }
        assert_eq!(fixture.loader.manifest_load_count(), 0);
        assert_eq!(object_cache.metrics().loads, 0);
    }

    #[tokio::test]
    async fn test_least_recently_used_entry_is_evicted() {
        let fixture = CacheFixture::new(2);
        // Room for one single-entry manifest (256 + 512 bytes).
        let object_cache = fixture.cache(&ObjectCacheConfig {
            enabled: true,
            max_total_bytes: 1_000,
            time_to_live: None,
        });
        let cache = object_cache.cache.clone().unwrap();
        let first = CacheKey::Manifest(fixture.manifest_files[0].manifest_path.clone());
        let second = CacheKey::Manifest(fixture.manifest_files[1].manifest_path.clone());

        object_cache
            .get_manifest(&fixture.manifest_files[0])
            .await
            .unwrap();
        cache.run_pending_tasks().await;
        assert!(cache.contains_key(&first));

        object_cache
            .get_manifest(&fixture.manifest_files[1])
            .await
            .unwrap();
        cache.run_pending_tasks().await;
        assert!(!cache.contains_key(&first));
        assert!(cache.contains_key(&second));
    }

    #[test]
    fn test_config_from_table_properties() {
        assert_eq!(ObjectCacheConfig::default(), ObjectCacheConfig {
            enabled: true,
            max_total_bytes: 32 * 1024 * 1024,
            time_to_live: Some(Duration::from_secs(300)),
        });

        let props = HashMap::from([
            (
                TableProperties::PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES.to_string(),
                "0".to_string(),
            ),
            (
                TableProperties::PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS.to_string(),
                "0".to_string(),
            ),
        ]);
        let config = ObjectCacheConfig::from(&TableProperties::try_from(&props).unwrap());
        assert_eq!(config.time_to_live, None);

        let object_cache = ObjectCache::new(Arc::new(MemoryManifestLoader::new()), &config);
        assert!(!object_cache.is_enabled());
    }

    #[test]
    fn test_cache_stats_utilization() {
        let stats = CacheStats {
            entry_count: 10,
            weighted_size: 50,
            max_capacity: 100,
            enabled: true,
        };
        assert_eq!(stats.utilization(), 0.5);
        assert_eq!(
            CacheStats {
                enabled: false,
                ..stats
            }
            .utilization(),
            0.0
        );
    }
}
