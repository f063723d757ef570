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

//! Tables whose file metadata can be inspected.

use std::collections::HashMap;
use std::sync::Arc;

use crate::inspect::MetadataTable;
use crate::io::ManifestLoaderRef;
use crate::io::object_cache::{CacheMetrics, CacheStats, ObjectCache, ObjectCacheConfig};
use crate::scan::DataFileScanBuilder;
use crate::spec::{SchemaRef, TableMetadata, TableMetadataRef, TableProperties};
use crate::{Error, ErrorKind, Result};

/// Assembles a [`Table`] from a loader and parsed metadata.
pub struct TableBuilder {
    loader: Option<ManifestLoaderRef>,
    metadata: Option<TableMetadataRef>,
    disable_cache: bool,
    cache_size_bytes: Option<u64>,
}

impl TableBuilder {
    pub(crate) fn new() -> Self {
        Self {
            loader: None,
            metadata: None,
            disable_cache: false,
            cache_size_bytes: None,
        }
    }

    /// Loader that reads manifest lists and manifests. Required.
    pub fn loader(mut self, loader: ManifestLoaderRef) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Metadata of the table. Required.
    pub fn metadata<T: Into<TableMetadataRef>>(mut self, metadata: T) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Reads every manifest through the loader, whatever the table properties say.
    pub fn disable_cache(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    /// Overrides the manifest cache capacity in estimated bytes.
    pub fn cache_size_bytes(mut self, cache_size_bytes: u64) -> Self {
        self.cache_size_bytes = Some(cache_size_bytes);
        self
    }

    /// Parses the table properties and sets up the manifest cache.
    ///
    /// Cache settings on the builder win over the cache properties of the
    /// table.
    pub fn build(self) -> Result<Table> {
        let Self {
            loader,
            metadata,
            disable_cache,
            cache_size_bytes,
        } = self;

        let Some(loader) = loader else {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                "ManifestLoader must be provided with TableBuilder.loader()",
            ));
        };

        let Some(metadata) = metadata else {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                "TableMetadataRef must be provided with TableBuilder.metadata()",
            ));
        };

        let properties = TableProperties::try_from(metadata.properties())?;

        let mut cache_config = ObjectCacheConfig::from(&properties);
        if disable_cache {
            cache_config.enabled = false;
        }
        if let Some(cache_size_bytes) = cache_size_bytes {
            cache_config.max_total_bytes = cache_size_bytes;
        }
        let object_cache = Arc::new(ObjectCache::new(loader, &cache_config));

        Ok(Table {
            metadata,
            properties,
            object_cache,
        })
    }
}

/// An Iceberg table whose file metadata can be scanned.
#[derive(Debug, Clone)]
pub struct Table {
    metadata: TableMetadataRef,
    properties: TableProperties,
    object_cache: Arc<ObjectCache>,
}

impl Table {
    /// Starts building a table.
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// Table metadata.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Shared handle to the table metadata.
    pub fn metadata_ref(&self) -> TableMetadataRef {
        self.metadata.clone()
    }

    pub(crate) fn object_cache(&self) -> Arc<ObjectCache> {
        self.object_cache.clone()
    }

    /// Occupancy of the manifest cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.object_cache.stats()
    }

    /// Lookup counters of the manifest cache.
    pub fn cache_metrics(&self) -> CacheMetrics {
        self.object_cache.metrics()
    }

    /// Creates a scan over the files tracked by this table.
    pub fn data_file_scan(&self) -> DataFileScanBuilder<'_> {
        DataFileScanBuilder::new(self)
    }

    /// Entry point to the files metadata tables.
    pub fn inspect(&self) -> MetadataTable<'_> {
        MetadataTable::new(self)
    }

    /// Current schema of the table.
    pub fn current_schema_ref(&self) -> SchemaRef {
        self.metadata.current_schema().clone()
    }

    /// Raw table properties.
    pub fn properties(&self) -> &HashMap<String, String> {
        self.metadata.properties()
    }

    /// Returns the parsed properties that control metadata table reads.
    pub fn table_properties(&self) -> &TableProperties {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryManifestLoader;
    use crate::scan::tests::test_schema;
    use crate::spec::FormatVersion;

    fn metadata(properties: HashMap<String, String>) -> TableMetadata {
        TableMetadata::builder()
            .format_version(FormatVersion::V2)
            .location("memory://t")
            .add_schema(test_schema())
            .current_schema_id(0)
            .properties(properties)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_loader_and_metadata() {
        let err = Table::builder()
            .metadata(metadata(HashMap::new()))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);

        let err = Table::builder()
            .loader(Arc::new(MemoryManifestLoader::new()))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
    }

    #[test]
    fn test_cache_configuration_precedence() {
        let properties = HashMap::from([
            (
                TableProperties::PROPERTY_MANIFEST_CACHE_ENABLED.to_string(),
                "true".to_string(),
            ),
            (
                TableProperties::PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES.to_string(),
                "1024".to_string(),
            ),
        ]);

        let table = Table::builder()
            .loader(Arc::new(MemoryManifestLoader::new()))
            .metadata(metadata(properties.clone()))
            .build()
            .unwrap();
        assert!(table.cache_stats().enabled);
        assert_eq!(table.cache_stats().max_capacity, 1024);

        let table = Table::builder()
            .loader(Arc::new(MemoryManifestLoader::new()))
            .metadata(metadata(properties.clone()))
            .cache_size_bytes(4096)
            .build()
            .unwrap();
        assert_eq!(table.cache_stats().max_capacity, 4096);

        let table = Table::builder()
            .loader(Arc::new(MemoryManifestLoader::new()))
            .metadata(metadata(properties))
            .disable_cache()
            .build()
            .unwrap();
        assert!(!table.cache_stats().enabled);
    }

    #[test]
    fn test_invalid_batch_size_property() {
        let properties = HashMap::from([(
            TableProperties::PROPERTY_METADATA_TABLE_BATCH_SIZE.to_string(),
            "lots".to_string(),
        )]);
        let err = Table::builder()
            .loader(Arc::new(MemoryManifestLoader::new()))
            .metadata(metadata(properties))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
    }
}
