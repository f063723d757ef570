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

use std::collections::HashMap;

use crate::{Error, ErrorKind, Result};

// Helper function to parse a property from a HashMap
// If the property is not found, use the default value
fn parse_property<T: std::str::FromStr>(
    properties: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T>
where
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    properties.get(key).map_or(Ok(default), |value| {
        value.trim().parse::<T>().map_err(|e| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid value for {key}: {e}"),
            )
            .with_context("value", value.clone())
        })
    })
}

/// Table properties that control how metadata tables are read.
///
/// Every value is checked when the table is built, so a bad property fails
/// the table rather than a later scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProperties {
    /// Maximum number of rows per record batch produced by a metadata table scan.
    pub metadata_table_batch_size: usize,
    /// Whether parsed manifests and manifest lists are cached.
    pub manifest_cache_enabled: bool,
    /// Weighted capacity of the manifest cache, in estimated bytes.
    pub manifest_cache_max_total_bytes: u64,
    /// Time-to-live of manifest cache entries in milliseconds; 0 keeps
    /// entries until they are evicted.
    pub manifest_cache_expiration_interval_ms: u64,
}

impl TableProperties {
    /// Property key for the number of rows per metadata table record batch.
    pub const PROPERTY_METADATA_TABLE_BATCH_SIZE: &str = "read.metadata-table.batch-size";
    /// Default value for the metadata table batch size.
    pub const PROPERTY_METADATA_TABLE_BATCH_SIZE_DEFAULT: usize = 4096;

    /// Property key to enable or disable the manifest cache.
    pub const PROPERTY_MANIFEST_CACHE_ENABLED: &str = "iceberg.io.manifest.cache-enabled";
    /// Default value for the manifest cache switch.
    pub const PROPERTY_MANIFEST_CACHE_ENABLED_DEFAULT: bool = true;

    /// Property key for the manifest cache capacity in bytes.
    pub const PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES: &str =
        "iceberg.io.manifest.cache.max-total-bytes";
    /// Default manifest cache capacity: 32MB.
    pub const PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES_DEFAULT: u64 = 32 * 1024 * 1024;

    /// Property key for the manifest cache entry TTL in milliseconds.
    pub const PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS: &str =
        "iceberg.io.manifest.cache.expiration-interval-ms";
    /// Default manifest cache entry TTL: 5 minutes.
    pub const PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS_DEFAULT: u64 = 5 * 60 * 1000;
}

impl Default for TableProperties {
    fn default() -> Self {
        Self {
            metadata_table_batch_size: Self::PROPERTY_METADATA_TABLE_BATCH_SIZE_DEFAULT,
            manifest_cache_enabled: Self::PROPERTY_MANIFEST_CACHE_ENABLED_DEFAULT,
            manifest_cache_max_total_bytes: Self::PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES_DEFAULT,
            manifest_cache_expiration_interval_ms:
                Self::PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS_DEFAULT,
        }
    }
}

impl TryFrom<&HashMap<String, String>> for TableProperties {
    // parse by entry key or use default value
    type Error = Error;

    fn try_from(props: &HashMap<String, String>) -> Result<Self> {
        let metadata_table_batch_size = parse_property(
            props,
            TableProperties::PROPERTY_METADATA_TABLE_BATCH_SIZE,
            TableProperties::PROPERTY_METADATA_TABLE_BATCH_SIZE_DEFAULT,
        )?;
        ensure_data_valid!(
            metadata_table_batch_size > 0,
            "Invalid value for {}: must be positive",
            TableProperties::PROPERTY_METADATA_TABLE_BATCH_SIZE
        );

        Ok(TableProperties {
            metadata_table_batch_size,
            manifest_cache_enabled: parse_property(
                props,
                TableProperties::PROPERTY_MANIFEST_CACHE_ENABLED,
                TableProperties::PROPERTY_MANIFEST_CACHE_ENABLED_DEFAULT,
            )?,
            manifest_cache_max_total_bytes: parse_property(
                props,
                TableProperties::PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES,
                TableProperties::PROPERTY_MANIFEST_CACHE_MAX_TOTAL_BYTES_DEFAULT,
            )?,
            manifest_cache_expiration_interval_ms: parse_property(
                props,
                TableProperties::PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS,
                TableProperties::PROPERTY_MANIFEST_CACHE_EXPIRATION_INTERVAL_MS_DEFAULT,
            )?,
        })
    }
}
