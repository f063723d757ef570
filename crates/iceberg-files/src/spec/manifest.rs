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

//! Manifests, manifest lists and the data files they track.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use derive_builder::Builder;
use serde_derive::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{Error, ErrorKind, Result};

/// Content type of a data file.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum DataContentType {
    /// value: 0
    #[default]
    Data = 0,
    /// value: 1
    PositionDeletes = 1,
    /// value: 2
    EqualityDeletes = 2,
}

impl DataContentType {
    /// Whether the file holds deletes of either kind.
    pub fn is_delete(self) -> bool {
        !matches!(self, DataContentType::Data)
    }
}

impl TryFrom<i32> for DataContentType {
    type Error = Error;

    fn try_from(v: i32) -> Result<DataContentType> {
        match v {
            0 => Ok(DataContentType::Data),
            1 => Ok(DataContentType::PositionDeletes),
            2 => Ok(DataContentType::EqualityDeletes),
            _ => Err(Error::new(
                ErrorKind::DataInvalid,
                format!("data content type {v} is invalid"),
            )),
        }
    }
}

/// Format of this data.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataFileFormat {
    /// Avro file format: <https://avro.apache.org/>
    Avro,
    /// Orc file format: <https://orc.apache.org/>
    Orc,
    /// Parquet file format: <https://parquet.apache.org/>
    Parquet,
    /// Puffin file format: <https://iceberg.apache.org/puffin-spec/>
    Puffin,
}

impl FromStr for DataFileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "avro" => Ok(Self::Avro),
            "orc" => Ok(Self::Orc),
            "parquet" => Ok(Self::Parquet),
            "puffin" => Ok(Self::Puffin),
            _ => Err(Error::new(
                ErrorKind::DataInvalid,
                format!("Unsupported data file format: {s}"),
            )),
        }
    }
}

impl fmt::Display for DataFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFileFormat::Avro => write!(f, "avro"),
            DataFileFormat::Orc => write!(f, "orc"),
            DataFileFormat::Parquet => write!(f, "parquet"),
            DataFileFormat::Puffin => write!(f, "puffin"),
        }
    }
}

/// Data file carries data file path, partition tuple, metrics, …
///
/// Every statistics collection is optional: `None` means the writer did not
/// collect it, which is different from an empty collection.
#[derive(Debug, PartialEq, Clone, Eq, Builder)]
#[builder(build_fn(error = "Error"))]
pub struct DataFile {
    /// Type of content stored by the data file: data, equality deletes,
    /// or position deletes (all v1 files are data files)
    #[builder(default)]
    pub(crate) content: DataContentType,
    /// Full URI for the file with FS scheme
    #[builder(setter(into))]
    pub(crate) file_path: String,
    /// String file format name, avro, orc or parquet
    pub(crate) file_format: DataFileFormat,
    /// Number of records in this file
    pub(crate) record_count: u64,
    /// Total file size in bytes
    pub(crate) file_size_in_bytes: u64,
    /// Map from column id to the total size on disk of all regions that
    /// store the column. Does not include bytes necessary to read other
    /// columns, like footers.
    #[builder(setter(strip_option), default)]
    pub(crate) column_sizes: Option<HashMap<i32, u64>>,
    /// Map from column id to number of values in the column (including null
    /// and NaN values)
    #[builder(setter(strip_option), default)]
    pub(crate) value_counts: Option<HashMap<i32, u64>>,
    /// Map from column id to number of null values in the column
    #[builder(setter(strip_option), default)]
    pub(crate) null_value_counts: Option<HashMap<i32, u64>>,
    /// Map from column id to number of NaN values in the column
    #[builder(setter(strip_option), default)]
    pub(crate) nan_value_counts: Option<HashMap<i32, u64>>,
    /// Map from column id to lower bound in the column, serialized as binary.
    /// Each value must be less than or equal to all non-null, non-NaN values
    /// in the column for the file.
    #[builder(setter(strip_option), default)]
    pub(crate) lower_bounds: Option<HashMap<i32, Vec<u8>>>,
    /// Map from column id to upper bound in the column, serialized as binary.
    /// Each value must be greater than or equal to all non-null, non-NaN
    /// values in the column for the file.
    #[builder(setter(strip_option), default)]
    pub(crate) upper_bounds: Option<HashMap<i32, Vec<u8>>>,
    /// Implementation-specific key metadata for encryption
    #[builder(setter(strip_option), default)]
    pub(crate) key_metadata: Option<Vec<u8>>,
    /// Split offsets for the data file, in ascending order.
    #[builder(setter(strip_option), default)]
    pub(crate) split_offsets: Option<Vec<i64>>,
    /// Field ids used to determine row equality in equality delete files.
    #[builder(setter(strip_option), default)]
    pub(crate) equality_ids: Option<Vec<i32>>,
    /// ID representing sort order for this file.
    #[builder(setter(strip_option), default)]
    pub(crate) sort_order_id: Option<i32>,
    /// Partition spec id the file was written with.
    #[builder(default)]
    pub(crate) partition_spec_id: i32,
}

impl DataFile {
    /// Get the content type of the data file (data, equality deletes, or position deletes)
    pub fn content_type(&self) -> DataContentType {
        self.content
    }
    /// Get the file path as full URI with FS scheme
    pub fn file_path(&self) -> &str {
        &self.file_path
    }
    /// Get the file format of the file (avro, orc or parquet).
    pub fn file_format(&self) -> DataFileFormat {
        self.file_format
    }
    /// Get the record count in the data file.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }
    /// Get the file size in bytes.
    pub fn file_size_in_bytes(&self) -> u64 {
        self.file_size_in_bytes
    }
    /// Get the column sizes, if collected.
    pub fn column_sizes(&self) -> Option<&HashMap<i32, u64>> {
        self.column_sizes.as_ref()
    }
    /// Get the value counts, if collected.
    pub fn value_counts(&self) -> Option<&HashMap<i32, u64>> {
        self.value_counts.as_ref()
    }
    /// Get the null value counts, if collected.
    pub fn null_value_counts(&self) -> Option<&HashMap<i32, u64>> {
        self.null_value_counts.as_ref()
    }
    /// Get the nan value counts, if collected.
    pub fn nan_value_counts(&self) -> Option<&HashMap<i32, u64>> {
        self.nan_value_counts.as_ref()
    }
    /// Get the serialized lower bounds, if collected.
    pub fn lower_bounds(&self) -> Option<&HashMap<i32, Vec<u8>>> {
        self.lower_bounds.as_ref()
    }
    /// Get the serialized upper bounds, if collected.
    pub fn upper_bounds(&self) -> Option<&HashMap<i32, Vec<u8>>> {
        self.upper_bounds.as_ref()
    }
    /// Get the implementation-specific key metadata for the data file.
    pub fn key_metadata(&self) -> Option<&[u8]> {
        self.key_metadata.as_deref()
    }
    /// Get the split offsets of the data file.
    pub fn split_offsets(&self) -> Option<&[i64]> {
        self.split_offsets.as_deref()
    }
    /// Get the equality ids of the data file.
    pub fn equality_ids(&self) -> Option<&[i32]> {
        self.equality_ids.as_deref()
    }
    /// Get the sort order id of the data file.
    pub fn sort_order_id(&self) -> Option<i32> {
        self.sort_order_id
    }
    /// Get the partition spec id of the data file.
    pub fn partition_spec_id(&self) -> i32 {
        self.partition_spec_id
    }

    /// Drops the per-column statistics maps, keeping everything else.
    pub(crate) fn strip_column_stats(&mut self) {
        self.column_sizes = None;
        self.value_counts = None;
        self.null_value_counts = None;
        self.nan_value_counts = None;
        self.lower_bounds = None;
        self.upper_bounds = None;
    }
}

/// Used to track additions and deletions in ManifestEntry.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ManifestStatus {
    /// Value: 0
    Existing = 0,
    /// Value: 1
    Added = 1,
    /// Value: 2
    ///
    /// Deletes are informational only and not used in scans.
    Deleted = 2,
}

impl TryFrom<i32> for ManifestStatus {
    type Error = Error;

    fn try_from(v: i32) -> Result<ManifestStatus> {
        match v {
            0 => Ok(ManifestStatus::Existing),
            1 => Ok(ManifestStatus::Added),
            2 => Ok(ManifestStatus::Deleted),
            _ => Err(Error::new(
                ErrorKind::DataInvalid,
                format!("manifest status {v} is invalid"),
            )),
        }
    }
}

/// Reference to [`ManifestEntry`].
pub type ManifestEntryRef = Arc<ManifestEntry>;

/// A manifest is an immutable Avro file that lists data files or delete
/// files, along with each file's partition data tuple, metrics, and tracking
/// information.
#[derive(Debug, PartialEq, Eq, Clone, TypedBuilder)]
pub struct ManifestEntry {
    /// field: 0
    ///
    /// Used to track additions and deletions.
    pub status: ManifestStatus,
    /// field id: 1
    ///
    /// Snapshot id where the file was added, or deleted if status is 2.
    /// Inherited when null.
    #[builder(default, setter(strip_option))]
    pub snapshot_id: Option<i64>,
    /// field id: 3
    ///
    /// Data sequence number of the file.
    /// Inherited when null and status is 1 (added).
    #[builder(default, setter(strip_option))]
    pub sequence_number: Option<i64>,
    /// field id: 2
    ///
    /// File path, partition tuple, metrics, …
    pub data_file: DataFile,
}

impl ManifestEntry {
    /// Whether the entry is still part of the table state its snapshot describes.
    pub fn is_alive(&self) -> bool {
        matches!(
            self.status,
            ManifestStatus::Added | ManifestStatus::Existing
        )
    }

    /// Content type of this manifest entry.
    pub fn content_type(&self) -> DataContentType {
        self.data_file.content
    }

    /// File path of this manifest entry.
    pub fn file_path(&self) -> &str {
        &self.data_file.file_path
    }
}

/// A manifest contains metadata and a list of entries.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Manifest {
    content: ManifestContentType,
    entries: Vec<ManifestEntryRef>,
}

impl Manifest {
    /// Create a new manifest.
    pub fn new(content: ManifestContentType, entries: Vec<ManifestEntry>) -> Self {
        Self {
            content,
            entries: entries.into_iter().map(Arc::new).collect(),
        }
    }

    /// Kind of files tracked by this manifest.
    pub fn content(&self) -> ManifestContentType {
        self.content
    }

    /// Entries slice.
    pub fn entries(&self) -> &[ManifestEntryRef] {
        &self.entries
    }
}

/// The type of files tracked by the manifest, either data or delete files; Data(0) for all v1 manifests
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ManifestContentType {
    /// The manifest content is data.
    #[default]
    Data = 0,
    /// The manifest content is deletes.
    Deletes = 1,
}

impl fmt::Display for ManifestContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestContentType::Data => write!(f, "data"),
            ManifestContentType::Deletes => write!(f, "deletes"),
        }
    }
}

impl TryFrom<i32> for ManifestContentType {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ManifestContentType::Data),
            1 => Ok(ManifestContentType::Deletes),
            _ => Err(Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid manifest content type. Expected 0 or 1, got {value}"),
            )),
        }
    }
}

/// Entry in a manifest list.
#[derive(Debug, PartialEq, Eq, Clone, Hash, TypedBuilder)]
pub struct ManifestFile {
    /// field: 500
    ///
    /// Location of the manifest file
    #[builder(setter(into))]
    pub manifest_path: String,
    /// field: 501
    ///
    /// Length of the manifest file in bytes
    #[builder(default)]
    pub manifest_length: i64,
    /// field: 502
    ///
    /// ID of a partition spec used to write the manifest; must be listed
    /// in table metadata partition-specs
    #[builder(default)]
    pub partition_spec_id: i32,
    /// field: 517
    ///
    /// The type of files tracked by the manifest, either data or delete
    /// files; 0 for all v1 manifests
    #[builder(default)]
    pub content: ManifestContentType,
    /// field: 515
    ///
    /// The sequence number when the manifest was added to the table; use 0
    /// when reading v1 manifest lists
    #[builder(default)]
    pub sequence_number: i64,
    /// field: 503
    ///
    /// ID of the snapshot where the manifest file was added
    pub added_snapshot_id: i64,
}

/// Snapshots embed a list of manifest files, one per line of the manifest list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestList {
    entries: Vec<ManifestFile>,
}

impl ManifestList {
    /// Create a manifest list from its entries.
    pub fn new(entries: Vec<ManifestFile>) -> Self {
        Self { entries }
    }

    /// Get the entries in the manifest list.
    pub fn entries(&self) -> &[ManifestFile] {
        &self.entries
    }

    /// Take ownership of the entries in the manifest list, consuming it
    pub fn consume_entries(self) -> impl IntoIterator<Item = ManifestFile> {
        self.entries
    }
}
