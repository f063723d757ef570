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

//! Scanning the files tracked by a table's metadata.
//!
//! A [`DataFileScan`] walks manifest lists and manifests and yields the
//! [`DataFile`] records they reference, without touching the data files
//! themselves.
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use iceberg_files::scan::{FileContentFilter, SnapshotScope};
//!
//! let files = table
//!     .data_file_scan()
//!     .scope(SnapshotScope::All)
//!     .content(FileContentFilter::Deletes)
//!     .build()?
//!     .plan_files()
//!     .await?
//!     .try_collect::<Vec<_>>()
//!     .await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use arrow_array::RecordBatch;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt, stream};

use crate::io::object_cache::ObjectCache;
use crate::spec::{DataFile, ManifestContentType, ManifestFile, SnapshotRef};
use crate::table::Table;
use crate::{Error, ErrorKind, Result};

/// A stream of arrow [`RecordBatch`]es.
pub type ArrowRecordBatchStream = BoxStream<'static, Result<RecordBatch>>;

/// A stream of [`DataFile`] records.
pub type DataFileStream = BoxStream<'static, Result<DataFile>>;

/// Which snapshots a [`DataFileScan`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotScope {
    /// Files reachable from the current snapshot, or from the snapshot chosen
    /// with [`DataFileScanBuilder::snapshot_id`].
    #[default]
    Current,
    /// Files reachable from any snapshot still retained in table metadata.
    All,
}

/// Which kind of manifests a [`DataFileScan`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileContentFilter {
    /// Data and delete manifests.
    #[default]
    All,
    /// Data manifests only.
    Data,
    /// Delete manifests only.
    Deletes,
}

impl FileContentFilter {
    /// Whether manifests with the given content are read.
    pub fn accepts(&self, content: ManifestContentType) -> bool {
        match self {
            FileContentFilter::All => true,
            FileContentFilter::Data => content == ManifestContentType::Data,
            FileContentFilter::Deletes => content == ManifestContentType::Deletes,
        }
    }
}

/// Builder to create a [`DataFileScan`].
pub struct DataFileScanBuilder<'a> {
    table: &'a Table,
    scope: SnapshotScope,
    content: FileContentFilter,
    snapshot_id: Option<i64>,
    include_column_stats: bool,
}

impl<'a> DataFileScanBuilder<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        Self {
            table,
            scope: SnapshotScope::Current,
            content: FileContentFilter::All,
            snapshot_id: None,
            include_column_stats: false,
        }
    }

    /// Selects which snapshots are read.
    pub fn scope(mut self, scope: SnapshotScope) -> Self {
        self.scope = scope;
        self
    }

    /// Selects which manifests are read.
    pub fn content(mut self, content: FileContentFilter) -> Self {
        self.content = content;
        self
    }

    /// Reads the given snapshot instead of the current one. Only valid with
    /// [`SnapshotScope::Current`].
    pub fn snapshot_id(mut self, snapshot_id: i64) -> Self {
        self.snapshot_id = Some(snapshot_id);
        self
    }

    /// Keeps column statistics on the emitted records. Without it the six
    /// statistics maps are dropped as soon as a record is read.
    pub fn include_column_stats(mut self) -> Self {
        self.include_column_stats = true;
        self
    }

    /// Resolves the snapshots to read.
    pub fn build(self) -> Result<DataFileScan> {
        let metadata = self.table.metadata();

        let snapshots: Vec<SnapshotRef> = match (self.scope, self.snapshot_id) {
            (SnapshotScope::Current, Some(snapshot_id)) => {
                let snapshot = metadata.snapshot_by_id(snapshot_id).ok_or_else(|| {
                    Error::new(
                        ErrorKind::DataInvalid,
                        format!("Snapshot with id {snapshot_id} not found"),
                    )
                })?;
                vec![snapshot.clone()]
            }
            (SnapshotScope::Current, None) => {
                metadata.current_snapshot().cloned().into_iter().collect()
            }
            (SnapshotScope::All, Some(snapshot_id)) => {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    "A snapshot id cannot be combined with the all-snapshots scope",
                )
                .with_context("snapshot_id", snapshot_id.to_string()));
            }
            (SnapshotScope::All, None) => {
                let mut snapshots: Vec<SnapshotRef> = metadata.snapshots().cloned().collect();
                snapshots
                    .sort_by_key(|snapshot| (snapshot.sequence_number(), snapshot.snapshot_id()));
                snapshots
            }
        };

        Ok(DataFileScan {
            object_cache: self.table.object_cache(),
            snapshots,
            scope: self.scope,
            content: self.content,
            include_column_stats: self.include_column_stats,
        })
    }
}

/// A scan over the files tracked by one or more snapshots.
#[derive(Debug)]
pub struct DataFileScan {
    object_cache: Arc<ObjectCache>,
    snapshots: Vec<SnapshotRef>,
    scope: SnapshotScope,
    content: FileContentFilter,
    include_column_stats: bool,
}

impl DataFileScan {
    /// Snapshots this scan reads, oldest first.
    pub fn snapshots(&self) -> &[SnapshotRef] {
        &self.snapshots
    }

    /// Loads the manifest lists and returns a stream of the live files they
    /// reference. Manifests are loaded as the stream is polled.
    ///
    /// Entries marked deleted are skipped. A manifest shared by several
    /// snapshots is read once, but the same file may still be emitted more
    /// than once when different manifests track it.
    pub async fn plan_files(self) -> Result<DataFileStream> {
        let mut seen_manifests = HashSet::new();
        let mut manifest_files: Vec<ManifestFile> = Vec::new();

        for snapshot in &self.snapshots {
            let manifest_list = self.object_cache.get_manifest_list(snapshot).await?;
            for manifest_file in manifest_list.entries() {
                if !self.content.accepts(manifest_file.content) {
                    continue;
                }
                if self.scope == SnapshotScope::All
                    && !seen_manifests.insert(manifest_file.manifest_path.clone())
                {
                    continue;
                }
                manifest_files.push(manifest_file.clone());
            }
        }

        tracing::debug!(
            scope = ?self.scope,
            content = ?self.content,
            snapshots = self.snapshots.len(),
            manifests = manifest_files.len(),
            "planned data file scan"
        );

        let object_cache = self.object_cache;
        let include_column_stats = self.include_column_stats;

        let stream = stream::iter(manifest_files)
            .then(move |manifest_file| {
                let object_cache = object_cache.clone();
                async move { object_cache.get_manifest(&manifest_file).await }
            })
            .map_ok(move |manifest| {
                let files: Vec<Result<DataFile>> = manifest
                    .entries()
                    .iter()
                    .filter(|entry| entry.is_alive())
                    .map(|entry| {
                        let mut data_file = entry.data_file.clone();
                        if !include_column_stats {
                            data_file.strip_column_stats();
                        }
                        Ok(data_file)
                    })
                    .collect();
                stream::iter(files)
            })
            .try_flatten()
            .boxed();

        Ok(stream)
    }
}
