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
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::ManifestLoader;
use crate::spec::{Manifest, ManifestFile, ManifestList, Snapshot};
use crate::{Error, ErrorKind, Result};

/// In-process [`ManifestLoader`] that serves manifest lists and manifests
/// registered under their paths.
///
/// Asking for a path that was never registered is a storage error, the same
/// way a missing object would be for a real file system.
#[derive(Debug, Default)]
pub struct MemoryManifestLoader {
    manifest_lists: RwLock<HashMap<String, ManifestList>>,
    manifests: RwLock<HashMap<String, Manifest>>,
    manifest_list_loads: AtomicU64,
    manifest_loads: AtomicU64,
}

impl MemoryManifestLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a manifest list under `path`, replacing any previous one.
    pub fn add_manifest_list(&self, path: impl Into<String>, manifest_list: ManifestList) {
        self.manifest_lists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), manifest_list);
    }

    /// Registers a manifest under `path`, replacing any previous one.
    pub fn add_manifest(&self, path: impl Into<String>, manifest: Manifest) {
        self.manifests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), manifest);
    }

    /// Number of manifest lists served so far.
    pub fn manifest_list_load_count(&self) -> u64 {
        self.manifest_list_loads.load(Ordering::Relaxed)
    }

    /// Number of manifests served so far.
    pub fn manifest_load_count(&self) -> u64 {
        self.manifest_loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ManifestLoader for MemoryManifestLoader {
    async fn load_manifest_list(&self, snapshot: &Snapshot) -> Result<ManifestList> {
        let manifest_list = self
            .manifest_lists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(snapshot.manifest_list())
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::Unexpected, "Manifest list not found")
                    .with_context("path", snapshot.manifest_list())
                    .with_context("snapshot_id", snapshot.snapshot_id().to_string())
            })?;
        self.manifest_list_loads.fetch_add(1, Ordering::Relaxed);
        Ok(manifest_list)
    }

    async fn load_manifest(&self, manifest_file: &ManifestFile) -> Result<Manifest> {
        let manifest = self
            .manifests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&manifest_file.manifest_path)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::Unexpected, "Manifest not found")
                    .with_context("path", manifest_file.manifest_path.clone())
            })?;
        self.manifest_loads.fetch_add(1, Ordering::Relaxed);
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ManifestContentType, ManifestList};

    #[tokio::test]
    async fn test_load_registered_objects() {
        let loader = MemoryManifestLoader::new();
        let manifest_file = ManifestFile::builder()
            .manifest_path("memory://m1.avro")
            .added_snapshot_id(1)
            .build();
        loader.add_manifest_list(
            "memory://snap-1.avro",
            ManifestList::new(vec![manifest_file.clone()]),
        );
        loader.add_manifest(
            "memory://m1.avro",
            Manifest::new(ManifestContentType::Data, vec![]),
        );

        let snapshot = Snapshot::builder()
            .snapshot_id(1)
            .timestamp_ms(0)
            .manifest_list("memory://snap-1.avro")
            .build();

        let manifest_list = loader.load_manifest_list(&snapshot).await.unwrap();
        assert_eq!(manifest_list.entries(), &[manifest_file.clone()]);
        let manifest = loader.load_manifest(&manifest_file).await.unwrap();
        assert!(manifest.entries().is_empty());

        assert_eq!(loader.manifest_list_load_count(), 1);
        assert_eq!(loader.manifest_load_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_an_error() {
        let loader = MemoryManifestLoader::new();
        let manifest_file = ManifestFile::builder()
            .manifest_path("memory://missing.avro")
            .added_snapshot_id(1)
            .build();

        let err = loader.load_manifest(&manifest_file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(err.to_string().contains("memory://missing.avro"));
        assert_eq!(loader.manifest_load_count(), 0);
    }
}
