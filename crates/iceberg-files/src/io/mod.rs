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

//! Loading of manifest lists and manifests.
//!
//! Metadata tables never touch data files. Everything they read comes through a
//! [`ManifestLoader`], which turns a snapshot into its manifest list and a
//! manifest list entry into its manifest. Decoding the on-disk Avro is the
//! loader's business; [`MemoryManifestLoader`] serves already parsed objects.
//!
//! [`ObjectCache`] sits in front of a loader and keeps parsed objects around,
//! since manifests are immutable once written.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::spec::{Manifest, ManifestFile, ManifestList, Snapshot};

mod memory;
pub use memory::MemoryManifestLoader;

pub mod object_cache;
pub use object_cache::ObjectCache;

/// Source of parsed manifest lists and manifests.
///
/// Implementations report storage failures as errors; callers propagate them
/// unchanged and never retry.
#[async_trait]
pub trait ManifestLoader: Debug + Send + Sync {
    /// Loads the manifest list a snapshot points to.
    async fn load_manifest_list(&self, snapshot: &Snapshot) -> Result<ManifestList>;

    /// Loads the manifest a manifest list entry points to.
    async fn load_manifest(&self, manifest_file: &ManifestFile) -> Result<Manifest>;
}

/// Shared reference to a [`ManifestLoader`].
pub type ManifestLoaderRef = Arc<dyn ManifestLoader>;
