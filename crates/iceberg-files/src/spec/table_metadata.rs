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

//! Defines the [table metadata](https://iceberg.apache.org/spec/#table-metadata).
//! The main struct here is [TableMetadata] which defines the data for a table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Schema, SchemaId, SchemaRef, Snapshot, SnapshotRef};
use crate::{Error, ErrorKind, Result};

use _serde::TableMetadataSerde;

/// Reference to [`TableMetadata`].
pub type TableMetadataRef = Arc<TableMetadata>;

/// Snapshot id the metadata JSON uses to say "no current snapshot".
const EMPTY_SNAPSHOT_ID: i64 = -1;

/// Iceberg format version
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub enum FormatVersion {
    /// Iceberg spec version 1
    V1 = 1,
    /// Iceberg spec version 2
    V2 = 2,
    /// Iceberg spec version 3
    V3 = 3,
}

impl TryFrom<u8> for FormatVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(FormatVersion::V1),
            2 => Ok(FormatVersion::V2),
            3 => Ok(FormatVersion::V3),
            _ => Err(Error::new(
                ErrorKind::DataInvalid,
                format!("Unsupported format version: {value}"),
            )),
        }
    }
}

impl From<FormatVersion> for u8 {
    fn from(value: FormatVersion) -> Self {
        value as u8
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

/// In-memory table metadata.
///
/// The current schema and current snapshot are checked to exist when the
/// metadata is constructed, either through the builder or from JSON.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(try_from = "TableMetadataSerde", into = "TableMetadataSerde")]
pub struct TableMetadata {
    format_version: FormatVersion,
    table_uuid: Uuid,
    location: String,
    last_updated_ms: i64,
    schemas: HashMap<SchemaId, SchemaRef>,
    current_schema_id: SchemaId,
    current_snapshot_id: Option<i64>,
    snapshots: HashMap<i64, SnapshotRef>,
    properties: HashMap<String, String>,
}

impl TableMetadata {
    /// Creates a builder for table metadata.
    pub fn builder() -> TableMetadataBuilder {
        TableMetadataBuilder::default()
    }

    /// Returns format version of this metadata.
    #[inline]
    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    /// Returns uuid of current table.
    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.table_uuid
    }

    /// Returns table location.
    #[inline]
    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Returns last updated time in milliseconds.
    #[inline]
    pub fn last_updated_ms(&self) -> i64 {
        self.last_updated_ms
    }

    /// Returns schemas
    #[inline]
    pub fn schemas_iter(&self) -> impl ExactSizeIterator<Item = &SchemaRef> {
        self.schemas.values()
    }

    /// Lookup schema by id.
    #[inline]
    pub fn schema_by_id(&self, schema_id: SchemaId) -> Option<&SchemaRef> {
        self.schemas.get(&schema_id)
    }

    /// Get current schema
    #[inline]
    pub fn current_schema(&self) -> &SchemaRef {
        // Presence of the current schema is checked when the metadata is built.
        &self.schemas[&self.current_schema_id]
    }

    /// Get the id of the current schema
    #[inline]
    pub fn current_schema_id(&self) -> SchemaId {
        self.current_schema_id
    }

    /// Returns all snapshots
    #[inline]
    pub fn snapshots(&self) -> impl ExactSizeIterator<Item = &SnapshotRef> {
        self.snapshots.values()
    }

    /// Lookup snapshot by id.
    #[inline]
    pub fn snapshot_by_id(&self, snapshot_id: i64) -> Option<&SnapshotRef> {
        self.snapshots.get(&snapshot_id)
    }

    /// Get current snapshot id
    #[inline]
    pub fn current_snapshot_id(&self) -> Option<i64> {
        self.current_snapshot_id
    }

    /// Get current snapshot
    #[inline]
    pub fn current_snapshot(&self) -> Option<&SnapshotRef> {
        self.current_snapshot_id
            .and_then(|snapshot_id| self.snapshots.get(&snapshot_id))
    }

    /// Returns properties of table.
    #[inline]
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

/// Builds [`TableMetadata`] in memory, checking that it references only
/// schemas and snapshots it contains.
#[derive(Debug, Default)]
pub struct TableMetadataBuilder {
    format_version: Option<FormatVersion>,
    table_uuid: Option<Uuid>,
    location: Option<String>,
    last_updated_ms: i64,
    schemas: Vec<Schema>,
    current_schema_id: Option<SchemaId>,
    current_snapshot_id: Option<i64>,
    snapshots: Vec<Snapshot>,
    properties: HashMap<String, String>,
}

impl TableMetadataBuilder {
    /// Sets the format version, v2 by default.
    pub fn format_version(mut self, format_version: FormatVersion) -> Self {
        self.format_version = Some(format_version);
        self
    }

    /// Sets the table uuid, random by default.
    pub fn table_uuid(mut self, table_uuid: Uuid) -> Self {
        self.table_uuid = Some(table_uuid);
        self
    }

    /// Sets the table location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the last update time.
    pub fn last_updated_ms(mut self, last_updated_ms: i64) -> Self {
        self.last_updated_ms = last_updated_ms;
        self
    }

    /// Adds a schema.
    pub fn add_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Sets the current schema id. Defaults to the id of the last added schema.
    pub fn current_schema_id(mut self, schema_id: SchemaId) -> Self {
        self.current_schema_id = Some(schema_id);
        self
    }

    /// Adds a snapshot.
    pub fn add_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshots.push(snapshot);
        self
    }

    /// Sets the current snapshot id.
    pub fn current_snapshot_id(mut self, snapshot_id: Option<i64>) -> Self {
        self.current_snapshot_id = snapshot_id;
        self
    }

    /// Sets a table property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Sets all table properties.
    pub fn properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Builds the metadata.
    pub fn build(self) -> Result<TableMetadata> {
        let Some(location) = self.location else {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                "Table location is required to build table metadata",
            ));
        };

        let current_schema_id = match self.current_schema_id {
            Some(id) => id,
            None => self
                .schemas
                .last()
                .map(Schema::schema_id)
                .ok_or_else(|| {
                    Error::new(
                        ErrorKind::DataInvalid,
                        "Table metadata requires at least one schema",
                    )
                })?,
        };

        let metadata = TableMetadata {
            format_version: self.format_version.unwrap_or(FormatVersion::V2),
            table_uuid: self.table_uuid.unwrap_or_else(Uuid::new_v4),
            location,
            last_updated_ms: self.last_updated_ms,
            schemas: self
                .schemas
                .into_iter()
                .map(|schema| (schema.schema_id(), Arc::new(schema)))
                .collect(),
            current_schema_id,
            current_snapshot_id: self
                .current_snapshot_id
                .filter(|id| *id != EMPTY_SNAPSHOT_ID),
            snapshots: self
                .snapshots
                .into_iter()
                .map(|snapshot| (snapshot.snapshot_id(), Arc::new(snapshot)))
                .collect(),
            properties: self.properties,
        };
        metadata.validate()?;
        Ok(metadata)
    }
}

impl TableMetadata {
    fn validate(&self) -> Result<()> {
        if !self.schemas.contains_key(&self.current_schema_id) {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                format!(
                    "No schema exists with the current schema id {}",
                    self.current_schema_id
                ),
            ));
        }

        if let Some(snapshot_id) = self.current_snapshot_id {
            if !self.snapshots.contains_key(&snapshot_id) {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!("Snapshot for current snapshot id {snapshot_id} does not exist"),
                ));
            }
        }
        Ok(())
    }
}

mod _serde {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_derive::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::{EMPTY_SNAPSHOT_ID, FormatVersion, TableMetadata};
    use crate::spec::{Schema, Snapshot};
    use crate::{Error, ErrorKind};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub(super) struct TableMetadataSerde {
        pub format_version: FormatVersion,
        pub table_uuid: Uuid,
        pub location: String,
        #[serde(default)]
        pub last_updated_ms: i64,
        /// Present in v1 metadata instead of `schemas`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub schema: Option<Schema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub schemas: Option<Vec<Schema>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub current_schema_id: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub current_snapshot_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub snapshots: Option<Vec<Snapshot>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub properties: Option<HashMap<String, String>>,
    }

    impl TryFrom<TableMetadataSerde> for TableMetadata {
        type Error = Error;

        fn try_from(value: TableMetadataSerde) -> Result<Self, Error> {
            let schemas = match (value.schemas, value.schema) {
                (Some(schemas), _) => schemas,
                (None, Some(schema)) => vec![schema],
                (None, None) => {
                    return Err(Error::new(
                        ErrorKind::DataInvalid,
                        "Table metadata has neither schemas nor schema",
                    ));
                }
            };

            let mut builder = TableMetadata::builder()
                .format_version(value.format_version)
                .table_uuid(value.table_uuid)
                .location(value.location)
                .last_updated_ms(value.last_updated_ms)
                .current_snapshot_id(value.current_snapshot_id)
                .properties(value.properties.unwrap_or_default());
            if let Some(current_schema_id) = value.current_schema_id {
                builder = builder.current_schema_id(current_schema_id);
            }
            for schema in schemas {
                builder = builder.add_schema(schema);
            }
            for snapshot in value.snapshots.unwrap_or_default() {
                builder = builder.add_snapshot(snapshot);
            }
            builder.build()
        }
    }

    impl From<TableMetadata> for TableMetadataSerde {
        fn from(value: TableMetadata) -> Self {
            let mut schemas: Vec<Schema> = value
                .schemas
                .into_values()
                .map(Arc::unwrap_or_clone)
                .collect();
            schemas.sort_by_key(Schema::schema_id);
            let mut snapshots: Vec<Snapshot> = value
                .snapshots
                .into_values()
                .map(Arc::unwrap_or_clone)
                .collect();
            snapshots.sort_by_key(Snapshot::timestamp_ms);

            TableMetadataSerde {
                format_version: value.format_version,
                table_uuid: value.table_uuid,
                location: value.location,
                last_updated_ms: value.last_updated_ms,
                schema: None,
                schemas: Some(schemas),
                current_schema_id: Some(value.current_schema_id),
                current_snapshot_id: Some(value.current_snapshot_id.unwrap_or(EMPTY_SNAPSHOT_ID)),
                snapshots: Some(snapshots),
                properties: Some(value.properties),
            }
        }
    }
}
