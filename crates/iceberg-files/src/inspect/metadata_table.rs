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

use std::fmt;
use std::str::FromStr;

use super::FilesTable;
use crate::scan::{FileContentFilter, SnapshotScope};
use crate::table::Table;
use crate::{Error, ErrorKind, Result};

/// Metadata table is used to inspect a table's files as a table.
///
/// References:
/// - <https://github.com/apache/iceberg/blob/ac865e334e143dfd9e33011d8cf710b46d91f1e5/core/src/main/java/org/apache/iceberg/MetadataTableType.java#L23-L39>
/// - <https://iceberg.apache.org/docs/latest/spark-queries/#querying-with-sql>
#[derive(Debug)]
pub struct MetadataTable<'a>(&'a Table);

/// Metadata table type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum MetadataTableType {
    /// Live files of the current snapshot.
    Files,
    /// Live data files of the current snapshot.
    DataFiles,
    /// Live delete files of the current snapshot.
    DeleteFiles,
    /// Files of every retained snapshot.
    AllFiles,
    /// Data files of every retained snapshot.
    AllDataFiles,
    /// Delete files of every retained snapshot.
    AllDeleteFiles,
}

impl MetadataTableType {
    /// Returns the string representation of the metadata table type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataTableType::Files => "files",
            MetadataTableType::DataFiles => "data_files",
            MetadataTableType::DeleteFiles => "delete_files",
            MetadataTableType::AllFiles => "all_files",
            MetadataTableType::AllDataFiles => "all_data_files",
            MetadataTableType::AllDeleteFiles => "all_delete_files",
        }
    }

    /// Returns all the metadata table types.
    pub fn all_types() -> impl Iterator<Item = Self> {
        use strum::IntoEnumIterator;
        Self::iter()
    }

    /// Snapshots the table reads.
    pub fn scope(&self) -> SnapshotScope {
        match self {
            MetadataTableType::Files
            | MetadataTableType::DataFiles
            | MetadataTableType::DeleteFiles => SnapshotScope::Current,
            MetadataTableType::AllFiles
            | MetadataTableType::AllDataFiles
            | MetadataTableType::AllDeleteFiles => SnapshotScope::All,
        }
    }

    /// Manifests the table reads.
    pub fn content(&self) -> FileContentFilter {
        match self {
            MetadataTableType::Files | MetadataTableType::AllFiles => FileContentFilter::All,
            MetadataTableType::DataFiles | MetadataTableType::AllDataFiles => {
                FileContentFilter::Data
            }
            MetadataTableType::DeleteFiles | MetadataTableType::AllDeleteFiles => {
                FileContentFilter::Deletes
            }
        }
    }
}

impl fmt::Display for MetadataTableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MetadataTableType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::all_types()
            .find(|table_type| table_type.as_str() == value)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::DataInvalid,
                    format!("invalid metadata table type: {value}"),
                )
            })
    }
}

impl FromStr for MetadataTableType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}

impl<'a> MetadataTable<'a> {
    /// Creates a new metadata scan.
    pub fn new(table: &'a Table) -> Self {
        Self(table)
    }

    /// Get the files table of the given type.
    pub fn files_table(&self, table_type: MetadataTableType) -> FilesTable<'a> {
        FilesTable::new(self.0, table_type)
    }

    /// Get the files table.
    pub fn files(&self) -> FilesTable<'a> {
        self.files_table(MetadataTableType::Files)
    }

    /// Get the data files table.
    pub fn data_files(&self) -> FilesTable<'a> {
        self.files_table(MetadataTableType::DataFiles)
    }

    /// Get the delete files table.
    pub fn delete_files(&self) -> FilesTable<'a> {
        self.files_table(MetadataTableType::DeleteFiles)
    }

    /// Get the all files table.
    pub fn all_files(&self) -> FilesTable<'a> {
        self.files_table(MetadataTableType::AllFiles)
    }

    /// Get the all data files table.
    pub fn all_data_files(&self) -> FilesTable<'a> {
        self.files_table(MetadataTableType::AllDataFiles)
    }

    /// Get the all delete files table.
    pub fn all_delete_files(&self) -> FilesTable<'a> {
        self.files_table(MetadataTableType::AllDeleteFiles)
    }
}
