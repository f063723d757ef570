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

//! Files metadata tables.
//!
//! Provides `$files` and its variants, which list the data and delete files
//! of a table with their column-level statistics.
//!
//! See: <https://iceberg.apache.org/docs/latest/spark-queries/#files>

use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef as ArrowSchemaRef;
use futures::{StreamExt, TryStreamExt};

use super::{FileRowProjector, MetadataTableType, RecordBatchRowBuilder, RowBuilder};
use crate::Result;
use crate::arrow::schema_to_arrow_schema;
use crate::scan::{ArrowRecordBatchStream, DataFileStream};
use crate::spec::{ListType, MapType, NestedField, PrimitiveType, Schema, Type};
use crate::table::Table;

/// Files table listing the data and delete files of a table.
///
/// Which files are listed depends on the [`MetadataTableType`]: the current
/// snapshot or every retained snapshot, and data files, delete files or
/// both.
///
/// # Schema
///
/// | Column | Type | Description |
/// |--------|------|-------------|
/// | `content` | `Int` | File content type: 0=DATA, 1=POSITION_DELETES, 2=EQUALITY_DELETES |
/// | `file_path` | `String` | Full URI path to the file |
/// | `file_format` | `String` | File format: PARQUET, AVRO, ORC, PUFFIN |
/// | `record_count` | `Long` | Number of records in the file |
/// | `file_size_in_bytes` | `Long` | File size in bytes |
/// | `column_sizes` | `Map<Int, Long>` (nullable) | Column ID to size mapping |
/// | `value_counts` | `Map<Int, Long>` (nullable) | Column ID to value count mapping |
/// | `null_value_counts` | `Map<Int, Long>` (nullable) | Column ID to null count mapping |
/// | `nan_value_counts` | `Map<Int, Long>` (nullable) | Column ID to NaN count mapping |
/// | `lower_bounds` | `Map<Int, String>` (nullable) | Column ID to readable lower bound |
/// | `upper_bounds` | `Map<Int, String>` (nullable) | Column ID to readable upper bound |
/// | `key_metadata` | `Binary` (nullable) | Encryption key metadata |
/// | `split_offsets` | `List<Long>` (nullable) | Split offsets for parallel reading |
/// | `equality_ids` | `List<Int>` (nullable) | Equality field IDs (for equality deletes) |
pub struct FilesTable<'a> {
    table: &'a Table,
    table_type: MetadataTableType,
}

impl<'a> FilesTable<'a> {
    /// Create a new files table of the given type.
    pub fn new(table: &'a Table, table_type: MetadataTableType) -> Self {
        Self { table, table_type }
    }

    /// Which files table this is.
    pub fn table_type(&self) -> MetadataTableType {
        self.table_type
    }

    /// Returns the Iceberg schema for the files table.
    pub fn schema(&self) -> Result<Schema> {
        files_table_schema(PrimitiveType::Int, PrimitiveType::Long)
    }

    /// Returns the Arrow schema of the batches produced by [`Self::scan`].
    pub fn arrow_schema(&self) -> Result<ArrowSchemaRef> {
        Ok(Arc::new(schema_to_arrow_schema(&self.schema()?)?))
    }

    /// Writes one row per file to `builder` and returns the number of rows.
    pub async fn append_rows(&self, builder: &mut dyn RowBuilder) -> Result<u64> {
        let projector = self.projector()?;
        let mut files = self.plan_files().await?;

        let mut rows = 0;
        while let Some(data_file) = files.try_next().await? {
            projector.project(&data_file)?.append_to(builder)?;
            rows += 1;
        }

        tracing::debug!(table = %self.table_type, rows, "scanned files table");
        Ok(rows)
    }

    /// Reads the whole table into record batches of at most
    /// `read.metadata-table.batch-size` rows. An empty table has no batches.
    pub async fn build_batches(&self) -> Result<Vec<RecordBatch>> {
        let mut builder = RecordBatchRowBuilder::try_new(
            self.arrow_schema()?,
            self.table.table_properties().metadata_table_batch_size,
        )?;
        self.append_rows(&mut builder).await?;
        builder.finish()
    }

    /// Scans the files table and returns Arrow record batches.
    ///
    /// Batches are built as the stream is polled; manifests are loaded no
    /// earlier than their rows are needed.
    pub async fn scan(&self) -> Result<ArrowRecordBatchStream> {
        let schema = self.arrow_schema()?;
        let batch_size = self.table.table_properties().metadata_table_batch_size;
        let projector = self.projector()?;
        let files = self.plan_files().await?;

        let stream = files
            .chunks(batch_size)
            .map(move |chunk| -> Result<RecordBatch> {
                let mut builder = RecordBatchRowBuilder::try_new(schema.clone(), batch_size)?;
                for data_file in chunk {
                    projector.project(&data_file?)?.append_to(&mut builder)?;
                }
                // A chunk never exceeds the batch size, so it fits one batch.
                Ok(builder
                    .finish()?
                    .pop()
                    .unwrap_or_else(|| RecordBatch::new_empty(schema.clone())))
            })
            .boxed();

        Ok(stream)
    }

    fn projector(&self) -> Result<FileRowProjector> {
        FileRowProjector::try_new(self.table.metadata().current_schema())
    }

    async fn plan_files(&self) -> Result<DataFileStream> {
        self.table
            .data_file_scan()
            .scope(self.table_type.scope())
            .content(self.table_type.content())
            .include_column_stats()
            .build()?
            .plan_files()
            .await
    }
}

/// Output schema of the files tables.
///
/// Statistics maps are keyed by `key_type` and count maps hold `count_type`;
/// bound maps always hold strings.
fn files_table_schema(key_type: PrimitiveType, count_type: PrimitiveType) -> Result<Schema> {
    let map = |id: i32, name: &str, value_type: PrimitiveType| {
        NestedField::optional(
            id,
            name,
            Type::Map(MapType::new(
                NestedField::map_key_element(id + 1, key_type.clone().into()).into(),
                NestedField::map_value_element(id + 2, value_type.into(), true).into(),
            )),
        )
    };
    let list = |id: i32, name: &str, element_type: PrimitiveType| {
        NestedField::optional(
            id,
            name,
            Type::List(ListType::new(
                NestedField::list_element(id + 1, element_type.into(), true).into(),
            )),
        )
    };

    let fields = vec![
        NestedField::required(1, "content", PrimitiveType::Int.into()),
        NestedField::required(2, "file_path", PrimitiveType::String.into()),
        NestedField::required(3, "file_format", PrimitiveType::String.into()),
        NestedField::required(4, "record_count", PrimitiveType::Long.into()),
        NestedField::required(5, "file_size_in_bytes", PrimitiveType::Long.into()),
        map(6, "column_sizes", count_type.clone()),
        map(9, "value_counts", count_type.clone()),
        map(12, "null_value_counts", count_type.clone()),
        map(15, "nan_value_counts", count_type),
        map(18, "lower_bounds", PrimitiveType::String),
        map(21, "upper_bounds", PrimitiveType::String),
        NestedField::optional(24, "key_metadata", PrimitiveType::Binary.into()),
        list(25, "split_offsets", PrimitiveType::Long),
        list(27, "equality_ids", PrimitiveType::Int),
    ];

    Schema::builder()
        .with_fields(fields.into_iter().map(Arc::new))
        .build()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use arrow_array::cast::AsArray;
    use arrow_array::types::{Int32Type, Int64Type};
    use arrow_array::{Array, MapArray};
    use expect_test::expect;
    use futures::TryStreamExt;

    use super::*;
    use crate::arrow::arrow_field_id;
    use crate::scan::tests::TableTestFixture;
    use crate::spec::{FormatVersion, TableMetadata, TableProperties};

    fn string_map(batch: &RecordBatch, column: &str, row: usize) -> Option<Vec<(i32, String)>> {
        let maps = batch
            .column_by_name(column)
            .unwrap()
            .as_any()
            .downcast_ref::<MapArray>()
            .unwrap();
        if maps.is_null(row) {
            return None;
        }
        let entries = maps.value(row);
        let keys = entries.column(0).as_primitive::<Int32Type>();
        let values = entries.column(1).as_string::<i32>();
        Some(
            (0..entries.len())
                .map(|i| (keys.value(i), values.value(i).to_string()))
                .collect(),
        )
    }

    fn long_map(batch: &RecordBatch, column: &str, row: usize) -> Option<Vec<(i32, i64)>> {
        let maps = batch
            .column_by_name(column)
            .unwrap()
            .as_any()
            .downcast_ref::<MapArray>()
            .unwrap();
        if maps.is_null(row) {
            return None;
        }
        let entries = maps.value(row);
        let keys = entries.column(0).as_primitive::<Int32Type>();
        let values = entries.column(1).as_primitive::<Int64Type>();
        Some(
            (0..entries.len())
                .map(|i| (keys.value(i), values.value(i)))
                .collect(),
        )
    }

    #[test]
    fn test_files_table_schema() {
        let fixture = TableTestFixture::new();
        let schema = fixture.table.inspect().files().schema().unwrap();

        expect![[r#"
            table {
              1: content: required int
              2: file_path: required string
              3: file_format: required string
              4: record_count: required long
              5: file_size_in_bytes: required long
              6: column_sizes: optional map<int, long>
              9: value_counts: optional map<int, long>
              12: null_value_counts: optional map<int, long>
              15: nan_value_counts: optional map<int, long>
              18: lower_bounds: optional map<int, string>
              21: upper_bounds: optional map<int, string>
              24: key_metadata: optional binary
              25: split_offsets: optional list<long>
              27: equality_ids: optional list<int>
            }
        "#]]
        .assert_eq(&schema.to_string());

        let arrow_schema = fixture.table.inspect().files().arrow_schema().unwrap();
        let ids: Vec<i32> = arrow_schema
            .fields()
            .iter()
            .map(|field| arrow_field_id(field).unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 9, 12, 15, 18, 21, 24, 25, 27]);
    }

    #[tokio::test]
    async fn test_files_table() {
        let fixture = TableTestFixture::new();
        let batches = fixture
            .table
            .inspect()
            .files()
            .scan()
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 4);

        let content = batch
            .column_by_name("content")
            .unwrap()
            .as_primitive::<Int32Type>();
        assert_eq!(content.values().to_vec(), vec![0, 0, 1, 2]);
        let formats = batch
            .column_by_name("file_format")
            .unwrap()
            .as_string::<i32>();
        assert_eq!(formats.value(0), "PARQUET");
        assert_eq!(formats.value(3), "AVRO");

        // b.parquet carries statistics
        assert_eq!(
            long_map(batch, "column_sizes", 0),
            Some(vec![(1, 10), (2, 20)])
        );
        assert_eq!(
            long_map(batch, "null_value_counts", 0),
            Some(vec![(1, 0), (2, 5)])
        );
        assert_eq!(long_map(batch, "nan_value_counts", 0), Some(vec![]));
        assert_eq!(
            string_map(batch, "lower_bounds", 0),
            Some(vec![(1, "1".to_string()), (2, "apple".to_string())])
        );
        assert_eq!(
            string_map(batch, "upper_bounds", 0),
            Some(vec![(1, "100".to_string()), (2, "zebra".to_string())])
        );

        // c.parquet does not
        assert_eq!(long_map(batch, "column_sizes", 1), None);
        assert_eq!(string_map(batch, "lower_bounds", 1), None);

        let key_metadata = batch
            .column_by_name("key_metadata")
            .unwrap()
            .as_binary::<i64>();
        assert!(key_metadata.is_null(0));
        assert_eq!(key_metadata.value(1), &[0xca, 0xfe]);

        let split_offsets = batch
            .column_by_name("split_offsets")
            .unwrap()
            .as_list::<i32>();
        assert_eq!(
            split_offsets
                .value(0)
                .as_primitive::<Int64Type>()
                .values()
                .to_vec(),
            vec![4, 1024]
        );
        assert!(split_offsets.is_null(1));

        let equality_ids = batch
            .column_by_name("equality_ids")
            .unwrap()
            .as_list::<i32>();
        assert!(equality_ids.is_null(2));
        assert_eq!(
            equality_ids
                .value(3)
                .as_primitive::<Int32Type>()
                .values()
                .to_vec(),
            vec![1]
        );
    }

    #[tokio::test]
    async fn test_files_table_variants() {
        let fixture = TableTestFixture::new();
        let inspect = fixture.table.inspect();

        let row_count = |batches: Vec<RecordBatch>| -> usize {
            batches.iter().map(|batch| batch.num_rows()).sum()
        };

        assert_eq!(row_count(inspect.files().build_batches().await.unwrap()), 4);
        assert_eq!(
            row_count(inspect.data_files().build_batches().await.unwrap()),
            2
        );
        assert_eq!(
            row_count(inspect.delete_files().build_batches().await.unwrap()),
            2
        );
        assert_eq!(
            row_count(inspect.all_files().build_batches().await.unwrap()),
            6
        );
        assert_eq!(
            row_count(inspect.all_data_files().build_batches().await.unwrap()),
            4
        );
        assert_eq!(
            row_count(inspect.all_delete_files().build_batches().await.unwrap()),
            2
        );
    }

    #[tokio::test]
    async fn test_all_files_surfaces_removed_files() {
        let fixture = TableTestFixture::new();
        let batches = fixture
            .table
            .inspect()
            .all_data_files()
            .build_batches()
            .await
            .unwrap();
        let paths: Vec<String> = batches
            .iter()
            .flat_map(|batch| {
                let paths = batch
                    .column_by_name("file_path")
                    .unwrap()
                    .as_string::<i32>()
                    .clone();
                (0..paths.len())
                    .map(move |i| paths.value(i).to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        assert!(paths.contains(&"memory://t/data/a.parquet".to_string()));
    }

    #[tokio::test]
    async fn test_empty_table_has_no_rows() {
        let fixture = TableTestFixture::empty();
        let files = fixture.table.inspect().files();

        assert!(files.build_batches().await.unwrap().is_empty());
        let batches: Vec<RecordBatch> = files.scan().await.unwrap().try_collect().await.unwrap();
        assert!(batches.is_empty());
    }

    #[tokio::test]
    async fn test_batch_size_property() {
        let fixture = TableTestFixture::new();
        let metadata = TableMetadata::builder()
            .format_version(FormatVersion::V2)
            .location("memory://t")
            .add_schema(fixture.table.metadata().current_schema().as_ref().clone())
            .current_schema_id(0)
            .add_snapshot(fixture.table.metadata().current_snapshot().unwrap().as_ref().clone())
            .current_snapshot_id(Some(3))
            .properties(HashMap::from([(
                TableProperties::PROPERTY_METADATA_TABLE_BATCH_SIZE.to_string(),
                "3".to_string(),
            )]))
            .build()
            .unwrap();
        let table = Table::builder()
            .loader(fixture.loader.clone())
            .metadata(metadata)
            .build()
            .unwrap();

        let files = table.inspect().files();
        let sizes: Vec<usize> = files
            .build_batches()
            .await
            .unwrap()
            .iter()
            .map(|batch| batch.num_rows())
            .collect();
        assert_eq!(sizes, vec![3, 1]);

        let sizes: Vec<usize> = files
            .scan()
            .await
            .unwrap()
            .map_ok(|batch| batch.num_rows())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(sizes, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_append_rows_counts_rows() {
        let fixture = TableTestFixture::new();
        let files = fixture.table.inspect().delete_files();
        let mut builder = RecordBatchRowBuilder::try_new(files.arrow_schema().unwrap(), 16).unwrap();

        assert_eq!(files.append_rows(&mut builder).await.unwrap(), 2);
        assert_eq!(builder.pending_rows(), 2);
    }
}
