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

//! End-to-end tests of the files metadata tables through the public API.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{Int32Type, Int64Type};
use arrow_array::{Array, MapArray, RecordBatch};
use futures::TryStreamExt;
use iceberg_files::inspect::{FileRow, FileRowProjector, MetadataTableType};
use iceberg_files::io::MemoryManifestLoader;
use iceberg_files::spec::{
    DataFileBuilder, DataFileFormat, Datum, Manifest, ManifestContentType, ManifestEntry,
    ManifestFile, ManifestList, ManifestStatus, TableMetadata,
};
use iceberg_files::table::Table;

const TABLE_METADATA: &str = r#"
{
    "format-version": 2,
    "table-uuid": "0b1e8a5c-3a53-4b4c-9d4a-1a2b3c4d5e6f",
    "location": "memory://warehouse/db/events",
    "last-updated-ms": 1700000000000,
    "current-schema-id": 0,
    "schemas": [
        {
            "type": "struct",
            "schema-id": 0,
            "fields": [
                {"id": 1, "name": "a", "required": false, "type": "int"},
                {"id": 2, "name": "b", "required": false, "type": "string"}
            ]
        }
    ],
    "current-snapshot-id": 1,
    "snapshots": [
        {
            "snapshot-id": 1,
            "timestamp-ms": 1700000000000,
            "sequence-number": 1,
            "summary": {"operation": "append"},
            "manifest-list": "memory://warehouse/db/events/metadata/snap-1.avro"
        }
    ]
}
"#;

fn table() -> Table {
    let loader = Arc::new(MemoryManifestLoader::new());
    let manifest_file = ManifestFile::builder()
        .manifest_path("memory://warehouse/db/events/metadata/m0.avro")
        .added_snapshot_id(1)
        .build();

    let data_file = DataFileBuilder::default()
        .file_path("memory://warehouse/db/events/data/00000.parquet")
        .file_format(DataFileFormat::Parquet)
        .record_count(100)
        .file_size_in_bytes(2048)
        .column_sizes(HashMap::from([(1, 10), (2, 20)]))
        .lower_bounds(HashMap::from([(1, Datum::int(5).to_bytes())]))
        .split_offsets(vec![0, 512])
        .build()
        .unwrap();

    loader.add_manifest(
        manifest_file.manifest_path.clone(),
        Manifest::new(ManifestContentType::Data, vec![
            ManifestEntry::builder()
                .status(ManifestStatus::Added)
                .snapshot_id(1)
                .data_file(data_file)
                .build(),
        ]),
    );
    loader.add_manifest_list(
        "memory://warehouse/db/events/metadata/snap-1.avro",
        ManifestList::new(vec![manifest_file]),
    );

    let metadata: TableMetadata = serde_json::from_str(TABLE_METADATA).unwrap();
    Table::builder()
        .loader(loader)
        .metadata(metadata)
        .build()
        .unwrap()
}

fn int_long_map(batch: &RecordBatch, column: &str) -> Option<BTreeMap<i32, i64>> {
    let maps = batch
        .column_by_name(column)
        .unwrap()
        .as_any()
        .downcast_ref::<MapArray>()
        .unwrap();
    if maps.is_null(0) {
        return None;
    }
    let entries = maps.value(0);
    let keys = entries.column(0).as_primitive::<Int32Type>();
    let values = entries.column(1).as_primitive::<Int64Type>();
    Some(
        (0..entries.len())
            .map(|i| (keys.value(i), values.value(i)))
            .collect(),
    )
}

#[tokio::test]
async fn test_single_file_row() {
    let table = table();
    let files = table.inspect().files();

    let batches: Vec<RecordBatch> = files.scan().await.unwrap().try_collect().await.unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(batch.num_columns(), 14);

    assert_eq!(
        batch
            .column_by_name("content")
            .unwrap()
            .as_primitive::<Int32Type>()
            .value(0),
        0
    );
    assert_eq!(
        batch
            .column_by_name("file_path")
            .unwrap()
            .as_string::<i32>()
            .value(0),
        "memory://warehouse/db/events/data/00000.parquet"
    );
    assert_eq!(
        batch
            .column_by_name("file_format")
            .unwrap()
            .as_string::<i32>()
            .value(0),
        "PARQUET"
    );
    assert_eq!(
        batch
            .column_by_name("record_count")
            .unwrap()
            .as_primitive::<Int64Type>()
            .value(0),
        100
    );
    assert_eq!(
        batch
            .column_by_name("file_size_in_bytes")
            .unwrap()
            .as_primitive::<Int64Type>()
            .value(0),
        2048
    );

    assert_eq!(
        int_long_map(batch, "column_sizes"),
        Some(BTreeMap::from([(1, 10), (2, 20)]))
    );
    for column in [
        "value_counts",
        "null_value_counts",
        "nan_value_counts",
        "upper_bounds",
        "key_metadata",
        "equality_ids",
    ] {
        assert!(
            batch.column_by_name(column).unwrap().is_null(0),
            "{column} should be null"
        );
    }

    let lower_bounds = batch
        .column_by_name("lower_bounds")
        .unwrap()
        .as_any()
        .downcast_ref::<MapArray>()
        .unwrap()
        .value(0);
    assert_eq!(lower_bounds.len(), 1);
    assert_eq!(
        lower_bounds.column(0).as_primitive::<Int32Type>().value(0),
        1
    );
    assert_eq!(lower_bounds.column(1).as_string::<i32>().value(0), "5");

    let split_offsets = batch
        .column_by_name("split_offsets")
        .unwrap()
        .as_list::<i32>()
        .value(0);
    assert_eq!(
        split_offsets.as_primitive::<Int64Type>().values().to_vec(),
        vec![0, 512]
    );
}

#[tokio::test]
async fn test_projected_row_matches_batches() {
    let table = table();
    let data_file = table
        .data_file_scan()
        .include_column_stats()
        .build()
        .unwrap()
        .plan_files()
        .await
        .unwrap()
        .try_next()
        .await
        .unwrap()
        .unwrap();

    let row = FileRowProjector::try_new(table.metadata().current_schema())
        .unwrap()
        .project(&data_file)
        .unwrap();
    assert_eq!(row, FileRow {
        content: 0,
        file_path: "memory://warehouse/db/events/data/00000.parquet".to_string(),
        file_format: "PARQUET".to_string(),
        record_count: 100,
        file_size_in_bytes: 2048,
        column_sizes: Some(BTreeMap::from([(1, 10), (2, 20)])),
        value_counts: None,
        null_value_counts: None,
        nan_value_counts: None,
        lower_bounds: Some(BTreeMap::from([(1, "5".to_string())])),
        upper_bounds: None,
        key_metadata: None,
        split_offsets: Some(vec![0, 512]),
        equality_ids: None,
    });
}

#[tokio::test]
async fn test_every_table_type_by_name() {
    let table = table();
    let expected_rows = HashMap::from([
        ("files", 1),
        ("data_files", 1),
        ("delete_files", 0),
        ("all_files", 1),
        ("all_data_files", 1),
        ("all_delete_files", 0),
    ]);

    for (name, rows) in expected_rows {
        let table_type = MetadataTableType::try_from(name).unwrap();
        let batches = table
            .inspect()
            .files_table(table_type)
            .build_batches()
            .await
            .unwrap();
        let actual: usize = batches.iter().map(|batch| batch.num_rows()).sum();
        assert_eq!(actual, rows, "{name}");
    }

    // Manifest list and manifest were each read once; later scans hit the cache.
    let metrics = table.cache_metrics();
    assert_eq!(metrics.loads, 2);
    assert!(metrics.hits > 0);
}
