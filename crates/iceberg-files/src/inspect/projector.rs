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

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{BoundDecoder, RowBuilder};
use crate::spec::{DataFile, Schema, TypeRegistry};
use crate::{Error, ErrorKind, Result};

type CountExtractor = fn(&DataFile) -> Option<&HashMap<i32, u64>>;
type BoundExtractor = fn(&DataFile) -> Option<&HashMap<i32, Vec<u8>>>;

const COUNT_METRICS: [(&str, CountExtractor); 4] = [
    ("column_sizes", DataFile::column_sizes),
    ("value_counts", DataFile::value_counts),
    ("null_value_counts", DataFile::null_value_counts),
    ("nan_value_counts", DataFile::nan_value_counts),
];

const BOUND_METRICS: [(&str, BoundExtractor); 2] = [
    ("lower_bounds", DataFile::lower_bounds),
    ("upper_bounds", DataFile::upper_bounds),
];

/// One row of a files metadata table, in output column order.
///
/// `None` is an absent value and becomes a null; it is never collapsed into
/// an empty map or list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    /// 0 for data, 1 for position deletes, 2 for equality deletes.
    pub content: i32,
    /// Location of the file.
    pub file_path: String,
    /// Upper-case format name, e.g. `PARQUET`.
    pub file_format: String,
    /// Number of rows in the file.
    pub record_count: i64,
    /// Total file size in bytes.
    pub file_size_in_bytes: i64,
    /// On-disk size per column id.
    pub column_sizes: Option<BTreeMap<i32, i64>>,
    /// Value count per column id, nulls included.
    pub value_counts: Option<BTreeMap<i32, i64>>,
    /// Null count per column id.
    pub null_value_counts: Option<BTreeMap<i32, i64>>,
    /// NaN count per column id.
    pub nan_value_counts: Option<BTreeMap<i32, i64>>,
    /// Human-readable lower bounds of columns still in the schema.
    pub lower_bounds: Option<BTreeMap<i32, String>>,
    /// Human-readable upper bounds of columns still in the schema.
    pub upper_bounds: Option<BTreeMap<i32, String>>,
    /// Encryption key metadata, if the file is encrypted.
    pub key_metadata: Option<Vec<u8>>,
    /// Recommended split offsets, ascending.
    pub split_offsets: Option<Vec<i64>>,
    /// Field ids used for equality comparison in equality delete files.
    pub equality_ids: Option<Vec<i32>>,
}

impl FileRow {
    /// Writes this row to `builder`.
    pub fn append_to(&self, builder: &mut dyn RowBuilder) -> Result<()> {
        builder.begin_row()?;
        builder.append_int(self.content)?;
        builder.append_string(&self.file_path)?;
        builder.append_string(&self.file_format)?;
        builder.append_long(self.record_count)?;
        builder.append_long(self.file_size_in_bytes)?;
        for counts in [
            &self.column_sizes,
            &self.value_counts,
            &self.null_value_counts,
            &self.nan_value_counts,
        ] {
            append_optional(builder, counts.as_ref(), |b, v| b.append_int_long_map(v))?;
        }
        for bounds in [&self.lower_bounds, &self.upper_bounds] {
            append_optional(builder, bounds.as_ref(), |b, v| b.append_int_string_map(v))?;
        }
        append_optional(builder, self.key_metadata.as_deref(), |b, v| {
            b.append_binary(v)
        })?;
        append_optional(builder, self.split_offsets.as_deref(), |b, v| {
            b.append_long_list(v)
        })?;
        append_optional(builder, self.equality_ids.as_deref(), |b, v| {
            b.append_int_list(v)
        })?;
        builder.end_row()
    }
}

fn append_optional<T: ?Sized>(
    builder: &mut dyn RowBuilder,
    value: Option<&T>,
    append: impl FnOnce(&mut dyn RowBuilder, &T) -> Result<()>,
) -> Result<()> {
    match value {
        Some(value) => append(builder, value),
        None => builder.append_null(),
    }
}

/// Projects [`DataFile`] records onto [`FileRow`]s.
#[derive(Debug, Clone)]
pub struct FileRowProjector {
    decoder: BoundDecoder,
}

impl FileRowProjector {
    /// Creates a projector that decodes bounds with the types in `registry`.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            decoder: BoundDecoder::new(registry),
        }
    }

    /// Creates a projector for the columns of `schema`.
    pub fn try_new(schema: &Schema) -> Result<Self> {
        Ok(Self::new(Arc::new(TypeRegistry::build(schema)?)))
    }

    /// Projects one file.
    pub fn project(&self, data_file: &DataFile) -> Result<FileRow> {
        let [column_sizes, value_counts, null_value_counts, nan_value_counts] =
            COUNT_METRICS.map(|(column, extract)| {
                extract(data_file)
                    .map(|counts| convert_counts(column, counts))
                    .transpose()
            });
        let [lower_bounds, upper_bounds] = BOUND_METRICS.map(|(column, extract)| {
            extract(data_file)
                .map(|bounds| {
                    self.decoder
                        .decode_bounds(bounds)
                        .map_err(|err| err.with_context("column", column))
                })
                .transpose()
        });

        Ok(FileRow {
            content: data_file.content_type() as i32,
            file_path: data_file.file_path().to_string(),
            file_format: data_file.file_format().to_string().to_uppercase(),
            record_count: to_long("record_count", data_file.record_count())?,
            file_size_in_bytes: to_long("file_size_in_bytes", data_file.file_size_in_bytes())?,
            column_sizes: column_sizes?,
            value_counts: value_counts?,
            null_value_counts: null_value_counts?,
            nan_value_counts: nan_value_counts?,
            lower_bounds: lower_bounds?,
            upper_bounds: upper_bounds?,
            key_metadata: data_file.key_metadata().map(<[u8]>::to_vec),
            split_offsets: data_file.split_offsets().map(<[i64]>::to_vec),
            equality_ids: data_file.equality_ids().map(<[i32]>::to_vec),
        })
    }
}

fn convert_counts(column: &'static str, counts: &HashMap<i32, u64>) -> Result<BTreeMap<i32, i64>> {
    counts
        .iter()
        .map(|(field_id, count)| {
            let count = to_long(column, *count)
                .map_err(|err| err.with_context("field_id", field_id.to_string()))?;
            Ok((*field_id, count))
        })
        .collect()
}

fn to_long(column: &'static str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|err| {
        Error::new(
            ErrorKind::DataInvalid,
            format!("Value {value} of {column} does not fit in a long"),
        )
        .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        DataContentType, DataFileBuilder, DataFileFormat, Datum, NestedField, PrimitiveType, Type,
    };

    fn projector() -> FileRowProjector {
        let schema = Schema::builder()
            .with_fields(vec![
                NestedField::optional(1, "a", PrimitiveType::Int.into()).into(),
                NestedField::optional(2, "b", PrimitiveType::String.into()).into(),
            ])
            .build()
            .unwrap();
        FileRowProjector::try_new(&schema).unwrap()
    }

    fn minimal_file() -> DataFileBuilder {
        let mut builder = DataFileBuilder::default();
        builder
            .file_path("s3://bucket/data/1.parquet")
            .file_format(DataFileFormat::Parquet)
            .record_count(100)
            .file_size_in_bytes(2048);
        builder
    }

    #[test]
    fn test_absent_statistics_project_to_nulls() {
        let row = projector().project(&minimal_file().build().unwrap()).unwrap();

        assert_eq!(row, FileRow {
            content: 0,
            file_path: "s3://bucket/data/1.parquet".to_string(),
            file_format: "PARQUET".to_string(),
            record_count: 100,
            file_size_in_bytes: 2048,
            column_sizes: None,
            value_counts: None,
            null_value_counts: None,
            nan_value_counts: None,
            lower_bounds: None,
            upper_bounds: None,
            key_metadata: None,
            split_offsets: None,
            equality_ids: None,
        });
    }

    #[test]
    fn test_each_statistic_is_checked_independently() {
        let data_file = minimal_file()
            .column_sizes(HashMap::from([(2, 20), (1, 10)]))
            .nan_value_counts(HashMap::new())
            .lower_bounds(HashMap::from([
                (1, Datum::int(5).to_bytes()),
                (7, Datum::int(9).to_bytes()),
            ]))
            .upper_bounds(HashMap::from([(7, Datum::int(9).to_bytes())]))
            .split_offsets(vec![0, 512])
            .build()
            .unwrap();

        let row = projector().project(&data_file).unwrap();
        assert_eq!(row.column_sizes, Some(BTreeMap::from([(1, 10), (2, 20)])));
        assert_eq!(row.value_counts, None);
        assert_eq!(row.null_value_counts, None);
        assert_eq!(row.nan_value_counts, Some(BTreeMap::new()));
        assert_eq!(
            row.lower_bounds,
            Some(BTreeMap::from([(1, "5".to_string())]))
        );
        // Present but with only unknown ids: an empty map, not a null.
        assert_eq!(row.upper_bounds, Some(BTreeMap::new()));
        assert_eq!(row.split_offsets, Some(vec![0, 512]));
        assert_eq!(row.equality_ids, None);
    }

    #[test]
    fn test_delete_file_scalars() {
        let data_file = minimal_file()
            .content(DataContentType::EqualityDeletes)
            .file_format(DataFileFormat::Avro)
            .equality_ids(vec![2, 1])
            .key_metadata(vec![1, 2, 3])
            .build()
            .unwrap();

        let row = projector().project(&data_file).unwrap();
        assert_eq!(row.content, 2);
        assert_eq!(row.file_format, "AVRO");
        assert_eq!(row.equality_ids, Some(vec![2, 1]));
        assert_eq!(row.key_metadata, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_decimal_bounds_render_like_big_decimal() {
        let schema = Schema::builder()
            .with_fields(vec![
                NestedField::optional(1, "d", Type::decimal(38, 10).unwrap()).into(),
            ])
            .build()
            .unwrap();
        let data_file = minimal_file()
            .lower_bounds(HashMap::from([(1, vec![0x00])]))
            .upper_bounds(HashMap::from([(1, vec![0x01])]))
            .build()
            .unwrap();

        let row = FileRowProjector::try_new(&schema)
            .unwrap()
            .project(&data_file)
            .unwrap();
        assert_eq!(
            row.lower_bounds,
            Some(BTreeMap::from([(1, "0E-10".to_string())]))
        );
        assert_eq!(
            row.upper_bounds,
            Some(BTreeMap::from([(1, "1E-10".to_string())]))
        );
    }

    #[test]
    fn test_count_out_of_range() {
        let data_file = minimal_file()
            .value_counts(HashMap::from([(1, u64::MAX)]))
            .build()
            .unwrap();
        let err = projector().project(&data_file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
        assert!(err.to_string().contains("value_counts"));

        let data_file = minimal_file().record_count(u64::MAX).build().unwrap();
        assert_eq!(
            projector().project(&data_file).unwrap_err().kind(),
            ErrorKind::DataInvalid
        );
    }

    #[test]
    fn test_malformed_bound_fails() {
        let data_file = minimal_file()
            .lower_bounds(HashMap::from([(1, vec![1, 2])]))
            .build()
            .unwrap();
        let err = projector().project(&data_file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(err.to_string().contains("lower_bounds"));
    }
}
