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

//! Row-at-a-time output of metadata tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow_array::builder::{
    ArrayBuilder, Int32Builder, Int64Builder, LargeBinaryBuilder, ListBuilder, MapBuilder,
    MapFieldNames, StringBuilder,
};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{DataType, FieldRef, SchemaRef as ArrowSchemaRef};

use crate::{Error, ErrorKind, Result};

/// Sink for metadata table rows.
///
/// A row is written as `begin_row`, then exactly one `append_*` or
/// `append_null` call per output column in schema order, then `end_row`.
/// Implementations reject calls that break this protocol.
pub trait RowBuilder: Send {
    /// Starts a new row.
    fn begin_row(&mut self) -> Result<()>;
    /// Appends an `int` value.
    fn append_int(&mut self, value: i32) -> Result<()>;
    /// Appends a `long` value.
    fn append_long(&mut self, value: i64) -> Result<()>;
    /// Appends a `string` value.
    fn append_string(&mut self, value: &str) -> Result<()>;
    /// Appends a `binary` value.
    fn append_binary(&mut self, value: &[u8]) -> Result<()>;
    /// Appends a `map<int, long>` value.
    fn append_int_long_map(&mut self, value: &BTreeMap<i32, i64>) -> Result<()>;
    /// Appends a `map<int, string>` value.
    fn append_int_string_map(&mut self, value: &BTreeMap<i32, String>) -> Result<()>;
    /// Appends a `list<long>` value.
    fn append_long_list(&mut self, value: &[i64]) -> Result<()>;
    /// Appends a `list<int>` value.
    fn append_int_list(&mut self, value: &[i32]) -> Result<()>;
    /// Appends a null to a nullable column.
    fn append_null(&mut self) -> Result<()>;
    /// Finishes the current row.
    fn end_row(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum ColumnKind {
    Int,
    Long,
    String,
    Binary,
    IntLongMap,
    IntStringMap,
    LongList,
    IntList,
}

enum ColumnBuilder {
    Int(Int32Builder),
    Long(Int64Builder),
    String(StringBuilder),
    Binary(LargeBinaryBuilder),
    IntLongMap(MapBuilder<Int32Builder, Int64Builder>),
    IntStringMap(MapBuilder<Int32Builder, StringBuilder>),
    LongList(ListBuilder<Int64Builder>),
    IntList(ListBuilder<Int32Builder>),
}

impl ColumnBuilder {
    fn try_new(field: &FieldRef) -> Result<Self> {
        let unsupported = || {
            Error::new(
                ErrorKind::FeatureUnsupported,
                format!(
                    "Cannot build column {} of type {}",
                    field.name(),
                    field.data_type()
                ),
            )
        };

        let builder = match field.data_type() {
            DataType::Int32 => ColumnBuilder::Int(Int32Builder::new()),
            DataType::Int64 => ColumnBuilder::Long(Int64Builder::new()),
            DataType::Utf8 => ColumnBuilder::String(StringBuilder::new()),
            DataType::LargeBinary => ColumnBuilder::Binary(LargeBinaryBuilder::new()),
            DataType::Map(entries, _) => {
                let DataType::Struct(key_value) = entries.data_type() else {
                    return Err(unsupported());
                };
                let [key, value] = &key_value[..] else {
                    return Err(unsupported());
                };
                match (key.data_type(), value.data_type()) {
                    (DataType::Int32, DataType::Int64) => ColumnBuilder::IntLongMap(map_builder(
                        entries,
                        key,
                        value,
                        Int32Builder::new(),
                        Int64Builder::new(),
                    )),
                    (DataType::Int32, DataType::Utf8) => {
                        ColumnBuilder::IntStringMap(map_builder(
                            entries,
                            key,
                            value,
                            Int32Builder::new(),
                            StringBuilder::new(),
                        ))
                    }
                    _ => return Err(unsupported()),
                }
            }
            DataType::List(element) => match element.data_type() {
                DataType::Int64 => ColumnBuilder::LongList(
                    ListBuilder::new(Int64Builder::new()).with_field(element.clone()),
                ),
                DataType::Int32 => ColumnBuilder::IntList(
                    ListBuilder::new(Int32Builder::new()).with_field(element.clone()),
                ),
                _ => return Err(unsupported()),
            },
            _ => return Err(unsupported()),
        };
        Ok(builder)
    }

    fn kind(&self) -> ColumnKind {
        match self {
            ColumnBuilder::Int(_) => ColumnKind::Int,
            ColumnBuilder::Long(_) => ColumnKind::Long,
            ColumnBuilder::String(_) => ColumnKind::String,
            ColumnBuilder::Binary(_) => ColumnKind::Binary,
            ColumnBuilder::IntLongMap(_) => ColumnKind::IntLongMap,
            ColumnBuilder::IntStringMap(_) => ColumnKind::IntStringMap,
            ColumnBuilder::LongList(_) => ColumnKind::LongList,
            ColumnBuilder::IntList(_) => ColumnKind::IntList,
        }
    }

    fn append_null(&mut self) -> Result<()> {
        match self {
            ColumnBuilder::Int(builder) => builder.append_null(),
            ColumnBuilder::Long(builder) => builder.append_null(),
            ColumnBuilder::String(builder) => builder.append_null(),
            ColumnBuilder::Binary(builder) => builder.append_null(),
            ColumnBuilder::IntLongMap(builder) => builder.append(false)?,
            ColumnBuilder::IntStringMap(builder) => builder.append(false)?,
            ColumnBuilder::LongList(builder) => builder.append_null(),
            ColumnBuilder::IntList(builder) => builder.append_null(),
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Int(builder) => Arc::new(builder.finish()),
            ColumnBuilder::Long(builder) => Arc::new(builder.finish()),
            ColumnBuilder::String(builder) => Arc::new(builder.finish()),
            ColumnBuilder::Binary(builder) => Arc::new(builder.finish()),
            ColumnBuilder::IntLongMap(builder) => Arc::new(builder.finish()),
            ColumnBuilder::IntStringMap(builder) => Arc::new(builder.finish()),
            ColumnBuilder::LongList(builder) => Arc::new(builder.finish()),
            ColumnBuilder::IntList(builder) => Arc::new(builder.finish()),
        }
    }
}

/// Map builders must reproduce the field names and field-id metadata of the
/// schema, otherwise the finished array's type would not match it.
fn map_builder<K: ArrayBuilder, V: ArrayBuilder>(
    entries: &FieldRef,
    key: &FieldRef,
    value: &FieldRef,
    key_builder: K,
    value_builder: V,
) -> MapBuilder<K, V> {
    let field_names = MapFieldNames {
        entry: entries.name().to_string(),
        key: key.name().to_string(),
        value: value.name().to_string(),
    };
    MapBuilder::new(Some(field_names), key_builder, value_builder)
        .with_keys_field(key.clone())
        .with_values_field(value.clone())
}

/// [`RowBuilder`] that collects rows into Arrow [`RecordBatch`]es of at most
/// `batch_size` rows.
pub struct RecordBatchRowBuilder {
    schema: ArrowSchemaRef,
    columns: Vec<ColumnBuilder>,
    batch_size: usize,
    /// Index of the next column to append to, `None` between rows.
    next_column: Option<usize>,
    pending_rows: usize,
    batches: Vec<RecordBatch>,
}

impl RecordBatchRowBuilder {
    /// Creates a builder for `schema`.
    ///
    /// Fails with [`ErrorKind::FeatureUnsupported`] if a column type has no
    /// `append_*` method.
    pub fn try_new(schema: ArrowSchemaRef, batch_size: usize) -> Result<Self> {
        ensure_data_valid!(batch_size > 0, "Batch size must be positive, got {}", batch_size);
        let columns = schema
            .fields()
            .iter()
            .map(ColumnBuilder::try_new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            schema,
            columns,
            batch_size,
            next_column: None,
            pending_rows: 0,
            batches: Vec::new(),
        })
    }

    /// Schema of the produced batches.
    pub fn schema(&self) -> ArrowSchemaRef {
        self.schema.clone()
    }

    /// Number of finished rows not yet cut into a batch.
    pub fn pending_rows(&self) -> usize {
        self.pending_rows
    }

    /// Cuts the pending rows into a batch, if there are any.
    pub fn flush(&mut self) -> Result<Option<RecordBatch>> {
        if self.next_column.is_some() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                "Cannot cut a batch in the middle of a row",
            ));
        }
        if self.pending_rows == 0 {
            return Ok(None);
        }

        let arrays = self.columns.iter_mut().map(ColumnBuilder::finish).collect();
        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.pending_rows = 0;
        Ok(Some(batch))
    }

    /// Returns every batch built so far, including a final partial one.
    pub fn finish(mut self) -> Result<Vec<RecordBatch>> {
        if let Some(batch) = self.flush()? {
            self.batches.push(batch);
        }
        Ok(self.batches)
    }

    fn current_column(&self) -> Result<usize> {
        let Some(index) = self.next_column else {
            return Err(Error::new(
                ErrorKind::Unexpected,
                "Value appended outside of a row",
            ));
        };
        if index >= self.columns.len() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Row has more than {} values", self.columns.len()),
            ));
        }
        Ok(index)
    }

    /// Runs `append` against the current column; `append` returns false
    /// when the column has a different type.
    fn append_with(
        &mut self,
        kind: ColumnKind,
        append: impl FnOnce(&mut ColumnBuilder) -> Result<bool>,
    ) -> Result<()> {
        let index = self.current_column()?;
        let column = &mut self.columns[index];
        let actual = column.kind();
        if !append(column)? {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Cannot append {kind} value to {actual} column"),
            )
            .with_context("column", self.schema.field(index).name().clone()));
        }
        self.next_column = Some(index + 1);
        Ok(())
    }
}

impl RowBuilder for RecordBatchRowBuilder {
    fn begin_row(&mut self) -> Result<()> {
        if self.next_column.is_some() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                "Previous row was not finished",
            ));
        }
        self.next_column = Some(0);
        Ok(())
    }

    fn append_int(&mut self, value: i32) -> Result<()> {
        self.append_with(ColumnKind::Int, |column| match column {
            ColumnBuilder::Int(builder) => {
                builder.append_value(value);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_long(&mut self, value: i64) -> Result<()> {
        self.append_with(ColumnKind::Long, |column| match column {
            ColumnBuilder::Long(builder) => {
                builder.append_value(value);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_string(&mut self, value: &str) -> Result<()> {
        self.append_with(ColumnKind::String, |column| match column {
            ColumnBuilder::String(builder) => {
                builder.append_value(value);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_binary(&mut self, value: &[u8]) -> Result<()> {
        self.append_with(ColumnKind::Binary, |column| match column {
            ColumnBuilder::Binary(builder) => {
                builder.append_value(value);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_int_long_map(&mut self, value: &BTreeMap<i32, i64>) -> Result<()> {
        self.append_with(ColumnKind::IntLongMap, |column| match column {
            ColumnBuilder::IntLongMap(builder) => {
                for (key, value) in value {
                    builder.keys().append_value(*key);
                    builder.values().append_value(*value);
                }
                builder.append(true)?;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_int_string_map(&mut self, value: &BTreeMap<i32, String>) -> Result<()> {
        self.append_with(ColumnKind::IntStringMap, |column| match column {
            ColumnBuilder::IntStringMap(builder) => {
                for (key, value) in value {
                    builder.keys().append_value(*key);
                    builder.values().append_value(value);
                }
                builder.append(true)?;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_long_list(&mut self, value: &[i64]) -> Result<()> {
        self.append_with(ColumnKind::LongList, |column| match column {
            ColumnBuilder::LongList(builder) => {
                builder.values().append_slice(value);
                builder.append(true);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_int_list(&mut self, value: &[i32]) -> Result<()> {
        self.append_with(ColumnKind::IntList, |column| match column {
            ColumnBuilder::IntList(builder) => {
                builder.values().append_slice(value);
                builder.append(true);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn append_null(&mut self) -> Result<()> {
        let index = self.current_column()?;
        let field = self.schema.field(index);
        if !field.is_nullable() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                "Cannot append null to a required column",
            )
            .with_context("column", field.name().clone()));
        }
        self.columns[index].append_null()?;
        self.next_column = Some(index + 1);
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        let Some(appended) = self.next_column else {
            return Err(Error::new(ErrorKind::Unexpected, "No row was started"));
        };
        if appended != self.columns.len() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!(
                    "Row has {appended} values but the schema has {} columns",
                    self.columns.len()
                ),
            ));
        }
        self.next_column = None;
        self.pending_rows += 1;

        if self.pending_rows >= self.batch_size {
            if let Some(batch) = self.flush()? {
                self.batches.push(batch);
            }
        }
        Ok(())
    }
}
