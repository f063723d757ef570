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

//! Serialized shapes exchanged when an aggregation is answered from file
//! metadata instead of file contents.
//!
//! Only the data shapes live here; deciding which aggregations can be pushed
//! down is left to the engine.

use serde_derive::{Deserialize, Serialize};

use crate::spec::{DataFileFormat, NestedField, Type};

/// Field id of the synthetic column that carries a pushed-down `count(*)`.
///
/// Negative ids never collide with table columns, and this one sits far
/// below the ids the table format reserves for its own metadata columns.
pub const COUNT_AGGREGATE_FIELD_ID: i32 = i32::MIN + 1;

/// An aggregate function applied to one argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateExpression {
    /// Function name, e.g. `count`.
    pub function: String,
    /// Argument, e.g. `*` or a column name.
    pub argument: String,
    /// Whether an empty group yields null rather than a zero value.
    pub return_null_on_empty_group: bool,
}

impl AggregateExpression {
    /// Creates an aggregate expression.
    pub fn new(
        function: impl Into<String>,
        argument: impl Into<String>,
        return_null_on_empty_group: bool,
    ) -> Self {
        Self {
            function: function.into(),
            argument: argument.into(),
            return_null_on_empty_group,
        }
    }

    /// Column identity of the aggregate's result column, named
    /// `function(argument)`.
    pub fn to_column_identity(&self, id: i32) -> ColumnIdentity {
        ColumnIdentity {
            id,
            name: format!("{}({})", self.function, self.argument),
            type_category: TypeCategory::Primitive,
            children: Vec::new(),
        }
    }
}

/// Shape of a column's type, without the primitive details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeCategory {
    /// Any primitive type.
    Primitive,
    /// A struct.
    Struct,
    /// A list.
    Array,
    /// A map.
    Map,
}

/// Identity of a column: its field id, its name and those of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnIdentity {
    /// Field id.
    pub id: i32,
    /// Field name.
    pub name: String,
    /// Category of the field type.
    pub type_category: TypeCategory,
    /// Struct fields, the list element, or the map key and value.
    #[serde(default)]
    pub children: Vec<ColumnIdentity>,
}

impl From<&NestedField> for ColumnIdentity {
    fn from(field: &NestedField) -> Self {
        let type_category = match field.field_type.as_ref() {
            Type::Primitive(_) => TypeCategory::Primitive,
            Type::Struct(_) => TypeCategory::Struct,
            Type::List(_) => TypeCategory::Array,
            Type::Map(_) => TypeCategory::Map,
        };
        Self {
            id: field.id,
            name: field.name.clone(),
            type_category,
            children: field
                .field_type
                .child_fields()
                .into_iter()
                .map(|child| ColumnIdentity::from(child.as_ref()))
                .collect(),
        }
    }
}

/// A split whose row count is already known from file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSplit {
    /// Path of the data file.
    pub path: String,
    /// Byte offset where the split starts.
    pub start: i64,
    /// Length of the split in bytes.
    pub length: i64,
    /// Size of the whole file in bytes.
    pub file_size: i64,
    /// Records in the whole file.
    pub file_record_count: i64,
    /// Format of the file.
    pub file_format: DataFileFormat,
    /// Precomputed aggregate row count for this split.
    pub total_count: i64,
}
