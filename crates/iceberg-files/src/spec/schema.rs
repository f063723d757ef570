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

//! This module defines schema in iceberg.

use std::fmt;
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};

use super::{NestedFieldRef, StructType, TypeRegistry};
use crate::{Error, Result};

use _serde::SchemaSerde;

/// Type alias for schema id.
pub type SchemaId = i32;
/// Reference to [`Schema`].
pub type SchemaRef = Arc<Schema>;

const DEFAULT_SCHEMA_ID: SchemaId = 0;

/// Defines schema in iceberg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaSerde", into = "SchemaSerde")]
pub struct Schema {
    schema_id: SchemaId,
    r#struct: StructType,
    identifier_field_ids: Vec<i32>,
}

/// Schema builder.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema_id: SchemaId,
    fields: Vec<NestedFieldRef>,
    identifier_field_ids: Vec<i32>,
}

impl SchemaBuilder {
    /// Add fields to schema builder.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = NestedFieldRef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Set schema id.
    pub fn with_schema_id(mut self, schema_id: SchemaId) -> Self {
        self.schema_id = schema_id;
        self
    }

    /// Set identifier field ids.
    pub fn with_identifier_field_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.identifier_field_ids.extend(ids);
        self
    }

    /// Builds the schema.
    ///
    /// Fails with [`crate::ErrorKind::SchemaInconsistency`] if any two fields of
    /// the tree share an id.
    pub fn build(self) -> Result<Schema> {
        TypeRegistry::try_from_fields(&self.fields)?;

        Ok(Schema {
            schema_id: self.schema_id,
            r#struct: StructType::new(self.fields),
            identifier_field_ids: self.identifier_field_ids,
        })
    }
}

impl Schema {
    /// Create a schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            schema_id: DEFAULT_SCHEMA_ID,
            fields: vec![],
            identifier_field_ids: vec![],
        }
    }

    /// Returns the schema id.
    #[inline]
    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    /// Returns the schema as a struct type.
    #[inline]
    pub fn as_struct(&self) -> &StructType {
        &self.r#struct
    }

    /// Returns the top level fields of the schema.
    #[inline]
    pub fn fields(&self) -> &[NestedFieldRef] {
        self.r#struct.fields()
    }

    /// Get top level field by id.
    pub fn field_by_id(&self, field_id: i32) -> Option<&NestedFieldRef> {
        self.r#struct.field_by_id(field_id)
    }

    /// Get top level field by name.
    pub fn field_by_name(&self, field_name: &str) -> Option<&NestedFieldRef> {
        self.r#struct.field_by_name(field_name)
    }

    /// Returns the identifier field ids.
    pub fn identifier_field_ids(&self) -> impl ExactSizeIterator<Item = i32> + '_ {
        self.identifier_field_ids.iter().copied()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "table {{")?;
        for field in self.fields() {
            let requirement = if field.required {
                "required"
            } else {
                "optional"
            };
            writeln!(
                f,
                "  {}: {}: {} {}",
                field.id, field.name, requirement, field.field_type
            )?;
        }
        writeln!(f, "}}")
    }
}

impl TryFrom<_serde::SchemaSerde> for Schema {
    type Error = Error;

    fn try_from(value: _serde::SchemaSerde) -> Result<Self> {
        Schema::builder()
            .with_schema_id(value.schema_id)
            .with_fields(value.fields)
            .with_identifier_field_ids(value.identifier_field_ids.unwrap_or_default())
            .build()
    }
}

impl From<Schema> for _serde::SchemaSerde {
    fn from(value: Schema) -> Self {
        let identifier_field_ids = if value.identifier_field_ids.is_empty() {
            None
        } else {
            Some(value.identifier_field_ids)
        };
        _serde::SchemaSerde {
            r#type: "struct".to_string(),
            schema_id: value.schema_id,
            identifier_field_ids,
            fields: value.r#struct.fields().to_vec(),
        }
    }
}

mod _serde {
    use serde_derive::{Deserialize, Serialize};

    use crate::spec::NestedFieldRef;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub(super) struct SchemaSerde {
        #[serde(default = "struct_tag")]
        pub r#type: String,
        #[serde(default)]
        pub schema_id: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub identifier_field_ids: Option<Vec<i32>>,
        pub fields: Vec<NestedFieldRef>,
    }

    fn struct_tag() -> String {
        "struct".to_string()
    }
}
