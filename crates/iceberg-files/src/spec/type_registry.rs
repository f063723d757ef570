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
use std::collections::hash_map::Entry;

use super::{NestedFieldRef, Schema, Type};
use crate::{Error, ErrorKind, Result};

/// Flat lookup from field id to the declared type of that field.
///
/// Built by walking every field of a schema depth-first, so list elements,
/// map keys and map values are registered under their own ids alongside
/// top-level and struct fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    id_to_type: HashMap<i32, Type>,
}

impl TypeRegistry {
    /// Flattens `schema` into a registry.
    pub fn build(schema: &Schema) -> Result<Self> {
        Self::try_from_fields(schema.fields())
    }

    /// Flattens a list of top-level fields into a registry.
    ///
    /// Fails with [`ErrorKind::SchemaInconsistency`] when two fields anywhere in
    /// the tree share an id.
    pub fn try_from_fields(fields: &[NestedFieldRef]) -> Result<Self> {
        let mut registry = Self::default();
        for field in fields {
            registry.visit(field)?;
        }
        Ok(registry)
    }

    fn visit(&mut self, field: &NestedFieldRef) -> Result<()> {
        match self.id_to_type.entry(field.id) {
            Entry::Occupied(existing) => {
                return Err(Error::new(
                    ErrorKind::SchemaInconsistency,
                    "Duplicate field id in schema",
                )
                .with_context("field_id", field.id.to_string())
                .with_context("existing_type", existing.get().to_string())
                .with_context("field_name", field.name.clone()));
            }
            Entry::Vacant(slot) => {
                slot.insert(field.field_type.as_ref().clone());
            }
        }

        for child in field.field_type.child_fields() {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Returns the declared type of `field_id`, if the schema has such a field.
    pub fn get(&self, field_id: i32) -> Option<&Type> {
        self.id_to_type.get(&field_id)
    }

    /// Whether the schema declares `field_id`.
    pub fn contains(&self, field_id: i32) -> bool {
        self.id_to_type.contains_key(&field_id)
    }

    /// Number of registered fields, nested ones included.
    pub fn len(&self) -> usize {
        self.id_to_type.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.id_to_type.is_empty()
    }

    /// Iterates over all `(field_id, type)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Type)> {
        self.id_to_type.iter().map(|(id, ty)| (*id, ty))
    }
}
