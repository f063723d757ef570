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

use crate::spec::{Datum, Type, TypeRegistry};
use crate::{Error, ErrorKind, Result};

/// Turns serialized column bounds into human-readable strings.
///
/// Bytes are read with the single-value binary serialization of the column's
/// declared type, then rendered the way the identity partition transform
/// renders values (`2024-01-31`, `1.0E10`, hyphenated uuids, base64 for
/// binary).
#[derive(Debug, Clone)]
pub struct BoundDecoder {
    registry: Arc<TypeRegistry>,
}

impl BoundDecoder {
    /// Creates a decoder that looks column types up in `registry`.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Decodes one bound of type `ty`.
    pub fn decode(ty: &Type, bytes: &[u8]) -> Result<String> {
        match ty {
            Type::Primitive(primitive) => {
                Ok(Datum::try_from_bytes(bytes, primitive.clone())?.to_string())
            }
            nested => Err(Error::new(
                ErrorKind::DecodeFailure,
                "Bounds can only be decoded for primitive types",
            )
            .with_context("type", nested.to_string())),
        }
    }

    /// Decodes every bound whose field id is known, ordered by field id.
    ///
    /// Ids missing from the registry belong to columns dropped from the
    /// schema and are skipped.
    pub fn decode_bounds(&self, bounds: &HashMap<i32, Vec<u8>>) -> Result<BTreeMap<i32, String>> {
        let mut decoded = BTreeMap::new();
        for (field_id, bytes) in bounds {
            let Some(ty) = self.registry.get(*field_id) else {
                tracing::trace!(field_id, "dropping bound for unknown field id");
                continue;
            };
            let value = Self::decode(ty, bytes)
                .map_err(|err| err.with_context("field_id", field_id.to_string()))?;
            decoded.insert(*field_id, value);
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{NestedField, PrimitiveType, Schema, StructType};

    fn decoder() -> BoundDecoder {
        let schema = Schema::builder()
            .with_fields(vec![
                NestedField::required(1, "id", PrimitiveType::Long.into()).into(),
                NestedField::optional(2, "name", PrimitiveType::String.into()).into(),
                NestedField::optional(
                    3,
                    "point",
                    Type::Struct(StructType::new(vec![
                        NestedField::required(4, "x", PrimitiveType::Double.into()).into(),
                    ])),
                )
                .into(),
            ])
            .build()
            .unwrap();
        BoundDecoder::new(Arc::new(TypeRegistry::build(&schema).unwrap()))
    }

    #[test]
    fn test_decode_long() {
        let ty = PrimitiveType::Long.into();
        assert_eq!(
            BoundDecoder::decode(&ty, &42i64.to_le_bytes()).unwrap(),
            "42"
        );
        // Deterministic across calls.
        assert_eq!(
            BoundDecoder::decode(&ty, &42i64.to_le_bytes()).unwrap(),
            BoundDecoder::decode(&ty, &42i64.to_le_bytes()).unwrap()
        );
    }

    #[test]
    fn test_decode_nested_type_fails() {
        let ty = Type::Struct(StructType::new(vec![]));
        let err = BoundDecoder::decode(&ty, &[1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_decode_bounds_drops_unknown_ids() {
        let bounds = HashMap::from([
            (1, 5i64.to_le_bytes().to_vec()),
            (42, vec![0xde, 0xad]),
            (4, 2.5f64.to_le_bytes().to_vec()),
        ]);

        let decoded = decoder().decode_bounds(&bounds).unwrap();
        assert_eq!(
            decoded,
            BTreeMap::from([(1, "5".to_string()), (4, "2.5".to_string())])
        );
        assert!(decoder().decode_bounds(&HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_bounds_reports_field_id() {
        let bounds = HashMap::from([(1, vec![0u8; 3])]);
        let err = decoder().decode_bounds(&bounds).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(err.to_string().contains("field_id: 1"));
    }
}
