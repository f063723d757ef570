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

//! Conversion from Iceberg schemas to Arrow schemas.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::{DataType, Field, Fields, Schema as ArrowSchema, TimeUnit};
use parquet::arrow::PARQUET_FIELD_ID_META_KEY;

use crate::spec::{NestedField, PrimitiveType, Schema, Type};
use crate::{Error, ErrorKind, Result};

/// Name of the struct that holds a map's key and value.
pub const DEFAULT_MAP_FIELD_NAME: &str = "key_value";
/// Timezone Arrow uses for `timestamptz` columns.
pub const UTC_TIME_ZONE: &str = "+00:00";

/// Convert Iceberg schema to Arrow Schema.
pub fn schema_to_arrow_schema(schema: &Schema) -> Result<ArrowSchema> {
    let fields = schema
        .fields()
        .iter()
        .map(|field| nested_field_to_arrow_field(field))
        .collect::<Result<Vec<_>>>()?;
    Ok(ArrowSchema::new(fields))
}

/// Convert an Iceberg field to an Arrow field carrying its field id as metadata.
pub fn nested_field_to_arrow_field(field: &NestedField) -> Result<Field> {
    let data_type = type_to_arrow_type(&field.field_type)?;
    Ok(with_field_id(
        Field::new(&field.name, data_type, !field.required),
        field.id,
    ))
}

/// Convert Iceberg type to Arrow type.
pub fn type_to_arrow_type(ty: &Type) -> Result<DataType> {
    match ty {
        Type::Primitive(primitive) => primitive_to_arrow_type(primitive),
        Type::Struct(s) => {
            let fields = s
                .fields()
                .iter()
                .map(|field| nested_field_to_arrow_field(field))
                .collect::<Result<Vec<_>>>()?;
            Ok(DataType::Struct(Fields::from(fields)))
        }
        Type::List(list) => Ok(DataType::List(Arc::new(nested_field_to_arrow_field(
            &list.element_field,
        )?))),
        Type::Map(map) => {
            let key = nested_field_to_arrow_field(&map.key_field)?;
            let value = nested_field_to_arrow_field(&map.value_field)?;
            let entries = Field::new(
                DEFAULT_MAP_FIELD_NAME,
                DataType::Struct(Fields::from(vec![key, value])),
                false,
            );
            Ok(DataType::Map(Arc::new(entries), false))
        }
    }
}

fn primitive_to_arrow_type(primitive: &PrimitiveType) -> Result<DataType> {
    let data_type = match primitive {
        PrimitiveType::Boolean => DataType::Boolean,
        PrimitiveType::Int => DataType::Int32,
        PrimitiveType::Long => DataType::Int64,
        PrimitiveType::Float => DataType::Float32,
        PrimitiveType::Double => DataType::Float64,
        PrimitiveType::Decimal { precision, scale } => {
            let precision = u8::try_from(*precision)?;
            let scale = i8::try_from(*scale)?;
            DataType::Decimal128(precision, scale)
        }
        PrimitiveType::Date => DataType::Date32,
        PrimitiveType::Time => DataType::Time64(TimeUnit::Microsecond),
        PrimitiveType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        PrimitiveType::Timestamptz => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(UTC_TIME_ZONE.into()))
        }
        PrimitiveType::TimestampNs => DataType::Timestamp(TimeUnit::Nanosecond, None),
        PrimitiveType::TimestamptzNs => {
            DataType::Timestamp(TimeUnit::Nanosecond, Some(UTC_TIME_ZONE.into()))
        }
        PrimitiveType::String => DataType::Utf8,
        PrimitiveType::Uuid => DataType::FixedSizeBinary(16),
        PrimitiveType::Fixed(len) => DataType::FixedSizeBinary(i32::try_from(*len).map_err(
            |e| {
                Error::new(
                    ErrorKind::FeatureUnsupported,
                    format!("fixed[{len}] is too wide for Arrow"),
                )
                .with_source(e)
            },
        )?),
        PrimitiveType::Binary => DataType::LargeBinary,
    };
    Ok(data_type)
}

fn with_field_id(field: Field, field_id: i32) -> Field {
    field.with_metadata(HashMap::from([(
        PARQUET_FIELD_ID_META_KEY.to_string(),
        field_id.to_string(),
    )]))
}

/// Reads the Iceberg field id stored in an Arrow field's metadata.
pub fn arrow_field_id(field: &Field) -> Option<i32> {
    field
        .metadata()
        .get(PARQUET_FIELD_ID_META_KEY)
        .and_then(|id| id.parse().ok())
}
