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

//! Iceberg data types.
//!
//! Types form a tree: [`Type::Primitive`] leaves and the nested [`Type::Struct`],
//! [`Type::List`] and [`Type::Map`] variants, each carrying its child fields.
//! Every field, including list elements and map keys/values, has its own id.
//!
//! See: <https://iceberg.apache.org/spec/#schemas-and-data-types>

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};

use crate::{Error, ErrorKind, Result};

use _serde::SerdeType;

/// Field name for list type.
pub const LIST_FIELD_NAME: &str = "element";
/// Field name for map key.
pub const MAP_KEY_FIELD_NAME: &str = "key";
/// Field name for map value.
pub const MAP_VALUE_FIELD_NAME: &str = "value";

const MAX_DECIMAL_PRECISION: u32 = 38;

/// All data types are either primitives or nested types, which are maps, lists, or structs.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(into = "SerdeType", try_from = "SerdeType")]
pub enum Type {
    /// Primitive types
    Primitive(PrimitiveType),
    /// Struct type
    Struct(StructType),
    /// List type.
    List(ListType),
    /// Map type
    Map(MapType),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(primitive) => write!(f, "{primitive}"),
            Type::Struct(s) => write!(f, "{s}"),
            Type::List(list) => write!(f, "list<{}>", list.element_field.field_type),
            Type::Map(map) => write!(
                f,
                "map<{}, {}>",
                map.key_field.field_type, map.value_field.field_type
            ),
        }
    }
}

impl Type {
    /// Whether the type is primitive type.
    #[inline(always)]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Whether the type is struct type.
    #[inline(always)]
    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    /// Whether the type is nested type.
    #[inline(always)]
    pub fn is_nested(&self) -> bool {
        !self.is_primitive()
    }

    /// Convert Type to reference of PrimitiveType
    pub fn as_primitive_type(&self) -> Option<&PrimitiveType> {
        if let Type::Primitive(primitive_type) = self {
            Some(primitive_type)
        } else {
            None
        }
    }

    /// Returns the direct child fields of a nested type, in declaration order.
    ///
    /// Primitive types have no children.
    pub fn child_fields(&self) -> Vec<&NestedFieldRef> {
        match self {
            Type::Primitive(_) => vec![],
            Type::Struct(s) => s.fields().iter().collect(),
            Type::List(list) => vec![&list.element_field],
            Type::Map(map) => vec![&map.key_field, &map.value_field],
        }
    }

    /// Creates a decimal type, validating its precision.
    pub fn decimal(precision: u32, scale: u32) -> Result<Self> {
        validate_decimal(precision, scale)?;
        Ok(Type::Primitive(PrimitiveType::Decimal { precision, scale }))
    }
}

/// Checks that `decimal(precision, scale)` is a valid type.
pub(crate) fn validate_decimal(precision: u32, scale: u32) -> Result<()> {
    if precision == 0 || precision > MAX_DECIMAL_PRECISION {
        return Err(Error::new(
            ErrorKind::DataInvalid,
            format!("Decimal precision must be in [1, {MAX_DECIMAL_PRECISION}], got {precision}"),
        ));
    }
    if scale > precision {
        return Err(Error::new(
            ErrorKind::DataInvalid,
            format!("Decimal scale {scale} exceeds precision {precision}"),
        ));
    }
    Ok(())
}

impl From<PrimitiveType> for Type {
    fn from(value: PrimitiveType) -> Self {
        Self::Primitive(value)
    }
}

impl From<StructType> for Type {
    fn from(value: StructType) -> Self {
        Type::Struct(value)
    }
}

impl From<ListType> for Type {
    fn from(value: ListType) -> Self {
        Type::List(value)
    }
}

impl From<MapType> for Type {
    fn from(value: MapType) -> Self {
        Type::Map(value)
    }
}

/// Primitive data types
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PrimitiveType {
    /// True or False
    Boolean,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754 floating point.
    Float,
    /// 64-bit IEEE 754 floating point.
    Double,
    /// Fixed point decimal
    Decimal {
        /// Precision, must be 38 or less
        precision: u32,
        /// Scale
        scale: u32,
    },
    /// Calendar date without timezone or time.
    Date,
    /// Time of day in microsecond precision, without date or timezone.
    Time,
    /// Timestamp in microsecond precision, without timezone
    Timestamp,
    /// Timestamp in microsecond precision, with timezone
    Timestamptz,
    /// Timestamp in nanosecond precision, without timezone
    TimestampNs,
    /// Timestamp in nanosecond precision with timezone
    TimestamptzNs,
    /// Arbitrary-length character sequences encoded in utf-8
    String,
    /// Universally Unique Identifiers, should use 16-byte fixed
    Uuid,
    /// Fixed length byte array
    Fixed(u64),
    /// Arbitrary-length byte array.
    Binary,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Boolean => write!(f, "boolean"),
            PrimitiveType::Int => write!(f, "int"),
            PrimitiveType::Long => write!(f, "long"),
            PrimitiveType::Float => write!(f, "float"),
            PrimitiveType::Double => write!(f, "double"),
            PrimitiveType::Decimal { precision, scale } => {
                write!(f, "decimal({precision}, {scale})")
            }
            PrimitiveType::Date => write!(f, "date"),
            PrimitiveType::Time => write!(f, "time"),
            PrimitiveType::Timestamp => write!(f, "timestamp"),
            PrimitiveType::Timestamptz => write!(f, "timestamptz"),
            PrimitiveType::TimestampNs => write!(f, "timestamp_ns"),
            PrimitiveType::TimestamptzNs => write!(f, "timestamptz_ns"),
            PrimitiveType::String => write!(f, "string"),
            PrimitiveType::Uuid => write!(f, "uuid"),
            PrimitiveType::Fixed(size) => write!(f, "fixed[{size}]"),
            PrimitiveType::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let primitive = match trimmed {
            "boolean" => PrimitiveType::Boolean,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            "date" => PrimitiveType::Date,
            "time" => PrimitiveType::Time,
            "timestamp" => PrimitiveType::Timestamp,
            "timestamptz" => PrimitiveType::Timestamptz,
            "timestamp_ns" => PrimitiveType::TimestampNs,
            "timestamptz_ns" => PrimitiveType::TimestamptzNs,
            "string" => PrimitiveType::String,
            "uuid" => PrimitiveType::Uuid,
            "binary" => PrimitiveType::Binary,
            other => {
                if let Some(args) = other
                    .strip_prefix("decimal(")
                    .and_then(|rest| rest.strip_suffix(')'))
                {
                    let (precision, scale) = args.split_once(',').ok_or_else(|| {
                        Error::new(
                            ErrorKind::DataInvalid,
                            format!("Invalid decimal type: {other}"),
                        )
                    })?;
                    let precision = parse_type_argument(precision, other)?;
                    let scale = parse_type_argument(scale, other)?;
                    validate_decimal(precision, scale)?;
                    return Ok(PrimitiveType::Decimal { precision, scale });
                }
                if let Some(length) = other
                    .strip_prefix("fixed[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    let length = length.trim().parse::<u64>().map_err(|e| {
                        Error::new(
                            ErrorKind::DataInvalid,
                            format!("Invalid fixed type: {other}"),
                        )
                        .with_source(e)
                    })?;
                    return Ok(PrimitiveType::Fixed(length));
                }
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!("Unknown primitive type: {other}"),
                ));
            }
        };
        Ok(primitive)
    }
}

fn parse_type_argument(arg: &str, type_name: &str) -> Result<u32> {
    arg.trim().parse::<u32>().map_err(|e| {
        Error::new(
            ErrorKind::DataInvalid,
            format!("Invalid argument in type {type_name}"),
        )
        .with_source(e)
    })
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for PrimitiveType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// DataType for a specific struct
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct StructType {
    fields: Vec<NestedFieldRef>,
}

impl StructType {
    /// Creates a struct type with the given fields.
    pub fn new(fields: Vec<NestedFieldRef>) -> Self {
        Self { fields }
    }

    /// Get struct field with certain id
    pub fn field_by_id(&self, id: i32) -> Option<&NestedFieldRef> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Get struct field with certain field name
    pub fn field_by_name(&self, name: &str) -> Option<&NestedFieldRef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Get fields.
    pub fn fields(&self) -> &[NestedFieldRef] {
        &self.fields
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct<")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.field_type)?;
        }
        write!(f, ">")
    }
}

/// Reference to nested field.
pub type NestedFieldRef = Arc<NestedField>;

/// A struct is a tuple of typed values. Each field in the tuple is named and has an
/// integer id that is unique in the table schema.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NestedField {
    /// Id unique in table schema
    pub id: i32,
    /// Field Name
    pub name: String,
    /// Optional or required
    pub required: bool,
    /// Datatype
    #[serde(rename = "type")]
    pub field_type: Box<Type>,
    /// Fields may have an optional comment or doc string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl NestedField {
    /// Construct a new field.
    pub fn new(id: i32, name: impl ToString, field_type: Type, required: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            required,
            field_type: Box::new(field_type),
            doc: None,
        }
    }

    /// Construct a required field.
    pub fn required(id: i32, name: impl ToString, field_type: Type) -> Self {
        Self::new(id, name, field_type, true)
    }

    /// Construct an optional field.
    pub fn optional(id: i32, name: impl ToString, field_type: Type) -> Self {
        Self::new(id, name, field_type, false)
    }

    /// Construct list type's element field.
    pub fn list_element(id: i32, field_type: Type, required: bool) -> Self {
        Self::new(id, LIST_FIELD_NAME, field_type, required)
    }

    /// Construct map type's key field.
    pub fn map_key_element(id: i32, field_type: Type) -> Self {
        Self::required(id, MAP_KEY_FIELD_NAME, field_type)
    }

    /// Construct map type's value field.
    pub fn map_value_element(id: i32, field_type: Type, required: bool) -> Self {
        Self::new(id, MAP_VALUE_FIELD_NAME, field_type, required)
    }

    /// Set the field's doc.
    pub fn with_doc(mut self, doc: impl ToString) -> Self {
        self.doc = Some(doc.to_string());
        self
    }
}

/// A list is a collection of values with some element type. The element field has an integer id
/// that is unique in the table schema.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ListType {
    /// Element field of list type.
    pub element_field: NestedFieldRef,
}

impl ListType {
    /// Construct a list type with the given element field.
    pub fn new(element_field: NestedFieldRef) -> Self {
        Self { element_field }
    }
}

/// A map is a collection of key-value pairs with a key type and a value type.
/// Both the key field and value field each have an integer id that is unique
/// in the table schema. Map keys are required and map values can be either
/// optional or required.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MapType {
    /// Field for key.
    pub key_field: NestedFieldRef,
    /// Field for value.
    pub value_field: NestedFieldRef,
}

impl MapType {
    /// Construct a map type with the given key and value fields.
    pub fn new(key_field: NestedFieldRef, value_field: NestedFieldRef) -> Self {
        Self {
            key_field,
            value_field,
        }
    }
}

mod _serde {
    use std::sync::Arc;

    use serde_derive::{Deserialize, Serialize};

    use super::{ListType, MapType, NestedField, NestedFieldRef, PrimitiveType, StructType, Type};
    use crate::{Error, ErrorKind};

    /// List type for serialization and deserialization
    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    pub(super) enum SerdeType {
        #[serde(rename_all = "kebab-case")]
        List {
            r#type: String,
            element_id: i32,
            element_required: bool,
            element: Box<Type>,
        },
        Struct {
            r#type: String,
            fields: Vec<NestedFieldRef>,
        },
        #[serde(rename_all = "kebab-case")]
        Map {
            r#type: String,
            key_id: i32,
            key: Box<Type>,
            value_id: i32,
            value_required: bool,
            value: Box<Type>,
        },
        Primitive(PrimitiveType),
    }

    fn expect_tag(found: &str, expected: &str) -> Result<(), Error> {
        if found == expected {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::DataInvalid,
                format!("Expected type tag '{expected}', found '{found}'"),
            ))
        }
    }

    impl TryFrom<SerdeType> for Type {
        type Error = Error;

        fn try_from(value: SerdeType) -> Result<Self, Error> {
            match value {
                SerdeType::List {
                    r#type,
                    element_id,
                    element_required,
                    element,
                } => {
                    expect_tag(&r#type, "list")?;
                    Ok(Type::List(ListType::new(Arc::new(
                        NestedField::list_element(element_id, *element, element_required),
                    ))))
                }
                SerdeType::Struct { r#type, fields } => {
                    expect_tag(&r#type, "struct")?;
                    Ok(Type::Struct(StructType::new(fields)))
                }
                SerdeType::Map {
                    r#type,
                    key_id,
                    key,
                    value_id,
                    value_required,
                    value,
                } => {
                    expect_tag(&r#type, "map")?;
                    Ok(Type::Map(MapType::new(
                        Arc::new(NestedField::map_key_element(key_id, *key)),
                        Arc::new(NestedField::map_value_element(
                            value_id,
                            *value,
                            value_required,
                        )),
                    )))
                }
                SerdeType::Primitive(primitive) => Ok(Type::Primitive(primitive)),
            }
        }
    }

    impl From<Type> for SerdeType {
        fn from(value: Type) -> Self {
            match value {
                Type::List(list) => SerdeType::List {
                    r#type: "list".to_string(),
                    element_id: list.element_field.id,
                    element_required: list.element_field.required,
                    element: list.element_field.field_type.clone(),
                },
                Type::Map(map) => SerdeType::Map {
                    r#type: "map".to_string(),
                    key_id: map.key_field.id,
                    key: map.key_field.field_type.clone(),
                    value_id: map.value_field.id,
                    value_required: map.value_field.required,
                    value: map.value_field.field_type.clone(),
                },
                Type::Struct(s) => SerdeType::Struct {
                    r#type: "struct".to_string(),
                    fields: s.fields,
                },
                Type::Primitive(primitive) => SerdeType::Primitive(primitive),
            }
        }
    }
}
