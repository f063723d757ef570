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

//! Single values of primitive types.
//!
//! A [`Datum`] is what a lower or upper bound in a manifest decodes to. It is
//! created from Iceberg's single-value binary serialization with
//! [`Datum::try_from_bytes`] and rendered with its `Display` impl, which
//! produces the identity transform's human string.
//!
//! See: <https://iceberg.apache.org/spec/#binary-single-value-serialization>

use std::fmt;
use std::fmt::{Display, Formatter};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chrono::{Datelike, NaiveDate};
use ordered_float::OrderedFloat;
use uuid::Uuid;

use super::PrimitiveType;
use super::datatypes::validate_decimal;
use crate::{Error, ErrorKind, Result};

const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const MICROS_PER_DAY: i64 = 86_400_000_000;
const NANOS_PER_DAY: i64 = 86_400_000_000_000;
const NANOS_PER_MICRO: i64 = 1_000;
const MAX_DECIMAL_BYTES: usize = 16;

/// Values present in iceberg type
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveLiteral {
    /// 0x00 for false, non-zero byte for true
    Boolean(bool),
    /// Stored as 4-byte little-endian
    Int(i32),
    /// Stored as 8-byte little-endian
    Long(i64),
    /// Stored as 4-byte little-endian
    Float(OrderedFloat<f32>),
    /// Stored as 8-byte little-endian
    Double(OrderedFloat<f64>),
    /// UTF-8 bytes (without length)
    String(String),
    /// Binary value (without length)
    Binary(Vec<u8>),
    /// Stored as 16-byte little-endian
    Int128(i128),
    /// Stored as 16-byte little-endian
    UInt128(u128),
}

/// Literal associated with its type. The value and type pair is checked when
/// constructing, so a datum is always valid and renders without failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Datum {
    r#type: PrimitiveType,
    literal: PrimitiveLiteral,
}

impl Datum {
    /// Creates a boolean value.
    pub fn bool(value: bool) -> Self {
        Self {
            r#type: PrimitiveType::Boolean,
            literal: PrimitiveLiteral::Boolean(value),
        }
    }

    /// Creates an int value.
    pub fn int(value: i32) -> Self {
        Self {
            r#type: PrimitiveType::Int,
            literal: PrimitiveLiteral::Int(value),
        }
    }

    /// Creates a long value.
    pub fn long(value: i64) -> Self {
        Self {
            r#type: PrimitiveType::Long,
            literal: PrimitiveLiteral::Long(value),
        }
    }

    /// Creates a float value.
    pub fn float(value: f32) -> Self {
        Self {
            r#type: PrimitiveType::Float,
            literal: PrimitiveLiteral::Float(OrderedFloat(value)),
        }
    }

    /// Creates a double value.
    pub fn double(value: f64) -> Self {
        Self {
            r#type: PrimitiveType::Double,
            literal: PrimitiveLiteral::Double(OrderedFloat(value)),
        }
    }

    /// Creates a date from days since the unix epoch.
    pub fn date(days: i32) -> Result<Self> {
        civil_date(i64::from(days)).ok_or_else(|| out_of_range("date", days))?;
        Ok(Self {
            r#type: PrimitiveType::Date,
            literal: PrimitiveLiteral::Int(days),
        })
    }

    /// Creates a time of day from microseconds since midnight.
    pub fn time_micros(micros: i64) -> Result<Self> {
        if !(0..MICROS_PER_DAY).contains(&micros) {
            return Err(out_of_range("time", micros));
        }
        Ok(Self {
            r#type: PrimitiveType::Time,
            literal: PrimitiveLiteral::Long(micros),
        })
    }

    /// Creates a timestamp without timezone from microseconds since the epoch.
    pub fn timestamp_micros(micros: i64) -> Result<Self> {
        Self::temporal(PrimitiveType::Timestamp, micros, MICROS_PER_DAY)
    }

    /// Creates a timestamp with timezone from microseconds since the epoch.
    pub fn timestamptz_micros(micros: i64) -> Result<Self> {
        Self::temporal(PrimitiveType::Timestamptz, micros, MICROS_PER_DAY)
    }

    /// Creates a timestamp without timezone from nanoseconds since the epoch.
    pub fn timestamp_nanos(nanos: i64) -> Result<Self> {
        Self::temporal(PrimitiveType::TimestampNs, nanos, NANOS_PER_DAY)
    }

    /// Creates a timestamp with timezone from nanoseconds since the epoch.
    pub fn timestamptz_nanos(nanos: i64) -> Result<Self> {
        Self::temporal(PrimitiveType::TimestamptzNs, nanos, NANOS_PER_DAY)
    }

    fn temporal(r#type: PrimitiveType, value: i64, units_per_day: i64) -> Result<Self> {
        civil_date(value.div_euclid(units_per_day))
            .ok_or_else(|| out_of_range(&r#type.to_string(), value))?;
        Ok(Self {
            r#type,
            literal: PrimitiveLiteral::Long(value),
        })
    }

    /// Creates a string value.
    pub fn string(value: impl ToString) -> Self {
        Self {
            r#type: PrimitiveType::String,
            literal: PrimitiveLiteral::String(value.to_string()),
        }
    }

    /// Creates a uuid value.
    pub fn uuid(value: Uuid) -> Self {
        Self {
            r#type: PrimitiveType::Uuid,
            literal: PrimitiveLiteral::UInt128(value.as_u128()),
        }
    }

    /// Creates a fixed value; its length is the length of the type.
    pub fn fixed(value: impl IntoIterator<Item = u8>) -> Self {
        let value: Vec<u8> = value.into_iter().collect();
        Self {
            r#type: PrimitiveType::Fixed(value.len() as u64),
            literal: PrimitiveLiteral::Binary(value),
        }
    }

    /// Creates a binary value.
    pub fn binary(value: impl IntoIterator<Item = u8>) -> Self {
        Self {
            r#type: PrimitiveType::Binary,
            literal: PrimitiveLiteral::Binary(value.into_iter().collect()),
        }
    }

    /// Creates a decimal from its unscaled value.
    pub fn decimal(unscaled: i128, precision: u32, scale: u32) -> Result<Self> {
        validate_decimal(precision, scale)?;
        let digits = unscaled.unsigned_abs().checked_ilog10().map_or(1, |d| d + 1);
        if digits > precision {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                format!("Decimal value {unscaled} exceeds precision {precision}"),
            ));
        }
        Ok(Self {
            r#type: PrimitiveType::Decimal { precision, scale },
            literal: PrimitiveLiteral::Int128(unscaled),
        })
    }

    /// Returns the type of the value.
    pub fn data_type(&self) -> &PrimitiveType {
        &self.r#type
    }

    /// Returns the underlying literal.
    pub fn literal(&self) -> &PrimitiveLiteral {
        &self.literal
    }

    /// Decodes a value of type `data_type` from Iceberg's single-value binary
    /// serialization.
    ///
    /// `long` also accepts the 4-byte form of an `int` and `double` the 4-byte
    /// form of a `float`, since bounds written before a type promotion keep their
    /// original width.
    pub fn try_from_bytes(bytes: &[u8], data_type: PrimitiveType) -> Result<Self> {
        let datum = match &data_type {
            PrimitiveType::Boolean => {
                let [byte] = fixed_width::<1>(bytes, &data_type)?;
                Datum::bool(byte != 0)
            }
            PrimitiveType::Int => Datum::int(i32::from_le_bytes(fixed_width(bytes, &data_type)?)),
            PrimitiveType::Long => match bytes.len() {
                4 => Datum::long(i64::from(i32::from_le_bytes(fixed_width(
                    bytes, &data_type,
                )?))),
                _ => Datum::long(i64::from_le_bytes(fixed_width(bytes, &data_type)?)),
            },
            PrimitiveType::Float => {
                Datum::float(f32::from_le_bytes(fixed_width(bytes, &data_type)?))
            }
            PrimitiveType::Double => match bytes.len() {
                4 => Datum::double(f64::from(f32::from_le_bytes(fixed_width(
                    bytes, &data_type,
                )?))),
                _ => Datum::double(f64::from_le_bytes(fixed_width(bytes, &data_type)?)),
            },
            PrimitiveType::Date => {
                Datum::date(i32::from_le_bytes(fixed_width(bytes, &data_type)?))
                    .map_err(into_decode_failure)?
            }
            PrimitiveType::Time => {
                Datum::time_micros(i64::from_le_bytes(fixed_width(bytes, &data_type)?))
                    .map_err(into_decode_failure)?
            }
            PrimitiveType::Timestamp
            | PrimitiveType::Timestamptz
            | PrimitiveType::TimestampNs
            | PrimitiveType::TimestamptzNs => {
                let value = i64::from_le_bytes(fixed_width(bytes, &data_type)?);
                let units_per_day = match data_type {
                    PrimitiveType::TimestampNs | PrimitiveType::TimestamptzNs => NANOS_PER_DAY,
                    _ => MICROS_PER_DAY,
                };
                Datum::temporal(data_type.clone(), value, units_per_day)
                    .map_err(into_decode_failure)?
            }
            PrimitiveType::String => {
                let value = std::str::from_utf8(bytes).map_err(|e| {
                    decode_failure(&data_type, bytes, "invalid utf-8 in string bound")
                        .with_source(e)
                })?;
                Datum::string(value)
            }
            PrimitiveType::Uuid => Datum::uuid(Uuid::from_bytes(fixed_width(bytes, &data_type)?)),
            PrimitiveType::Fixed(len) => {
                if bytes.len() as u64 != *len {
                    return Err(decode_failure(
                        &data_type,
                        bytes,
                        format!("expected {len} bytes, got {}", bytes.len()),
                    ));
                }
                Datum::fixed(bytes.iter().copied())
            }
            PrimitiveType::Binary => Datum::binary(bytes.iter().copied()),
            PrimitiveType::Decimal { precision, scale } => {
                if bytes.is_empty() || bytes.len() > MAX_DECIMAL_BYTES {
                    return Err(decode_failure(
                        &data_type,
                        bytes,
                        format!(
                            "expected 1 to {MAX_DECIMAL_BYTES} bytes, got {}",
                            bytes.len()
                        ),
                    ));
                }
                // Sign-extend the big-endian two's complement value to 16 bytes.
                let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
                let mut buf = [fill; MAX_DECIMAL_BYTES];
                buf[MAX_DECIMAL_BYTES - bytes.len()..].copy_from_slice(bytes);
                Datum {
                    r#type: PrimitiveType::Decimal {
                        precision: *precision,
                        scale: *scale,
                    },
                    literal: PrimitiveLiteral::Int128(i128::from_be_bytes(buf)),
                }
            }
        };
        Ok(datum)
    }

    /// Encodes the value with Iceberg's single-value binary serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.literal {
            PrimitiveLiteral::Boolean(v) => vec![u8::from(*v)],
            PrimitiveLiteral::Int(v) => v.to_le_bytes().to_vec(),
            PrimitiveLiteral::Long(v) => v.to_le_bytes().to_vec(),
            PrimitiveLiteral::Float(v) => v.0.to_le_bytes().to_vec(),
            PrimitiveLiteral::Double(v) => v.0.to_le_bytes().to_vec(),
            PrimitiveLiteral::String(v) => v.as_bytes().to_vec(),
            PrimitiveLiteral::Binary(v) => v.clone(),
            PrimitiveLiteral::UInt128(v) => v.to_be_bytes().to_vec(),
            PrimitiveLiteral::Int128(v) => {
                // Minimal two's complement: drop leading bytes that only repeat the sign.
                let bytes = v.to_be_bytes();
                let mut start = 0;
                while start < MAX_DECIMAL_BYTES - 1 {
                    let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                        || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
                    if !redundant {
                        break;
                    }
                    start += 1;
                }
                bytes[start..].to_vec()
            }
        }
    }
}

fn fixed_width<const N: usize>(bytes: &[u8], data_type: &PrimitiveType) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        decode_failure(
            data_type,
            bytes,
            format!("expected {N} bytes, got {}", bytes.len()),
        )
    })
}

fn decode_failure(data_type: &PrimitiveType, bytes: &[u8], message: impl Into<String>) -> Error {
    Error::new(ErrorKind::DecodeFailure, message)
        .with_context("type", data_type.to_string())
        .with_context("length", bytes.len().to_string())
}

fn into_decode_failure(err: Error) -> Error {
    Error::new(ErrorKind::DecodeFailure, "bound value is out of range").with_source(err)
}

fn out_of_range(what: &str, value: impl Display) -> Error {
    Error::new(
        ErrorKind::DataInvalid,
        format!("{what} value {value} is out of the supported calendar range"),
    )
}

fn civil_date(days_since_epoch: i64) -> Option<NaiveDate> {
    let days_from_ce = i32::try_from(days_since_epoch.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days_from_ce)
}

fn write_date(f: &mut Formatter<'_>, date: NaiveDate) -> fmt::Result {
    let year = date.year();
    if year > 9999 {
        write!(f, "+{year}")?;
    } else if year < 0 {
        write!(f, "-{:04}", year.unsigned_abs())?;
    } else {
        write!(f, "{year:04}")?;
    }
    write!(f, "-{:02}-{:02}", date.month(), date.day())
}

/// Writes `HH:MM`, then seconds only when non-zero, then the fraction in
/// groups of three digits, dropping trailing zero groups.
fn write_time(f: &mut Formatter<'_>, nanos_of_day: i64) -> fmt::Result {
    let hour = nanos_of_day / 3_600_000_000_000;
    let minute = nanos_of_day / 60_000_000_000 % 60;
    let second = nanos_of_day / 1_000_000_000 % 60;
    let nano = nanos_of_day % 1_000_000_000;

    write!(f, "{hour:02}:{minute:02}")?;
    if second == 0 && nano == 0 {
        return Ok(());
    }
    write!(f, ":{second:02}")?;
    if nano == 0 {
        Ok(())
    } else if nano % 1_000_000 == 0 {
        write!(f, ".{:03}", nano / 1_000_000)
    } else if nano % 1_000 == 0 {
        write!(f, ".{:06}", nano / 1_000)
    } else {
        write!(f, ".{nano:09}")
    }
}

fn write_timestamp(f: &mut Formatter<'_>, value: i64, units_per_day: i64) -> fmt::Result {
    let days = value.div_euclid(units_per_day);
    let units_of_day = value.rem_euclid(units_per_day);
    let nanos_of_day = if units_per_day == MICROS_PER_DAY {
        units_of_day * NANOS_PER_MICRO
    } else {
        units_of_day
    };
    match civil_date(days) {
        Some(date) => write_date(f, date)?,
        None => return write!(f, "{value}"),
    }
    write!(f, "T")?;
    write_time(f, nanos_of_day)
}

/// Floating point rendering: plain notation for magnitudes in `[1e-3, 1e7)`
/// and zero, scientific notation (`1.0E10`) otherwise, always with at least
/// one fractional digit.
fn write_floating(f: &mut Formatter<'_>, value: f64, plain: String, scientific: String) -> fmt::Result {
    if value.is_nan() {
        return write!(f, "NaN");
    }
    if value.is_infinite() {
        return write!(f, "{}Infinity", if value < 0.0 { "-" } else { "" });
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        if plain.contains('.') {
            write!(f, "{plain}")
        } else {
            write!(f, "{plain}.0")
        }
    } else {
        let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
        if mantissa.contains('.') {
            write!(f, "{mantissa}E{exponent}")
        } else {
            write!(f, "{mantissa}.0E{exponent}")
        }
    }
}

// Plain notation while the adjusted exponent stays at or above -6, scientific
// notation otherwise, matching how engines print decimal bounds.
fn write_decimal(f: &mut Formatter<'_>, unscaled: i128, scale: u32) -> fmt::Result {
    let sign = if unscaled < 0 { "-" } else { "" };
    let digits = unscaled.unsigned_abs().to_string();
    let adjusted = digits.len() as i64 - 1 - i64::from(scale);
    if adjusted < -6 {
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            return write!(f, "{sign}{lead}E{adjusted}");
        }
        return write!(f, "{sign}{lead}.{rest}E{adjusted}");
    }
    let scale = scale as usize;
    if scale == 0 {
        return write!(f, "{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    write!(f, "{sign}{int_part}.{frac_part}")
}

impl Display for Datum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.r#type, &self.literal) {
            (_, PrimitiveLiteral::Boolean(v)) => write!(f, "{v}"),
            (PrimitiveType::Date, PrimitiveLiteral::Int(days)) => {
                match civil_date(i64::from(*days)) {
                    Some(date) => write_date(f, date),
                    None => write!(f, "{days}"),
                }
            }
            (PrimitiveType::Time, PrimitiveLiteral::Long(micros)) => {
                write_time(f, micros * NANOS_PER_MICRO)
            }
            (PrimitiveType::Timestamp, PrimitiveLiteral::Long(v)) => {
                write_timestamp(f, *v, MICROS_PER_DAY)
            }
            (PrimitiveType::Timestamptz, PrimitiveLiteral::Long(v)) => {
                write_timestamp(f, *v, MICROS_PER_DAY)?;
                write!(f, "Z")
            }
            (PrimitiveType::TimestampNs, PrimitiveLiteral::Long(v)) => {
                write_timestamp(f, *v, NANOS_PER_DAY)
            }
            (PrimitiveType::TimestamptzNs, PrimitiveLiteral::Long(v)) => {
                write_timestamp(f, *v, NANOS_PER_DAY)?;
                write!(f, "Z")
            }
            (_, PrimitiveLiteral::Int(v)) => write!(f, "{v}"),
            (_, PrimitiveLiteral::Long(v)) => write!(f, "{v}"),
            (_, PrimitiveLiteral::Float(v)) => {
                write_floating(f, f64::from(v.0), format!("{}", v.0), format!("{:e}", v.0))
            }
            (_, PrimitiveLiteral::Double(v)) => {
                write_floating(f, v.0, format!("{}", v.0), format!("{:e}", v.0))
            }
            (_, PrimitiveLiteral::String(v)) => write!(f, "{v}"),
            (_, PrimitiveLiteral::Binary(v)) => write!(f, "{}", BASE64_STANDARD.encode(v)),
            (PrimitiveType::Decimal { scale, .. }, PrimitiveLiteral::Int128(v)) => {
                write_decimal(f, *v, *scale)
            }
            (_, PrimitiveLiteral::Int128(v)) => write!(f, "{v}"),
            (_, PrimitiveLiteral::UInt128(v)) => {
                write!(f, "{}", Uuid::from_u128(*v).hyphenated())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(bytes: &[u8], data_type: PrimitiveType) -> String {
        Datum::try_from_bytes(bytes, data_type).unwrap().to_string()
    }

    #[test]
    fn test_integral_values() {
        assert_eq!(human(&42i64.to_le_bytes(), PrimitiveType::Long), "42");
        assert_eq!(human(&(-7i32).to_le_bytes(), PrimitiveType::Int), "-7");
        assert_eq!(human(&5i32.to_le_bytes(), PrimitiveType::Long), "5");
        assert_eq!(human(&[0], PrimitiveType::Boolean), "false");
        assert_eq!(human(&[2], PrimitiveType::Boolean), "true");
    }

    #[test]
    fn test_floating_values() {
        assert_eq!(human(&1.0f64.to_le_bytes(), PrimitiveType::Double), "1.0");
        assert_eq!(human(&1.0e10f64.to_le_bytes(), PrimitiveType::Double), "1.0E10");
        assert_eq!(human(&1.5e-5f64.to_le_bytes(), PrimitiveType::Double), "1.5E-5");
        assert_eq!(human(&0.001f64.to_le_bytes(), PrimitiveType::Double), "0.001");
        assert_eq!(human(&(-0.0f64).to_le_bytes(), PrimitiveType::Double), "-0.0");
        assert_eq!(human(&f64::NAN.to_le_bytes(), PrimitiveType::Double), "NaN");
        assert_eq!(
            human(&f64::NEG_INFINITY.to_le_bytes(), PrimitiveType::Double),
            "-Infinity"
        );
        assert_eq!(human(&2.5f32.to_le_bytes(), PrimitiveType::Float), "2.5");
        assert_eq!(human(&1.0e7f32.to_le_bytes(), PrimitiveType::Float), "1.0E7");
        assert_eq!(human(&1234567.0f32.to_le_bytes(), PrimitiveType::Float), "1234567.0");
        // float bounds promoted to double keep the float's exact value
        assert_eq!(human(&0.5f32.to_le_bytes(), PrimitiveType::Double), "0.5");
    }

    #[test]
    fn test_decimal_values() {
        let decimal = |precision, scale| PrimitiveType::Decimal { precision, scale };
        assert_eq!(human(&[0x30, 0x39], decimal(9, 2)), "123.45");
        assert_eq!(human(&[0xCF, 0xC7], decimal(9, 2)), "-123.45");
        assert_eq!(human(&[0x05], decimal(9, 3)), "0.005");
        assert_eq!(human(&[0xFB], decimal(9, 3)), "-0.005");
        assert_eq!(human(&[0x00], decimal(9, 0)), "0");
        assert_eq!(human(&[0x00], decimal(9, 2)), "0.00");

        let max = Datum::decimal(10i128.pow(38) - 1, 38, 0).unwrap();
        assert_eq!(max.to_bytes().len(), 16);
        assert_eq!(
            human(&max.to_bytes(), decimal(38, 0)),
            "99999999999999999999999999999999999999"
        );

        assert!(Datum::decimal(1000, 3, 0).is_err());
        assert!(Datum::try_from_bytes(&[], decimal(9, 2)).is_err());
        assert!(Datum::try_from_bytes(&[0; 17], decimal(38, 2)).is_err());
    }

    #[test]
    fn test_decimal_small_magnitudes_use_scientific_notation() {
        let decimal = |precision, scale| PrimitiveType::Decimal { precision, scale };
        assert_eq!(human(&[0x01], decimal(38, 10)), "1E-10");
        assert_eq!(human(&[0x00], decimal(38, 10)), "0E-10");
        assert_eq!(human(&[0xFF], decimal(38, 10)), "-1E-10");
        assert_eq!(human(&[0x30, 0x39], decimal(38, 12)), "1.2345E-8");
        assert_eq!(human(&[0xCF, 0xC7], decimal(38, 12)), "-1.2345E-8");

        // an adjusted exponent of -6 is still printed plainly
        assert_eq!(human(&[0x01], decimal(9, 6)), "0.000001");
        assert_eq!(human(&[0x01], decimal(9, 7)), "1E-7");
        assert_eq!(human(&[0x30, 0x39], decimal(18, 10)), "0.0000012345");
        assert_eq!(human(&[0x30, 0x39], decimal(18, 11)), "1.2345E-7");
    }

    #[test]
    fn test_decimal_minimal_encoding() {
        assert_eq!(Datum::decimal(12345, 9, 2).unwrap().to_bytes(), vec![0x30, 0x39]);
        assert_eq!(Datum::decimal(-12345, 9, 2).unwrap().to_bytes(), vec![0xCF, 0xC7]);
        assert_eq!(Datum::decimal(128, 9, 0).unwrap().to_bytes(), vec![0x00, 0x80]);
        assert_eq!(Datum::decimal(-128, 9, 0).unwrap().to_bytes(), vec![0x80]);
        assert_eq!(Datum::decimal(0, 9, 0).unwrap().to_bytes(), vec![0x00]);
    }

    #[test]
    fn test_temporal_values() {
        assert_eq!(human(&0i32.to_le_bytes(), PrimitiveType::Date), "1970-01-01");
        assert_eq!(human(&19000i32.to_le_bytes(), PrimitiveType::Date), "2022-01-08");
        assert_eq!(human(&(-1i32).to_le_bytes(), PrimitiveType::Date), "1969-12-31");

        let time = |micros: i64| human(&micros.to_le_bytes(), PrimitiveType::Time);
        assert_eq!(time(0), "00:00");
        assert_eq!(time(3_600_000_000 + 60_000_000), "01:01");
        assert_eq!(time(45_296_000_000), "12:34:56");
        assert_eq!(time(45_296_500_000), "12:34:56.500");
        assert_eq!(time(45_296_000_001), "12:34:56.000001");
        assert!(Datum::try_from_bytes(&MICROS_PER_DAY.to_le_bytes(), PrimitiveType::Time).is_err());

        let micros = 1_640_995_200_000_000i64 + 1_500_000;
        assert_eq!(
            human(&micros.to_le_bytes(), PrimitiveType::Timestamp),
            "2022-01-01T00:00:01.500"
        );
        assert_eq!(
            human(&micros.to_le_bytes(), PrimitiveType::Timestamptz),
            "2022-01-01T00:00:01.500Z"
        );
        assert_eq!(
            human(&(-1i64).to_le_bytes(), PrimitiveType::Timestamp),
            "1969-12-31T23:59:59.999999"
        );
        assert_eq!(
            human(&1_000_000_001i64.to_le_bytes(), PrimitiveType::TimestamptzNs),
            "1970-01-01T00:00:01.000000001Z"
        );
    }

    #[test]
    fn test_text_and_binary_values() {
        assert_eq!(human(b"iceberg", PrimitiveType::String), "iceberg");
        assert_eq!(human(&[0xDE, 0xAD, 0xBE, 0xEF], PrimitiveType::Binary), "3q2+7w==");
        assert_eq!(human(&[0x01, 0x02], PrimitiveType::Fixed(2)), "AQI=");

        let uuid = Uuid::parse_str("f79c3e09-677c-4bbd-a479-3f349cb785e7").unwrap();
        assert_eq!(
            human(uuid.as_bytes(), PrimitiveType::Uuid),
            "f79c3e09-677c-4bbd-a479-3f349cb785e7"
        );
        assert_eq!(Datum::uuid(uuid).to_bytes(), uuid.as_bytes().to_vec());
    }

    #[test]
    fn test_mismatched_lengths_fail_to_decode() {
        for (bytes, data_type) in [
            (vec![1, 2, 3], PrimitiveType::Long),
            (vec![1, 2], PrimitiveType::Int),
            (vec![0; 8], PrimitiveType::Int),
            (vec![0; 2], PrimitiveType::Boolean),
            (vec![0; 15], PrimitiveType::Uuid),
            (vec![0; 3], PrimitiveType::Fixed(4)),
            (vec![0; 5], PrimitiveType::Double),
            (vec![0xFF, 0xFE], PrimitiveType::String),
        ] {
            let err = Datum::try_from_bytes(&bytes, data_type.clone()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DecodeFailure, "{data_type}");
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = 1_640_995_200_000_000i64.to_le_bytes();
        let first = human(&bytes, PrimitiveType::Timestamptz);
        let second = human(&bytes, PrimitiveType::Timestamptz);
        assert_eq!(first, second);
    }
}
