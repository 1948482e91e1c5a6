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

//! Lowers [`Datum`]s to the codec's primitive [`Value`]s, following the field descriptors.
//!
//! The binary encoding is produced by `apache_avro` from these values, the Avro JSON encoding
//! by [`json`].

pub(crate) mod json;

use crate::{
    AvroResult, CustomEncoder, Datum,
    decimal,
    descriptor::{
        DecimalSpec, Descriptors, LiteralForm, RecordDescriptor, TypeDescriptor, select_member,
    },
    error::Error,
    logical,
    types::{LogicalType, Primitive},
};
use apache_avro::types::Value;
use bigdecimal::BigDecimal;
use chrono::SecondsFormat;
use log::trace;
use serde_json::{Map, Number, Value as JsonValue};
use std::{collections::HashMap, str::FromStr};
use uuid::Uuid;

/// Converts data to values, applying the custom encoders of the enclosing records.
pub(crate) struct Encoder<'a> {
    descriptors: &'a Descriptors,
    encoders: Vec<&'a CustomEncoder>,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(descriptors: &'a Descriptors) -> Self {
        Self {
            descriptors,
            encoders: Vec::new(),
        }
    }

    /// Makes the custom encoders of `record` available.
    pub(crate) fn enter(&mut self, record: &'a RecordDescriptor) {
        self.encoders.extend(record.meta.custom_encoders.iter());
    }

    /// Encodes a datum of the root record.
    pub(crate) fn encode_root(&mut self, datum: &Datum) -> AvroResult<Value> {
        let root = self.descriptors.root();
        self.encode_record(root, datum, &root.name)
    }

    pub(crate) fn encode(
        &mut self,
        ty: &TypeDescriptor,
        datum: &Datum,
        path: &str,
    ) -> AvroResult<Value> {
        use TypeDescriptor as T;

        if let T::Union(members) = ty {
            let index = select_member(members, datum).ok_or_else(|| {
                Error::Encode(
                    path,
                    format!("{} matches no member of the union", datum.summary()),
                )
            })?;
            let value = self.encode(&members[index], datum, path)?;
            return Ok(Value::Union(index as u32, Box::new(value)));
        }
        if let Datum::Opaque(opaque) = datum {
            let encoder = self
                .encoders
                .iter()
                .rev()
                .find(|encoder| encoder.type_name == opaque.type_name())
                .ok_or_else(|| {
                    Error::Encode(
                        path,
                        format!("no custom encoder is registered for {}", opaque.type_name()),
                    )
                })?;
            let converted = (encoder.encode)(datum).map_err(|reason| Error::Encode(path, reason))?;
            if let Datum::Opaque(_) = converted {
                return Err(Error::Encode(
                    path,
                    format!("the custom encoder for {} returned an opaque value", opaque.type_name()),
                ));
            }
            trace!("Custom encoder applied at {path}");
            let target = match ty {
                T::Custom { encoded, .. } => encoded.as_ref(),
                other => other,
            };
            return self.encode(target, &converted, path);
        }

        let value = match (ty, datum) {
            (T::Custom { encoded, .. }, _) => return self.encode(encoded, datum, path),
            (T::Immutable(primitive), _) => {
                encode_primitive(*primitive, datum).ok_or_else(|| mismatch(ty, datum, path))?
            }
            (T::Logical(logical), _) => {
                encode_logical(*logical, datum).ok_or_else(|| mismatch(ty, datum, path))?
            }
            (T::Decimal(spec), _) => {
                encode_decimal(spec, datum).map_err(|reason| Error::Encode(path, reason))?
            }
            (T::Fixed(spec), Datum::Fixed(bytes) | Datum::Bytes(bytes))
                if bytes.len() == spec.size =>
            {
                Value::Fixed(spec.size, bytes.clone())
            }
            (T::Array(items), Datum::Array(values)) => {
                let mut encoded = Vec::with_capacity(values.len());
                for (i, value) in values.iter().enumerate() {
                    encoded.push(self.encode(items, value, &format!("{path}[{i}]"))?);
                }
                Value::Array(encoded)
            }
            (T::Map(values), Datum::Map(entries)) => {
                let mut encoded = HashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    encoded.insert(key.clone(), self.encode(values, value, &format!("{path}.{key}"))?);
                }
                Value::Map(encoded)
            }
            (T::Literal { values, form }, _) => {
                if !values.iter().any(|v| v.matches(datum)) {
                    return Err(Error::Encode(
                        path,
                        format!("{} is not one of the literal values", datum.summary()),
                    ));
                }
                match form {
                    LiteralForm::Enum(decl) => encode_symbol(&decl.symbols, datum)
                        .ok_or_else(|| mismatch(ty, datum, path))?,
                    LiteralForm::Primitives(primitives) => match primitives.as_slice() {
                        [single] => encode_primitive(*single, datum)
                            .ok_or_else(|| mismatch(ty, datum, path))?,
                        _ => {
                            let (index, value) = primitives
                                .iter()
                                .enumerate()
                                .find_map(|(i, p)| encode_primitive(*p, datum).map(|v| (i, v)))
                                .ok_or_else(|| mismatch(ty, datum, path))?;
                            Value::Union(index as u32, Box::new(value))
                        }
                    },
                }
            }
            (T::Enum(decl), _) => {
                encode_symbol(&decl.symbols, datum).ok_or_else(|| {
                    Error::Encode(
                        path,
                        format!("{} is not a symbol of enum {}", datum.summary(), decl.name),
                    )
                })?
            }
            (T::Record(record) | T::SelfRef(record), Datum::Record(_)) => {
                let descriptor = self.descriptors.get(record).ok_or_else(|| {
                    Error::Encode(path, format!("{} was never described", record.type_name))
                })?;
                self.encode_record(descriptor, datum, path)?
            }
            _ => return Err(mismatch(ty, datum, path)),
        };
        Ok(value)
    }

    fn encode_record(
        &mut self,
        record: &'a RecordDescriptor,
        datum: &Datum,
        path: &str,
    ) -> AvroResult<Value> {
        let Datum::Record(value) = datum else {
            return Err(Error::Encode(
                path,
                format!("expected a {} record, got {}", record.name, datum.summary()),
            ));
        };
        let depth = self.encoders.len();
        self.enter(record);

        let mut fields = Vec::with_capacity(record.fields.len());
        let mut result = Ok(());
        for field in &record.fields {
            let field_path = format!("{path}.{}", field.name);
            let default;
            let datum = match value.get(&field.name) {
                Some(datum) => datum,
                None => match field.default_value() {
                    Some(value) => {
                        default = value;
                        &default
                    }
                    None => {
                        result = Err(Error::Encode(
                            field_path,
                            "the field is missing and has no default",
                        ));
                        break;
                    }
                },
            };
            match self.encode(&field.ty, datum, &field_path) {
                Ok(value) => fields.push((field.name.clone(), value)),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.encoders.truncate(depth);
        result.map(|()| Value::Record(fields))
    }
}

fn mismatch(ty: &TypeDescriptor, datum: &Datum, path: &str) -> Error {
    Error::Encode(
        path,
        format!("expected a value of type {}, got {}", ty.kind(), datum.summary()),
    )
}

fn encode_primitive(primitive: Primitive, datum: &Datum) -> Option<Value> {
    let value = match (primitive, datum) {
        (Primitive::Null, Datum::Null) => Value::Null,
        (Primitive::Boolean, Datum::Boolean(b)) => Value::Boolean(*b),
        (Primitive::Int, Datum::Int(v)) => Value::Int(*v),
        (Primitive::Int, Datum::Long(v)) => Value::Int(i32::try_from(*v).ok()?),
        (Primitive::Long, Datum::Long(v)) => Value::Long(*v),
        (Primitive::Long, Datum::Int(v)) => Value::Long(i64::from(*v)),
        (Primitive::Float, Datum::Float(v)) => Value::Float(*v),
        (Primitive::Float, Datum::Double(v)) => Value::Float(*v as f32),
        (Primitive::Float, Datum::Int(v)) => Value::Float(*v as f32),
        (Primitive::Float, Datum::Long(v)) => Value::Float(*v as f32),
        (Primitive::Double, Datum::Double(v)) => Value::Double(*v),
        (Primitive::Double, Datum::Float(v)) => Value::Double(f64::from(*v)),
        (Primitive::Double, Datum::Int(v)) => Value::Double(f64::from(*v)),
        (Primitive::Double, Datum::Long(v)) => Value::Double(*v as f64),
        (Primitive::Bytes, Datum::Bytes(b) | Datum::Fixed(b)) => Value::Bytes(b.clone()),
        (Primitive::Bytes, Datum::String(s)) => Value::Bytes(s.as_bytes().to_vec()),
        (Primitive::String, Datum::String(s) | Datum::Enum(s)) => Value::String(s.clone()),
        _ => return None,
    };
    Some(value)
}

fn encode_logical(logical: LogicalType, datum: &Datum) -> Option<Value> {
    let value = match (logical, datum) {
        (LogicalType::Date, Datum::Date(date)) => Value::Date(logical::days_since_epoch(*date)),
        (LogicalType::Date, Datum::DateTime(datetime)) => {
            Value::Date(logical::days_since_epoch(datetime.date_naive()))
        }
        (LogicalType::Date, Datum::Int(days)) => Value::Date(*days),
        (LogicalType::Date, Datum::String(s)) => {
            Value::Date(logical::days_since_epoch(logical::parse_date(s)?))
        }
        (LogicalType::TimeMillis, Datum::Time(time)) => {
            Value::TimeMillis(logical::time_to_millis(*time))
        }
        (LogicalType::TimeMillis, Datum::String(s)) => {
            Value::TimeMillis(logical::time_to_millis(logical::parse_time(s)?))
        }
        (LogicalType::TimeMicros, Datum::Time(time)) => {
            Value::TimeMicros(logical::time_to_micros(*time))
        }
        (LogicalType::TimeMicros, Datum::String(s)) => {
            Value::TimeMicros(logical::time_to_micros(logical::parse_time(s)?))
        }
        (LogicalType::TimestampMillis, Datum::DateTime(datetime)) => {
            Value::TimestampMillis(datetime.timestamp_millis())
        }
        (LogicalType::TimestampMillis, Datum::Long(millis)) => Value::TimestampMillis(*millis),
        (LogicalType::TimestampMillis, Datum::String(s)) => {
            Value::TimestampMillis(logical::parse_datetime(s)?.timestamp_millis())
        }
        (LogicalType::TimestampMicros, Datum::DateTime(datetime)) => {
            Value::TimestampMicros(datetime.timestamp_micros())
        }
        (LogicalType::TimestampMicros, Datum::Long(micros)) => Value::TimestampMicros(*micros),
        (LogicalType::TimestampMicros, Datum::String(s)) => {
            Value::TimestampMicros(logical::parse_datetime(s)?.timestamp_micros())
        }
        (LogicalType::Uuid, Datum::Uuid(uuid)) => Value::Uuid(*uuid),
        (LogicalType::Uuid, Datum::String(s)) => Value::Uuid(Uuid::parse_str(s).ok()?),
        _ => return None,
    };
    Some(value)
}

fn encode_decimal(spec: &DecimalSpec, datum: &Datum) -> Result<Value, String> {
    let value = match datum {
        Datum::Decimal(value) => value.clone(),
        Datum::Int(v) => BigDecimal::from(*v),
        Datum::Long(v) => BigDecimal::from(*v),
        Datum::Double(v) => BigDecimal::from_str(&v.to_string()).map_err(|e| e.to_string())?,
        Datum::String(s) => BigDecimal::from_str(s).map_err(|e| format!("{s:?} is not a decimal: {e}"))?,
        other => return Err(format!("expected a decimal, got {}", other.summary())),
    };
    let unscaled = decimal::unscaled(&value, spec.precision, spec.scale)?;
    let bytes = match &spec.fixed {
        Some(fixed) => decimal::to_sign_extended_bytes(&unscaled, fixed.size)?,
        None => decimal::to_bytes(&unscaled),
    };
    Ok(Value::Decimal(apache_avro::Decimal::from(bytes)))
}

fn encode_symbol(symbols: &[String], datum: &Datum) -> Option<Value> {
    let symbol = match datum {
        Datum::Enum(s) | Datum::String(s) => s,
        _ => return None,
    };
    let index = symbols.iter().position(|s| s == symbol)?;
    Some(Value::Enum(index as u32, symbol.clone()))
}

/// The JSON form of a field default, as the Avro specification defines it.
///
/// Union defaults are written as a value of the first member, which has to be the member the
/// value was encoded with.
pub(crate) fn default_json(value: &Value) -> Result<JsonValue, String> {
    let json = match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Int(v) | Value::Date(v) | Value::TimeMillis(v) => JsonValue::from(*v),
        Value::Long(v)
        | Value::TimeMicros(v)
        | Value::TimestampMillis(v)
        | Value::TimestampMicros(v) => JsonValue::from(*v),
        Value::Float(v) => float_json(f64::from(*v))?,
        Value::Double(v) => float_json(*v)?,
        Value::Bytes(bytes) | Value::Fixed(_, bytes) => {
            JsonValue::String(logical::latin1_string(bytes))
        }
        Value::String(s) | Value::Enum(_, s) => JsonValue::String(s.clone()),
        Value::Uuid(uuid) => JsonValue::String(uuid.to_string()),
        Value::Decimal(d) => {
            let bytes = <Vec<u8>>::try_from(d).map_err(|e| e.to_string())?;
            JsonValue::String(logical::latin1_string(&bytes))
        }
        Value::Union(index, inner) => {
            if *index != 0 {
                return Err(format!(
                    "the default has to match the first union member, it matches member {index}"
                ));
            }
            default_json(inner)?
        }
        Value::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(default_json)
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => {
            let mut keys: Vec<_> = entries.keys().collect();
            keys.sort();
            let mut object = Map::with_capacity(entries.len());
            for key in keys {
                object.insert(key.clone(), default_json(&entries[key])?);
            }
            JsonValue::Object(object)
        }
        Value::Record(fields) => {
            let mut object = Map::with_capacity(fields.len());
            for (name, value) in fields {
                object.insert(name.clone(), default_json(value)?);
            }
            JsonValue::Object(object)
        }
        other => return Err(format!("{other:?} has no JSON default form")),
    };
    Ok(json)
}

fn float_json(value: f64) -> Result<JsonValue, String> {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .ok_or_else(|| format!("{value} cannot be written as JSON"))
}

/// A human friendly JSON form of an encoded value: ISO dates and times, canonical UUIDs and
/// decimals as strings.
pub(crate) fn standard_json(
    descriptors: &Descriptors,
    ty: &TypeDescriptor,
    value: &Value,
) -> AvroResult<JsonValue> {
    use TypeDescriptor as T;

    let json = match (ty, value) {
        (T::Custom { encoded, .. }, _) => return standard_json(descriptors, encoded, value),
        (T::Union(members), Value::Union(index, inner)) => {
            let member = members.get(*index as usize).ok_or_else(|| {
                Error::Encode(ty.kind().to_string(), format!("no union member {index}"))
            })?;
            return standard_json(descriptors, member, inner);
        }
        (
            T::Literal {
                form: LiteralForm::Primitives(primitives),
                ..
            },
            Value::Union(index, inner),
        ) => {
            let member = primitives.get(*index as usize).copied().unwrap_or(Primitive::Null);
            return standard_json(descriptors, &T::Immutable(member), inner);
        }
        (_, Value::Date(days)) => match logical::date_from_days(*days) {
            Some(date) => JsonValue::String(date.to_string()),
            None => JsonValue::from(*days),
        },
        (_, Value::TimeMillis(millis)) => match logical::time_from_millis(*millis) {
            Some(time) => JsonValue::String(time.to_string()),
            None => JsonValue::from(*millis),
        },
        (_, Value::TimeMicros(micros)) => match logical::time_from_micros(*micros) {
            Some(time) => JsonValue::String(time.to_string()),
            None => JsonValue::from(*micros),
        },
        (_, Value::TimestampMillis(millis)) => match logical::datetime_from_millis(*millis) {
            Some(datetime) => {
                JsonValue::String(datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => JsonValue::from(*millis),
        },
        (_, Value::TimestampMicros(micros)) => match logical::datetime_from_micros(*micros) {
            Some(datetime) => {
                JsonValue::String(datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => JsonValue::from(*micros),
        },
        (T::Decimal(spec), Value::Decimal(d)) => {
            let bytes = <Vec<u8>>::try_from(d)?;
            JsonValue::String(decimal::from_bytes(&bytes, spec.scale).to_string())
        }
        (T::Array(items), Value::Array(values)) => JsonValue::Array(
            values
                .iter()
                .map(|v| standard_json(descriptors, items, v))
                .collect::<AvroResult<_>>()?,
        ),
        (T::Map(values), Value::Map(entries)) => {
            let mut keys: Vec<_> = entries.keys().collect();
            keys.sort();
            let mut object = Map::with_capacity(entries.len());
            for key in keys {
                object.insert(key.clone(), standard_json(descriptors, values, &entries[key])?);
            }
            JsonValue::Object(object)
        }
        (T::Record(record) | T::SelfRef(record), Value::Record(fields)) => {
            let descriptor = descriptors.get(record).ok_or_else(|| {
                Error::Encode(record.type_name, "the record was never described")
            })?;
            record_json(descriptors, descriptor, fields)?
        }
        (_, other) => default_json(other).map_err(|reason| Error::Encode(ty.kind().to_string(), reason))?,
    };
    Ok(json)
}

pub(crate) fn record_json(
    descriptors: &Descriptors,
    record: &RecordDescriptor,
    fields: &[(String, Value)],
) -> AvroResult<JsonValue> {
    let mut object = Map::with_capacity(fields.len());
    for (name, value) in fields {
        let field = record.field(name).ok_or_else(|| {
            Error::Encode(format!("{}.{name}", record.name), "unknown field")
        })?;
        object.insert(name.clone(), standard_json(descriptors, &field.ty, value)?);
    }
    Ok(JsonValue::Object(object))
}
