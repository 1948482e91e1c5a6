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

//! Rebuilds [`Datum`] trees from decoded codec values.

use crate::{
    AvroResult, Datum, RecordDatum, TypeHook,
    decimal,
    descriptor::{Descriptors, LiteralForm, RecordDescriptor, TypeDescriptor},
    error::Error,
    logical,
    types::{LogicalType, Primitive},
};
use apache_avro::types::Value;
use log::trace;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Converts values to data, applying the type hooks of the enclosing records.
pub(crate) struct Constructor<'a> {
    descriptors: &'a Descriptors,
    hooks: Vec<&'a TypeHook>,
    strict_unions: Vec<bool>,
}

impl<'a> Constructor<'a> {
    pub(crate) fn new(descriptors: &'a Descriptors) -> Self {
        Self {
            descriptors,
            hooks: Vec::new(),
            strict_unions: Vec::new(),
        }
    }

    /// Builds a datum of the root record.
    pub(crate) fn construct_root(&mut self, value: Value) -> AvroResult<Datum> {
        let root = self.descriptors.root();
        self.construct_record(root, value, &root.name)
    }

    fn construct_record(
        &mut self,
        record: &'a RecordDescriptor,
        value: Value,
        path: &str,
    ) -> AvroResult<Datum> {
        let Value::Record(values) = value else {
            return Err(Error::Decode(path, format!("expected a record, got {value:?}")));
        };

        let inherited = self.hooks.len();
        self.hooks.extend(record.meta.decode.type_hooks.iter());
        let strict = record.meta.decode.strict_unions
            || self.strict_unions.last().copied().unwrap_or(false);
        self.strict_unions.push(strict);

        let fields = self.construct_fields(record, values, path);

        self.strict_unions.pop();
        self.hooks.truncate(inherited);

        Ok(Datum::Record(RecordDatum {
            name: record.name.clone(),
            type_id: Some(record.record.type_id),
            fields: fields?,
        }))
    }

    fn construct_fields(
        &mut self,
        record: &'a RecordDescriptor,
        mut values: Vec<(String, Value)>,
        path: &str,
    ) -> AvroResult<Vec<(String, Datum)>> {
        let mut fields = Vec::with_capacity(record.fields.len() + record.excluded.len());
        for field in &record.fields {
            let field_path = format!("{path}.{}", field.name);
            let datum = match values.iter().position(|(name, _)| *name == field.name) {
                Some(position) => {
                    let (_, value) = values.swap_remove(position);
                    self.construct(&field.ty, value, &field_path)?
                }
                None => field
                    .default_value()
                    .ok_or_else(|| Error::Decode(&field_path, "the field is missing"))?,
            };
            fields.push((field.name.clone(), datum));
        }
        for field in &record.excluded {
            let datum = field.default_value().ok_or_else(|| {
                Error::Decode(format!("{path}.{}", field.name), "the field has no default")
            })?;
            fields.push((field.name.clone(), datum));
        }
        Ok(fields)
    }

    pub(crate) fn construct(
        &mut self,
        ty: &'a TypeDescriptor,
        value: Value,
        path: &str,
    ) -> AvroResult<Datum> {
        use TypeDescriptor as T;
        let datum = match (ty, value) {
            (T::Union(members), Value::Union(index, inner)) => {
                let member = members.get(index as usize).ok_or_else(|| {
                    Error::Decode(path, format!("the union has no member {index}"))
                })?;
                let datum = self.construct(member, *inner, path)?;
                if self.strict_unions.last().copied().unwrap_or(false) {
                    let matching = members.iter().filter(|m| m.matches(&datum, true)).count();
                    if matching > 1 {
                        return Err(Error::Decode(
                            path,
                            format!("{} matches {matching} members of the union", datum.summary()),
                        ));
                    }
                }
                datum
            }
            (T::Immutable(primitive), value) => construct_primitive(*primitive, value)
                .map_err(|value| mismatch(ty, &value, path))?,
            (T::Logical(logical), value) => construct_logical(*logical, value)
                .map_err(|value| mismatch(ty, &value, path))?,
            (T::Decimal(spec), Value::Decimal(value)) => {
                let bytes = <Vec<u8>>::try_from(&value)
                    .map_err(|e| Error::Decode(path, e.to_string()))?;
                Datum::Decimal(decimal::from_bytes(&bytes, spec.scale))
            }
            (T::Decimal(spec), Value::Bytes(bytes) | Value::Fixed(_, bytes)) => {
                Datum::Decimal(decimal::from_bytes(&bytes, spec.scale))
            }
            (T::Fixed(spec), Value::Fixed(_, bytes) | Value::Bytes(bytes)) => {
                if bytes.len() != spec.size {
                    return Err(Error::Decode(
                        path,
                        format!("expected {} bytes, got {}", spec.size, bytes.len()),
                    ));
                }
                Datum::Fixed(bytes)
            }
            (T::Array(items), Value::Array(values)) => {
                let mut data = Vec::with_capacity(values.len());
                for (i, value) in values.into_iter().enumerate() {
                    data.push(self.construct(items, value, &format!("{path}[{i}]"))?);
                }
                Datum::Array(data)
            }
            (T::Map(values), Value::Map(entries)) => {
                let mut data = BTreeMap::new();
                for (key, value) in entries {
                    let datum = self.construct(values, value, &format!("{path}.{key}"))?;
                    data.insert(key, datum);
                }
                Datum::Map(data)
            }
            (T::Literal { values, form }, value) => {
                let datum = match (form, value) {
                    (LiteralForm::Enum(_), Value::Enum(_, symbol) | Value::String(symbol)) => {
                        Datum::String(symbol)
                    }
                    (LiteralForm::Primitives(_), Value::Union(_, inner)) => {
                        literal_datum(*inner).map_err(|value| mismatch(ty, &value, path))?
                    }
                    (LiteralForm::Primitives(_), value) => {
                        literal_datum(value).map_err(|value| mismatch(ty, &value, path))?
                    }
                    (_, value) => return Err(mismatch(ty, &value, path)),
                };
                if !values.iter().any(|literal| literal.matches(&datum)) {
                    return Err(Error::Decode(
                        path,
                        format!("{} is not one of the allowed values", datum.summary()),
                    ));
                }
                datum
            }
            (T::Enum(decl), Value::Enum(_, symbol) | Value::String(symbol)) => {
                if !decl.symbols.contains(&symbol) {
                    return Err(Error::Decode(
                        path,
                        format!("{symbol:?} is not a symbol of {}", decl.name),
                    ));
                }
                Datum::Enum(symbol)
            }
            (T::Record(record) | T::SelfRef(record), value) => {
                let descriptor = self
                    .descriptors
                    .get(record)
                    .ok_or_else(|| Error::UnknownType(path, record.type_name))?;
                self.construct_record(descriptor, value, path)?
            }
            (T::Custom { type_name, encoded }, value) => {
                let datum = self.construct(encoded, value, path)?;
                match self.hooks.iter().rev().find(|hook| hook.type_name == *type_name) {
                    Some(hook) => {
                        trace!("Type hook for {type_name} applied at {path}");
                        (hook.hook)(datum).map_err(|reason| Error::Decode(path, reason))?
                    }
                    None => datum,
                }
            }
            (ty, value) => return Err(mismatch(ty, &value, path)),
        };
        Ok(datum)
    }
}

fn mismatch(ty: &TypeDescriptor, value: &Value, path: &str) -> Error {
    Error::Decode(path, format!("expected a {}, got {value:?}", ty.kind()))
}

fn construct_primitive(primitive: Primitive, value: Value) -> Result<Datum, Value> {
    let datum = match (primitive, value) {
        (Primitive::Null, Value::Null) => Datum::Null,
        (Primitive::Boolean, Value::Boolean(b)) => Datum::Boolean(b),
        (Primitive::Int, Value::Int(v)) => Datum::Int(v),
        (Primitive::Long, Value::Long(v)) => Datum::Long(v),
        (Primitive::Long, Value::Int(v)) => Datum::Long(i64::from(v)),
        (Primitive::Float, Value::Float(v)) => Datum::Float(v),
        (Primitive::Double, Value::Double(v)) => Datum::Double(v),
        (Primitive::Double, Value::Float(v)) => Datum::Double(f64::from(v)),
        (Primitive::Double, Value::Int(v)) => Datum::Double(f64::from(v)),
        (Primitive::Double, Value::Long(v)) => Datum::Double(v as f64),
        (Primitive::Bytes, Value::Bytes(b) | Value::Fixed(_, b)) => Datum::Bytes(b),
        (Primitive::Bytes, Value::String(s)) => Datum::Bytes(s.into_bytes()),
        (Primitive::String, Value::String(s) | Value::Enum(_, s)) => Datum::String(s),
        (Primitive::String, Value::Bytes(b)) => match String::from_utf8(b) {
            Ok(s) => Datum::String(s),
            Err(e) => return Err(Value::Bytes(e.into_bytes())),
        },
        (Primitive::String, Value::Uuid(uuid)) => Datum::String(uuid.to_string()),
        (_, value) => return Err(value),
    };
    Ok(datum)
}

/// The built-in hooks: logical values, and their string forms.
fn construct_logical(logical: LogicalType, value: Value) -> Result<Datum, Value> {
    let datum = match (logical, value) {
        (LogicalType::Date, Value::Date(days) | Value::Int(days)) => match logical::date_from_days(days) {
            Some(date) => Datum::Date(date),
            None => return Err(Value::Date(days)),
        },
        (LogicalType::TimeMillis, Value::TimeMillis(millis) | Value::Int(millis)) => {
            match logical::time_from_millis(millis) {
                Some(time) => Datum::Time(time),
                None => return Err(Value::TimeMillis(millis)),
            }
        }
        (LogicalType::TimeMicros, Value::TimeMicros(micros) | Value::Long(micros)) => {
            match logical::time_from_micros(micros) {
                Some(time) => Datum::Time(time),
                None => return Err(Value::TimeMicros(micros)),
            }
        }
        (LogicalType::TimestampMillis, Value::TimestampMillis(millis) | Value::Long(millis)) => {
            match logical::datetime_from_millis(millis) {
                Some(datetime) => Datum::DateTime(datetime),
                None => return Err(Value::TimestampMillis(millis)),
            }
        }
        (LogicalType::TimestampMicros, Value::TimestampMicros(micros) | Value::Long(micros)) => {
            match logical::datetime_from_micros(micros) {
                Some(datetime) => Datum::DateTime(datetime),
                None => return Err(Value::TimestampMicros(micros)),
            }
        }
        (LogicalType::Uuid, Value::Uuid(uuid)) => Datum::Uuid(uuid),
        (logical, Value::String(s)) => {
            let parsed = match logical {
                LogicalType::Date => logical::parse_date(&s).map(Datum::Date),
                LogicalType::TimeMillis | LogicalType::TimeMicros => {
                    logical::parse_time(&s).map(Datum::Time)
                }
                LogicalType::TimestampMillis | LogicalType::TimestampMicros => {
                    logical::parse_datetime(&s).map(Datum::DateTime)
                }
                LogicalType::Uuid => Uuid::parse_str(&s).ok().map(Datum::Uuid),
            };
            match parsed {
                Some(datum) => datum,
                None => return Err(Value::String(s)),
            }
        }
        (_, value) => return Err(value),
    };
    Ok(datum)
}

fn literal_datum(value: Value) -> Result<Datum, Value> {
    let datum = match value {
        Value::Null => Datum::Null,
        Value::Boolean(b) => Datum::Boolean(b),
        Value::Int(v) => Datum::Long(i64::from(v)),
        Value::Long(v) => Datum::Long(v),
        Value::String(s) | Value::Enum(_, s) => Datum::String(s),
        value => return Err(value),
    };
    Ok(datum)
}
