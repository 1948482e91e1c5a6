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

//! The user facing API: [`ModelCodec`] and the [`AvroModel`] methods of every record type.

use crate::{
    AvroRecord, AvroResult, Datum,
    case::CaseStyle,
    codec::{Encoder, json::JsonCodec, record_json},
    construct::Constructor,
    descriptor::{Descriptors, FieldDescriptor},
    error::Error,
    mapper::describe,
    render::render,
};
use apache_avro::{Schema, from_avro_datum, to_avro_datum, types::Value};
use log::debug;
use serde_json::Value as JsonValue;
use std::{collections::HashSet, marker::PhantomData};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// The encodings a model can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
pub enum Encoding {
    /// The Avro binary encoding of a single datum, without framing.
    #[default]
    #[strum(serialize = "avro")]
    Binary,
    /// The Avro JSON encoding.
    #[strum(serialize = "avro-json")]
    Json,
}

/// A prepared codec for `T`: its descriptors, rendered schema and parsed schema.
///
/// Creating one renders the schema; keep it around to encode or decode many values.
pub struct ModelCodec<T> {
    descriptors: Descriptors,
    schema_json: JsonValue,
    schema: Schema,
    _model: PhantomData<fn() -> T>,
}

impl<T: AvroRecord> ModelCodec<T> {
    pub fn new() -> AvroResult<Self> {
        let descriptors = describe::<T>()?;
        let schema_json = render(&descriptors)?;
        let schema = parse_schema(&schema_json)?;
        debug!("Prepared the codec of {}", descriptors.root().name);
        Ok(Self {
            descriptors,
            schema_json,
            schema,
            _model: PhantomData,
        })
    }

    /// The rendered schema document.
    pub fn schema_json(&self) -> &JsonValue {
        &self.schema_json
    }

    /// The schema as parsed by the codec.
    ///
    /// Defaults of decimal and fixed fields are left out of it: the codec cannot read them from
    /// their JSON form.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    fn root_name(&self) -> &str {
        &self.descriptors.root().name
    }

    pub fn to_value(&self, model: &T) -> AvroResult<Value> {
        self.datum_to_value(&model.to_datum())
    }

    /// Lowers a datum of the root record to the codec's value.
    pub fn datum_to_value(&self, datum: &Datum) -> AvroResult<Value> {
        Encoder::new(&self.descriptors).encode_root(datum)
    }

    pub fn serialize(&self, model: &T, encoding: Encoding) -> AvroResult<Vec<u8>> {
        let value = self.to_value(model)?;
        match encoding {
            Encoding::Binary => to_avro_datum(&self.schema, value)
                .map_err(|e| Error::Encode(self.root_name(), e.to_string())),
            Encoding::Json => {
                self.check(&value)?;
                let json = JsonCodec::new(&self.schema_json)
                    .encode(&value)
                    .map_err(|reason| Error::Encode(self.root_name(), reason))?;
                Ok(serde_json::to_vec(&json)?)
            }
        }
    }

    pub fn deserialize(&self, bytes: &[u8], encoding: Encoding) -> AvroResult<T> {
        let value = match encoding {
            Encoding::Binary => from_avro_datum(&self.schema, &mut &bytes[..], None)
                .map_err(|e| Error::Decode(self.root_name(), e.to_string()))?,
            Encoding::Json => {
                let json: JsonValue = serde_json::from_slice(bytes)?;
                JsonCodec::new(&self.schema_json)
                    .decode(&json)
                    .map_err(|reason| Error::Decode(self.root_name(), reason))?
            }
        };
        self.from_value(value)
    }

    /// Decodes data written with another version of the schema, resolving it to this one.
    pub fn deserialize_with_writer_schema(
        &self,
        bytes: &[u8],
        encoding: Encoding,
        writer_schema: &JsonValue,
    ) -> AvroResult<T> {
        let writer = parse_schema(writer_schema)?;
        let value = match encoding {
            Encoding::Binary => from_avro_datum(&writer, &mut &bytes[..], Some(&self.schema))
                .map_err(|e| Error::Decode(self.root_name(), e.to_string()))?,
            Encoding::Json => {
                let json: JsonValue = serde_json::from_slice(bytes)?;
                JsonCodec::new(writer_schema)
                    .decode(&json)
                    .map_err(|reason| Error::Decode(self.root_name(), reason))?
                    .resolve(&self.schema)
                    .map_err(|e| Error::Decode(self.root_name(), e.to_string()))?
            }
        };
        self.from_value(value)
    }

    /// Rebuilds a model from a decoded value.
    pub fn from_value(&self, value: Value) -> AvroResult<T> {
        let datum = Constructor::new(&self.descriptors).construct_root(value)?;
        T::from_datum(datum)
    }

    /// Builds a model from a loosely typed datum, converting its fields the way encoding does.
    pub fn parse_datum(&self, datum: &Datum) -> AvroResult<T> {
        let value = self.datum_to_value(datum)?;
        self.from_value(value)
    }

    /// Checks that the model can be encoded with its schema.
    pub fn validate(&self, model: &T) -> AvroResult<()> {
        let value = self.to_value(model)?;
        self.check(&value)
    }

    fn check(&self, value: &Value) -> AvroResult<()> {
        if value.validate(&self.schema) {
            Ok(())
        } else {
            Err(Error::Encode(
                self.root_name(),
                "the value does not match the schema",
            ))
        }
    }

    /// The model as plain JSON: ISO dates and times, UUID and decimal strings.
    pub fn to_json(&self, model: &T) -> AvroResult<JsonValue> {
        let Value::Record(fields) = self.to_value(model)? else {
            return Err(Error::Encode(self.root_name(), "the model is not a record"));
        };
        record_json(&self.descriptors, self.descriptors.root(), &fields)
    }
}

/// Parses a rendered schema, leaving out the defaults the codec cannot read.
fn parse_schema(schema: &JsonValue) -> AvroResult<Schema> {
    let mut fixed = HashSet::new();
    collect_fixed(schema, None, &mut fixed);
    let mut schema = schema.clone();
    strip_defaults(&mut schema, &fixed);
    Ok(Schema::parse(&schema)?)
}

fn collect_fixed(schema: &JsonValue, namespace: Option<&str>, fixed: &mut HashSet<String>) {
    match schema {
        JsonValue::Array(members) => {
            for member in members {
                collect_fixed(member, namespace, fixed);
            }
        }
        JsonValue::Object(object) => {
            let own = object
                .get("namespace")
                .and_then(JsonValue::as_str)
                .or(namespace);
            match object.get("type").and_then(JsonValue::as_str) {
                Some("fixed") => {
                    if let Some(name) = object.get("name").and_then(JsonValue::as_str) {
                        fixed.insert(name.to_string());
                        if let Some(own) = own {
                            fixed.insert(format!("{own}.{name}"));
                        }
                    }
                }
                Some("record") => {
                    for field in object
                        .get("fields")
                        .and_then(JsonValue::as_array)
                        .into_iter()
                        .flatten()
                    {
                        if let Some(ty) = field.get("type") {
                            collect_fixed(ty, own, fixed);
                        }
                    }
                }
                Some("array") => {
                    if let Some(items) = object.get("items") {
                        collect_fixed(items, namespace, fixed);
                    }
                }
                Some("map") => {
                    if let Some(values) = object.get("values") {
                        collect_fixed(values, namespace, fixed);
                    }
                }
                _ => {}
            }
        }
        _ => {}
    }
}

fn strip_defaults(schema: &mut JsonValue, fixed: &HashSet<String>) {
    match schema {
        JsonValue::Array(members) => {
            for member in members {
                strip_defaults(member, fixed);
            }
        }
        JsonValue::Object(object) => match object.get("type").and_then(JsonValue::as_str) {
            Some("record") => {
                if let Some(JsonValue::Array(fields)) = object.get_mut("fields") {
                    for field in fields.iter_mut().filter_map(JsonValue::as_object_mut) {
                        if field.get("type").is_some_and(|ty| holds_bytes(ty, fixed)) {
                            field.remove("default");
                        }
                        if let Some(ty) = field.get_mut("type") {
                            strip_defaults(ty, fixed);
                        }
                    }
                }
            }
            Some("array") => {
                if let Some(items) = object.get_mut("items") {
                    strip_defaults(items, fixed);
                }
            }
            Some("map") => {
                if let Some(values) = object.get_mut("values") {
                    strip_defaults(values, fixed);
                }
            }
            _ => {}
        },
        _ => {}
    }
}

/// Whether a default of `ty` is a decimal or fixed value.
fn holds_bytes(ty: &JsonValue, fixed: &HashSet<String>) -> bool {
    match ty {
        JsonValue::String(name) => fixed.contains(name),
        JsonValue::Array(members) => members.first().is_some_and(|m| holds_bytes(m, fixed)),
        JsonValue::Object(object) => {
            object.get("type").and_then(JsonValue::as_str) == Some("fixed")
                || object.get("logicalType").and_then(JsonValue::as_str) == Some("decimal")
        }
        _ => false,
    }
}

/// The operations available on every record type.
///
/// Each call prepares a fresh [`ModelCodec`]; use [`AvroModel::codec`] to reuse one.
pub trait AvroModel: AvroRecord {
    /// The Avro schema of the record.
    fn avro_schema() -> AvroResult<JsonValue> {
        render(&describe::<Self>()?)
    }

    fn avro_schema_string() -> AvroResult<String> {
        Ok(serde_json::to_string(&Self::avro_schema()?)?)
    }

    /// The schema with record and field names rewritten in `style`.
    ///
    /// Only the rendered document changes, values are still encoded with the declared names.
    fn avro_schema_with_case(style: CaseStyle) -> AvroResult<JsonValue> {
        let mut schema = Self::avro_schema()?;
        style.apply_to_schema(&mut schema);
        Ok(schema)
    }

    /// The resolved fields of the record, in schema order.
    fn fields() -> AvroResult<Vec<FieldDescriptor>> {
        let descriptors = describe::<Self>()?;
        Ok(descriptors.root().fields.clone())
    }

    fn codec() -> AvroResult<ModelCodec<Self>> {
        ModelCodec::new()
    }

    /// The model as a dynamic instance tree.
    fn to_dict(&self) -> Datum {
        self.to_datum()
    }

    /// The model as the codec's value.
    fn to_value(&self) -> AvroResult<Value> {
        Self::codec()?.to_value(self)
    }

    fn to_json(&self) -> AvroResult<JsonValue> {
        Self::codec()?.to_json(self)
    }

    fn serialize(&self, encoding: Encoding) -> AvroResult<Vec<u8>> {
        Self::codec()?.serialize(self, encoding)
    }

    fn deserialize(bytes: &[u8], encoding: Encoding) -> AvroResult<Self> {
        Self::codec()?.deserialize(bytes, encoding)
    }

    fn deserialize_with_writer_schema(
        bytes: &[u8],
        encoding: Encoding,
        writer_schema: &JsonValue,
    ) -> AvroResult<Self> {
        Self::codec()?.deserialize_with_writer_schema(bytes, encoding, writer_schema)
    }

    fn parse_obj(datum: &Datum) -> AvroResult<Self> {
        Self::codec()?.parse_datum(datum)
    }

    fn from_value(value: Value) -> AvroResult<Self> {
        Self::codec()?.from_value(value)
    }

    fn validate(&self) -> AvroResult<()> {
        Self::codec()?.validate(self)
    }
}

impl<T: AvroRecord> AvroModel for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn encoding_names() -> anyhow::Result<()> {
        assert_eq!(Encoding::from_str("avro-json")?, Encoding::Json);
        assert_eq!(Encoding::Binary.to_string(), "avro");
        Ok(())
    }

    #[test]
    fn bytes_defaults_are_hidden_from_the_codec() -> anyhow::Result<()> {
        let schema = json!({
            "type": "record",
            "name": "Payment",
            "fields": [
                {
                    "name": "amount",
                    "type": {"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 2},
                    "default": "\u{0}\u{96}",
                },
                {"name": "digest", "type": {"type": "fixed", "name": "md5", "size": 2}, "default": "ab"},
                {"name": "other", "type": ["null", "md5"], "default": null},
                {"name": "count", "type": "long", "default": 1},
            ],
        });
        let mut fixed = HashSet::new();
        collect_fixed(&schema, None, &mut fixed);
        assert_eq!(fixed, HashSet::from(["md5".to_string()]));

        let mut stripped = schema.clone();
        strip_defaults(&mut stripped, &fixed);
        let defaults: Vec<_> = stripped["fields"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|field| field.get("default").cloned())
            .collect();
        assert_eq!(defaults, vec![None, None, Some(JsonValue::Null), Some(json!(1))]);

        parse_schema(&schema)?;
        Ok(())
    }
}
