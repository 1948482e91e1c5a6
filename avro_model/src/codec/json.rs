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

//! The Avro JSON encoding of primitive values.
//!
//! The encoding follows the [specification](https://avro.apache.org/docs/++version++/specification/#json-encoding):
//! non-null union values are wrapped in an object keyed by the branch type name, bytes and fixed
//! values are strings with one code point per byte and logical types use their underlying type.

use crate::{codec::default_json, logical, tracker::fullname};
use apache_avro::{Decimal, types::Value};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

const PRIMITIVES: [&str; 8] = [
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// Whether union defaults are wrapped (encoded values) or written as a value of the first member
/// (field defaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Encoded,
    Default,
}

/// Encodes and decodes values following a rendered schema document.
pub(crate) struct JsonCodec<'a> {
    schema: &'a JsonValue,
    named: HashMap<String, (&'a JsonValue, Option<String>)>,
}

impl<'a> JsonCodec<'a> {
    pub(crate) fn new(schema: &'a JsonValue) -> Self {
        let mut named = HashMap::new();
        collect_named(schema, None, &mut named);
        Self { schema, named }
    }

    pub(crate) fn encode(&self, value: &Value) -> Result<JsonValue, String> {
        self.encode_with(self.schema, value, None)
    }

    pub(crate) fn decode(&self, json: &JsonValue) -> Result<Value, String> {
        self.decode_with(self.schema, json, None, Form::Encoded)
    }

    fn lookup(&self, name: &str, namespace: Option<&str>) -> Result<(&'a JsonValue, Option<String>), String> {
        self.named
            .get(&fullname(name, namespace))
            .or_else(|| self.named.get(name))
            .cloned()
            .ok_or_else(|| format!("unknown named type {name:?}"))
    }

    fn encode_with(
        &self,
        schema: &'a JsonValue,
        value: &Value,
        namespace: Option<&str>,
    ) -> Result<JsonValue, String> {
        match schema {
            JsonValue::String(name) if PRIMITIVES.contains(&name.as_str()) => default_json(value),
            JsonValue::String(name) => {
                let (definition, namespace) = self.lookup(name, namespace)?;
                self.encode_with(definition, value, namespace.as_deref())
            }
            JsonValue::Array(members) => {
                let Value::Union(index, inner) = value else {
                    return Err(format!("expected a union value, got {value:?}"));
                };
                let member = members
                    .get(*index as usize)
                    .ok_or_else(|| format!("the union has no member {index}"))?;
                if **inner == Value::Null {
                    return Ok(JsonValue::Null);
                }
                let mut wrapped = Map::with_capacity(1);
                wrapped.insert(
                    self.branch_name(member, namespace)?,
                    self.encode_with(member, inner, namespace)?,
                );
                Ok(JsonValue::Object(wrapped))
            }
            JsonValue::Object(object) => match type_of(object)? {
                "record" => {
                    let Value::Record(fields) = value else {
                        return Err(format!("expected a record value, got {value:?}"));
                    };
                    let namespace = namespace_of(object, namespace);
                    let mut encoded = Map::with_capacity(fields.len());
                    for field in field_defs(object)? {
                        let name = field_name(field)?;
                        let field_value = fields
                            .iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, v)| v)
                            .ok_or_else(|| format!("the value has no field {name:?}"))?;
                        encoded.insert(
                            name.to_string(),
                            self.encode_with(field_type(field)?, field_value, namespace.as_deref())?,
                        );
                    }
                    Ok(JsonValue::Object(encoded))
                }
                "array" => {
                    let Value::Array(items) = value else {
                        return Err(format!("expected an array value, got {value:?}"));
                    };
                    let schema = object.get("items").ok_or("an array without items")?;
                    items
                        .iter()
                        .map(|item| self.encode_with(schema, item, namespace))
                        .collect::<Result<_, _>>()
                        .map(JsonValue::Array)
                }
                "map" => {
                    let Value::Map(entries) = value else {
                        return Err(format!("expected a map value, got {value:?}"));
                    };
                    let schema = object.get("values").ok_or("a map without values")?;
                    let mut keys: Vec<_> = entries.keys().collect();
                    keys.sort();
                    let mut encoded = Map::with_capacity(entries.len());
                    for key in keys {
                        encoded.insert(key.clone(), self.encode_with(schema, &entries[key], namespace)?);
                    }
                    Ok(JsonValue::Object(encoded))
                }
                // enums, fixed and logical types are self describing
                _ => default_json(value),
            },
            other => Err(format!("{other} is not a schema")),
        }
    }

    /// The key a union value of `member` is wrapped in.
    fn branch_name(&self, member: &'a JsonValue, namespace: Option<&str>) -> Result<String, String> {
        match member {
            JsonValue::String(name) if PRIMITIVES.contains(&name.as_str()) => Ok(name.clone()),
            JsonValue::String(name) => {
                let (definition, _) = self.lookup(name, namespace)?;
                self.branch_name(definition, namespace)
            }
            JsonValue::Object(object) => {
                let kind = type_of(object)?;
                match kind {
                    "record" | "enum" | "fixed" => {
                        let name = object
                            .get("name")
                            .and_then(JsonValue::as_str)
                            .ok_or("a named type without a name")?;
                        if name.contains('.') {
                            Ok(name.to_string())
                        } else {
                            Ok(fullname(name, namespace_of(object, namespace).as_deref()))
                        }
                    }
                    other => Ok(other.to_string()),
                }
            }
            other => Err(format!("{other} cannot be a union member")),
        }
    }

    fn decode_with(
        &self,
        schema: &'a JsonValue,
        json: &JsonValue,
        namespace: Option<&str>,
        form: Form,
    ) -> Result<Value, String> {
        match schema {
            JsonValue::String(name) if PRIMITIVES.contains(&name.as_str()) => {
                decode_primitive(name, None, json)
            }
            JsonValue::String(name) => {
                let (definition, namespace) = self.lookup(name, namespace)?;
                self.decode_with(definition, json, namespace.as_deref(), form)
            }
            JsonValue::Array(members) => {
                if form == Form::Default {
                    let first = members.first().ok_or("an empty union")?;
                    let value = self.decode_with(first, json, namespace, form)?;
                    return Ok(Value::Union(0, Box::new(value)));
                }
                if json.is_null() {
                    let index = members
                        .iter()
                        .position(|m| m.as_str() == Some("null"))
                        .ok_or("null is not a member of the union")?;
                    return Ok(Value::Union(index as u32, Box::new(Value::Null)));
                }
                let (branch, inner) = match json.as_object() {
                    Some(object) if object.len() == 1 => object
                        .iter()
                        .next()
                        .ok_or("an empty union value")?,
                    _ => return Err(format!("{json} is not a union value")),
                };
                for (index, member) in members.iter().enumerate() {
                    if self.branch_name(member, namespace)? == *branch {
                        let value = self.decode_with(member, inner, namespace, form)?;
                        return Ok(Value::Union(index as u32, Box::new(value)));
                    }
                }
                Err(format!("{branch:?} is not a member of the union"))
            }
            JsonValue::Object(object) => {
                let kind = type_of(object)?;
                match kind {
                    "record" => {
                        let values = json
                            .as_object()
                            .ok_or_else(|| format!("{json} is not a record"))?;
                        let namespace = namespace_of(object, namespace);
                        let mut fields = Vec::new();
                        for field in field_defs(object)? {
                            let name = field_name(field)?;
                            let ty = field_type(field)?;
                            let value = match values.get(name) {
                                Some(value) => {
                                    self.decode_with(ty, value, namespace.as_deref(), form)?
                                }
                                None => {
                                    let default = field
                                        .get("default")
                                        .ok_or_else(|| format!("the field {name:?} is missing"))?;
                                    self.decode_with(ty, default, namespace.as_deref(), Form::Default)?
                                }
                            };
                            fields.push((name.to_string(), value));
                        }
                        Ok(Value::Record(fields))
                    }
                    "enum" => {
                        let symbol = json.as_str().ok_or_else(|| format!("{json} is not a symbol"))?;
                        let index = object
                            .get("symbols")
                            .and_then(JsonValue::as_array)
                            .and_then(|symbols| symbols.iter().position(|s| s.as_str() == Some(symbol)))
                            .ok_or_else(|| format!("{symbol:?} is not a symbol of the enum"))?;
                        Ok(Value::Enum(index as u32, symbol.to_string()))
                    }
                    "fixed" => {
                        let bytes = latin1(json)?;
                        let size = object.get("size").and_then(JsonValue::as_u64).unwrap_or(0) as usize;
                        if bytes.len() != size {
                            return Err(format!("expected {size} bytes, got {}", bytes.len()));
                        }
                        if object.get("logicalType").and_then(JsonValue::as_str) == Some("decimal") {
                            Ok(Value::Decimal(Decimal::from(bytes)))
                        } else {
                            Ok(Value::Fixed(size, bytes))
                        }
                    }
                    "array" => {
                        let schema = object.get("items").ok_or("an array without items")?;
                        json.as_array()
                            .ok_or_else(|| format!("{json} is not an array"))?
                            .iter()
                            .map(|item| self.decode_with(schema, item, namespace, form))
                            .collect::<Result<_, _>>()
                            .map(Value::Array)
                    }
                    "map" => {
                        let schema = object.get("values").ok_or("a map without values")?;
                        json.as_object()
                            .ok_or_else(|| format!("{json} is not a map"))?
                            .iter()
                            .map(|(k, v)| Ok((k.clone(), self.decode_with(schema, v, namespace, form)?)))
                            .collect::<Result<_, String>>()
                            .map(Value::Map)
                    }
                    primitive => decode_primitive(
                        primitive,
                        object.get("logicalType").and_then(JsonValue::as_str),
                        json,
                    ),
                }
            }
            other => Err(format!("{other} is not a schema")),
        }
    }
}

fn collect_named<'a>(
    schema: &'a JsonValue,
    namespace: Option<&str>,
    named: &mut HashMap<String, (&'a JsonValue, Option<String>)>,
) {
    match schema {
        JsonValue::Array(members) => {
            for member in members {
                collect_named(member, namespace, named);
            }
        }
        JsonValue::Object(object) => match object.get("type") {
            Some(JsonValue::String(kind)) => match kind.as_str() {
                "record" | "enum" | "fixed" => {
                    let Some(name) = object.get("name").and_then(JsonValue::as_str) else {
                        return;
                    };
                    let own_namespace = namespace_of(object, namespace);
                    let full = if name.contains('.') {
                        name.to_string()
                    } else {
                        fullname(name, own_namespace.as_deref())
                    };
                    named.insert(full, (schema, own_namespace.clone()));
                    if let Some(JsonValue::Array(fields)) = object.get("fields") {
                        for field in fields {
                            if let Some(ty) = field.get("type") {
                                collect_named(ty, own_namespace.as_deref(), named);
                            }
                        }
                    }
                }
                "array" => {
                    if let Some(items) = object.get("items") {
                        collect_named(items, namespace, named);
                    }
                }
                "map" => {
                    if let Some(values) = object.get("values") {
                        collect_named(values, namespace, named);
                    }
                }
                _ => {}
            },
            Some(nested) => collect_named(nested, namespace, named),
            None => {}
        },
        _ => {}
    }
}

/// The namespace a named type definition lives in.
fn namespace_of(object: &Map<String, JsonValue>, enclosing: Option<&str>) -> Option<String> {
    if let Some((namespace, _)) = object
        .get("name")
        .and_then(JsonValue::as_str)
        .and_then(|name| name.rsplit_once('.'))
    {
        return Some(namespace.to_string());
    }
    match object.get("namespace").and_then(JsonValue::as_str) {
        Some(namespace) => Some(namespace.to_string()),
        None => enclosing.map(str::to_string),
    }
}

fn type_of(object: &Map<String, JsonValue>) -> Result<&str, String> {
    object
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "a schema object without a type".to_string())
}

fn field_defs(object: &Map<String, JsonValue>) -> Result<&Vec<JsonValue>, String> {
    object
        .get("fields")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| "a record without fields".to_string())
}

fn field_name(field: &JsonValue) -> Result<&str, String> {
    field
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "a field without a name".to_string())
}

fn field_type(field: &JsonValue) -> Result<&JsonValue, String> {
    field.get("type").ok_or_else(|| "a field without a type".to_string())
}

fn latin1(json: &JsonValue) -> Result<Vec<u8>, String> {
    let text = json.as_str().ok_or_else(|| format!("{json} is not a byte string"))?;
    logical::latin1_bytes(text).ok_or_else(|| format!("{text:?} has code points above U+00FF"))
}

fn decode_primitive(kind: &str, logical_type: Option<&str>, json: &JsonValue) -> Result<Value, String> {
    let invalid = || format!("{json} is not a valid {}", logical_type.unwrap_or(kind));
    let value = match (kind, logical_type) {
        ("null", _) if json.is_null() => Value::Null,
        ("boolean", _) => Value::Boolean(json.as_bool().ok_or_else(invalid)?),
        ("int", logical_type) => {
            let v = json
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(invalid)?;
            match logical_type {
                Some("date") => Value::Date(v),
                Some("time-millis") => Value::TimeMillis(v),
                _ => Value::Int(v),
            }
        }
        ("long", logical_type) => {
            let v = json.as_i64().ok_or_else(invalid)?;
            match logical_type {
                Some("time-micros") => Value::TimeMicros(v),
                Some("timestamp-millis") => Value::TimestampMillis(v),
                Some("timestamp-micros") => Value::TimestampMicros(v),
                _ => Value::Long(v),
            }
        }
        ("float", _) => Value::Float(json.as_f64().ok_or_else(invalid)? as f32),
        ("double", _) => Value::Double(json.as_f64().ok_or_else(invalid)?),
        ("bytes", Some("decimal")) => Value::Decimal(Decimal::from(latin1(json)?)),
        ("bytes", _) => Value::Bytes(latin1(json)?),
        ("string", Some("uuid")) => {
            let text = json.as_str().ok_or_else(invalid)?;
            Value::Uuid(Uuid::parse_str(text).map_err(|e| e.to_string())?)
        }
        ("string", _) => Value::String(json.as_str().ok_or_else(invalid)?.to_string()),
        _ => return Err(invalid()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> JsonValue {
        json!({
            "type": "record",
            "name": "User",
            "namespace": "app",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "friend", "type": ["null", "User"], "default": null},
                {"name": "color", "type": {"type": "enum", "name": "Color", "symbols": ["RED", "BLUE"]}},
                {"name": "tags", "type": {"type": "map", "values": ["long", "string"]}, "default": {}},
                {"name": "born", "type": {"type": "int", "logicalType": "date"}},
            ]
        })
    }

    fn user(name: &str, friend: Value) -> Value {
        Value::Record(vec![
            ("name".into(), Value::String(name.into())),
            ("friend".into(), friend),
            ("color".into(), Value::Enum(1, "BLUE".into())),
            (
                "tags".into(),
                Value::Map(HashMap::from([(
                    "n".to_string(),
                    Value::Union(0, Box::new(Value::Long(1))),
                )])),
            ),
            ("born".into(), Value::Date(18181)),
        ])
    }

    #[test]
    fn unions_are_wrapped_in_their_branch_name() -> Result<(), String> {
        let schema = schema();
        let codec = JsonCodec::new(&schema);
        let inner = user("alice", Value::Union(0, Box::new(Value::Null)));
        let outer = user("bob", Value::Union(1, Box::new(inner)));

        let json = codec.encode(&outer)?;
        assert_eq!(
            json,
            json!({
                "name": "bob",
                "friend": {"app.User": {
                    "name": "alice",
                    "friend": null,
                    "color": "BLUE",
                    "tags": {"n": {"long": 1}},
                    "born": 18181,
                }},
                "color": "BLUE",
                "tags": {"n": {"long": 1}},
                "born": 18181,
            })
        );
        assert_eq!(codec.decode(&json)?, outer);
        Ok(())
    }

    #[test]
    fn missing_fields_are_read_from_defaults() -> Result<(), String> {
        let schema = schema();
        let codec = JsonCodec::new(&schema);
        let value = codec.decode(&json!({"name": "carol", "color": "RED", "born": 0}))?;
        assert_eq!(
            value,
            Value::Record(vec![
                ("name".into(), Value::String("carol".into())),
                ("friend".into(), Value::Union(0, Box::new(Value::Null))),
                ("color".into(), Value::Enum(0, "RED".into())),
                ("tags".into(), Value::Map(HashMap::new())),
                ("born".into(), Value::Date(0)),
            ])
        );
        assert!(codec.decode(&json!({"name": "carol"})).is_err());
        Ok(())
    }
}
