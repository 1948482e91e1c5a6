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

//! Per-record and per-field configuration.

use crate::{AvroResult, Datum, TypeAnnotation};
use serde_json::{Map, Value as JsonValue};
use std::{any::Any, collections::BTreeMap, fmt};

/// Configuration of a record type.
#[derive(bon::Builder, Debug, Clone, Default)]
pub struct RecordMeta {
    /// Overrides the record name in the schema.
    #[builder(into)]
    pub schema_name: Option<String>,
    #[builder(into)]
    pub namespace: Option<String>,
    #[builder(default)]
    pub aliases: Vec<String>,
    #[builder(into)]
    pub doc: Option<String>,
    /// The order the fields are emitted in. Fields not listed follow in declaration order.
    #[builder(default)]
    pub field_order: Vec<String>,
    /// Fields left out of the schema and of the encoded values.
    #[builder(default)]
    pub exclude: Vec<String>,
    /// Names given to records nested in the named fields' items, values or union members.
    #[builder(default)]
    pub alias_nested_items: BTreeMap<String, String>,
    /// Turn string literal types into enums instead of plain strings.
    #[builder(default)]
    pub convert_literal_to_enum: bool,
    #[builder(default)]
    pub decode: DecodeConfig,
    #[builder(default)]
    pub custom_encoders: Vec<CustomEncoder>,
}

impl RecordMeta {
    pub fn is_excluded(&self, field: &str) -> bool {
        self.exclude.iter().any(|name| name == field)
    }
}

/// How primitive values are rehydrated into models.
#[derive(Debug, Clone, Default)]
pub struct DecodeConfig {
    /// Fail when a decoded union value matches more than one member.
    pub strict_unions: bool,
    /// Casts applied to values of opaque types, on top of the built-in ones.
    pub type_hooks: Vec<TypeHook>,
}

/// Turns a decoded primitive value into the datum an opaque type expects.
#[derive(Clone, Copy)]
pub struct TypeHook {
    pub type_name: &'static str,
    pub hook: fn(Datum) -> Result<Datum, String>,
}

impl TypeHook {
    pub fn new<T: Any>(hook: fn(Datum) -> Result<Datum, String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            hook,
        }
    }
}

impl fmt::Debug for TypeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHook").field(&self.type_name).finish()
    }
}

/// Makes an opaque type encodable by converting its values to another type first.
#[derive(Clone)]
pub struct CustomEncoder {
    pub type_name: &'static str,
    /// The type the values are converted to.
    pub encoded_as: TypeAnnotation,
    pub encode: fn(&Datum) -> Result<Datum, String>,
}

impl CustomEncoder {
    pub fn new<T: Any>(encoded_as: TypeAnnotation, encode: fn(&Datum) -> Result<Datum, String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            encoded_as,
            encode,
        }
    }
}

impl fmt::Debug for CustomEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEncoder")
            .field("type_name", &self.type_name)
            .field("encoded_as", &self.encoded_as)
            .finish_non_exhaustive()
    }
}

/// Configuration of a record field.
///
/// Besides the keys the library understands, any key is kept and spliced verbatim into the
/// rendered field, in insertion order. The reserved keys drive behaviour and never reach the
/// schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    entries: Map<String, JsonValue>,
}

impl FieldMeta {
    pub const INNER_NAME: &'static str = "inner_name";
    pub const EXCLUDE_DEFAULT: &'static str = "exclude_default";
    pub const RESERVED: [&'static str; 2] = [Self::INNER_NAME, Self::EXCLUDE_DEFAULT];

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the metadata from a JSON object.
    pub fn from_json(value: JsonValue) -> AvroResult<Self> {
        let entries = serde_json::from_value::<Map<String, JsonValue>>(value)?;
        Ok(Self { entries })
    }

    pub fn with_doc(self, doc: impl Into<String>) -> Self {
        self.with_entry("doc", doc.into())
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = JsonValue::String(alias.into());
        match self.entries.get_mut("aliases") {
            Some(JsonValue::Array(aliases)) => aliases.push(alias),
            _ => {
                self.entries
                    .insert("aliases".to_string(), JsonValue::Array(vec![alias]));
            }
        }
        self
    }

    /// The name of the named type synthesized for this field (enum, fixed, nested record alias).
    pub fn with_inner_name(self, name: impl Into<String>) -> Self {
        self.with_entry(Self::INNER_NAME, name.into())
    }

    /// Hides the default of the field from the schema while keeping it for decoding.
    pub fn with_exclude_default(self, exclude: bool) -> Self {
        self.with_entry(Self::EXCLUDE_DEFAULT, exclude)
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    pub fn doc(&self) -> Option<&str> {
        self.entries.get("doc").and_then(JsonValue::as_str)
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.entries
            .get("aliases")
            .and_then(JsonValue::as_array)
            .map(|aliases| aliases.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }

    pub fn inner_name(&self) -> Option<&str> {
        self.entries.get(Self::INNER_NAME).and_then(JsonValue::as_str)
    }

    pub fn exclude_default(&self) -> bool {
        self.entries
            .get(Self::EXCLUDE_DEFAULT)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// The entries that go into the rendered field.
    pub fn splice(&self) -> Map<String, JsonValue> {
        self.entries
            .iter()
            .filter(|(key, _)| !Self::RESERVED.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn splice_keeps_order_and_drops_reserved_keys() {
        let meta = FieldMeta::new()
            .with_entry("pydantic-class", "IPv4Address")
            .with_inner_name("Color")
            .with_doc("the color")
            .with_alias("colour")
            .with_alias("kleur")
            .with_exclude_default(true);

        assert_eq!(meta.inner_name(), Some("Color"));
        assert!(meta.exclude_default());
        assert_eq!(meta.aliases(), ["colour", "kleur"]);
        assert_eq!(
            JsonValue::Object(meta.splice()),
            json!({
                "pydantic-class": "IPv4Address",
                "doc": "the color",
                "aliases": ["colour", "kleur"],
            })
        );
        let keys: Vec<_> = meta.splice().keys().cloned().collect();
        assert_eq!(keys, ["pydantic-class", "doc", "aliases"]);
    }

    #[test]
    fn field_meta_from_json_requires_an_object() {
        assert!(FieldMeta::from_json(json!({"doc": "x"})).is_ok());
        assert!(FieldMeta::from_json(json!(["doc"])).is_err());
    }

    #[test]
    fn record_meta_builder() {
        let meta = RecordMeta::builder()
            .namespace("test.types")
            .schema_name("Person")
            .exclude(vec!["age".to_string()])
            .convert_literal_to_enum(true)
            .build();
        assert_eq!(meta.namespace.as_deref(), Some("test.types"));
        assert!(meta.is_excluded("age"));
        assert!(!meta.is_excluded("name"));
    }
}
