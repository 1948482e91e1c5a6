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

//! Renders resolved descriptors into the Avro schema JSON document.
//!
//! Named types (records, enums and fixed types) are defined where they first appear and referred
//! to by name afterwards. Records without a namespace of their own live in the namespace of the
//! closest enclosing record that has one.

use crate::{
    AvroResult, Datum, EnumDecl, RecordRef,
    codec::{Encoder, default_json},
    descriptor::{
        DecimalSpec, Descriptors, FieldDescriptor, FixedSpec, LiteralForm, RecordDescriptor,
        TypeDescriptor,
    },
    error::{Details, Error},
    tracker::{Definition, Emission, NamedTypes, fullname, reference},
    validator::validate_schema_name,
};
use log::debug;
use serde_json::{Map, Value as JsonValue};

/// Renders the schema of the root record of `descriptors`.
pub fn render(descriptors: &Descriptors) -> AvroResult<JsonValue> {
    Renderer::new(descriptors).render_root()
}

/// A record whose fields are being rendered.
struct Frame<'a> {
    record: &'a RecordDescriptor,
    /// The name the record is emitted under, which differs from its own when aliased.
    name: String,
    namespace: Option<String>,
}

struct Renderer<'a> {
    descriptors: &'a Descriptors,
    named: NamedTypes,
    chain: Vec<Frame<'a>>,
}

impl<'a> Renderer<'a> {
    fn new(descriptors: &'a Descriptors) -> Self {
        Self {
            descriptors,
            named: NamedTypes::default(),
            chain: Vec::new(),
        }
    }

    fn render_root(&mut self) -> AvroResult<JsonValue> {
        self.named.reset();
        self.chain.clear();
        let root = self.descriptors.root();
        self.render_record(root, None, &root.name)
    }

    fn enclosing_namespace(&self) -> Option<&str> {
        self.chain.last().and_then(|frame| frame.namespace.as_deref())
    }

    fn render_record(
        &mut self,
        record: &'a RecordDescriptor,
        alias: Option<&str>,
        path: &str,
    ) -> AvroResult<JsonValue> {
        let name = match alias {
            Some(alias) => {
                validate_schema_name(alias, path)?;
                alias.to_string()
            }
            None => record.name.clone(),
        };
        let enclosing = self.enclosing_namespace().map(str::to_string);
        let namespace = record.meta.namespace.clone().or(enclosing.clone());
        let full = fullname(&name, namespace.as_deref());

        let definition = Definition::Record(record.record.type_id);
        if self.named.register(&full, definition, path)? == Emission::Reference {
            return Ok(JsonValue::String(reference(
                &name,
                namespace.as_deref(),
                enclosing.as_deref(),
            )));
        }

        self.chain.push(Frame {
            record,
            name: name.clone(),
            namespace,
        });
        let fields = self.render_fields(record, &name);
        self.chain.pop();

        let mut schema = Map::new();
        schema.insert("type".to_string(), "record".into());
        schema.insert("name".to_string(), name.into());
        schema.insert("fields".to_string(), JsonValue::Array(fields?));
        if let Some(doc) = &record.meta.doc {
            schema.insert("doc".to_string(), doc.clone().into());
        }
        if let Some(namespace) = &record.meta.namespace {
            schema.insert("namespace".to_string(), namespace.clone().into());
        }
        if !record.meta.aliases.is_empty() {
            schema.insert("aliases".to_string(), record.meta.aliases.clone().into());
        }
        Ok(JsonValue::Object(schema))
    }

    fn render_fields(
        &mut self,
        record: &'a RecordDescriptor,
        record_name: &str,
    ) -> AvroResult<Vec<JsonValue>> {
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let path = format!("{record_name}.{}", field.name);
            let alias = record.meta.alias_nested_items.get(&field.name).cloned();

            let mut rendered = field.metadata.clone();
            rendered.insert("name".to_string(), field.name.clone().into());
            rendered.insert(
                "type".to_string(),
                self.render_type(&field.ty, alias.as_deref(), &path)?,
            );
            if !field.exclude_default {
                if let Some(default) = field.default_value() {
                    rendered.insert("default".to_string(), self.render_default(field, &default, &path)?);
                }
            }
            fields.push(JsonValue::Object(rendered));
        }
        Ok(fields)
    }

    /// Encodes a default like a value of the field and writes it in its JSON form.
    fn render_default(
        &self,
        field: &FieldDescriptor,
        default: &Datum,
        path: &str,
    ) -> AvroResult<JsonValue> {
        let mut encoder = Encoder::new(self.descriptors);
        for frame in &self.chain {
            encoder.enter(frame.record);
        }
        let value = encoder
            .encode(&field.ty, default, path)
            .map_err(|err| match err.into_details() {
                Details::Encode { path, reason } => Error::InvalidDefault(path, reason),
                details => Error::new(details),
            })?;
        default_json(&value).map_err(|reason| Error::InvalidDefault(path, reason))
    }

    fn render_type(
        &mut self,
        ty: &'a TypeDescriptor,
        alias: Option<&str>,
        path: &str,
    ) -> AvroResult<JsonValue> {
        use TypeDescriptor as T;
        let schema = match ty {
            T::Immutable(primitive) => primitive.schema(),
            T::Logical(logical) => logical.schema(),
            T::Decimal(spec) => self.render_decimal(spec, path)?,
            T::Fixed(spec) => self.render_fixed(spec, None, path)?,
            T::Array(items) => {
                let mut schema = Map::new();
                schema.insert("type".to_string(), "array".into());
                schema.insert("items".to_string(), self.render_type(items, alias, path)?);
                JsonValue::Object(schema)
            }
            T::Map(values) => {
                let mut schema = Map::new();
                schema.insert("type".to_string(), "map".into());
                schema.insert("values".to_string(), self.render_type(values, alias, path)?);
                JsonValue::Object(schema)
            }
            T::Union(members) => members
                .iter()
                .map(|member| self.render_type(member, alias, path))
                .collect::<AvroResult<_>>()
                .map(JsonValue::Array)?,
            T::Literal {
                form: LiteralForm::Enum(decl),
                ..
            }
            | T::Enum(decl) => self.render_enum(decl, path)?,
            T::Literal {
                form: LiteralForm::Primitives(primitives),
                ..
            } => match primitives.as_slice() {
                [single] => single.schema(),
                many => JsonValue::Array(many.iter().map(|p| p.schema()).collect()),
            },
            T::Record(record) => self.render_named_record(record, alias, path)?,
            T::SelfRef(record) => {
                match self
                    .chain
                    .iter()
                    .rev()
                    .find(|frame| frame.record.record == *record)
                {
                    Some(frame) => {
                        debug!("Referencing enclosing record {} at {path}", frame.name);
                        JsonValue::String(reference(
                            &frame.name,
                            frame.namespace.as_deref(),
                            self.enclosing_namespace(),
                        ))
                    }
                    // A reordered field can reach the record outside of its own fields.
                    None => self.render_named_record(record, alias, path)?,
                }
            }
            T::Custom { encoded, .. } => self.render_type(encoded, alias, path)?,
        };
        Ok(schema)
    }

    fn render_named_record(
        &mut self,
        record: &RecordRef,
        alias: Option<&str>,
        path: &str,
    ) -> AvroResult<JsonValue> {
        let descriptor = self
            .descriptors
            .get(record)
            .ok_or_else(|| Error::UnknownType(path, record.type_name))?;
        self.render_record(descriptor, alias, path)
    }

    fn render_decimal(&mut self, spec: &DecimalSpec, path: &str) -> AvroResult<JsonValue> {
        let mut logical = Map::new();
        logical.insert("logicalType".to_string(), "decimal".into());
        logical.insert("precision".to_string(), spec.precision.into());
        logical.insert("scale".to_string(), spec.scale.into());
        match &spec.fixed {
            Some(fixed) => self.render_fixed(fixed, Some(logical), path),
            None => {
                let mut schema = Map::new();
                schema.insert("type".to_string(), "bytes".into());
                schema.extend(logical);
                Ok(JsonValue::Object(schema))
            }
        }
    }

    fn render_fixed(
        &mut self,
        spec: &FixedSpec,
        logical: Option<Map<String, JsonValue>>,
        path: &str,
    ) -> AvroResult<JsonValue> {
        let mut schema = Map::new();
        schema.insert("type".to_string(), "fixed".into());
        schema.insert("name".to_string(), spec.name.clone().into());
        schema.insert("size".to_string(), spec.size.into());
        if let Some(namespace) = &spec.namespace {
            schema.insert("namespace".to_string(), namespace.clone().into());
        }
        if !spec.aliases.is_empty() {
            schema.insert("aliases".to_string(), spec.aliases.clone().into());
        }
        if let Some(logical) = logical {
            schema.extend(logical);
        }
        self.emit_named(&spec.name, spec.namespace.as_deref(), schema, path)
    }

    fn render_enum(&mut self, decl: &EnumDecl, path: &str) -> AvroResult<JsonValue> {
        let mut schema = Map::new();
        schema.insert("type".to_string(), "enum".into());
        schema.insert("name".to_string(), decl.name.clone().into());
        schema.insert("symbols".to_string(), decl.symbols.clone().into());
        if let Some(doc) = &decl.doc {
            schema.insert("doc".to_string(), doc.clone().into());
        }
        if let Some(namespace) = &decl.namespace {
            schema.insert("namespace".to_string(), namespace.clone().into());
        }
        if !decl.aliases.is_empty() {
            schema.insert("aliases".to_string(), decl.aliases.clone().into());
        }
        if let Some(default) = &decl.default {
            schema.insert("default".to_string(), default.clone().into());
        }
        self.emit_named(&decl.name, decl.namespace.as_deref(), schema, path)
    }

    /// Registers an enum or fixed definition, returning it or a reference to its first emission.
    fn emit_named(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        schema: Map<String, JsonValue>,
        path: &str,
    ) -> AvroResult<JsonValue> {
        let enclosing = self.enclosing_namespace().map(str::to_string);
        let namespace = namespace.map(str::to_string).or(enclosing.clone());
        let full = fullname(name, namespace.as_deref());
        let schema = JsonValue::Object(schema);
        match self
            .named
            .register(&full, Definition::Schema(schema.clone()), path)?
        {
            Emission::Full => Ok(schema),
            Emission::Reference => Ok(JsonValue::String(reference(
                name,
                namespace.as_deref(),
                enclosing.as_deref(),
            ))),
        }
    }
}
