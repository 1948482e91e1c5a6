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

//! Attribute parsing for `#[avro(..)]` attributes.

use darling::{FromMeta, ast::NestedMeta, util::PathList};
use std::collections::HashMap;
use syn::{Expr, ExprLit, Lit, Meta};

/// All the Avro attributes a container can have.
#[derive(darling::FromAttributes)]
#[darling(attributes(avro))]
pub struct ContainerAttributes {
    /// Change the name of this record/enum in the schema.
    #[darling(default)]
    pub name: Option<String>,
    /// Adds a `namespace` field to the schema.
    #[darling(default)]
    pub namespace: Option<String>,
    /// Adds a `doc` field to the schema.
    #[darling(default)]
    pub doc: Option<String>,
    /// Adds the `aliases` field to the schema.
    #[darling(multiple)]
    pub alias: Vec<String>,
    /// The fields emitted first, in this order.
    #[darling(default)]
    pub field_order: Option<PathList>,
    /// Fields left out of the schema. They are filled from their default when decoding.
    #[darling(default)]
    pub exclude: Option<PathList>,
    /// `field = "Name"`: the name given to the record nested in `field`.
    #[darling(default)]
    pub alias_nested_items: HashMap<String, String>,
    #[darling(default)]
    pub convert_literal_to_enum: bool,
    /// Reject decoded union values that match more than one member.
    #[darling(default)]
    pub strict_unions: bool,
    /// A function returning a `CustomEncoder`.
    #[darling(multiple)]
    pub custom_encoder: Vec<Expr>,
    /// A function returning a `TypeHook`.
    #[darling(multiple)]
    pub type_hook: Vec<Expr>,
    /// Derive a literal type instead of an enum.
    #[darling(default)]
    pub literal: bool,
}

/// All the Avro attributes a variant can have.
#[derive(darling::FromAttributes)]
#[darling(attributes(avro))]
pub struct VariantAttributes {
    /// Changes the symbol of the variant.
    #[darling(default)]
    pub rename: Option<String>,
}

/// The default of a field.
///
/// `#[avro(default)]` uses the `Default` implementation of the field type,
/// `#[avro(default = ..)]` uses the expression.
#[derive(Debug, FromMeta, PartialEq, Default)]
#[darling(from_expr = |expr| Ok(FieldDefault::Expr(expr.clone())))]
pub enum FieldDefault {
    #[default]
    #[darling(skip)]
    Disabled,
    #[darling(word, skip)]
    Trait,
    Expr(Expr),
}

#[derive(Debug, FromMeta)]
pub struct DecimalArgs {
    pub precision: u32,
    pub scale: u32,
    /// Back the decimal with a fixed of this size instead of bytes.
    #[darling(default)]
    pub size: Option<usize>,
}

#[derive(Debug, FromMeta)]
pub struct FixedArgs {
    pub size: usize,
    #[darling(default)]
    pub namespace: Option<String>,
    #[darling(multiple)]
    pub alias: Vec<String>,
}

/// `meta(key = literal, ..)`, kept in order. The values are stored as JSON text.
#[derive(Debug, Default)]
pub struct MetaEntries(pub Vec<(String, serde_json::Value)>);

impl FromMeta for MetaEntries {
    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let NestedMeta::Meta(Meta::NameValue(name_value)) = item else {
                return Err(darling::Error::unsupported_format("expected `key = value`").with_span(item));
            };
            let key = name_value
                .path
                .get_ident()
                .ok_or_else(|| darling::Error::custom("expected a plain key").with_span(&name_value.path))?
                .to_string();
            let value = match &name_value.value {
                Expr::Lit(ExprLit { lit, .. }) => match lit {
                    Lit::Str(s) => serde_json::Value::String(s.value()),
                    Lit::Int(i) => serde_json::Value::from(i.base10_parse::<i64>()?),
                    Lit::Float(f) => serde_json::Value::from(f.base10_parse::<f64>()?),
                    Lit::Bool(b) => serde_json::Value::Bool(b.value),
                    other => return Err(darling::Error::unexpected_lit_type(other)),
                },
                other => return Err(darling::Error::unexpected_expr_type(other)),
            };
            entries.push((key, value));
        }
        Ok(Self(entries))
    }
}

/// All the Avro attributes a field can have.
#[derive(darling::FromAttributes)]
#[darling(attributes(avro))]
pub struct FieldAttributes {
    /// Changes the name of the field in the schema.
    #[darling(default)]
    pub rename: Option<String>,
    /// Adds a `doc` field to the schema.
    #[darling(default)]
    pub doc: Option<String>,
    /// Adds the `aliases` field to the schema.
    #[darling(multiple)]
    pub alias: Vec<String>,
    /// The name of the enum, fixed or literal type synthesized for this field.
    #[darling(default)]
    pub inner_name: Option<String>,
    /// Keep the default for decoding but leave it out of the schema.
    #[darling(default)]
    pub exclude_default: bool,
    #[darling(default)]
    pub default: FieldDefault,
    /// A function producing the default, evaluated every time it is needed.
    #[darling(default)]
    pub default_factory: Option<Expr>,
    #[darling(default)]
    pub decimal: Option<DecimalArgs>,
    #[darling(default)]
    pub fixed: Option<FixedArgs>,
    #[darling(default)]
    pub int32: bool,
    #[darling(default)]
    pub float32: bool,
    #[darling(default)]
    pub time_micros: bool,
    #[darling(default)]
    pub timestamp_micros: bool,
    /// Extra keys spliced into the field.
    #[darling(default)]
    pub meta: MetaEntries,
    /// A JSON object whose entries are spliced into the field.
    #[darling(default)]
    pub meta_json: Option<String>,
    /// Don't include this field in the schema. It is filled with `Default::default()` when decoding.
    #[darling(default)]
    pub skip: bool,
}
