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

use darling::FromAttributes;
use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, quote};
use syn::{AttrStyle, Attribute, Expr, Ident, Path, spanned::Spanned};

mod avro;

pub use avro::FieldDefault;

pub struct NamedTypeOptions {
    /// The name of the type in the schema.
    pub name: String,
    /// Set when `#[avro(name = "..")]` renamed the type.
    pub renamed: bool,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub field_order: Vec<Ident>,
    pub exclude: Vec<Ident>,
    pub alias_nested_items: Vec<(String, String)>,
    pub convert_literal_to_enum: bool,
    pub strict_unions: bool,
    pub custom_encoders: Vec<Expr>,
    pub type_hooks: Vec<Expr>,
    pub literal: bool,
}

impl NamedTypeOptions {
    pub fn new(
        ident: &Ident,
        attributes: &[Attribute],
        span: Span,
    ) -> Result<Self, Vec<syn::Error>> {
        let avro =
            avro::ContainerAttributes::from_attributes(attributes).map_err(darling_to_syn)?;

        // Collect errors so user gets all feedback at once
        let mut errors = Vec::new();
        let field_order = idents(avro.field_order.as_ref().map(|list| list.as_slice()), &mut errors);
        let exclude = idents(avro.exclude.as_ref().map(|list| list.as_slice()), &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut alias_nested_items = avro.alias_nested_items.into_iter().collect::<Vec<_>>();
        alias_nested_items.sort();
        if avro.namespace.as_deref() == Some("") {
            warn(
                span,
                "An empty namespace is the same as no namespace",
                "Remove `#[avro(namespace = \"\")]`",
            );
        }

        let doc = avro.doc.or_else(|| extract_rustdoc(attributes));

        Ok(Self {
            renamed: avro.name.is_some(),
            name: avro.name.unwrap_or_else(|| unraw(ident)),
            namespace: avro.namespace.filter(|namespace| !namespace.is_empty()),
            doc,
            aliases: avro.alias,
            field_order,
            exclude,
            alias_nested_items,
            convert_literal_to_enum: avro.convert_literal_to_enum,
            strict_unions: avro.strict_unions,
            custom_encoders: avro.custom_encoder,
            type_hooks: avro.type_hook,
            literal: avro.literal,
        })
    }

    /// Errors for the attributes that only make sense on a struct.
    pub fn reject_record_attributes(&self, span: Span) -> Result<(), Vec<syn::Error>> {
        if !self.field_order.is_empty()
            || !self.exclude.is_empty()
            || !self.alias_nested_items.is_empty()
            || self.convert_literal_to_enum
            || self.strict_unions
            || !self.custom_encoders.is_empty()
            || !self.type_hooks.is_empty()
        {
            return Err(vec![syn::Error::new(
                span,
                "AvroModel: `field_order`, `exclude`, `alias_nested_items`, `convert_literal_to_enum`, `strict_unions`, `custom_encoder` and `type_hook` are only supported on structs",
            )]);
        }
        Ok(())
    }
}

fn idents(paths: Option<&[Path]>, errors: &mut Vec<syn::Error>) -> Vec<Ident> {
    paths
        .unwrap_or_default()
        .iter()
        .filter_map(|path| match path.get_ident() {
            Some(ident) => Some(ident.clone()),
            None => {
                errors.push(syn::Error::new_spanned(path, "Expected a field name"));
                None
            }
        })
        .collect()
}

pub struct VariantOptions {
    pub rename: Option<String>,
}

impl VariantOptions {
    pub fn new(attributes: &[Attribute]) -> Result<Self, Vec<syn::Error>> {
        let avro = avro::VariantAttributes::from_attributes(attributes).map_err(darling_to_syn)?;
        Ok(Self {
            rename: avro.rename,
        })
    }
}

/// A field-level refinement of the field type.
#[derive(Debug, PartialEq)]
pub enum FieldInfo {
    Int32,
    Float32,
    TimeMicros,
    TimestampMicros,
    Decimal {
        precision: u32,
        scale: u32,
    },
    DecimalFixed {
        precision: u32,
        scale: u32,
        size: usize,
    },
    Fixed {
        size: usize,
        namespace: Option<String>,
        aliases: Vec<String>,
    },
}

impl ToTokens for FieldInfo {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let info = match self {
            FieldInfo::Int32 => quote! { Int32 },
            FieldInfo::Float32 => quote! { Float32 },
            FieldInfo::TimeMicros => quote! { TimeMicros },
            FieldInfo::TimestampMicros => quote! { TimestampMicros },
            FieldInfo::Decimal { precision, scale } => {
                quote! { Decimal { precision: #precision, scale: #scale } }
            }
            FieldInfo::DecimalFixed {
                precision,
                scale,
                size,
            } => quote! { DecimalFixed { precision: #precision, scale: #scale, size: #size } },
            FieldInfo::Fixed {
                size,
                namespace,
                aliases,
            } => {
                let namespace = preserve_optional(namespace.as_ref());
                quote! {
                    Fixed {
                        size: #size,
                        namespace: #namespace,
                        aliases: vec![#(#aliases.to_string()),*],
                    }
                }
            }
        };
        tokens.extend(quote! { ::apache_avro_model::FieldInfo::#info });
    }
}

pub struct FieldOptions {
    pub rename: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub inner_name: Option<String>,
    pub exclude_default: bool,
    pub default: FieldDefault,
    pub default_factory: Option<Expr>,
    pub info: Option<FieldInfo>,
    /// Extra field keys, the `meta(..)` entries followed by the `meta_json` ones.
    pub meta: Vec<(String, serde_json::Value)>,
    pub skip: bool,
}

impl FieldOptions {
    pub fn new(attributes: &[Attribute], span: Span) -> Result<Self, Vec<syn::Error>> {
        let avro = avro::FieldAttributes::from_attributes(attributes).map_err(darling_to_syn)?;

        // Collect errors so user gets all feedback at once
        let mut errors = Vec::new();

        let mut infos = Vec::new();
        if let Some(decimal) = avro.decimal {
            infos.push(match decimal.size {
                Some(size) => FieldInfo::DecimalFixed {
                    precision: decimal.precision,
                    scale: decimal.scale,
                    size,
                },
                None => FieldInfo::Decimal {
                    precision: decimal.precision,
                    scale: decimal.scale,
                },
            });
        }
        if let Some(fixed) = avro.fixed {
            infos.push(FieldInfo::Fixed {
                size: fixed.size,
                namespace: fixed.namespace,
                aliases: fixed.alias,
            });
        }
        for (set, info) in [
            (avro.int32, FieldInfo::Int32),
            (avro.float32, FieldInfo::Float32),
            (avro.time_micros, FieldInfo::TimeMicros),
            (avro.timestamp_micros, FieldInfo::TimestampMicros),
        ] {
            if set {
                infos.push(info);
            }
        }
        if infos.len() > 1 {
            errors.push(syn::Error::new(
                span,
                "Only one of `decimal`, `fixed`, `int32`, `float32`, `time_micros` and `timestamp_micros` can be used on a field",
            ));
        }

        if avro.default != FieldDefault::Disabled && avro.default_factory.is_some() {
            errors.push(syn::Error::new(
                span,
                "`#[avro(default)]` and `#[avro(default_factory = ..)]` cannot be used together",
            ));
        }
        let mut meta = avro.meta.0;
        if let Some(meta_json) = &avro.meta_json {
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(meta_json) {
                Ok(entries) => meta.extend(entries),
                Err(e) => errors.push(syn::Error::new(
                    span,
                    format!("`#[avro(meta_json = \"..\")]` must be a JSON object: {e}"),
                )),
            }
        }
        if avro.skip
            && (avro.rename.is_some()
                || avro.default != FieldDefault::Disabled
                || avro.default_factory.is_some()
                || !infos.is_empty())
        {
            errors.push(syn::Error::new(
                span,
                "`#[avro(skip)]` is incompatible with all other attributes",
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        if avro.exclude_default
            && avro.default == FieldDefault::Disabled
            && avro.default_factory.is_none()
        {
            warn(
                span,
                "`exclude_default` has no effect on a field without a default",
                "Add `#[avro(default = ..)]` or remove `exclude_default`",
            );
        }

        let doc = avro.doc.or_else(|| extract_rustdoc(attributes));

        Ok(Self {
            rename: avro.rename,
            doc,
            aliases: avro.alias,
            inner_name: avro.inner_name,
            exclude_default: avro.exclude_default,
            default: avro.default,
            default_factory: avro.default_factory,
            info: infos.pop(),
            meta,
            skip: avro.skip,
        })
    }
}

/// The name of an identifier without the `r#` prefix.
pub fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(raw) => raw.to_string(),
        None => name,
    }
}

pub fn preserve_optional(op: Option<impl ToTokens>) -> TokenStream {
    match op {
        Some(tt) => quote! { ::std::option::Option::Some(#tt.into()) },
        None => quote! { ::std::option::Option::None },
    }
}

fn extract_rustdoc(attributes: &[Attribute]) -> Option<String> {
    let doc = attributes
        .iter()
        .filter(|attr| attr.style == AttrStyle::Outer && attr.path().is_ident("doc"))
        .filter_map(|attr| {
            let name_value = attr.meta.require_name_value();
            match name_value {
                Ok(name_value) => match &name_value.value {
                    syn::Expr::Lit(expr_lit) => match expr_lit.lit {
                        syn::Lit::Str(ref lit_str) => Some(lit_str.value().trim().to_string()),
                        _ => None,
                    },
                    _ => None,
                },
                Err(_) => None,
            }
        })
        .collect::<Vec<String>>()
        .join("\n");
    if doc.is_empty() { None } else { Some(doc) }
}

fn darling_to_syn(e: darling::Error) -> Vec<syn::Error> {
    let msg = format!("{e}");
    let token_errors = e.write_errors();
    vec![syn::Error::new(token_errors.span(), msg)]
}

#[cfg(nightly)]
/// Emit a compiler warning.
///
/// This is a no-op when the `nightly` feature is not enabled.
fn warn(span: Span, message: &str, help: &str) {
    proc_macro::Diagnostic::spanned(span.unwrap(), proc_macro::Level::Warning, message)
        .help(help)
        .emit()
}

#[cfg(not(nightly))]
/// Emit a compiler warning.
///
/// This is a no-op when the `nightly` feature is not enabled.
fn warn(_span: Span, _message: &str, _help: &str) {}
