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

#![cfg_attr(nightly, feature(proc_macro_diagnostic))]

//! This crate is the implementation of the `AvroModel` derive macro.
//! Please use it via the [`apache-avro-model`](https://crates.io/crates/apache-avro-model) crate:
//!
//! ```no_run
//! use apache_avro_model::AvroModel;
//!
//! #[derive(AvroModel)]
//! struct User {
//!     name: String,
//!     #[avro(default = 18)]
//!     age: i64,
//! }
//! ```

mod attributes;
mod enums;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    DataStruct, DeriveInput, Expr, ExprLit, ExprPath, Fields, Generics, Ident, Lit, Type,
    parse_macro_input, parse_quote, spanned::Spanned,
};

use crate::attributes::{FieldDefault, FieldOptions, NamedTypeOptions, preserve_optional, unraw};

#[proc_macro_derive(AvroModel, attributes(avro))]
// Templated from Serde
pub fn proc_macro_derive_avro_model(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_avro_model(input)
        .unwrap_or_else(to_compile_errors)
        .into()
}

fn derive_avro_model(input: DeriveInput) -> Result<TokenStream, Vec<syn::Error>> {
    // Reject unions before looking at the attributes, so a user doesn't fix attribute errors first.
    let input_span = input.span();
    match input.data {
        syn::Data::Struct(data_struct) => {
            let named_type_options = NamedTypeOptions::new(&input.ident, &input.attrs, input_span)?;
            if named_type_options.literal {
                return Err(vec![syn::Error::new(
                    input_span,
                    "AvroModel: `#[avro(literal)]` is only supported on enums",
                )]);
            }
            let fields = get_struct_fields(data_struct, &named_type_options, input.ident.span())?;
            Ok(create_record_definition(
                &input.ident,
                &input.generics,
                &named_type_options,
                &fields,
            ))
        }
        syn::Data::Enum(data_enum) => {
            let named_type_options = NamedTypeOptions::new(&input.ident, &input.attrs, input_span)?;
            let enum_impl =
                enums::get_data_enum_def(&named_type_options, data_enum, input.ident.span())?;
            Ok(create_trait_definition(
                &input.ident,
                &input.generics,
                enum_impl,
            ))
        }
        syn::Data::Union(_) => Err(vec![syn::Error::new(
            input_span,
            "AvroModel: derive only works for structs and enums",
        )]),
    }
}

/// A named field of a struct with its options.
struct StructField {
    ident: Ident,
    /// The name of the field in the schema.
    name: String,
    ty: Type,
    options: FieldOptions,
}

fn get_struct_fields(
    data_struct: DataStruct,
    container_attrs: &NamedTypeOptions,
    ident_span: Span,
) -> Result<Vec<StructField>, Vec<syn::Error>> {
    let named = match data_struct.fields {
        Fields::Named(named) => named.named,
        Fields::Unnamed(_) => {
            return Err(vec![syn::Error::new(
                ident_span,
                "AvroModel derive does not work for tuple structs",
            )]);
        }
        Fields::Unit => {
            return Err(vec![syn::Error::new(
                ident_span,
                "AvroModel derive does not work for unit structs",
            )]);
        }
    };

    let mut fields = Vec::with_capacity(named.len());
    let mut errors = Vec::new();
    for field in named {
        let span = field.span();
        let Some(ident) = field.ident else {
            errors.push(syn::Error::new(span, "Field must have a name"));
            continue;
        };
        match FieldOptions::new(&field.attrs, span) {
            Ok(options) => fields.push(StructField {
                name: options.rename.clone().unwrap_or_else(|| unraw(&ident)),
                ident,
                ty: field.ty,
                options,
            }),
            Err(e) => errors.extend(e),
        }
    }

    // `field_order` and `exclude` name struct fields, the schema uses the renamed fields.
    for ident in container_attrs
        .field_order
        .iter()
        .chain(&container_attrs.exclude)
    {
        if !fields.iter().any(|f| !f.options.skip && &f.ident == ident) {
            errors.push(syn::Error::new(
                ident.span(),
                format!("AvroModel: unknown field `{ident}`"),
            ));
        }
    }
    for ident in &container_attrs.exclude {
        if let Some(field) = fields.iter().find(|f| &f.ident == ident) {
            if field.options.default == FieldDefault::Disabled
                && field.options.default_factory.is_none()
            {
                errors.push(syn::Error::new(
                    ident.span(),
                    format!("AvroModel: excluded field `{ident}` needs a default"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

/// Add the `AvroType` bound to every type parameter
fn add_bounds(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(parse_quote!(::apache_avro_model::AvroType));
        param.bounds.push(parse_quote!('static));
    }
    generics
}

/// Generate the `AvroType` implementation of an enum
fn create_trait_definition(
    ident: &Ident,
    generics: &Generics,
    enum_impl: enums::EnumImpl,
) -> TokenStream {
    let generics = add_bounds(generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let enums::EnumImpl {
        annotation,
        to_datum,
        from_datum,
    } = enum_impl;
    quote! {
        #[automatically_derived]
        impl #impl_generics ::apache_avro_model::AvroType for #ident #ty_generics #where_clause {
            fn annotation() -> ::apache_avro_model::TypeAnnotation {
                #annotation
            }

            fn to_datum(&self) -> ::apache_avro_model::Datum {
                #to_datum
            }

            fn from_datum(datum: ::apache_avro_model::Datum) -> ::apache_avro_model::AvroResult<Self> {
                #from_datum
            }
        }
    }
}

/// Generate the `AvroType` and `AvroRecord` implementations of a struct
fn create_record_definition(
    ident: &Ident,
    generics: &Generics,
    container_attrs: &NamedTypeOptions,
    fields: &[StructField],
) -> TokenStream {
    let generics = add_bounds(generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let name = &container_attrs.name;

    let (kept, skipped): (Vec<&StructField>, Vec<&StructField>) =
        fields.iter().partition(|f| !f.options.skip);
    let kept_idents = kept.iter().map(|f| &f.ident).collect::<Vec<_>>();
    let kept_names = kept.iter().map(|f| &f.name).collect::<Vec<_>>();
    let skipped_idents = skipped.iter().map(|f| &f.ident);
    let field_decls = kept.iter().map(|f| field_decl(f));

    let record_meta = record_meta(container_attrs, fields);

    quote! {
        #[automatically_derived]
        impl #impl_generics ::apache_avro_model::AvroType for #ident #ty_generics #where_clause {
            fn annotation() -> ::apache_avro_model::TypeAnnotation {
                ::apache_avro_model::TypeAnnotation::Record(::apache_avro_model::RecordRef::of::<Self>())
            }

            fn to_datum(&self) -> ::apache_avro_model::Datum {
                let mut record = ::apache_avro_model::RecordDatum::of::<Self>(#name);
                #(record.push(#kept_names, ::apache_avro_model::AvroType::to_datum(&self.#kept_idents));)*
                ::apache_avro_model::Datum::Record(record)
            }

            fn from_datum(datum: ::apache_avro_model::Datum) -> ::apache_avro_model::AvroResult<Self> {
                let mut record = ::apache_avro_model::RecordDatum::try_from_datum(datum, #name)?;
                if record.type_id.is_some() && !record.is_of::<Self>() {
                    return ::std::result::Result::Err(::apache_avro_model::__private::unexpected(
                        #name,
                        &::apache_avro_model::Datum::Record(record),
                    ));
                }
                ::std::result::Result::Ok(Self {
                    #(#kept_idents: record.take_field(#kept_names)?,)*
                    #(#skipped_idents: ::std::default::Default::default(),)*
                })
            }
        }

        #[automatically_derived]
        impl #impl_generics ::apache_avro_model::AvroRecord for #ident #ty_generics #where_clause {
            fn record_decl() -> ::apache_avro_model::RecordDecl {
                ::apache_avro_model::RecordDecl {
                    name: #name.to_string(),
                    meta: #record_meta,
                    fields: vec![#(#field_decls),*],
                }
            }
        }
    }
}

fn record_meta(container_attrs: &NamedTypeOptions, fields: &[StructField]) -> TokenStream {
    let schema_name = preserve_optional(container_attrs.renamed.then_some(&container_attrs.name));
    let namespace = preserve_optional(container_attrs.namespace.as_ref());
    let doc = preserve_optional(container_attrs.doc.as_ref());
    let aliases = &container_attrs.aliases;
    let schema_names = |idents: &[Ident]| {
        idents
            .iter()
            .filter_map(|ident| fields.iter().find(|f| &f.ident == ident))
            .map(|f| f.name.clone())
            .collect::<Vec<_>>()
    };
    let field_order = schema_names(&container_attrs.field_order);
    let exclude = schema_names(&container_attrs.exclude);
    let (nested_fields, nested_names): (Vec<_>, Vec<_>) =
        container_attrs.alias_nested_items.iter().cloned().unzip();
    let convert_literal_to_enum = container_attrs.convert_literal_to_enum;
    let strict_unions = container_attrs.strict_unions;
    let type_hooks = &container_attrs.type_hooks;
    let custom_encoders = &container_attrs.custom_encoders;

    quote! {
        ::apache_avro_model::RecordMeta {
            schema_name: #schema_name,
            namespace: #namespace,
            aliases: vec![#(#aliases.to_string()),*],
            doc: #doc,
            field_order: vec![#(#field_order.to_string()),*],
            exclude: vec![#(#exclude.to_string()),*],
            alias_nested_items: ::std::collections::BTreeMap::from([
                #((#nested_fields.to_string(), #nested_names.to_string())),*
            ]),
            convert_literal_to_enum: #convert_literal_to_enum,
            decode: ::apache_avro_model::DecodeConfig {
                strict_unions: #strict_unions,
                type_hooks: vec![#((#type_hooks)()),*],
            },
            custom_encoders: vec![#((#custom_encoders)()),*],
        }
    }
}

fn field_decl(field: &StructField) -> TokenStream {
    let StructField {
        name, ty, options, ..
    } = field;
    let info = options.info.iter();
    let default = match &options.default {
        FieldDefault::Disabled => quote! { ::std::option::Option::None },
        FieldDefault::Trait => quote! {
            ::std::option::Option::Some(::apache_avro_model::AvroType::to_datum(
                &<#ty as ::std::default::Default>::default(),
            ))
        },
        FieldDefault::Expr(expr) => {
            let datum = default_expr_to_datum(expr, ty);
            quote! { ::std::option::Option::Some(#datum) }
        }
    };
    let default_factory = match &options.default_factory {
        Some(factory) => quote! {
            ::std::option::Option::Some(
                (|| {
                    let value: #ty = (#factory)();
                    ::apache_avro_model::AvroType::to_datum(&value)
                }) as fn() -> ::apache_avro_model::Datum
            )
        },
        None => quote! { ::std::option::Option::None },
    };
    let meta = field_meta(options);
    quote! {
        ::apache_avro_model::FieldDecl {
            name: #name.to_string(),
            annotation: <#ty as ::apache_avro_model::AvroType>::annotation()#(.annotated(#info))*,
            default: #default,
            default_factory: #default_factory,
            meta: #meta,
        }
    }
}

/// Literals are taken as the Avro value they spell, anything else goes through the field type.
fn default_expr_to_datum(expr: &Expr, ty: &Type) -> TokenStream {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Str(s) => return quote! { ::apache_avro_model::Datum::String(#s.to_string()) },
            Lit::Int(i) => return quote! { ::apache_avro_model::Datum::Long(#i as i64) },
            Lit::Float(f) => return quote! { ::apache_avro_model::Datum::Double(#f as f64) },
            Lit::Bool(b) => return quote! { ::apache_avro_model::Datum::Boolean(#b) },
            _ => {}
        },
        Expr::Path(ExprPath { path, .. }) if path.is_ident("None") => {
            return quote! { ::apache_avro_model::Datum::Null };
        }
        _ => {}
    }
    quote! {
        {
            let value: #ty = #expr;
            ::apache_avro_model::AvroType::to_datum(&value)
        }
    }
}

fn field_meta(options: &FieldOptions) -> TokenStream {
    let mut meta = quote! { ::apache_avro_model::FieldMeta::new() };
    for alias in &options.aliases {
        meta.extend(quote! { .with_alias(#alias) });
    }
    if let Some(doc) = &options.doc {
        meta.extend(quote! { .with_doc(#doc) });
    }
    if let Some(inner_name) = &options.inner_name {
        meta.extend(quote! { .with_inner_name(#inner_name) });
    }
    if options.exclude_default {
        meta.extend(quote! { .with_exclude_default(true) });
    }
    for (key, value) in &options.meta {
        let value = json_tokens(value);
        meta.extend(quote! { .with_entry(#key, #value) });
    }
    meta
}

/// Rebuilds a JSON value checked at compile time in the generated code.
fn json_tokens(value: &serde_json::Value) -> TokenStream {
    use serde_json::Value;
    match value {
        Value::Null => quote! { ::apache_avro_model::__private::JsonValue::Null },
        Value::Bool(b) => quote! { ::apache_avro_model::__private::JsonValue::Bool(#b) },
        Value::Number(number) => {
            let number = if let Some(i) = number.as_i64() {
                quote! { #i }
            } else if let Some(u) = number.as_u64() {
                quote! { #u }
            } else {
                let f = number.as_f64().unwrap_or_default();
                quote! { #f }
            };
            quote! { ::apache_avro_model::__private::JsonValue::from(#number) }
        }
        Value::String(s) => {
            quote! { ::apache_avro_model::__private::JsonValue::String(#s.to_string()) }
        }
        Value::Array(items) => {
            let items = items.iter().map(json_tokens);
            quote! { ::apache_avro_model::__private::JsonValue::Array(vec![#(#items),*]) }
        }
        Value::Object(entries) => {
            let keys = entries.keys();
            let values = entries.values().map(json_tokens);
            quote! {
                ::apache_avro_model::__private::JsonValue::Object({
                    let mut entries = ::apache_avro_model::__private::JsonMap::new();
                    #(entries.insert(#keys.to_string(), #values);)*
                    entries
                })
            }
        }
    }
}

/// Stolen from serde
fn to_compile_errors(errors: Vec<syn::Error>) -> proc_macro2::TokenStream {
    let compile_errors = errors.iter().map(syn::Error::to_compile_error);
    quote!(#(#compile_errors)*)
}
