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

use crate::attributes::{NamedTypeOptions, preserve_optional};
use crate::enums::{EnumImpl, default_enum_variant, variant_names};
use proc_macro2::Span;
use quote::quote;
use syn::DataEnum;

pub fn avro_type_def(
    container_attrs: &NamedTypeOptions,
    data_enum: DataEnum,
    ident_span: Span,
) -> Result<EnumImpl, Vec<syn::Error>> {
    let variants = variant_names(&data_enum)?;
    let default = default_enum_variant(&data_enum, ident_span)?.map(|index| &variants[index].1);
    let default = preserve_optional(default);
    let doc = preserve_optional(container_attrs.doc.as_ref());
    let namespace = preserve_optional(container_attrs.namespace.as_ref());
    let aliases = &container_attrs.aliases;
    let name = &container_attrs.name;
    let (idents, symbols): (Vec<_>, Vec<_>) = variants.into_iter().unzip();

    Ok(EnumImpl {
        annotation: quote! {
            ::apache_avro_model::TypeAnnotation::Enum(::apache_avro_model::EnumDecl {
                name: #name.to_string(),
                namespace: #namespace,
                aliases: vec![#(#aliases.to_string()),*],
                doc: #doc,
                symbols: vec![#(#symbols.to_string()),*],
                default: #default,
            })
        },
        to_datum: quote! {
            let symbol = match self {
                #(Self::#idents => #symbols,)*
            };
            ::apache_avro_model::Datum::Enum(symbol.to_string())
        },
        from_datum: quote! {
            if let ::apache_avro_model::Datum::Enum(symbol) | ::apache_avro_model::Datum::String(symbol) = &datum {
                match symbol.as_str() {
                    #(#symbols => return ::std::result::Result::Ok(Self::#idents),)*
                    _ => {}
                }
            }
            ::std::result::Result::Err(::apache_avro_model::__private::unexpected(#name, &datum))
        },
    })
}
