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

use crate::attributes::NamedTypeOptions;
use crate::enums::{EnumImpl, variant_names};
use proc_macro2::Span;
use quote::quote;
use syn::DataEnum;

/// A literal type: the variant names as strings, or the discriminants as longs when every
/// variant has one.
pub fn avro_type_def(
    container_attrs: &NamedTypeOptions,
    data_enum: DataEnum,
    ident_span: Span,
) -> Result<EnumImpl, Vec<syn::Error>> {
    let with_discriminant = data_enum
        .variants
        .iter()
        .filter(|v| v.discriminant.is_some())
        .count();
    let name = &container_attrs.name;
    let (idents, values): (Vec<_>, Vec<_>) = variant_names(&data_enum)?.into_iter().unzip();

    if with_discriminant == 0 {
        Ok(EnumImpl {
            annotation: quote! {
                ::apache_avro_model::TypeAnnotation::Literal(vec![
                    #(::apache_avro_model::Literal::String(#values.to_string())),*
                ])
            },
            to_datum: quote! {
                let value = match self {
                    #(Self::#idents => #values,)*
                };
                ::apache_avro_model::Datum::String(value.to_string())
            },
            from_datum: quote! {
                if let ::apache_avro_model::Datum::String(value) | ::apache_avro_model::Datum::Enum(value) = &datum {
                    match value.as_str() {
                        #(#values => return ::std::result::Result::Ok(Self::#idents),)*
                        _ => {}
                    }
                }
                ::std::result::Result::Err(::apache_avro_model::__private::unexpected(#name, &datum))
            },
        })
    } else if with_discriminant == idents.len() {
        Ok(EnumImpl {
            annotation: quote! {
                ::apache_avro_model::TypeAnnotation::Literal(vec![
                    #(::apache_avro_model::Literal::Long(Self::#idents as i64)),*
                ])
            },
            to_datum: quote! {
                let value = match self {
                    #(Self::#idents => Self::#idents as i64,)*
                };
                ::apache_avro_model::Datum::Long(value)
            },
            from_datum: quote! {
                let value = match &datum {
                    ::apache_avro_model::Datum::Long(value) => ::std::option::Option::Some(*value),
                    ::apache_avro_model::Datum::Int(value) => ::std::option::Option::Some(i64::from(*value)),
                    _ => ::std::option::Option::None,
                };
                if let ::std::option::Option::Some(value) = value {
                    #(
                        if value == Self::#idents as i64 {
                            return ::std::result::Result::Ok(Self::#idents);
                        }
                    )*
                }
                ::std::result::Result::Err(::apache_avro_model::__private::unexpected(#name, &datum))
            },
        })
    } else {
        Err(vec![syn::Error::new(
            ident_span,
            "AvroModel: a literal enum needs a discriminant on every variant or on none",
        )])
    }
}
