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
use crate::enums::EnumImpl;
use proc_macro2::Span;
use quote::quote;
use syn::{DataEnum, Fields, spanned::Spanned};

/// A union of the variant payloads, in declaration order. A unit variant is the `null` member.
///
/// Decoding picks the first variant whose payload type accepts the value.
pub fn avro_type_def(
    container_attrs: &NamedTypeOptions,
    data_enum: DataEnum,
    ident_span: Span,
) -> Result<EnumImpl, Vec<syn::Error>> {
    let name = &container_attrs.name;
    let mut have_null = false;
    let mut members = Vec::with_capacity(data_enum.variants.len());
    let mut to_datum_arms = Vec::with_capacity(data_enum.variants.len());
    let mut from_datum_tries = Vec::with_capacity(data_enum.variants.len());
    for variant in &data_enum.variants {
        let ident = &variant.ident;
        match &variant.fields {
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                let ty = &unnamed.unnamed[0].ty;
                members.push(quote! { <#ty as ::apache_avro_model::AvroType>::annotation() });
                to_datum_arms.push(quote! {
                    Self::#ident(value) => ::apache_avro_model::AvroType::to_datum(value)
                });
                from_datum_tries.push(quote! {
                    if let ::std::result::Result::Ok(value) = <#ty as ::apache_avro_model::AvroType>::from_datum(datum.clone()) {
                        return ::std::result::Result::Ok(Self::#ident(value));
                    }
                });
            }
            Fields::Unit => {
                if have_null {
                    return Err(vec![syn::Error::new(
                        ident_span,
                        "More than one variant maps to null, this is not supported for bare unions",
                    )]);
                }
                have_null = true;
                members.push(quote! { ::apache_avro_model::TypeAnnotation::Null });
                to_datum_arms.push(quote! { Self::#ident => ::apache_avro_model::Datum::Null });
                from_datum_tries.push(quote! {
                    if datum.is_null() {
                        return ::std::result::Result::Ok(Self::#ident);
                    }
                });
            }
            fields => {
                return Err(vec![syn::Error::new(
                    fields.span(),
                    "AvroModel: union variants must be unit variants or hold exactly one unnamed value",
                )]);
            }
        }
    }

    Ok(EnumImpl {
        annotation: quote! {
            ::apache_avro_model::TypeAnnotation::Union(vec![#(#members),*])
        },
        to_datum: quote! {
            match self {
                #(#to_datum_arms,)*
            }
        },
        from_datum: quote! {
            #(#from_datum_tries)*
            ::std::result::Result::Err(::apache_avro_model::__private::unexpected(#name, &datum))
        },
    })
}
