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

mod bare_union;
mod literal;
mod plain;

use crate::attributes::{NamedTypeOptions, VariantOptions, unraw};
use proc_macro2::{Ident, Span, TokenStream};
use syn::{Attribute, DataEnum, Fields, Meta};

/// The bodies of the `AvroType` methods of an enum.
pub struct EnumImpl {
    pub annotation: TokenStream,
    pub to_datum: TokenStream,
    pub from_datum: TokenStream,
}

/// Generate the `AvroType` implementation of an enum.
///
/// Unit enums become Avro enums, or literal types with `#[avro(literal)]`. Enums whose variants
/// hold a single value become unions of those values.
pub fn get_data_enum_def(
    container_attrs: &NamedTypeOptions,
    data_enum: DataEnum,
    ident_span: Span,
) -> Result<EnumImpl, Vec<syn::Error>> {
    container_attrs.reject_record_attributes(ident_span)?;
    if data_enum.variants.is_empty() {
        return Err(vec![syn::Error::new(
            ident_span,
            "AvroModel: derive does not work for enums without variants",
        )]);
    }
    let all_unit = data_enum.variants.iter().all(|v| Fields::Unit == v.fields);
    if container_attrs.literal {
        if !all_unit {
            return Err(vec![syn::Error::new(
                ident_span,
                "AvroModel: `#[avro(literal)]` only works for enums with unit variants",
            )]);
        }
        reject_name_attributes(container_attrs, ident_span)?;
        literal::avro_type_def(container_attrs, data_enum, ident_span)
    } else if all_unit {
        plain::avro_type_def(container_attrs, data_enum, ident_span)
    } else {
        reject_name_attributes(container_attrs, ident_span)?;
        bare_union::avro_type_def(container_attrs, data_enum, ident_span)
    }
}

/// Literal types and unions have no name in the schema.
fn reject_name_attributes(
    container_attrs: &NamedTypeOptions,
    ident_span: Span,
) -> Result<(), Vec<syn::Error>> {
    if container_attrs.renamed
        || container_attrs.namespace.is_some()
        || !container_attrs.aliases.is_empty()
    {
        return Err(vec![syn::Error::new(
            ident_span,
            "AvroModel: `name`, `namespace` and `alias` only work for enums with an Avro name",
        )]);
    }
    Ok(())
}

/// The identifiers of the variants and their names in the schema.
fn variant_names(data_enum: &DataEnum) -> Result<Vec<(Ident, String)>, Vec<syn::Error>> {
    data_enum
        .variants
        .iter()
        .map(|variant| {
            let variant_attrs = VariantOptions::new(&variant.attrs)?;
            let name = variant_attrs
                .rename
                .unwrap_or_else(|| unraw(&variant.ident));
            Ok((variant.ident.clone(), name))
        })
        .collect()
}

/// The position of the variant marked `#[default]`.
fn default_enum_variant(
    data_enum: &DataEnum,
    error_span: Span,
) -> Result<Option<usize>, Vec<syn::Error>> {
    match data_enum
        .variants
        .iter()
        .enumerate()
        .filter(|(_, v)| v.attrs.iter().any(is_default_attr))
        .collect::<Vec<_>>()
    {
        variants if variants.is_empty() => Ok(None),
        single if single.len() == 1 => Ok(Some(single[0].0)),
        multiple => Err(vec![syn::Error::new(
            error_span,
            format!(
                "Multiple defaults defined: {:?}",
                multiple
                    .iter()
                    .map(|(_, v)| v.ident.to_string())
                    .collect::<Vec<String>>()
            ),
        )]),
    }
}

fn is_default_attr(attr: &Attribute) -> bool {
    matches!(attr, Attribute { meta: Meta::Path(path), .. } if path.get_ident().map(Ident::to_string).as_deref() == Some("default"))
}
