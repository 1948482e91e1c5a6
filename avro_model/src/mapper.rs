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

//! Resolves declared fields into [`FieldDescriptor`]s.
//!
//! Each type annotation goes through the following rules, the first that applies wins:
//!
//! 1. an annotated type is unwrapped and its field info refines the inner type,
//! 2. `None` resolves to `null`,
//! 3. primitives become [`TypeDescriptor::Immutable`],
//! 4. a record already being described in the current chain becomes a [`TypeDescriptor::SelfRef`],
//! 5. decimals and fixed types take their parameters from the field info,
//! 6. logical kinds become [`TypeDescriptor::Logical`],
//! 7. arrays, maps, unions and literals recurse into their members,
//! 8. enums are validated and kept,
//! 9. other records are described (once) and referenced,
//! 10. opaque types are re-dispatched as the type of their custom encoder, or rejected.

use crate::{
    AvroRecord, AvroResult, CustomEncoder, Datum, EnumDecl, FieldDecl, FieldInfo, Literal,
    RecordMeta, RecordRef, TypeAnnotation,
    decimal::max_precision_for_fixed,
    descriptor::{
        DecimalSpec, Descriptors, ExcludedField, FieldDescriptor, FixedSpec, LiteralForm,
        RecordDescriptor, TypeDescriptor, select_member,
    },
    error::{Details, Error},
    types::{LogicalType, Primitive},
    validator::{
        validate_enum_symbols, validate_namespace, validate_record_field_name,
        validate_schema_name,
    },
};
use log::{debug, trace};
use std::{any::TypeId, collections::HashMap};

/// Describes `T` and every record reachable from it.
pub fn describe<T: AvroRecord>() -> AvroResult<Descriptors> {
    describe_ref(RecordRef::of::<T>())
}

pub fn describe_ref(root: RecordRef) -> AvroResult<Descriptors> {
    let mut mapper = Mapper::default();
    mapper.describe_record(root)?;
    Ok(Descriptors {
        root: root.type_id,
        records: mapper.records,
    })
}

/// What the rules need to know about the field being resolved.
struct FieldContext<'a> {
    path: String,
    field_name: &'a str,
    inner_name: Option<&'a str>,
    convert_literal_to_enum: bool,
}

impl FieldContext<'_> {
    /// The name of a named type synthesized for the field.
    fn synthesized_name(&self) -> String {
        self.inner_name.unwrap_or(self.field_name).to_string()
    }
}

#[derive(Default)]
struct Mapper {
    records: HashMap<TypeId, RecordDescriptor>,
    chain: Vec<RecordRef>,
    encoders: Vec<CustomEncoder>,
}

impl Mapper {
    fn describe_record(&mut self, record: RecordRef) -> AvroResult<()> {
        if self.records.contains_key(&record.type_id) || self.chain.contains(&record) {
            return Ok(());
        }
        let decl = record.decl();
        let name = decl.meta.schema_name.clone().unwrap_or(decl.name.clone());
        validate_schema_name(&name, &name)?;
        if let Some(namespace) = &decl.meta.namespace {
            validate_namespace(namespace, &name)?;
        }
        trace!("Describing record {name} ({})", record.type_name);

        self.chain.push(record);
        let inherited = self.encoders.len();
        self.encoders.extend(decl.meta.custom_encoders.iter().cloned());

        let described = self.describe_fields(record, &name, &decl.meta, decl.fields);

        self.encoders.truncate(inherited);
        self.chain.pop();

        let (fields, excluded) = described?;
        self.records.insert(
            record.type_id,
            RecordDescriptor {
                record,
                name,
                meta: decl.meta,
                fields,
                excluded,
            },
        );
        Ok(())
    }

    fn describe_fields(
        &mut self,
        record: RecordRef,
        record_name: &str,
        meta: &RecordMeta,
        declared: Vec<FieldDecl>,
    ) -> AvroResult<(Vec<FieldDescriptor>, Vec<ExcludedField>)> {
        let mut fields = Vec::with_capacity(declared.len());
        let mut excluded = Vec::new();

        for field in declared {
            let path = format!("{record_name}.{}", field.name);
            if meta.is_excluded(&field.name) {
                if !field.has_default() {
                    return Err(Error::InvalidDefault(
                        path,
                        "an excluded field needs a default",
                    ));
                }
                excluded.push(ExcludedField {
                    name: field.name,
                    default: field.default,
                    default_factory: field.default_factory,
                });
                continue;
            }
            validate_record_field_name(&field.name, &path)?;

            let ctx = FieldContext {
                path: path.clone(),
                field_name: &field.name,
                inner_name: field.meta.inner_name(),
                convert_literal_to_enum: meta.convert_literal_to_enum,
            };
            let ty = self.resolve(&field.annotation, &[], &ctx)?;
            let ty = order_union(ty, &field, &path);

            fields.push(FieldDescriptor {
                inner_name: field.meta.inner_name().map(str::to_string),
                metadata: field.meta.splice(),
                exclude_default: field.meta.exclude_default(),
                default: field.default,
                default_factory: field.default_factory,
                parent: record,
                ty,
                name: field.name,
            });
        }

        if !meta.field_order.is_empty() {
            let mut ordered = Vec::with_capacity(fields.len());
            for name in &meta.field_order {
                match fields.iter().position(|f| f.name == *name) {
                    Some(position) => ordered.push(fields.remove(position)),
                    None => debug!("Ignoring unknown field {name:?} in the field order of {record_name}"),
                }
            }
            ordered.append(&mut fields);
            fields = ordered;
        }

        Ok((fields, excluded))
    }

    /// Applies the rules to `annotation`. `infos` holds the field info found while unwrapping,
    /// outermost first.
    fn resolve(
        &mut self,
        annotation: &TypeAnnotation,
        infos: &[FieldInfo],
        ctx: &FieldContext<'_>,
    ) -> AvroResult<TypeDescriptor> {
        match annotation {
            TypeAnnotation::Annotated { inner, info } => {
                let mut infos = infos.to_vec();
                infos.push(info.clone());
                self.resolve(inner, &infos, ctx)
            }
            TypeAnnotation::Null => Ok(TypeDescriptor::Immutable(Primitive::Null)),
            TypeAnnotation::Primitive(primitive) => {
                let primitive = match (primitive, infos.first()) {
                    (p, None) => *p,
                    (Primitive::Int | Primitive::Long, Some(FieldInfo::Int32)) => Primitive::Int,
                    (Primitive::Float | Primitive::Double, Some(FieldInfo::Float32)) => {
                        Primitive::Float
                    }
                    (_, Some(info)) => return Err(mismatch(info, annotation, ctx)),
                };
                Ok(TypeDescriptor::Immutable(primitive))
            }
            TypeAnnotation::Record(record) if self.chain.contains(record) => {
                trace!("{} refers back to {}", ctx.path, record.type_name);
                Ok(TypeDescriptor::SelfRef(*record))
            }
            TypeAnnotation::Decimal => self.resolve_decimal(infos, ctx),
            TypeAnnotation::Fixed => {
                let spec = resolve_fixed(infos, ctx)?;
                Ok(TypeDescriptor::Fixed(spec))
            }
            TypeAnnotation::Logical(logical) => {
                let logical = match (logical, infos.first()) {
                    (l, None) => *l,
                    (
                        LogicalType::TimeMillis | LogicalType::TimeMicros,
                        Some(FieldInfo::TimeMicros),
                    ) => LogicalType::TimeMicros,
                    (
                        LogicalType::TimestampMillis | LogicalType::TimestampMicros,
                        Some(FieldInfo::TimestampMicros),
                    ) => LogicalType::TimestampMicros,
                    (_, Some(info)) => return Err(mismatch(info, annotation, ctx)),
                };
                Ok(TypeDescriptor::Logical(logical))
            }
            TypeAnnotation::Array(items) => Ok(TypeDescriptor::Array(Box::new(
                self.resolve(items, infos, ctx)?,
            ))),
            TypeAnnotation::Map { key, value } => {
                let key_type = self.resolve(key, &[], ctx)?;
                if key_type != TypeDescriptor::Immutable(Primitive::String) {
                    return Err(Details::InvalidMap {
                        path: ctx.path.clone(),
                        key: key.to_string(),
                    }
                    .into());
                }
                Ok(TypeDescriptor::Map(Box::new(self.resolve(value, infos, ctx)?)))
            }
            TypeAnnotation::Union(members) => {
                let mut resolved = Vec::with_capacity(members.len());
                for member in members {
                    match self.resolve(member, infos, ctx)? {
                        TypeDescriptor::Union(nested) => resolved.extend(nested),
                        other => resolved.push(other),
                    }
                }
                let mut unique: Vec<TypeDescriptor> = Vec::with_capacity(resolved.len());
                for member in resolved {
                    if !unique.contains(&member) {
                        unique.push(member);
                    }
                }
                Ok(match unique.len() {
                    1 => unique.remove(0),
                    _ => TypeDescriptor::Union(unique),
                })
            }
            TypeAnnotation::Literal(values) => resolve_literal(values, ctx),
            TypeAnnotation::Enum(decl) => {
                validate_enum(decl, &ctx.path)?;
                Ok(TypeDescriptor::Enum(decl.clone()))
            }
            TypeAnnotation::Record(record) => {
                if let Some(info) = infos.first() {
                    return Err(mismatch(info, annotation, ctx));
                }
                self.describe_record(*record)?;
                Ok(TypeDescriptor::Record(*record))
            }
            TypeAnnotation::Opaque { type_name } => {
                let encoder = self
                    .encoders
                    .iter()
                    .rev()
                    .find(|encoder| encoder.type_name == *type_name)
                    .cloned();
                match encoder {
                    Some(encoder) => {
                        debug!("{} is written through a custom encoder for {type_name}", ctx.path);
                        let encoded = self.resolve(&encoder.encoded_as, infos, ctx)?;
                        Ok(TypeDescriptor::Custom {
                            type_name: *type_name,
                            encoded: Box::new(encoded),
                        })
                    }
                    None => Err(Error::UnknownType(ctx.path.clone(), *type_name)),
                }
            }
        }
    }

    fn resolve_decimal(
        &mut self,
        infos: &[FieldInfo],
        ctx: &FieldContext<'_>,
    ) -> AvroResult<TypeDescriptor> {
        let (precision, scale, fixed) = match infos.first() {
            Some(FieldInfo::Decimal { precision, scale }) => (*precision, *scale, None),
            Some(FieldInfo::DecimalFixed {
                precision,
                scale,
                size,
            }) => {
                let fixed = FixedSpec {
                    name: ctx.synthesized_name(),
                    size: *size,
                    namespace: None,
                    aliases: Vec::new(),
                };
                (*precision, *scale, Some(fixed))
            }
            Some(info) => return Err(mismatch(info, &TypeAnnotation::Decimal, ctx)),
            None => {
                return Err(Details::MissingFieldInfo {
                    path: ctx.path.clone(),
                    type_name: "decimal".to_string(),
                    required: "decimal(precision, scale)",
                }
                .into());
            }
        };
        let invalid = || {
            Error::from(Details::InvalidDecimal {
                path: ctx.path.clone(),
                precision,
                scale,
            })
        };
        if precision == 0 || scale > precision {
            return Err(invalid());
        }
        if let Some(fixed) = &fixed {
            check_fixed(fixed, ctx)?;
            if precision > max_precision_for_fixed(fixed.size) {
                return Err(invalid());
            }
        }
        Ok(TypeDescriptor::Decimal(DecimalSpec {
            precision,
            scale,
            fixed,
        }))
    }
}

/// Merges the fixed infos, outermost first: the first namespace and non-empty aliases win. All
/// positive sizes have to agree.
fn resolve_fixed(infos: &[FieldInfo], ctx: &FieldContext<'_>) -> AvroResult<FixedSpec> {
    let mut size = None;
    let mut namespace = None;
    let mut aliases = Vec::new();
    let mut found = false;
    for info in infos {
        match info {
            FieldInfo::Fixed {
                size: s,
                namespace: ns,
                aliases: a,
            } => {
                found = true;
                match size {
                    Some(declared) if *s > 0 && *s != declared => {
                        return Err(Details::FixedSizeConflict {
                            path: ctx.path.clone(),
                            declared,
                            size: *s,
                        }
                        .into());
                    }
                    None if *s > 0 => size = Some(*s),
                    _ => {}
                }
                if namespace.is_none() {
                    namespace.clone_from(ns);
                }
                if aliases.is_empty() {
                    aliases.clone_from(a);
                }
            }
            other => return Err(mismatch(other, &TypeAnnotation::Fixed, ctx)),
        }
    }
    if !found {
        return Err(Details::MissingFieldInfo {
            path: ctx.path.clone(),
            type_name: "fixed".to_string(),
            required: "fixed(size)",
        }
        .into());
    }
    let spec = FixedSpec {
        name: ctx.synthesized_name(),
        size: size.unwrap_or(0),
        namespace,
        aliases,
    };
    check_fixed(&spec, ctx)?;
    Ok(spec)
}

fn check_fixed(spec: &FixedSpec, ctx: &FieldContext<'_>) -> AvroResult<()> {
    if spec.size == 0 {
        return Err(Details::InvalidFixed {
            path: ctx.path.clone(),
            size: spec.size,
        }
        .into());
    }
    validate_schema_name(&spec.name, &ctx.path)?;
    if let Some(namespace) = &spec.namespace {
        validate_namespace(namespace, &ctx.path)?;
    }
    Ok(())
}

fn validate_enum(decl: &EnumDecl, path: &str) -> AvroResult<()> {
    validate_schema_name(&decl.name, path)?;
    if let Some(namespace) = &decl.namespace {
        validate_namespace(namespace, path)?;
    }
    validate_enum_symbols(&decl.symbols, path)?;
    if let Some(default) = &decl.default
        && !decl.symbols.contains(default)
    {
        return Err(Error::InvalidDefault(
            path,
            format!("{default:?} is not a symbol of enum {}", decl.name),
        ));
    }
    Ok(())
}

fn resolve_literal(values: &[Literal], ctx: &FieldContext<'_>) -> AvroResult<TypeDescriptor> {
    if values.is_empty() {
        return Err(Error::UnknownType(ctx.path.clone(), "an empty literal"));
    }
    let symbols: Option<Vec<String>> = values
        .iter()
        .map(|value| match value {
            Literal::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();

    let form = match symbols {
        Some(symbols) if ctx.convert_literal_to_enum => {
            let decl = EnumDecl::builder()
                .name(ctx.synthesized_name())
                .symbols(symbols)
                .build();
            validate_enum(&decl, &ctx.path)?;
            LiteralForm::Enum(decl)
        }
        _ => {
            let mut primitives = Vec::new();
            for value in values {
                let primitive = value.primitive();
                if !primitives.contains(&primitive) {
                    primitives.push(primitive);
                }
            }
            LiteralForm::Primitives(primitives)
        }
    };
    Ok(TypeDescriptor::Literal {
        values: values.to_vec(),
        form,
    })
}

fn mismatch(info: &FieldInfo, annotation: &TypeAnnotation, ctx: &FieldContext<'_>) -> Error {
    Details::FieldInfoMismatch {
        path: ctx.path.clone(),
        info: info.to_string(),
        type_name: annotation.to_string(),
    }
    .into()
}

/// Puts the member the default belongs to first. A null default without a factory puts (or
/// adds) `null` first.
fn order_union(ty: TypeDescriptor, field: &FieldDecl, path: &str) -> TypeDescriptor {
    let mut members = match ty {
        TypeDescriptor::Union(members) => members,
        TypeDescriptor::Literal {
            values,
            form: LiteralForm::Primitives(primitives),
        } if primitives.len() > 1 => {
            return TypeDescriptor::Literal {
                values,
                form: LiteralForm::Primitives(order_literal(primitives, field, path)),
            };
        }
        other => return other,
    };
    let null = TypeDescriptor::Immutable(Primitive::Null);
    match (&field.default, field.default_factory) {
        (Some(Datum::Null), None) => {
            members.retain(|m| *m != null);
            members.insert(0, null);
        }
        _ => {
            if let Some(default) = field.default_value()
                && let Some(index) = select_member(&members, &default)
                && index > 0
            {
                trace!("Moving union member {index} of {path} first to match its default");
                let member = members.remove(index);
                members.insert(0, member);
            }
        }
    }
    TypeDescriptor::Union(members)
}

/// Puts the primitive of the default first in a literal spanning several primitives.
fn order_literal(mut primitives: Vec<Primitive>, field: &FieldDecl, path: &str) -> Vec<Primitive> {
    let Some(default) = field.default_value() else {
        return primitives;
    };
    let members = primitives
        .iter()
        .map(|primitive| TypeDescriptor::Immutable(*primitive))
        .collect::<Vec<_>>();
    if let Some(index) = select_member(&members, &default)
        && index > 0
    {
        trace!("Moving literal member {index} of {path} first to match its default");
        let primitive = primitives.remove(index);
        primitives.insert(0, primitive);
    }
    primitives
}
