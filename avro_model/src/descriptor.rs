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

//! Field descriptors: the resolved form of a declared field, shared by the renderer, the codec
//! driver and the instance constructor.

use crate::{
    Datum, EnumDecl, Literal, RecordRef,
    logical,
    meta::RecordMeta,
    types::{AvroKind, LogicalType, Primitive},
};
use bigdecimal::BigDecimal;
use serde_json::{Map, Value as JsonValue};
use std::{any::TypeId, collections::HashMap, str::FromStr};
use uuid::Uuid;

/// A named fixed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSpec {
    pub name: String,
    pub size: usize,
    pub namespace: Option<String>,
    pub aliases: Vec<String>,
}

/// A decimal, backed by `bytes` or by a fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: u32,
    pub fixed: Option<FixedSpec>,
}

/// What a literal type is written as.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralForm {
    /// A synthesized enum of the string values.
    Enum(EnumDecl),
    /// The primitive types of the values, in order of appearance. More than one is a union.
    Primitives(Vec<Primitive>),
}

/// The resolved type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Immutable(Primitive),
    Logical(LogicalType),
    Decimal(DecimalSpec),
    Fixed(FixedSpec),
    Array(Box<TypeDescriptor>),
    /// The keys are strings.
    Map(Box<TypeDescriptor>),
    /// Members in rendered order.
    Union(Vec<TypeDescriptor>),
    Literal {
        values: Vec<Literal>,
        form: LiteralForm,
    },
    Enum(EnumDecl),
    Record(RecordRef),
    /// A record that is being described higher up in the chain.
    SelfRef(RecordRef),
    /// An opaque type written through a custom encoder.
    Custom {
        type_name: &'static str,
        encoded: Box<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn kind(&self) -> AvroKind {
        match self {
            TypeDescriptor::Immutable(p) => AvroKind::from(*p),
            TypeDescriptor::Logical(l) => AvroKind::from(*l),
            TypeDescriptor::Decimal(_) => AvroKind::Decimal,
            TypeDescriptor::Fixed(_) => AvroKind::Fixed,
            TypeDescriptor::Array(_) => AvroKind::Array,
            TypeDescriptor::Map(_) => AvroKind::Map,
            TypeDescriptor::Union(_) => AvroKind::Union,
            TypeDescriptor::Literal {
                form: LiteralForm::Enum(_),
                ..
            }
            | TypeDescriptor::Enum(_) => AvroKind::Enum,
            TypeDescriptor::Literal {
                form: LiteralForm::Primitives(primitives),
                ..
            } => match primitives.as_slice() {
                [single] => AvroKind::from(*single),
                _ => AvroKind::Union,
            },
            TypeDescriptor::Record(_) | TypeDescriptor::SelfRef(_) => AvroKind::Record,
            TypeDescriptor::Custom { encoded, .. } => encoded.kind(),
        }
    }

    /// Whether `datum` is a value of this type.
    ///
    /// An exact match requires the datum to have the natural representation of the type, a
    /// lenient one also accepts the representations the codec driver can convert, like an ISO
    /// string for a date or a record datum carrying the right field names.
    pub fn matches(&self, datum: &Datum, lenient: bool) -> bool {
        use TypeDescriptor as T;
        match (self, datum) {
            (_, Datum::Opaque(opaque)) => match self {
                T::Custom { type_name, .. } => *type_name == opaque.type_name(),
                T::Union(members) => members.iter().any(|m| m.matches(datum, lenient)),
                _ => false,
            },
            (T::Immutable(Primitive::Null), Datum::Null) => true,
            (T::Immutable(Primitive::Boolean), Datum::Boolean(_)) => true,
            (T::Immutable(Primitive::Int), Datum::Int(_)) => true,
            (T::Immutable(Primitive::Int), Datum::Long(v)) => lenient && i32::try_from(*v).is_ok(),
            (T::Immutable(Primitive::Long), Datum::Long(_)) => true,
            (T::Immutable(Primitive::Long), Datum::Int(_)) => lenient,
            (T::Immutable(Primitive::Float), Datum::Float(_)) => true,
            (T::Immutable(Primitive::Double), Datum::Double(_)) => true,
            (
                T::Immutable(Primitive::Float | Primitive::Double),
                Datum::Float(_) | Datum::Double(_) | Datum::Int(_) | Datum::Long(_),
            ) => lenient,
            (T::Immutable(Primitive::Bytes), Datum::Bytes(_)) => true,
            (T::Immutable(Primitive::Bytes), Datum::String(_) | Datum::Fixed(_)) => lenient,
            (T::Immutable(Primitive::String), Datum::String(_)) => true,
            (T::Immutable(Primitive::String), Datum::Enum(_)) => lenient,
            (T::Logical(LogicalType::Date), Datum::Date(_)) => true,
            (T::Logical(LogicalType::Date), Datum::String(s)) => {
                lenient && logical::parse_date(s).is_some()
            }
            (T::Logical(LogicalType::TimeMillis | LogicalType::TimeMicros), Datum::Time(_)) => {
                true
            }
            (T::Logical(LogicalType::TimeMillis | LogicalType::TimeMicros), Datum::String(s)) => {
                lenient && logical::parse_time(s).is_some()
            }
            (
                T::Logical(LogicalType::TimestampMillis | LogicalType::TimestampMicros),
                Datum::DateTime(_),
            ) => true,
            (
                T::Logical(LogicalType::TimestampMillis | LogicalType::TimestampMicros),
                Datum::String(s),
            ) => lenient && logical::parse_datetime(s).is_some(),
            (T::Logical(LogicalType::Uuid), Datum::Uuid(_)) => true,
            (T::Logical(LogicalType::Uuid), Datum::String(s)) => {
                lenient && Uuid::parse_str(s).is_ok()
            }
            (T::Decimal(_), Datum::Decimal(_)) => true,
            (T::Decimal(_), Datum::Int(_) | Datum::Long(_)) => lenient,
            (T::Decimal(_), Datum::String(s)) => lenient && BigDecimal::from_str(s).is_ok(),
            (T::Fixed(spec), Datum::Fixed(bytes)) => bytes.len() == spec.size,
            (T::Fixed(spec), Datum::Bytes(bytes)) => lenient && bytes.len() == spec.size,
            (T::Array(items), Datum::Array(values)) => {
                values.iter().all(|v| items.matches(v, lenient))
            }
            (T::Map(values), Datum::Map(entries)) => {
                entries.values().all(|v| values.matches(v, lenient))
            }
            (T::Union(members), _) => members.iter().any(|m| m.matches(datum, lenient)),
            (T::Literal { values, .. }, _) => values.iter().any(|v| v.matches(datum)),
            (T::Enum(decl), Datum::Enum(symbol)) => decl.symbols.contains(symbol),
            (T::Enum(decl), Datum::String(symbol)) => lenient && decl.symbols.contains(symbol),
            (T::Record(record) | T::SelfRef(record), Datum::Record(value)) => {
                match value.type_id {
                    Some(type_id) => type_id == record.type_id,
                    None => {
                        let decl = record.decl();
                        let name = decl.meta.schema_name.as_deref().unwrap_or(&decl.name);
                        if value.name == name {
                            true
                        } else {
                            lenient && structurally_matches(record, value)
                        }
                    }
                }
            }
            (T::Custom { encoded, .. }, _) => encoded.matches(datum, lenient),
            _ => false,
        }
    }
}

/// Every field of the datum is declared, and every declared field without a default is present.
fn structurally_matches(record: &RecordRef, value: &crate::RecordDatum) -> bool {
    let decl = record.decl();
    value
        .fields
        .iter()
        .all(|(name, _)| decl.fields.iter().any(|f| f.name == *name))
        && decl
            .fields
            .iter()
            .all(|f| f.has_default() || decl.meta.is_excluded(&f.name) || value.contains(&f.name))
}

/// The index of the union member `datum` belongs to: the first exact match, else the first
/// lenient one.
pub fn select_member(members: &[TypeDescriptor], datum: &Datum) -> Option<usize> {
    members
        .iter()
        .position(|m| m.matches(datum, false))
        .or_else(|| members.iter().position(|m| m.matches(datum, true)))
}

/// A resolved record field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// The name of the named type synthesized for the field, if overridden.
    pub inner_name: Option<String>,
    /// Extra keys spliced into the rendered field.
    pub metadata: Map<String, JsonValue>,
    pub default: Option<Datum>,
    pub default_factory: Option<fn() -> Datum>,
    /// The default is kept for decoding but not rendered.
    pub exclude_default: bool,
    pub parent: RecordRef,
    pub ty: TypeDescriptor,
}

impl FieldDescriptor {
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.default_factory.is_some()
    }

    /// The default value, calling the factory when there is no plain default.
    pub fn default_value(&self) -> Option<Datum> {
        self.default
            .clone()
            .or_else(|| self.default_factory.map(|factory| factory()))
    }
}

/// A field left out by the record's `exclude` list. It is filled from its default when decoding.
#[derive(Debug, Clone)]
pub struct ExcludedField {
    pub name: String,
    pub default: Option<Datum>,
    pub default_factory: Option<fn() -> Datum>,
}

impl ExcludedField {
    pub fn default_value(&self) -> Option<Datum> {
        self.default
            .clone()
            .or_else(|| self.default_factory.map(|factory| factory()))
    }
}

/// A resolved record.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    pub record: RecordRef,
    /// The schema name of the record.
    pub name: String,
    pub meta: RecordMeta,
    /// The rendered fields, in rendered order.
    pub fields: Vec<FieldDescriptor>,
    pub excluded: Vec<ExcludedField>,
}

impl RecordDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Every record reachable from a root record, resolved.
#[derive(Debug, Clone)]
pub struct Descriptors {
    pub(crate) root: TypeId,
    pub(crate) records: HashMap<TypeId, RecordDescriptor>,
}

impl Descriptors {
    pub fn root(&self) -> &RecordDescriptor {
        // The mapper always describes the root.
        &self.records[&self.root]
    }

    pub fn get(&self, record: &RecordRef) -> Option<&RecordDescriptor> {
        self.records.get(&record.type_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn exact_matches_win_over_lenient_ones() {
        let members = [
            TypeDescriptor::Immutable(Primitive::String),
            TypeDescriptor::Logical(LogicalType::Date),
        ];
        let date = NaiveDate::from_ymd_opt(2019, 10, 12).unwrap();
        assert_eq!(select_member(&members, &Datum::Date(date)), Some(1));
        assert_eq!(select_member(&members, &Datum::String("2019-10-12".into())), Some(0));

        let members = [
            TypeDescriptor::Immutable(Primitive::Null),
            TypeDescriptor::Immutable(Primitive::Double),
        ];
        assert_eq!(select_member(&members, &Datum::Long(3)), Some(1));
        assert_eq!(select_member(&members, &Datum::Boolean(true)), None);
    }

    #[test]
    fn fixed_matches_its_size() {
        let fixed = TypeDescriptor::Fixed(FixedSpec {
            name: "md5".into(),
            size: 2,
            namespace: None,
            aliases: vec![],
        });
        assert!(fixed.matches(&Datum::Fixed(vec![1, 2]), false));
        assert!(!fixed.matches(&Datum::Fixed(vec![1]), true));
        assert!(fixed.matches(&Datum::Bytes(vec![1, 2]), true));
        assert!(!fixed.matches(&Datum::Bytes(vec![1, 2]), false));
    }

    #[test]
    fn literals_match_their_values() {
        let literal = TypeDescriptor::Literal {
            values: vec![Literal::String("red".into()), Literal::Long(3)],
            form: LiteralForm::Primitives(vec![Primitive::String, Primitive::Long]),
        };
        assert!(literal.matches(&Datum::String("red".into()), false));
        assert!(literal.matches(&Datum::Int(3), false));
        assert!(!literal.matches(&Datum::String("blue".into()), true));
        assert_eq!(literal.kind(), AvroKind::Union);
    }
}
