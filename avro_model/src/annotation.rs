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

//! The declarative description of host types.
//!
//! A model does not get inspected at runtime. Instead each field type describes itself through
//! [`AvroType::annotation`] and each record through [`AvroRecord::record_decl`], usually
//! generated by `#[derive(AvroModel)]`. The [`mapper`](crate::mapper) consumes these
//! descriptions exclusively.

use crate::{
    AvroResult, Datum,
    meta::{FieldMeta, RecordMeta},
    types::{LogicalType, Primitive},
};
use std::{any::TypeId, fmt};

/// How a host type maps to Avro, before any field-level refinement is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    Null,
    Primitive(Primitive),
    Logical(LogicalType),
    /// An arbitrary precision decimal; its precision and scale come from [`FieldInfo`].
    Decimal,
    /// A fixed-size byte array; its size comes from [`FieldInfo`].
    Fixed,
    Array(Box<TypeAnnotation>),
    Map {
        key: Box<TypeAnnotation>,
        value: Box<TypeAnnotation>,
    },
    Union(Vec<TypeAnnotation>),
    Literal(Vec<Literal>),
    Enum(EnumDecl),
    Record(RecordRef),
    /// A type refined by field info, e.g. a `i64` that should be written as an `int`.
    Annotated {
        inner: Box<TypeAnnotation>,
        info: FieldInfo,
    },
    /// A type the library has no mapping for. It can only be used through a
    /// [`CustomEncoder`](crate::CustomEncoder).
    Opaque { type_name: &'static str },
}

impl TypeAnnotation {
    pub fn of<T: AvroType>() -> Self {
        T::annotation()
    }

    /// Refines the annotation with field info.
    pub fn annotated(self, info: FieldInfo) -> Self {
        TypeAnnotation::Annotated {
            inner: Box::new(self),
            info,
        }
    }

    pub fn array(items: TypeAnnotation) -> Self {
        TypeAnnotation::Array(Box::new(items))
    }

    pub fn map(key: TypeAnnotation, value: TypeAnnotation) -> Self {
        TypeAnnotation::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// `T` or null.
    pub fn optional(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Union(vec![inner, TypeAnnotation::Null])
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnotation::Null => f.write_str("null"),
            TypeAnnotation::Primitive(p) => write!(f, "{p}"),
            TypeAnnotation::Logical(l) => write!(f, "{l}"),
            TypeAnnotation::Decimal => f.write_str("decimal"),
            TypeAnnotation::Fixed => f.write_str("fixed"),
            TypeAnnotation::Array(items) => write!(f, "array<{items}>"),
            TypeAnnotation::Map { key, value } => write!(f, "map<{key}, {value}>"),
            TypeAnnotation::Union(members) => {
                f.write_str("union<")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(">")
            }
            TypeAnnotation::Literal(values) => {
                f.write_str("literal<")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(">")
            }
            TypeAnnotation::Enum(decl) => write!(f, "enum {}", decl.name),
            TypeAnnotation::Record(record) => write!(f, "record {}", record.type_name),
            TypeAnnotation::Annotated { inner, info } => write!(f, "{inner} ({info})"),
            TypeAnnotation::Opaque { type_name } => f.write_str(type_name),
        }
    }
}

/// A single value of a literal type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Null,
    Boolean(bool),
    Long(i64),
    String(String),
}

impl Literal {
    /// The primitive the value is written as.
    pub fn primitive(&self) -> Primitive {
        match self {
            Literal::Null => Primitive::Null,
            Literal::Boolean(_) => Primitive::Boolean,
            Literal::Long(_) => Primitive::Long,
            Literal::String(_) => Primitive::String,
        }
    }

    pub fn to_datum(&self) -> Datum {
        match self {
            Literal::Null => Datum::Null,
            Literal::Boolean(b) => Datum::Boolean(*b),
            Literal::Long(l) => Datum::Long(*l),
            Literal::String(s) => Datum::String(s.clone()),
        }
    }

    /// Whether `datum` holds this value.
    pub fn matches(&self, datum: &Datum) -> bool {
        match (self, datum) {
            (Literal::Null, Datum::Null) => true,
            (Literal::Boolean(a), Datum::Boolean(b)) => a == b,
            (Literal::Long(a), Datum::Long(b)) => a == b,
            (Literal::Long(a), Datum::Int(b)) => *a == i64::from(*b),
            (Literal::String(a), Datum::String(b) | Datum::Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("None"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Long(l) => write!(f, "{l}"),
            Literal::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Field-level refinement of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInfo {
    /// Write an integer as a 32-bit `int`.
    Int32,
    /// Write a floating point number as a 32-bit `float`.
    Float32,
    /// Write a time with microsecond precision.
    TimeMicros,
    /// Write a datetime with microsecond precision.
    TimestampMicros,
    /// A bytes-backed decimal.
    Decimal { precision: u32, scale: u32 },
    Fixed {
        size: usize,
        namespace: Option<String>,
        aliases: Vec<String>,
    },
    /// A fixed-backed decimal.
    DecimalFixed {
        precision: u32,
        scale: u32,
        size: usize,
    },
}

impl FieldInfo {
    pub fn fixed(size: usize) -> Self {
        FieldInfo::Fixed {
            size,
            namespace: None,
            aliases: Vec::new(),
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        FieldInfo::Decimal { precision, scale }
    }
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldInfo::Int32 => f.write_str("int32"),
            FieldInfo::Float32 => f.write_str("float32"),
            FieldInfo::TimeMicros => f.write_str("time_micros"),
            FieldInfo::TimestampMicros => f.write_str("timestamp_micros"),
            FieldInfo::Decimal { precision, scale } => {
                write!(f, "decimal(precision = {precision}, scale = {scale})")
            }
            FieldInfo::Fixed { size, .. } => write!(f, "fixed(size = {size})"),
            FieldInfo::DecimalFixed {
                precision,
                scale,
                size,
            } => write!(
                f,
                "decimal(precision = {precision}, scale = {scale}, size = {size})"
            ),
        }
    }
}

/// A symbolic reference to a record type.
///
/// Records are looked up lazily through `describe`, so recursive types never build a cyclic
/// structure: the mapper stops at the first record it has already seen in the current chain.
#[derive(Clone, Copy)]
pub struct RecordRef {
    pub type_id: TypeId,
    pub type_name: &'static str,
    describe: fn() -> RecordDecl,
}

impl RecordRef {
    pub fn of<T: AvroRecord>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            describe: T::record_decl,
        }
    }

    pub fn decl(&self) -> RecordDecl {
        (self.describe)()
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RecordRef {}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordRef").field(&self.type_name).finish()
    }
}

/// An enum type.
#[derive(bon::Builder, Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub namespace: Option<String>,
    #[builder(default)]
    pub aliases: Vec<String>,
    #[builder(into)]
    pub doc: Option<String>,
    pub symbols: Vec<String>,
    /// The symbol readers fall back to when they meet an unknown one.
    #[builder(into)]
    pub default: Option<String>,
}

/// A record type: its name, metadata and fields in declaration order.
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub name: String,
    pub meta: RecordMeta,
    pub fields: Vec<FieldDecl>,
}

/// A declared field of a record.
#[derive(bon::Builder, Debug, Clone)]
pub struct FieldDecl {
    #[builder(into)]
    pub name: String,
    pub annotation: TypeAnnotation,
    pub default: Option<Datum>,
    /// Produces a fresh default, evaluated every time the schema is rendered.
    pub default_factory: Option<fn() -> Datum>,
    #[builder(default)]
    pub meta: FieldMeta,
}

impl FieldDecl {
    /// Whether the field has a default or a default factory.
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

/// A Rust type usable as the type of a record field.
pub trait AvroType: Sized {
    /// How the type maps to Avro.
    fn annotation() -> TypeAnnotation;

    fn to_datum(&self) -> Datum;

    fn from_datum(datum: Datum) -> AvroResult<Self>;
}

/// A Rust type describing an Avro record.
///
/// Implement it with `#[derive(AvroModel)]`.
pub trait AvroRecord: AvroType + 'static {
    fn record_decl() -> RecordDecl;
}
