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

//! The dynamic instance tree handed between user types and the codec driver.

use crate::{AvroResult, AvroType, error::Error};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::{
    any::{Any, TypeId},
    collections::BTreeMap,
    fmt,
    sync::Arc,
};
use uuid::Uuid;

/// A runtime value of a model, before it is lowered to the codec's
/// [`Value`](apache_avro::types::Value).
///
/// Logical kinds (dates, times, UUIDs, decimals) keep their rich representation here, the
/// codec driver converts them according to the field they are written to.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Naive datetimes are stored as UTC.
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Decimal(BigDecimal),
    Fixed(Vec<u8>),
    /// An enum symbol.
    Enum(String),
    Array(Vec<Datum>),
    Map(BTreeMap<String, Datum>),
    Record(RecordDatum),
    /// A value of a type the library does not know, see [`CustomEncoder`](crate::CustomEncoder).
    Opaque(OpaqueDatum),
}

impl Datum {
    /// A short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Boolean(_) => "boolean",
            Datum::Int(_) => "int",
            Datum::Long(_) => "long",
            Datum::Float(_) => "float",
            Datum::Double(_) => "double",
            Datum::Bytes(_) => "bytes",
            Datum::String(_) => "string",
            Datum::Date(_) => "date",
            Datum::Time(_) => "time",
            Datum::DateTime(_) => "datetime",
            Datum::Uuid(_) => "uuid",
            Datum::Decimal(_) => "decimal",
            Datum::Fixed(_) => "fixed",
            Datum::Enum(_) => "enum",
            Datum::Array(_) => "array",
            Datum::Map(_) => "map",
            Datum::Record(_) => "record",
            Datum::Opaque(_) => "opaque",
        }
    }

    /// A bounded rendering of the value for diagnostics.
    pub fn summary(&self) -> String {
        const MAX: usize = 64;
        let mut text = format!("{self:?}");
        if text.len() > MAX {
            let mut end = MAX;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
            text.push_str("...");
        }
        text
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) | Datum::Enum(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! datum_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Datum {
                fn from(value: $ty) -> Self {
                    Datum::$variant(value.into())
                }
            }
        )*
    };
}

datum_from!(
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    &str => String,
    NaiveDate => Date,
    NaiveTime => Time,
    DateTime<Utc> => DateTime,
    Uuid => Uuid,
    BigDecimal => Decimal,
    RecordDatum => Record,
);

/// The runtime value of a record: its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDatum {
    /// The name of the record type.
    pub name: String,
    /// The Rust type the datum was produced from, if known.
    ///
    /// Unions of several records dispatch on it before falling back to a structural match.
    pub type_id: Option<TypeId>,
    pub fields: Vec<(String, Datum)>,
}

impl RecordDatum {
    /// A record datum that is not tied to a Rust type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: None,
            fields: Vec::new(),
        }
    }

    /// A record datum produced from `T`.
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: Some(TypeId::of::<T>()),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, datum: impl Into<Datum>) -> Self {
        self.push(name, datum);
        self
    }

    /// Appends a field, replacing a previous one with the same name.
    pub fn push(&mut self, name: impl Into<String>, datum: impl Into<Datum>) {
        let name = name.into();
        let datum = datum.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = datum,
            None => self.fields.push((name, datum)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a field and returns its value.
    pub fn take(&mut self, name: &str) -> Option<Datum> {
        let position = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(position).1)
    }

    /// Removes a field and converts it to `T`. A missing field is read as null.
    pub fn take_field<T: AvroType>(&mut self, name: &str) -> AvroResult<T> {
        let datum = self.take(name).unwrap_or(Datum::Null);
        T::from_datum(datum).map_err(|e| Error::Decode(format!("{}.{name}", self.name), e.to_string()))
    }

    /// Whether this datum was produced from `T`.
    pub fn is_of<T: 'static>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }

    /// Unwraps a [`Datum::Record`].
    pub fn try_from_datum(datum: Datum, expected: &str) -> AvroResult<Self> {
        match datum {
            Datum::Record(record) => Ok(record),
            other => Err(Error::Decode(
                expected,
                format!("expected a record, got {}", other.summary()),
            )),
        }
    }
}

/// A value of a type unknown to the library.
///
/// It only compares equal to another opaque value of the same Rust type holding an equal value.
#[derive(Clone)]
pub struct OpaqueDatum {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    eq: fn(&dyn Any, &dyn Any) -> bool,
    debug: fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl OpaqueDatum {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
            eq: |a, b| match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            debug: |v, f| match v.downcast_ref::<T>() {
                Some(v) => fmt::Debug::fmt(v, f),
                None => f.write_str("<opaque>"),
            },
        }
    }

    /// The Rust type name of the wrapped value, as given by [`std::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueDatum {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && (self.eq)(self.value.as_ref(), other.value.as_ref())
    }
}

impl fmt::Debug for OpaqueDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque<{}>(", self.type_name)?;
        (self.debug)(self.value.as_ref(), f)?;
        f.write_str(")")
    }
}
