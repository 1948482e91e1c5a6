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

//! The canonical Avro encodings the host types map onto.
//!
//! Every [`AvroType`](crate::AvroType) implementation resolves to one of these through the
//! [`mapper`](crate::mapper); this module only holds the vocabulary.

use serde_json::{Value as JsonValue, json};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// An Avro primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The schema of the primitive, e.g. `"long"`.
    pub fn schema(self) -> JsonValue {
        JsonValue::String(self.as_str().to_owned())
    }
}

/// The logical types carried by a runtime kind, without any extra parameters.
///
/// Decimal is described separately because it needs a precision and a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum LogicalType {
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uuid,
}

impl LogicalType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The primitive the logical type is written as.
    pub fn underlying(self) -> Primitive {
        match self {
            LogicalType::Date | LogicalType::TimeMillis => Primitive::Int,
            LogicalType::TimeMicros
            | LogicalType::TimestampMillis
            | LogicalType::TimestampMicros => Primitive::Long,
            LogicalType::Uuid => Primitive::String,
        }
    }

    /// Whether values are counted in microseconds rather than milliseconds.
    pub fn is_micros(self) -> bool {
        matches!(self, LogicalType::TimeMicros | LogicalType::TimestampMicros)
    }

    /// The schema of the logical type, e.g. `{"type": "int", "logicalType": "date"}`.
    pub fn schema(self) -> JsonValue {
        json!({
            "type": self.underlying().as_str(),
            "logicalType": self.as_str(),
        })
    }
}

/// The coarse kind of an Avro schema node, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum AvroKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array,
    Map,
    Union,
    Enum,
    Fixed,
    Record,
    Decimal,
    Date,
    #[strum(serialize = "time")]
    Time,
    #[strum(serialize = "timestamp")]
    Timestamp,
    Uuid,
}

impl From<Primitive> for AvroKind {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Null => AvroKind::Null,
            Primitive::Boolean => AvroKind::Boolean,
            Primitive::Int => AvroKind::Int,
            Primitive::Long => AvroKind::Long,
            Primitive::Float => AvroKind::Float,
            Primitive::Double => AvroKind::Double,
            Primitive::Bytes => AvroKind::Bytes,
            Primitive::String => AvroKind::String,
        }
    }
}

impl From<LogicalType> for AvroKind {
    fn from(logical: LogicalType) -> Self {
        match logical {
            LogicalType::Date => AvroKind::Date,
            LogicalType::TimeMillis | LogicalType::TimeMicros => AvroKind::Time,
            LogicalType::TimestampMillis | LogicalType::TimestampMicros => AvroKind::Timestamp,
            LogicalType::Uuid => AvroKind::Uuid,
        }
    }
}
