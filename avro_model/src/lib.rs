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

//! Derive **[Apache Avro](https://avro.apache.org/)** schemas from Rust types and encode their
//! values with them.
//!
//! A record type declares its fields, usually through `#[derive(AvroModel)]`. From that
//! declaration the crate:
//!
//! 1. resolves every field type to a descriptor ([`mapper`]),
//! 2. renders the schema document, defining each named type once and referring to it by name
//!    afterwards ([`render`]),
//! 3. converts values to and from the primitive values of the `apache-avro` codec, which writes
//!    the binary encoding, while the Avro JSON encoding is written by this crate.
//!
//! ```
//! use apache_avro_model::{AvroModel, Encoding};
//!
//! #[derive(AvroModel, Debug, PartialEq)]
//! #[avro(namespace = "com.example")]
//! struct User {
//!     name: String,
//!     age: i64,
//!     #[avro(default = None)]
//!     email: Option<String>,
//! }
//!
//! let user = User { name: "Ada".into(), age: 36, email: None };
//! let bytes = user.serialize(Encoding::Binary)?;
//! assert_eq!(User::deserialize(&bytes, Encoding::Binary)?, user);
//! # Ok::<(), apache_avro_model::Error>(())
//! ```
//!
//! # Features
//!
//! - `derive`: enable `#[derive(AvroModel)]` (on by default)
//!
//! # MSRV
//!
//! The current MSRV is 1.88.0.

mod annotation;
mod case;
mod codec;
mod construct;
mod datum;
mod decimal;
mod impls;
mod logical;
mod meta;
mod model;
mod tracker;
mod validator;

pub mod descriptor;
pub mod error;
pub mod mapper;
pub mod render;
pub mod types;

pub use annotation::{
    AvroRecord, AvroType, EnumDecl, FieldDecl, FieldInfo, Literal, RecordDecl, RecordRef,
    TypeAnnotation,
};
pub use apache_avro;
pub use case::CaseStyle;
pub use datum::{Datum, OpaqueDatum, RecordDatum};
pub use error::{Details, Error, ErrorKind};
pub use impls::Fixed;
pub use meta::{CustomEncoder, DecodeConfig, FieldMeta, RecordMeta, TypeHook};
pub use model::{AvroModel, Encoding, ModelCodec};

#[cfg(feature = "derive")]
pub use apache_avro_model_derive::AvroModel;

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;

/// Helpers for the code generated by `#[derive(AvroModel)]`. Not public API.
#[doc(hidden)]
pub mod __private {
    use crate::{Datum, Details, Error};

    pub use serde_json::{Map as JsonMap, Value as JsonValue};

    /// The error returned when a datum doesn't fit the derived type.
    pub fn unexpected(expected: &str, datum: &Datum) -> Error {
        Error::new(Details::Decode {
            path: expected.to_string(),
            reason: format!("unexpected value {}", datum.summary()),
        })
    }
}
