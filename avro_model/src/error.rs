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

use std::{error::Error as _, fmt};

/// Errors encountered while describing, rendering, encoding or decoding a model.
///
/// To inspect the details of the error use [`details`](Self::details) or [`into_details`](Self::into_details)
/// to get a [`Details`] which contains more precise error information.
///
/// See [`Details`] for all possible errors.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// The broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }
}

/// Functions for constructing a specific error type.
#[allow(non_snake_case, reason = "Want to mimic the `Details` variants")]
impl Error {
    /// Construct a new [`Error`] with a [`Details::Encode`].
    pub(crate) fn Encode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(Details::Encode {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Construct a new [`Error`] with a [`Details::Decode`].
    pub(crate) fn Decode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(Details::Decode {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Construct a new [`Error`] with a [`Details::InvalidDefault`].
    pub(crate) fn InvalidDefault(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(Details::InvalidDefault {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Construct a new [`Error`] with a [`Details::UnknownType`].
    pub(crate) fn UnknownType(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(Details::UnknownType {
            path: path.into(),
            type_name: type_name.into(),
        })
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

impl From<apache_avro::Error> for Error {
    fn from(error: apache_avro::Error) -> Self {
        Self::new(Details::Codec(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::new(Details::Json(error))
    }
}

/// The three classes of failure a caller has to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The declared types or their metadata are inconsistent.
    Configuration,
    /// A runtime value does not satisfy its declared type.
    Encoding,
    /// Incoming bytes do not satisfy the schema, or rehydration failed.
    Decoding,
}

#[derive(thiserror::Error)]
pub enum Details {
    #[error("Unknown type for field `{path}`: {type_name}")]
    UnknownType { path: String, type_name: String },

    #[error("Map keys must be strings, field `{path}` declares `{key}` keys")]
    InvalidMap { path: String, key: String },

    #[error("Invalid enum symbol {symbol:?} in `{path}`: it must match {pattern}")]
    InvalidSymbol {
        path: String,
        symbol: String,
        pattern: &'static str,
    },

    #[error("Duplicate enum symbol {symbol:?} in `{path}`")]
    DuplicateSymbol { path: String, symbol: String },

    #[error("Invalid default value for field `{path}`: {reason}")]
    InvalidDefault { path: String, reason: String },

    #[error(
        "Invalid decimal for field `{path}`: precision {precision} and scale {scale} must satisfy 0 < precision and 0 <= scale <= precision"
    )]
    InvalidDecimal {
        path: String,
        precision: u32,
        scale: u32,
    },

    #[error("Invalid fixed for field `{path}`: size must be positive, got {size}")]
    InvalidFixed { path: String, size: usize },

    #[error("Conflicting fixed sizes for field `{path}`: {declared} is declared, the type has {size}")]
    FixedSizeConflict {
        path: String,
        declared: usize,
        size: usize,
    },

    #[error("Invalid name {name:?} in `{path}`: it must match {pattern}")]
    InvalidName {
        path: String,
        name: String,
        pattern: &'static str,
    },

    #[error(
        "Two different named types share the fully qualified name `{name}` (field `{path}`), give one of them a namespace"
    )]
    NamespaceRequired { path: String, name: String },

    #[error("Field `{path}` of type {type_name} needs {required} field info")]
    MissingFieldInfo {
        path: String,
        type_name: String,
        required: &'static str,
    },

    #[error("Field info {info} cannot annotate field `{path}` of type {type_name}")]
    FieldInfoMismatch {
        path: String,
        info: String,
        type_name: String,
    },

    #[error("Failed to encode `{path}`: {reason}")]
    Encode { path: String, reason: String },

    #[error("Failed to decode `{path}`: {reason}")]
    Decode { path: String, reason: String },

    #[error("Avro codec failed: {0}")]
    Codec(#[source] apache_avro::Error),

    #[error("Failed to process JSON: {0}")]
    Json(#[source] serde_json::Error),
}

impl Details {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Details::UnknownType { .. }
            | Details::InvalidMap { .. }
            | Details::InvalidSymbol { .. }
            | Details::DuplicateSymbol { .. }
            | Details::InvalidDefault { .. }
            | Details::InvalidDecimal { .. }
            | Details::InvalidFixed { .. }
            | Details::FixedSizeConflict { .. }
            | Details::InvalidName { .. }
            | Details::NamespaceRequired { .. }
            | Details::MissingFieldInfo { .. }
            | Details::FieldInfoMismatch { .. } => ErrorKind::Configuration,
            Details::Encode { .. } => ErrorKind::Encoding,
            Details::Decode { .. } | Details::Json(_) => ErrorKind::Decoding,
            // Datum-level codec failures are reported as `Encode`/`Decode`, only
            // schema parsing surfaces the codec error itself.
            Details::Codec(_) => ErrorKind::Configuration,
        }
    }

    /// The dotted field path the error was raised at, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Details::UnknownType { path, .. }
            | Details::InvalidMap { path, .. }
            | Details::InvalidSymbol { path, .. }
            | Details::DuplicateSymbol { path, .. }
            | Details::InvalidDefault { path, .. }
            | Details::InvalidDecimal { path, .. }
            | Details::InvalidFixed { path, .. }
            | Details::FixedSizeConflict { path, .. }
            | Details::InvalidName { path, .. }
            | Details::NamespaceRequired { path, .. }
            | Details::MissingFieldInfo { path, .. }
            | Details::FieldInfoMismatch { path, .. }
            | Details::Encode { path, .. }
            | Details::Decode { path, .. } => Some(path),
            Details::Codec(_) | Details::Json(_) => None,
        }
    }
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_kind_follows_details() {
        let err = Error::InvalidDefault("User.age", "expected a long, got string");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.details().path(), Some("User.age"));
        assert_eq!(
            err.to_string(),
            "Invalid default value for field `User.age`: expected a long, got string"
        );

        assert_eq!(
            Error::Encode("User.name", "boom").kind(),
            ErrorKind::Encoding
        );
        assert_eq!(
            Error::Decode("User.name", "boom").kind(),
            ErrorKind::Decoding
        );
    }

    #[test]
    fn json_errors_keep_their_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(source);
        assert!(format!("{:?}", err.details()).starts_with("Failed to process JSON"));
        assert!(err.details().path().is_none());
    }
}
