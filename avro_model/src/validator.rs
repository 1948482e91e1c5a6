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

//! Name validation following the [Avro specification](https://avro.apache.org/docs/++version++/specification/#names).
//!
//! Record, enum and fixed names, namespaces, field names and enum symbols are validated before
//! they are rendered, so a rendered schema is always accepted by a conformant parser.

use crate::{AvroResult, error::Details};
use log::debug;
use regex_lite::Regex;
use std::sync::OnceLock;

const NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";
const NAMESPACE_PATTERN: &str = r"^([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?$";

fn name_regex() -> &'static Regex {
    static NAME_ONCE: OnceLock<Regex> = OnceLock::new();
    NAME_ONCE.get_or_init(|| Regex::new(NAME_PATTERN).expect("Regex is valid"))
}

fn namespace_regex() -> &'static Regex {
    static NAMESPACE_ONCE: OnceLock<Regex> = OnceLock::new();
    NAMESPACE_ONCE.get_or_init(|| Regex::new(NAMESPACE_PATTERN).expect("Regex is valid"))
}

/// Validates the simple name of a record, enum or fixed.
pub(crate) fn validate_schema_name(name: &str, path: &str) -> AvroResult<()> {
    if name_regex().is_match(name) {
        Ok(())
    } else {
        debug!("Rejecting schema name {name:?} at {path}");
        Err(Details::InvalidName {
            path: path.to_string(),
            name: name.to_string(),
            pattern: NAME_PATTERN,
        }
        .into())
    }
}

pub(crate) fn validate_namespace(namespace: &str, path: &str) -> AvroResult<()> {
    if namespace_regex().is_match(namespace) {
        Ok(())
    } else {
        Err(Details::InvalidName {
            path: path.to_string(),
            name: namespace.to_string(),
            pattern: NAMESPACE_PATTERN,
        }
        .into())
    }
}

pub(crate) fn validate_record_field_name(name: &str, path: &str) -> AvroResult<()> {
    validate_schema_name(name, path)
}

/// Validates the symbols of an enum: each must be a valid name and appear once.
pub(crate) fn validate_enum_symbols(symbols: &[String], path: &str) -> AvroResult<()> {
    for (i, symbol) in symbols.iter().enumerate() {
        if !name_regex().is_match(symbol) {
            return Err(Details::InvalidSymbol {
                path: path.to_string(),
                symbol: symbol.clone(),
                pattern: NAME_PATTERN,
            }
            .into());
        }
        if symbols[..i].contains(symbol) {
            return Err(Details::DuplicateSymbol {
                path: path.to_string(),
                symbol: symbol.clone(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn schema_names() {
        assert!(validate_schema_name("User", "User").is_ok());
        assert!(validate_schema_name("_private9", "User").is_ok());
        assert!(validate_schema_name("9lives", "User").is_err());
        assert!(validate_schema_name("with.dot", "User").is_err());
        assert!(validate_record_field_name("has-dash", "User.has-dash").is_err());
    }

    #[test]
    fn namespaces_may_be_dotted_or_empty() {
        assert!(validate_namespace("", "User").is_ok());
        assert!(validate_namespace("com.example.types", "User").is_ok());
        assert!(validate_namespace("com..example", "User").is_err());
        assert!(validate_namespace("com.9", "User").is_err());
    }

    #[test]
    fn enum_symbols_are_names_and_unique() {
        let ok = ["BLUE".to_string(), "_RED".to_string()];
        assert!(validate_enum_symbols(&ok, "Color").is_ok());

        let invalid = ["BLUE".to_string(), "NOT-OK".to_string()];
        let err = validate_enum_symbols(&invalid, "Color").unwrap_err();
        assert!(matches!(err.details(), Details::InvalidSymbol { symbol, .. } if symbol == "NOT-OK"));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let duplicated = ["BLUE".to_string(), "BLUE".to_string()];
        let err = validate_enum_symbols(&duplicated, "Color").unwrap_err();
        assert!(matches!(err.details(), Details::DuplicateSymbol { .. }));
    }
}
