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

//! Keeps track of the named types emitted during one render.

use crate::{AvroResult, error::Details};
use log::{debug, trace};
use serde_json::Value as JsonValue;
use std::{any::TypeId, collections::HashMap};

/// What makes two emissions of a named type the same type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Definition {
    /// A record is identified by the Rust type it was described from.
    Record(TypeId),
    /// Enums and fixed types are identified by their rendered definition.
    Schema(JsonValue),
}

/// How a named type has to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emission {
    /// First occurrence: the full definition.
    Full,
    /// Already defined: a name reference.
    Reference,
}

#[derive(Debug, Default)]
pub(crate) struct NamedTypes {
    seen: HashMap<String, Definition>,
}

impl NamedTypes {
    /// Registers `fullname`. Fails when it is already taken by a different definition.
    pub(crate) fn register(
        &mut self,
        fullname: &str,
        definition: Definition,
        path: &str,
    ) -> AvroResult<Emission> {
        match self.seen.get(fullname) {
            None => {
                trace!("Defining {fullname} at {path}");
                self.seen.insert(fullname.to_string(), definition);
                Ok(Emission::Full)
            }
            Some(seen) if *seen == definition => {
                trace!("Referencing {fullname} at {path}");
                Ok(Emission::Reference)
            }
            Some(_) => Err(Details::NamespaceRequired {
                path: path.to_string(),
                name: fullname.to_string(),
            }
            .into()),
        }
    }

    pub(crate) fn reset(&mut self) {
        if !self.seen.is_empty() {
            debug!("Forgetting {} named types", self.seen.len());
        }
        self.seen.clear();
    }
}

/// `namespace.name`, or `name` alone without a namespace.
pub(crate) fn fullname(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) if !namespace.is_empty() => format!("{namespace}.{name}"),
        _ => name.to_string(),
    }
}

/// How to refer to a named type from within `enclosing`: the bare name when both share the
/// namespace, the full name otherwise.
pub(crate) fn reference(name: &str, namespace: Option<&str>, enclosing: Option<&str>) -> String {
    if namespace == enclosing {
        name.to_string()
    } else {
        fullname(name, namespace)
    }
}
