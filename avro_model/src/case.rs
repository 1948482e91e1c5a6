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

//! Case styles applied to the names of a rendered schema.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A naming style for record and field names.
///
/// The styles that join words split names on separators (`_`, `-`, `.`, `/`, whitespace) and on
/// case changes, so applying a style twice gives the same name as applying it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum CaseStyle {
    /// `eventId`
    Camel,
    /// First letter upper cased, the rest untouched.
    Capital,
    /// `EVENT_ID`
    Const,
    Lower,
    /// `EventId`
    Pascal,
    /// `event/id`
    Path,
    /// `event_id`
    Snake,
    /// `event-id`
    Spinal,
    /// Surrounding whitespace removed.
    Trim,
    Upper,
    /// Only letters and digits kept.
    Alphanum,
}

impl CaseStyle {
    pub fn apply(self, name: &str) -> String {
        match self {
            CaseStyle::Camel => {
                let mut words = words(name).into_iter();
                let mut out = words.next().map(|w| w.to_lowercase()).unwrap_or_default();
                out.extend(words.map(|w| capitalize(&w)));
                out
            }
            CaseStyle::Pascal => words(name).iter().map(|w| capitalize(w)).collect(),
            CaseStyle::Capital => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            CaseStyle::Const => join(name, "_").to_uppercase(),
            CaseStyle::Snake => join(name, "_"),
            CaseStyle::Spinal => join(name, "-"),
            CaseStyle::Path => join(name, "/"),
            CaseStyle::Lower => name.to_lowercase(),
            CaseStyle::Upper => name.to_uppercase(),
            CaseStyle::Trim => name.trim().to_string(),
            CaseStyle::Alphanum => name.chars().filter(|c| c.is_alphanumeric()).collect(),
        }
    }

    /// Renames the records and fields of `schema`. Enum and fixed types keep their names and
    /// symbols, references to renamed records follow them.
    pub(crate) fn apply_to_schema(self, schema: &mut JsonValue) {
        let mut renamed = HashMap::new();
        self.rename(schema, &mut renamed);
    }

    fn rename(self, schema: &mut JsonValue, renamed: &mut HashMap<String, String>) {
        match schema {
            JsonValue::String(reference) => {
                let (namespace, name) = match reference.rsplit_once('.') {
                    Some((namespace, name)) => (Some(namespace), name),
                    None => (None, reference.as_str()),
                };
                if let Some(new) = renamed.get(name) {
                    *reference = match namespace {
                        Some(namespace) => format!("{namespace}.{new}"),
                        None => new.clone(),
                    };
                }
            }
            JsonValue::Array(members) => {
                for member in members {
                    self.rename(member, renamed);
                }
            }
            JsonValue::Object(object) => match object.get("type").and_then(JsonValue::as_str) {
                Some("record") => {
                    if let Some(JsonValue::String(name)) = object.get_mut("name") {
                        let new = self.apply(name);
                        renamed.insert(name.clone(), new.clone());
                        *name = new;
                    }
                    if let Some(JsonValue::Array(fields)) = object.get_mut("fields") {
                        for field in fields {
                            if let Some(JsonValue::String(name)) = field.get_mut("name") {
                                *name = self.apply(name);
                            }
                            if let Some(ty) = field.get_mut("type") {
                                self.rename(ty, renamed);
                            }
                        }
                    }
                }
                Some("array") => {
                    if let Some(items) = object.get_mut("items") {
                        self.rename(items, renamed);
                    }
                }
                Some("map") => {
                    if let Some(values) = object.get_mut("values") {
                        self.rename(values, renamed);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn join(name: &str, separator: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Splits a name into words at separators, at lower-to-upper changes and before the last capital
/// of an upper case run followed by a lower case letter (`HTTPServer` is `HTTP`, `Server`).
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let previous = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if previous.is_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
