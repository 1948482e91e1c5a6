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

use apache_avro_model::{AvroModel, AvroRecord, AvroType, Datum, Encoding};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::json;
use std::{collections::HashMap, rc::Rc, str::FromStr, sync::Arc};

use pretty_assertions::assert_eq;

/// Takes a model through both encodings and asserts the result is the same
fn round_trip_assert<T>(obj: T)
where
    T: std::fmt::Debug + AvroModel + PartialEq,
{
    for encoding in [Encoding::Binary, Encoding::Json] {
        assert_eq!(obj, round_trip(&obj, encoding));
    }
}

fn round_trip<T: AvroModel>(obj: &T, encoding: Encoding) -> T {
    let encoded = match obj.serialize(encoding) {
        Ok(encoded) => encoded,
        Err(e) => panic!("{e:?}"),
    };
    assert!(!encoded.is_empty());
    match T::deserialize(&encoded, encoding) {
        Ok(decoded) => decoded,
        Err(e) => panic!("{e:?}"),
    }
}

#[derive(Debug, AvroModel, Clone, PartialEq, Eq)]
struct TestBasic {
    a: i32,
    b: String,
}

proptest! {
#[test]
fn test_smoke_test(a: i32, b: String) {
    let schema = json!({
        "type": "record",
        "name": "TestBasic",
        "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"},
        ],
    });
    assert_eq!(schema, TestBasic::avro_schema().unwrap());
    let test = TestBasic { a, b };
    round_trip_assert(test);
}}

#[derive(Debug, AvroModel, Clone, PartialEq)]
#[avro(namespace = "com.testing.namespace")]
struct TestBasicNamespace {
    a: i32,
    b: String,
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
#[avro(namespace = "com.testing.complex.namespace")]
struct TestComplexNamespace {
    a: TestBasicNamespace,
    b: Option<TestBasicNamespace>,
}

#[test]
fn test_basic_namespace() {
    let schema = TestBasicNamespace::avro_schema().unwrap();
    assert_eq!(schema["namespace"], json!("com.testing.namespace"));
    round_trip_assert(TestBasicNamespace {
        a: 1,
        b: "x".to_string(),
    });
}

#[test]
fn test_complex_namespace() {
    let schema = TestComplexNamespace::avro_schema().unwrap();
    let inner = &schema["fields"][0]["type"];
    assert_eq!(inner["name"], json!("TestBasicNamespace"));
    assert_eq!(inner["namespace"], json!("com.testing.namespace"));
    // A different namespace needs the full name.
    assert_eq!(
        schema["fields"][1]["type"],
        json!(["com.testing.namespace.TestBasicNamespace", "null"])
    );
    let inner = TestBasicNamespace {
        a: 5,
        b: "five".to_string(),
    };
    round_trip_assert(TestComplexNamespace {
        a: inner.clone(),
        b: Some(inner),
    });
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
struct TestGeneric<T> {
    value: T,
    values: Vec<T>,
}

#[test]
fn test_generic_container() {
    let schema = TestGeneric::<i64>::avro_schema().unwrap();
    assert_eq!(schema["fields"][0]["type"], json!("long"));
    round_trip_assert(TestGeneric {
        value: 3i64,
        values: vec![1, 2],
    });
    round_trip_assert(TestGeneric {
        value: "a".to_string(),
        values: vec![],
    });
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
struct TestSmartPointers {
    boxed: Box<i64>,
    counted: Rc<String>,
    shared: Arc<Vec<i32>>,
}

#[test]
fn test_smart_pointers_are_transparent() {
    let schema = TestSmartPointers::avro_schema().unwrap();
    assert_eq!(
        schema["fields"],
        json!([
            {"name": "boxed", "type": "long"},
            {"name": "counted", "type": "string"},
            {"name": "shared", "type": {"type": "array", "items": "int"}},
        ])
    );
    round_trip_assert(TestSmartPointers {
        boxed: Box::new(1),
        counted: Rc::new("two".to_string()),
        shared: Arc::new(vec![3]),
    });
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
#[avro(name = "Renamed", alias = "Original", alias = "Older")]
struct TestRename {
    #[avro(rename = "type")]
    kind: String,
    r#match: bool,
}

#[test]
fn test_renames_and_raw_identifiers() {
    let schema = TestRename::avro_schema().unwrap();
    assert_eq!(
        schema,
        json!({
            "type": "record",
            "name": "Renamed",
            "fields": [
                {"name": "type", "type": "string"},
                {"name": "match", "type": "boolean"},
            ],
            "aliases": ["Original", "Older"],
        })
    );
    round_trip_assert(TestRename {
        kind: "k".to_string(),
        r#match: true,
    });
}

/// A record with documentation
#[derive(Debug, AvroModel, Clone, PartialEq)]
struct TestDocs {
    /// The field documentation
    a: i64,
    #[avro(doc = "Overrides the rustdoc")]
    /// Not used
    b: i64,
}

#[test]
fn test_rustdoc_becomes_doc() {
    let schema = TestDocs::avro_schema().unwrap();
    assert_eq!(schema["doc"], json!("A record with documentation"));
    assert_eq!(schema["fields"][0]["doc"], json!("The field documentation"));
    assert_eq!(schema["fields"][1]["doc"], json!("Overrides the rustdoc"));
}

#[derive(Debug, AvroModel, Clone, Copy, PartialEq, Default)]
enum Color {
    #[default]
    Red,
    Green,
}

fn default_history() -> Vec<String> {
    vec!["created".to_string()]
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
struct TestDefaults {
    #[avro(default = 3)]
    small: i32,
    #[avro(default = 1.5)]
    ratio: f64,
    #[avro(default = true)]
    flag: bool,
    #[avro(default = "text")]
    text: String,
    #[avro(default = Color::Green)]
    color: Color,
    #[avro(default)]
    fallback: Color,
    #[avro(default = "2019-10-12")]
    day: NaiveDate,
    #[avro(default = vec![1, 2])]
    numbers: Vec<i64>,
    #[avro(default = HashMap::from([("a".to_string(), 1)]))]
    lookup: HashMap<String, i64>,
    #[avro(default_factory = default_history)]
    history: Vec<String>,
    #[avro(decimal(precision = 5, scale = 2), default = "1.50")]
    price: BigDecimal,
}

#[test]
fn test_defaults() {
    let schema = TestDefaults::avro_schema().unwrap();
    let defaults = schema["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["default"].clone())
        .collect::<Vec<_>>();
    assert_eq!(
        defaults,
        vec![
            json!(3),
            json!(1.5),
            json!(true),
            json!("text"),
            json!("Green"),
            json!("Red"),
            json!(18181),
            json!([1, 2]),
            json!({"a": 1}),
            json!(["created"]),
            json!("\u{0}\u{96}"),
        ]
    );
}

#[test]
fn test_defaults_fill_missing_fields() {
    let datum = Datum::Record(apache_avro_model::RecordDatum::new("TestDefaults"));
    let parsed = TestDefaults::parse_obj(&datum).unwrap();
    assert_eq!(
        parsed,
        TestDefaults {
            small: 3,
            ratio: 1.5,
            flag: true,
            text: "text".to_string(),
            color: Color::Green,
            fallback: Color::Red,
            day: NaiveDate::from_ymd_opt(2019, 10, 12).unwrap(),
            numbers: vec![1, 2],
            lookup: HashMap::from([("a".to_string(), 1)]),
            history: default_history(),
            price: BigDecimal::from_str("1.50").unwrap(),
        }
    );
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
struct TestSkip {
    kept: i64,
    #[avro(skip)]
    skipped: Option<String>,
}

#[test]
fn test_skipped_fields() {
    let schema = TestSkip::avro_schema().unwrap();
    assert_eq!(schema["fields"], json!([{"name": "kept", "type": "long"}]));
    let decoded = round_trip(
        &TestSkip {
            kept: 1,
            skipped: Some("lost".to_string()),
        },
        Encoding::Binary,
    );
    assert_eq!(
        decoded,
        TestSkip {
            kept: 1,
            skipped: None,
        }
    );
}

#[derive(Debug, AvroModel, Clone, PartialEq)]
struct TestTree {
    label: String,
    #[avro(default)]
    children: Vec<TestTree>,
    #[avro(default = None)]
    parent_label: Option<String>,
}

#[test]
fn test_recursive_values() {
    round_trip_assert(TestTree {
        label: "root".to_string(),
        children: vec![
            TestTree {
                label: "left".to_string(),
                children: vec![],
                parent_label: Some("root".to_string()),
            },
            TestTree {
                label: "right".to_string(),
                children: vec![],
                parent_label: Some("root".to_string()),
            },
        ],
        parent_label: None,
    });
}

#[test]
fn test_record_decl() {
    let decl = TestDocs::record_decl();
    assert_eq!(decl.name, "TestDocs");
    assert_eq!(
        decl.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        ["a", "b"]
    );
    assert_eq!(decl.meta.doc.as_deref(), Some("A record with documentation"));
}

#[test]
fn test_datum_of_other_record_is_rejected() {
    let datum = TestBasic {
        a: 1,
        b: "b".to_string(),
    }
    .to_datum();
    assert!(TestBasicNamespace::from_datum(datum).is_err());
}
