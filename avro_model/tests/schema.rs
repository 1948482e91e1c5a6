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

use apache_avro_model::{AvroModel, CaseStyle, Details, ErrorKind};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use pretty_assertions::assert_eq;
use serde_bytes::ByteBuf;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(AvroModel)]
struct User {
    name: String,
    age: i64,
    has_pets: bool,
    money: f64,
    encoded: ByteBuf,
}

#[test]
fn primitives_keep_declaration_order() -> anyhow::Result<()> {
    assert_eq!(
        User::avro_schema()?,
        json!({
            "type": "record",
            "name": "User",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "age", "type": "long"},
                {"name": "has_pets", "type": "boolean"},
                {"name": "money", "type": "double"},
                {"name": "encoded", "type": "bytes"},
            ],
        })
    );
    Ok(())
}

#[derive(AvroModel)]
struct LogicalTypes {
    #[avro(default = "2019-10-12")]
    birthday: NaiveDate,
    #[avro(default = "17:57:42")]
    meeting_time: NaiveTime,
    #[avro(default = "2019-10-12T17:57:42Z")]
    release: DateTime<Utc>,
    #[avro(default = "ad0677ab-bd1c-4383-9d45-e46c56bcc5c9")]
    event: Uuid,
}

#[test]
fn logical_defaults_are_written_as_their_underlying_value() -> anyhow::Result<()> {
    assert_eq!(
        LogicalTypes::avro_schema()?,
        json!({
            "type": "record",
            "name": "LogicalTypes",
            "fields": [
                {
                    "name": "birthday",
                    "type": {"type": "int", "logicalType": "date"},
                    "default": 18181,
                },
                {
                    "name": "meeting_time",
                    "type": {"type": "int", "logicalType": "time-millis"},
                    "default": 64662000,
                },
                {
                    "name": "release",
                    "type": {"type": "long", "logicalType": "timestamp-millis"},
                    "default": 1570903062000i64,
                },
                {
                    "name": "event",
                    "type": {"type": "string", "logicalType": "uuid"},
                    "default": "ad0677ab-bd1c-4383-9d45-e46c56bcc5c9",
                },
            ],
        })
    );
    Ok(())
}

#[derive(AvroModel)]
struct Address {
    street: String,
    street_number: i64,
}

#[derive(AvroModel)]
#[avro(name = "User")]
struct UserWithAddresses {
    name: String,
    age: i64,
    addresses: Vec<Address>,
}

#[test]
fn nested_records_are_defined_inline() -> anyhow::Result<()> {
    assert_eq!(
        UserWithAddresses::avro_schema()?,
        json!({
            "type": "record",
            "name": "User",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "age", "type": "long"},
                {
                    "name": "addresses",
                    "type": {
                        "type": "array",
                        "items": {
                            "type": "record",
                            "name": "Address",
                            "fields": [
                                {"name": "street", "type": "string"},
                                {"name": "street_number", "type": "long"},
                            ],
                        },
                    },
                },
            ],
        })
    );
    Ok(())
}

#[derive(AvroModel)]
#[avro(name = "User")]
struct Person {
    name: String,
    age: i64,
    #[avro(default = None)]
    friend: Option<Box<Person>>,
    #[avro(default)]
    relatives: Vec<Person>,
    #[avro(default)]
    teammates: HashMap<String, Person>,
}

#[test]
fn self_references_use_the_bare_name() -> anyhow::Result<()> {
    assert_eq!(
        Person::avro_schema()?,
        json!({
            "type": "record",
            "name": "User",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "age", "type": "long"},
                {"name": "friend", "type": ["null", "User"], "default": null},
                {"name": "relatives", "type": {"type": "array", "items": "User"}, "default": []},
                {"name": "teammates", "type": {"type": "map", "values": "User"}, "default": {}},
            ],
        })
    );
    Ok(())
}

#[derive(AvroModel)]
enum Severity {
    Low,
    High,
}

#[derive(AvroModel)]
struct Event {
    event_id: String,
    severity: Severity,
}

#[test]
fn case_styles_rename_records_and_fields_only() -> anyhow::Result<()> {
    let schema = Event::avro_schema_with_case(CaseStyle::Camel)?;
    assert_eq!(
        schema,
        json!({
            "type": "record",
            "name": "event",
            "fields": [
                {"name": "eventId", "type": "string"},
                {
                    "name": "severity",
                    "type": {"type": "enum", "name": "Severity", "symbols": ["Low", "High"]},
                },
            ],
        })
    );
    assert_eq!(Event::avro_schema()?["fields"][0]["name"], "event_id");
    Ok(())
}

#[derive(AvroModel)]
#[avro(field_order(score, name))]
struct Ranked {
    name: String,
    id: i64,
    score: f64,
}

#[test]
fn field_order_comes_first() -> anyhow::Result<()> {
    let names = Ranked::fields()?
        .into_iter()
        .map(|field| field.name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["score", "name", "id"]);
    Ok(())
}

#[derive(AvroModel)]
struct Ping {
    pong: Box<Pong>,
}

#[derive(AvroModel)]
struct Pong {
    ping: Option<Box<Ping>>,
}

#[derive(AvroModel)]
#[avro(field_order(pong, ping))]
struct Rally {
    ping: Ping,
    pong: Pong,
}

#[test]
fn reordered_mutual_recursion_defines_each_record_once() -> anyhow::Result<()> {
    assert_eq!(
        Rally::avro_schema()?,
        json!({
            "type": "record",
            "name": "Rally",
            "fields": [
                {
                    "name": "pong",
                    "type": {
                        "type": "record",
                        "name": "Pong",
                        "fields": [{
                            "name": "ping",
                            "type": [
                                {
                                    "type": "record",
                                    "name": "Ping",
                                    "fields": [{"name": "pong", "type": "Pong"}],
                                },
                                "null",
                            ],
                        }],
                    },
                },
                {"name": "ping", "type": "Ping"},
            ],
        })
    );
    Ok(())
}

#[derive(AvroModel)]
#[avro(name = "Amounts")]
struct Amounts {
    plain: Option<i64>,
    #[avro(default = None)]
    nullable: Option<i64>,
    #[avro(default = "none")]
    labelled: Option<String>,
}

#[test]
fn unions_start_with_the_type_of_the_default() -> anyhow::Result<()> {
    let schema = Amounts::avro_schema()?;
    assert_eq!(schema["fields"][0]["type"], json!(["long", "null"]));
    assert_eq!(schema["fields"][1]["type"], json!(["null", "long"]));
    assert_eq!(schema["fields"][2]["type"], json!(["string", "null"]));
    assert_eq!(schema["fields"][2]["default"], json!("none"));
    Ok(())
}

#[derive(AvroModel, Default)]
#[avro(namespace = "com.shop")]
enum Currency {
    #[default]
    Eur,
    Usd,
}

#[derive(AvroModel)]
#[avro(namespace = "com.shop")]
struct Price {
    #[avro(decimal(precision = 10, scale = 2))]
    amount: BigDecimal,
    currency: Currency,
}

#[derive(AvroModel)]
#[avro(namespace = "com.shop", doc = "An order")]
struct Order {
    /// The unit price
    unit: Price,
    total: Price,
    currencies: Vec<Currency>,
}

#[test]
fn named_types_are_defined_once() -> anyhow::Result<()> {
    let schema = Order::avro_schema()?;
    assert_eq!(
        schema,
        json!({
            "type": "record",
            "name": "Order",
            "fields": [
                {
                    "doc": "The unit price",
                    "name": "unit",
                    "type": {
                        "type": "record",
                        "name": "Price",
                        "fields": [
                            {
                                "name": "amount",
                                "type": {"type": "bytes", "logicalType": "decimal", "precision": 10, "scale": 2},
                            },
                            {
                                "name": "currency",
                                "type": {
                                    "type": "enum",
                                    "name": "Currency",
                                    "symbols": ["Eur", "Usd"],
                                    "namespace": "com.shop",
                                    "default": "Eur",
                                },
                            },
                        ],
                        "namespace": "com.shop",
                    },
                },
                {"name": "total", "type": "Price"},
                {"name": "currencies", "type": {"type": "array", "items": "Currency"}},
            ],
            "doc": "An order",
            "namespace": "com.shop",
        })
    );
    Ok(())
}

#[derive(AvroModel)]
struct Holder {
    #[avro(fixed(size = 16, namespace = "md5"), inner_name = "Digest")]
    digest: apache_avro_model::Fixed<16>,
    #[avro(decimal(precision = 4, scale = 2, size = 2), inner_name = "Small")]
    small: BigDecimal,
}

#[test]
fn fixed_types_take_their_name_from_the_field() -> anyhow::Result<()> {
    let schema = Holder::avro_schema()?;
    assert_eq!(
        schema["fields"][0]["type"],
        json!({"type": "fixed", "name": "Digest", "size": 16, "namespace": "md5"})
    );
    assert_eq!(
        schema["fields"][1]["type"],
        json!({
            "type": "fixed",
            "name": "Small",
            "size": 2,
            "logicalType": "decimal",
            "precision": 4,
            "scale": 2,
        })
    );
    Ok(())
}

#[derive(AvroModel)]
struct WithMetadata {
    #[avro(alias = "old_name", meta(order = "descending"), meta_json = r#"{"pydantic-class": "int"}"#)]
    value: i64,
    #[avro(default_factory = Vec::new, exclude_default)]
    tags: Vec<String>,
    #[avro(default_factory = default_labels)]
    labels: Vec<String>,
}

fn default_labels() -> Vec<String> {
    vec!["new".to_string()]
}

#[test]
fn metadata_is_spliced_verbatim() -> anyhow::Result<()> {
    let schema = WithMetadata::avro_schema()?;
    assert_eq!(
        schema["fields"],
        json!([
            {
                "aliases": ["old_name"],
                "order": "descending",
                "pydantic-class": "int",
                "name": "value",
                "type": "long",
            },
            {"name": "tags", "type": {"type": "array", "items": "string"}},
            {"name": "labels", "type": {"type": "array", "items": "string"}, "default": ["new"]},
        ])
    );
    Ok(())
}

#[derive(AvroModel)]
#[avro(literal)]
enum Shape {
    #[avro(rename = "circle")]
    Circle,
    #[avro(rename = "square")]
    Square,
}

#[derive(AvroModel)]
#[avro(literal)]
enum Level {
    Low = 1,
    High = 5,
}

#[derive(AvroModel)]
struct Drawing {
    shape: Shape,
    level: Level,
}

#[derive(AvroModel)]
#[avro(convert_literal_to_enum)]
struct EnumDrawing {
    #[avro(inner_name = "ShapeKind")]
    shape: Shape,
    other: Shape,
}

#[test]
fn literals_render_as_primitives_or_enums() -> anyhow::Result<()> {
    let schema = Drawing::avro_schema()?;
    assert_eq!(schema["fields"][0]["type"], json!("string"));
    assert_eq!(schema["fields"][1]["type"], json!("long"));

    let schema = EnumDrawing::avro_schema()?;
    assert_eq!(
        schema["fields"][0]["type"],
        json!({"type": "enum", "name": "ShapeKind", "symbols": ["circle", "square"]})
    );
    assert_eq!(
        schema["fields"][1]["type"],
        json!({"type": "enum", "name": "other", "symbols": ["circle", "square"]})
    );
    Ok(())
}

#[derive(AvroModel)]
struct Leaf {
    value: i64,
}

#[derive(AvroModel)]
#[avro(alias_nested_items(first = "FirstLeaf"))]
struct Tree {
    first: Leaf,
    second: Leaf,
}

#[test]
fn nested_aliases_define_a_record_under_the_alias() -> anyhow::Result<()> {
    let schema = Tree::avro_schema()?;
    assert_eq!(schema["fields"][0]["type"]["name"], json!("FirstLeaf"));
    assert_eq!(schema["fields"][1]["type"]["name"], json!("Leaf"));
    Ok(())
}

#[derive(AvroModel)]
struct BadMap {
    counts: HashMap<i64, String>,
}

#[derive(AvroModel)]
enum BadSymbol {
    #[avro(rename = "not-valid")]
    NotValid,
}

#[derive(AvroModel)]
struct WithBadSymbol {
    value: BadSymbol,
}

#[derive(AvroModel)]
struct BadDecimal {
    #[avro(decimal(precision = 2, scale = 3))]
    value: BigDecimal,
}

#[derive(AvroModel)]
struct MissingDecimal {
    value: BigDecimal,
}

#[derive(AvroModel)]
struct Unencodable {
    address: std::net::IpAddr,
}

#[derive(AvroModel)]
struct BadDefault {
    #[avro(default = "soon")]
    when: NaiveDate,
}

#[derive(AvroModel)]
struct ResizedFixed {
    #[avro(fixed(size = 8))]
    digest: apache_avro_model::Fixed<16>,
}

#[test]
fn configuration_errors() {
    let err = BadMap::avro_schema().unwrap_err();
    assert!(matches!(err.details(), Details::InvalidMap { path, .. } if path == "BadMap.counts"));

    let err = WithBadSymbol::avro_schema().unwrap_err();
    assert!(matches!(err.details(), Details::InvalidSymbol { symbol, .. } if symbol == "not-valid"));

    let err = BadDecimal::avro_schema().unwrap_err();
    assert!(matches!(err.details(), Details::InvalidDecimal { precision: 2, scale: 3, .. }));

    let err = MissingDecimal::avro_schema().unwrap_err();
    assert!(matches!(err.details(), Details::MissingFieldInfo { .. }));

    let err = Unencodable::avro_schema().unwrap_err();
    assert!(matches!(err.details(), Details::UnknownType { path, .. } if path == "Unencodable.address"));

    let err = BadDefault::avro_schema().unwrap_err();
    assert!(matches!(err.details(), Details::InvalidDefault { path, .. } if path == "BadDefault.when"));

    let err = ResizedFixed::avro_schema().unwrap_err();
    assert!(matches!(
        err.details(),
        Details::FixedSizeConflict { path, declared: 8, size: 16 } if path == "ResizedFixed.digest"
    ));

    for err in [
        BadMap::avro_schema().unwrap_err(),
        ResizedFixed::avro_schema().unwrap_err(),
        BadDefault::avro_schema().unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

mod first {
    use apache_avro_model::AvroModel;

    #[derive(AvroModel)]
    pub enum Status {
        On,
    }
}

mod second {
    use apache_avro_model::AvroModel;

    #[derive(AvroModel)]
    pub enum Status {
        Off,
    }

    #[derive(AvroModel)]
    #[avro(name = "Status", namespace = "second")]
    pub enum NamespacedStatus {
        Off,
    }
}

#[derive(AvroModel)]
struct Clash {
    a: first::Status,
    b: second::Status,
}

#[derive(AvroModel)]
struct NoClash {
    a: first::Status,
    b: second::NamespacedStatus,
}

#[test]
fn same_name_different_types_need_a_namespace() -> anyhow::Result<()> {
    let err = Clash::avro_schema().unwrap_err();
    assert!(matches!(
        err.details(),
        Details::NamespaceRequired { path, name } if path == "Clash.b" && name == "Status"
    ));
    assert!(NoClash::avro_schema().is_ok());
    Ok(())
}

#[test]
fn schema_string_parses_back() -> anyhow::Result<()> {
    let text = Order::avro_schema_string()?;
    let parsed = apache_avro_model::apache_avro::Schema::parse_str(&text)?;
    assert_eq!(parsed.name().map(|name| name.name.as_str()), Some("Order"));
    Ok(())
}
