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

use apache_avro_model::{
    AvroModel, AvroType, CustomEncoder, Datum, Encoding, ErrorKind, Fixed, OpaqueDatum,
    RecordDatum, TypeAnnotation, TypeHook,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_bytes::ByteBuf;
use serde_json::json;
use std::{collections::HashMap, net::IpAddr, str::FromStr};
use uuid::Uuid;

#[derive(AvroModel, Debug, PartialEq)]
struct Demo {
    #[avro(decimal(precision = 10, scale = 3))]
    foo: BigDecimal,
}

#[rstest]
#[case::binary(Encoding::Binary)]
#[case::json(Encoding::Json)]
fn decimals_round_trip(#[case] encoding: Encoding) -> anyhow::Result<()> {
    let demo = Demo {
        foo: BigDecimal::from_str("3.141")?,
    };
    let bytes = demo.serialize(encoding)?;
    assert_eq!(Demo::deserialize(&bytes, encoding)?, demo);
    Ok(())
}

#[derive(AvroModel, Debug, PartialEq)]
struct Measurement {
    value: f64,
}

#[rstest]
#[case::large(203878303086.86206)]
#[case::tiny(5e-324)]
#[case::third(1.0 / 3.0)]
fn doubles_keep_every_bit_in_json(#[case] value: f64) -> anyhow::Result<()> {
    let measurement = Measurement { value };
    let bytes = measurement.serialize(Encoding::Json)?;
    let decoded = Measurement::deserialize(&bytes, Encoding::Json)?;
    assert_eq!(decoded.value.to_bits(), value.to_bits());
    Ok(())
}

#[derive(AvroModel, Debug, PartialEq, Clone, Copy)]
enum Severity {
    Low,
    High,
}

#[derive(AvroModel, Debug, PartialEq, Clone)]
enum Amount {
    Whole(i64),
    Fraction(f64),
}

#[derive(AvroModel, Debug, PartialEq, Clone, Copy)]
#[avro(literal)]
enum Shape {
    #[avro(rename = "circle")]
    Circle,
    #[avro(rename = "square")]
    Square,
}

#[derive(AvroModel, Debug, PartialEq, Clone)]
#[avro(namespace = "com.example")]
struct Profile {
    name: String,
    #[avro(int32)]
    age: i64,
    #[avro(float32)]
    ratio: f64,
    birthday: NaiveDate,
    #[avro(time_micros)]
    wake_up: NaiveTime,
    #[avro(timestamp_micros)]
    joined: DateTime<Utc>,
    id: Uuid,
    tags: Vec<String>,
    scores: HashMap<String, i64>,
    #[avro(default = None)]
    nickname: Option<String>,
    #[avro(decimal(precision = 10, scale = 2))]
    balance: BigDecimal,
    checksum: Fixed<4>,
    severity: Severity,
    amount: Amount,
    shape: Shape,
    raw: ByteBuf,
}

fn profile() -> Profile {
    Profile {
        name: "Ada".to_string(),
        age: 36,
        ratio: 0.5,
        birthday: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
        wake_up: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
        joined: Utc.with_ymd_and_hms(2019, 10, 12, 17, 57, 42).unwrap(),
        id: Uuid::parse_str("ad0677ab-bd1c-4383-9d45-e46c56bcc5c9").unwrap(),
        tags: vec!["admin".to_string(), "ops".to_string()],
        scores: HashMap::from([("chess".to_string(), 1200)]),
        nickname: Some("countess".to_string()),
        balance: BigDecimal::from_str("12.50").unwrap(),
        checksum: Fixed([1, 2, 3, 4]),
        severity: Severity::High,
        amount: Amount::Fraction(2.5),
        shape: Shape::Square,
        raw: ByteBuf::from(vec![0, 159, 255]),
    }
}

#[rstest]
#[case::binary(Encoding::Binary)]
#[case::json(Encoding::Json)]
fn records_round_trip(#[case] encoding: Encoding) -> anyhow::Result<()> {
    let codec = Profile::codec()?;
    let original = profile();
    let bytes = codec.serialize(&original, encoding)?;
    assert_eq!(codec.deserialize(&bytes, encoding)?, original);

    let empty = Profile {
        nickname: None,
        tags: Vec::new(),
        scores: HashMap::new(),
        amount: Amount::Whole(-3),
        ..original
    };
    let bytes = codec.serialize(&empty, encoding)?;
    assert_eq!(codec.deserialize(&bytes, encoding)?, empty);
    Ok(())
}

#[derive(AvroModel, Debug, PartialEq)]
struct Note {
    text: String,
    #[avro(default = None)]
    author: Option<String>,
    amount: Amount,
    severity: Severity,
}

#[test]
fn json_encoding_wraps_union_branches() -> anyhow::Result<()> {
    let note = Note {
        text: "hi".to_string(),
        author: Some("ann".to_string()),
        amount: Amount::Whole(3),
        severity: Severity::Low,
    };
    let bytes = note.serialize(Encoding::Json)?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(
        json,
        json!({
            "text": "hi",
            "author": {"string": "ann"},
            "amount": {"long": 3},
            "severity": "Low",
        })
    );

    let anonymous = br#"{"text": "hi", "author": null, "amount": {"double": 0.25}, "severity": "High"}"#;
    assert_eq!(
        Note::deserialize(anonymous, Encoding::Json)?,
        Note {
            text: "hi".to_string(),
            author: None,
            amount: Amount::Fraction(0.25),
            severity: Severity::High,
        }
    );
    Ok(())
}

#[test]
fn plain_json_uses_iso_strings() -> anyhow::Result<()> {
    let json = profile().to_json()?;
    assert_eq!(json["birthday"], json!("1990-05-01"));
    assert_eq!(json["id"], json!("ad0677ab-bd1c-4383-9d45-e46c56bcc5c9"));
    assert_eq!(json["nickname"], json!("countess"));
    assert_eq!(json["severity"], json!("High"));
    Ok(())
}

#[derive(AvroModel, Debug, PartialEq)]
#[avro(exclude(secret))]
struct Account {
    name: String,
    #[avro(default = 7)]
    secret: i64,
    #[avro(skip)]
    cache: Vec<u8>,
}

#[test]
fn excluded_and_skipped_fields_come_back_as_defaults() -> anyhow::Result<()> {
    let schema = Account::avro_schema()?;
    assert_eq!(schema["fields"], json!([{"name": "name", "type": "string"}]));

    let account = Account {
        name: "bob".to_string(),
        secret: 42,
        cache: vec![1, 2, 3],
    };
    let bytes = account.serialize(Encoding::Binary)?;
    assert_eq!(
        Account::deserialize(&bytes, Encoding::Binary)?,
        Account {
            name: "bob".to_string(),
            secret: 7,
            cache: Vec::new(),
        }
    );
    Ok(())
}

#[test]
fn loose_data_is_converted_like_encoding_does() -> anyhow::Result<()> {
    let datum = Datum::Record(RecordDatum::new("Account").with_field("name", "carol"));
    assert_eq!(
        Account::parse_obj(&datum)?,
        Account {
            name: "carol".to_string(),
            secret: 7,
            cache: Vec::new(),
        }
    );

    let datum = Datum::Record(RecordDatum::new("Account").with_field("name", 5i64));
    let err = Account::parse_obj(&datum).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
    Ok(())
}

#[derive(AvroModel, Debug, PartialEq)]
#[avro(name = "User")]
struct UserV1 {
    name: String,
}

#[derive(AvroModel, Debug, PartialEq)]
#[avro(name = "User")]
struct UserV2 {
    name: String,
    #[avro(default = 18)]
    age: i64,
}

#[rstest]
#[case::binary(Encoding::Binary)]
#[case::json(Encoding::Json)]
fn readers_fill_new_fields_from_defaults(#[case] encoding: Encoding) -> anyhow::Result<()> {
    let bytes = UserV1 {
        name: "dan".to_string(),
    }
    .serialize(encoding)?;
    let writer_schema = UserV1::avro_schema()?;
    assert_eq!(
        UserV2::deserialize_with_writer_schema(&bytes, encoding, &writer_schema)?,
        UserV2 {
            name: "dan".to_string(),
            age: 18,
        }
    );
    Ok(())
}

#[derive(AvroModel, Debug, PartialEq)]
#[avro(strict_unions)]
struct StrictPayment {
    amount: Amount,
}

#[derive(AvroModel, Debug, PartialEq)]
struct LenientPayment {
    amount: Amount,
}

#[test]
fn strict_unions_reject_ambiguous_values() -> anyhow::Result<()> {
    let bytes = LenientPayment {
        amount: Amount::Whole(5),
    }
    .serialize(Encoding::Binary)?;
    assert_eq!(
        LenientPayment::deserialize(&bytes, Encoding::Binary)?,
        LenientPayment {
            amount: Amount::Whole(5)
        }
    );

    let err = StrictPayment::deserialize(&bytes, Encoding::Binary).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);
    Ok(())
}

fn ip_encoder() -> CustomEncoder {
    CustomEncoder::new::<IpAddr>(TypeAnnotation::of::<String>(), |datum| match datum {
        Datum::Opaque(opaque) => opaque
            .downcast_ref::<IpAddr>()
            .map(|ip| Datum::String(ip.to_string()))
            .ok_or_else(|| "not an IP address".to_string()),
        other => Err(format!("not an IP address: {}", other.summary())),
    })
}

fn ip_hook() -> TypeHook {
    TypeHook::new::<IpAddr>(|datum| match datum {
        Datum::String(s) => s
            .parse::<IpAddr>()
            .map(|ip| Datum::Opaque(OpaqueDatum::new(ip)))
            .map_err(|e| e.to_string()),
        other => Err(format!("not an IP address: {}", other.summary())),
    })
}

#[derive(AvroModel, Debug, PartialEq)]
#[avro(custom_encoder = ip_encoder, type_hook = ip_hook)]
struct Connection {
    address: IpAddr,
}

#[rstest]
#[case::binary(Encoding::Binary)]
#[case::json(Encoding::Json)]
fn custom_encoders_write_opaque_types(#[case] encoding: Encoding) -> anyhow::Result<()> {
    assert_eq!(
        Connection::avro_schema()?["fields"],
        json!([{"name": "address", "type": "string"}])
    );
    let connection = Connection {
        address: IpAddr::from_str("10.0.0.1")?,
    };
    assert_eq!(
        connection.to_dict(),
        Datum::Record(
            RecordDatum::of::<Connection>("Connection")
                .with_field("address", Datum::Opaque(OpaqueDatum::new(connection.address)))
        )
    );
    let bytes = connection.serialize(encoding)?;
    assert_eq!(Connection::deserialize(&bytes, encoding)?, connection);
    Ok(())
}

#[test]
fn garbage_is_a_decoding_error() {
    let err = Profile::deserialize(&[0xff], Encoding::Binary).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);

    let err = Note::deserialize(b"{\"text\": 1}", Encoding::Json).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);
}

#[test]
fn datums_follow_declared_names() {
    let datum = Severity::High.to_datum();
    assert_eq!(datum, Datum::Enum("High".to_string()));
    assert_eq!(Severity::from_datum(datum).ok(), Some(Severity::High));
    assert_eq!(Shape::from_datum(Datum::String("circle".into())).ok(), Some(Shape::Circle));
    assert!(Shape::from_datum(Datum::String("triangle".into())).is_err());
}
