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

//! [`AvroType`] for the standard library and the ecosystem types the library understands.

use crate::{
    AvroResult, AvroType, Datum, FieldInfo, TypeAnnotation,
    datum::OpaqueDatum,
    error::Error,
    logical,
    types::{LogicalType, Primitive},
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_bytes::ByteBuf;
use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
    net::IpAddr,
    rc::Rc,
    str::FromStr,
    sync::Arc,
    time::Duration,
};
use uuid::Uuid;

fn mismatch<T>(expected: &str, datum: &Datum) -> Error {
    Error::Decode(
        std::any::type_name::<T>(),
        format!("expected {expected}, got {}", datum.summary()),
    )
}

macro_rules! impl_int {
    ($($ty:ty => $variant:ident, $primitive:ident, $wide:ty);* $(;)?) => {
        $(
            impl AvroType for $ty {
                fn annotation() -> TypeAnnotation {
                    TypeAnnotation::Primitive(Primitive::$primitive)
                }

                fn to_datum(&self) -> Datum {
                    Datum::$variant(<$wide>::from(*self))
                }

                fn from_datum(datum: Datum) -> AvroResult<Self> {
                    let value = match datum {
                        Datum::Int(v) => i64::from(v),
                        Datum::Long(v) => v,
                        ref other => return Err(mismatch::<Self>("an integer", other)),
                    };
                    <$ty>::try_from(value)
                        .map_err(|_| mismatch::<Self>(stringify!($ty), &Datum::Long(value)))
                }
            }
        )*
    };
}

impl_int!(
    i8 => Int, Int, i32;
    i16 => Int, Int, i32;
    i32 => Int, Int, i32;
    u8 => Int, Int, i32;
    u16 => Int, Int, i32;
    u32 => Long, Long, i64;
    i64 => Long, Long, i64;
);

impl AvroType for f32 {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Primitive(Primitive::Float)
    }

    fn to_datum(&self) -> Datum {
        Datum::Float(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Float(v) => Ok(v),
            Datum::Double(v) => Ok(v as f32),
            Datum::Int(v) => Ok(v as f32),
            Datum::Long(v) => Ok(v as f32),
            other => Err(mismatch::<Self>("a number", &other)),
        }
    }
}

impl AvroType for f64 {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Primitive(Primitive::Double)
    }

    fn to_datum(&self) -> Datum {
        Datum::Double(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Double(v) => Ok(v),
            Datum::Float(v) => Ok(f64::from(v)),
            Datum::Int(v) => Ok(f64::from(v)),
            Datum::Long(v) => Ok(v as f64),
            other => Err(mismatch::<Self>("a number", &other)),
        }
    }
}

impl AvroType for bool {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Primitive(Primitive::Boolean)
    }

    fn to_datum(&self) -> Datum {
        Datum::Boolean(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Boolean(v) => Ok(v),
            other => Err(mismatch::<Self>("a boolean", &other)),
        }
    }
}

impl AvroType for String {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Primitive(Primitive::String)
    }

    fn to_datum(&self) -> Datum {
        Datum::String(self.clone())
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::String(v) | Datum::Enum(v) => Ok(v),
            other => Err(mismatch::<Self>("a string", &other)),
        }
    }
}

impl AvroType for ByteBuf {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Primitive(Primitive::Bytes)
    }

    fn to_datum(&self) -> Datum {
        Datum::Bytes(self.to_vec())
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Bytes(v) | Datum::Fixed(v) => Ok(ByteBuf::from(v)),
            other => Err(mismatch::<Self>("bytes", &other)),
        }
    }
}

impl AvroType for () {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Null
    }

    fn to_datum(&self) -> Datum {
        Datum::Null
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Null => Ok(()),
            other => Err(mismatch::<Self>("null", &other)),
        }
    }
}

impl<T: AvroType> AvroType for Option<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::optional(T::annotation())
    }

    fn to_datum(&self) -> Datum {
        match self {
            Some(value) => value.to_datum(),
            None => Datum::Null,
        }
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Null => Ok(None),
            other => T::from_datum(other).map(Some),
        }
    }
}

macro_rules! impl_transparent {
    ($($wrapper:ident),*) => {
        $(
            impl<T: AvroType> AvroType for $wrapper<T> {
                fn annotation() -> TypeAnnotation {
                    T::annotation()
                }

                fn to_datum(&self) -> Datum {
                    T::to_datum(self)
                }

                fn from_datum(datum: Datum) -> AvroResult<Self> {
                    T::from_datum(datum).map($wrapper::new)
                }
            }
        )*
    };
}

impl_transparent!(Box, Rc, Arc);

impl<T: AvroType> AvroType for Vec<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::array(T::annotation())
    }

    fn to_datum(&self) -> Datum {
        Datum::Array(self.iter().map(T::to_datum).collect())
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Array(items) => items.into_iter().map(T::from_datum).collect(),
            other => Err(mismatch::<Self>("an array", &other)),
        }
    }
}

/// The map key a key datum is written under.
fn map_key(key: Datum) -> String {
    match key {
        Datum::String(s) | Datum::Enum(s) => s,
        // Only string keys render, anything else is rejected before encoding.
        other => other.summary(),
    }
}

impl<K, V> AvroType for HashMap<K, V>
where
    K: AvroType + Eq + Hash,
    V: AvroType,
{
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::map(K::annotation(), V::annotation())
    }

    fn to_datum(&self) -> Datum {
        Datum::Map(
            self.iter()
                .map(|(k, v)| (map_key(k.to_datum()), v.to_datum()))
                .collect(),
        )
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_datum(Datum::String(k))?, V::from_datum(v)?)))
                .collect(),
            other => Err(mismatch::<Self>("a map", &other)),
        }
    }
}

impl<K, V> AvroType for BTreeMap<K, V>
where
    K: AvroType + Ord,
    V: AvroType,
{
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::map(K::annotation(), V::annotation())
    }

    fn to_datum(&self) -> Datum {
        Datum::Map(
            self.iter()
                .map(|(k, v)| (map_key(k.to_datum()), v.to_datum()))
                .collect(),
        )
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_datum(Datum::String(k))?, V::from_datum(v)?)))
                .collect(),
            other => Err(mismatch::<Self>("a map", &other)),
        }
    }
}

impl AvroType for NaiveDate {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Logical(LogicalType::Date)
    }

    fn to_datum(&self) -> Datum {
        Datum::Date(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Date(v) => Ok(v),
            Datum::DateTime(v) => Ok(v.date_naive()),
            Datum::Int(days) => {
                logical::date_from_days(days).ok_or_else(|| mismatch::<Self>("a date", &datum))
            }
            Datum::String(ref s) => {
                logical::parse_date(s).ok_or_else(|| mismatch::<Self>("an ISO date", &datum))
            }
            other => Err(mismatch::<Self>("a date", &other)),
        }
    }
}

impl AvroType for NaiveTime {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Logical(LogicalType::TimeMillis)
    }

    fn to_datum(&self) -> Datum {
        Datum::Time(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Time(v) => Ok(v),
            Datum::String(ref s) => {
                logical::parse_time(s).ok_or_else(|| mismatch::<Self>("an ISO time", &datum))
            }
            other => Err(mismatch::<Self>("a time", &other)),
        }
    }
}

impl AvroType for DateTime<Utc> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Logical(LogicalType::TimestampMillis)
    }

    fn to_datum(&self) -> Datum {
        Datum::DateTime(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::DateTime(v) => Ok(v),
            Datum::String(ref s) => logical::parse_datetime(s)
                .ok_or_else(|| mismatch::<Self>("an ISO datetime", &datum)),
            other => Err(mismatch::<Self>("a datetime", &other)),
        }
    }
}

/// Naive datetimes are interpreted as UTC.
impl AvroType for NaiveDateTime {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Logical(LogicalType::TimestampMillis)
    }

    fn to_datum(&self) -> Datum {
        Datum::DateTime(self.and_utc())
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        DateTime::<Utc>::from_datum(datum).map(|datetime| datetime.naive_utc())
    }
}

impl AvroType for Uuid {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Logical(LogicalType::Uuid)
    }

    fn to_datum(&self) -> Datum {
        Datum::Uuid(*self)
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Uuid(v) => Ok(v),
            Datum::String(ref s) => {
                Uuid::parse_str(s).map_err(|_| mismatch::<Self>("a UUID", &datum))
            }
            other => Err(mismatch::<Self>("a UUID", &other)),
        }
    }
}

/// Needs a `decimal(precision, scale)` field info.
impl AvroType for BigDecimal {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Decimal
    }

    fn to_datum(&self) -> Datum {
        Datum::Decimal(self.clone())
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Decimal(v) => Ok(v),
            Datum::Int(v) => Ok(BigDecimal::from(v)),
            Datum::Long(v) => Ok(BigDecimal::from(v)),
            Datum::String(ref s) => {
                BigDecimal::from_str(s).map_err(|_| mismatch::<Self>("a decimal", &datum))
            }
            other => Err(mismatch::<Self>("a decimal", &other)),
        }
    }
}

/// A fixed-size byte array.
///
/// The size is part of the type; namespace and aliases can be given with a
/// `fixed(...)` field info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixed<const N: usize>(pub [u8; N]);

impl<const N: usize> Default for Fixed<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> From<[u8; N]> for Fixed<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> AvroType for Fixed<N> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Fixed.annotated(FieldInfo::fixed(N))
    }

    fn to_datum(&self) -> Datum {
        Datum::Fixed(self.0.to_vec())
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Fixed(ref v) | Datum::Bytes(ref v) => <[u8; N]>::try_from(v.as_slice())
                .map(Self)
                .map_err(|_| mismatch::<Self>(&format!("{N} bytes"), &datum)),
            other => Err(mismatch::<Self>("fixed bytes", &other)),
        }
    }
}

/// Usable through a custom encoder only, e.g. one writing the address as a string.
impl AvroType for IpAddr {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Opaque {
            type_name: std::any::type_name::<IpAddr>(),
        }
    }

    fn to_datum(&self) -> Datum {
        Datum::Opaque(OpaqueDatum::new(*self))
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Opaque(ref opaque) => opaque
                .downcast_ref::<IpAddr>()
                .copied()
                .ok_or_else(|| mismatch::<Self>("an IP address", &datum)),
            Datum::String(ref s) => {
                IpAddr::from_str(s).map_err(|_| mismatch::<Self>("an IP address", &datum))
            }
            other => Err(mismatch::<Self>("an IP address", &other)),
        }
    }
}

/// Usable through a custom encoder only.
impl AvroType for Duration {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::Opaque {
            type_name: std::any::type_name::<Duration>(),
        }
    }

    fn to_datum(&self) -> Datum {
        Datum::Opaque(OpaqueDatum::new(*self))
    }

    fn from_datum(datum: Datum) -> AvroResult<Self> {
        match datum {
            Datum::Opaque(ref opaque) => opaque
                .downcast_ref::<Duration>()
                .copied()
                .ok_or_else(|| mismatch::<Self>("a duration", &datum)),
            Datum::Double(seconds) => Duration::try_from_secs_f64(seconds)
                .map_err(|_| mismatch::<Self>("a duration", &datum)),
            other => Err(mismatch::<Self>("a duration", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integers_narrow_with_range_checks() -> anyhow::Result<()> {
        assert_eq!(i8::from_datum(Datum::Long(-5))?, -5);
        assert!(u8::from_datum(Datum::Int(300)).is_err());
        assert_eq!(u32::MAX.to_datum(), Datum::Long(i64::from(u32::MAX)));
        assert_eq!(7_u16.to_datum(), Datum::Int(7));
        Ok(())
    }

    #[test]
    fn options_are_nullable_unions() -> anyhow::Result<()> {
        assert_eq!(
            Option::<i64>::annotation(),
            TypeAnnotation::Union(vec![
                TypeAnnotation::Primitive(Primitive::Long),
                TypeAnnotation::Null
            ])
        );
        assert_eq!(Option::<i64>::from_datum(Datum::Null)?, None);
        assert_eq!(Option::<i64>::from_datum(Datum::Long(1))?, Some(1));
        Ok(())
    }

    #[test]
    fn maps_use_string_keys() -> anyhow::Result<()> {
        let map = HashMap::from([("a".to_string(), 1_i64)]);
        let datum = map.to_datum();
        assert_eq!(
            datum,
            Datum::Map(BTreeMap::from([("a".to_string(), Datum::Long(1))]))
        );
        assert_eq!(HashMap::<String, i64>::from_datum(datum)?, map);
        assert_eq!(
            BTreeMap::<i64, String>::annotation(),
            TypeAnnotation::map(
                TypeAnnotation::Primitive(Primitive::Long),
                TypeAnnotation::Primitive(Primitive::String)
            )
        );
        Ok(())
    }

    #[test]
    fn logical_types_accept_their_string_forms() -> anyhow::Result<()> {
        assert_eq!(
            NaiveDate::from_datum(Datum::String("2019-10-12".into()))?,
            NaiveDate::from_ymd_opt(2019, 10, 12).unwrap()
        );
        assert_eq!(
            Uuid::from_datum(Datum::String(
                "ad0677ab-bd1c-4383-9d45-e46c56bcc5c9".into()
            ))?
            .to_string(),
            "ad0677ab-bd1c-4383-9d45-e46c56bcc5c9"
        );
        assert!(Uuid::from_datum(Datum::String("nope".into())).is_err());
        Ok(())
    }

    #[test]
    fn fixed_checks_its_size() -> anyhow::Result<()> {
        assert_eq!(
            Fixed::<2>::annotation(),
            TypeAnnotation::Fixed.annotated(FieldInfo::fixed(2))
        );
        assert_eq!(Fixed::<2>::from_datum(Datum::Fixed(vec![1, 2]))?, Fixed([1, 2]));
        assert!(Fixed::<2>::from_datum(Datum::Fixed(vec![1, 2, 3])).is_err());
        Ok(())
    }

    #[test]
    fn opaque_types_round_trip_through_their_datum() -> anyhow::Result<()> {
        let ip: IpAddr = "10.0.0.1".parse()?;
        assert_eq!(IpAddr::from_datum(ip.to_datum())?, ip);
        assert_eq!(IpAddr::from_datum(Datum::String("10.0.0.1".into()))?, ip);
        assert!(matches!(IpAddr::annotation(), TypeAnnotation::Opaque { .. }));
        Ok(())
    }
}
