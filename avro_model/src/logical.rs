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

//! Conversions between the rich logical values and their wire representation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};

fn epoch_date() -> NaiveDate {
    // 1970-01-01
    NaiveDate::default()
}

pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(epoch_date()).num_days() as i32
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    epoch_date().checked_add_signed(TimeDelta::try_days(i64::from(days))?)
}

pub(crate) fn time_to_millis(time: NaiveTime) -> i32 {
    (time.num_seconds_from_midnight() * 1_000 + time.nanosecond() / 1_000_000) as i32
}

pub(crate) fn time_to_micros(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000 + i64::from(time.nanosecond() / 1_000)
}

pub(crate) fn time_from_millis(millis: i32) -> Option<NaiveTime> {
    let millis = u32::try_from(millis).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(millis / 1_000, (millis % 1_000) * 1_000_000)
}

pub(crate) fn time_from_micros(micros: i64) -> Option<NaiveTime> {
    let micros = u64::try_from(micros).ok()?;
    let secs = u32::try_from(micros / 1_000_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, (micros % 1_000_000) as u32 * 1_000)
}

pub(crate) fn datetime_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

pub(crate) fn datetime_from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

pub(crate) fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Parses an RFC 3339 datetime, or a naive one which is taken as UTC.
pub(crate) fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Bytes as the Avro JSON encoding writes them: one code point per byte.
pub(crate) fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// The reverse of [`latin1_string`]. `None` when a code point does not fit in a byte.
pub(crate) fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(c).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dates_count_days_since_epoch() {
        let birthday = NaiveDate::from_ymd_opt(2019, 10, 12).unwrap();
        assert_eq!(days_since_epoch(birthday), 18181);
        assert_eq!(date_from_days(18181), Some(birthday));
        assert_eq!(date_from_days(-1), NaiveDate::from_ymd_opt(1969, 12, 31));
    }

    #[test]
    fn times_count_since_midnight() {
        let meeting = NaiveTime::from_hms_opt(17, 57, 42).unwrap();
        assert_eq!(time_to_millis(meeting), 64_662_000);
        assert_eq!(time_to_micros(meeting), 64_662_000_000);
        assert_eq!(time_from_millis(64_662_000), Some(meeting));
        assert_eq!(time_from_micros(64_662_000_000), Some(meeting));
        assert_eq!(time_from_millis(-1), None);

        let precise = NaiveTime::from_hms_micro_opt(1, 2, 3, 456_789).unwrap();
        assert_eq!(time_from_micros(time_to_micros(precise)), Some(precise));
    }

    #[test]
    fn datetimes_parse_naive_as_utc() {
        let release = parse_datetime("2019-10-12T17:57:42Z").unwrap();
        assert_eq!(release.timestamp_millis(), 1_570_903_062_000);
        assert_eq!(parse_datetime("2019-10-12T17:57:42"), Some(release));
        assert_eq!(parse_datetime("2019-10-12T19:57:42+02:00"), Some(release));
        assert_eq!(datetime_from_millis(1_570_903_062_000), Some(release));
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn latin1() {
        let bytes = [0x00, 0x41, 0xE9, 0xFF];
        let text = latin1_string(&bytes);
        assert_eq!(text, "\u{0}A\u{e9}\u{ff}");
        assert_eq!(latin1_bytes(&text), Some(bytes.to_vec()));
        assert_eq!(latin1_bytes("\u{100}"), None);
    }
}
