// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Duration;
use chrono::SecondsFormat;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// An instant in UTC.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    pub fn parse(s: &str) -> Fallible<Self> {
        let ts = DateTime::parse_from_rfc3339(s)
            .map_err(|e| ErrorReport::new(format!("invalid timestamp '{s}': {e}")))?;
        Ok(Self(ts.with_timezone(&Utc)))
    }

    /// RFC 3339 with millisecond precision and a `Z` suffix. Strings in
    /// this format sort in chronological order.
    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn plus(self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    /// The signed duration from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> Duration {
        self.0.signed_duration_since(earlier.0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_rfc3339()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Timestamp::parse(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Timestamp::parse(&string).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format() {
        let ts = Timestamp::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
        assert_eq!(ts.to_string(), "2025-03-01T09:30:00.000Z");
    }

    #[test]
    fn test_parse_offset() -> Fallible<()> {
        let ts = Timestamp::parse("2025-03-01T10:30:00+01:00")?;
        let expected = Timestamp::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
        assert_eq!(ts, expected);
        Ok(())
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let t0 = Timestamp::new(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let t1 = t0.plus(Duration::minutes(10));
        assert!(t1 > t0);
        assert_eq!(t1.since(t0), Duration::minutes(10));
        assert_eq!(t0.since(t1), Duration::minutes(-10));
    }
}
