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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Fallible;

/// A random identifier for a card or a collection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id {
    inner: Uuid,
}

pub type CardId = Id;

pub type CollectionId = Id;

impl Id {
    pub fn random() -> Self {
        Self {
            inner: Uuid::new_v4(),
        }
    }

    pub fn parse(s: &str) -> Fallible<Self> {
        let inner = Uuid::parse_str(s)?;
        Ok(Self { inner })
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner.hyphenated())
    }
}

impl ToSql for Id {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Id {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Id::parse(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_string() -> Fallible<()> {
        let id = Id::random();
        assert_eq!(Id::parse(&id.to_string())?, id);
        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert!(Id::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(Id::random(), Id::random());
    }
}
