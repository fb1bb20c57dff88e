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

use serde::Deserialize;
use serde::Serialize;

use crate::types::card::present;
use crate::types::id::CollectionId;
use crate::types::timestamp::Timestamp;

/// A named group of cards.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Collection {
    /// Names and descriptions are trimmed; a blank description is dropped.
    pub fn new(name: &str, description: Option<&str>, now: Timestamp) -> Self {
        Self {
            id: CollectionId::random(),
            name: name.trim().to_string(),
            description: clean_description(description),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An edit to a collection. `description: null` clears the description.
#[derive(Default, Debug, Deserialize)]
pub struct CollectionPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

impl Collection {
    pub fn apply(&mut self, patch: CollectionPatch, now: Timestamp) {
        if let Some(name) = patch.name {
            let name = name.trim();
            if !name.is_empty() {
                self.name = name.to_string();
            }
        }
        if let Some(description) = patch.description {
            self.description = clean_description(description.as_deref());
        }
        self.updated_at = now;
    }
}

pub fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims() {
        let c = Collection::new("  Spanish ", Some("   "), Timestamp::now());
        assert_eq!(c.name, "Spanish");
        assert_eq!(c.description, None);
    }

    #[test]
    fn test_patch() -> crate::error::Fallible<()> {
        let now = Timestamp::now();
        let mut c = Collection::new("Rust", Some("lifetimes"), now);
        let patch: CollectionPatch = serde_json::from_str(r#"{"name": " Go "}"#)?;
        c.apply(patch, now);
        assert_eq!(c.name, "Go");
        assert_eq!(c.description.as_deref(), Some("lifetimes"));
        let patch: CollectionPatch = serde_json::from_str(r#"{"name": "", "description": null}"#)?;
        c.apply(patch, now);
        assert_eq!(c.name, "Go");
        assert_eq!(c.description, None);
        Ok(())
    }

    #[test]
    fn test_description_kept() {
        let c = Collection::new("Rust", Some(" borrowck "), Timestamp::now());
        assert_eq!(c.description.as_deref(), Some("borrowck"));
    }
}
