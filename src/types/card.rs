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
use serde::Deserializer;
use serde::Serialize;

use crate::types::id::CardId;
use crate::types::id::CollectionId;
use crate::types::memory::MemoryState;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    /// The collection this card belongs to.
    pub collection_id: CollectionId,
    /// Markdown text of the prompt.
    pub front: String,
    /// Markdown text of the answer.
    pub back: String,
    /// An optional reference to an external note, unique across cards.
    pub note_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub schedule: MemoryState,
}

impl Card {
    pub fn new(
        collection_id: CollectionId,
        front: impl Into<String>,
        back: impl Into<String>,
        note_id: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: CardId::random(),
            collection_id,
            front: front.into(),
            back: back.into(),
            note_id,
            created_at: now,
            updated_at: now,
            schedule: MemoryState::initial(now),
        }
    }

    /// Apply a content patch. Scheduling fields are untouched.
    pub fn apply(&mut self, patch: CardPatch, now: Timestamp) {
        if let Some(front) = patch.front {
            self.front = front;
        }
        if let Some(back) = patch.back {
            self.back = back;
        }
        if let Some(note_id) = patch.note_id {
            self.note_id = note_id;
        }
        if let Some(collection_id) = patch.collection_id {
            self.collection_id = collection_id;
        }
        self.updated_at = now;
    }
}

/// The content fields of a card that may be edited. A field that is absent
/// is left alone; `noteId: null` clears the note reference.
#[derive(Default, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    pub front: Option<String>,
    pub back: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub note_id: Option<Option<String>>,
    pub collection_id: Option<CollectionId>,
}

/// Distinguishes a field set to `null` from a missing one.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
