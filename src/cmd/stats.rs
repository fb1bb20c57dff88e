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

use clap::ValueEnum;
use serde::Serialize;

use crate::data_dir::DataDir;
use crate::db::Database;
use crate::error::Fallible;
use crate::types::id::CollectionId;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(directory: Option<String>, format: StatsFormat) -> Fallible<()> {
    let data = DataDir::open(directory)?;
    let stats = get_stats(&data.db, Timestamp::now())?;
    match format {
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{stats_json}");
        }
    }
    Ok(())
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    total_collections: usize,
    total_cards: usize,
    due_cards: usize,
    new_cards: usize,
    collections: Vec<CollectionStats>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    id: CollectionId,
    name: String,
    total_cards: usize,
    due_cards: usize,
    new_cards: usize,
}

/// Card counts as of `now`, overall and per collection.
pub fn get_stats(db: &Database, now: Timestamp) -> Fallible<Stats> {
    let collections = db.collections()?;
    let cards = db.cards(None)?;
    let mut stats = Stats {
        total_collections: collections.len(),
        total_cards: cards.len(),
        due_cards: 0,
        new_cards: 0,
        collections: Vec::with_capacity(collections.len()),
    };
    for (collection, total_cards) in collections {
        let mut summary = CollectionStats {
            id: collection.id,
            name: collection.name,
            total_cards,
            due_cards: 0,
            new_cards: 0,
        };
        for card in cards.iter().filter(|c| c.collection_id == collection.id) {
            if card.schedule.is_due(now) {
                summary.due_cards += 1;
            }
            if card.schedule.is_new() {
                summary.new_cards += 1;
            }
        }
        stats.due_cards += summary.due_cards;
        stats.new_cards += summary.new_cards;
        stats.collections.push(summary);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsrs::Rating;
    use crate::scheduler::Parameters;
    use crate::scheduler::commit;
    use crate::types::card::Card;
    use crate::types::collection::Collection;

    #[test]
    fn test_stats() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let now = Timestamp::parse("2025-06-01T08:00:00Z")?;
        let spanish = Collection::new("Spanish", None, now);
        let empty = Collection::new("Empty", None, now);
        db.insert_collection(&spanish)?;
        db.insert_collection(&empty)?;
        let a = Card::new(spanish.id, "a", "a", None, now);
        let b = Card::new(spanish.id, "b", "b", None, now);
        db.insert_card(&a)?;
        db.insert_card(&b)?;
        let params = Parameters::default();
        db.review_card(a.id, now, |s| commit(&params, s, Rating::Good, now))?;

        let stats = get_stats(&db, now)?;
        assert_eq!(stats.total_collections, 2);
        assert_eq!(stats.total_cards, 2);
        assert_eq!(stats.due_cards, 1);
        assert_eq!(stats.new_cards, 1);
        let json = serde_json::to_value(&stats)?;
        assert_eq!(json["collections"].as_array().map(Vec::len), Some(2));
        let spanish_stats = json["collections"]
            .as_array()
            .and_then(|a| a.iter().find(|c| c["name"] == "Spanish"))
            .cloned()
            .unwrap_or_default();
        assert_eq!(spanish_stats["totalCards"], 2);
        assert_eq!(spanish_stats["dueCards"], 1);
        assert_eq!(spanish_stats["newCards"], 1);
        Ok(())
    }
}
