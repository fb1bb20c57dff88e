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

use serde::Serialize;

use crate::data_dir::DataDir;
use crate::db::Database;
use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::collection::Collection;

pub fn export_data(directory: Option<String>) -> Fallible<()> {
    let data = DataDir::open(directory)?;
    let export: Export = get_export(&data.db)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    collections: Vec<Collection>,
    cards: Vec<Card>,
}

fn get_export(db: &Database) -> Fallible<Export> {
    let collections: Vec<Collection> = db
        .collections()?
        .into_iter()
        .map(|(collection, _)| collection)
        .collect();
    let cards: Vec<Card> = db.cards(None)?;
    Ok(Export { collections, cards })
}
