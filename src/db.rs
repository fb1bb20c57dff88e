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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use rusqlite::params;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::Difficulty;
use crate::fsrs::Stability;
use crate::types::card::Card;
use crate::types::card::CardPatch;
use crate::types::collection::Collection;
use crate::types::collection::CollectionPatch;
use crate::types::id::CardId;
use crate::types::id::CollectionId;
use crate::types::memory::Memory;
use crate::types::memory::MemoryState;
use crate::types::memory::Phase;
use crate::types::timestamp::Timestamp;

const CARD_COLUMNS: &str = "card_id, collection_id, front, back, note_id, created_at, updated_at, state, learning_step, stability, difficulty, due, last_review, reps, lapses, elapsed_days, scheduled_days";

const COLLECTION_COLUMNS: &str = "collection_id, name, description, created_at, updated_at";

/// The card store. Every method takes the connection lock for its whole
/// duration, and every write happens inside a transaction.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        log::debug!("Opening database: {database_path}");
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    // Collections.

    /// All collections, oldest first, with the number of cards in each.
    pub fn collections(&self) -> Fallible<Vec<(Collection, usize)>> {
        let conn = self.acquire()?;
        let sql = "select co.collection_id, co.name, co.description, co.created_at, co.updated_at, count(ca.card_id) from collections co left outer join cards ca on ca.collection_id = co.collection_id group by co.collection_id order by co.created_at, co.name;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut collections = Vec::new();
        while let Some(row) = rows.next()? {
            let collection = collection_from_row(row)?;
            let count: i64 = row.get(5)?;
            collections.push((collection, usize::try_from(count)?));
        }
        Ok(collections)
    }

    pub fn get_collection(&self, id: CollectionId) -> Fallible<Option<Collection>> {
        let conn = self.acquire()?;
        select_collection(&conn, "collection_id", &id.to_string())
    }

    pub fn collection_by_name(&self, name: &str) -> Fallible<Option<Collection>> {
        let conn = self.acquire()?;
        select_collection(&conn, "name", name)
    }

    pub fn insert_collection(&self, collection: &Collection) -> Fallible<()> {
        log::debug!("Adding collection: {}", collection.id);
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let sql = format!("insert into collections ({COLLECTION_COLUMNS}) values (?, ?, ?, ?, ?);");
        tx.execute(
            &sql,
            params![
                collection.id,
                collection.name,
                collection.description,
                collection.created_at,
                collection.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Edit a collection. Returns `None` if it does not exist.
    pub fn update_collection(
        &self,
        id: CollectionId,
        patch: CollectionPatch,
        now: Timestamp,
    ) -> Fallible<Option<Collection>> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let Some(mut collection) = select_collection(&tx, "collection_id", &id.to_string())?
        else {
            return Ok(None);
        };
        collection.apply(patch, now);
        let sql = "update collections set name = ?, description = ?, updated_at = ? where collection_id = ?;";
        tx.execute(
            sql,
            params![
                collection.name,
                collection.description,
                collection.updated_at,
                collection.id,
            ],
        )?;
        tx.commit()?;
        Ok(Some(collection))
    }

    /// Delete a collection and all of its cards. Returns whether it existed.
    pub fn delete_collection(&self, id: CollectionId) -> Fallible<bool> {
        log::debug!("Deleting collection: {id}");
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let n = tx.execute("delete from collections where collection_id = ?;", [id])?;
        tx.commit()?;
        Ok(n > 0)
    }

    // Cards.

    /// All cards, oldest first, optionally restricted to one collection.
    pub fn cards(&self, collection_id: Option<CollectionId>) -> Fallible<Vec<Card>> {
        let conn = self.acquire()?;
        let mut cards = Vec::new();
        match collection_id {
            Some(collection_id) => {
                let sql = format!(
                    "select {CARD_COLUMNS} from cards where collection_id = ? order by created_at, card_id;"
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query([collection_id])?;
                while let Some(row) = rows.next()? {
                    cards.push(card_from_row(row)?);
                }
            }
            None => {
                let sql = format!("select {CARD_COLUMNS} from cards order by created_at, card_id;");
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    cards.push(card_from_row(row)?);
                }
            }
        }
        Ok(cards)
    }

    /// Cards whose due date has passed, most overdue first.
    pub fn due_cards(
        &self,
        now: Timestamp,
        collection_id: Option<CollectionId>,
    ) -> Fallible<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .cards(collection_id)?
            .into_iter()
            .filter(|card| card.schedule.is_due(now))
            .collect();
        cards.sort_by_key(|card| card.schedule.due);
        Ok(cards)
    }

    /// Cards that have never been reviewed.
    pub fn new_cards(&self, collection_id: Option<CollectionId>) -> Fallible<Vec<Card>> {
        Ok(self
            .cards(collection_id)?
            .into_iter()
            .filter(|card| card.schedule.is_new())
            .collect())
    }

    pub fn get_card(&self, id: CardId) -> Fallible<Option<Card>> {
        let conn = self.acquire()?;
        select_card(&conn, "card_id", &id.to_string())
    }

    pub fn card_by_note_id(&self, note_id: &str) -> Fallible<Option<Card>> {
        let conn = self.acquire()?;
        select_card(&conn, "note_id", note_id)
    }

    /// Insert a new card. Returns `false` without inserting if another card
    /// already has the same note id.
    pub fn insert_card(&self, card: &Card) -> Fallible<bool> {
        log::debug!("Adding card: {}", card.id);
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        if let Some(note_id) = &card.note_id {
            if select_card(&tx, "note_id", note_id)?.is_some() {
                return Ok(false);
            }
        }
        let sql = format!(
            "insert into cards ({CARD_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        let s = &card.schedule;
        let step = step_column(&s.phase)?;
        tx.execute(
            &sql,
            params![
                card.id,
                card.collection_id,
                card.front,
                card.back,
                card.note_id,
                card.created_at,
                card.updated_at,
                s.phase.as_str(),
                step,
                s.stability(),
                s.difficulty(),
                s.due,
                s.last_review,
                s.reps,
                s.lapses,
                s.elapsed_days,
                s.scheduled_days,
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Edit a card's content. Returns `None` if it does not exist.
    pub fn update_card(
        &self,
        id: CardId,
        patch: CardPatch,
        now: Timestamp,
    ) -> Fallible<Option<Card>> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let Some(mut card) = select_card(&tx, "card_id", &id.to_string())? else {
            return Ok(None);
        };
        card.apply(patch, now);
        write_card(&tx, &card)?;
        tx.commit()?;
        Ok(Some(card))
    }

    /// Replace a card's scheduling state with `f` applied to the current
    /// one. The read and the write happen in one transaction, so concurrent
    /// reviews of the same card are serialized. Returns `None` if the card
    /// does not exist.
    pub fn review_card<F>(&self, id: CardId, now: Timestamp, f: F) -> Fallible<Option<Card>>
    where
        F: FnOnce(&MemoryState) -> MemoryState,
    {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let Some(mut card) = select_card(&tx, "card_id", &id.to_string())? else {
            return Ok(None);
        };
        card.schedule = f(&card.schedule);
        card.updated_at = now;
        write_card(&tx, &card)?;
        tx.commit()?;
        Ok(Some(card))
    }

    /// Delete a card. Returns whether it existed.
    pub fn delete_card(&self, id: CardId) -> Fallible<bool> {
        log::debug!("Deleting card: {id}");
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let n = tx.execute("delete from cards where card_id = ?;", [id])?;
        tx.commit()?;
        Ok(n > 0)
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned"))
    }
}

/// Look up a single collection by a unique column.
fn select_collection(conn: &Connection, column: &str, value: &str) -> Fallible<Option<Collection>> {
    let sql = format!("select {COLLECTION_COLUMNS} from collections where {column} = ?;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([value])?;
    match rows.next()? {
        Some(row) => Ok(Some(collection_from_row(row)?)),
        None => Ok(None),
    }
}

/// Look up a single card by a unique column.
fn select_card(conn: &Connection, column: &str, value: &str) -> Fallible<Option<Card>> {
    let sql = format!("select {CARD_COLUMNS} from cards where {column} = ?;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([value])?;
    match rows.next()? {
        Some(row) => Ok(Some(card_from_row(row)?)),
        None => Ok(None),
    }
}

fn collection_from_row(row: &Row) -> Fallible<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn card_from_row(row: &Row) -> Fallible<Card> {
    let state: String = row.get(7)?;
    let step: Option<i64> = row.get(8)?;
    let step: Option<usize> = step.map(usize::try_from).transpose()?;
    let stability: Option<Stability> = row.get(9)?;
    let difficulty: Option<Difficulty> = row.get(10)?;
    let memory = match (stability, difficulty) {
        (Some(stability), Some(difficulty)) => Some(Memory {
            stability,
            difficulty,
        }),
        _ => None,
    };
    Ok(Card {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        note_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        schedule: MemoryState {
            phase: Phase::from_parts(&state, step)?,
            memory,
            due: row.get(11)?,
            last_review: row.get(12)?,
            reps: row.get(13)?,
            lapses: row.get(14)?,
            elapsed_days: row.get(15)?,
            scheduled_days: row.get(16)?,
        },
    })
}

fn step_column(phase: &Phase) -> Fallible<Option<i64>> {
    Ok(phase.step().map(i64::try_from).transpose()?)
}

/// Overwrite every mutable column of an existing card.
fn write_card(tx: &Transaction, card: &Card) -> Fallible<()> {
    let sql = "update cards set collection_id = ?, front = ?, back = ?, note_id = ?, updated_at = ?, state = ?, learning_step = ?, stability = ?, difficulty = ?, due = ?, last_review = ?, reps = ?, lapses = ?, elapsed_days = ?, scheduled_days = ? where card_id = ?;";
    let s = &card.schedule;
    let step = step_column(&s.phase)?;
    tx.execute(
        sql,
        params![
            card.collection_id,
            card.front,
            card.back,
            card.note_id,
            card.updated_at,
            s.phase.as_str(),
            step,
            s.stability(),
            s.difficulty(),
            s.due,
            s.last_review,
            s.reps,
            s.lapses,
            s.elapsed_days,
            s.scheduled_days,
            card.id,
        ],
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
