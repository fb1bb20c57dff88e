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

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::Difficulty;
use crate::fsrs::Stability;
use crate::types::timestamp::Timestamp;

/// The scheduling phase of a card. The step index into the learning or
/// relearning ladder only exists in the phases that have a ladder.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Never reviewed.
    New,
    /// Climbing the learning ladder.
    Learning { step: usize },
    /// Scheduled in days by the memory model.
    Review,
    /// Forgotten while in review, climbing the relearning ladder.
    Relearning { step: usize },
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::New => "new",
            Phase::Learning { .. } => "learning",
            Phase::Review => "review",
            Phase::Relearning { .. } => "relearning",
        }
    }

    /// The numeric state code used on the wire: 0 new, 1 learning, 2 review,
    /// 3 relearning.
    pub fn code(&self) -> u8 {
        match self {
            Phase::New => 0,
            Phase::Learning { .. } => 1,
            Phase::Review => 2,
            Phase::Relearning { .. } => 3,
        }
    }

    pub fn step(&self) -> Option<usize> {
        match self {
            Phase::Learning { step } | Phase::Relearning { step } => Some(*step),
            Phase::New | Phase::Review => None,
        }
    }

    /// Rebuild a phase from its stored name and step column. A missing step
    /// in a ladder phase means the first step.
    pub fn from_parts(name: &str, step: Option<usize>) -> Fallible<Self> {
        match name {
            "new" => Ok(Phase::New),
            "learning" => Ok(Phase::Learning {
                step: step.unwrap_or(0),
            }),
            "review" => Ok(Phase::Review),
            "relearning" => Ok(Phase::Relearning {
                step: step.unwrap_or(0),
            }),
            _ => fail(format!("Invalid card state: {name}")),
        }
    }
}

/// The two continuous quantities of the memory model.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Memory {
    pub stability: Stability,
    pub difficulty: Difficulty,
}

/// A card's scheduling state.
#[derive(Clone, PartialEq, Debug)]
pub struct MemoryState {
    pub phase: Phase,
    /// Absent until the first review.
    pub memory: Option<Memory>,
    /// When the card should next be shown.
    pub due: Timestamp,
    /// When the card was last reviewed.
    pub last_review: Option<Timestamp>,
    /// The number of committed reviews.
    pub reps: u32,
    /// The number of committed `Again` ratings.
    pub lapses: u32,
    /// Whole days between the previous review and the latest one.
    pub elapsed_days: u32,
    /// The interval in days chosen by the latest review. Zero when the
    /// latest review scheduled a ladder step.
    pub scheduled_days: u32,
}

impl MemoryState {
    /// The state of a freshly created card: new, and due immediately.
    pub fn initial(now: Timestamp) -> Self {
        Self {
            phase: Phase::New,
            memory: None,
            due: now,
            last_review: None,
            reps: 0,
            lapses: 0,
            elapsed_days: 0,
            scheduled_days: 0,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due <= now
    }

    pub fn is_new(&self) -> bool {
        self.reps == 0
    }

    pub fn stability(&self) -> Option<Stability> {
        self.memory.map(|m| m.stability)
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.memory.map(|m| m.difficulty)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemoryStateExport {
    state: u8,
    learning_step: Option<usize>,
    stability: Option<Stability>,
    difficulty: Option<Difficulty>,
    due: Timestamp,
    last_review: Option<Timestamp>,
    reps: u32,
    lapses: u32,
    elapsed_days: u32,
    scheduled_days: u32,
}

impl Serialize for MemoryState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        MemoryStateExport {
            state: self.phase.code(),
            learning_step: self.phase.step(),
            stability: self.stability(),
            difficulty: self.difficulty(),
            due: self.due,
            last_review: self.last_review,
            reps: self.reps,
            lapses: self.lapses,
            elapsed_days: self.elapsed_days,
            scheduled_days: self.scheduled_days,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_initial() {
        let now = Timestamp::now();
        let state = MemoryState::initial(now);
        assert_eq!(state.phase, Phase::New);
        assert_eq!(state.reps, 0);
        assert_eq!(state.lapses, 0);
        assert!(state.memory.is_none());
        assert!(state.last_review.is_none());
        assert!(state.is_due(now));
        assert!(state.is_new());
    }

    #[test]
    fn test_is_due() {
        let now = Timestamp::now();
        let mut state = MemoryState::initial(now);
        state.due = now.plus(Duration::minutes(1));
        assert!(!state.is_due(now));
        assert!(state.is_due(now.plus(Duration::minutes(1))));
        assert!(state.is_due(now.plus(Duration::days(3))));
    }

    #[test]
    fn test_phase_round_trip_through_parts() -> Fallible<()> {
        let phases = [
            Phase::New,
            Phase::Learning { step: 1 },
            Phase::Review,
            Phase::Relearning { step: 0 },
        ];
        for phase in phases {
            assert_eq!(Phase::from_parts(phase.as_str(), phase.step())?, phase);
        }
        assert!(Phase::from_parts("graduated", None).is_err());
        let codes: Vec<u8> = phases.iter().map(Phase::code).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_serialize_flat() -> Fallible<()> {
        let now = Timestamp::parse("2025-01-01T00:00:00Z")?;
        let state = MemoryState::initial(now);
        let json = serde_json::to_value(&state)?;
        assert_eq!(json["state"], 0);
        assert_eq!(json["due"], "2025-01-01T00:00:00.000Z");
        assert!(json["stability"].is_null());
        assert!(json["learningStep"].is_null());
        assert_eq!(json["reps"], 0);
        Ok(())
    }
}
