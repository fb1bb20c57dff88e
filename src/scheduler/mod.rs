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

//! The scheduling engine. Given a card's memory state and a reference
//! instant, [`project`] computes what each of the four ratings would do to
//! the card, and [`commit`] applies one of them. Neither reads the clock or
//! touches storage.

mod fuzz;
mod label;
mod params;

use chrono::Duration;
use serde::Serialize;

use crate::fsrs::Rating;
use crate::fsrs::Stability;
use crate::fsrs::T;
use crate::fsrs::initial_difficulty;
use crate::fsrs::initial_stability;
use crate::fsrs::interval;
use crate::fsrs::new_difficulty;
use crate::fsrs::new_stability;
use crate::fsrs::retrievability;
use crate::fsrs::short_term_stability;
use crate::scheduler::fuzz::apply_fuzz;
use crate::scheduler::fuzz::fuzz_seed;
pub use crate::scheduler::label::interval_label;
pub use crate::scheduler::params::Parameters;
pub use crate::scheduler::params::Step;
use crate::types::memory::Memory;
use crate::types::memory::MemoryState;
use crate::types::memory::Phase;
use crate::types::timestamp::Timestamp;

/// What committing one rating would produce.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub rating: Rating,
    pub state: MemoryState,
    /// The time until the card is due again, e.g. `10m` or `3d`.
    pub interval: String,
}

/// The outcomes of all four ratings.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub again: Outcome,
    pub hard: Outcome,
    pub good: Outcome,
    pub easy: Outcome,
}

/// The preview of a single rating, as shown to the reviewer.
#[derive(Serialize, Debug, PartialEq)]
pub struct ReviewOption {
    pub rating: Rating,
    pub interval: String,
}

impl Projection {
    pub fn into_outcome(self, rating: Rating) -> Outcome {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    /// The outcomes in order: Again, Hard, Good, Easy.
    pub fn outcomes(&self) -> [&Outcome; 4] {
        [&self.again, &self.hard, &self.good, &self.easy]
    }

    pub fn options(&self) -> Vec<ReviewOption> {
        self.outcomes()
            .into_iter()
            .map(|o| ReviewOption {
                rating: o.rating,
                interval: o.interval.clone(),
            })
            .collect()
    }
}

/// Compute the outcome of every rating without changing anything.
pub fn project(params: &Parameters, state: &MemoryState, now: Timestamp) -> Projection {
    let elapsed_days = elapsed_days(state, now);
    let mut drafts = Rating::ALL.map(|g| draft(params, state, elapsed_days, g));

    // Resolve day intervals, then keep them ordered by rating.
    let seed = fuzz_seed(now, state.reps, state.memory);
    let mut days: [Option<u32>; 4] = [None; 4];
    for (i, d) in drafts.iter().enumerate() {
        if let Schedule::Days(raw) = d.schedule {
            days[i] = Some(whole_days(params, raw, elapsed_days, seed));
        }
    }
    order_days(&mut days, params.maximum_interval);
    for (d, ivl) in drafts.iter_mut().zip(days) {
        if let Some(ivl) = ivl {
            d.schedule = Schedule::Days(ivl as T);
        }
    }

    let [again, hard, good, easy] =
        drafts.map(|d| finish(state, d, elapsed_days, now));
    Projection {
        again,
        hard,
        good,
        easy,
    }
}

/// Apply a rating. Returns the state [`project`] predicts for it.
pub fn commit(
    params: &Parameters,
    state: &MemoryState,
    rating: Rating,
    now: Timestamp,
) -> MemoryState {
    project(params, state, now).into_outcome(rating).state
}

/// How the next due date is derived.
#[derive(Clone, Copy, Debug)]
enum Schedule {
    /// A fixed ladder delay.
    Delay(Duration),
    /// A day interval: raw from the memory model, whole after resolution.
    Days(T),
}

#[derive(Clone, Copy, Debug)]
struct Draft {
    rating: Rating,
    phase: Phase,
    memory: Memory,
    schedule: Schedule,
}

/// Where a rating moves a card on a ladder.
enum Climb {
    /// To a ladder step, due after a fixed delay.
    Step { step: usize, delay: Duration },
    /// Out of the ladder and into review.
    Graduate,
    /// Back to the first step of an empty ladder, scheduled in days.
    Hold,
}

fn elapsed_days(state: &MemoryState, now: Timestamp) -> u32 {
    match state.last_review {
        Some(last) => now.since(last).num_days().max(0) as u32,
        None => 0,
    }
}

fn draft(params: &Parameters, state: &MemoryState, elapsed_days: u32, g: Rating) -> Draft {
    let w = &params.weights;
    match (state.phase, state.memory) {
        (Phase::Learning { step }, Some(memory)) | (Phase::Relearning { step }, Some(memory)) => {
            let relearning = matches!(state.phase, Phase::Relearning { .. });
            let steps = if relearning {
                &params.relearning_steps
            } else {
                &params.learning_steps
            };
            let memory = Memory {
                stability: short_term_stability(w, memory.stability, g),
                difficulty: new_difficulty(w, memory.difficulty, g),
            };
            ladder_draft(params, g, memory, climb(steps, step, g), relearning)
        }
        (Phase::Review, Some(Memory { stability: s, difficulty: d })) => {
            let r = retrievability(elapsed_days as T, s);
            let difficulty = new_difficulty(w, d, g);
            if g == Rating::Again {
                let memory = Memory {
                    stability: new_stability(w, d, s, r, g),
                    difficulty,
                };
                let climb = match params.relearning_steps.first() {
                    Some(first) => Climb::Step {
                        step: 0,
                        delay: first.duration(),
                    },
                    None => Climb::Hold,
                };
                return ladder_draft(params, g, memory, climb, true);
            }
            let stability = if elapsed_days == 0 {
                short_term_stability(w, s, g)
            } else {
                new_stability(w, d, s, r, g)
            };
            Draft {
                rating: g,
                phase: Phase::Review,
                memory: Memory {
                    stability,
                    difficulty,
                },
                schedule: Schedule::Days(raw_interval(params, stability)),
            }
        }
        // New cards, and cards whose memory was lost, start from scratch.
        _ => {
            let memory = Memory {
                stability: initial_stability(w, g),
                difficulty: initial_difficulty(w, g),
            };
            let climb = if params.learning_steps.is_empty() {
                Climb::Graduate
            } else {
                climb(&params.learning_steps, 0, g)
            };
            ladder_draft(params, g, memory, climb, false)
        }
    }
}

fn ladder_draft(
    params: &Parameters,
    rating: Rating,
    memory: Memory,
    climb: Climb,
    relearning: bool,
) -> Draft {
    let ladder = |step| {
        if relearning {
            Phase::Relearning { step }
        } else {
            Phase::Learning { step }
        }
    };
    let (phase, schedule) = match climb {
        Climb::Step { step, delay } => (ladder(step), Schedule::Delay(delay)),
        Climb::Hold => (
            ladder(0),
            Schedule::Days(raw_interval(params, memory.stability)),
        ),
        Climb::Graduate => (
            Phase::Review,
            Schedule::Days(raw_interval(params, memory.stability)),
        ),
    };
    Draft {
        rating,
        phase,
        memory,
        schedule,
    }
}

fn climb(steps: &[Step], step: usize, g: Rating) -> Climb {
    let n = steps.len();
    if n == 0 {
        return match g {
            Rating::Again => Climb::Hold,
            _ => Climb::Graduate,
        };
    }
    let step = step.min(n - 1);
    match g {
        Rating::Again => Climb::Step {
            step: 0,
            delay: steps[0].duration(),
        },
        Rating::Hard => {
            let delay = if step == 0 && n == 1 {
                steps[0].duration() * 3 / 2
            } else if step == 0 {
                (steps[0].duration() + steps[1].duration()) / 2
            } else {
                steps[step].duration()
            };
            Climb::Step { step, delay }
        }
        Rating::Good => {
            if step + 1 >= n {
                Climb::Graduate
            } else {
                Climb::Step {
                    step: step + 1,
                    delay: steps[step + 1].duration(),
                }
            }
        }
        Rating::Easy => Climb::Graduate,
    }
}

fn raw_interval(params: &Parameters, stability: Stability) -> T {
    interval(params.desired_retention, stability)
}

fn whole_days(params: &Parameters, raw: T, elapsed_days: u32, seed: f64) -> u32 {
    let days = if params.enable_fuzz {
        apply_fuzz(raw, elapsed_days, params.maximum_interval, seed)
    } else {
        raw.round() as u32
    };
    days.clamp(1, params.maximum_interval)
}

/// Make day intervals non-decreasing in rating order, and strictly
/// increasing from Hard to Good to Easy. Only intervals that are both in
/// days are compared; ladder delays are always shorter than a day interval.
fn order_days(days: &mut [Option<u32>; 4], maximum_interval: u32) {
    let [again, hard, good, easy] = days;
    if let (Some(a), Some(h)) = (again.as_mut(), hard.as_ref()) {
        *a = (*a).min(*h);
    }
    if let (Some(h), Some(g)) = (hard.as_mut(), good.as_mut()) {
        *h = (*h).min(*g);
        *g = (*g).max(*h + 1).min(maximum_interval);
    }
    if let (Some(g), Some(e)) = (good.as_ref(), easy.as_mut()) {
        *e = (*e).max(*g + 1).min(maximum_interval);
    }
}

fn finish(state: &MemoryState, draft: Draft, elapsed_days: u32, now: Timestamp) -> Outcome {
    let (due, scheduled_days) = match draft.schedule {
        Schedule::Delay(delay) => (now.plus(delay), 0),
        Schedule::Days(days) => {
            let days = days as u32;
            (now.plus(Duration::days(days as i64)), days)
        }
    };
    let lapses = if draft.rating == Rating::Again {
        state.lapses + 1
    } else {
        state.lapses
    };
    let next = MemoryState {
        phase: draft.phase,
        memory: Some(draft.memory),
        due,
        last_review: Some(now),
        reps: state.reps + 1,
        lapses,
        elapsed_days,
        scheduled_days,
    };
    Outcome {
        rating: draft.rating,
        interval: interval_label(due, now),
        state: next,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::scheduler::params::MAXIMUM_INTERVAL_LIMIT;

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap())
    }

    fn review_state(stability: f64, difficulty: f64, days_ago: i64, now: Timestamp) -> MemoryState {
        MemoryState {
            phase: Phase::Review,
            memory: Some(Memory {
                stability,
                difficulty,
            }),
            due: now,
            last_review: Some(now.plus(Duration::days(-days_ago))),
            reps: 5,
            lapses: 0,
            elapsed_days: 0,
            scheduled_days: days_ago as u32,
        }
    }

    fn assert_ordered(projection: &Projection) {
        let dues: Vec<Timestamp> = projection.outcomes().iter().map(|o| o.state.due).collect();
        for pair in dues.windows(2) {
            assert!(pair[0] <= pair[1], "dues out of order: {dues:?}");
        }
    }

    #[test]
    fn test_project_new_card() {
        let params = Parameters::default();
        let now = t0();
        let p = project(&params, &MemoryState::initial(now), now);
        assert_ordered(&p);

        assert_eq!(p.again.state.phase, Phase::Learning { step: 0 });
        assert_eq!(p.again.interval, "1m");
        assert_eq!(p.hard.state.phase, Phase::Learning { step: 0 });
        assert_eq!(p.hard.interval, "6m");
        assert_eq!(p.good.state.phase, Phase::Learning { step: 1 });
        assert_eq!(p.good.interval, "10m");
        assert_eq!(p.easy.state.phase, Phase::Review);
        assert_eq!(p.easy.interval, "6d");
        assert_eq!(p.easy.state.scheduled_days, 6);

        let options = p.options();
        let labels: Vec<&str> = options.iter().map(|o| o.interval.as_str()).collect();
        assert_eq!(labels, vec!["1m", "6m", "10m", "6d"]);
    }

    #[test]
    fn test_project_does_not_mutate_and_is_idempotent() {
        let params = Parameters::default();
        let now = t0();
        let state = review_state(10.0, 5.0, 10, now);
        let before = state.clone();
        let a = project(&params, &state, now);
        let b = project(&params, &state, now);
        assert_eq!(a, b);
        assert_eq!(state, before);
        assert_eq!(state.reps, 5);
    }

    #[test]
    fn test_commit_matches_projection() {
        let params = Parameters::default();
        let now = t0();
        let state = review_state(4.0, 6.0, 5, now);
        let p = project(&params, &state, now);
        for g in Rating::ALL {
            assert_eq!(commit(&params, &state, g, now), p.clone().into_outcome(g).state);
        }
    }

    #[test]
    fn test_review_ratings_are_ordered() {
        let params = Parameters::default();
        let now = t0();
        for (s, d, days_ago) in [(0.5, 9.0, 1), (3.0, 5.0, 3), (10.0, 2.0, 12), (80.0, 7.0, 0)] {
            let p = project(&params, &review_state(s, d, days_ago, now), now);
            assert_ordered(&p);
            assert!(p.hard.state.due < p.good.state.due);
            assert!(p.good.state.due < p.easy.state.due);
        }
    }

    #[test]
    fn test_again_from_review_relearns() {
        let params = Parameters::default();
        let now = t0();
        let state = review_state(20.0, 5.0, 20, now);
        let prior_interval = Duration::days(20);
        let next = commit(&params, &state, Rating::Again, now);
        assert_eq!(next.phase, Phase::Relearning { step: 0 });
        assert_eq!(next.lapses, state.lapses + 1);
        assert_eq!(next.reps, state.reps + 1);
        assert_eq!(next.due, now.plus(Duration::minutes(10)));
        assert!(next.due.since(now) < prior_interval);
        assert_eq!(next.scheduled_days, 0);
        assert_eq!(next.elapsed_days, 20);
        assert!(next.stability().unwrap() < 20.0);
        assert!(next.difficulty().unwrap() > 5.0);
    }

    #[test]
    fn test_again_with_no_relearning_steps() {
        let params = Parameters {
            relearning_steps: vec![],
            ..Default::default()
        };
        let now = t0();
        let next = commit(&params, &review_state(20.0, 5.0, 20, now), Rating::Again, now);
        assert_eq!(next.phase, Phase::Relearning { step: 0 });
        assert!(next.scheduled_days >= 1);
        // The next successful review leaves the empty ladder.
        let later = next.due;
        let after = commit(&params, &next, Rating::Good, later);
        assert_eq!(after.phase, Phase::Review);
    }

    #[test]
    fn test_relearning_graduates_on_good() {
        let params = Parameters::default();
        let now = t0();
        let lapsed = commit(&params, &review_state(20.0, 5.0, 20, now), Rating::Again, now);
        let next = commit(&params, &lapsed, Rating::Good, lapsed.due);
        assert_eq!(next.phase, Phase::Review);
        assert!(next.scheduled_days >= 1);
        assert_eq!(next.lapses, 1);
    }

    #[test]
    fn test_relearning_again_restarts_ladder() {
        let params = Parameters {
            relearning_steps: vec![Step::minutes(10), Step::minutes(60)],
            ..Default::default()
        };
        let now = t0();
        let lapsed = commit(&params, &review_state(20.0, 5.0, 20, now), Rating::Again, now);
        let climbed = commit(&params, &lapsed, Rating::Good, lapsed.due);
        assert_eq!(climbed.phase, Phase::Relearning { step: 1 });
        assert_eq!(climbed.due, lapsed.due.plus(Duration::minutes(60)));
        let again = commit(&params, &climbed, Rating::Again, climbed.due);
        assert_eq!(again.phase, Phase::Relearning { step: 0 });
        assert_eq!(again.lapses, 2);
    }

    #[test]
    fn test_no_learning_steps_goes_straight_to_review() {
        let params = Parameters {
            learning_steps: vec![],
            ..Default::default()
        };
        let now = t0();
        let p = project(&params, &MemoryState::initial(now), now);
        for outcome in p.outcomes() {
            assert_eq!(outcome.state.phase, Phase::Review);
            assert!(outcome.state.due > now);
        }
        assert_ordered(&p);
    }

    #[test]
    fn test_hard_on_single_step_ladder() {
        let params = Parameters {
            learning_steps: vec![Step::minutes(10)],
            ..Default::default()
        };
        let now = t0();
        let p = project(&params, &MemoryState::initial(now), now);
        assert_eq!(p.hard.state.due, now.plus(Duration::minutes(15)));
        assert_eq!(p.good.state.phase, Phase::Review);
        assert_ordered(&p);
    }

    #[test]
    fn test_hard_on_later_step_repeats_it() {
        let params = Parameters::default();
        let now = t0();
        let learning = commit(&params, &MemoryState::initial(now), Rating::Good, now);
        let next = commit(&params, &learning, Rating::Hard, learning.due);
        assert_eq!(next.phase, Phase::Learning { step: 1 });
        assert_eq!(next.due, learning.due.plus(Duration::minutes(10)));
    }

    #[test]
    fn test_same_day_easy_grows_stability() {
        let params = Parameters::default();
        let now = t0();
        let state = review_state(5.0, 5.0, 0, now);
        let next = commit(&params, &state, Rating::Easy, now);
        assert!(next.stability().unwrap() > 5.0);
        assert_eq!(next.phase, Phase::Review);
    }

    #[test]
    fn test_difficulty_stays_in_range() {
        let params = Parameters::default();
        let pattern = [
            Rating::Again,
            Rating::Again,
            Rating::Hard,
            Rating::Easy,
            Rating::Easy,
            Rating::Easy,
            Rating::Good,
            Rating::Again,
            Rating::Hard,
            Rating::Hard,
            Rating::Hard,
            Rating::Easy,
        ];
        let mut now = t0();
        let mut state = MemoryState::initial(now);
        for g in pattern.iter().cycle().take(300) {
            state = commit(&params, &state, *g, now);
            let d = state.difficulty().unwrap();
            assert!((1.0..=10.0).contains(&d), "difficulty out of range: {d}");
            assert!(state.stability().unwrap() > 0.0);
            assert!(state.reps >= state.lapses);
            assert!(state.due >= now);
            now = state.due;
        }
    }

    #[test]
    fn test_review_scenario() {
        let params = Parameters::default();
        let t0 = t0();

        let state = commit(&params, &MemoryState::initial(t0), Rating::Good, t0);
        assert_eq!(state.phase, Phase::Learning { step: 1 });
        assert_eq!(state.reps, 1);
        assert!(state.due > t0);
        assert!(!state.is_new());

        let t1 = state.due;
        let state = commit(&params, &state, Rating::Again, t1);
        assert!(state.lapses >= 1);
        assert!(matches!(
            state.phase,
            Phase::Learning { .. } | Phase::Relearning { .. }
        ));
        assert!(state.due.since(t1) <= Duration::minutes(10));

        // Climb the ladder back into review.
        let mut state = state;
        while state.phase != Phase::Review {
            let now = state.due;
            state = commit(&params, &state, Rating::Good, now);
        }

        let mut previous_stability = state.stability().unwrap();
        let mut previous_due = state.due;
        for _ in 0..3 {
            let now = state.due;
            state = commit(&params, &state, Rating::Easy, now);
            assert_eq!(state.phase, Phase::Review);
            assert!(state.stability().unwrap() > previous_stability);
            assert!(state.due > previous_due);
            previous_stability = state.stability().unwrap();
            previous_due = state.due;
        }
    }

    #[test]
    fn test_interval_respects_maximum() {
        let params = Parameters {
            maximum_interval: 100,
            ..Default::default()
        };
        let now = t0();
        let p = project(&params, &review_state(5000.0, 5.0, 100, now), now);
        for outcome in [&p.hard, &p.good, &p.easy] {
            assert!(outcome.state.scheduled_days <= 100);
        }
    }

    #[test]
    fn test_huge_stability_stays_within_limit() {
        let now = t0();
        let state = review_state(1e9, 5.0, 400, now);
        for enable_fuzz in [false, true] {
            let params = Parameters {
                maximum_interval: MAXIMUM_INTERVAL_LIMIT,
                enable_fuzz,
                ..Default::default()
            };
            let p = project(&params, &state, now);
            for outcome in [&p.hard, &p.good, &p.easy] {
                assert!(outcome.state.scheduled_days <= MAXIMUM_INTERVAL_LIMIT);
                assert!(outcome.state.due > now);
            }
        }
    }

    #[test]
    fn test_fuzz_is_deterministic_and_ordered() {
        let params = Parameters {
            enable_fuzz: true,
            ..Default::default()
        };
        let now = t0();
        let state = review_state(30.0, 5.0, 30, now);
        let a = project(&params, &state, now);
        let b = project(&params, &state, now);
        assert_eq!(a, b);
        assert_ordered(&a);
        assert_eq!(commit(&params, &state, Rating::Good, now), a.good.state);
    }

    #[test]
    fn test_missing_memory_is_reinitialised() {
        let params = Parameters::default();
        let now = t0();
        let mut state = review_state(5.0, 5.0, 3, now);
        state.memory = None;
        let next = commit(&params, &state, Rating::Good, now);
        assert_eq!(next.stability(), Some(2.4));
    }
}
