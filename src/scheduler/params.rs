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

use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::DEFAULT_WEIGHTS;
use crate::fsrs::Weights;

/// The upper bound on `maximum_interval`, in days.
pub const MAXIMUM_INTERVAL_LIMIT: u32 = 36500;

/// The longest step a ladder may hold.
const MAXIMUM_STEP_SECONDS: i64 = 365 * 24 * 60 * 60;

/// The tunable knobs of the scheduler. Passed by reference into every call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub weights: Weights,
    /// The recall probability at which a card falls due.
    pub desired_retention: f64,
    /// Fixed delays a new card climbs before it enters review.
    pub learning_steps: Vec<Step>,
    /// Fixed delays a forgotten card climbs before it re-enters review.
    pub relearning_steps: Vec<Step>,
    /// The longest interval ever scheduled, in days.
    pub maximum_interval: u32,
    /// Spread day intervals so cards learned together drift apart.
    pub enable_fuzz: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            desired_retention: 0.9,
            learning_steps: vec![Step::minutes(1), Step::minutes(10)],
            relearning_steps: vec![Step::minutes(10)],
            maximum_interval: MAXIMUM_INTERVAL_LIMIT,
            enable_fuzz: false,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Fallible<()> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return fail(format!(
                "desired_retention must be between 0 and 1, got {}.",
                self.desired_retention
            ));
        }
        if self.maximum_interval < 1 {
            return fail("maximum_interval must be at least one day.");
        }
        if self.maximum_interval > MAXIMUM_INTERVAL_LIMIT {
            return fail(format!(
                "maximum_interval must be at most {MAXIMUM_INTERVAL_LIMIT} days, got {}.",
                self.maximum_interval
            ));
        }
        let mut steps = self.learning_steps.iter().chain(&self.relearning_steps);
        if steps.any(|step| step.seconds > MAXIMUM_STEP_SECONDS) {
            return fail("steps must be at most 365 days long.");
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return fail("weights must be finite numbers.");
        }
        if self.weights[..4].iter().any(|w| *w <= 0.0) {
            return fail("the initial stability weights must be positive.");
        }
        Ok(())
    }
}

/// A fixed delay on a learning or relearning ladder. Written as an integer
/// followed by a unit: `30s`, `10m`, `1h`, `2d`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Step {
    seconds: i64,
}

impl Step {
    pub fn minutes(minutes: i64) -> Self {
        Self {
            seconds: minutes * 60,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds)
    }
}

impl TryFrom<&str> for Step {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        let split = value
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ErrorReport::new(format!("step '{value}' has no unit.")))?;
        let (amount, unit) = value.split_at(split);
        let amount: i64 = amount
            .parse()
            .map_err(|_| ErrorReport::new(format!("invalid step: '{value}'.")))?;
        let scale = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 60 * 60 * 24,
            _ => return fail(format!("invalid unit in step '{value}'.")),
        };
        if amount == 0 {
            return fail("steps must be longer than zero.");
        }
        match amount.checked_mul(scale) {
            Some(seconds) if seconds <= MAXIMUM_STEP_SECONDS => Ok(Self { seconds }),
            _ => fail(format!("step '{value}' is longer than 365 days.")),
        }
    }
}

impl TryFrom<String> for Step {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Step::try_from(value.as_str())
    }
}

impl From<Step> for String {
    fn from(step: Step) -> String {
        step.to_string()
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = self.seconds;
        if s % 86400 == 0 {
            write!(f, "{}d", s / 86400)
        } else if s % 3600 == 0 {
            write!(f, "{}h", s / 3600)
        } else if s % 60 == 0 {
            write!(f, "{}m", s / 60)
        } else {
            write!(f, "{s}s")
        }
    }
}
