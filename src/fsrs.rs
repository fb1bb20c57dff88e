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

//! The FSRS memory model: the formulas that map a rating and the current
//! stability/difficulty to new values. Everything here is a pure function
//! of a weight vector.

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// Retrievability: the probability of recall, in [0, 1].
pub type R = f64;

/// Stability: days until retrievability decays to 90%.
pub type Stability = f64;

/// Difficulty: intrinsic hardness of a card, in [1, 10].
pub type Difficulty = f64;

/// Time, in days.
pub type T = f64;

/// The FSRS weight vector. Entries 0-16 are the long-term model, 17-18 the
/// short-term (same-day and step ladder) model.
pub type Weights = [f64; 19];

pub const DEFAULT_WEIGHTS: Weights = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61, 0.51655, 0.6621,
];

/// Stability never drops below this.
pub const MIN_STABILITY: Stability = 0.01;

const MIN_DIFFICULTY: Difficulty = 1.0;
const MAX_DIFFICULTY: Difficulty = 10.0;

pub const INVALID_RATING: &str = "Rating must be 1 (Again), 2 (Hard), 3 (Good), or 4 (Easy)";

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// All ratings, in order of increasing recall quality.
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// The wire value: 1 = Again, 2 = Hard, 3 = Good, 4 = Easy.
    pub fn value(self) -> u8 {
        match self {
            Rating::Again => 1,
            Rating::Hard => 2,
            Rating::Good => 3,
            Rating::Easy => 4,
        }
    }

    fn index(self) -> usize {
        (self.value() - 1) as usize
    }
}

impl TryFrom<i64> for Rating {
    type Error = ErrorReport;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            _ => fail(INVALID_RATING),
        }
    }
}

impl TryFrom<&str> for Rating {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "again" | "1" => Ok(Rating::Again),
            "hard" | "2" => Ok(Rating::Hard),
            "good" | "3" => Ok(Rating::Good),
            "easy" | "4" => Ok(Rating::Easy),
            _ => fail(INVALID_RATING),
        }
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> f64 {
        rating.value() as f64
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Rating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.value())
    }
}

/// Power-law forgetting curve.
pub fn retrievability(t: T, s: Stability) -> R {
    (1.0 + t / (9.0 * s)).powf(-1.0)
}

/// The number of days until retrievability falls to `r_d`.
pub fn interval(r_d: R, s: Stability) -> T {
    9.0 * s * (1.0 / r_d - 1.0)
}

pub fn initial_stability(w: &Weights, g: Rating) -> Stability {
    w[g.index()].max(MIN_STABILITY)
}

pub fn initial_difficulty(w: &Weights, g: Rating) -> Difficulty {
    let g: f64 = g.into();
    clamp_d(w[4] - (g - 3.0) * w[5])
}

pub fn new_difficulty(w: &Weights, d: Difficulty, g: Rating) -> Difficulty {
    let g: f64 = g.into();
    let damped = d - w[6] * (g - 3.0);
    // Mean reversion towards the initial difficulty of a `Good` card.
    clamp_d(w[7] * initial_difficulty(w, Rating::Good) + (1.0 - w[7]) * damped)
}

/// Long-term stability update after a review with the given retrievability.
pub fn new_stability(w: &Weights, d: Difficulty, s: Stability, r: R, g: Rating) -> Stability {
    if g == Rating::Again {
        s_fail(w, d, s, r)
    } else {
        s_success(w, d, s, r, g)
    }
}

/// Stability update for reviews that happen within a day of each other.
pub fn short_term_stability(w: &Weights, s: Stability, g: Rating) -> Stability {
    let g: f64 = g.into();
    let s_new = s * f64::exp(w[17] * (g - 3.0 + w[18]));
    let s_new = if g >= 3.0 { s_new.max(s) } else { s_new };
    s_new.max(MIN_STABILITY)
}

fn s_success(w: &Weights, d: Difficulty, s: Stability, r: R, g: Rating) -> Stability {
    let t_d = 11.0 - d;
    let t_s = s.powf(-w[9]);
    let t_r = f64::exp(w[10] * (1.0 - r)) - 1.0;
    let h = if g == Rating::Hard { w[15] } else { 1.0 };
    let b = if g == Rating::Easy { w[16] } else { 1.0 };
    let c = f64::exp(w[8]);
    let alpha = 1.0 + t_d * t_s * t_r * h * b * c;
    (s * alpha).max(MIN_STABILITY)
}

fn s_fail(w: &Weights, d: Difficulty, s: Stability, r: R) -> Stability {
    let d_f = d.powf(-w[12]);
    let s_f = (s + 1.0).powf(w[13]) - 1.0;
    let r_f = f64::exp(w[14] * (1.0 - r));
    let s_new = w[11] * d_f * s_f * r_f;
    // Forgetting never makes a card more stable.
    f64::min(s_new, s).max(MIN_STABILITY)
}

fn clamp_d(d: Difficulty) -> Difficulty {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: &Weights = &DEFAULT_WEIGHTS;

    #[test]
    fn test_retrievability_at_zero() {
        let r = retrievability(0.0, 1.0);
        assert!((r - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_retrievability_curve() {
        // At t = 9S the curve is at one half.
        let r = retrievability(90.0, 10.0);
        assert!((r - 0.5).abs() < 1e-10);
        // At t = S it is at the reference 90%.
        let r = retrievability(10.0, 10.0);
        assert!((r - 0.9).abs() < 1e-10);
    }

    #[test]
    fn test_interval_equals_stability_at_ninety_percent() {
        let s = 5.0;
        assert!((interval(0.9, s) - s).abs() < 1e-10);
    }

    #[test]
    fn test_initial_stability_ordering() {
        let s: Vec<Stability> = Rating::ALL
            .iter()
            .map(|g| initial_stability(W, *g))
            .collect();
        assert!(s[0] < s[1] && s[1] < s[2] && s[2] < s[3]);
        assert_eq!(s[2], 2.4);
    }

    #[test]
    fn test_initial_difficulty_ordering() {
        let d: Vec<Difficulty> = Rating::ALL
            .iter()
            .map(|g| initial_difficulty(W, *g))
            .collect();
        assert!(d[0] > d[1] && d[1] > d[2] && d[2] > d[3]);
        assert!((d[2] - 4.93).abs() < 1e-10);
    }

    #[test]
    fn test_stability_increases_on_success() {
        let (d, s) = (5.0, 3.0);
        let r = retrievability(s, s);
        for g in [Rating::Hard, Rating::Good, Rating::Easy] {
            assert!(new_stability(W, d, s, r, g) > s);
        }
    }

    #[test]
    fn test_recall_stability_grows_more_when_retrievability_is_low() {
        let (d, s) = (5.0, 3.0);
        let early = new_stability(W, d, s, retrievability(1.0, s), Rating::Good);
        let late = new_stability(W, d, s, retrievability(10.0, s), Rating::Good);
        assert!(late > early);
    }

    #[test]
    fn test_stability_decreases_on_again() {
        let (d, s) = (5.0, 3.0);
        let r = retrievability(s, s);
        assert!(new_stability(W, d, s, r, Rating::Again) < s);
    }

    #[test]
    fn test_hard_penalty_and_easy_bonus() {
        let (d, s) = (5.0, 10.0);
        let r = retrievability(10.0, s);
        let hard = new_stability(W, d, s, r, Rating::Hard);
        let good = new_stability(W, d, s, r, Rating::Good);
        let easy = new_stability(W, d, s, r, Rating::Easy);
        assert!(hard < good);
        assert!(good < easy);
    }

    #[test]
    fn test_difficulty_direction() {
        assert!(new_difficulty(W, 5.0, Rating::Easy) < 5.0);
        assert!(new_difficulty(W, 5.0, Rating::Hard) > 5.0);
        assert!(new_difficulty(W, 5.0, Rating::Again) > 5.0);
    }

    #[test]
    fn test_difficulty_clamped() {
        let mut d = initial_difficulty(W, Rating::Again);
        for _ in 0..100 {
            d = new_difficulty(W, d, Rating::Again);
        }
        assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d));

        let mut d = initial_difficulty(W, Rating::Easy);
        for _ in 0..100 {
            d = new_difficulty(W, d, Rating::Easy);
        }
        assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d));
    }

    #[test]
    fn test_short_term_stability() {
        let s = 2.0;
        assert!(short_term_stability(W, s, Rating::Again) < s);
        assert!(short_term_stability(W, s, Rating::Hard) < s);
        assert!(short_term_stability(W, s, Rating::Good) > s);
        assert!(
            short_term_stability(W, s, Rating::Easy) > short_term_stability(W, s, Rating::Good)
        );
    }

    #[test]
    fn test_rating_conversion() {
        assert_eq!(Rating::try_from(1i64).unwrap(), Rating::Again);
        assert_eq!(Rating::try_from(4i64).unwrap(), Rating::Easy);
        assert_eq!(Rating::try_from("Good").unwrap(), Rating::Good);
        let err = Rating::try_from(5i64).unwrap_err();
        assert_eq!(err.to_string(), format!("error: {INVALID_RATING}"));
        assert!(Rating::try_from(0i64).is_err());
        assert!(Rating::try_from("meh").is_err());
    }

    #[test]
    fn test_rating_order() {
        assert!(Rating::Again < Rating::Hard);
        assert!(Rating::Hard < Rating::Good);
        assert!(Rating::Good < Rating::Easy);
    }
}
