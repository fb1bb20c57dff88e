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

//! Interval fuzzing. The random choice is derived from the inputs of the
//! review, so a projection can be recomputed and always agrees with the
//! commit that follows it.

use crate::fsrs::T;
use crate::types::memory::Memory;
use crate::types::timestamp::Timestamp;

/// Intervals shorter than this are never fuzzed.
const MIN_FUZZ_INTERVAL: T = 2.5;

/// `(start, end, factor)`: each day of the interval inside `[start, end)`
/// widens the fuzz range by `factor` days.
const FUZZ_RANGES: [(T, T, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

/// A number in [0, 1) determined by the review inputs.
pub fn fuzz_seed(now: Timestamp, reps: u32, memory: Option<Memory>) -> f64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(now.to_rfc3339().as_bytes());
    hasher.update(&reps.to_le_bytes());
    if let Some(memory) = memory {
        hasher.update(&memory.stability.to_le_bytes());
        hasher.update(&memory.difficulty.to_le_bytes());
    }
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    // Keep 53 bits so the division is exact.
    (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
}

/// The inclusive range of whole days an interval may be fuzzed into.
pub fn fuzz_range(interval: T, elapsed_days: u32, maximum_interval: u32) -> (u32, u32) {
    let mut delta = 1.0;
    for (start, end, factor) in FUZZ_RANGES {
        delta += factor * (interval.min(end) - start).max(0.0);
    }
    let max = maximum_interval as f64;
    let interval = interval.min(max);
    let mut min_ivl = (interval - delta).round().max(2.0);
    let max_ivl = (interval + delta).round().min(max);
    if interval > elapsed_days as f64 {
        min_ivl = min_ivl.max(elapsed_days as f64 + 1.0);
    }
    let min_ivl = min_ivl.min(max_ivl);
    (min_ivl as u32, max_ivl as u32)
}

/// Pick a whole-day interval near `interval` using `seed`.
pub fn apply_fuzz(interval: T, elapsed_days: u32, maximum_interval: u32, seed: f64) -> u32 {
    if interval < MIN_FUZZ_INTERVAL {
        return interval.round() as u32;
    }
    let (min_ivl, max_ivl) = fuzz_range(interval, elapsed_days, maximum_interval);
    let span = (max_ivl - min_ivl + 1) as f64;
    (seed * span + min_ivl as f64).floor() as u32
}
