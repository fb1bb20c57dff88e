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

use crate::types::timestamp::Timestamp;

/// A short human-readable rendering of the time from `now` until `due`,
/// in the largest unit that keeps the number small: `10m`, `3h`, `4d`,
/// `2mo`, `1y`.
pub fn interval_label(due: Timestamp, now: Timestamp) -> String {
    let ms = due.since(now).num_milliseconds() as f64;
    let minutes = (ms / 60_000.0).round();
    let hours = (ms / 3_600_000.0).round();
    let days = (ms / 86_400_000.0).round();
    if minutes < 60.0 {
        return format!("{minutes}m");
    }
    if hours < 24.0 {
        return format!("{hours}h");
    }
    if days < 30.0 {
        return format!("{days}d");
    }
    let months = (days / 30.0).round();
    if months < 12.0 {
        return format!("{months}mo");
    }
    let years = (days / 365.0).round();
    format!("{years}y")
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn label(d: Duration) -> String {
        let now = Timestamp::now();
        interval_label(now.plus(d), now)
    }

    #[test]
    fn test_minutes() {
        assert_eq!(label(Duration::minutes(1)), "1m");
        assert_eq!(label(Duration::seconds(330)), "6m");
        assert_eq!(label(Duration::minutes(59)), "59m");
    }

    #[test]
    fn test_hours() {
        assert_eq!(label(Duration::minutes(60)), "1h");
        assert_eq!(label(Duration::minutes(150)), "3h");
        assert_eq!(label(Duration::hours(23)), "23h");
    }

    #[test]
    fn test_days() {
        assert_eq!(label(Duration::hours(24)), "1d");
        assert_eq!(label(Duration::days(3)), "3d");
        assert_eq!(label(Duration::days(29)), "29d");
    }

    #[test]
    fn test_months_and_years() {
        assert_eq!(label(Duration::days(30)), "1mo");
        assert_eq!(label(Duration::days(61)), "2mo");
        assert_eq!(label(Duration::days(340)), "11mo");
        assert_eq!(label(Duration::days(365)), "1y");
        assert_eq!(label(Duration::days(1000)), "3y");
    }

    #[test]
    fn test_zero() {
        assert_eq!(label(Duration::zero()), "0m");
    }
}
