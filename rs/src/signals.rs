//! Signal extraction
//!
//! Pure functions turning a video record and the viewer's signals into
//! sub-scores. Every function returns a finite value; missing or malformed
//! inputs yield 0.

use crate::constants::{
    COMMENT_COEFFICIENT, ENGAGEMENT_NORMALIZER, LIKE_COEFFICIENT, STALE_ENGAGEMENT_MULTIPLIER,
    VIEW_COEFFICIENT,
};
use crate::models::{UserSignals, Video};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 timestamp or a bare `YYYY-MM-DD` date
///
/// Timestamps without an offset, and bare dates (midnight), are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Hours between publication and `now`, floored at zero
pub fn age_hours(published: Option<DateTime<Utc>>, now: Option<DateTime<Utc>>) -> Option<f64> {
    let (published, now) = (published?, now?);
    let millis = now.signed_duration_since(published).num_milliseconds() as f64;
    Some((millis / MILLIS_PER_HOUR).max(0.0))
}

/// Half-life decay: `1 / (1 + age / half_life)`
///
/// A video exactly `half_life_hours` old scores 0.5. Returns 0 when either
/// timestamp is missing.
pub fn recency_score(
    published: Option<DateTime<Utc>>,
    now: Option<DateTime<Utc>>,
    half_life_hours: f64,
) -> f64 {
    match age_hours(published, now) {
        Some(age) => finite_or_zero(1.0 / (1.0 + age / half_life_hours)).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Weighted sum of log-scaled counters, before normalization
pub fn raw_engagement(video: &Video) -> f64 {
    let score = video.views().ln_1p() * VIEW_COEFFICIENT
        + video.likes().ln_1p() * LIKE_COEFFICIENT
        + video.comments().ln_1p() * COMMENT_COEFFICIENT;
    finite_or_zero(score)
}

/// Engagement scaled into a range comparable with recency
pub fn engagement_score(video: &Video) -> f64 {
    raw_engagement(video) / ENGAGEMENT_NORMALIZER
}

/// 1.0 inside the recent window, heavily discounted outside or when the age
/// is unknown
pub fn window_multiplier(age_hours: Option<f64>, recent_window_hours: f64) -> f64 {
    match age_hours {
        Some(age) if age <= recent_window_hours => 1.0,
        _ => STALE_ENGAGEMENT_MULTIPLIER,
    }
}

/// Flat bonus when the viewer follows the channel
pub fn followed_bonus(channel_id: &str, signals: &UserSignals, bonus: f64) -> f64 {
    if signals.is_following(channel_id) {
        bonus
    } else {
        0.0
    }
}

/// Linear bonus per like, capped at `max`
pub fn liked_bonus(channel_id: &str, signals: &UserSignals, max: f64, step: f64) -> f64 {
    finite_or_zero((signals.liked_count(channel_id) * step).min(max))
}

/// Followed bonus plus the capped liked bonus
pub fn personalization_score(
    channel_id: &str,
    signals: &UserSignals,
    followed_channel_bonus: f64,
    liked_bonus_max: f64,
    liked_bonus_step: f64,
) -> f64 {
    followed_bonus(channel_id, signals, followed_channel_bonus)
        + liked_bonus(channel_id, signals, liked_bonus_max, liked_bonus_step)
}

/// Penalty for `appearances` beyond the free allowance; never negative
pub fn penalty_for_appearances(appearances: u32, max_free: u32, penalty_per_extra: f64) -> f64 {
    let extra = appearances.saturating_sub(max_free) as f64;
    finite_or_zero(extra * penalty_per_extra).max(0.0)
}

/// Diversity penalty for a channel given caller-supplied appearance counts
pub fn diversity_penalty(
    channel_id: &str,
    appearance_counts: &HashMap<String, u32>,
    max_free: u32,
    penalty_per_extra: f64,
) -> f64 {
    let appearances = appearance_counts.get(channel_id).copied().unwrap_or(0);
    penalty_for_appearances(appearances, max_free, penalty_per_extra)
}
