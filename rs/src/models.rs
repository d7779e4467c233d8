//! Core data models for the vidrank engine
//!
//! Video records arrive from the feed job in a loosely typed JSON shape. The
//! lenient deserializers in [`crate::serde_helpers`] normalize them once at the
//! boundary so the scoring code only ever sees canonical types.

use crate::constants::MIN_TITLE_TOKEN_CHARS;
use crate::serde_helpers;
use crate::signals::parse_timestamp;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Identifier of a video on the upstream platform
pub type VideoId = String;

/// Identifier of a channel on the upstream platform
pub type ChannelId = String;

/// A normalized video record
///
/// Only `id` is required for a video to be rankable; every other field
/// degrades to an empty/zero value when missing or malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Video {
    /// Platform video id (numbers are coerced to strings)
    #[serde(deserialize_with = "serde_helpers::string")]
    pub id: VideoId,

    /// Owning channel, may be empty
    #[serde(deserialize_with = "serde_helpers::string")]
    pub channel_id: ChannelId,

    /// Publication timestamp as delivered (ISO 8601 or `YYYY-MM-DD`)
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,

    /// Older feeds carry the publication time here
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_date: Option<String>,

    /// Duration in seconds when the feed already resolved it
    #[serde(
        deserialize_with = "serde_helpers::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_seconds: Option<f64>,

    /// Raw duration (`PT#H#M#S` or `H:MM:SS`) when seconds are not given
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<String>,

    #[serde(deserialize_with = "serde_helpers::strict_true")]
    pub is_short: bool,

    #[serde(
        deserialize_with = "serde_helpers::opt_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub view_count: Option<f64>,

    /// Scraped view counter, the last resort after `statistics.viewCount`
    #[serde(
        rename = "views",
        deserialize_with = "serde_helpers::opt_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub scraped_views: Option<f64>,

    #[serde(
        deserialize_with = "serde_helpers::opt_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub like_count: Option<f64>,

    #[serde(
        deserialize_with = "serde_helpers::opt_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment_count: Option<f64>,

    #[serde(deserialize_with = "serde_helpers::string")]
    pub title: String,

    /// Lowercase title tokens in title order
    #[serde(deserialize_with = "serde_helpers::string_list")]
    pub normalized_title_tokens: Vec<String>,

    #[serde(deserialize_with = "serde_helpers::string_list")]
    pub tags: Vec<String>,

    #[serde(deserialize_with = "serde_helpers::string_list")]
    pub categories: Vec<String>,

    /// Raw platform snippet, consulted when top-level fields are missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<Snippet>,

    /// Raw platform statistics, consulted when top-level counters are missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,

    /// Raw platform content details, consulted for the duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Snippet {
    #[serde(deserialize_with = "serde_helpers::string")]
    pub channel_id: ChannelId,
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Statistics {
    #[serde(deserialize_with = "serde_helpers::opt_count")]
    pub view_count: Option<f64>,
    #[serde(deserialize_with = "serde_helpers::opt_count")]
    pub like_count: Option<f64>,
    #[serde(deserialize_with = "serde_helpers::opt_count")]
    pub comment_count: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentDetails {
    #[serde(deserialize_with = "serde_helpers::opt_string")]
    pub duration: Option<String>,
}

impl Video {
    /// Create a video with the given id and channel; everything else empty
    pub fn new(id: impl Into<VideoId>, channel_id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            ..Self::default()
        }
    }

    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    pub fn with_duration_seconds(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_short(mut self, is_short: bool) -> Self {
        self.is_short = is_short;
        self
    }

    /// Set view, like and comment counters at once
    pub fn with_counts(mut self, views: f64, likes: f64, comments: f64) -> Self {
        self.view_count = Some(views);
        self.like_count = Some(likes);
        self.comment_count = Some(comments);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_title_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.normalized_title_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// The video id, or `None` when it is empty
    pub fn resolved_id(&self) -> Option<&str> {
        Some(self.id.as_str()).filter(|id| !id.is_empty())
    }

    /// Channel id, falling back to the snippet; empty when unknown
    pub fn channel(&self) -> &str {
        if !self.channel_id.is_empty() {
            return &self.channel_id;
        }
        self.snippet
            .as_ref()
            .map(|s| s.channel_id.as_str())
            .unwrap_or("")
    }

    /// Parsed publication time; `None` when missing or unparseable
    ///
    /// The first non-empty of `publishedAt`, `uploadDate` and
    /// `snippet.publishedAt` is the one parsed.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        let snippet = self.snippet.as_ref().and_then(|s| s.published_at.as_deref());
        [self.published_at.as_deref(), self.upload_date.as_deref(), snippet]
            .into_iter()
            .flatten()
            .find(|raw| !raw.trim().is_empty())
            .and_then(parse_timestamp)
    }

    /// Duration in seconds from the explicit field or a raw duration string
    pub fn resolved_duration_seconds(&self) -> Option<f64> {
        if let Some(seconds) = self.duration_seconds.filter(|s| s.is_finite()) {
            return Some(seconds);
        }
        self.content_details
            .as_ref()
            .and_then(|cd| cd.duration.as_deref())
            .or(self.duration.as_deref())
            .and_then(parse_duration)
    }

    pub fn views(&self) -> f64 {
        let nested = self.statistics.as_ref().and_then(|s| s.view_count);
        sanitize_count(self.view_count.or(nested).or(self.scraped_views))
    }

    pub fn likes(&self) -> f64 {
        self.counter(self.like_count, |s| s.like_count)
    }

    pub fn comments(&self) -> f64 {
        self.counter(self.comment_count, |s| s.comment_count)
    }

    fn counter(&self, direct: Option<f64>, nested: impl Fn(&Statistics) -> Option<f64>) -> f64 {
        sanitize_count(direct.or_else(|| self.statistics.as_ref().and_then(nested)))
    }

    /// Title tokens: the normalized tokens when present, otherwise derived
    /// from the raw title
    pub fn title_tokens(&self) -> Vec<String> {
        if !self.normalized_title_tokens.is_empty() {
            return self
                .normalized_title_tokens
                .iter()
                .map(|t| t.to_lowercase())
                .collect();
        }
        self.title
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= MIN_TITLE_TOKEN_CHARS)
            .map(|t| t.to_lowercase())
            .collect()
    }
}

fn sanitize_count(count: Option<f64>) -> f64 {
    count
        .filter(|n| n.is_finite())
        .map(|n| n.max(0.0))
        .unwrap_or(0.0)
}

/// Parse `PT#H#M#S`, `H:MM:SS` or `M:SS` into seconds
///
/// An empty clock segment counts as zero, so `1::3` is 3603 seconds.
pub fn parse_duration(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("PT") {
        return parse_iso_duration(rest);
    }

    let parts = raw
        .split(':')
        .map(|p| match p.trim() {
            "" => Some(0.0),
            p => p.parse::<f64>().ok().filter(|n| n.is_finite()),
        })
        .collect::<Option<Vec<f64>>>()?;
    match parts.as_slice() {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        [m, s] => Some(m * 60.0 + s),
        _ => None,
    }
}

fn parse_iso_duration(rest: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut digits = String::new();
    // H, M, S must appear in that order, each at most once
    let mut next_unit = 0;

    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let (unit, scale) = match c.to_ascii_uppercase() {
            'H' => (0, 3600.0),
            'M' => (1, 60.0),
            'S' => (2, 1.0),
            _ => return None,
        };
        if digits.is_empty() || unit < next_unit {
            return None;
        }
        total += digits.parse::<f64>().ok()? * scale;
        digits.clear();
        next_unit = unit + 1;
    }

    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

/// The viewer's follow/like relationship to channels
///
/// `follows` accepts an array of ids or an object of flags; `likedByChannel`
/// accepts an object of counts or an array of `[channelId, count]` pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSignals {
    #[serde(deserialize_with = "serde_helpers::id_set")]
    pub follows: HashSet<ChannelId>,

    #[serde(deserialize_with = "serde_helpers::channel_counts")]
    pub liked_by_channel: HashMap<ChannelId, f64>,
}

impl UserSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_follows<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        self.follows.extend(channels.into_iter().map(Into::into));
        self
    }

    pub fn with_likes<I, S>(mut self, likes: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<ChannelId>,
    {
        self.liked_by_channel
            .extend(likes.into_iter().map(|(channel, count)| (channel.into(), count)));
        self
    }

    pub fn is_following(&self, channel_id: &str) -> bool {
        !channel_id.is_empty() && self.follows.contains(channel_id)
    }

    /// Likes recorded for a channel, never negative
    pub fn liked_count(&self, channel_id: &str) -> f64 {
        if channel_id.is_empty() {
            return 0.0;
        }
        self.liked_by_channel
            .get(channel_id)
            .copied()
            .filter(|n| n.is_finite())
            .map(|n| n.max(0.0))
            .unwrap_or(0.0)
    }
}

/// Videos and channels the viewer has hidden
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HiddenItems {
    #[serde(deserialize_with = "serde_helpers::id_set")]
    pub video_ids: HashSet<VideoId>,

    #[serde(deserialize_with = "serde_helpers::id_set")]
    pub channel_ids: HashSet<ChannelId>,
}

/// Which signal dominated a featured score (diagnostic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreReason {
    Recency,
    Engagement,
}

/// Sub-scores behind a featured total
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub recency_score: f64,
    /// Normalized engagement after the window multiplier
    pub engagement_score: f64,
    pub personalization_score: f64,
    pub diversity_penalty: f64,
    pub in_recent_window: bool,
}

/// Featured score of a single candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedScore {
    /// The only value used for ranking
    pub total: f64,
    pub reason: ScoreReason,
    pub breakdown: ScoreBreakdown,
}

/// The selected featured video together with its score
#[derive(Debug, Clone, Serialize)]
pub struct Featured<'a> {
    pub video: &'a Video,
    pub score: FeaturedScore,
}

/// Sub-scores behind a related total
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedBreakdown {
    pub title_overlap: f64,
    pub tag_overlap: f64,
    pub category_overlap: f64,
    /// Weighted blend of the three overlaps
    pub topical_similarity: f64,
    pub personalization_score: f64,
    pub like_signals_used: bool,
}

/// Related score of a candidate against the current video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedScore {
    pub total: f64,
    pub breakdown: RelatedBreakdown,
}

/// A related candidate at its final position
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedVideo<'a> {
    pub video: &'a Video,
    pub score: RelatedScore,
    /// Penalty applied for channel repetition at this position
    pub diversity_penalty: f64,
    /// `score.total - diversity_penalty`, the value the entry was placed with
    pub adjusted_total: f64,
}
