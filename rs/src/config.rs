//! Scoring configuration and per-call options
//!
//! [`ScoringConfig`] holds every tunable coefficient with the documented
//! defaults from [`crate::constants`]. A JSON file may override any subset of
//! fields. The option structs bundle a config snapshot with the per-request
//! inputs (current time, exclusions, user signals).

use crate::constants::{
    CATEGORY_OVERLAP_WEIGHT, DIVERSITY_PENALTY_PER_EXTRA_APPEARANCE, ENGAGEMENT_WEIGHT,
    FOLLOWED_CHANNEL_BONUS, LIKED_CHANNEL_BONUS_MAX, LIKED_CHANNEL_BONUS_STEP,
    MAX_CHANNEL_APPEARANCES_BEFORE_PENALTY, MIN_DURATION_SECONDS, PERSONALIZATION_WEIGHT,
    RECENCY_HALF_LIFE_HOURS, RECENCY_WEIGHT, RECENT_WINDOW_HOURS, TAG_OVERLAP_WEIGHT,
    TITLE_OVERLAP_WEIGHT, TOPICAL_WEIGHT,
};
use crate::models::{ChannelId, UserSignals, Video, VideoId};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Tunable scoring coefficients
///
/// Values are taken as-is: weights need not sum to 1 and nothing is range
/// checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Hard floor for featured eligibility
    pub min_duration_seconds: f64,
    /// Videos at most this old keep their full engagement
    pub recent_window_hours: f64,
    /// Age at which recency drops to 0.5
    pub recency_half_life_hours: f64,
    /// Free appearances per channel before the diversity penalty applies
    pub max_channel_appearances_before_penalty: u32,
    pub diversity_penalty_per_extra_appearance: f64,
    pub recency_weight: f64,
    pub engagement_weight: f64,
    pub personalization_weight: f64,
    pub followed_channel_bonus: f64,
    pub liked_channel_bonus_max: f64,
    pub liked_channel_bonus_step: f64,
    pub title_overlap_weight: f64,
    pub tag_overlap_weight: f64,
    pub category_overlap_weight: f64,
    /// Multiplier for the blended topical similarity of related videos
    pub topical_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_duration_seconds: MIN_DURATION_SECONDS,
            recent_window_hours: RECENT_WINDOW_HOURS,
            recency_half_life_hours: RECENCY_HALF_LIFE_HOURS,
            max_channel_appearances_before_penalty: MAX_CHANNEL_APPEARANCES_BEFORE_PENALTY,
            diversity_penalty_per_extra_appearance: DIVERSITY_PENALTY_PER_EXTRA_APPEARANCE,
            recency_weight: RECENCY_WEIGHT,
            engagement_weight: ENGAGEMENT_WEIGHT,
            personalization_weight: PERSONALIZATION_WEIGHT,
            followed_channel_bonus: FOLLOWED_CHANNEL_BONUS,
            liked_channel_bonus_max: LIKED_CHANNEL_BONUS_MAX,
            liked_channel_bonus_step: LIKED_CHANNEL_BONUS_STEP,
            title_overlap_weight: TITLE_OVERLAP_WEIGHT,
            tag_overlap_weight: TAG_OVERLAP_WEIGHT,
            category_overlap_weight: CATEGORY_OVERLAP_WEIGHT,
            topical_weight: TOPICAL_WEIGHT,
        }
    }
}

impl ScoringConfig {
    /// Parse a JSON override document; missing fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Inputs for [`crate::featured::pick_featured_video`]
#[derive(Debug, Clone, Default)]
pub struct FeaturedOptions {
    /// Reference time; wall-clock time when `None`
    pub now: Option<DateTime<Utc>>,
    pub exclude_video_ids: HashSet<VideoId>,
    pub exclude_channel_ids: HashSet<ChannelId>,
    /// How often each channel already appears in the caller's output
    pub channel_appearance_count: HashMap<ChannelId, u32>,
    pub user_signals: UserSignals,
    pub config: ScoringConfig,
}

impl FeaturedOptions {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_user_signals(mut self, user_signals: UserSignals) -> Self {
        self.user_signals = user_signals;
        self
    }

    pub fn with_channel_appearances(mut self, counts: HashMap<ChannelId, u32>) -> Self {
        self.channel_appearance_count = counts;
        self
    }

    pub fn excluding_videos<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<VideoId>,
    {
        self.exclude_video_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn excluding_channels<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        self.exclude_channel_ids.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Inputs for [`crate::related::compute_related_score`] and
/// [`crate::ranking::rank_and_diversify_related`]
#[derive(Debug, Clone)]
pub struct RelatedOptions {
    /// The video related candidates are ranked against
    pub current_video: Option<Video>,
    pub user_signals: UserSignals,
    /// When false the liked-channel bonus is never computed
    pub use_like_signals: bool,
    /// Appearances already spent per channel, seeding the diversity pass
    pub channel_appearance_count: HashMap<ChannelId, u32>,
    pub config: ScoringConfig,
}

impl Default for RelatedOptions {
    fn default() -> Self {
        Self {
            current_video: None,
            user_signals: UserSignals::default(),
            use_like_signals: true,
            channel_appearance_count: HashMap::new(),
            config: ScoringConfig::default(),
        }
    }
}

impl RelatedOptions {
    pub fn new(current_video: Video) -> Self {
        Self {
            current_video: Some(current_video),
            ..Self::default()
        }
    }

    pub fn with_user_signals(mut self, user_signals: UserSignals) -> Self {
        self.user_signals = user_signals;
        self
    }

    pub fn with_like_signals(mut self, enabled: bool) -> Self {
        self.use_like_signals = enabled;
        self
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_channel_appearances(mut self, counts: HashMap<ChannelId, u32>) -> Self {
        self.channel_appearance_count = counts;
        self
    }
}
