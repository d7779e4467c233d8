//! Constants for the vidrank scoring engine
//!
//! Defaults for every overridable field of [`crate::config::ScoringConfig`]
//! plus the fixed coefficients of the engagement formula.

// Featured eligibility

/// Videos shorter than this are never eligible as featured.
pub const MIN_DURATION_SECONDS: f64 = 240.0;

// Recency parameters

/// Videos younger than this get their engagement counted in full.
pub const RECENT_WINDOW_HOURS: f64 = 24.0 * 7.0;

/// Age at which the recency score drops to 0.5.
pub const RECENCY_HALF_LIFE_HOURS: f64 = 24.0;

// Engagement formula

/// Coefficient applied to `log1p(views)`.
pub const VIEW_COEFFICIENT: f64 = 1.0;

/// Coefficient applied to `log1p(likes)`.
pub const LIKE_COEFFICIENT: f64 = 0.7;

/// Coefficient applied to `log1p(comments)`.
pub const COMMENT_COEFFICIENT: f64 = 0.45;

/// Divisor bringing raw engagement into a range comparable with recency.
pub const ENGAGEMENT_NORMALIZER: f64 = 12.0;

/// Engagement multiplier for videos outside the recent window.
pub const STALE_ENGAGEMENT_MULTIPLIER: f64 = 0.35;

// Diversity parameters

/// Appearances a channel gets before the diversity penalty kicks in.
pub const MAX_CHANNEL_APPEARANCES_BEFORE_PENALTY: u32 = 1;

/// Penalty per appearance beyond the free allowance.
pub const DIVERSITY_PENALTY_PER_EXTRA_APPEARANCE: f64 = 0.08;

// Featured blend weights (independent multipliers, they need not sum to 1)

/// Weight for the recency component.
pub const RECENCY_WEIGHT: f64 = 0.38;

/// Weight for the windowed engagement component.
pub const ENGAGEMENT_WEIGHT: f64 = 0.47;

/// Weight for the personalization component.
pub const PERSONALIZATION_WEIGHT: f64 = 0.15;

// Personalization bonuses

/// Flat bonus for a followed channel.
pub const FOLLOWED_CHANNEL_BONUS: f64 = 0.12;

/// Cap on the liked-channel bonus.
pub const LIKED_CHANNEL_BONUS_MAX: f64 = 0.12;

/// Liked-channel bonus earned per like.
pub const LIKED_CHANNEL_BONUS_STEP: f64 = 0.04;

// Related topical similarity

/// Weight for title token overlap.
pub const TITLE_OVERLAP_WEIGHT: f64 = 0.5;

/// Weight for tag overlap.
pub const TAG_OVERLAP_WEIGHT: f64 = 0.3;

/// Weight for category overlap.
pub const CATEGORY_OVERLAP_WEIGHT: f64 = 0.2;

/// Multiplier for the combined topical similarity in the related total.
pub const TOPICAL_WEIGHT: f64 = 1.0;

/// Title tokens shorter than this are ignored when deriving tokens from a raw title.
pub const MIN_TITLE_TOKEN_CHARS: usize = 3;
