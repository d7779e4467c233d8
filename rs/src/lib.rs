//! vidrank: featured and related video ranking
//!
//! A scoring engine for a content-aggregation client. It picks one featured
//! video from a candidate pool, ranks and diversifies related videos for the
//! video being watched, and filters out whatever the viewer has hidden.
//!
//! The engine is a set of pure, synchronous functions over normalized video
//! records. Loading the feed and preference snapshots from disk lives in
//! [`snapshot`] and is only needed by the command-line front end.

pub mod config;
pub mod constants;
pub mod featured;
pub mod models;
pub mod ranking;
pub mod related;
pub mod serde_helpers;
pub mod signals;
pub mod snapshot;
pub mod visibility;

// Re-export main types for convenience
pub use config::{FeaturedOptions, RelatedOptions, ScoringConfig};
pub use featured::pick_featured_video;
pub use models::{
    Featured, FeaturedScore, HiddenItems, RankedVideo, RelatedScore, ScoreReason, UserSignals,
    Video,
};
pub use ranking::rank_and_diversify_related;
pub use related::compute_related_score;
pub use snapshot::{FeedSnapshot, FeedSource, FileFeedSource, Preferences, SnapshotError};
pub use visibility::filter_hidden_candidates;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
