//! Feed and preference snapshots
//!
//! The feed job writes `feed.json` (videos plus the channel roster) and the
//! client keeps the viewer's preferences as a separate JSON document. This
//! module reads both from disk; the engine itself never touches storage.

use crate::models::{ChannelId, HiddenItems, UserSignals, Video};
use crate::serde_helpers;
use anyhow::Context;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Snapshot-specific errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Feed file not found: {}", .path.display())]
    FeedNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A channel from the roster
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelRecord {
    #[serde(deserialize_with = "serde_helpers::string")]
    pub id: ChannelId,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub name: String,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub handle: String,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub url: String,
    #[serde(deserialize_with = "serde_helpers::string_list")]
    pub categories: Vec<String>,
}

/// The feed document produced by the feed job
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedSnapshot {
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_at: Option<String>,

    /// Videos; malformed entries are skipped
    #[serde(deserialize_with = "serde_helpers::skip_invalid")]
    pub videos: Vec<Video>,

    #[serde(deserialize_with = "serde_helpers::skip_invalid")]
    pub channels: Vec<ChannelRecord>,
}

impl FeedSnapshot {
    /// Videos with roster categories filled in where a video has none
    pub fn hydrated_videos(&self) -> Vec<Video> {
        let roster: HashMap<&str, &ChannelRecord> = self
            .channels
            .iter()
            .filter(|c| !c.id.is_empty())
            .map(|c| (c.id.as_str(), c))
            .collect();

        self.videos
            .iter()
            .map(|video| {
                let mut video = video.clone();
                if video.categories.is_empty() {
                    if let Some(channel) = roster.get(video.channel()) {
                        video.categories = channel.categories.clone();
                    }
                }
                video
            })
            .collect()
    }

    /// Look up a video by id
    pub fn find_video(&self, id: &str) -> Option<&Video> {
        self.videos.iter().find(|v| v.resolved_id() == Some(id))
    }
}

fn default_use_like_signals() -> bool {
    true
}

/// The viewer's preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub user_signals: UserSignals,

    #[serde(default)]
    pub hidden: HiddenItems,

    /// Whether liked channels may influence related rankings
    #[serde(default = "default_use_like_signals")]
    pub use_like_signals: bool,

    /// How often each channel has already been shown this session
    #[serde(default, deserialize_with = "serde_helpers::appearance_counts")]
    pub channel_appearance_count: HashMap<ChannelId, u32>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            user_signals: UserSignals::default(),
            hidden: HiddenItems::default(),
            use_like_signals: default_use_like_signals(),
            channel_appearance_count: HashMap::new(),
        }
    }
}

/// Where feed and preference snapshots come from
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Load the current feed
    async fn load_feed(&self) -> crate::Result<FeedSnapshot>;

    /// Load the viewer's preferences
    async fn load_preferences(&self) -> crate::Result<Preferences>;
}

/// JSON files on local disk
pub struct FileFeedSource {
    feed_path: PathBuf,
    preferences_path: Option<PathBuf>,
}

impl FileFeedSource {
    pub fn new<P: AsRef<Path>>(feed_path: P) -> Self {
        Self {
            feed_path: feed_path.as_ref().to_path_buf(),
            preferences_path: None,
        }
    }

    /// Read preferences from `path`; without one, defaults are used
    pub fn with_preferences<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.preferences_path = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait::async_trait]
impl FeedSource for FileFeedSource {
    async fn load_feed(&self) -> crate::Result<FeedSnapshot> {
        if !fs::try_exists(&self.feed_path).await.unwrap_or(false) {
            return Err(SnapshotError::FeedNotFound {
                path: self.feed_path.clone(),
            }
            .into());
        }

        tracing::info!("Loading feed from {}", self.feed_path.display());
        let start = std::time::Instant::now();

        let feed: FeedSnapshot = Self::read_json(&self.feed_path)
            .await
            .with_context(|| format!("Failed to read feed {}", self.feed_path.display()))?;

        tracing::info!(
            "Loaded {} videos and {} channels in {:?}",
            feed.videos.len(),
            feed.channels.len(),
            start.elapsed()
        );
        Ok(feed)
    }

    async fn load_preferences(&self) -> crate::Result<Preferences> {
        let Some(path) = &self.preferences_path else {
            tracing::debug!("No preferences file, using defaults");
            return Ok(Preferences::default());
        };

        let preferences: Preferences = Self::read_json(path)
            .await
            .with_context(|| format!("Failed to read preferences {}", path.display()))?;

        tracing::debug!(
            "Loaded preferences: {} follows, {} liked channels, {} hidden videos, {} hidden channels",
            preferences.user_signals.follows.len(),
            preferences.user_signals.liked_by_channel.len(),
            preferences.hidden.video_ids.len(),
            preferences.hidden.channel_ids.len()
        );
        Ok(preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_feed_skips_malformed_entries() {
        let feed: FeedSnapshot = serde_json::from_value(json!({
            "generatedAt": "2026-01-10T06:00:00Z",
            "videosCount": 3,
            "videos": [
                { "id": "v1", "channelId": "UC1", "duration": "PT10M" },
                "garbage",
                { "id": "v2", "channelId": "UC2" }
            ],
            "channels": [{ "id": "UC1", "name": "One", "categories": "news;politics" }]
        }))
        .unwrap();

        assert_eq!(feed.videos.len(), 2);
        assert_eq!(feed.channels[0].categories, vec!["news", "politics"]);
        assert!(feed.find_video("v2").is_some());
        assert!(feed.find_video("garbage").is_none());
    }

    #[test]
    fn test_feed_keeps_records_with_legacy_duplicates() {
        let feed: FeedSnapshot = serde_json::from_value(json!({
            "videos": [
                { "id": "v1", "channelId": "UC1", "viewCount": 10, "views": 10 },
                { "id": "v2", "channelId": "UC1", "publishedAt": "", "uploadDate": "2026-01-10T10:00:00Z" }
            ]
        }))
        .unwrap();

        assert_eq!(feed.videos.len(), 2);
        assert_eq!(feed.videos[0].views(), 10.0);
        assert!(feed.videos[1].published().is_some());
    }

    #[test]
    fn test_hydrated_videos_inherit_roster_categories() {
        let feed = FeedSnapshot {
            generated_at: None,
            videos: vec![
                Video::new("v1", "UC1"),
                Video::new("v2", "UC1").with_categories(["own"]),
                Video::new("v3", "UC-unknown"),
            ],
            channels: vec![ChannelRecord {
                id: "UC1".to_string(),
                categories: vec!["news".to_string()],
                ..ChannelRecord::default()
            }],
        };

        let videos = feed.hydrated_videos();
        assert_eq!(videos[0].categories, vec!["news"]);
        assert_eq!(videos[1].categories, vec!["own"]);
        assert!(videos[2].categories.is_empty());
        // Source snapshot untouched
        assert!(feed.videos[0].categories.is_empty());
    }

    #[test]
    fn test_preferences_defaults() {
        let prefs: Preferences = serde_json::from_value(json!({})).unwrap();
        assert!(prefs.use_like_signals);
        assert!(prefs.hidden.is_empty());
        assert_eq!(prefs, Preferences::default());
    }

    #[tokio::test]
    async fn test_load_from_files() {
        let dir = TempDir::new().unwrap();
        let feed_path = write(
            &dir,
            "feed.json",
            json!({ "videos": [{ "id": "v1", "channelId": "UC1" }], "channels": [] }),
        );
        let prefs_path = write(
            &dir,
            "prefs.json",
            json!({
                "userSignals": { "follows": { "UC1": true }, "likedByChannel": [["UC1", 2]] },
                "hidden": { "videoIds": ["v9"], "channelIds": [] },
                "useLikeSignals": false,
                "channelAppearanceCount": { "UC1": 2 }
            }),
        );

        let source = FileFeedSource::new(&feed_path).with_preferences(Some(&prefs_path));
        let feed = source.load_feed().await.unwrap();
        let prefs = source.load_preferences().await.unwrap();

        assert_eq!(feed.videos.len(), 1);
        assert!(prefs.user_signals.is_following("UC1"));
        assert_eq!(prefs.user_signals.liked_count("UC1"), 2.0);
        assert!(prefs.hidden.video_ids.contains("v9"));
        assert!(!prefs.use_like_signals);
        assert_eq!(prefs.channel_appearance_count.get("UC1"), Some(&2));
    }

    #[tokio::test]
    async fn test_missing_preferences_path_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let feed_path = write(&dir, "feed.json", json!({ "videos": [] }));

        let source = FileFeedSource::new(&feed_path).with_preferences(None::<PathBuf>);
        let prefs = source.load_preferences().await.unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[tokio::test]
    async fn test_missing_feed_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = FileFeedSource::new(dir.path().join("absent.json"));

        let err = source.load_feed().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SnapshotError>(),
            Some(SnapshotError::FeedNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, "{ not json").unwrap();

        let source = FileFeedSource::new(&path);
        let result = tokio_test::block_on(source.load_feed());
        assert!(result.is_err());
    }
}
