//! Integration tests for the vidrank engine
//!
//! These exercise the public API end to end: feed JSON in, visibility filter,
//! then featured selection or related ranking.

use serde_json::json;
use std::collections::HashMap;
use vidrank::signals::{parse_timestamp, recency_score};
use vidrank::{
    compute_related_score, filter_hidden_candidates, pick_featured_video,
    rank_and_diversify_related, FeaturedOptions, FeedSnapshot, RelatedOptions, ScoringConfig,
    UserSignals, Video,
};

const NOW: &str = "2026-01-10T12:00:00.000Z";

fn featured_options() -> FeaturedOptions {
    FeaturedOptions::default().with_now(parse_timestamp(NOW).unwrap())
}

fn mk_video(id: &str, channel: &str) -> Video {
    Video::new(id, channel)
        .with_published_at("2026-01-10T00:00:00.000Z")
        .with_duration_seconds(600.0)
        .with_counts(1000.0, 0.0, 0.0)
}

fn related_video(id: &str, channel: &str) -> Video {
    Video::new(id, channel)
        .with_title("video analisi tecnologia")
        .with_title_tokens(["video", "analisi", "tecnologia"])
        .with_tags(["tech"])
        .with_categories(["tech"])
}

/// Older high-engagement video beats a fresh low-engagement one inside the window
#[test]
fn test_older_high_engagement_wins_within_window() {
    let recent = mk_video("recent", "c-recent")
        .with_published_at("2026-01-10T10:00:00.000Z")
        .with_counts(1200.0, 10.0, 2.0);
    let older = mk_video("older", "c-older")
        .with_published_at("2026-01-05T10:00:00.000Z")
        .with_counts(350_000.0, 15_000.0, 1_800.0);

    let config = ScoringConfig {
        recent_window_hours: 24.0 * 7.0,
        min_duration_seconds: 240.0,
        ..ScoringConfig::default()
    };
    let options = FeaturedOptions::new(config)
        .with_now(parse_timestamp(NOW).unwrap())
        .with_user_signals(UserSignals::new());

    let candidates = [recent, older];
    let picked = pick_featured_video(&candidates, &options).expect("a featured video");
    assert_eq!(picked.video.id, "older");
    assert!(picked.score.breakdown.in_recent_window);
}

/// Shorts and too-short videos are never featured, whatever their views
#[test]
fn test_shorts_and_short_durations_never_featured() {
    let short_video = mk_video("short1", "c1")
        .with_short(true)
        .with_duration_seconds(60.0)
        .with_counts(999_999.0, 0.0, 0.0);
    let too_short = mk_video("tiny", "c1")
        .with_duration_seconds(120.0)
        .with_counts(500_000.0, 0.0, 0.0);

    let options = featured_options().with_user_signals(
        UserSignals::new()
            .with_follows(["c1"])
            .with_likes([("c1", 10.0)]),
    );

    let candidates = [short_video, too_short];
    assert!(pick_featured_video(&candidates, &options).is_none());
}

/// The followed-channel bonus nudges but does not override a large engagement gap
#[test]
fn test_followed_bonus_does_not_always_dominate() {
    let followed_low = mk_video("followed-low", "followed")
        .with_published_at("2026-01-10T09:00:00.000Z")
        .with_counts(1800.0, 20.0, 1.0);
    let other_high = mk_video("nonfollowed-high", "other")
        .with_published_at("2026-01-10T08:30:00.000Z")
        .with_counts(150_000.0, 8000.0, 900.0);

    let options = featured_options().with_user_signals(
        UserSignals::new()
            .with_follows(["followed"])
            .with_likes([("followed", 3.0)]),
    );

    let candidates = [followed_low, other_high];
    let picked = pick_featured_video(&candidates, &options).unwrap();
    assert_eq!(picked.video.id, "nonfollowed-high");
}

/// With comparable candidates, following a channel decides the pick
#[test]
fn test_followed_bonus_breaks_near_ties() {
    let a = mk_video("a", "plain");
    let b = mk_video("b", "followed");
    let options =
        featured_options().with_user_signals(UserSignals::new().with_follows(["followed"]));

    let candidates = [a, b];
    let picked = pick_featured_video(&candidates, &options).unwrap();
    assert_eq!(picked.video.id, "b");
    assert!(picked.score.breakdown.personalization_score > 0.0);
}

#[test]
fn test_recency_is_half_at_half_life() {
    let now = parse_timestamp(NOW);
    let published = parse_timestamp("2026-01-09T12:00:00.000Z");
    assert!((recency_score(published, now, 24.0) - 0.5).abs() < 1e-10);
}

/// Turning like signals off makes related totals independent of like counts
#[test]
fn test_like_signals_off_do_not_modify_ranking() {
    let current = related_video("current", "root");
    let a = related_video("a", "liked-channel");
    let b = related_video("b", "neutral-channel");

    let options = RelatedOptions::new(current.clone()).with_like_signals(false);
    let liked = UserSignals::new().with_likes([("liked-channel", 20.0)]);

    let score_a = compute_related_score(&a, &current, &liked, &options);
    let score_b = compute_related_score(&b, &current, &UserSignals::new(), &options);
    assert_eq!(score_a.total, score_b.total);

    let candidates = [a, b];
    let ranked = rank_and_diversify_related(&candidates, &options.with_user_signals(liked));
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].score.total, ranked[1].score.total);
}

#[test]
fn test_hidden_channel_never_appears() {
    let candidates = [related_video("x1", "hidden-ch"), related_video("x2", "visible-ch")];
    let no_videos = Default::default();
    let hidden_channels = ["hidden-ch".to_string()].into_iter().collect();

    let filtered = filter_hidden_candidates(candidates, &no_videos, &hidden_channels);
    assert!(!filtered.iter().any(|v| v.channel_id == "hidden-ch"));
    assert_eq!(filtered.len(), 1);
}

#[test]
fn test_empty_candidates() {
    assert!(pick_featured_video(&[], &featured_options()).is_none());

    let options = RelatedOptions::new(related_video("current", "root"));
    assert!(rank_and_diversify_related(&[], &options).is_empty());
}

/// The most frequent channel never runs longer than the free allowance + 1
/// when close alternatives exist
#[test]
fn test_diversity_caps_consecutive_runs() {
    let tokens: Vec<String> = (0..10).map(|i| format!("tok{i}")).collect();
    let current = Video::new("current", "root").with_title_tokens(tokens.clone());

    let mut candidates = Vec::new();
    for i in 0..6 {
        candidates.push(Video::new(format!("big{i}"), "big").with_title_tokens(tokens.clone()));
    }
    for (i, channel) in ["s1", "s1", "s2", "s2", "s3"].iter().enumerate() {
        candidates
            .push(Video::new(format!("small{i}"), *channel).with_title_tokens(tokens[..9].to_vec()));
    }

    let options = RelatedOptions::new(current);
    let max_run = options.config.max_channel_appearances_before_penalty as usize + 1;
    let ranked = rank_and_diversify_related(&candidates, &options);
    assert_eq!(ranked.len(), candidates.len());

    // While alternatives remain, no channel runs longer than the free allowance + 1
    let last_alternative = ranked
        .iter()
        .rposition(|r| r.video.channel_id != "big")
        .unwrap();
    let prefix = &ranked[..=last_alternative];
    let mut run = 1;
    let mut longest = 1;
    for pair in prefix.windows(2) {
        run = if pair[0].video.channel_id == pair[1].video.channel_id {
            run + 1
        } else {
            1
        };
        longest = longest.max(run);
    }
    assert!(longest <= max_run, "run of {longest} in {:?}", ids(&ranked));
    assert_eq!(ranked[0].video.channel_id, "big");
}

fn ids(ranked: &[vidrank::RankedVideo<'_>]) -> Vec<String> {
    ranked.iter().map(|r| r.video.id.clone()).collect()
}

/// Feed JSON through hidden filtering into both pipelines
#[test]
fn test_feed_snapshot_pipeline() {
    let feed: FeedSnapshot = serde_json::from_value(json!({
        "generatedAt": "2026-01-10T06:00:00.000Z",
        "videos": [
            {
                "id": "news-1", "channelId": "UC-news", "title": "Notícies del vespre",
                "publishedAt": "2026-01-10T08:00:00Z", "duration": "PT15M",
                "viewCount": "20000", "likeCount": "900", "commentCount": "80"
            },
            {
                "id": "news-2", "channelId": "UC-news", "title": "Notícies del matí",
                "publishedAt": "2026-01-09T08:00:00Z", "duration": "PT14M",
                "viewCount": "18000", "likeCount": "700", "commentCount": "60"
            },
            {
                "id": "music-1", "channelId": "UC-music", "title": "Concert en directe",
                "publishedAt": "2026-01-10T09:00:00Z", "duration": "1:02:00",
                "viewCount": 90000, "likeCount": 5000, "commentCount": 300
            },
            {
                "id": "short-1", "channelId": "UC-music", "isShort": true,
                "publishedAt": "2026-01-10T11:00:00Z", "duration": "PT40S",
                "viewCount": 900000
            }
        ],
        "channels": [
            { "id": "UC-news", "name": "Notícies", "categories": "news" },
            { "id": "UC-music", "name": "Música", "categories": ["music"] }
        ]
    }))
    .unwrap();

    let hidden = vidrank::HiddenItems {
        video_ids: Default::default(),
        channel_ids: ["UC-music".to_string()].into_iter().collect(),
    };
    let videos = hidden.apply(feed.hydrated_videos());
    assert_eq!(videos.len(), 2);

    let picked = pick_featured_video(&videos, &featured_options()).unwrap();
    assert_eq!(picked.video.channel_id, "UC-news");

    let current = videos.iter().find(|v| v.id == "news-1").unwrap().clone();
    let options = RelatedOptions::new(current).with_channel_appearances(HashMap::new());
    let ranked = rank_and_diversify_related(&videos, &options);
    assert_eq!(ids(&ranked), vec!["news-2"]);
    // Categories come from the channel roster
    assert!(ranked[0].score.breakdown.category_overlap > 0.0);
    assert!(feed.find_video("news-1").unwrap().categories.is_empty());
}
