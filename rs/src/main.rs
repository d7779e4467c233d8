//! vidrank command-line front end
//!
//! Reads a feed snapshot and the viewer's preferences from disk, runs the
//! ranking engine and prints the result as JSON on stdout. Logs go to stderr.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use vidrank::{
    pick_featured_video, rank_and_diversify_related, FeedSource as _, FeaturedOptions,
    FileFeedSource, RelatedOptions, ScoringConfig,
};

#[derive(Parser)]
#[command(name = "vidrank")]
#[command(about = "Featured and related video ranking over a feed snapshot")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick the featured video
    Featured {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Rank related videos for a video in the feed
    Related {
        #[command(flatten)]
        input: InputArgs,

        /// Id of the video being watched
        #[arg(long)]
        video_id: String,

        /// Ignore liked channels regardless of preferences
        #[arg(long)]
        no_like_signals: bool,

        /// Print at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the JSON schema of the input documents
    Schema,
}

#[derive(Args)]
struct InputArgs {
    /// Feed snapshot (feed.json)
    #[arg(long)]
    feed: PathBuf,

    /// Viewer preferences (follows, likes, hidden items)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Scoring overrides; unspecified fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference time (RFC 3339); defaults to now
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("vidrank={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("vidrank version: {}", vidrank::VERSION);

    match cli.command {
        Command::Featured { input } => featured(input).await,
        Command::Related {
            input,
            video_id,
            no_like_signals,
            limit,
        } => related(input, &video_id, no_like_signals, limit).await,
        Command::Schema => schema(),
    }
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<ScoringConfig> {
    let Some(path) = path else {
        return Ok(ScoringConfig::default());
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    ScoringConfig::from_json(&content)
        .with_context(|| format!("Invalid config {}", path.display()))
}

async fn featured(input: InputArgs) -> anyhow::Result<()> {
    let source = FileFeedSource::new(&input.feed).with_preferences(input.prefs.as_ref());
    let feed = source.load_feed().await?;
    let prefs = source.load_preferences().await?;
    let config = load_config(input.config.as_deref()).await?;

    let videos = prefs.hidden.apply(feed.hydrated_videos());

    let mut options = FeaturedOptions::new(config)
        .with_user_signals(prefs.user_signals)
        .with_channel_appearances(prefs.channel_appearance_count);
    options.now = input.now;

    let picked = pick_featured_video(&videos, &options);
    println!("{}", serde_json::to_string_pretty(&picked)?);
    Ok(())
}

async fn related(
    input: InputArgs,
    video_id: &str,
    no_like_signals: bool,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let source = FileFeedSource::new(&input.feed).with_preferences(input.prefs.as_ref());
    let feed = source.load_feed().await?;
    let prefs = source.load_preferences().await?;
    let config = load_config(input.config.as_deref()).await?;

    let videos = feed.hydrated_videos();
    let Some(current) = videos.iter().find(|v| v.resolved_id() == Some(video_id)).cloned() else {
        bail!("Video not found in feed: {}", video_id);
    };

    let candidates = prefs.hidden.apply(videos);

    let options = RelatedOptions::new(current)
        .with_config(config)
        .with_user_signals(prefs.user_signals)
        .with_like_signals(prefs.use_like_signals && !no_like_signals)
        .with_channel_appearances(prefs.channel_appearance_count);

    let mut ranked = rank_and_diversify_related(&candidates, &options);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }

    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

fn schema() -> anyhow::Result<()> {
    let schemas = serde_json::json!({
        "feed": schemars::schema_for!(vidrank::FeedSnapshot),
        "preferences": schemars::schema_for!(vidrank::Preferences),
        "config": schemars::schema_for!(vidrank::ScoringConfig),
    });
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
