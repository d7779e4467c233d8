//! Featured video selection
//!
//! Applies the hard eligibility rules, scores every survivor with the blended
//! recency / engagement / personalization formula and keeps the single best.

use crate::config::FeaturedOptions;
use crate::models::{Featured, FeaturedScore, ScoreBreakdown, ScoreReason, UserSignals, Video};
use crate::signals::{
    age_hours, diversity_penalty, engagement_score, finite_or_zero, personalization_score,
    recency_score, window_multiplier,
};
use chrono::{DateTime, Utc};

/// Why a candidate cannot be featured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    MissingId,
    ExcludedVideo,
    ExcludedChannel,
    Short,
    UnknownDuration,
    TooShort,
}

/// Check the hard filters for a single candidate
pub fn check_eligibility(video: &Video, options: &FeaturedOptions) -> Result<(), Ineligible> {
    let id = video.resolved_id().ok_or(Ineligible::MissingId)?;
    if options.exclude_video_ids.contains(id) {
        return Err(Ineligible::ExcludedVideo);
    }
    if options.exclude_channel_ids.contains(video.channel()) {
        return Err(Ineligible::ExcludedChannel);
    }
    if video.is_short {
        return Err(Ineligible::Short);
    }
    let seconds = video
        .resolved_duration_seconds()
        .ok_or(Ineligible::UnknownDuration)?;
    if seconds < options.config.min_duration_seconds {
        return Err(Ineligible::TooShort);
    }
    Ok(())
}

/// Score one candidate as of `now`
///
/// `total = recency*wR + engagement*window*wE + personalization*wP - diversity`
pub fn compute_featured_score(
    video: &Video,
    user_signals: &UserSignals,
    options: &FeaturedOptions,
    now: DateTime<Utc>,
) -> FeaturedScore {
    let cfg = &options.config;
    let published = video.published();
    let now = Some(now);

    let recency = recency_score(published, now, cfg.recency_half_life_hours);

    let age = age_hours(published, now);
    let in_recent_window = age.is_some_and(|a| a <= cfg.recent_window_hours);
    let engagement = engagement_score(video) * window_multiplier(age, cfg.recent_window_hours);

    let channel = video.channel();
    let personalization = personalization_score(
        channel,
        user_signals,
        cfg.followed_channel_bonus,
        cfg.liked_channel_bonus_max,
        cfg.liked_channel_bonus_step,
    );

    let penalty = diversity_penalty(
        channel,
        &options.channel_appearance_count,
        cfg.max_channel_appearances_before_penalty,
        cfg.diversity_penalty_per_extra_appearance,
    );

    let total = finite_or_zero(
        recency * cfg.recency_weight
            + engagement * cfg.engagement_weight
            + personalization * cfg.personalization_weight
            - penalty,
    );

    let reason = if engagement > recency {
        ScoreReason::Engagement
    } else {
        ScoreReason::Recency
    };

    FeaturedScore {
        total,
        reason,
        breakdown: ScoreBreakdown {
            recency_score: recency,
            engagement_score: engagement,
            personalization_score: personalization,
            diversity_penalty: penalty,
            in_recent_window,
        },
    }
}

/// Pick the eligible candidate with the strictly greatest total
///
/// Ties keep the earliest candidate. Returns `None` when the list is empty or
/// nothing survives the eligibility filters.
pub fn pick_featured_video<'a>(
    candidates: &'a [Video],
    options: &FeaturedOptions,
) -> Option<Featured<'a>> {
    if candidates.is_empty() {
        return None;
    }

    let now = options.now.unwrap_or_else(Utc::now);
    let mut best: Option<Featured<'a>> = None;
    let mut rejected = 0usize;

    for video in candidates {
        if let Err(reason) = check_eligibility(video, options) {
            tracing::trace!("Skipping featured candidate {:?}: {:?}", video.id, reason);
            rejected += 1;
            continue;
        }

        let score = compute_featured_score(video, &options.user_signals, options, now);
        let better = best
            .as_ref()
            .is_none_or(|current| score.total > current.score.total);
        if better {
            best = Some(Featured { video, score });
        }
    }

    match &best {
        Some(featured) => tracing::debug!(
            "Featured {} (total {:.4}, reason {:?}) from {} candidates, {} ineligible",
            featured.video.id,
            featured.score.total,
            featured.score.reason,
            candidates.len(),
            rejected
        ),
        None => tracing::debug!(
            "No featured video: all {} candidates ineligible",
            candidates.len()
        ),
    }

    best
}
