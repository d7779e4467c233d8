//! Related list ranking with channel diversification
//!
//! Candidates are scored against the current video, stably sorted, and then
//! placed one at a time: each step takes the remaining candidate with the best
//! score after the diversity penalty its channel would incur at that point.
//! A channel that has used up its free appearances is demoted, not dropped.

use crate::config::RelatedOptions;
use crate::models::{RankedVideo, RelatedScore, Video};
use crate::related::compute_related_score;
use crate::signals::penalty_for_appearances;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Rank related candidates for `options.current_video`
///
/// The current video is excluded by id. The full list is returned; truncation
/// is left to the caller.
pub fn rank_and_diversify_related<'a>(
    candidates: &'a [Video],
    options: &RelatedOptions,
) -> Vec<RankedVideo<'a>> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let fallback = Video::default();
    let current = options.current_video.as_ref().unwrap_or(&fallback);
    let current_id = current.resolved_id();

    let mut scored: Vec<(&'a Video, RelatedScore)> = candidates
        .iter()
        .filter(|video| current_id.is_none() || video.resolved_id() != current_id)
        .map(|video| {
            let score = compute_related_score(video, current, &options.user_signals, options);
            (video, score)
        })
        .collect();

    // Stable: equal totals keep their input order
    scored.sort_by(|a, b| b.1.total.partial_cmp(&a.1.total).unwrap_or(Ordering::Equal));

    let ranked = diversify(scored, options);
    tracing::debug!(
        "Ranked {} related videos for {:?} ({} candidates)",
        ranked.len(),
        current_id,
        candidates.len()
    );
    ranked
}

fn diversify<'a>(
    mut remaining: Vec<(&'a Video, RelatedScore)>,
    options: &RelatedOptions,
) -> Vec<RankedVideo<'a>> {
    let cfg = &options.config;
    let mut appearances = options.channel_appearance_count.clone();
    let mut ranked = Vec::with_capacity(remaining.len());

    // Penalty the candidate would carry if placed next, counting itself
    let penalty_for = |video: &Video, appearances: &HashMap<String, u32>| {
        let channel = video.channel();
        if channel.is_empty() {
            return 0.0;
        }
        let placed = appearances.get(channel).copied().unwrap_or(0);
        penalty_for_appearances(
            placed.saturating_add(1),
            cfg.max_channel_appearances_before_penalty,
            cfg.diversity_penalty_per_extra_appearance,
        )
    };

    while !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_penalty = penalty_for(remaining[0].0, &appearances);
        let mut best_adjusted = remaining[0].1.total - best_penalty;

        for (index, (video, score)) in remaining.iter().enumerate().skip(1) {
            let penalty = penalty_for(video, &appearances);
            let adjusted = score.total - penalty;
            if adjusted > best_adjusted {
                best_index = index;
                best_penalty = penalty;
                best_adjusted = adjusted;
            }
        }

        let (video, score) = remaining.remove(best_index);
        let channel = video.channel();
        if !channel.is_empty() {
            *appearances.entry(channel.to_string()).or_insert(0) += 1;
        }

        if best_penalty > 0.0 {
            tracing::trace!(
                "Placed {} at {} with diversity penalty {:.3}",
                video.id,
                ranked.len(),
                best_penalty
            );
        }

        ranked.push(RankedVideo {
            video,
            score,
            diversity_penalty: best_penalty,
            adjusted_total: best_adjusted,
        });
    }

    ranked
}
