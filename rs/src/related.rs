//! Related video scoring
//!
//! Scores a candidate against the video currently being watched: Jaccard
//! overlap of title tokens, tags and categories, blended with the viewer's
//! personalization signals.

use crate::config::{RelatedOptions, ScoringConfig};
use crate::models::{RelatedBreakdown, RelatedScore, UserSignals, Video};
use crate::signals::{finite_or_zero, followed_bonus, liked_bonus};
use std::collections::BTreeSet;

fn to_set<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Jaccard index; an empty side means no overlap
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    inter / union
}

/// Per-facet overlaps and their weighted blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicalOverlap {
    pub title: f64,
    pub tags: f64,
    pub categories: f64,
    pub similarity: f64,
}

/// Topical overlap between two videos; symmetric in its arguments
pub fn topical_overlap(a: &Video, b: &Video, config: &ScoringConfig) -> TopicalOverlap {
    let title = jaccard(&to_set(a.title_tokens()), &to_set(b.title_tokens()));
    let tags = jaccard(&to_set(&a.tags), &to_set(&b.tags));
    let categories = jaccard(&to_set(&a.categories), &to_set(&b.categories));

    let similarity = finite_or_zero(
        title * config.title_overlap_weight
            + tags * config.tag_overlap_weight
            + categories * config.category_overlap_weight,
    );

    TopicalOverlap {
        title,
        tags,
        categories,
        similarity,
    }
}

/// Score `candidate` as a follow-up to `current`
///
/// With `use_like_signals` off the liked-channel map is never consulted, so
/// the total cannot depend on like counts. The candidate is scored even when
/// it is `current` itself.
pub fn compute_related_score(
    candidate: &Video,
    current: &Video,
    user_signals: &UserSignals,
    options: &RelatedOptions,
) -> RelatedScore {
    let cfg = &options.config;
    let overlap = topical_overlap(candidate, current, cfg);

    let channel = candidate.channel();
    let mut personalization = followed_bonus(channel, user_signals, cfg.followed_channel_bonus);
    if options.use_like_signals {
        personalization += liked_bonus(
            channel,
            user_signals,
            cfg.liked_channel_bonus_max,
            cfg.liked_channel_bonus_step,
        );
    }

    let total = finite_or_zero(
        overlap.similarity * cfg.topical_weight + personalization * cfg.personalization_weight,
    );

    RelatedScore {
        total,
        breakdown: RelatedBreakdown {
            title_overlap: overlap.title,
            tag_overlap: overlap.tags,
            category_overlap: overlap.categories,
            topical_similarity: overlap.similarity,
            personalization_score: personalization,
            like_signals_used: options.use_like_signals,
        },
    }
}
