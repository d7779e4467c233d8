//! Hidden video and channel filtering
//!
//! Runs ahead of any scoring so hidden content never takes a ranking slot.

use crate::models::{HiddenItems, Video};
use std::borrow::Borrow;
use std::collections::HashSet;

/// Whether a video or its channel is hidden
pub fn is_hidden(
    video: &Video,
    hidden_video_ids: &HashSet<String>,
    hidden_channel_ids: &HashSet<String>,
) -> bool {
    hidden_video_ids.contains(video.id.as_str()) || hidden_channel_ids.contains(video.channel())
}

/// Drop hidden candidates, keeping the order of the rest
///
/// Works on owned videos or references alike. Filtering is idempotent.
pub fn filter_hidden_candidates<V, I>(
    candidates: I,
    hidden_video_ids: &HashSet<String>,
    hidden_channel_ids: &HashSet<String>,
) -> Vec<V>
where
    I: IntoIterator<Item = V>,
    V: Borrow<Video>,
{
    let mut removed = 0usize;
    let visible: Vec<V> = candidates
        .into_iter()
        .filter(|candidate| {
            let hidden = is_hidden(candidate.borrow(), hidden_video_ids, hidden_channel_ids);
            if hidden {
                removed += 1;
            }
            !hidden
        })
        .collect();

    if removed > 0 {
        tracing::debug!("Filtered {} hidden candidates, {} remain", removed, visible.len());
    }
    visible
}

impl HiddenItems {
    /// Apply [`filter_hidden_candidates`] with this hidden set
    pub fn apply<V, I>(&self, candidates: I) -> Vec<V>
    where
        I: IntoIterator<Item = V>,
        V: Borrow<Video>,
    {
        filter_hidden_candidates(candidates, &self.video_ids, &self.channel_ids)
    }

    pub fn is_empty(&self) -> bool {
        self.video_ids.is_empty() && self.channel_ids.is_empty()
    }
}
