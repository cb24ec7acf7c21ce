//! Quality selection policy
//!
//! Pure functions over the sorted video ladder: no side effects, no
//! provider knowledge beyond the descriptors themselves. The assembler
//! sorts the ladder highest-first and asks the selector for an index.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AudioDescriptor, MediaFormat, ResolverConfig, VideoDescriptor};

/// Picks a default or user-requested index from a sorted video ladder
pub trait QualitySelector: Send + Sync {
    /// Policy-chosen default index; `None` only for an empty ladder
    fn default_index(&self, sorted_videos: &[VideoDescriptor]) -> Option<usize>;

    /// Resolve a quality label ("720p", "1080p60") to an index. Labels
    /// that match nothing fall back to the default policy, never fail.
    fn override_index(&self, sorted_videos: &[VideoDescriptor], label: &str) -> Option<usize>;
}

/// Tier-preference selector configured from [`ResolverConfig`]
pub struct TierQualitySelector {
    preferred_quality: Option<String>,
    limit_data_usage: bool,
}

impl TierQualitySelector {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            preferred_quality: config.preferred_quality.clone(),
            limit_data_usage: config.limit_data_usage,
        }
    }
}

impl QualitySelector for TierQualitySelector {
    fn default_index(&self, sorted_videos: &[VideoDescriptor]) -> Option<usize> {
        if sorted_videos.is_empty() {
            return None;
        }
        if let Some(preferred) = &self.preferred_quality {
            if let Some(index) = match_label(sorted_videos, preferred) {
                return Some(index);
            }
        }
        if self.limit_data_usage {
            // Ladder is highest-first; stay in the lower half on metered
            // connections.
            return Some(sorted_videos.len() / 2);
        }
        Some(0)
    }

    fn override_index(&self, sorted_videos: &[VideoDescriptor], label: &str) -> Option<usize> {
        match match_label(sorted_videos, label) {
            Some(index) => Some(index),
            None => {
                debug!(label, "quality label matched nothing, using default policy");
                self.default_index(sorted_videos)
            }
        }
    }
}

/// Exact label match first, then nearest height. Ties between equally
/// distant heights go to the higher-quality (earlier) entry.
fn match_label(sorted_videos: &[VideoDescriptor], label: &str) -> Option<usize> {
    if let Some(index) = sorted_videos
        .iter()
        .position(|v| v.quality_label.eq_ignore_ascii_case(label))
    {
        return Some(index);
    }

    let target: u32 = label
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .ok()?;

    sorted_videos
        .iter()
        .enumerate()
        .min_by_key(|(index, v)| (v.sort_height().abs_diff(target), *index))
        .map(|(index, _)| index)
}

/// The sorted ladder plus the elected index, snapshotted onto the plan's
/// metadata tag. An out-of-range index reads as "no selection".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySelection {
    sorted_videos: Vec<VideoDescriptor>,
    selected: Option<usize>,
}

impl QualitySelection {
    pub fn of(sorted_videos: Vec<VideoDescriptor>, selected: Option<usize>) -> Self {
        Self {
            sorted_videos,
            selected,
        }
    }

    pub fn sorted_videos(&self) -> &[VideoDescriptor] {
        &self.sorted_videos
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.filter(|i| *i < self.sorted_videos.len())
    }

    pub fn selected_stream(&self) -> Option<&VideoDescriptor> {
        self.selected_index().map(|i| &self.sorted_videos[i])
    }
}

/// Merge the muxed and video-only stream lists into one ladder: de-dup by
/// (quality label, format) preferring muxed entries, then sort highest
/// resolution first (fps breaks ties).
pub fn merge_video_streams(
    muxed: &[VideoDescriptor],
    video_only: &[VideoDescriptor],
) -> Vec<VideoDescriptor> {
    let mut merged: Vec<VideoDescriptor> = muxed.to_vec();
    for candidate in video_only {
        let duplicate = merged.iter().any(|existing| {
            existing.quality_label.eq_ignore_ascii_case(&candidate.quality_label)
                && existing.stream.format == candidate.stream.format
        });
        if !duplicate {
            merged.push(candidate.clone());
        }
    }
    merged.sort_by(|a, b| {
        (b.sort_height(), b.fps.unwrap_or(0)).cmp(&(a.sort_height(), a.fps.unwrap_or(0)))
    });
    merged
}

/// Default audio pick: highest average bitrate within the preferred
/// format, falling back to the highest bitrate overall.
pub fn default_audio_index(
    streams: &[AudioDescriptor],
    preferred_format: MediaFormat,
) -> Option<usize> {
    if streams.is_empty() {
        return None;
    }

    let best_of = |indices: &mut dyn Iterator<Item = usize>| {
        indices.max_by_key(|&i| (streams[i].average_bitrate.unwrap_or(0), usize::MAX - i))
    };

    let mut preferred = streams
        .iter()
        .enumerate()
        .filter(|(_, a)| a.stream.format == preferred_format)
        .map(|(i, _)| i);
    if let Some(index) = best_of(&mut preferred) {
        return Some(index);
    }
    best_of(&mut (0..streams.len()))
}
