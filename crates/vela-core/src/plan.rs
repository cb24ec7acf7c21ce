//! Playback plan model
//!
//! The plan is the engine-facing output of a resolution: an ordered list of
//! sources (video, then audio, then subtitles) plus the metadata tag. Each
//! source carries a payload telling the engine how to open it and an
//! optional request context for providers that need extra headers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::manifest::{ManifestType, ParsedManifest};
use crate::tag::MetadataTag;
use crate::types::{ContentInfo, StreamDescriptor};

/// How the plan's sources combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    /// Live-edge playback from a single manifest
    Live,
    /// A separately delivered audio track, alone or next to a video-only
    /// video track
    VideoWithSeparatedAudio,
    /// Muxed video carrying its own audio, or a plan without a separate
    /// audio track
    VideoWithAudioOrAudioOnly,
}

/// Unique id of one resolved plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which track a resolved source feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

/// Extra request state some providers require on every media request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Cookie header value
    pub cookie: Option<String>,
    /// Referer page URL
    pub page_url: Option<String>,
}

impl RequestContext {
    pub fn is_empty(&self) -> bool {
        self.cookie.is_none() && self.page_url.is_none()
    }
}

/// Role of a subtitle track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptionRole {
    /// Authored captions
    Caption,
    /// Machine-generated transcription
    Descriptive,
}

/// Engine-facing instruction for opening one source
#[derive(Debug, Clone)]
pub enum SourcePayload {
    /// Fetch the URI as a single progressive file
    Progressive,
    /// Fetch the URI and parse it as the given manifest type
    ManifestUrl(ManifestType),
    /// Manifest already parsed from raw catalog content; the URI holds the
    /// base URL for relative references (may be empty)
    ParsedManifest(ParsedManifest),
    /// Join a live presentation this far behind the edge
    LiveEdge {
        manifest_type: ManifestType,
        edge_gap: Duration,
    },
    /// Side-loaded subtitle document
    SubtitleTrack {
        mime_type: &'static str,
        role: CaptionRole,
        language: String,
    },
}

/// One playable source inside a plan
#[derive(Debug)]
pub struct ResolvedSource {
    pub track: TrackKind,
    /// Media or manifest URI; base URL for parsed-manifest payloads
    pub uri: String,
    /// Stable key for the engine's source cache
    pub cache_key: String,
    pub payload: SourcePayload,
    pub request_context: RequestContext,
}

/// The resolved output handed to the playback engine
#[derive(Debug)]
pub struct PlaybackPlan {
    pub id: PlanId,
    /// Sources in merge order: video, audio, subtitles
    pub sources: Vec<ResolvedSource>,
    pub source_type: SourceType,
    pub metadata: MetadataTag,
    /// True when more than one source was merged into the plan
    pub is_merged: bool,
}

impl PlaybackPlan {
    pub fn sources_of(&self, track: TrackKind) -> impl Iterator<Item = &ResolvedSource> {
        self.sources.iter().filter(move |s| s.track == track)
    }
}

/// Cache key for one stream of one content item. Streams without a format
/// id fall back to the content locator so distinct streams never collide.
pub fn cache_key_of(info: &ContentInfo, stream: &StreamDescriptor) -> String {
    if stream.format_id >= 0 {
        format!("{}:{}", info.id, stream.format_id)
    } else {
        format!("{}:{}", info.id, stream.content)
    }
}
