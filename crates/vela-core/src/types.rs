//! Core types for Vela - the stream catalog data model
//!
//! Everything here is populated by an external extraction layer (the
//! provider APIs) and treated as an immutable snapshot during resolution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport/packaging shape of a candidate stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// Single progressive file over HTTP
    Progressive,
    /// MPEG-DASH manifest
    Dash,
    /// HTTP Live Streaming playlist
    Hls,
    /// Microsoft SmoothStreaming manifest
    SmoothStreaming,
    /// Peer-to-peer delivery, not supported by the playback engine
    Torrent,
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMethod::Progressive => write!(f, "progressive"),
            DeliveryMethod::Dash => write!(f, "DASH"),
            DeliveryMethod::Hls => write!(f, "HLS"),
            DeliveryMethod::SmoothStreaming => write!(f, "SmoothStreaming"),
            DeliveryMethod::Torrent => write!(f, "torrent"),
        }
    }
}

/// Lifecycle classification of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    /// Regular video-on-demand
    Video,
    /// Ongoing live stream
    Live,
    /// Ended live stream with DVR segment history
    PostLive,
    /// Audio-only on-demand
    AudioOnly,
    /// Ongoing audio live stream
    AudioLive,
    /// Ended audio live stream
    PostLiveAudio,
}

impl StreamType {
    /// Returns true for content currently at a live edge
    pub fn is_live(&self) -> bool {
        matches!(self, StreamType::Live | StreamType::AudioLive)
    }

    /// Returns true for ended live content with DVR history
    pub fn is_post_live(&self) -> bool {
        matches!(self, StreamType::PostLive | StreamType::PostLiveAudio)
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamType::Video => write!(f, "video"),
            StreamType::Live => write!(f, "live"),
            StreamType::PostLive => write!(f, "post-live"),
            StreamType::AudioOnly => write!(f, "audio"),
            StreamType::AudioLive => write!(f, "audio-live"),
            StreamType::PostLiveAudio => write!(f, "post-live-audio"),
        }
    }
}

/// Container/caption format of a stream as reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    // Video containers
    Mpeg4,
    WebM,
    V3gpp,
    // Audio containers
    M4a,
    WebMa,
    Mp3,
    Opus,
    Ogg,
    // Caption formats
    Vtt,
    Ttml,
    Srt,
    // Anything the extraction layer could not classify
    Unknown,
}

impl MediaFormat {
    /// MIME type for caption formats; `None` for non-caption formats,
    /// which the subtitle collector skips silently.
    pub fn caption_mime_type(&self) -> Option<&'static str> {
        match self {
            MediaFormat::Vtt => Some("text/vtt"),
            MediaFormat::Ttml => Some("application/ttml+xml"),
            MediaFormat::Srt => Some("application/x-subrip"),
            _ => None,
        }
    }

    /// Returns true for audio container formats
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            MediaFormat::M4a
                | MediaFormat::WebMa
                | MediaFormat::Mp3
                | MediaFormat::Opus
                | MediaFormat::Ogg
        )
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Technical per-format metadata carried by providers that hand back raw
/// segment URLs instead of manifests. Required by the manifest synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatProfile {
    /// Provider-specific format identifier (itag)
    pub id: i32,
    /// Codec string, e.g. "avc1.64001F" or "opus"
    pub codecs: String,
    /// Full MIME type, e.g. "video/mp4"
    pub mime_type: String,
    /// Bitrate in bits per second
    pub bitrate: u64,
    /// Initialization byte range (progressive-as-DASH only)
    pub init_range: Option<(u64, u64)>,
    /// Segment index byte range (progressive-as-DASH only)
    pub index_range: Option<(u64, u64)>,
    /// Target segment duration in seconds (OTF and post-live DVR)
    pub target_duration_sec: Option<u32>,
    /// Frame dimensions, if a video format
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Audio sample rate, if an audio format
    pub sample_rate: Option<u32>,
    /// Audio channel count, if an audio format
    pub channels: Option<u32>,
}

/// One candidate stream as obtained from the catalog. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Delivery method of this stream
    pub delivery: DeliveryMethod,
    /// Content locator: a URL, or raw manifest/segment text when `is_url`
    /// is false
    pub content: String,
    /// Whether `content` holds a URL (true) or raw manifest text (false)
    pub is_url: bool,
    /// Base URL of the manifest the stream came from, if any
    pub manifest_url: Option<String>,
    /// Container format
    pub format: MediaFormat,
    /// Provider-specific format identifier (itag); -1 when unknown
    pub format_id: i32,
    /// Synthesis metadata, when the provider exposes it
    pub profile: Option<FormatProfile>,
}

impl StreamDescriptor {
    /// Base URL for parsing content-backed manifests: the manifest URL if
    /// the descriptor carries one, the empty string otherwise.
    pub fn base_url(&self) -> &str {
        self.manifest_url.as_deref().unwrap_or("")
    }
}

/// A video stream candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDescriptor {
    pub stream: StreamDescriptor,
    /// Human-facing quality label, e.g. "720p" or "1080p60"
    pub quality_label: String,
    pub resolution: Option<Resolution>,
    pub fps: Option<u32>,
    /// True when the stream carries no audio track
    pub video_only: bool,
}

impl VideoDescriptor {
    /// Height used for sorting; label-derived when the catalog did not
    /// report a resolution.
    pub fn sort_height(&self) -> u32 {
        if let Some(res) = self.resolution {
            return res.height;
        }
        self.quality_label
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or(0)
    }
}

/// An audio stream candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDescriptor {
    pub stream: StreamDescriptor,
    /// Average bitrate in bits per second, when reported
    pub average_bitrate: Option<u64>,
    /// BCP-47 language code, when reported
    pub language: Option<String>,
}

/// A subtitle/caption track candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleDescriptor {
    /// Locator of the caption document
    pub url: String,
    pub format: MediaFormat,
    /// BCP-47 language code
    pub language: String,
    /// True for machine-generated captions
    pub auto_generated: bool,
}

/// Aggregate for one playable content item, populated by the extraction
/// layer. Vela never validates or mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentInfo {
    /// Provider-scoped content id
    pub id: String,
    /// Provider name; keys the provider builder registry
    pub provider: String,
    /// Original page URL
    pub url: String,
    pub title: String,
    pub uploader_name: String,
    pub uploader_url: String,
    pub thumbnail_url: String,
    /// Duration in seconds; 0 for open-ended live
    pub duration_secs: u64,
    pub stream_type: StreamType,
    /// Muxed video streams (carry their own audio)
    pub video_streams: Vec<VideoDescriptor>,
    /// Video-only streams (need a separate audio source)
    pub video_only_streams: Vec<VideoDescriptor>,
    pub audio_streams: Vec<AudioDescriptor>,
    pub subtitles: Vec<SubtitleDescriptor>,
    /// Live-edge HLS playlist URL; empty when not applicable
    #[serde(default)]
    pub hls_url: String,
    /// Live-edge DASH manifest URL; empty when not applicable
    #[serde(default)]
    pub dash_mpd_url: String,
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Preferred default quality tier, e.g. "720p". `None` picks the top
    /// of the ladder.
    pub preferred_quality: Option<String>,
    /// Preferred audio container format for the default audio pick
    pub preferred_audio_format: MediaFormat,
    /// When set, the default video pick stays in the lower half of the
    /// ladder (metered-connection policy)
    pub limit_data_usage: bool,
    /// Distance to keep from the live edge
    pub live_edge_gap: Duration,
    /// Upper bound on the local download index lookup
    pub download_lookup_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            preferred_quality: None,
            preferred_audio_format: MediaFormat::M4a,
            limit_data_usage: false,
            live_edge_gap: Duration::from_secs(10),
            download_lookup_timeout: Duration::from_millis(500),
        }
    }
}
