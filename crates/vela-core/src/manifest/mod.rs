//! Manifest parsing and synthesis for DASH, HLS and SmoothStreaming
//!
//! Content-backed streams hand us raw manifest text; this module turns it
//! into the in-memory form the playback engine consumes. For providers that
//! only expose raw segment URLs, `synth` generates a DASH manifest on the
//! fly.

mod dash;
mod hls;
mod smooth;
pub mod synth;

pub use dash::{parse_mpd, DashManifest, DashRepresentation};
pub use hls::{parse_playlist, HlsManifest, HlsVariant};
pub use smooth::{parse_smooth_manifest, SmoothManifest};

use serde::{Deserialize, Serialize};

use crate::types::DeliveryMethod;

/// Adaptive manifest families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManifestType {
    Dash,
    Hls,
    SmoothStreaming,
}

impl ManifestType {
    /// Maps a delivery method to its manifest family, when it has one
    pub fn from_delivery(delivery: DeliveryMethod) -> Option<Self> {
        match delivery {
            DeliveryMethod::Dash => Some(ManifestType::Dash),
            DeliveryMethod::Hls => Some(ManifestType::Hls),
            DeliveryMethod::SmoothStreaming => Some(ManifestType::SmoothStreaming),
            DeliveryMethod::Progressive | DeliveryMethod::Torrent => None,
        }
    }
}

impl std::fmt::Display for ManifestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestType::Dash => write!(f, "DASH"),
            ManifestType::Hls => write!(f, "HLS"),
            ManifestType::SmoothStreaming => write!(f, "SmoothStreaming"),
        }
    }
}

/// A manifest parsed from catalog-provided text, ready to hand to the
/// playback engine together with its base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedManifest {
    Dash(DashManifest),
    Hls(HlsManifest),
    Smooth(SmoothManifest),
}

impl ParsedManifest {
    pub fn manifest_type(&self) -> ManifestType {
        match self {
            ParsedManifest::Dash(_) => ManifestType::Dash,
            ParsedManifest::Hls(_) => ManifestType::Hls,
            ParsedManifest::Smooth(_) => ManifestType::SmoothStreaming,
        }
    }
}

/// Detect manifest type from document content
pub fn detect_manifest_type(content: &str) -> Option<ManifestType> {
    if content.contains("#EXTM3U") {
        return Some(ManifestType::Hls);
    }
    if content.contains("<MPD") || content.contains("urn:mpeg:dash") {
        return Some(ManifestType::Dash);
    }
    if content.contains("<SmoothStreamingMedia") {
        return Some(ManifestType::SmoothStreaming);
    }
    None
}
