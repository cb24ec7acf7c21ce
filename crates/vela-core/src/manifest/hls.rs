//! HLS playlist parser
//!
//! Adapter around `m3u8-rs` that reduces master and media playlists to the
//! summary the resolver needs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Resolution;

/// One variant stream from a master playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HlsVariant {
    pub uri: String,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    pub resolution: Option<Resolution>,
    pub codecs: Option<String>,
}

/// Parsed HLS playlist summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HlsManifest {
    /// Multivariant (master) playlist
    Master { variants: Vec<HlsVariant> },
    /// Media playlist with segments
    Media {
        segment_count: usize,
        target_duration: Duration,
        /// True while the playlist has no EXT-X-ENDLIST
        is_live: bool,
    },
}

/// Parse playlist content into an [`HlsManifest`]
pub fn parse_playlist(content: &str) -> Result<HlsManifest> {
    if content.contains("#EXT-X-STREAM-INF") {
        parse_master(content)
    } else {
        parse_media(content)
    }
}

fn parse_master(content: &str) -> Result<HlsManifest> {
    let parsed = m3u8_rs::parse_master_playlist_res(content.as_bytes()).map_err(|e| {
        Error::ManifestParse {
            kind: "HLS",
            reason: format!("master playlist: {e:?}"),
        }
    })?;

    let variants = parsed
        .variants
        .iter()
        .map(|variant| HlsVariant {
            uri: variant.uri.clone(),
            bandwidth: variant.bandwidth,
            resolution: variant.resolution.map(|r| Resolution {
                width: r.width as u32,
                height: r.height as u32,
            }),
            codecs: variant.codecs.clone(),
        })
        .collect();

    Ok(HlsManifest::Master { variants })
}

fn parse_media(content: &str) -> Result<HlsManifest> {
    let parsed = m3u8_rs::parse_media_playlist_res(content.as_bytes()).map_err(|e| {
        Error::ManifestParse {
            kind: "HLS",
            reason: format!("media playlist: {e:?}"),
        }
    })?;

    Ok(HlsManifest::Media {
        segment_count: parsed.segments.len(),
        target_duration: Duration::from_secs(parsed.target_duration),
        is_live: !parsed.end_list,
    })
}
