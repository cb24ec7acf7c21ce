//! SmoothStreaming manifest parser
//!
//! Same attribute-extraction approach as the DASH parser; the format only
//! appears on a handful of providers so the summary stays minimal.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Parsed SmoothStreaming manifest summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothManifest {
    /// Presentation duration; absent for live presentations
    pub duration: Option<Duration>,
    /// True for `IsLive="TRUE"` manifests
    pub is_live: bool,
    /// Number of `<StreamIndex>` tracks
    pub stream_index_count: usize,
}

/// Parse `<SmoothStreamingMedia>` content into a [`SmoothManifest`]
pub fn parse_smooth_manifest(content: &str) -> Result<SmoothManifest> {
    let root_start = content
        .find("<SmoothStreamingMedia")
        .ok_or_else(|| Error::ManifestParse {
            kind: "SmoothStreaming",
            reason: "document has no <SmoothStreamingMedia> root element".to_string(),
        })?;
    let root = &content[root_start..];
    let attrs_end = root.find('>').ok_or_else(|| Error::ManifestParse {
        kind: "SmoothStreaming",
        reason: "unterminated root element".to_string(),
    })?;
    let attrs = &root[..attrs_end];

    let timescale = extract_attr(attrs, "TimeScale")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10_000_000);
    let duration = extract_attr(attrs, "Duration")
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|d| *d > 0)
        .map(|ticks| Duration::from_secs_f64(ticks as f64 / timescale as f64));
    let is_live = extract_attr(attrs, "IsLive")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let stream_index_count = content.matches("<StreamIndex").count();
    if stream_index_count == 0 {
        return Err(Error::ManifestParse {
            kind: "SmoothStreaming",
            reason: "no StreamIndex tracks found".to_string(),
        });
    }

    Ok(SmoothManifest {
        duration,
        is_live,
        stream_index_count,
    })
}

fn extract_attr(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!("{name}=\"");
    let start = attrs.find(&pattern)? + pattern.len();
    let end = attrs[start..].find('"')?;
    Some(attrs[start..start + end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0"?>
<SmoothStreamingMedia MajorVersion="2" MinorVersion="0" TimeScale="10000000" Duration="1209510000">
  <StreamIndex Type="video" Chunks="61" QualityLevels="3"/>
  <StreamIndex Type="audio" Chunks="61" QualityLevels="1"/>
</SmoothStreamingMedia>"#;

    #[test]
    fn test_parse_smooth() {
        let manifest = parse_smooth_manifest(MANIFEST).unwrap();
        assert!(!manifest.is_live);
        assert_eq!(manifest.stream_index_count, 2);
        assert_eq!(
            manifest.duration,
            Some(Duration::from_secs_f64(120.951))
        );
    }

    #[test]
    fn test_parse_live_flag() {
        let live = r#"<SmoothStreamingMedia IsLive="TRUE"><StreamIndex/></SmoothStreamingMedia>"#;
        let manifest = parse_smooth_manifest(live).unwrap();
        assert!(manifest.is_live);
        assert_eq!(manifest.duration, None);
    }

    #[test]
    fn test_parse_rejects_other_xml() {
        assert!(parse_smooth_manifest("<MPD/>").is_err());
    }
}
