//! DASH (Dynamic Adaptive Streaming over HTTP) manifest parser
//!
//! Parses the MPD attributes resolution cares about: presentation type,
//! duration, and the representation ladder with segment counts. Attribute
//! extraction over the raw text keeps the dependency surface small; the
//! playback engine re-parses the document with its own full parser.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Resolution;

/// One representation inside an MPD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashRepresentation {
    pub id: String,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    pub codecs: Option<String>,
    pub resolution: Option<Resolution>,
    /// Number of media segments, when the representation is segmented.
    /// `None` for single-file (SegmentBase) representations.
    pub segment_count: Option<u64>,
}

/// Parsed MPD summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashManifest {
    /// True for `type="dynamic"` (live) presentations
    pub is_dynamic: bool,
    /// Media presentation duration, absent for open-ended live
    pub duration: Option<Duration>,
    pub representations: Vec<DashRepresentation>,
}

impl DashManifest {
    /// Segment count of the first representation, the common single-
    /// representation case for synthesized manifests.
    pub fn segment_count(&self) -> Option<u64> {
        self.representations.first().and_then(|r| r.segment_count)
    }
}

/// Parse MPD content into a [`DashManifest`]
pub fn parse_mpd(content: &str) -> Result<DashManifest> {
    if !content.contains("<MPD") {
        return Err(Error::ManifestParse {
            kind: "DASH",
            reason: "document has no <MPD> root element".to_string(),
        });
    }

    let is_dynamic = content.contains("type=\"dynamic\"");
    let duration = extract_attr(content, "mediaPresentationDuration")
        .and_then(|v| parse_iso_duration(&v));

    let mut representations = Vec::new();
    for (idx, rep_chunk) in content.split("<Representation").skip(1).enumerate() {
        let attrs_end = rep_chunk.find('>').ok_or_else(|| Error::ManifestParse {
            kind: "DASH",
            reason: "unterminated <Representation> element".to_string(),
        })?;
        let attrs = &rep_chunk[..attrs_end];

        let bandwidth = extract_attr(attrs, "bandwidth")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let width = extract_attr(attrs, "width").and_then(|s| s.parse::<u32>().ok());
        let height = extract_attr(attrs, "height").and_then(|s| s.parse::<u32>().ok());
        let resolution = match (width, height) {
            (Some(w), Some(h)) => Some(Resolution::new(w, h)),
            _ => None,
        };

        representations.push(DashRepresentation {
            id: extract_attr(attrs, "id").unwrap_or_else(|| format!("rep_{idx}")),
            bandwidth,
            codecs: extract_attr(attrs, "codecs"),
            resolution,
            segment_count: count_timeline_segments(rep_chunk),
        });
    }

    if representations.is_empty() {
        return Err(Error::ManifestParse {
            kind: "DASH",
            reason: "no representations found in MPD".to_string(),
        });
    }

    Ok(DashManifest {
        is_dynamic,
        duration,
        representations,
    })
}

/// Count segments declared by a SegmentTimeline: each `<S>` entry stands
/// for `1 + r` segments. Returns `None` when the representation has no
/// timeline (SegmentBase single-file layout).
fn count_timeline_segments(rep_chunk: &str) -> Option<u64> {
    let timeline_start = rep_chunk.find("<SegmentTimeline")?;
    let timeline = &rep_chunk[timeline_start..];
    let timeline = match timeline.find("</SegmentTimeline>") {
        Some(end) => &timeline[..end],
        None => timeline,
    };

    let mut count = 0u64;
    for entry in timeline.split("<S ").skip(1) {
        let attrs = entry.split('>').next().unwrap_or("");
        let repeats = extract_attr(attrs, "r")
            .and_then(|r| r.parse::<u64>().ok())
            .unwrap_or(0);
        count += 1 + repeats;
    }
    Some(count)
}

/// Extract attribute value from an XML attributes string
fn extract_attr(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!("{name}=\"");
    let start = attrs.find(&pattern)? + pattern.len();
    let end = attrs[start..].find('"')?;
    Some(attrs[start..start + end].to_string())
}

/// Parse an ISO 8601 duration of the `PT#H#M#S` shape used by MPDs
pub(crate) fn parse_iso_duration(value: &str) -> Option<Duration> {
    let rest = value.strip_prefix("PT")?;
    let mut seconds = 0.0f64;
    let mut number = String::new();
    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' => {
                seconds += number.parse::<f64>().ok()? * 3600.0;
                number.clear();
            }
            'M' => {
                seconds += number.parse::<f64>().ok()? * 60.0;
                number.clear();
            }
            'S' => {
                seconds += number.parse::<f64>().ok()?;
                number.clear();
            }
            _ => return None,
        }
    }
    Some(Duration::from_secs_f64(seconds))
}

/// Format a duration as the ISO 8601 `PT#S` form
pub(crate) fn format_iso_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("PT{}S", secs as u64)
    } else {
        format!("PT{secs:.3}S")
    }
}
