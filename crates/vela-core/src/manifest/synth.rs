//! DASH manifest synthesis
//!
//! Some providers hand back raw segment-template or progressive URLs with
//! per-format metadata instead of a manifest. The three generators here
//! turn those into MPD documents the engine's DASH path can play:
//!
//! - [`otf_manifest`] — on-the-fly template streams (`$Number$` segments)
//! - [`post_live_dvr_manifest`] — ended live streams with DVR history
//! - [`progressive_manifest`] — a progressive file wrapped as single-
//!   representation DASH using init/index byte ranges
//!
//! All three share one output contract: the produced document parses with
//! [`super::parse_mpd`] and round-trips duration and segment count.

use std::fmt::Write as _;
use std::time::Duration;
use url::Url;

use super::dash::format_iso_duration;
use crate::error::{Error, Result};
use crate::types::FormatProfile;

/// Timescale used by synthesized segment timelines (milliseconds)
const TIMESCALE: u64 = 1000;

/// Synthesize an MPD for an on-the-fly segment-template stream.
///
/// The base URL serves numbered segments when a sequence-number query
/// parameter is appended; the timeline is reconstructed from the profile's
/// target segment duration and the known total duration.
///
/// # Errors
///
/// - `Error::ManifestCreation` - URL not a valid template base, missing
///   target segment duration, or unknown total duration
pub fn otf_manifest(base_url: &str, profile: &FormatProfile, duration: Duration) -> Result<String> {
    let url = validate_template_url(base_url)?;
    let target = target_segment_duration(profile)?;
    let count = segment_count(duration, target)?;

    let mut mpd = mpd_header(profile, Some(duration), true);
    write_representation_open(&mut mpd, profile);
    let _ = writeln!(
        mpd,
        "        <SegmentTemplate startNumber=\"0\" timescale=\"{TIMESCALE}\" media=\"{}\">",
        xml_escape(&segment_template_media(&url)),
    );
    mpd.push_str("          <SegmentTimeline>\n");
    let _ = writeln!(
        mpd,
        "            <S d=\"{}\" r=\"{}\"/>",
        target.as_millis(),
        count - 1
    );
    mpd.push_str("          </SegmentTimeline>\n");
    mpd.push_str("        </SegmentTemplate>\n");
    write_representation_close(&mut mpd);
    Ok(mpd)
}

/// Synthesize an MPD for an ended live stream with DVR segment history.
///
/// Same template layout as the OTF case, but the segment history is laid
/// out exactly over the recorded duration: full target-length segments
/// plus one trailing entry for the final partial segment, so the timeline
/// sums to the recording.
///
/// # Errors
///
/// - `Error::ManifestCreation` - missing target duration or zero-length
///   recording
pub fn post_live_dvr_manifest(
    base_url: &str,
    profile: &FormatProfile,
    duration: Duration,
) -> Result<String> {
    let url = validate_template_url(base_url)?;
    let target = target_segment_duration(profile)?;
    if duration.is_zero() {
        return Err(Error::creation("recorded duration unknown, cannot lay out segment history"));
    }
    let target_ms = target.as_millis() as u64;
    let total_ms = duration.as_millis() as u64;
    let full_segments = total_ms / target_ms;
    let remainder_ms = total_ms % target_ms;

    let mut mpd = mpd_header(profile, Some(duration), true);
    write_representation_open(&mut mpd, profile);
    let _ = writeln!(
        mpd,
        "        <SegmentTemplate startNumber=\"0\" timescale=\"{TIMESCALE}\" media=\"{}\">",
        xml_escape(&segment_template_media(&url)),
    );
    mpd.push_str("          <SegmentTimeline>\n");
    if full_segments > 0 {
        let _ = writeln!(
            mpd,
            "            <S d=\"{target_ms}\" r=\"{}\"/>",
            full_segments - 1
        );
    }
    if remainder_ms > 0 {
        let _ = writeln!(mpd, "            <S d=\"{remainder_ms}\"/>");
    }
    mpd.push_str("          </SegmentTimeline>\n");
    mpd.push_str("        </SegmentTemplate>\n");
    write_representation_close(&mut mpd);
    Ok(mpd)
}

/// Synthesize an MPD that wraps a progressive file as single-representation
/// DASH, using the profile's initialization and index byte ranges.
///
/// # Errors
///
/// - `Error::ManifestCreation` - empty URL or missing init/index ranges
pub fn progressive_manifest(
    url: &str,
    profile: &FormatProfile,
    duration: Duration,
) -> Result<String> {
    if url.trim().is_empty() {
        return Err(Error::creation("progressive stream URL is empty"));
    }
    let (init_start, init_end) = profile
        .init_range
        .ok_or_else(|| Error::creation(format!("format {} has no init range", profile.id)))?;
    let (index_start, index_end) = profile
        .index_range
        .ok_or_else(|| Error::creation(format!("format {} has no index range", profile.id)))?;

    let total = (duration > Duration::ZERO).then_some(duration);
    let mut mpd = mpd_header(profile, total, false);
    write_representation_open(&mut mpd, profile);
    let _ = writeln!(mpd, "        <BaseURL>{}</BaseURL>", xml_escape(url));
    let _ = writeln!(
        mpd,
        "        <SegmentBase indexRange=\"{index_start}-{index_end}\">"
    );
    let _ = writeln!(
        mpd,
        "          <Initialization range=\"{init_start}-{init_end}\"/>"
    );
    mpd.push_str("        </SegmentBase>\n");
    write_representation_close(&mut mpd);
    Ok(mpd)
}

fn validate_template_url(base_url: &str) -> Result<Url> {
    if base_url.trim().is_empty() {
        return Err(Error::creation("template stream URL is empty"));
    }
    Url::parse(base_url)
        .map_err(|e| Error::creation(format!("template stream URL does not parse: {e}")))
}

fn target_segment_duration(profile: &FormatProfile) -> Result<Duration> {
    match profile.target_duration_sec {
        Some(secs) if secs > 0 => Ok(Duration::from_secs(u64::from(secs))),
        _ => Err(Error::creation(format!(
            "format {} has no target segment duration",
            profile.id
        ))),
    }
}

fn segment_count(duration: Duration, target: Duration) -> Result<u64> {
    if duration.is_zero() {
        return Err(Error::creation("total duration unknown, cannot lay out segments"));
    }
    Ok(duration.as_millis().div_ceil(target.as_millis()) as u64)
}

/// The segment query parameter appended per segment number
fn segment_template_media(url: &Url) -> String {
    let separator = if url.query().is_some() { '&' } else { '?' };
    format!("{url}{separator}sq=$Number$")
}

fn mpd_header(profile: &FormatProfile, duration: Option<Duration>, segmented: bool) -> String {
    let duration_attr = duration
        .map(|d| format!(" mediaPresentationDuration=\"{}\"", format_iso_duration(d)))
        .unwrap_or_default();
    let alignment = if segmented { " segmentAlignment=\"true\"" } else { "" };
    let mut mpd = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        mpd,
        "<MPD xmlns=\"urn:mpeg:dash:schema:mpd:2011\" \
         profiles=\"urn:mpeg:dash:profile:full:2011\" type=\"static\" \
         minBufferTime=\"PT1.5S\"{duration_attr}>"
    );
    mpd.push_str("  <Period>\n");
    let _ = writeln!(
        mpd,
        "    <AdaptationSet mimeType=\"{}\"{alignment}>",
        xml_escape(&profile.mime_type)
    );
    mpd
}

fn write_representation_open(mpd: &mut String, profile: &FormatProfile) {
    let mut attrs = format!(
        "id=\"{}\" codecs=\"{}\" bandwidth=\"{}\"",
        profile.id,
        xml_escape(&profile.codecs),
        profile.bitrate
    );
    if let (Some(w), Some(h)) = (profile.width, profile.height) {
        let _ = write!(attrs, " width=\"{w}\" height=\"{h}\"");
    }
    if let Some(rate) = profile.sample_rate {
        let _ = write!(attrs, " audioSamplingRate=\"{rate}\"");
    }
    let _ = writeln!(mpd, "      <Representation {attrs}>");
    if let Some(channels) = profile.channels {
        let _ = writeln!(
            mpd,
            "        <AudioChannelConfiguration \
             schemeIdUri=\"urn:mpeg:dash:23003:3:audio_channel_configuration:2011\" \
             value=\"{channels}\"/>"
        );
    }
}

fn write_representation_close(mpd: &mut String) {
    mpd.push_str("      </Representation>\n    </AdaptationSet>\n  </Period>\n</MPD>\n");
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
