//! Built-in provider source builders
//!
//! Each strategy captures one provider's departure from the generic
//! delivery-method dispatch. New providers register their own builder;
//! nothing here is consulted for providers without an entry.

use std::time::Duration;

use tracing::debug;

use super::{
    empty_content, generic_source, manifest_url_source, progressive_source, ElectedStream,
    ProviderSourceBuilder,
};
use crate::error::{Error, Result};
use crate::manifest::{parse_mpd, synth, ParsedManifest};
use crate::plan::{cache_key_of, RequestContext, ResolvedSource, SourcePayload, TrackKind};
use crate::types::{ContentInfo, DeliveryMethod, FormatProfile, ResolverConfig, StreamDescriptor};

/// Marker separating the media URL from the session cookie suffix
const COOKIE_MARKER: &str = "#cookie=";
/// Separator between the cookie value and the trailing length field
const LENGTH_MARKER: &str = "&length=";

/// Builder for a provider whose stream URLs carry a
/// `#cookie=...&length=...` fragment. The cookie is percent-decoded into
/// the request context and the whole suffix stripped from the URI.
pub struct CookieSuffixBuilder;

impl ProviderSourceBuilder for CookieSuffixBuilder {
    fn build_source(
        &self,
        info: &ContentInfo,
        elected: ElectedStream<'_>,
        _config: &ResolverConfig,
        _warnings: &mut Vec<Error>,
    ) -> Result<ResolvedSource> {
        let stream = elected.descriptor();
        let (uri, cookie) = split_cookie_suffix(&stream.content)
            .ok_or_else(|| empty_content(info, stream))?;
        Ok(ResolvedSource {
            track: elected.track(),
            uri,
            cache_key: cache_key_of(info, stream),
            payload: SourcePayload::Progressive,
            request_context: RequestContext {
                cookie: Some(cookie),
                page_url: None,
            },
        })
    }
}

/// Splits `url#cookie=<percent-encoded>&length=<secs>` into the bare URL
/// and the decoded cookie. `None` for anything malformed.
fn split_cookie_suffix(locator: &str) -> Option<(String, String)> {
    let (uri, suffix) = locator.split_once(COOKIE_MARKER)?;
    if uri.trim().is_empty() {
        return None;
    }
    let encoded = match suffix.split_once(LENGTH_MARKER) {
        Some((cookie, _length)) => cookie,
        None => suffix,
    };
    if encoded.is_empty() {
        return None;
    }
    let cookie = urlencoding::decode(encoded).ok()?;
    Some((uri.to_string(), cookie.into_owned()))
}

/// Builder for a provider that requires the originating page URL to be
/// sent alongside every media request.
pub struct PageContextBuilder;

impl ProviderSourceBuilder for PageContextBuilder {
    fn build_source(
        &self,
        info: &ContentInfo,
        elected: ElectedStream<'_>,
        _config: &ResolverConfig,
        _warnings: &mut Vec<Error>,
    ) -> Result<ResolvedSource> {
        let mut source = generic_source(info, elected)?;
        source.request_context.page_url = Some(info.url.clone());
        Ok(source)
    }
}

/// Builder for the largest provider, whose on-demand streams arrive as raw
/// segment-template or progressive URLs and need a synthesized DASH
/// manifest before the engine can play them.
///
/// - VOD with DASH delivery: on-the-fly template manifest, hard failure.
/// - VOD progressive video-only/audio: progressive-DASH wrap, falling back
///   to a plain progressive source when synthesis fails.
/// - VOD muxed progressive: plain progressive, no synthesis.
/// - Ended live streams: DVR manifest, hard failure.
/// - Ongoing live streams are resolved by the assembler's live path and
///   never reach a stream-level builder; seeing one here is unsupported.
pub struct TemplateVodBuilder;

impl ProviderSourceBuilder for TemplateVodBuilder {
    fn build_source(
        &self,
        info: &ContentInfo,
        elected: ElectedStream<'_>,
        _config: &ResolverConfig,
        warnings: &mut Vec<Error>,
    ) -> Result<ResolvedSource> {
        let stream = elected.descriptor();
        let duration = Duration::from_secs(info.duration_secs);

        if info.stream_type.is_live() {
            return Err(Error::UnsupportedDelivery {
                provider: info.provider.clone(),
                delivery: stream.delivery,
                stream_type: info.stream_type.to_string(),
            });
        }

        if info.stream_type.is_post_live() {
            let profile = require_profile(stream)?;
            let mpd = synth::post_live_dvr_manifest(&stream.content, profile, duration)?;
            return synthesized_source(info, elected, &mpd);
        }

        match stream.delivery {
            DeliveryMethod::Dash => {
                let profile = require_profile(stream)?;
                let mpd = synth::otf_manifest(&stream.content, profile, duration)?;
                synthesized_source(info, elected, &mpd)
            }
            DeliveryMethod::Progressive => {
                let needs_wrap =
                    elected.is_video_only() || elected.track() == TrackKind::Audio;
                if needs_wrap {
                    if let Some(profile) = &stream.profile {
                        match synth::progressive_manifest(&stream.content, profile, duration) {
                            Ok(mpd) => return synthesized_source(info, elected, &mpd),
                            Err(e) if e.is_recoverable() => {
                                debug!(
                                    format_id = stream.format_id,
                                    error = %e,
                                    "progressive wrap failed, serving plain progressive"
                                );
                                warnings.push(e);
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
                progressive_source(info, elected)
            }
            DeliveryMethod::Hls => manifest_url_source(info, elected),
            DeliveryMethod::SmoothStreaming | DeliveryMethod::Torrent => {
                Err(Error::UnsupportedDelivery {
                    provider: info.provider.clone(),
                    delivery: stream.delivery,
                    stream_type: info.stream_type.to_string(),
                })
            }
        }
    }
}

fn require_profile(stream: &StreamDescriptor) -> Result<&FormatProfile> {
    stream.profile.as_ref().ok_or(Error::MissingProfile {
        format_id: stream.format_id,
    })
}

/// Wraps a synthesized MPD as a parsed-manifest source. Template media
/// URLs are absolute, so the base URL stays empty.
fn synthesized_source(
    info: &ContentInfo,
    elected: ElectedStream<'_>,
    mpd: &str,
) -> Result<ResolvedSource> {
    let manifest = parse_mpd(mpd)?;
    Ok(ResolvedSource {
        track: elected.track(),
        uri: String::new(),
        cache_key: cache_key_of(info, elected.descriptor()),
        payload: SourcePayload::ParsedManifest(ParsedManifest::Dash(manifest)),
        request_context: RequestContext::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaFormat, StreamType, VideoDescriptor};

    fn info_for(provider: &str, stream_type: StreamType) -> ContentInfo {
        ContentInfo {
            id: "c1".to_string(),
            provider: provider.to_string(),
            url: format!("https://{provider}.example/watch/c1"),
            title: String::new(),
            uploader_name: String::new(),
            uploader_url: String::new(),
            thumbnail_url: String::new(),
            duration_secs: 120,
            stream_type,
            video_streams: Vec::new(),
            video_only_streams: Vec::new(),
            audio_streams: Vec::new(),
            subtitles: Vec::new(),
            hls_url: String::new(),
            dash_mpd_url: String::new(),
        }
    }

    fn video(delivery: DeliveryMethod, content: &str, video_only: bool) -> VideoDescriptor {
        VideoDescriptor {
            stream: StreamDescriptor {
                delivery,
                content: content.to_string(),
                is_url: true,
                manifest_url: None,
                format: MediaFormat::Mpeg4,
                format_id: 134,
                profile: None,
            },
            quality_label: "480p".to_string(),
            resolution: None,
            fps: None,
            video_only,
        }
    }

    fn profile() -> FormatProfile {
        FormatProfile {
            id: 134,
            codecs: "avc1.4d401f".to_string(),
            mime_type: "video/mp4".to_string(),
            bitrate: 1_000_000,
            init_range: Some((0, 740)),
            index_range: Some((741, 1500)),
            target_duration_sec: Some(5),
            width: Some(854),
            height: Some(480),
            sample_rate: None,
            channels: None,
        }
    }

    #[test]
    fn test_cookie_suffix_well_formed() {
        let (uri, cookie) =
            split_cookie_suffix("https://cdn.example/v.mp4#cookie=session%3Dabc%20def&length=300")
                .unwrap();
        assert_eq!(uri, "https://cdn.example/v.mp4");
        assert_eq!(cookie, "session=abc def");
    }

    #[test]
    fn test_cookie_suffix_without_length() {
        let (_, cookie) = split_cookie_suffix("https://cdn.example/v.mp4#cookie=k%3Dv").unwrap();
        assert_eq!(cookie, "k=v");
    }

    #[test]
    fn test_cookie_suffix_malformed_is_error_not_panic() {
        let info = info_for("niconico", StreamType::Video);
        for locator in ["https://cdn.example/v.mp4", "#cookie=k%3Dv", "https://cdn.example/v.mp4#cookie="] {
            let video = video(DeliveryMethod::Progressive, locator, false);
            let err = CookieSuffixBuilder
                .build_source(
                    &info,
                    ElectedStream::Video(&video),
                    &ResolverConfig::default(),
                    &mut Vec::new(),
                )
                .unwrap_err();
            assert!(matches!(err, Error::EmptyContent { .. }), "locator {locator:?}");
        }
    }

    #[test]
    fn test_page_context_attached() {
        let info = info_for("bilibili", StreamType::Video);
        let video = video(DeliveryMethod::Progressive, "https://cdn.example/v.mp4", false);
        let source = PageContextBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap();
        assert_eq!(
            source.request_context.page_url.as_deref(),
            Some("https://bilibili.example/watch/c1")
        );
    }

    #[test]
    fn test_template_vod_otf_synthesis() {
        let info = info_for("youtube", StreamType::Video);
        let mut video = video(DeliveryMethod::Dash, "https://cdn.example/otf", true);
        video.stream.profile = Some(profile());
        let source = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap();
        let SourcePayload::ParsedManifest(ParsedManifest::Dash(manifest)) = source.payload else {
            panic!("expected synthesized DASH payload");
        };
        // 120s of 5s segments
        assert_eq!(manifest.segment_count(), Some(24));
    }

    #[test]
    fn test_template_vod_otf_hard_failure() {
        let info = info_for("youtube", StreamType::Video);
        let mut video = video(DeliveryMethod::Dash, "not a url", true);
        video.stream.profile = Some(profile());
        let err = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ManifestCreation(_)));
    }

    #[test]
    fn test_template_vod_dash_requires_profile() {
        let info = info_for("youtube", StreamType::Video);
        let video = video(DeliveryMethod::Dash, "https://cdn.example/otf", true);
        let err = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::MissingProfile { format_id: 134 }));
    }

    #[test]
    fn test_template_vod_progressive_wrap() {
        let info = info_for("youtube", StreamType::Video);
        let mut video = video(DeliveryMethod::Progressive, "https://cdn.example/v.mp4", true);
        video.stream.profile = Some(profile());
        let source = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap();
        assert!(matches!(
            source.payload,
            SourcePayload::ParsedManifest(ParsedManifest::Dash(_))
        ));
    }

    #[test]
    fn test_template_vod_progressive_fallback_records_warning() {
        let info = info_for("youtube", StreamType::Video);
        let mut video = video(DeliveryMethod::Progressive, "https://cdn.example/v.mp4", true);
        // No index range: synthesis fails, plain progressive takes over
        let mut p = profile();
        p.index_range = None;
        video.stream.profile = Some(p);

        let mut warnings = Vec::new();
        let source = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut warnings,
            )
            .unwrap();
        assert!(matches!(source.payload, SourcePayload::Progressive));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].is_recoverable());
    }

    #[test]
    fn test_template_vod_muxed_progressive_no_synthesis() {
        let info = info_for("youtube", StreamType::Video);
        let mut video = video(DeliveryMethod::Progressive, "https://cdn.example/v.mp4", false);
        video.stream.profile = Some(profile());
        let source = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap();
        assert!(matches!(source.payload, SourcePayload::Progressive));
    }

    #[test]
    fn test_template_vod_post_live_hard_failure() {
        let info = info_for("youtube", StreamType::PostLive);
        let mut video = video(DeliveryMethod::Dash, "https://cdn.example/dvr", true);
        let mut p = profile();
        p.target_duration_sec = None;
        video.stream.profile = Some(p);
        let err = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ManifestCreation(_)));
    }

    #[test]
    fn test_template_vod_live_unsupported() {
        let info = info_for("youtube", StreamType::Live);
        let mut video = video(DeliveryMethod::Dash, "https://cdn.example/live", true);
        video.stream.profile = Some(profile());
        let err = TemplateVodBuilder
            .build_source(
                &info,
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedDelivery { .. }));
    }
}
