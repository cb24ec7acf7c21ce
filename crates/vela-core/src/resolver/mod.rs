//! Delivery resolution
//!
//! Turns one elected stream descriptor into a [`ResolvedSource`]. Provider
//! quirks live in a registry of [`ProviderSourceBuilder`] strategies keyed
//! by provider name; anything not claimed by a registered builder goes
//! through the generic delivery-method dispatch below.

pub mod providers;

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::manifest::{self, ManifestType, ParsedManifest};
use crate::plan::{cache_key_of, RequestContext, ResolvedSource, SourcePayload, TrackKind};
use crate::types::{
    AudioDescriptor, ContentInfo, DeliveryMethod, ResolverConfig, StreamDescriptor,
    VideoDescriptor,
};

/// The stream a selection phase elected, with its track identity
#[derive(Debug, Clone, Copy)]
pub enum ElectedStream<'a> {
    Video(&'a VideoDescriptor),
    Audio(&'a AudioDescriptor),
}

impl<'a> ElectedStream<'a> {
    pub fn descriptor(&self) -> &'a StreamDescriptor {
        match self {
            ElectedStream::Video(v) => &v.stream,
            ElectedStream::Audio(a) => &a.stream,
        }
    }

    pub fn track(&self) -> TrackKind {
        match self {
            ElectedStream::Video(_) => TrackKind::Video,
            ElectedStream::Audio(_) => TrackKind::Audio,
        }
    }

    /// True when the stream carries no audio of its own
    pub fn is_video_only(&self) -> bool {
        matches!(self, ElectedStream::Video(v) if v.video_only)
    }
}

/// Provider-specific source construction strategy.
///
/// `warnings` collects errors the builder recovered from (for example a
/// failed manifest synthesis that fell back to plain progressive); the
/// assembler appends them to the plan's metadata tag.
pub trait ProviderSourceBuilder: Send + Sync {
    fn build_source(
        &self,
        info: &ContentInfo,
        elected: ElectedStream<'_>,
        config: &ResolverConfig,
        warnings: &mut Vec<Error>,
    ) -> Result<ResolvedSource>;
}

/// Dispatches elected streams to provider builders or the generic path
pub struct DeliveryResolver {
    registry: HashMap<String, Box<dyn ProviderSourceBuilder>>,
}

impl DeliveryResolver {
    /// An empty registry; every provider takes the generic path
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in provider strategies
    pub fn with_default_providers() -> Self {
        let mut resolver = Self::new();
        resolver.register("niconico", Box::new(providers::CookieSuffixBuilder));
        resolver.register("bilibili", Box::new(providers::PageContextBuilder));
        resolver.register("youtube", Box::new(providers::TemplateVodBuilder));
        resolver
    }

    /// Register (or replace) the builder for a provider name
    pub fn register(&mut self, provider: impl Into<String>, builder: Box<dyn ProviderSourceBuilder>) {
        self.registry.insert(provider.into(), builder);
    }

    /// Build the source for an elected stream. Registered providers are
    /// consulted first; delivery-method dispatch is the fallback.
    pub fn build_source(
        &self,
        info: &ContentInfo,
        elected: ElectedStream<'_>,
        config: &ResolverConfig,
        warnings: &mut Vec<Error>,
    ) -> Result<ResolvedSource> {
        let stream = elected.descriptor();
        debug!(
            provider = %info.provider,
            delivery = %stream.delivery,
            format_id = stream.format_id,
            "building source"
        );

        if let Some(builder) = self.registry.get(&info.provider) {
            return builder.build_source(info, elected, config, warnings);
        }
        generic_source(info, elected)
    }
}

impl Default for DeliveryResolver {
    fn default() -> Self {
        Self::with_default_providers()
    }
}

/// Delivery-method dispatch for providers without a registered builder
pub fn generic_source(info: &ContentInfo, elected: ElectedStream<'_>) -> Result<ResolvedSource> {
    let stream = elected.descriptor();
    match stream.delivery {
        DeliveryMethod::Progressive => progressive_source(info, elected),
        DeliveryMethod::Dash | DeliveryMethod::Hls | DeliveryMethod::SmoothStreaming => {
            if stream.is_url {
                manifest_url_source(info, elected)
            } else {
                parsed_manifest_source(info, elected)
            }
        }
        DeliveryMethod::Torrent => Err(Error::UnsupportedDelivery {
            provider: info.provider.clone(),
            delivery: stream.delivery,
            stream_type: info.stream_type.to_string(),
        }),
    }
}

/// Direct progressive source from the stream's locator
pub fn progressive_source(info: &ContentInfo, elected: ElectedStream<'_>) -> Result<ResolvedSource> {
    let stream = elected.descriptor();
    let uri = non_empty_locator(info, stream)?;
    Ok(ResolvedSource {
        track: elected.track(),
        uri,
        cache_key: cache_key_of(info, stream),
        payload: SourcePayload::Progressive,
        request_context: RequestContext::default(),
    })
}

/// Manifest-by-URL source; the engine fetches and parses the manifest
pub fn manifest_url_source(info: &ContentInfo, elected: ElectedStream<'_>) -> Result<ResolvedSource> {
    let stream = elected.descriptor();
    let uri = non_empty_locator(info, stream)?;
    let manifest_type =
        ManifestType::from_delivery(stream.delivery).ok_or_else(|| Error::UnsupportedDelivery {
            provider: info.provider.clone(),
            delivery: stream.delivery,
            stream_type: info.stream_type.to_string(),
        })?;
    Ok(ResolvedSource {
        track: elected.track(),
        uri,
        cache_key: cache_key_of(info, stream),
        payload: SourcePayload::ManifestUrl(manifest_type),
        request_context: RequestContext::default(),
    })
}

/// Parse raw catalog-provided manifest text and build from the result. The
/// source URI carries the manifest's base URL for relative references.
pub fn parsed_manifest_source(
    info: &ContentInfo,
    elected: ElectedStream<'_>,
) -> Result<ResolvedSource> {
    let stream = elected.descriptor();
    if stream.content.trim().is_empty() {
        return Err(empty_content(info, stream));
    }

    let parsed = match stream.delivery {
        DeliveryMethod::Dash => ParsedManifest::Dash(manifest::parse_mpd(&stream.content)?),
        DeliveryMethod::Hls => ParsedManifest::Hls(manifest::parse_playlist(&stream.content)?),
        DeliveryMethod::SmoothStreaming => {
            ParsedManifest::Smooth(manifest::parse_smooth_manifest(&stream.content)?)
        }
        DeliveryMethod::Progressive | DeliveryMethod::Torrent => {
            return Err(Error::UnsupportedDelivery {
                provider: info.provider.clone(),
                delivery: stream.delivery,
                stream_type: info.stream_type.to_string(),
            })
        }
    };

    Ok(ResolvedSource {
        track: elected.track(),
        uri: stream.base_url().to_string(),
        cache_key: cache_key_of(info, stream),
        payload: SourcePayload::ParsedManifest(parsed),
        request_context: RequestContext::default(),
    })
}

fn non_empty_locator(info: &ContentInfo, stream: &StreamDescriptor) -> Result<String> {
    let uri = stream.content.trim();
    if uri.is_empty() {
        return Err(empty_content(info, stream));
    }
    Ok(uri.to_string())
}

pub(crate) fn empty_content(info: &ContentInfo, stream: &StreamDescriptor) -> Error {
    Error::EmptyContent {
        provider: info.provider.clone(),
        delivery: stream.delivery,
        format_id: stream.format_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaFormat, StreamType};

    fn info() -> ContentInfo {
        ContentInfo {
            id: "vid1".to_string(),
            provider: "generic".to_string(),
            url: "https://example.com/watch/vid1".to_string(),
            title: String::new(),
            uploader_name: String::new(),
            uploader_url: String::new(),
            thumbnail_url: String::new(),
            duration_secs: 60,
            stream_type: StreamType::Video,
            video_streams: Vec::new(),
            video_only_streams: Vec::new(),
            audio_streams: Vec::new(),
            subtitles: Vec::new(),
            hls_url: String::new(),
            dash_mpd_url: String::new(),
        }
    }

    fn video_with(delivery: DeliveryMethod, content: &str, is_url: bool) -> VideoDescriptor {
        VideoDescriptor {
            stream: StreamDescriptor {
                delivery,
                content: content.to_string(),
                is_url,
                manifest_url: Some("https://cdn.example.com/manifests/".to_string()),
                format: MediaFormat::Mpeg4,
                format_id: 22,
                profile: None,
            },
            quality_label: "720p".to_string(),
            resolution: None,
            fps: None,
            video_only: false,
        }
    }

    #[test]
    fn test_progressive_by_url() {
        let video = video_with(DeliveryMethod::Progressive, "https://example.com/v.mp4", true);
        let source = DeliveryResolver::new()
            .build_source(
                &info(),
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap();
        assert_eq!(source.uri, "https://example.com/v.mp4");
        assert_eq!(source.track, TrackKind::Video);
        assert!(matches!(source.payload, SourcePayload::Progressive));
        assert!(source.request_context.is_empty());
    }

    #[test]
    fn test_progressive_empty_locator() {
        let video = video_with(DeliveryMethod::Progressive, "  ", true);
        let err = DeliveryResolver::new()
            .build_source(
                &info(),
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::EmptyContent { format_id: 22, .. }));
    }

    #[test]
    fn test_manifest_by_url() {
        let video = video_with(DeliveryMethod::Hls, "https://example.com/master.m3u8", true);
        let source = generic_source(&info(), ElectedStream::Video(&video)).unwrap();
        assert!(matches!(
            source.payload,
            SourcePayload::ManifestUrl(ManifestType::Hls)
        ));
    }

    #[test]
    fn test_content_backed_dash() {
        let mpd = r#"<MPD mediaPresentationDuration="PT10S"><Period>
<Representation id="1" bandwidth="500000" codecs="avc1"/>
</Period></MPD>"#;
        let video = video_with(DeliveryMethod::Dash, mpd, false);
        let source = generic_source(&info(), ElectedStream::Video(&video)).unwrap();
        // Base URL rides on the source for relative references
        assert_eq!(source.uri, "https://cdn.example.com/manifests/");
        let SourcePayload::ParsedManifest(ParsedManifest::Dash(manifest)) = source.payload else {
            panic!("expected parsed DASH payload");
        };
        assert_eq!(manifest.representations.len(), 1);
    }

    #[test]
    fn test_content_backed_parse_failure() {
        let video = video_with(DeliveryMethod::Dash, "not xml at all", false);
        let err = generic_source(&info(), ElectedStream::Video(&video)).unwrap_err();
        assert!(matches!(err, Error::ManifestParse { kind: "DASH", .. }));
    }

    #[test]
    fn test_torrent_unsupported() {
        let video = video_with(DeliveryMethod::Torrent, "magnet:?xt=urn:btih:xyz", true);
        let err = generic_source(&info(), ElectedStream::Video(&video)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDelivery { .. }));
    }

    #[test]
    fn test_registered_builder_takes_precedence() {
        struct Always404;
        impl ProviderSourceBuilder for Always404 {
            fn build_source(
                &self,
                info: &ContentInfo,
                elected: ElectedStream<'_>,
                _config: &ResolverConfig,
                _warnings: &mut Vec<Error>,
            ) -> Result<ResolvedSource> {
                Err(empty_content(info, elected.descriptor()))
            }
        }

        let mut resolver = DeliveryResolver::new();
        resolver.register("generic", Box::new(Always404));
        let video = video_with(DeliveryMethod::Progressive, "https://example.com/v.mp4", true);
        let err = resolver
            .build_source(
                &info(),
                ElectedStream::Video(&video),
                &ResolverConfig::default(),
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::EmptyContent { .. }));
    }
}
