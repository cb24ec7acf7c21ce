//! Playback plan assembly
//!
//! [`PlaybackResolver`] drives one resolution end to end: live short
//! circuit, video election, audio election, subtitle collection, merge.
//! Each call works on its own [`ContentInfo`] snapshot; the only state
//! retained across resolutions is the last successful source type.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::downloads::DownloadIndex;
use crate::error::Error;
use crate::manifest::ManifestType;
use crate::plan::{
    CaptionRole, PlanId, PlaybackPlan, RequestContext, ResolvedSource, SourcePayload, SourceType,
    TrackKind,
};
use crate::quality::{
    default_audio_index, merge_video_streams, QualitySelection, QualitySelector,
    TierQualitySelector,
};
use crate::resolver::{DeliveryResolver, ElectedStream};
use crate::tag::MetadataTag;
use crate::types::{ContentInfo, ResolverConfig};

/// Resolves content items into playback plans
pub struct PlaybackResolver {
    config: ResolverConfig,
    delivery: DeliveryResolver,
    selector: Box<dyn QualitySelector>,
    downloads: Option<Arc<dyn DownloadIndex>>,
    last_source_type: RwLock<Option<SourceType>>,
}

impl PlaybackResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let selector = Box::new(TierQualitySelector::new(&config));
        Self {
            config,
            delivery: DeliveryResolver::default(),
            selector,
            downloads: None,
            last_source_type: RwLock::new(None),
        }
    }

    /// Swap in a custom delivery resolver (custom provider registry)
    pub fn with_delivery_resolver(mut self, delivery: DeliveryResolver) -> Self {
        self.delivery = delivery;
        self
    }

    /// Swap in a custom quality selector
    pub fn with_selector(mut self, selector: Box<dyn QualitySelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Attach a local download index consulted before network sources
    pub fn with_downloads(mut self, downloads: Arc<dyn DownloadIndex>) -> Self {
        self.downloads = Some(downloads);
        self
    }

    /// Source type of the last resolution that produced a plan. Failed
    /// re-resolutions leave it untouched.
    pub async fn last_source_type(&self) -> Option<SourceType> {
        *self.last_source_type.read().await
    }

    /// Resolve one content item into a playback plan.
    ///
    /// `quality_override` is a user-requested quality label; `None` applies
    /// the configured default policy. Returns `None` when no source could
    /// be built; the reasons are logged.
    #[instrument(skip(self, info), fields(content_id = %info.id, provider = %info.provider))]
    pub async fn resolve(
        &self,
        info: &ContentInfo,
        quality_override: Option<&str>,
    ) -> Option<PlaybackPlan> {
        // Live content plays from the live-edge manifest; no quality
        // selection, no per-stream dispatch. A live item without an edge
        // manifest URL falls through to the stream lists.
        if info.stream_type.is_live() {
            if let Some(plan) = self.live_plan(info) {
                *self.last_source_type.write().await = Some(plan.source_type);
                return Some(plan);
            }
        }

        let mut tag = MetadataTag::from_info(info);

        let local = self.local_locator(info, &mut tag).await;
        let mut sources: Vec<ResolvedSource> = Vec::new();

        // VIDEO_SELECT
        let ladder = merge_video_streams(&info.video_streams, &info.video_only_streams);
        let selected = match quality_override {
            Some(label) => self.selector.override_index(&ladder, label),
            None => self.selector.default_index(&ladder),
        };

        let mut video_built = false;
        let mut video_only = false;
        let mut local_used = false;
        if let Some(index) = selected {
            let video = &ladder[index];
            debug!(quality = %video.quality_label, "video stream elected");
            if let Some(locator) = &local {
                // Local downloads are muxed files; play them directly.
                sources.push(local_source(info, TrackKind::Video, locator));
                video_built = true;
                local_used = true;
            } else {
                let mut warnings = Vec::new();
                match self.delivery.build_source(
                    info,
                    ElectedStream::Video(video),
                    &self.config,
                    &mut warnings,
                ) {
                    Ok(source) => {
                        sources.push(source);
                        video_built = true;
                        video_only = video.video_only;
                    }
                    Err(e) => {
                        warn!(error = %e, "video source build failed");
                        tag.push_error(e);
                    }
                }
                for w in warnings {
                    tag.push_error(w);
                }
            }
        }

        // AUDIO_SELECT: only when there is no video or the video carries
        // no audio of its own.
        let mut audio_built = false;
        if !video_built || video_only {
            if let Some(index) =
                default_audio_index(&info.audio_streams, self.config.preferred_audio_format)
            {
                let audio = &info.audio_streams[index];
                if let (false, Some(locator)) = (video_built, &local) {
                    sources.push(local_source(info, TrackKind::Audio, locator));
                    audio_built = true;
                    local_used = true;
                } else {
                    let mut warnings = Vec::new();
                    match self.delivery.build_source(
                        info,
                        ElectedStream::Audio(audio),
                        &self.config,
                        &mut warnings,
                    ) {
                        Ok(source) => {
                            sources.push(source);
                            audio_built = true;
                        }
                        Err(e) => {
                            warn!(error = %e, "audio source build failed");
                            tag.push_error(e);
                        }
                    }
                    for w in warnings {
                        tag.push_error(w);
                    }
                }
            }
        }

        if sources.is_empty() {
            for e in tag.errors() {
                warn!(code = e.error_code(), error = %e, "resolution failed");
            }
            return None;
        }

        if local_used {
            debug!("serving from local download");
        }

        // A separately added audio track (no video, or video-only video)
        // marks the plan as separated.
        let source_type = if audio_built && (!video_built || video_only) {
            SourceType::VideoWithSeparatedAudio
        } else {
            SourceType::VideoWithAudioOrAudioOnly
        };

        // SUBTITLE_COLLECT: tracks without a recognised caption format are
        // skipped silently.
        for subtitle in &info.subtitles {
            let Some(mime_type) = subtitle.format.caption_mime_type() else {
                continue;
            };
            let role = if subtitle.auto_generated {
                CaptionRole::Descriptive
            } else {
                CaptionRole::Caption
            };
            sources.push(ResolvedSource {
                track: TrackKind::Subtitle,
                uri: subtitle.url.clone(),
                cache_key: format!("{}:sub:{}:{}", info.id, subtitle.language, subtitle.auto_generated),
                payload: SourcePayload::SubtitleTrack {
                    mime_type,
                    role,
                    language: subtitle.language.clone(),
                },
                request_context: RequestContext::default(),
            });
        }

        if !ladder.is_empty() {
            tag.set_quality(QualitySelection::of(ladder, selected));
        }

        let is_merged = sources.len() > 1;
        let plan = PlaybackPlan {
            id: PlanId::new(),
            sources,
            source_type,
            metadata: tag,
            is_merged,
        };
        *self.last_source_type.write().await = Some(source_type);
        debug!(plan_id = %plan.id, sources = plan.sources.len(), "plan assembled");
        Some(plan)
    }

    /// Build the single live-edge source when the item exposes an edge
    /// manifest URL. HLS wins over DASH when both are present.
    fn live_plan(&self, info: &ContentInfo) -> Option<PlaybackPlan> {
        let (url, manifest_type) = if !info.hls_url.trim().is_empty() {
            (info.hls_url.trim(), ManifestType::Hls)
        } else if !info.dash_mpd_url.trim().is_empty() {
            (info.dash_mpd_url.trim(), ManifestType::Dash)
        } else {
            debug!("live item without an edge manifest URL");
            return None;
        };

        let source = ResolvedSource {
            track: TrackKind::Video,
            uri: url.to_string(),
            cache_key: format!("{}:live", info.id),
            payload: SourcePayload::LiveEdge {
                manifest_type,
                edge_gap: self.config.live_edge_gap,
            },
            request_context: RequestContext::default(),
        };
        Some(PlaybackPlan {
            id: PlanId::new(),
            sources: vec![source],
            source_type: SourceType::Live,
            metadata: MetadataTag::from_info(info),
            is_merged: false,
        })
    }

    /// Bounded lookup in the local download index. Timeouts are recorded
    /// on the tag and resolution continues with remote sources.
    async fn local_locator(&self, info: &ContentInfo, tag: &mut MetadataTag) -> Option<String> {
        let index = self.downloads.as_ref()?;
        match timeout(
            self.config.download_lookup_timeout,
            index.local_locator_for(&info.id),
        )
        .await
        {
            Ok(locator) => locator,
            Err(_) => {
                warn!(content_id = %info.id, "download index lookup timed out");
                tag.push_error(Error::LookupTimeout {
                    content_id: info.id.clone(),
                    timeout_ms: self.config.download_lookup_timeout.as_millis() as u64,
                });
                None
            }
        }
    }
}

fn local_source(info: &ContentInfo, track: TrackKind, locator: &str) -> ResolvedSource {
    ResolvedSource {
        track,
        uri: locator.to_string(),
        cache_key: format!("{}:local", info.id),
        payload: SourcePayload::Progressive,
        request_context: RequestContext::default(),
    }
}
