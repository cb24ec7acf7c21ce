//! CLI command implementations

use std::path::Path;

use anyhow::Context;
use serde_json::json;

use vela_core::manifest::{parse_mpd, parse_playlist, parse_smooth_manifest};
use vela_core::{
    detect_manifest_type, ContentInfo, ManifestType, PlaybackResolver, ResolvedSource,
    ResolverConfig, SourcePayload,
};

/// Resolve a catalog snapshot into a playback plan
pub async fn resolve(
    catalog: &Path,
    quality: Option<&str>,
    prefer: Option<String>,
    limit_data: bool,
    json: bool,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(catalog)
        .await
        .with_context(|| format!("reading {}", catalog.display()))?;
    let info: ContentInfo = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", catalog.display()))?;

    let config = ResolverConfig {
        preferred_quality: prefer,
        limit_data_usage: limit_data,
        ..Default::default()
    };
    let resolver = PlaybackResolver::new(config);

    let Some(plan) = resolver.resolve(&info, quality).await else {
        anyhow::bail!("no playable source could be built for {}", info.id);
    };

    if json {
        let sources: Vec<_> = plan.sources.iter().map(source_summary).collect();
        let output = json!({
            "plan_id": plan.id.to_string(),
            "source_type": plan.source_type,
            "is_merged": plan.is_merged,
            "title": plan.metadata.title,
            "uploader": plan.metadata.uploader_name,
            "selected_quality": plan
                .metadata
                .quality()
                .and_then(|q| q.selected_stream())
                .map(|v| v.quality_label.clone()),
            "errors": plan
                .metadata
                .errors()
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>(),
            "sources": sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Plan {} ({:?})", plan.id, plan.source_type);
    println!("  Title: {}", plan.metadata.title);
    if let Some(quality) = plan.metadata.quality() {
        println!(
            "  Quality: {} (ladder of {})",
            quality
                .selected_stream()
                .map(|v| v.quality_label.as_str())
                .unwrap_or("none"),
            quality.sorted_videos().len()
        );
    }
    println!("\nSources:");
    for (i, source) in plan.sources.iter().enumerate() {
        println!(
            "  {}. [{:?}] {} {}",
            i + 1,
            source.track,
            payload_name(&source.payload),
            source.uri
        );
    }
    if !plan.metadata.errors().is_empty() {
        println!("\nRecovered errors:");
        for e in plan.metadata.errors() {
            println!("  - [{}] {}", e.error_code(), e);
        }
    }

    Ok(())
}

/// Probe a manifest document and print a summary
pub async fn probe(manifest: &Path) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(manifest)
        .await
        .with_context(|| format!("reading {}", manifest.display()))?;

    let Some(manifest_type) = detect_manifest_type(&content) else {
        anyhow::bail!("unrecognised manifest format");
    };

    println!("Manifest type: {manifest_type}");
    match manifest_type {
        ManifestType::Dash => {
            let mpd = parse_mpd(&content)?;
            println!("  Dynamic: {}", mpd.is_dynamic);
            println!("  Duration: {:?}", mpd.duration);
            println!("  Representations: {}", mpd.representations.len());
            for (i, r) in mpd.representations.iter().enumerate() {
                println!(
                    "  {}. {} - {}bps {:?}",
                    i + 1,
                    r.id,
                    r.bandwidth,
                    r.resolution
                );
            }
        }
        ManifestType::Hls => match parse_playlist(&content)? {
            vela_core::manifest::HlsManifest::Master { variants } => {
                println!("  Variants: {}", variants.len());
                for (i, v) in variants.iter().enumerate() {
                    println!("  {}. {}bps {:?} {}", i + 1, v.bandwidth, v.resolution, v.uri);
                }
            }
            vela_core::manifest::HlsManifest::Media {
                segment_count,
                target_duration,
                is_live,
            } => {
                println!("  Segments: {segment_count}");
                println!("  Target duration: {target_duration:?}");
                println!("  Live: {is_live}");
            }
        },
        ManifestType::SmoothStreaming => {
            let smooth = parse_smooth_manifest(&content)?;
            println!("  Live: {}", smooth.is_live);
            println!("  Duration: {:?}", smooth.duration);
            println!("  Stream indexes: {}", smooth.stream_index_count);
        }
    }

    Ok(())
}

fn source_summary(source: &ResolvedSource) -> serde_json::Value {
    json!({
        "track": source.track,
        "uri": source.uri,
        "cache_key": source.cache_key,
        "payload": payload_name(&source.payload),
        "cookie": source.request_context.cookie,
        "page_url": source.request_context.page_url,
    })
}

fn payload_name(payload: &SourcePayload) -> String {
    match payload {
        SourcePayload::Progressive => "progressive".to_string(),
        SourcePayload::ManifestUrl(t) => format!("manifest-url ({t})"),
        SourcePayload::ParsedManifest(m) => format!("parsed-manifest ({})", m.manifest_type()),
        SourcePayload::LiveEdge { manifest_type, .. } => format!("live-edge ({manifest_type})"),
        SourcePayload::SubtitleTrack { language, .. } => format!("subtitles ({language})"),
    }
}
