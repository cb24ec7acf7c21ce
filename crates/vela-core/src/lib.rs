//! Vela Core - Playback Resolution Library for Vela
//!
//! This crate turns an extracted stream catalog into playback plans:
//! - Quality ladder merging and selection
//! - DASH/HLS/SmoothStreaming manifest parsing
//! - DASH manifest synthesis for template and progressive streams
//! - Provider-aware delivery resolution
//! - Plan assembly with metadata tagging
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Vela Core                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │   Quality    │  │   Manifest   │  │   Manifest   │          │
//! │  │   Selector   │  │    Parsers   │  │  Synthesizer │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         │          ┌──────┴──────┐          │                   │
//! │         │          │   Delivery  │──────────┘                   │
//! │         │          │   Resolver  │                              │
//! │         │          └──────┬──────┘                              │
//! │         │                 │                                     │
//! │         └──────────┬──────┘                                     │
//! │             ┌──────┴──────┐         ┌──────────────┐            │
//! │             │    Plan     │─────────│   Download   │            │
//! │             │  Assembler  │         │    Index     │            │
//! │             └─────────────┘         └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod downloads;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod quality;
pub mod resolve;
pub mod resolver;
pub mod tag;
pub mod types;

pub use downloads::{DownloadIndex, InMemoryDownloadIndex};
pub use error::{Error, Result};
pub use manifest::{detect_manifest_type, ManifestType, ParsedManifest};
pub use plan::{
    CaptionRole, PlanId, PlaybackPlan, RequestContext, ResolvedSource, SourcePayload, SourceType,
    TrackKind,
};
pub use quality::{merge_video_streams, QualitySelection, QualitySelector, TierQualitySelector};
pub use resolve::PlaybackResolver;
pub use resolver::{DeliveryResolver, ElectedStream, ProviderSourceBuilder};
pub use tag::MetadataTag;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the resolver library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Vela Core initialized");
}
