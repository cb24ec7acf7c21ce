//! Plan metadata
//!
//! A [`MetadataTag`] travels with every playback plan: display fields for
//! the UI, the quality snapshot the assembler elected, and any recoverable
//! errors swallowed along the way. The tag is owned by the plan and never
//! shared across resolutions.

use crate::error::Error;
use crate::quality::QualitySelection;
use crate::types::{ContentInfo, StreamType};

/// Display and diagnostic metadata attached to a playback plan
#[derive(Debug)]
pub struct MetadataTag {
    pub title: String,
    pub uploader_name: String,
    pub uploader_url: String,
    /// Original page URL of the content
    pub stream_url: String,
    pub thumbnail_url: String,
    pub duration_secs: u64,
    pub stream_type: StreamType,
    errors: Vec<Error>,
    quality: Option<QualitySelection>,
}

impl MetadataTag {
    /// Snapshot the display fields of a content item
    pub fn from_info(info: &ContentInfo) -> Self {
        Self {
            title: info.title.clone(),
            uploader_name: info.uploader_name.clone(),
            uploader_url: info.uploader_url.clone(),
            stream_url: info.url.clone(),
            thumbnail_url: info.thumbnail_url.clone(),
            duration_secs: info.duration_secs,
            stream_type: info.stream_type,
            errors: Vec::new(),
            quality: None,
        }
    }

    /// Record a recoverable error that did not abort resolution
    pub fn push_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Errors accumulated during resolution, in occurrence order
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn set_quality(&mut self, quality: QualitySelection) {
        self.quality = Some(quality);
    }

    /// The elected quality snapshot; `None` for live plans and audio-only
    /// content
    pub fn quality(&self) -> Option<&QualitySelection> {
        self.quality.as_ref()
    }
}
