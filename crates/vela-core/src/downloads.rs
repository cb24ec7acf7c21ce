//! Local download index
//!
//! When a content item was downloaded earlier, playback should hit the
//! local copy instead of the network. The index is an async seam because
//! real implementations sit on a database; the resolver bounds every
//! lookup with a timeout so a slow index can never stall resolution.

use std::collections::HashMap;

use async_trait::async_trait;

/// Lookup from content id to a local media locator
#[async_trait]
pub trait DownloadIndex: Send + Sync {
    /// Returns a local URI for the content, or `None` when it was never
    /// downloaded
    async fn local_locator_for(&self, content_id: &str) -> Option<String>;
}

/// Map-backed index for tests and the CLI
#[derive(Debug, Default)]
pub struct InMemoryDownloadIndex {
    entries: HashMap<String, String>,
}

impl InMemoryDownloadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content_id: impl Into<String>, locator: impl Into<String>) {
        self.entries.insert(content_id.into(), locator.into());
    }
}

#[async_trait]
impl DownloadIndex for InMemoryDownloadIndex {
    async fn local_locator_for(&self, content_id: &str) -> Option<String> {
        self.entries.get(content_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let mut index = InMemoryDownloadIndex::new();
        index.insert("abc123", "file:///downloads/abc123.mp4");
        assert_eq!(
            index.local_locator_for("abc123").await.as_deref(),
            Some("file:///downloads/abc123.mp4")
        );
        assert_eq!(index.local_locator_for("missing").await, None);
    }
}
