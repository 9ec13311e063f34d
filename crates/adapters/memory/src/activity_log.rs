//! Activity journal kept in memory.

use tokio::sync::RwLock;

use bizhub_app::ports::{ActivityEntry, ActivityLog};
use bizhub_domain::error::BizHubError;

#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}

impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), BizHubError> {
        tracing::debug!(category = %entry.category, "activity entry appended");
        self.entries.write().await.push(entry);
        Ok(())
    }
}
