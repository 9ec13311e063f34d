//! Activity log port — the dashboard's human-readable journal.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bizhub_domain::error::BizHubError;
use bizhub_domain::time::Timestamp;

/// One journal line written by an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub message: String,
    pub category: String,
    pub source: String,
    #[serde(default)]
    pub data: Value,
    pub timestamp: Timestamp,
}

/// Append-only journal.
pub trait ActivityLog: Send + Sync {
    fn append(&self, entry: ActivityEntry) -> impl Future<Output = Result<(), BizHubError>> + Send;
}

impl<T: ActivityLog> ActivityLog for std::sync::Arc<T> {
    fn append(&self, entry: ActivityEntry) -> impl Future<Output = Result<(), BizHubError>> + Send {
        (**self).append(entry)
    }
}
