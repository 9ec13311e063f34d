//! Engine configuration and the named policies that tune its behaviour.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use bizhub_domain::execution_log::LogRetention;

/// Which runs bump `triggerCount` / `lastTriggeredAt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCountPolicy {
    /// Every run that reaches the action loop, even if actions failed.
    #[default]
    Attempted,
    /// Only runs in which every action succeeded.
    FullySucceeded,
}

/// Whether the periodic scan re-emits the same time-based event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Emit on every scan.
    #[default]
    Off,
    /// Emit once per process lifetime.
    Session,
    /// Emit once, remembered across restarts.
    Persisted,
}

/// Keys of the blobs the engine owns in the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub automations: String,
    pub logs: String,
    pub notified: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            automations: "automations".to_string(),
            logs: "automation_logs".to_string(),
            notified: "automation_notified".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scan_interval_secs: u64,
    pub initial_scan_delay_secs: u64,
    /// Day offsets before an invoice's due date that emit `invoice.due`.
    pub reminder_days: Vec<i64>,
    /// Horizon in days for `deadline.approaching`.
    pub deadline_window_days: i64,
    pub dedup: DedupPolicy,
    pub trigger_count: TriggerCountPolicy,
    pub log_retention: LogRetention,
    /// Bound on nested emissions caused by actions writing to the store.
    pub max_chain_depth: usize,
    pub storage_keys: StorageKeys,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 3600,
            initial_scan_delay_secs: 5,
            reminder_days: vec![0, 1, 3, 7, 14, 30],
            deadline_window_days: 7,
            dedup: DedupPolicy::default(),
            trigger_count: TriggerCountPolicy::default(),
            log_retention: LogRetention::default(),
            max_chain_depth: 4,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    #[must_use]
    pub fn initial_scan_delay(&self) -> Duration {
        Duration::from_secs(self.initial_scan_delay_secs)
    }
}
