//! Execution log — the size-bounded history of automation attempts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{AutomationId, LogEntryId};
use crate::time::Timestamp;

/// Outcome of one automation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// The action loop ran (individual actions may still have failed).
    Success,
    /// Something outside the action loop failed.
    Error,
    /// The trigger fired but the conditions did not hold.
    Skipped,
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        })
    }
}

/// Outcome of a single action within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub action: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    #[must_use]
    pub fn ok(action: impl Into<String>, result: Value) -> Self {
        Self {
            action: action.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(action: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// One persisted record of an automation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogEntryId,
    pub automation_id: AutomationId,
    #[serde(default)]
    pub automation_name: String,
    #[serde(default)]
    pub event: String,
    pub status: LogStatus,
    pub message: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub event_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ActionResult>>,
}

impl LogEntry {
    /// Number of failed actions recorded in this entry.
    #[must_use]
    pub fn failed_actions(&self) -> usize {
        self.results
            .as_deref()
            .map_or(0, |results| results.iter().filter(|r| !r.success).count())
    }
}

/// Bounds on the log size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRetention {
    /// Trim once the log grows beyond this many entries.
    pub max_entries: usize,
    /// Number of most recent entries kept after trimming.
    pub retain: usize,
}

impl Default for LogRetention {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            retain: 500,
        }
    }
}

/// Append-only, size-bounded list of [`LogEntry`], oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLog {
    entries: Vec<LogEntry>,
}

impl ExecutionLog {
    /// Append an entry, trimming to `retention.retain` most recent entries
    /// whenever the size exceeds `retention.max_entries`.
    pub fn append(&mut self, entry: LogEntry, retention: LogRetention) {
        self.entries.push(entry);
        if self.entries.len() > retention.max_entries {
            let excess = self.entries.len().saturating_sub(retention.retain);
            self.entries.drain(..excess);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest first, optionally restricted to one automation.
    pub fn recent(&self, automation_id: Option<AutomationId>) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(move |entry| automation_id.is_none_or(|id| entry.automation_id == id))
    }

    /// Count entries per status.
    #[must_use]
    pub fn count(&self, status: LogStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(automation_id: AutomationId, status: LogStatus) -> LogEntry {
        LogEntry {
            id: LogEntryId::new(),
            automation_id,
            automation_name: "rule".to_string(),
            event: "task.created".to_string(),
            status,
            message: String::new(),
            timestamp: crate::time::now(),
            event_data: json!({}),
            results: None,
        }
    }

    #[test]
    fn should_keep_everything_up_to_the_limit() {
        let mut log = ExecutionLog::default();
        let id = AutomationId::new();
        for _ in 0..1000 {
            log.append(entry(id, LogStatus::Success), LogRetention::default());
        }
        assert_eq!(log.len(), 1000);
    }

    #[test]
    fn should_trim_to_500_after_1001_writes() {
        let mut log = ExecutionLog::default();
        let id = AutomationId::new();
        let mut last = None;
        for _ in 0..1001 {
            let e = entry(id, LogStatus::Success);
            last = Some(e.id);
            log.append(e, LogRetention::default());
        }
        assert_eq!(log.len(), 500);
        assert_eq!(log.recent(None).next().map(|e| e.id), last);
    }

    #[test]
    fn should_honour_custom_retention() {
        let mut log = ExecutionLog::default();
        let retention = LogRetention {
            max_entries: 3,
            retain: 2,
        };
        let id = AutomationId::new();
        for _ in 0..4 {
            log.append(entry(id, LogStatus::Skipped), retention);
        }
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn should_list_recent_entries_newest_first_and_filter_by_rule() {
        let mut log = ExecutionLog::default();
        let a = AutomationId::new();
        let b = AutomationId::new();
        log.append(entry(a, LogStatus::Success), LogRetention::default());
        log.append(entry(b, LogStatus::Error), LogRetention::default());
        log.append(entry(a, LogStatus::Skipped), LogRetention::default());

        let all: Vec<_> = log.recent(None).map(|e| e.status).collect();
        assert_eq!(
            all,
            vec![LogStatus::Skipped, LogStatus::Error, LogStatus::Success]
        );
        let only_a: Vec<_> = log.recent(Some(a)).map(|e| e.status).collect();
        assert_eq!(only_a, vec![LogStatus::Skipped, LogStatus::Success]);
        assert_eq!(log.count(LogStatus::Error), 1);
    }

    #[test]
    fn should_count_failed_actions() {
        let mut e = entry(AutomationId::new(), LogStatus::Success);
        e.results = Some(vec![
            ActionResult::failed("a1", "boom"),
            ActionResult::ok("a2", json!(null)),
        ]);
        assert_eq!(e.failed_actions(), 1);
    }

    #[test]
    fn should_serialize_as_plain_array_with_camel_case_fields() {
        let mut log = ExecutionLog::default();
        log.append(
            entry(AutomationId::new(), LogStatus::Skipped),
            LogRetention::default(),
        );
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["status"], "skipped");
        assert!(json[0].get("automationId").is_some());
        assert!(json[0].get("results").is_none());
        let parsed: ExecutionLog = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, log);
    }
}
