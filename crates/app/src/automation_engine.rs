//! Automation engine — reacts to events by evaluating and executing automations.
//!
//! The engine owns the rule list, the execution log and the reminder
//! dedup set. For each emitted event it picks the enabled rules whose
//! trigger listens for it, checks their conditions and, when they hold,
//! runs their actions in order. Every attempt ends up in the log.

use std::collections::{BTreeSet, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use bizhub_domain::automation::{ActionInstance, Automation, conditions_satisfied};
use bizhub_domain::error::{BizHubError, NotFoundError};
use bizhub_domain::event::Event;
use bizhub_domain::execution_log::{ActionResult, ExecutionLog, LogEntry, LogStatus};
use bizhub_domain::id::{AutomationId, LogEntryId};
use bizhub_domain::record::EntityKind;
use bizhub_domain::template;
use bizhub_domain::time::{self, Timestamp};

use crate::actions::{ActionContext, ActionError, ActionRegistry};
use crate::config::{DedupPolicy, EngineConfig, TriggerCountPolicy};
use crate::dispatcher::MutationHook;
use crate::ports::{EntityStore, KeyValueStore};
use crate::scanner::{self, Snapshot};

tokio::task_local! {
    /// Nesting level of `emit` calls within the current task.
    static EMIT_DEPTH: usize;
}

/// A rule run that failed outside the per-action isolation.
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("unknown trigger `{0}`")]
    UnknownTrigger(String),

    #[error("automation panicked: {0}")]
    Panicked(String),
}

/// Filter for [`AutomationEngine::logs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogQuery {
    pub automation_id: Option<AutomationId>,
    pub limit: Option<usize>,
}

/// Rule totals and log outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub total_rules: usize,
    pub enabled_rules: usize,
    pub total_runs: u64,
    pub log_entries: usize,
    pub successes: usize,
    pub errors: usize,
    pub skipped: usize,
}

#[derive(Default)]
struct EngineState {
    rules: Vec<Automation>,
    log: ExecutionLog,
    notified: HashSet<String>,
}

/// Rule engine wired to an entity store and a key-value store.
pub struct AutomationEngine<S, K> {
    store: S,
    kv: K,
    registry: ActionRegistry,
    config: EngineConfig,
    state: Mutex<EngineState>,
    /// Held from snapshot to write so blobs land in snapshot order.
    persist: Mutex<()>,
    scanner: Mutex<Option<JoinHandle<()>>>,
}

impl<S, K> AutomationEngine<S, K>
where
    S: EntityStore,
    K: KeyValueStore,
{
    /// Create an engine with no rules loaded.
    pub fn new(store: S, kv: K, registry: ActionRegistry, config: EngineConfig) -> Self {
        Self {
            store,
            kv,
            registry,
            config,
            state: Mutex::new(EngineState::default()),
            persist: Mutex::new(()),
            scanner: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Load rules, log and dedup set from the key-value store.
    ///
    /// Unreadable blobs are replaced by empty collections. Rules that no
    /// longer validate are kept; they fail at run time instead.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the key-value store cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<(), BizHubError> {
        let keys = &self.config.storage_keys;
        let rules: Vec<Automation> = self.read_blob(&keys.automations).await?;
        let log: ExecutionLog = self.read_blob(&keys.logs).await?;
        let notified: Vec<String> = if self.config.dedup == DedupPolicy::Persisted {
            self.read_blob(&keys.notified).await?
        } else {
            Vec::new()
        };

        for rule in &rules {
            if let Err(err) = rule.validate_with(|id| self.registry.definition(id)) {
                tracing::warn!(automation_id = %rule.id, error = %err, "loaded invalid automation");
            }
        }
        tracing::info!(rules = rules.len(), log_entries = log.len(), "automations loaded");

        let mut state = self.state.lock().await;
        state.rules = rules;
        state.log = log;
        state.notified = notified.into_iter().collect();
        Ok(())
    }

    async fn read_blob<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, BizHubError> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(T::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::error!(key, error = %err, "discarding unreadable blob");
            T::default()
        }))
    }

    async fn write_blob<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(key, error = %err, "failed to serialize blob");
                return;
            }
        };
        if let Err(err) = self.kv.set(key, raw).await {
            tracing::error!(key, error = %err, "failed to persist blob");
        }
    }

    async fn persist_rules(&self) {
        let _writing = self.persist.lock().await;
        let rules = self.state.lock().await.rules.clone();
        self.write_blob(&self.config.storage_keys.automations, &rules)
            .await;
    }

    async fn persist_log(&self) {
        let _writing = self.persist.lock().await;
        let log = self.state.lock().await.log.clone();
        self.write_blob(&self.config.storage_keys.logs, &log).await;
    }

    async fn persist_notified(&self) {
        let _writing = self.persist.lock().await;
        let notified: BTreeSet<String> = self.state.lock().await.notified.iter().cloned().collect();
        self.write_blob(&self.config.storage_keys.notified, &notified)
            .await;
    }

    /// Stop the periodic scanner.
    pub async fn dispose(&self) {
        if let Some(handle) = self.scanner.lock().await.take() {
            handle.abort();
            tracing::info!("automation scanner stopped");
        }
    }

    // ── Emission ───────────────────────────────────────────────────

    /// Run every matching rule against `event`, in rule order.
    ///
    /// Never fails: rule failures become `error` entries. Emissions nested
    /// deeper than `max_chain_depth` (actions whose writes emit further
    /// events) are dropped.
    #[tracing::instrument(skip(self, event), fields(event = %event.name))]
    pub async fn emit(&self, event: Event) -> Vec<LogEntry> {
        let depth = EMIT_DEPTH.try_with(|depth| *depth).unwrap_or(0);
        if depth >= self.config.max_chain_depth {
            tracing::warn!(depth, "automation chain too deep, event dropped");
            return Vec::new();
        }
        EMIT_DEPTH.scope(depth + 1, self.dispatch(event)).await
    }

    async fn dispatch(&self, event: Event) -> Vec<LogEntry> {
        let rules = self.match_rules(&event.name).await;
        let mut entries = Vec::with_capacity(rules.len());
        for rule in &rules {
            entries.push(self.run_automation(rule, &event).await);
        }
        entries
    }

    /// Enabled rules whose trigger listens for `event_name`, in insertion order.
    pub async fn match_rules(&self, event_name: &str) -> Vec<Automation> {
        self.state
            .lock()
            .await
            .rules
            .iter()
            .filter(|rule| rule.enabled)
            .filter(|rule| rule.trigger().is_some_and(|t| t.listens_to(event_name)))
            .cloned()
            .collect()
    }

    /// Evaluate and execute one rule, record the outcome and return it.
    #[tracing::instrument(skip(self, automation, event), fields(automation_id = %automation.id, event = %event.name))]
    pub async fn run_automation(&self, automation: &Automation, event: &Event) -> LogEntry {
        let outcome = AssertUnwindSafe(self.execute(automation, event))
            .catch_unwind()
            .await;
        let entry = match outcome {
            Ok(Ok(entry)) => entry,
            Ok(Err(err)) => error_entry(automation, event, &err),
            Err(panic) => error_entry(
                automation,
                event,
                &AutomationError::Panicked(panic_message(panic.as_ref())),
            ),
        };
        match entry.status {
            LogStatus::Success => tracing::info!(
                failed_actions = entry.failed_actions(),
                "automation executed"
            ),
            LogStatus::Skipped => tracing::debug!("automation skipped"),
            LogStatus::Error => tracing::error!(message = %entry.message, "automation failed"),
        }
        self.append_log(entry.clone()).await;
        entry
    }

    async fn execute(
        &self,
        automation: &Automation,
        event: &Event,
    ) -> Result<LogEntry, AutomationError> {
        let trigger = automation
            .trigger()
            .ok_or_else(|| AutomationError::UnknownTrigger(automation.trigger_id.clone()))?;

        if !conditions_satisfied(trigger, &automation.trigger_config, &event.payload) {
            return Ok(new_entry(
                automation,
                event,
                LogStatus::Skipped,
                "Conditions not met".to_string(),
                None,
            ));
        }

        let ctx = ActionContext {
            automation_id: automation.id,
            automation_name: automation.name.clone(),
            event: event.clone(),
        };
        let mut results = Vec::with_capacity(automation.actions.len());
        for action in &automation.actions {
            results.push(self.execute_action(action, &ctx).await);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        let counts = match self.config.trigger_count {
            TriggerCountPolicy::Attempted => true,
            TriggerCountPolicy::FullySucceeded => failed == 0,
        };
        if counts {
            self.record_run(automation.id, time::now()).await;
        }

        let message = if failed == 0 {
            format!("Executed {} action(s)", results.len())
        } else {
            format!(
                "Executed {} action(s), {failed} failed",
                results.len()
            )
        };
        Ok(new_entry(
            automation,
            event,
            LogStatus::Success,
            message,
            Some(results),
        ))
    }

    /// Run one action in isolation; failures and panics become a failed result.
    async fn execute_action(&self, action: &ActionInstance, ctx: &ActionContext) -> ActionResult {
        let id = action.action_id.as_str();
        let definition = self.registry.definition(id);
        let config = match definition {
            Some(definition) => definition.substitute(&action.config, &ctx.event.payload),
            None => template::substitute_config(&action.config, &ctx.event.payload),
        };

        let outcome = match (definition, self.registry.handler(id)) {
            (Some(definition), Some(handler)) => match definition.missing_required(&config) {
                Some(field) => Err(ActionError::MissingField(field)),
                None => AssertUnwindSafe(handler.execute(&config, ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(ActionError::Panicked(panic_message(panic.as_ref())))
                    }),
            },
            _ => Err(ActionError::UnknownAction(id.to_string())),
        };

        match outcome {
            Ok(result) => ActionResult::ok(id, result),
            Err(err) => {
                tracing::warn!(action = id, error = %err, "action failed");
                ActionResult::failed(id, err.to_string())
            }
        }
    }

    async fn record_run(&self, id: AutomationId, at: Timestamp) {
        {
            let mut state = self.state.lock().await;
            let Some(rule) = state.rules.iter_mut().find(|rule| rule.id == id) else {
                return;
            };
            rule.record_run(at);
        }
        self.persist_rules().await;
    }

    async fn append_log(&self, entry: LogEntry) {
        {
            let mut state = self.state.lock().await;
            let retention = self.config.log_retention;
            state.log.append(entry, retention);
        }
        self.persist_log().await;
    }

    // ── Time-based events ──────────────────────────────────────────

    /// Scan tasks, invoices and projects and emit every time-based event
    /// due as of `now`, honouring the dedup policy.
    ///
    /// Dedup keys that the scan no longer produces are forgotten, so the
    /// set only holds keys for currently pending reminders.
    #[tracing::instrument(skip(self))]
    pub async fn scan_now(&self, now: Timestamp) -> Vec<LogEntry> {
        let snapshot = Snapshot {
            tasks: self.load_collection(EntityKind::Task).await,
            invoices: self.load_collection(EntityKind::Invoice).await,
            projects: self.load_collection(EntityKind::Project).await,
        };
        let findings = scanner::scan(&snapshot, now, &self.config);

        let findings = if self.config.dedup == DedupPolicy::Off {
            findings
        } else {
            let current: HashSet<&str> = findings.iter().filter_map(|f| f.key.as_deref()).collect();
            let (fresh, changed): (Vec<_>, bool) = {
                let mut state = self.state.lock().await;
                let before = state.notified.len();
                state.notified.retain(|key| current.contains(key.as_str()));
                let pruned = state.notified.len() != before;
                let fresh: Vec<_> = findings
                    .iter()
                    .filter(|f| f.key.as_ref().is_none_or(|k| state.notified.insert(k.clone())))
                    .cloned()
                    .collect();
                let changed = pruned || !fresh.is_empty();
                (fresh, changed)
            };
            if self.config.dedup == DedupPolicy::Persisted && changed {
                self.persist_notified().await;
            }
            fresh
        };
        tracing::debug!(events = findings.len(), "deadline scan finished");

        let mut entries = Vec::new();
        for finding in findings {
            entries.extend(self.emit(finding.event).await);
        }
        entries
    }

    async fn load_collection(&self, kind: EntityKind) -> Vec<bizhub_domain::record::Record> {
        self.store.get_all(kind).await.unwrap_or_else(|err| {
            tracing::error!(kind = %kind, error = %err, "failed to read records for scan");
            Vec::new()
        })
    }

    // ── Rule management ────────────────────────────────────────────

    fn validate(&self, automation: &Automation) -> Result<(), BizHubError> {
        automation.validate_with(|id| self.registry.definition(id))
    }

    /// Validate and store a new rule.
    ///
    /// # Errors
    ///
    /// Returns [`BizHubError::Validation`] when the rule is invalid.
    #[tracing::instrument(skip(self, automation), fields(automation_name = %automation.name))]
    pub async fn create_rule(&self, mut automation: Automation) -> Result<Automation, BizHubError> {
        self.validate(&automation)?;
        let ts = time::now();
        automation.created_at = ts;
        automation.updated_at = ts;
        self.state.lock().await.rules.push(automation.clone());
        self.persist_rules().await;
        tracing::info!(automation_id = %automation.id, "automation created");
        Ok(automation)
    }

    /// Replace a rule's definition, keeping its creation time and stats.
    ///
    /// # Errors
    ///
    /// Returns [`BizHubError::Validation`] when the rule is invalid and
    /// [`BizHubError::NotFound`] when no rule has its id.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn update_rule(&self, mut automation: Automation) -> Result<Automation, BizHubError> {
        self.validate(&automation)?;
        {
            let mut state = self.state.lock().await;
            let existing = state
                .rules
                .iter_mut()
                .find(|rule| rule.id == automation.id)
                .ok_or_else(|| not_found(automation.id))?;
            automation.created_at = existing.created_at;
            automation.trigger_count = existing.trigger_count;
            automation.last_triggered_at = existing.last_triggered_at;
            automation.updated_at = time::now();
            *existing = automation.clone();
        }
        self.persist_rules().await;
        Ok(automation)
    }

    /// # Errors
    ///
    /// Returns [`BizHubError::NotFound`] when no rule has this id.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: AutomationId) -> Result<(), BizHubError> {
        {
            let mut state = self.state.lock().await;
            let before = state.rules.len();
            state.rules.retain(|rule| rule.id != id);
            if state.rules.len() == before {
                return Err(not_found(id));
            }
        }
        self.persist_rules().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BizHubError::NotFound`] when no rule has this id.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        id: AutomationId,
        enabled: bool,
    ) -> Result<Automation, BizHubError> {
        let updated = {
            let mut state = self.state.lock().await;
            let rule = state
                .rules
                .iter_mut()
                .find(|rule| rule.id == id)
                .ok_or_else(|| not_found(id))?;
            rule.enabled = enabled;
            rule.updated_at = time::now();
            rule.clone()
        };
        self.persist_rules().await;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns [`BizHubError::NotFound`] when no rule has this id.
    pub async fn get_rule(&self, id: AutomationId) -> Result<Automation, BizHubError> {
        self.state
            .lock()
            .await
            .rules
            .iter()
            .find(|rule| rule.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn list_rules(&self) -> Vec<Automation> {
        self.state.lock().await.rules.clone()
    }

    /// Run a rule by hand against `payload`, whether or not it is enabled.
    ///
    /// The event is named after the trigger's first event.
    ///
    /// # Errors
    ///
    /// Returns [`BizHubError::NotFound`] when no rule has this id.
    #[tracing::instrument(skip(self, payload))]
    pub async fn run_rule(&self, id: AutomationId, payload: Value) -> Result<LogEntry, BizHubError> {
        let rule = self.get_rule(id).await?;
        let name = rule
            .trigger()
            .and_then(|t| t.events.first().copied())
            .unwrap_or("manual");
        let event = Event::new(name, payload);
        Ok(self.run_automation(&rule, &event).await)
    }

    /// Log entries, newest first.
    pub async fn logs(&self, query: LogQuery) -> Vec<LogEntry> {
        let state = self.state.lock().await;
        state
            .log
            .recent(query.automation_id)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub async fn clear_logs(&self) {
        self.state.lock().await.log.clear();
        self.persist_log().await;
    }

    pub async fn stats(&self) -> EngineStats {
        let state = self.state.lock().await;
        EngineStats {
            total_rules: state.rules.len(),
            enabled_rules: state.rules.iter().filter(|r| r.enabled).count(),
            total_runs: state.rules.iter().map(|r| r.trigger_count).sum(),
            log_entries: state.log.len(),
            successes: state.log.count(LogStatus::Success),
            errors: state.log.count(LogStatus::Error),
            skipped: state.log.count(LogStatus::Skipped),
        }
    }
}

impl<S, K> AutomationEngine<S, K>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    /// Load persisted state, subscribe to the store and start the scanner.
    ///
    /// # Errors
    ///
    /// Returns the storage error if persisted state cannot be read.
    pub async fn init(self: &Arc<Self>) -> Result<(), BizHubError> {
        self.load().await?;
        self.install_hooks();
        self.start_scanner().await;
        Ok(())
    }

    /// Subscribe to mutations of every observed collection.
    pub fn install_hooks(self: &Arc<Self>) {
        for kind in EntityKind::ALL {
            self.store.on_mutation(
                kind,
                Arc::new(MutationHook {
                    engine: Arc::downgrade(self),
                }),
            );
        }
    }

    /// Spawn the periodic scan; a no-op when it is already running.
    pub async fn start_scanner(self: &Arc<Self>) {
        let mut slot = self.scanner.lock().await;
        if slot.is_some() {
            return;
        }
        let engine = Arc::downgrade(self);
        let delay = self.config.initial_scan_delay();
        let interval = self.config.scan_interval();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.scan_now(time::now()).await;
            }
        }));
        tracing::info!(interval_secs = interval.as_secs(), "automation scanner started");
    }
}

fn not_found(id: AutomationId) -> BizHubError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}

fn new_entry(
    automation: &Automation,
    event: &Event,
    status: LogStatus,
    message: String,
    results: Option<Vec<ActionResult>>,
) -> LogEntry {
    LogEntry {
        id: LogEntryId::new(),
        automation_id: automation.id,
        automation_name: automation.name.clone(),
        event: event.name.clone(),
        status,
        message,
        timestamp: time::now(),
        event_data: event.payload.clone(),
        results,
    }
}

fn error_entry(automation: &Automation, event: &Event, err: &AutomationError) -> LogEntry {
    new_entry(automation, event, LogStatus::Error, err.to_string(), None)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
