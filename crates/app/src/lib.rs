//! # bizhub-app
//!
//! Application layer — the automation engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EntityStore` — business collections with mutation subscription
//!   - `KeyValueStore` — JSON blob persistence for rules, log and dedup set
//!   - `NotificationSink` — user-facing notifications
//!   - `ActivityLog` — the dashboard journal
//!   - `WebhookClient` — outbound HTTP calls
//! - Provide the **action handlers** and the `ActionRegistry` mapping action
//!   ids onto them
//! - Turn store mutations and elapsed time into **events** (dispatcher, scanner)
//! - Run the `AutomationEngine`: match rules, check conditions, execute
//!   actions, keep stats and the execution log
//!
//! ## Dependency rule
//! Depends on `bizhub-domain` only (plus `tokio` for locks, timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod actions;
pub mod automation_engine;
pub mod config;
pub mod dispatcher;
pub mod ports;
pub mod scanner;

#[cfg(test)]
mod test_support;
