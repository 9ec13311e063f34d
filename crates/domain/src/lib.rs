//! # bizhub-domain
//!
//! Pure domain model for the bizhub automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Records** (the opaque business rows: tasks, invoices, leads, …)
//! - Define **Events** (semantic occurrences derived from record mutations or time)
//! - Define **Automations** (trigger → condition → ordered action rules)
//! - Hold the static **trigger** and **action** catalogs
//! - Evaluate trigger conditions and substitute `{{path}}` templates
//! - Model the size-bounded **execution log**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod event;
pub mod execution_log;
pub mod path;
pub mod record;
pub mod template;
