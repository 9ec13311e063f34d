//! # bizhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for the trigger and action catalogs, automation
//!   CRUD, manual runs, the execution log and engine statistics
//! - Expose the business collections (`/api/entities/{collection}`) so that
//!   writes made over HTTP go through the entity store and fire automations
//! - Map [`BizHubError`](bizhub_domain::error::BizHubError) into status codes
//!
//! ## Dependency rule
//! Depends on `bizhub-app` (for the engine and port traits) and
//! `bizhub-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
