//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod automations;
pub mod catalog;
#[allow(clippy::missing_errors_doc)]
pub mod entities;
pub mod logs;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post, put};

use bizhub_app::ports::{EntityStore, KeyValueStore};
use bizhub_domain::error::ValidationError;
use bizhub_domain::id::AutomationId;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, K>() -> Router<AppState<S, K>>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    Router::new()
        // Catalogs
        .route("/triggers", get(catalog::triggers))
        .route("/actions", get(catalog::actions::<S, K>))
        // Automations
        .route(
            "/automations",
            get(automations::list::<S, K>).post(automations::create::<S, K>),
        )
        .route(
            "/automations/{id}",
            get(automations::get::<S, K>)
                .put(automations::update::<S, K>)
                .delete(automations::delete::<S, K>),
        )
        .route("/automations/{id}/run", post(automations::run::<S, K>))
        .route(
            "/automations/{id}/enabled",
            put(automations::set_enabled::<S, K>),
        )
        // Execution log
        .route(
            "/automation-logs",
            get(logs::list::<S, K>).delete(logs::clear::<S, K>),
        )
        .route("/automation-stats", get(logs::stats::<S, K>))
        // Business collections
        .route(
            "/entities/{collection}",
            get(entities::list::<S, K>).post(entities::create::<S, K>),
        )
        .route(
            "/entities/{collection}/{id}",
            get(entities::get::<S, K>).patch(entities::update::<S, K>),
        )
}

fn parse_automation_id(raw: &str) -> Result<AutomationId, ApiError> {
    AutomationId::from_str(raw).map_err(|_| ValidationError::InvalidId(raw.to_string()).into())
}
