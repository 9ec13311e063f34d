//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod activity_log;
pub mod entity_store;
pub mod key_value;
pub mod notification;
pub mod webhook;

pub use activity_log::{ActivityEntry, ActivityLog};
pub use entity_store::{EntityStore, Mutation, MutationListener};
pub use key_value::KeyValueStore;
pub use notification::{NotificationLevel, NotificationOptions, NotificationSink};
pub use webhook::{WebhookClient, WebhookMethod, WebhookRequest, WebhookResponse};
