//! Entity store port — the business collections the engine observes.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use bizhub_domain::error::BizHubError;
use bizhub_domain::record::{EntityKind, Record};

/// A completed write, published to listeners after the store committed it.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Created {
        kind: EntityKind,
        record: Record,
    },
    Updated {
        kind: EntityKind,
        before: Record,
        after: Record,
    },
}

impl Mutation {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Created { kind, .. } | Self::Updated { kind, .. } => *kind,
        }
    }
}

/// Receives [`Mutation`]s from an [`EntityStore`].
///
/// The store awaits every listener before its write call returns, so a
/// listener's work completes before the caller sees the result.
pub trait MutationListener: Send + Sync {
    fn on_mutation<'a>(&'a self, mutation: &'a Mutation) -> BoxFuture<'a, ()>;
}

/// CRUD access to the business collections, plus mutation subscription.
pub trait EntityStore: Send + Sync {
    /// Insert a record, assigning an `id` when it has none.
    fn create(
        &self,
        kind: EntityKind,
        record: Record,
    ) -> impl Future<Output = Result<Record, BizHubError>> + Send;

    /// Merge `patch` into the record with the given id.
    ///
    /// Returns [`BizHubError::NotFound`] when no such record exists.
    fn update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> impl Future<Output = Result<Record, BizHubError>> + Send;

    /// All records of a collection, in insertion order.
    fn get_all(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<Record>, BizHubError>> + Send;

    fn get_by_id(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> impl Future<Output = Result<Option<Record>, BizHubError>> + Send;

    /// Register a listener for writes to one collection.
    fn on_mutation(&self, kind: EntityKind, listener: Arc<dyn MutationListener>);
}

impl<T: EntityStore> EntityStore for Arc<T> {
    fn create(
        &self,
        kind: EntityKind,
        record: Record,
    ) -> impl Future<Output = Result<Record, BizHubError>> + Send {
        (**self).create(kind, record)
    }

    fn update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> impl Future<Output = Result<Record, BizHubError>> + Send {
        (**self).update(kind, id, patch)
    }

    fn get_all(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<Record>, BizHubError>> + Send {
        (**self).get_all(kind)
    }

    fn get_by_id(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> impl Future<Output = Result<Option<Record>, BizHubError>> + Send {
        (**self).get_by_id(kind, id)
    }

    fn on_mutation(&self, kind: EntityKind, listener: Arc<dyn MutationListener>) {
        (**self).on_mutation(kind, listener);
    }
}
