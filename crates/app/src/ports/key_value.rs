//! Key-value persistence port — whole-collection JSON blobs.

use std::future::Future;

use bizhub_domain::error::BizHubError;

/// String-keyed blob storage. Writes overwrite (last writer wins).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BizHubError>> + Send;

    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), BizHubError>> + Send;
}

impl<T: KeyValueStore> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BizHubError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), BizHubError>> + Send {
        (**self).set(key, value)
    }
}
