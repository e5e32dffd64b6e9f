use std::sync::Arc;

use models::UserId;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// File-backed map of `api_key -> user_id` used to authenticate HTTP callers.
#[derive(Clone)]
pub struct ApiKeysStore {
    store: Arc<JsonMapStore<String, UserId>>,
}

impl ApiKeysStore {
    /// Initialize the store from the given file path. Creates the file if missing.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, UserId>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Upsert the key for a user and persist.
    pub async fn set(&self, api_key: String, user_id: UserId) -> Result<(), ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::Validation("api key must not be blank".into()));
        }
        self.store.insert(api_key, user_id).await
    }

    /// Revoke a key; returns whether it existed.
    pub async fn revoke(&self, api_key: &str) -> Result<bool, ServiceError> {
        self.store.remove(&api_key.to_string()).await
    }

    /// User the key belongs to, if any.
    pub async fn resolve(&self, api_key: &str) -> Option<UserId> {
        self.store.get(&api_key.to_string()).await
    }
}
