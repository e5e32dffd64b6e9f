use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// Namespaced key-value storage. A value is one JSON document per key;
/// a missing key and a removed key are indistinguishable.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, ServiceError>;
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), ServiceError>;
    /// Remove a key; returns whether it existed.
    async fn remove(&self, namespace: &str, key: &str) -> Result<bool, ServiceError>;
    async fn entries(&self, namespace: &str) -> Result<Vec<(String, Value)>, ServiceError>;
}

/// One JSON file per namespace under a data directory.
pub struct JsonFileKvStore {
    dir: PathBuf,
    namespaces: DashMap<String, Arc<JsonMapStore<String, Value>>>,
    opening: Mutex<()>,
}

impl JsonFileKvStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Arc<Self> {
        Arc::new(Self { dir: dir.into(), namespaces: DashMap::new(), opening: Mutex::new(()) })
    }

    async fn namespace(&self, namespace: &str) -> Result<Arc<JsonMapStore<String, Value>>, ServiceError> {
        if namespace.is_empty() || !namespace.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ServiceError::Validation(format!("invalid namespace `{namespace}`")));
        }
        if let Some(store) = self.namespaces.get(namespace) {
            return Ok(store.clone());
        }
        // first open of a namespace file happens once
        let _opening = self.opening.lock().await;
        if let Some(store) = self.namespaces.get(namespace) {
            return Ok(store.clone());
        }
        let opened = JsonMapStore::new(self.dir.join(format!("{namespace}.json"))).await?;
        self.namespaces.insert(namespace.to_string(), opened.clone());
        Ok(opened)
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, ServiceError> {
        Ok(self.namespace(namespace).await?.get(&key.to_string()).await)
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), ServiceError> {
        self.namespace(namespace).await?.insert(key.to_string(), value).await
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<bool, ServiceError> {
        self.namespace(namespace).await?.remove(&key.to_string()).await
    }

    async fn entries(&self, namespace: &str) -> Result<Vec<(String, Value)>, ServiceError> {
        Ok(self.namespace(namespace).await?.list().await)
    }
}

/// Process-local store, used by tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub async fn contains(&self, namespace: &str, key: &str) -> bool {
        self.inner.read().await.contains_key(&(namespace.to_string(), key.to_string()))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, ServiceError> {
        Ok(self.inner.read().await.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), ServiceError> {
        self.inner.write().await.insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<bool, ServiceError> {
        Ok(self.inner.write().await.remove(&(namespace.to_string(), key.to_string())).is_some())
    }

    async fn entries(&self, namespace: &str) -> Result<Vec<(String, Value)>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }
}
