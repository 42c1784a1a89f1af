use crate::config::{MockinConfig, StoreKind};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod consents;
pub mod memory;
pub mod redis;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Keyed JSON document storage shared by every component of the server.
///
/// Writes replace the whole document under a key; there is no
/// read-modify-write primitive, so concurrent writers to the same key resolve
/// as last writer wins.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a value, replacing any previous one
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), StoreError>;

    /// Store a value that never expires and is never evicted. Used for
    /// records that only change status, like consents.
    async fn set_persistent<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError>;

    /// Retrieve a value
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError>;

    /// Checks the backend is reachable.
    ///
    /// Returns Ok(()) if healthy, or Err with a descriptive message if unhealthy.
    async fn health_check(&self) -> Result<(), String>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// The configured store backend.
#[derive(Clone)]
pub enum Store {
    /// In-memory store using Moka
    InMemory(memory::InMemoryStore),
    /// Redis-backed store
    Redis(redis::RedisStore),
}

#[async_trait::async_trait]
impl DocumentStore for Store {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.set(key, value).await,
            Self::Redis(store) => store.set(key, value).await,
        }
    }

    async fn set_persistent<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.set_persistent(key, value).await,
            Self::Redis(store) => store.set_persistent(key, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self {
            Self::InMemory(store) => store.get(key).await,
            Self::Redis(store) => store.get(key).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.delete(key).await,
            Self::Redis(store) => store.delete(key).await,
        }
    }
}

/// Creates the store backend selected by the configuration.
pub async fn create_store(config: &MockinConfig) -> Result<Store, StoreError> {
    match config.store.kind {
        StoreKind::InMemory => {
            let store = memory::InMemoryStore::new(config.store.ttl, config.store.memory.capacity)
                .map_err(StoreError::Config)?;
            Ok(Store::InMemory(store))
        }
        StoreKind::Redis => {
            if config.store.redis.url.is_empty() {
                return Err(StoreError::Config(
                    "Redis URL is required when the redis store is selected".to_string(),
                ));
            }
            let store = redis::RedisStore::new(&config.store.redis.url, config.store.ttl)
                .await
                .map_err(StoreError::Config)?;
            Ok(Store::Redis(store))
        }
    }
}
