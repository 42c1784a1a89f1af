use super::{DocumentStore, StoreError};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct InMemoryStore {
    entries: MokaCache<String, String>,
    /// Unbounded and without TTL
    persistent: MokaCache<String, String>,
}

impl InMemoryStore {
    /// Initialize a new in-memory store. A `ttl_secs` of 0 disables expiry.
    pub fn new(ttl_secs: u64, capacity_mib: usize) -> Result<Self, String> {
        let max_capacity_bytes: u64 = capacity_mib
            .checked_mul(1024 * 1024)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| format!("Capacity of {capacity_mib} MiB is too large"))?;

        let mut builder = MokaCache::builder()
            .weigher(|_key, value: &String| -> u32 { value.len().try_into().unwrap_or(u32::MAX) })
            .max_capacity(max_capacity_bytes);
        if ttl_secs > 0 {
            builder = builder.time_to_live(Duration::from_secs(ttl_secs));
        }

        Ok(Self {
            entries: builder.build(),
            persistent: MokaCache::builder().build(),
        })
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        self.persistent.remove(key).await;
        self.entries.insert(key.to_string(), serialized).await;
        Ok(())
    }

    async fn set_persistent<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        self.entries.remove(key).await;
        self.persistent.insert(key.to_string(), serialized).await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let value = match self.persistent.get(key).await {
            Some(value) => Some(value),
            None => self.entries.get(key).await,
        };
        if let Some(value) = value {
            serde_json::from_str(&value)
                .map_err(|e| StoreError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key).await;
        self.persistent.remove(key).await;
        Ok(())
    }
}
