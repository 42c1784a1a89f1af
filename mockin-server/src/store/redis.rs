use super::{DocumentStore, StoreError};
use async_trait::async_trait;
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Clone)]
pub struct RedisStore {
    conn_manager: ConnectionManager,
    ttl_secs: u64,
}

impl RedisStore {
    /// Connect to Redis. A `ttl_secs` of 0 stores keys without expiry.
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, String> {
        let client =
            Client::open(redis_url).map_err(|err| format!("Failed to connect to Redis: {}", err))?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|err| format!("Failed to create Redis connection manager: {}", err))?;

        let mut conn = conn_manager.clone();
        if let Err(err) = redis::cmd("PING").query_async::<String>(&mut conn).await {
            return Err(format!("Failed to ping Redis: {}", err));
        }

        Ok(Self {
            conn_manager,
            ttl_secs,
        })
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.conn_manager.clone();

        let result = if self.ttl_secs > 0 {
            conn.set_ex::<_, _, ()>(key, serialized, self.ttl_secs).await
        } else {
            conn.set::<_, _, ()>(key, serialized).await
        };
        result.map_err(|err| {
            error!("Redis error while setting key {}: {}", key, err);
            StoreError::Redis(err.to_string())
        })
    }

    async fn set_persistent<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.conn_manager.clone();

        // A plain SET also clears any expiry left by an earlier `set`.
        conn.set::<_, _, ()>(key, serialized).await.map_err(|err| {
            error!("Redis error while setting key {}: {}", key, err);
            StoreError::Redis(err.to_string())
        })
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let mut conn = self.conn_manager.clone();

        let result: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(err) => {
                error!("Redis error while getting key {}: {}", key, err);
                return Err(StoreError::Redis(err.to_string()));
            }
        };

        result
            .map(|value| {
                serde_json::from_str(&value).map_err(|e| StoreError::Deserialization(e.to_string()))
            })
            .transpose()
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Redis health check failed: {}", err)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn_manager.clone();

        conn.del::<_, ()>(key).await.map_err(|err| {
            error!("Redis error while deleting key {}: {}", key, err);
            StoreError::Redis(err.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_test::server::RedisServer;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        field: String,
    }

    fn redis_url(server: &RedisServer) -> String {
        match &server.addr {
            redis::ConnectionAddr::Tcp(host, port) => format!("redis://{}:{}/", host, port),
            _ => "redis://127.0.0.1:6379/".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "requires a redis-server binary"]
    async fn test_redis_operations() {
        let server = RedisServer::new();
        let store = RedisStore::new(&redis_url(&server), 0).await.unwrap();

        let data = TestData {
            field: "test".to_string(),
        };
        store.set("test_key", &data).await.unwrap();
        let retrieved: TestData = store.get("test_key").await.unwrap().unwrap();
        assert_eq!(data, retrieved);

        store.delete("test_key").await.unwrap();
        assert!(store.get::<TestData>("test_key").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a redis-server binary"]
    async fn test_redis_expiration() {
        let server = RedisServer::new();
        let store = RedisStore::new(&redis_url(&server), 1).await.unwrap();

        store.set("short", &"lived").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(store.get::<String>("short").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a redis-server binary"]
    async fn test_redis_persistent_keys_do_not_expire() {
        let server = RedisServer::new();
        let store = RedisStore::new(&redis_url(&server), 1).await.unwrap();

        store.set_persistent("consent", &"kept").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(store.get::<String>("consent").await.unwrap().as_deref(), Some("kept"));
    }

    #[tokio::test]
    #[ignore = "requires a redis-server binary"]
    async fn test_redis_health_check() {
        let server = RedisServer::new();
        let store = RedisStore::new(&redis_url(&server), 0).await.unwrap();
        assert!(store.health_check().await.is_ok());
    }
}
