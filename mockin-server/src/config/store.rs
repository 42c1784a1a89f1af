use serde::Deserialize;

/// Specifies which document store backend to use
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    #[default]
    InMemory,
    Redis,
}

/// Configuration for the document store
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Entry TTL in seconds, 0 keeps entries until evicted (default: 0)
    pub ttl: u64,

    /// Store backend: "in-memory" (default) or "redis"
    pub kind: StoreKind,

    /// In-memory store specific configuration
    pub memory: InMemoryConfig,

    /// Redis store specific configuration
    pub redis: RedisConfig,
}

/// In-memory store configuration options
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InMemoryConfig {
    /// Maximum capacity in MiB (default: 128 MiB)
    pub capacity: usize,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

/// Redis store configuration options
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection string
    pub url: String,
}
