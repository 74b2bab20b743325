//! Service configuration.

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/fishbowl").
    pub data_dir: String,

    /// How long a feed request waits for the spender's lock, in milliseconds
    /// (default: 10000).
    pub lock_wait_ms: u64,

    /// How long an acquired lock lease lasts before it may be taken over, in
    /// milliseconds (default: 10000).
    pub lock_lease_ms: u64,

    /// Detail-view cache TTL in seconds (default: 1800).
    pub cache_ttl_seconds: u64,

    /// NATS server URL for notification delivery (optional; when unset the
    /// in-process channel is used).
    pub nats_url: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/fishbowl".into()),
            lock_wait_ms: std::env::var("LOCK_WAIT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            lock_lease_ms: std::env::var("LOCK_LEASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            cache_ttl_seconds: std::env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
            nats_url: std::env::var("NATS_URL").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/fishbowl".into(),
            lock_wait_ms: 10_000,
            lock_lease_ms: 10_000,
            cache_ttl_seconds: 1800,
            nats_url: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
