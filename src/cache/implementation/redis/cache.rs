use super::super::super::{cache::*, key::*, response::*};

use {
    redis::{AsyncCommands, RedisError, aio::*},
    std::{sync::*, time::*},
};

/// Default key prefix for [RedisCache].
pub const DEFAULT_KEY_PREFIX: &str = "view-cache:";

//
// RedisCache
//

/// Redis cache implementation.
///
/// Entries are stored as JSON (see [CachedResponse::to_json]) with `SET ... EX`. Redis can be
/// asked for the remaining time-to-live of an entry, so the capability is [CacheCapability::Ttl].
///
/// Failures are logged and otherwise ignored: a failed `get` is a miss and a failed `set` is
/// dropped.
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
    key_prefix: Arc<str>,
}

impl RedisCache {
    /// Constructor.
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self {
            connection,
            key_prefix: DEFAULT_KEY_PREFIX.into(),
        }
    }

    /// Connect.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = redis::Client::open(url)?;
        Ok(Self::new(client.get_multiplexed_async_connection().await?))
    }

    /// Key prefix.
    ///
    /// The default is [DEFAULT_KEY_PREFIX].
    pub fn key_prefix(mut self, key_prefix: &str) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    fn redis_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

impl Cache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedResponseRef> {
        let mut connection = self.connection.clone();
        let json: Option<String> = match connection.get(self.redis_key(key)).await {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!("could not get {}: {}", key, error);
                return None;
            }
        };

        match CachedResponse::from_json(&json?) {
            Ok(cached_response) => Some(Arc::new(cached_response)),
            Err(error) => {
                tracing::warn!("could not read {}: {}", key, error);
                None
            }
        }
    }

    async fn set(&self, key: CacheKey, cached_response: CachedResponseRef) {
        let json = match cached_response.to_json() {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!("could not write {}: {}", key, error);
                return;
            }
        };

        let mut connection = self.connection.clone();
        let result: Result<(), RedisError> = match cached_response.timeout {
            // Redis expiry has a resolution of 1 second
            Some(timeout) => {
                let seconds = timeout.as_secs().max(1);
                connection.set_ex(self.redis_key(&key), json, seconds).await
            }
            None => connection.set(self.redis_key(&key), json).await,
        };

        if let Err(error) = result {
            tracing::warn!("could not set {}: {}", key, error);
        }
    }

    fn capability(&self) -> CacheCapability {
        CacheCapability::Ttl
    }

    async fn probe(&self, key: &CacheKey, _cached_response: &CachedResponse) -> CacheProbe {
        let mut connection = self.connection.clone();
        // -2: no such key, -1: no expiry
        match connection.ttl::<_, i64>(self.redis_key(key)).await {
            Ok(ttl) if ttl >= 0 => CacheProbe::Ttl(Duration::from_secs(ttl as u64)),
            Ok(_) => CacheProbe::Absent,
            Err(error) => {
                tracing::warn!("could not get TTL of {}: {}", key, error);
                CacheProbe::Absent
            }
        }
    }
}
