use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use swap_engine_ratelimit::ReconnectBackoff;
use tracing::{info, warn};

use crate::{CacheError, CacheStore};

/// Redis-backed store shared by every service instance
///
/// Bootstrap retries on the reconnect schedule; if it never succeeds the
/// store stays disconnected and every operation reports `Unavailable`.
/// Once connected, `ConnectionManager` re-establishes dropped connections
/// on its own.
#[derive(Clone)]
pub struct RedisCacheStore {
    manager: Option<ConnectionManager>,
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str, mut backoff: ReconnectBackoff) -> Self {
        let client = match redis::Client::open(redis_url) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "invalid redis url, cache disabled");
                return Self::disconnected();
            }
        };

        loop {
            match ConnectionManager::new(client.clone()).await {
                Ok(manager) => {
                    info!(attempts = backoff.current_attempt() + 1, "connected to redis cache");
                    return Self {
                        manager: Some(manager),
                    };
                }
                Err(e) => match backoff.next_delay() {
                    Some(delay) => {
                        warn!(
                            error = %e,
                            attempt = backoff.current_attempt(),
                            delay_ms = delay.as_millis() as u64,
                            "redis connection failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        warn!(error = %e, "redis unreachable, giving up; cache disabled");
                        return Self::disconnected();
                    }
                },
            }
        }
    }

    /// A store with no connection; all operations fail with `Unavailable`
    pub fn disconnected() -> Self {
        Self { manager: None }
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_some()
    }

    fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.manager
            .clone()
            .ok_or_else(|| CacheError::Unavailable("redis not connected".to_string()))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection()?;
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.connection()?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.connection()?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection()?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
