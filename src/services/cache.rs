use anyhow::Result;
use moka::future::Cache;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Two-tier cache: a small in-process moka tier in front of an optional Redis
/// connection. Redis being down degrades to memory-only operation instead of
/// failing startup.
pub struct CacheService {
    redis: Option<redis::aio::ConnectionManager>,
    memory: Cache<String, String>,
}

impl CacheService {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let redis = match redis::Client::open(redis_url) {
            Ok(client) => match client.get_connection_manager().await {
                Ok(conn) => {
                    tracing::info!("Redis connected");
                    Some(conn)
                }
                Err(e) => {
                    tracing::warn!("Redis unreachable ({}), continuing with memory cache", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Redis client setup failed ({}), continuing with memory cache", e);
                None
            }
        };

        let memory = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300))
            .build();

        Ok(Self { redis, memory })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        if let Some(hit) = self.memory.get(key).await {
            if let Ok(value) = serde_json::from_str(&hit) {
                return Ok(Some(value));
            }
        }

        if let Some(mut redis) = self.redis.clone() {
            match redis.get::<_, Option<String>>(key).await {
                Ok(Some(hit)) => {
                    if let Ok(value) = serde_json::from_str(&hit) {
                        self.memory.insert(key.to_string(), hit).await;
                        return Ok(Some(value));
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Redis get failed for {}: {}", key, e),
            }
        }

        Ok(None)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        self.memory.insert(key.to_string(), serialized.clone()).await;

        if let Some(mut redis) = self.redis.clone() {
            if let Err(e) = redis.set_ex::<_, _, ()>(key, serialized, ttl_secs).await {
                tracing::warn!("Redis set failed for {}: {}", key, e);
            }
        }

        Ok(())
    }

    /// Counter increment, Redis-backed when available. With no Redis the
    /// counter has no durable home and the delta is echoed back.
    pub async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        if let Some(mut redis) = self.redis.clone() {
            match redis.incr(key, delta).await {
                Ok(value) => Ok(value),
                Err(e) => {
                    tracing::warn!("Redis increment failed for {}: {}", key, e);
                    Ok(delta)
                }
            }
        } else {
            Ok(delta)
        }
    }

    pub async fn ping(&self) -> bool {
        if let Some(mut redis) = self.redis.clone() {
            redis::cmd("PING")
                .query_async::<_, String>(&mut redis)
                .await
                .is_ok()
        } else {
            false
        }
    }
}
