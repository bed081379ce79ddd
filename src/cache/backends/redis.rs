//! Redis 响应缓存
//!
//! 值为 JSON，key 带配置的前缀。连接按需建立，出错后重置。

use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error, trace};

use crate::cache::traits::{CacheResult, ResponseCache};
use crate::config::RedisConfig;
use crate::errors::{IpDistanceError, Result};
use crate::models::CachedResponse;

/// Redis 缓存：值为 JSON 字符串，不设置过期时间
pub struct RedisResponseCache {
    client: redis::Client,
    /// 持久化连接，出错后重建
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisResponseCache {
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            IpDistanceError::config(format!("invalid redis url '{}': {}", config.url, e))
        })?;

        debug!(
            "RedisResponseCache created with prefix: '{}'",
            config.key_prefix
        );

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn ensure_schema(&self) -> Result<()> {
        let mut conn = self
            .get_connection()
            .await
            .map_err(|e| IpDistanceError::provision(format!("redis connect failed: {}", e)))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| IpDistanceError::provision(format!("redis ping failed: {}", e)))?;
        debug!("Redis connection test successful: {}", pong);
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult {
        let mut conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return CacheResult::Error(format!("redis connection failed: {}", e));
            }
        };

        let redis_key = self.make_key(key);
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(data)) => match serde_json::from_str::<CachedResponse>(&data) {
                Ok(response) => {
                    trace!("Redis cache hit: {}", key);
                    CacheResult::Found(response)
                }
                Err(e) => {
                    error!("Failed to decode cached response for '{}': {}", key, e);
                    CacheResult::Error(format!("undecodable cache entry '{}': {}", key, e))
                }
            },
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Redis GET for '{}' failed: {}", key, e);
                self.reset_connection().await;
                CacheResult::Error(format!("redis get failed: {}", e))
            }
        }
    }

    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let mut conn = self
            .get_connection()
            .await
            .map_err(|e| IpDistanceError::cache_backend(format!("redis connection failed: {}", e)))?;

        let redis_key = self.make_key(key);
        if let Err(e) = conn.set::<_, _, ()>(&redis_key, data).await {
            self.reset_connection().await;
            return Err(IpDistanceError::cache_backend(format!(
                "redis set for '{}' failed: {}",
                key, e
            )));
        }
        trace!("Stored response in Redis: {}", key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
