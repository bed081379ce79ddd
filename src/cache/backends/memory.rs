//! 进程内响应缓存（moka）

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, trace};

use crate::cache::traits::{CacheResult, ResponseCache};
use crate::config::MemoryConfig;
use crate::errors::Result;
use crate::models::CachedResponse;

/// 进程内缓存（moka），适合单实例部署与测试
pub struct MemoryResponseCache {
    inner: Cache<String, CachedResponse>,
}

impl MemoryResponseCache {
    pub fn new(config: &MemoryConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        debug!(
            "MemoryResponseCache initialized with max capacity: {}, TTL: {}s",
            config.max_capacity, config.ttl_secs
        );
        Self { inner }
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult {
        match self.inner.get(key).await {
            Some(value) => {
                trace!("Memory cache hit: {}", key);
                CacheResult::Found(value)
            }
            None => CacheResult::NotFound,
        }
    }

    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()> {
        self.inner.insert(key.to_string(), value.clone()).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
