//! 缓存后端注册表
//!
//! 后端按名字注册，`cache.backend` 选择其中之一。内置 dynamodb、memory、redis，
//! 调用方可用 `register_cache_backend` 新增或替换（例如测试用的假实现）。

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::cache::backends::{DynamoDbResponseCache, MemoryResponseCache, RedisResponseCache};
use crate::cache::traits::ResponseCache;
use crate::config::{CacheBackendKind, CacheConfig};
use crate::errors::{IpDistanceError, Result};

pub type BoxedResponseCacheFuture =
    Pin<Box<dyn Future<Output = Result<Arc<dyn ResponseCache>>> + Send>>;
pub type ResponseCacheConstructor =
    Arc<dyn Fn(CacheConfig) -> BoxedResponseCacheFuture + Send + Sync>;

static CACHE_BACKEND_REGISTRY: Lazy<RwLock<HashMap<String, ResponseCacheConstructor>>> =
    Lazy::new(|| RwLock::new(builtin_backends()));

fn builtin_backends() -> HashMap<String, ResponseCacheConstructor> {
    let mut backends: HashMap<String, ResponseCacheConstructor> = HashMap::new();
    backends.insert(
        CacheBackendKind::DynamoDb.to_string(),
        Arc::new(|config: CacheConfig| Box::pin(build_dynamodb(config)) as BoxedResponseCacheFuture),
    );
    backends.insert(
        CacheBackendKind::Memory.to_string(),
        Arc::new(|config: CacheConfig| Box::pin(build_memory(config)) as BoxedResponseCacheFuture),
    );
    backends.insert(
        CacheBackendKind::Redis.to_string(),
        Arc::new(|config: CacheConfig| Box::pin(build_redis(config)) as BoxedResponseCacheFuture),
    );
    backends
}

async fn build_dynamodb(config: CacheConfig) -> Result<Arc<dyn ResponseCache>> {
    let cache = DynamoDbResponseCache::new(&config.dynamodb).await?;
    Ok(Arc::new(cache))
}

async fn build_memory(config: CacheConfig) -> Result<Arc<dyn ResponseCache>> {
    Ok(Arc::new(MemoryResponseCache::new(&config.memory)))
}

async fn build_redis(config: CacheConfig) -> Result<Arc<dyn ResponseCache>> {
    Ok(Arc::new(RedisResponseCache::new(&config.redis)?))
}

/// 注册（或替换）一个缓存后端
pub fn register_cache_backend<S: Into<String>>(name: S, constructor: ResponseCacheConstructor) {
    let name = name.into();
    debug!("Registering cache backend: {}", name);
    let mut registry = CACHE_BACKEND_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name, constructor);
}

pub fn get_cache_backend(name: &str) -> Option<ResponseCacheConstructor> {
    CACHE_BACKEND_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(name)
        .cloned()
}

pub fn get_cache_backend_names() -> Vec<String> {
    let mut names: Vec<String> = CACHE_BACKEND_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

/// 按配置创建缓存后端（不执行 ensure_schema）
pub async fn create_cache_backend(config: &CacheConfig) -> Result<Arc<dyn ResponseCache>> {
    let name = config.backend.as_str();
    let constructor = get_cache_backend(name).ok_or_else(|| {
        IpDistanceError::config(format!(
            "unknown cache backend '{}', available: {}",
            name,
            get_cache_backend_names().join(", ")
        ))
    })?;

    let cache = constructor(config.clone()).await?;
    debug!("Cache backend '{}' created", cache.name());
    Ok(cache)
}
