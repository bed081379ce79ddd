use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::{self, ResponseCache};
use crate::config::StaticConfig;
use crate::services::{DistanceService, LookupSettings, build_resolver};

pub struct StartupContext {
    pub service: Arc<DistanceService>,
}

/// 准备服务器启动的上下文
///
/// 启用缓存时，`ensure_schema` 必须在监听端口之前完成；失败即终止启动。
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let resolver = build_resolver(&config.provider);

    let cache = if config.cache.enabled {
        Some(prepare_cache(config).await?)
    } else {
        warn!("Response cache disabled, every request resolves both identifiers live");
        None
    };

    let settings = LookupSettings::from_config(&config.cache);
    let service = Arc::new(DistanceService::new(resolver, cache, settings));

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext { service })
}

async fn prepare_cache(config: &StaticConfig) -> Result<Arc<dyn ResponseCache>> {
    let backend = cache::create_cache_backend(&config.cache)
        .await
        .with_context(|| format!("Failed to create '{}' cache backend", config.cache.backend))?;

    let schema_start = std::time::Instant::now();
    backend
        .ensure_schema()
        .await
        .with_context(|| format!("Failed to provision '{}' cache", backend.name()))?;

    info!(
        "Cache backend '{}' ready (key order: {}, on miss: {}, on error: {}) in {} ms",
        backend.name(),
        config.cache.key_order,
        config.cache.on_miss,
        config.cache.on_error,
        schema_start.elapsed().as_millis()
    );

    Ok(backend)
}
