//! 距离查询编排
//!
//! 每个请求：校验参数 → （启用缓存时）读缓存 → 实时查询 → 组装响应 → 写缓存。
//! 服务本身无状态，可在多个 worker 间共享。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, CacheResult, ResponseCache};
use crate::config::{CacheConfig, CacheReadPolicy, KeyOrder};
use crate::errors::{IpDistanceError, Result};
use crate::models::CachedResponse;
use crate::services::geoip::{GeoLookupResult, GeoResolver};

/// 编排策略，启动时由配置构造
#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub key_order: KeyOrder,
    pub on_miss: CacheReadPolicy,
    pub on_error: CacheReadPolicy,
    pub cache_timeout: Duration,
}

impl LookupSettings {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            key_order: config.key_order,
            on_miss: config.on_miss,
            on_error: config.on_error,
            cache_timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// 已校验的请求参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRequest {
    pub ip1: String,
    pub ip2: String,
}

pub struct DistanceService {
    resolver: Arc<dyn GeoResolver>,
    cache: Option<Arc<dyn ResponseCache>>,
    settings: LookupSettings,
}

impl DistanceService {
    /// `cache` 为 `None` 表示本部署未启用缓存
    pub fn new(
        resolver: Arc<dyn GeoResolver>,
        cache: Option<Arc<dyn ResponseCache>>,
        settings: LookupSettings,
    ) -> Self {
        Self {
            resolver,
            cache,
            settings,
        }
    }

    /// 校验查询参数：两个 identifier 都必须存在且非空，内容不做校验
    pub fn validate_request(ip1: Option<&str>, ip2: Option<&str>) -> Result<PairRequest> {
        let ip1 = match ip1 {
            Some(v) if !v.is_empty() => v,
            _ => return Err(IpDistanceError::validation("IP address (ip1) is required")),
        };
        let ip2 = match ip2 {
            Some(v) if !v.is_empty() => v,
            _ => {
                return Err(IpDistanceError::validation(
                    "Second IP address (ip2) is required",
                ));
            }
        };
        Ok(PairRequest {
            ip1: ip1.to_string(),
            ip2: ip2.to_string(),
        })
    }

    /// 处理一次查询
    pub async fn lookup(&self, request: &PairRequest) -> Result<CachedResponse> {
        let Some(cache) = self.cache.as_ref() else {
            return self.resolve_live(request).await;
        };

        let key = CacheKey::for_pair(&request.ip1, &request.ip2, self.settings.key_order);

        match self.read_cache(cache.as_ref(), &key).await {
            CacheResult::Found(stored) => {
                debug!("Cache hit for {}", key);
                return Ok(if key.swapped() { stored.swapped() } else { stored });
            }
            CacheResult::NotFound => {
                if self.settings.on_miss == CacheReadPolicy::Fail {
                    return Err(IpDistanceError::cache_not_found(format!(
                        "no cached response for key '{}'",
                        key
                    )));
                }
                debug!("Cache miss for {}, resolving live", key);
            }
            CacheResult::Error(detail) => {
                if self.settings.on_error == CacheReadPolicy::Fail {
                    return Err(IpDistanceError::cache_backend(detail));
                }
                warn!("Cache read for {} failed ({}), resolving live", key, detail);
            }
        }

        let response = self.resolve_live(request).await?;
        self.store(cache.as_ref(), &key, &response).await;
        Ok(response)
    }

    /// 依次查询两个 identifier 并计算距离，任一失败立即返回
    pub async fn resolve_live(&self, request: &PairRequest) -> Result<CachedResponse> {
        let request1 = self.resolve_one(&request.ip1).await?;
        let request2 = self.resolve_one(&request.ip2).await?;

        let response = CachedResponse::from_lookups(request1, request2);
        info!(
            "Resolved {} -> {}: {:.3} km",
            request.ip1, request.ip2, response.distance
        );
        Ok(response)
    }

    async fn resolve_one(&self, identifier: &str) -> Result<GeoLookupResult> {
        self.resolver.resolve(identifier).await.map_err(|e| {
            error!(
                "{} lookup for {} failed [{}]: {}",
                self.resolver.name(),
                identifier,
                e.code(),
                e.format_simple()
            );
            e
        })
    }

    async fn read_cache(&self, cache: &dyn ResponseCache, key: &CacheKey) -> CacheResult {
        match timeout(self.settings.cache_timeout, cache.get(key.as_str())).await {
            Ok(result) => result,
            Err(_) => CacheResult::Error(format!(
                "{} read for '{}' timed out after {:?}",
                cache.name(),
                key,
                self.settings.cache_timeout
            )),
        }
    }

    /// 写缓存失败只记录日志，不影响响应
    async fn store(&self, cache: &dyn ResponseCache, key: &CacheKey, response: &CachedResponse) {
        let stored = if key.swapped() {
            response.clone().swapped()
        } else {
            response.clone()
        };

        match timeout(self.settings.cache_timeout, cache.put(key.as_str(), &stored)).await {
            Ok(Ok(())) => debug!("Stored response for {} in {}", key, cache.name()),
            Ok(Err(e)) => warn!("Failed to store response for {}: {}", key, e),
            Err(_) => warn!(
                "Storing response for {} timed out after {:?}",
                key, self.settings.cache_timeout
            ),
        }
    }
}
