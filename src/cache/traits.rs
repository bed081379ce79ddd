//! 响应缓存抽象
//!
//! 各后端实现 `ResponseCache`，读取结果用 `CacheResult` 区分命中、未命中与后端错误。

use async_trait::async_trait;

use crate::errors::{IpDistanceError, Result};
use crate::models::CachedResponse;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 成功获取到缓存值
    Found(CachedResponse),
    /// 确定不存在
    NotFound,
    /// 后端故障或记录无法解码
    Error(String),
}

impl CacheResult {
    pub fn is_found(&self) -> bool {
        matches!(self, CacheResult::Found(_))
    }

    /// 转换为 Result，`NotFound` 与 `Error` 分别映射为对应错误
    pub fn into_result(self, key: &str) -> Result<CachedResponse> {
        match self {
            CacheResult::Found(response) => Ok(response),
            CacheResult::NotFound => Err(IpDistanceError::cache_not_found(format!(
                "no cached response for key '{}'",
                key
            ))),
            CacheResult::Error(detail) => Err(IpDistanceError::cache_backend(detail)),
        }
    }
}

/// 响应缓存后端
///
/// 实现必须支持并发调用；同一 key 的并发写入以最后一次为准。
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// 确保存储结构存在（幂等，多实例并发调用安全）
    async fn ensure_schema(&self) -> Result<()>;

    async fn get(&self, key: &str) -> CacheResult;

    /// 整体写入（覆盖已有记录）
    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()>;

    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;
}
