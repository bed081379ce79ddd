//! 配置值验证模块
//!
//! 启动前校验静态配置，缺失必需项时服务不得开始接收请求。

use super::{CacheBackendKind, StaticConfig};
use crate::cache::register::get_cache_backend_names;
use crate::errors::{IpDistanceError, Result};

/// 校验整个静态配置，一次性返回所有问题
pub fn validate_static_config(config: &StaticConfig) -> Result<()> {
    let mut problems = Vec::new();

    if config.provider.access_key.trim().is_empty() {
        problems.push(
            "provider access key is required (pass it as the first argument or set IPD__PROVIDER__ACCESS_KEY)"
                .to_string(),
        );
    }
    if !config.provider.api_url.contains("{ip}") {
        problems.push(format!(
            "provider.api_url must contain the {{ip}} placeholder: '{}'",
            config.provider.api_url
        ));
    }
    if config.provider.timeout_secs == 0 {
        problems.push("provider.timeout_secs must be greater than 0".to_string());
    }
    if config.server.workers == 0 {
        problems.push("server.workers must be greater than 0".to_string());
    }

    if config.cache.enabled {
        if config.cache.timeout_secs == 0 {
            problems.push("cache.timeout_secs must be greater than 0".to_string());
        }
        match config.cache.backend.parse::<CacheBackendKind>() {
            Ok(CacheBackendKind::DynamoDb) => {
                let ddb = &config.cache.dynamodb;
                if ddb.table.trim().is_empty() {
                    problems.push("cache.dynamodb.table must not be empty".to_string());
                }
                if ddb.region.trim().is_empty() && ddb.endpoint_url.is_none() {
                    problems.push(
                        "cache.dynamodb.region or cache.dynamodb.endpoint_url is required"
                            .to_string(),
                    );
                }
                if ddb.read_capacity < 1 || ddb.write_capacity < 1 {
                    problems.push("cache.dynamodb capacity units must be at least 1".to_string());
                }
            }
            Ok(CacheBackendKind::Memory) => {
                if config.cache.memory.max_capacity == 0 {
                    problems.push("cache.memory.max_capacity must be greater than 0".to_string());
                }
            }
            Ok(CacheBackendKind::Redis) => {
                if config.cache.redis.url.trim().is_empty() {
                    problems.push("cache.redis.url must not be empty".to_string());
                }
            }
            // 自定义后端只需已注册
            Err(_) => {
                let names = get_cache_backend_names();
                if !names.contains(&config.cache.backend) {
                    problems.push(format!(
                        "unknown cache backend '{}', available: {}",
                        config.cache.backend,
                        names.join(", ")
                    ));
                }
            }
        }
    }

    if !matches!(config.logging.format.as_str(), "text" | "json") {
        problems.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(IpDistanceError::config(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> StaticConfig {
        let mut config = StaticConfig::default();
        config.provider.access_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_static_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_access_key_is_fatal() {
        let config = StaticConfig::default();
        let err = validate_static_config(&config).unwrap_err();
        assert!(matches!(err, IpDistanceError::Config(_)));
        assert!(err.message().contains("access key"));
    }

    #[test]
    fn test_cache_settings_only_checked_when_enabled() {
        let mut config = valid_config();
        config.cache.dynamodb.table = String::new();
        assert!(validate_static_config(&config).is_ok());

        config.cache.enabled = true;
        let err = validate_static_config(&config).unwrap_err();
        assert!(err.message().contains("cache.dynamodb.table"));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = StaticConfig::default();
        config.provider.timeout_secs = 0;
        config.logging.format = "xml".to_string();
        let err = validate_static_config(&config).unwrap_err();
        let msg = err.message();
        assert!(msg.contains("access key"));
        assert!(msg.contains("provider.timeout_secs"));
        assert!(msg.contains("logging.format"));
    }

    #[test]
    fn test_unknown_backend_is_fatal() {
        let mut config = valid_config();
        config.cache.enabled = true;
        config.cache.backend = "cassandra".to_string();
        let err = validate_static_config(&config).unwrap_err();
        assert!(err.message().contains("unknown cache backend 'cassandra'"));
        assert!(err.message().contains("memory"));
    }

    #[test]
    fn test_url_template_requires_ip_placeholder() {
        let mut config = valid_config();
        config.provider.api_url = "http://api.ipstack.com/check".to_string();
        assert!(validate_static_config(&config).is_err());
    }
}
