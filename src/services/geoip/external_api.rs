//! ipstack GeoIP 实现
//!
//! ureq 是同步客户端，请求放在 spawn_blocking 中执行。
//! 响应分类（限流 / 凭证错误 / 格式错误）是纯函数，便于离线测试。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::provider::{GeoLookupResult, GeoResolver};
use crate::config::ProviderConfig;
use crate::errors::{IpDistanceError, Result};

/// ipstack 凭证类错误码
const CREDENTIAL_ERROR_TYPES: &[&str] = &["invalid_access_key", "missing_access_key"];
/// ipstack 配额类错误码
const QUOTA_ERROR_TYPES: &[&str] = &["usage_limit_reached", "rate_limit_reached"];

/// ipstack Provider
///
/// 不做重试，也不做进程内缓存：跨请求复用交给响应缓存层。
pub struct IpStackProvider {
    agent: Agent,
    api_url_template: String,
    access_key: String,
}

impl IpStackProvider {
    /// 创建 Provider
    ///
    /// `api_url` 中 `{ip}` 与 `{access_key}` 为占位符
    pub fn new(config: &ProviderConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            // 非 2xx 也要读 body，ipstack 的错误对象在 body 里
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url_template: config.api_url.clone(),
            access_key: config.access_key.clone(),
        }
    }

    fn build_url(&self, identifier: &str) -> String {
        self.api_url_template
            .replace("{ip}", &urlencoding::encode(identifier))
            .replace("{access_key}", &urlencoding::encode(&self.access_key))
    }

    /// 同步请求（在 spawn_blocking 中调用）
    fn fetch_sync(agent: Agent, url: String, identifier: String) -> Result<GeoLookupResult> {
        let resp = agent.get(&url).call().map_err(|e| {
            warn!("ipstack request for {} failed: {}", identifier, e);
            IpDistanceError::provider_unreachable(format!(
                "request for {} failed: {}",
                identifier, e
            ))
        })?;

        let status = resp.status().as_u16();
        let body = resp.into_body().read_to_string().map_err(|e| {
            warn!("ipstack response body for {} unreadable: {}", identifier, e);
            IpDistanceError::provider_unreachable(format!(
                "failed to read response for {}: {}",
                identifier, e
            ))
        })?;

        trace!("ipstack {} -> HTTP {} ({} bytes)", identifier, status, body.len());
        classify_response(status, &body)
    }
}

/// 将 ipstack 的 HTTP 状态与 body 映射为查询结果
///
/// ipstack 在多数错误场景下仍返回 200，错误信息位于 `error` 对象中。
pub fn classify_response(status: u16, body: &str) -> Result<GeoLookupResult> {
    if status == 429 {
        return Err(IpDistanceError::rate_limited("HTTP 429 Too Many Requests"));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        IpDistanceError::malformed_payload(format!("response is not JSON (HTTP {}): {}", status, e))
    })?;

    let Value::Object(payload) = value else {
        return Err(IpDistanceError::malformed_payload(format!(
            "response is not a JSON object (HTTP {})",
            status
        )));
    };

    if let Some(error) = payload.get("error") {
        return Err(classify_error_object(error));
    }

    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(IpDistanceError::malformed_payload(
            "provider reported success=false without an error object",
        ));
    }

    if !(200..300).contains(&status) {
        return Err(IpDistanceError::provider_unreachable(format!(
            "unexpected HTTP status {}",
            status
        )));
    }

    GeoLookupResult::from_payload(payload)
}

fn classify_error_object(error: &Value) -> IpDistanceError {
    let error_type = error.get("type").and_then(Value::as_str).unwrap_or_default();
    let info = error
        .get("info")
        .and_then(Value::as_str)
        .unwrap_or(error_type)
        .to_string();

    if CREDENTIAL_ERROR_TYPES.contains(&error_type) {
        IpDistanceError::invalid_credential(info)
    } else if QUOTA_ERROR_TYPES.contains(&error_type) {
        IpDistanceError::rate_limited(info)
    } else {
        IpDistanceError::malformed_payload(format!("provider error '{}': {}", error_type, info))
    }
}

#[async_trait]
impl GeoResolver for IpStackProvider {
    async fn resolve(&self, identifier: &str) -> Result<GeoLookupResult> {
        let url = self.build_url(identifier);
        let agent = self.agent.clone();
        let owned = identifier.to_string();

        debug!("Resolving {} via ipstack", identifier);

        tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url, owned))
            .await
            .map_err(|e| {
                warn!("ipstack spawn_blocking failed: {}", e);
                IpDistanceError::provider_unreachable(format!("lookup task failed: {}", e))
            })?
    }

    fn name(&self) -> &'static str {
        "ipstack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_config(api_url: &str) -> ProviderConfig {
        ProviderConfig {
            api_url: api_url.to_string(),
            access_key: "k3y".to_string(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_build_url_substitutes_placeholders() {
        let provider = IpStackProvider::new(&provider_config(
            "http://api.ipstack.com/{ip}?access_key={access_key}",
        ));
        assert_eq!(
            provider.build_url("50.168.198.162"),
            "http://api.ipstack.com/50.168.198.162?access_key=k3y"
        );
    }

    #[test]
    fn test_build_url_encodes_identifier() {
        let provider = IpStackProvider::new(&provider_config("http://geo.local/{ip}"));
        assert_eq!(
            provider.build_url("a b/../c"),
            "http://geo.local/a%20b%2F..%2Fc"
        );
    }

    #[test]
    fn test_classify_success() {
        let body = r#"{"ip":"174.49.112.125","city":"Alpharetta","latitude":34.08958053588867,"longitude":-84.29045867919922}"#;
        let result = classify_response(200, body).unwrap();
        assert_eq!(result.get_str("city"), Some("Alpharetta"));
        assert_eq!(result.coordinate().latitude, 34.08958053588867);
    }

    #[test]
    fn test_classify_http_429_is_rate_limited() {
        let err = classify_response(429, "").unwrap_err();
        assert!(matches!(err, IpDistanceError::RateLimited(_)));
    }

    #[test]
    fn test_classify_invalid_access_key() {
        let body = r#"{"success":false,"error":{"code":101,"type":"invalid_access_key","info":"You have not supplied a valid API Access Key."}}"#;
        let err = classify_response(200, body).unwrap_err();
        assert!(matches!(err, IpDistanceError::InvalidCredential(_)));
        assert!(err.message().contains("valid API Access Key"));
    }

    #[test]
    fn test_classify_missing_access_key() {
        let body = r#"{"success":false,"error":{"code":101,"type":"missing_access_key"}}"#;
        let err = classify_response(200, body).unwrap_err();
        assert!(matches!(err, IpDistanceError::InvalidCredential(_)));
    }

    #[test]
    fn test_classify_usage_limit_is_rate_limited() {
        let body = r#"{"success":false,"error":{"code":104,"type":"usage_limit_reached","info":"Your monthly usage limit has been reached."}}"#;
        let err = classify_response(200, body).unwrap_err();
        assert!(matches!(err, IpDistanceError::RateLimited(_)));
    }

    #[test]
    fn test_classify_other_provider_error_is_malformed() {
        let body = r#"{"success":false,"error":{"code":106,"type":"invalid_ip_address"}}"#;
        let err = classify_response(200, body).unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
        assert!(err.message().contains("invalid_ip_address"));
    }

    #[test]
    fn test_classify_non_json_is_malformed() {
        let err = classify_response(200, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
    }

    #[test]
    fn test_classify_json_array_is_malformed() {
        let err = classify_response(200, "[1,2,3]").unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
    }

    #[test]
    fn test_classify_null_coordinates_is_malformed() {
        let body = r#"{"ip":"10.0.0.1","type":null,"latitude":null,"longitude":null}"#;
        let err = classify_response(200, body).unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
    }

    #[test]
    fn test_classify_server_error_without_error_object() {
        let err = classify_response(503, r#"{"message":"unavailable"}"#).unwrap_err();
        assert!(matches!(err, IpDistanceError::ProviderUnreachable(_)));
    }

    /// 不可路由地址，应在超时内失败
    /// 依赖本机网络环境，CI 环境可能行为不同
    #[tokio::test]
    #[ignore]
    async fn test_unreachable_provider() {
        let provider = IpStackProvider::new(&provider_config("http://192.0.2.1/{ip}"));
        let err = provider.resolve("8.8.8.8").await.unwrap_err();
        assert!(matches!(err, IpDistanceError::ProviderUnreachable(_)));
    }

    /// 需要真实的 IPSTACK_ACCESS_KEY 环境变量
    #[tokio::test]
    #[ignore]
    async fn test_real_ipstack_lookup() {
        let key = std::env::var("IPSTACK_ACCESS_KEY").expect("IPSTACK_ACCESS_KEY not set");
        let provider = IpStackProvider::new(&ProviderConfig {
            access_key: key,
            ..ProviderConfig::default()
        });
        let result = provider.resolve("8.8.8.8").await.unwrap();
        assert!(result.coordinate().is_valid());
    }
}
