//! GeoIP Provider 抽象层
//!
//! 统一的地理位置查询接口。查询结果保留 provider 返回的完整 JSON，
//! 同时携带经过校验的坐标，调用方不需要再对原始字段做类型断言。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::external_api::IpStackProvider;
use crate::config::ProviderConfig;
use crate::errors::{IpDistanceError, Result};
use crate::services::distance::Coordinate;

/// 单个 identifier 的查询结果
///
/// 序列化时只输出原始 payload；反序列化时重新校验坐标，
/// 所以从缓存读回的脏数据同样会被拒绝。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct GeoLookupResult {
    payload: Map<String, Value>,
    coordinate: Coordinate,
}

impl GeoLookupResult {
    /// 从 provider payload 构造，校验 latitude / longitude
    pub fn from_payload(payload: Map<String, Value>) -> Result<Self> {
        let coordinate = extract_coordinate(&payload)?;
        Ok(Self {
            payload,
            coordinate,
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// payload 中的字符串字段（例如 "ip"、"city"）
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

impl TryFrom<Map<String, Value>> for GeoLookupResult {
    type Error = IpDistanceError;

    fn try_from(payload: Map<String, Value>) -> Result<Self> {
        Self::from_payload(payload)
    }
}

impl From<GeoLookupResult> for Map<String, Value> {
    fn from(result: GeoLookupResult) -> Self {
        result.payload
    }
}

fn extract_coordinate(payload: &Map<String, Value>) -> Result<Coordinate> {
    let latitude = numeric_field(payload, "latitude")?;
    let longitude = numeric_field(payload, "longitude")?;
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(IpDistanceError::malformed_payload(format!(
            "coordinate out of range: ({}, {})",
            latitude, longitude
        )));
    }
    Ok(coordinate)
}

fn numeric_field(payload: &Map<String, Value>, field: &str) -> Result<f64> {
    match payload.get(field) {
        Some(value) => value.as_f64().ok_or_else(|| {
            IpDistanceError::malformed_payload(format!(
                "field '{}' is not numeric: {}",
                field, value
            ))
        }),
        None => Err(IpDistanceError::malformed_payload(format!(
            "field '{}' is missing",
            field
        ))),
    }
}

/// 地理位置查询 trait
///
/// 实现必须可以并发调用，内部不做重试。
#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// 查询单个 identifier
    async fn resolve(&self, identifier: &str) -> Result<GeoLookupResult>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 根据配置创建 resolver
pub fn build_resolver(config: &ProviderConfig) -> Arc<dyn GeoResolver> {
    let resolver: Arc<dyn GeoResolver> = Arc::new(IpStackProvider::new(config));
    info!(
        "GeoIP: Initialized with {} provider (timeout {}s)",
        resolver.name(),
        config.timeout_secs
    );
    resolver
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_from_payload_keeps_all_fields() {
        let payload = as_map(json!({
            "ip": "50.168.198.162",
            "city": "Tucker",
            "latitude": 33.856021881103516,
            "longitude": -84.21367645263672,
            "location": {"geoname_id": 4227213, "is_eu": false}
        }));
        let result = GeoLookupResult::from_payload(payload.clone()).unwrap();

        assert_eq!(result.coordinate().latitude, 33.856021881103516);
        assert_eq!(result.coordinate().longitude, -84.21367645263672);
        assert_eq!(result.get_str("city"), Some("Tucker"));
        assert_eq!(result.payload(), &payload);
    }

    #[test]
    fn test_integer_coordinates_are_accepted() {
        let result =
            GeoLookupResult::from_payload(as_map(json!({"latitude": 10, "longitude": -20})))
                .unwrap();
        assert_eq!(result.coordinate(), Coordinate::new(10.0, -20.0));
    }

    #[test]
    fn test_missing_latitude_is_malformed() {
        let err =
            GeoLookupResult::from_payload(as_map(json!({"longitude": 1.0}))).unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
        assert!(err.message().contains("latitude"));
    }

    #[test]
    fn test_null_coordinates_are_malformed() {
        // ipstack 对保留地址返回 null 坐标
        let err = GeoLookupResult::from_payload(as_map(json!({
            "ip": "192.168.1.1",
            "latitude": null,
            "longitude": null
        })))
        .unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
    }

    #[test]
    fn test_string_coordinates_are_malformed() {
        let err = GeoLookupResult::from_payload(as_map(json!({
            "latitude": "33.8",
            "longitude": "-84.2"
        })))
        .unwrap_err();
        assert!(matches!(err, IpDistanceError::MalformedPayload(_)));
    }

    #[test]
    fn test_out_of_range_coordinates_are_malformed() {
        let err = GeoLookupResult::from_payload(as_map(json!({
            "latitude": 120.0,
            "longitude": 0.0
        })))
        .unwrap_err();
        assert!(err.message().contains("out of range"));
    }

    #[test]
    fn test_serializes_as_plain_payload() {
        let result = GeoLookupResult::from_payload(as_map(json!({
            "ip": "1.1.1.1",
            "latitude": 1.5,
            "longitude": 2.5
        })))
        .unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"ip": "1.1.1.1", "latitude": 1.5, "longitude": 2.5})
        );
    }

    #[test]
    fn test_deserialize_rejects_payload_without_coordinates() {
        let parsed: std::result::Result<GeoLookupResult, _> =
            serde_json::from_value(json!({"ip": "1.1.1.1"}));
        assert!(parsed.is_err());
    }
}
