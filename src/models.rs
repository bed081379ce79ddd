//! 响应模型
//!
//! `CachedResponse` 既是 HTTP 响应体，也是缓存中存储的记录。

use serde::{Deserialize, Serialize};

use crate::services::distance::haversine_km;
use crate::services::geoip::GeoLookupResult;

/// 一次距离查询的完整结果
///
/// 写入缓存后不可部分修改，只会被整体覆盖。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// 大圆距离（km）
    pub distance: f64,
    pub request1: GeoLookupResult,
    pub request2: GeoLookupResult,
}

impl CachedResponse {
    /// 由两次查询结果计算距离并组装响应
    pub fn from_lookups(request1: GeoLookupResult, request2: GeoLookupResult) -> Self {
        let distance = haversine_km(request1.coordinate(), request2.coordinate());
        Self {
            distance,
            request1,
            request2,
        }
    }

    /// 交换 request1 / request2，距离不变
    pub fn swapped(self) -> Self {
        Self {
            distance: self.distance,
            request1: self.request2,
            request2: self.request1,
        }
    }
}
