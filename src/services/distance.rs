//! 大圆距离计算（Haversine）
//!
//! 纯函数，无副作用。公式与地球半径常量必须保持不变，
//! 否则与已缓存的结果不一致。

use serde::{Deserialize, Serialize};

/// 地球平均半径（km）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 经纬度坐标（单位：度）
///
/// latitude ∈ [-90, 90]，longitude ∈ [-180, 180]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// 坐标是否有限且在合法范围内
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// 计算两点之间的大圆距离（km）
#[inline]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = deg_to_rad(a.latitude);
    let lon1 = deg_to_rad(a.longitude);
    let lat2 = deg_to_rad(b.latitude);
    let lon2 = deg_to_rad(b.longitude);

    let half_d_lat = ((lat2 - lat1) / 2.0).sin();
    let half_d_lon = ((lon2 - lon1) / 2.0).sin();

    let h = half_d_lat * half_d_lat + lat1.cos() * lat2.cos() * half_d_lon * half_d_lon;
    // 浮点误差可能让 h 略微越界，越界时 sqrt(1-h) 会得到 NaN
    let h = h.clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * central_angle
}

#[inline]
fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}
