//! Service layer
//!
//! - `distance`: Haversine 距离计算
//! - `geoip`: identifier → 坐标
//! - `lookup`: 单次请求的编排（缓存 + 实时查询）

pub mod distance;
pub mod geoip;
pub mod lookup;

pub use distance::{Coordinate, EARTH_RADIUS_KM, haversine_km};
pub use geoip::{GeoLookupResult, GeoResolver, IpStackProvider, build_resolver};
pub use lookup::{DistanceService, LookupSettings, PairRequest};
