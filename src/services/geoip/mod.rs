//! GeoIP 服务模块
//!
//! 将 IP 地址解析为经纬度，当前实现为 ipstack。

mod external_api;
mod provider;

pub use external_api::{IpStackProvider, classify_response};
pub use provider::{GeoLookupResult, GeoResolver, build_resolver};
