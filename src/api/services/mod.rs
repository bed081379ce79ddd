pub mod ip_info;

pub use ip_info::{IpInfoQuery, IpInfoService, ip_info_routes};
