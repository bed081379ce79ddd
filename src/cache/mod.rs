//! 响应缓存
//!
//! 后端通过 `register` 中的注册表按名称创建。

pub mod backends;
pub mod key;
pub mod register;
pub mod traits;

pub use key::CacheKey;
pub use register::{create_cache_backend, register_cache_backend};
pub use traits::{CacheResult, ResponseCache};
