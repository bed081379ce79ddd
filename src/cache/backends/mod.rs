//! 内置缓存后端

pub mod dynamodb;
pub mod memory;
pub mod redis;

pub use dynamodb::DynamoDbResponseCache;
pub use memory::MemoryResponseCache;
pub use redis::RedisResponseCache;
