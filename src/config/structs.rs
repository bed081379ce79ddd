use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::errors::Result;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，例如 IPD__PROVIDER__ACCESS_KEY
pub const ENV_PREFIX: &str = "IPD";

/// 内置缓存后端
///
/// `cache.backend` 本身是注册表中的名字，自定义后端通过 `register_cache_backend` 加入。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    DynamoDb,
    Memory,
    Redis,
}

/// 缓存 key 的构造方式
///
/// - `Ordered`：`ip1|ip2`，(A,B) 与 (B,A) 是两个不同的条目
/// - `Unordered`：两个 identifier 排序后拼接，(A,B) 与 (B,A) 共用一个条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyOrder {
    #[default]
    Ordered,
    Unordered,
}

/// 缓存读取失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheReadPolicy {
    /// 直接返回 500
    Fail,
    /// 退回到实时查询 provider
    Resolve,
}

/// 静态配置（启动时加载，之后只读）
///
/// 优先级：命令行 > ENV > config.toml > 默认值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// `path` 为 None 时读取可选的 `config.toml`；显式指定的文件必须存在。
    /// ENV 前缀：IPD，分隔符：__
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config = settings.try_deserialize::<StaticConfig>()?;
        Ok(config)
    }

    /// 用命令行参数覆盖配置
    pub fn apply_args(&mut self, args: &super::Args) {
        if let Some(ref key) = args.access_key {
            self.provider.access_key = key.clone();
        }
        if args.cache {
            self.cache.enabled = true;
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("# Error generating sample config: {}", e))
    }

    /// 校验配置，失败时服务不应启动
    pub fn validate(&self) -> Result<()> {
        super::validators::validate_static_config(self)
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// 地理位置 provider 配置
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// URL 模板，`{ip}` 和 `{access_key}` 为占位符
    #[serde(default = "default_provider_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

// access_key 不进日志
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("access_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 响应缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    /// 注册表中的后端名（dynamodb / memory / redis 或自定义）
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default)]
    pub key_order: KeyOrder,
    #[serde(default = "default_on_miss")]
    pub on_miss: CacheReadPolicy,
    #[serde(default = "default_on_error")]
    pub on_error: CacheReadPolicy,
    #[serde(default = "default_cache_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub dynamodb: DynamoDbConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// DynamoDB 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamoDbConfig {
    #[serde(default = "default_dynamodb_table")]
    pub table: String,
    #[serde(default = "default_dynamodb_region")]
    pub region: String,
    /// 本地调试用，例如 http://localhost:8000
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_capacity_units")]
    pub read_capacity: i64,
    #[serde(default = "default_capacity_units")]
    pub write_capacity: i64,
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_memory_ttl")]
    pub ttl_secs: u64,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_provider_api_url() -> String {
    "http://api.ipstack.com/{ip}?access_key={access_key}".to_string()
}

fn default_provider_timeout() -> u64 {
    5
}

fn default_cache_backend() -> String {
    CacheBackendKind::default().to_string()
}

fn default_on_miss() -> CacheReadPolicy {
    CacheReadPolicy::Resolve
}

fn default_on_error() -> CacheReadPolicy {
    CacheReadPolicy::Fail
}

fn default_cache_timeout() -> u64 {
    5
}

fn default_dynamodb_table() -> String {
    "IPInfoResponses".to_string()
}

fn default_dynamodb_region() -> String {
    "us-west-2".to_string()
}

fn default_capacity_units() -> i64 {
    5
}

fn default_ready_timeout() -> u64 {
    120
}

fn default_memory_capacity() -> u64 {
    10_000
}

fn default_memory_ttl() -> u64 {
    3600
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "ipdistance:".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_provider_api_url(),
            access_key: String::new(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: default_cache_backend(),
            key_order: KeyOrder::default(),
            on_miss: default_on_miss(),
            on_error: default_on_error(),
            timeout_secs: default_cache_timeout(),
            dynamodb: DynamoDbConfig::default(),
            memory: MemoryConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            table: default_dynamodb_table(),
            region: default_dynamodb_region(),
            endpoint_url: None,
            read_capacity: default_capacity_units(),
            write_capacity: default_capacity_units(),
            ready_timeout_secs: default_ready_timeout(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
            ttl_secs: default_memory_ttl(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
