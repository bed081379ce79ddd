use std::fmt;

use actix_web::http::StatusCode;

/// 查询失败时附带的排障提示（provider 限流是测试期间最常见的故障）
pub const MOCK_HINT: &str = "Have you considered mocking this endpoint with proxymock?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpDistanceError {
    Validation(String),
    ProviderUnreachable(String),
    RateLimited(String),
    InvalidCredential(String),
    MalformedPayload(String),
    CacheNotFound(String),
    CacheBackend(String),
    Provision(String),
    Config(String),
    Serialization(String),
}

impl IpDistanceError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            IpDistanceError::Validation(_) => "E001",
            IpDistanceError::ProviderUnreachable(_) => "E002",
            IpDistanceError::RateLimited(_) => "E003",
            IpDistanceError::InvalidCredential(_) => "E004",
            IpDistanceError::MalformedPayload(_) => "E005",
            IpDistanceError::CacheNotFound(_) => "E006",
            IpDistanceError::CacheBackend(_) => "E007",
            IpDistanceError::Provision(_) => "E008",
            IpDistanceError::Config(_) => "E009",
            IpDistanceError::Serialization(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            IpDistanceError::Validation(_) => "Validation Error",
            IpDistanceError::ProviderUnreachable(_) => "Provider Unreachable",
            IpDistanceError::RateLimited(_) => "Provider Rate Limited",
            IpDistanceError::InvalidCredential(_) => "Invalid Provider Credential",
            IpDistanceError::MalformedPayload(_) => "Malformed Provider Payload",
            IpDistanceError::CacheNotFound(_) => "Cache Entry Not Found",
            IpDistanceError::CacheBackend(_) => "Cache Backend Error",
            IpDistanceError::Provision(_) => "Cache Provisioning Error",
            IpDistanceError::Config(_) => "Configuration Error",
            IpDistanceError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            IpDistanceError::Validation(msg) => msg,
            IpDistanceError::ProviderUnreachable(msg) => msg,
            IpDistanceError::RateLimited(msg) => msg,
            IpDistanceError::InvalidCredential(msg) => msg,
            IpDistanceError::MalformedPayload(msg) => msg,
            IpDistanceError::CacheNotFound(msg) => msg,
            IpDistanceError::CacheBackend(msg) => msg,
            IpDistanceError::Provision(msg) => msg,
            IpDistanceError::Config(msg) => msg,
            IpDistanceError::Serialization(msg) => msg,
        }
    }

    /// 是否为 provider 侧的失败（不可由调用方修正）
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            IpDistanceError::ProviderUnreachable(_)
                | IpDistanceError::RateLimited(_)
                | IpDistanceError::InvalidCredential(_)
                | IpDistanceError::MalformedPayload(_)
        )
    }

    /// HTTP 状态码映射：只有输入错误是 400
    pub fn status_code(&self) -> StatusCode {
        match self {
            IpDistanceError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给 HTTP 调用方的文本
    ///
    /// 内部细节（后端地址、provider 原始报错）只进日志，不进响应体。
    pub fn public_message(&self) -> String {
        match self {
            IpDistanceError::Validation(msg) => msg.clone(),
            IpDistanceError::ProviderUnreachable(_) => {
                format!("IP Stack call failed. {}", MOCK_HINT)
            }
            IpDistanceError::RateLimited(_) => format!(
                "IP Stack call failed because it was rate limited. {}",
                MOCK_HINT
            ),
            IpDistanceError::InvalidCredential(_) => format!(
                "IP Stack call failed because the API key is invalid. {}",
                MOCK_HINT
            ),
            IpDistanceError::MalformedPayload(_) => {
                format!("Failed to parse ipstack API response. {}", MOCK_HINT)
            }
            IpDistanceError::CacheNotFound(_) | IpDistanceError::CacheBackend(_) => {
                "Failed to get response from cache".to_string()
            }
            IpDistanceError::Provision(_)
            | IpDistanceError::Config(_)
            | IpDistanceError::Serialization(_) => "Internal Server Error".to_string(),
        }
    }

    /// 格式化为彩色输出（用于启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于日志）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for IpDistanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for IpDistanceError {}

// 便捷的构造函数
impl IpDistanceError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::Validation(msg.into())
    }

    pub fn provider_unreachable<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::ProviderUnreachable(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::RateLimited(msg.into())
    }

    pub fn invalid_credential<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::InvalidCredential(msg.into())
    }

    pub fn malformed_payload<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::MalformedPayload(msg.into())
    }

    pub fn cache_not_found<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::CacheNotFound(msg.into())
    }

    pub fn cache_backend<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::CacheBackend(msg.into())
    }

    pub fn provision<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::Provision(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::Config(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        IpDistanceError::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for IpDistanceError {
    fn from(err: serde_json::Error) -> Self {
        IpDistanceError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for IpDistanceError {
    fn from(err: config::ConfigError) -> Self {
        IpDistanceError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IpDistanceError>;
