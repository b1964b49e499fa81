//! 运行配置
//! 全部来自 COVER_ 前缀的环境变量，数据库地址和签名密钥用 Secret 包装

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// json, pretty 或 compact
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 密钥，与单点登录服务共享（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// 是否信任 X-Forwarded-For 头
    pub trust_proxy: bool,
    /// IP 白名单（可选）
    pub allowed_ips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageConfig {
    /// 年保费系数（保额 × 系数 = 年保费）
    pub premium_factor: f64,
    /// 已批准物品允许直接删除的宽限期（小时）
    pub item_delete_grace_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub coverage: CoverageConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("security.access_token_exp_secs", 900)?
            .set_default("security.trust_proxy", true)?
            .set_default("coverage.premium_factor", 0.02)?
            .set_default("coverage.item_delete_grace_hours", 72)?
            // COVER_SECURITY__ALLOWED_IPS=10.0.0.1,10.0.0.2
            .add_source(
                Environment::with_prefix("COVER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.allowed_ips")
                    .try_parsing(true),
            );

        let config: AppConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 逐节校验，返回第一条错误
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.database.validate()?;
        self.security.validate()?;
        self.coverage.validate()
    }
}

fn ensure(ok: bool, message: impl Into<String>) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Message(message.into()))
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        // 端口 0 交给系统分配，测试里会用到
        let port = self
            .addr
            .rsplit_once(':')
            .and_then(|(_, p)| p.parse::<u16>().ok())
            .ok_or_else(|| ConfigError::Message(format!("Invalid server addr: {}", self.addr)))?;
        ensure(port == 0 || port >= 1024, "Server port should be >= 1024")
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        ensure(
            matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error"),
            format!("Invalid log level: {}", self.level),
        )?;
        ensure(
            matches!(self.format.to_lowercase().as_str(), "json" | "pretty" | "compact"),
            format!("Invalid log format: {}. Must be json, pretty or compact", self.format),
        )
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.max_connections > 0, "max_connections must be positive")?;
        ensure(
            self.max_connections >= self.min_connections,
            "max_connections must be >= min_connections",
        )
    }
}

impl SecurityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.jwt_secret.expose_secret().len() >= 32,
            "JWT secret must be at least 32 characters long",
        )?;
        ensure(
            (60..=86_400).contains(&self.access_token_exp_secs),
            "access_token_exp_secs must be between 60 and 86400",
        )
    }
}

impl CoverageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.premium_factor > 0.0 && self.premium_factor < 1.0,
            "premium_factor must be between 0 and 1 (exclusive)",
        )?;
        ensure(
            self.item_delete_grace_hours >= 0,
            "item_delete_grace_hours must not be negative",
        )
    }
}
