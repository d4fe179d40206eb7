//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CondenserProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `RECUT_SERVER__PORT=8080`
/// - `RECUT_CONDENSER__PROVIDER=fake`
/// - `RECUT_CONDENSER__URL=http://condenser:8100`
/// - `RECUT_CHAPTERS__URL=http://books:3000`
/// - `RECUT_DATABASE__PATH=/data/recut.db`
/// - `RECUT_REVISION__DEFAULT_TOLERANCE_PERCENT=3`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索工作目录下的 config.toml / config.local.toml
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("condenser.provider", "http")?
        .set_default("condenser.url", "http://localhost:8100")?
        .set_default("condenser.timeout_secs", 120)?
        .set_default("condenser.max_retries", 1)?
        .set_default("chapters.url", "http://localhost:3000")?
        .set_default("chapters.timeout_secs", 30)?
        .set_default("database.path", "data/recut.db")?
        .set_default("database.max_connections", 5)?
        .set_default("revision.default_tolerance_percent", 5.0)?
        .set_default("revision.max_chapter_reduction_percent", 50.0)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量: RECUT_ 前缀，__ 分隔层级
    builder = builder.add_source(
        Environment::with_prefix("RECUT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // fake 不需要外部服务
    if config.condenser.provider == CondenserProvider::Http && config.condenser.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Condenser URL cannot be empty".to_string(),
        ));
    }

    if config.condenser.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Condenser timeout cannot be 0".to_string(),
        ));
    }

    if config.chapters.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Chapters URL cannot be empty".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    let tolerance = config.revision.default_tolerance_percent;
    if !(0.0..100.0).contains(&tolerance) {
        return Err(ConfigError::ValidationError(format!(
            "Default tolerance must be in [0, 100), got {}",
            tolerance
        )));
    }

    let reduction = config.revision.max_chapter_reduction_percent;
    if !(reduction > 0.0 && reduction <= 100.0) {
        return Err(ConfigError::ValidationError(format!(
            "Max chapter reduction must be in (0, 100], got {}",
            reduction
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Condenser: {:?} ({})", config.condenser.provider, config.condenser.url);
    tracing::info!(
        "Condenser Timeout: {}s x {} attempts",
        config.condenser.timeout_secs,
        config.condenser.max_retries + 1
    );
    tracing::info!("Chapters URL: {}", config.chapters.url);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!(
        "Default Tolerance: {}%",
        config.revision.default_tolerance_percent
    );
    tracing::info!(
        "Max Chapter Reduction: {}%",
        config.revision.max_chapter_reduction_percent
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
