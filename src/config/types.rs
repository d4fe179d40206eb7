//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 压缩服务配置
    #[serde(default)]
    pub condenser: CondenserConfig,

    /// 章节来源配置
    #[serde(default)]
    pub chapters: ChaptersConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 修订参数
    #[serde(default)]
    pub revision: RevisionConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 压缩服务实现
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CondenserProvider {
    /// 外部 HTTP 服务
    #[default]
    Http,
    /// 本地截断，不调用外部服务
    Fake,
}

/// 压缩服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct CondenserConfig {
    #[serde(default)]
    pub provider: CondenserProvider,

    /// 压缩服务基础 URL
    #[serde(default = "default_condenser_url")]
    pub url: String,

    /// 单次请求超时时间（秒）
    #[serde(default = "default_condenser_timeout")]
    pub timeout_secs: u64,

    /// 网络错误 / 超时的重试次数
    #[serde(default = "default_condenser_retries")]
    pub max_retries: u32,
}

fn default_condenser_url() -> String {
    "http://localhost:8100".to_string()
}

fn default_condenser_timeout() -> u64 {
    120
}

fn default_condenser_retries() -> u32 {
    1
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            provider: CondenserProvider::default(),
            url: default_condenser_url(),
            timeout_secs: default_condenser_timeout(),
            max_retries: default_condenser_retries(),
        }
    }
}

impl CondenserConfig {
    /// 一次生成的总时限：覆盖所有重试，再留一点退避时间
    pub fn generation_timeout(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        Duration::from_secs(self.timeout_secs.saturating_mul(attempts) + attempts)
    }
}

/// 章节来源配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChaptersConfig {
    /// 书籍服务基础 URL
    #[serde(default = "default_chapters_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_chapters_timeout")]
    pub timeout_secs: u64,
}

fn default_chapters_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_chapters_timeout() -> u64 {
    30
}

impl Default for ChaptersConfig {
    fn default() -> Self {
        Self {
            url: default_chapters_url(),
            timeout_secs: default_chapters_timeout(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/recut.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// 修订参数
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionConfig {
    /// 请求未指定容差时的默认值（百分比）
    #[serde(default = "default_tolerance_percent")]
    pub default_tolerance_percent: f64,

    /// 单章最多删减的百分比
    #[serde(default = "default_max_chapter_reduction")]
    pub max_chapter_reduction_percent: f64,
}

fn default_tolerance_percent() -> f64 {
    5.0
}

fn default_max_chapter_reduction() -> f64 {
    50.0
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            default_tolerance_percent: default_tolerance_percent(),
            max_chapter_reduction_percent: default_max_chapter_reduction(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
