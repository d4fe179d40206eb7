//! Recut - 按目标字数修订书稿
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - tolerance / priority / apportion: 纯函数（容差区间、优先级评分、删减分配）
//! - revision: 修订聚合与章节提案状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repository, ContentCondenser, ChapterSource, 锁, 批量进度）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: POST + JSON API
//! - Memory: 修订锁、批量进度、本地章节来源
//! - Persistence: SQLite 存储
//! - Adapters: 压缩服务客户端、章节来源客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{load_config, AppConfig};
