//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod revision_repo;

pub use database::*;
pub use revision_repo::*;
