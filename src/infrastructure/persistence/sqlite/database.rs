//! SQLite Database - 数据库连接和迁移

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库连接串
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/recut.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>, max_connections: u32) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections,
        }
    }

    /// 内存数据库只能用单连接，否则每个连接各自一份库
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // 启用 WAL 模式，允许并发读写
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!(
        url = %config.database_url,
        max_connections = config.max_connections,
        "SQLite pool created with WAL mode and busy_timeout=5000ms"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 创建 revisions 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS revisions (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            original_word_count INTEGER NOT NULL,
            current_word_count INTEGER NOT NULL,
            target_word_count INTEGER NOT NULL,
            tolerance_percent REAL NOT NULL,
            words_to_cut INTEGER NOT NULL,
            chapters_total INTEGER NOT NULL,
            chapters_reviewed INTEGER NOT NULL DEFAULT 0,
            words_cut_so_far INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            closed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 chapter_proposals 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapter_proposals (
            id TEXT PRIMARY KEY,
            revision_id TEXT NOT NULL,
            chapter_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            title TEXT,
            original_content TEXT NOT NULL,
            original_word_count INTEGER NOT NULL,
            target_word_count INTEGER NOT NULL,
            priority_score INTEGER NOT NULL DEFAULT 0,
            veb_issues TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            condensed_content TEXT,
            condensed_word_count INTEGER,
            actual_reduction INTEGER,
            cuts_explanation TEXT NOT NULL DEFAULT '[]',
            preserved_elements TEXT NOT NULL DEFAULT '[]',
            error_message TEXT,
            reviewer_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (revision_id) REFERENCES revisions(id) ON DELETE CASCADE,
            UNIQUE (revision_id, chapter_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 每本书最多一个 active 修订
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_revisions_active_book
        ON revisions(book_id) WHERE status = 'active'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_revisions_book_id
        ON revisions(book_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chapter_proposals_revision_id
        ON chapter_proposals(revision_id, position)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chapter_proposals_status
        ON chapter_proposals(status)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}
