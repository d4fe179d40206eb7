//! Recut - 按目标字数修订书稿
//!
//! - Domain: revision/ + 纯函数计算
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, persistence, adapters

use std::sync::Arc;

use recut::application::{
    ChapterSourcePort, ContentCondenserPort, RevisionRepositoryPort, RevisionSettings,
};
use recut::config::{load_config, print_config, AppConfig, CondenserProvider};
use recut::infrastructure::adapters::{
    FakeContentCondenser, HttpChapterSource, HttpChapterSourceConfig, HttpCondenserConfig,
    HttpContentCondenser,
};
use recut::infrastructure::http::{AppState, HttpServer, ServerConfig, StateOptions};
use recut::infrastructure::memory::{InMemoryBatchTracker, InMemoryRevisionLocks};
use recut::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteRevisionRepository,
};

/// 启动时仍处于 generating 的提案说明上次进程在生成中退出
const INTERRUPTED_MESSAGE: &str = "generation interrupted";

fn init_logging(config: &AppConfig) {
    let log_filter = format!(
        "{},recut={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_condenser(config: &AppConfig) -> anyhow::Result<Arc<dyn ContentCondenserPort>> {
    let condenser: Arc<dyn ContentCondenserPort> = match config.condenser.provider {
        CondenserProvider::Http => {
            let condenser_config = HttpCondenserConfig::new(&config.condenser.url)
                .with_timeout(config.condenser.timeout_secs)
                .with_retries(config.condenser.max_retries);
            Arc::new(HttpContentCondenser::new(condenser_config)?)
        }
        CondenserProvider::Fake => {
            tracing::warn!("Using fake condenser: chapters are truncated, not condensed");
            Arc::new(FakeContentCondenser::with_defaults())
        }
    };
    Ok(condenser)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_logging(&config);

    tracing::info!("Recut - 书稿字数修订服务");
    print_config(&config);

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig::new(&config.database.path, config.database.max_connections);
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let revision_repo = Arc::new(SqliteRevisionRepository::new(pool.clone()));

    let interrupted = revision_repo
        .fail_in_flight_proposals(INTERRUPTED_MESSAGE)
        .await?;
    if interrupted > 0 {
        tracing::warn!(count = interrupted, "Marked interrupted generations as error");
    }

    // 外部协作方
    let condenser = build_condenser(&config)?;
    let chapter_source: Arc<dyn ChapterSourcePort> = Arc::new(HttpChapterSource::new(
        HttpChapterSourceConfig::new(&config.chapters.url)
            .with_timeout(config.chapters.timeout_secs),
    )?);

    if !condenser.health_check().await {
        tracing::warn!(url = %config.condenser.url, "Condenser health check failed");
    }

    // 内存状态
    let locks = Arc::new(InMemoryRevisionLocks::new());
    let batch_tracker = Arc::new(InMemoryBatchTracker::new());

    let options = StateOptions {
        revision: RevisionSettings {
            max_chapter_reduction: config.revision.max_chapter_reduction_percent / 100.0,
        },
        default_tolerance_percent: config.revision.default_tolerance_percent,
        generation_timeout: config.condenser.generation_timeout(),
    };

    let state = AppState::new(
        revision_repo,
        condenser,
        chapter_source,
        locks,
        batch_tracker,
        options,
    );

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    pool.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}
