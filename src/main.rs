// src/main.rs

use std::{sync::Arc, time::Duration};

use discuss_backend::comments::CommentService;
use discuss_backend::config::{Config, SchemaMode};
use discuss_backend::routes;
use discuss_backend::state::AppState;
use discuss_backend::store::{self, CommentStore, MemoryCommentStore, SchemaShape};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env included)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let (comment_store, pool) = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await;
            let store = match open_comment_store(&pool, &config).await {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("Failed to open comment store: {}", e);
                    std::process::exit(1);
                }
            };
            (store, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; comments are kept in memory only");
            let store: Arc<dyn CommentStore> = Arc::new(MemoryCommentStore::new());
            (store, None)
        }
    };

    let state = AppState {
        comments: Arc::new(CommentService::new(comment_store, config.max_comment_depth)),
        config: config.clone(),
    };
    tracing::info!(max_comment_depth = config.max_comment_depth, "comment service ready");

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.http_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.http_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database pool closed.");
    }
}

/// Initialize Database Pool with Retry
async fn connect_with_retry(url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    std::process::exit(1);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

/// Applies migrations if asked to, then picks the adapter for the table layout.
async fn open_comment_store(
    pool: &PgPool,
    config: &Config,
) -> Result<Arc<dyn CommentStore>, Box<dyn std::error::Error>> {
    if config.run_migrations {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(pool).await?;
        tracing::info!("Migrations applied successfully.");
    }

    let shape = match config.comment_schema {
        SchemaMode::Fixed(shape) => {
            tracing::info!("Comment schema fixed by configuration: {}", shape);
            if let Some(live) = store::probe_schema(pool).await?.filter(|live| *live != shape) {
                tracing::warn!("Live comments table is {}, not the configured {}", live, shape);
            }
            shape
        }
        SchemaMode::Auto => match store::probe_schema(pool).await? {
            Some(shape) => {
                tracing::info!("Comment schema detected: {}", shape);
                shape
            }
            None => {
                tracing::warn!("comments table not found; reads will be empty until it exists");
                SchemaShape::CURRENT
            }
        },
    };

    Ok(store::build_store(pool.clone(), shape))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
