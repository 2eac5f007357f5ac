mod auth;
mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use arbiter_common::config::{ExecutionConfig, LanguageTable, DEFAULT_LANGUAGES_PATH};
use arbiter_common::redis::RedisProblemStore;
use arbiter_judge::{client_from_config, SubmissionEvaluator};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub struct AppState {
    pub evaluator: SubmissionEvaluator,
    pub languages: LanguageTable,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new().merge(routes::routes()).with_state(state)
}

fn load_languages() -> anyhow::Result<LanguageTable> {
    let path = PathBuf::from(
        std::env::var("LANGUAGES_CONFIG").unwrap_or_else(|_| DEFAULT_LANGUAGES_PATH.to_string()),
    );

    if !path.exists() {
        warn!("{} not found, enabling built-in language defaults", path.display());
        return Ok(LanguageTable::builtin());
    }

    LanguageTable::load(&path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false)
        .init();

    info!("Arbiter API booting...");

    let config = ExecutionConfig::from_env().context("Invalid execution configuration")?;
    if config.client_id.is_empty() || config.client_secret.is_empty() {
        warn!("EXECUTION_CLIENT_ID / EXECUTION_CLIENT_SECRET not set; the execution service will likely reject requests");
    }

    let languages = load_languages()?;
    info!("Enabled languages: {:?}", languages.enabled_languages());

    // Connect to Redis
    let redis_url = std::env::var("REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let store = RedisProblemStore::connect(&redis_url)
        .await
        .context("Failed to connect to Redis")?;

    info!("Connected to Redis: {}", redis_url);

    info!(
        endpoint = %config.endpoint,
        timeout_ms = config.timeout.as_millis() as u64,
        max_retries = config.max_retries,
        parallelism = config.parallelism,
        "Execution client configured"
    );

    let parallelism = config.parallelism;
    let client = client_from_config(config, languages.clone())?;
    let evaluator = SubmissionEvaluator::new(Arc::new(store), client).with_parallelism(parallelism);

    let state = Arc::new(AppState { evaluator, languages });

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_err() {
                warn!("Failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
            warn!("Received shutdown signal, finishing in-flight submissions...");
        })
        .await
        .context("Server error")?;

    info!("API shutdown complete");
    Ok(())
}
