mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use olmgate_core::SyncConfigStore;
use olmgate_olmed::{OlmedAuthClient, TokenManager, TokenStore};
use olmgate_scheduler::{run_scheduler_loop, JobExecutor, JobRegistry};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = olmgate_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let token_store = Arc::new(TokenStore::new());
    let auth_client = OlmedAuthClient::new(
        &config.olmed_base_url,
        &config.olmed_username,
        &config.olmed_password,
        config.http_timeout_secs,
    )?
    .with_retry_policy(config.auth_max_retries, config.auth_retry_base_ms);
    let tokens = Arc::new(TokenManager::new(
        token_store,
        auth_client,
        config.token_refresh_margin_secs,
    ));

    let registry = Arc::new(JobRegistry::new());
    let executor = Arc::new(JobExecutor::new(
        Arc::clone(&tokens),
        config.http_timeout_secs,
    )?);

    let sync_stores = Arc::new(vec![
        SyncConfigStore::new(&config.product_sync_path),
        SyncConfigStore::new(&config.order_sync_path),
    ]);

    match olmgate_scheduler::reload_registry(&registry, sync_stores.as_slice()) {
        Ok(summary) => tracing::info!(
            upserted = summary.upserted,
            removed = summary.removed,
            rejected = summary.rejected,
            "sync jobs loaded"
        ),
        Err(e) => tracing::warn!(
            error = %e,
            "failed to load sync job configurations; starting with an empty registry"
        ),
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler_handle = tokio::spawn(run_scheduler_loop(
        Arc::clone(&registry),
        Arc::clone(&executor),
        Duration::from_secs(config.scheduler_tick_secs),
        shutdown_rx,
    ));

    let auth = AuthState::from_env(matches!(config.env, olmgate_core::Environment::Development))?;
    let app = build_app(
        AppState {
            registry,
            executor,
            tokens,
            sync_stores,
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    scheduler_handle.await.ok();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
