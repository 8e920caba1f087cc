//! Standalone receiver hosting the webhook trigger.
//!
//! On start the trigger is activated against the configured public URL; the
//! subscription is deleted again on shutdown.

pub mod routes_webhook;

use crate::config::{self, Config};
use crate::state::NodeStaticData;
use crate::trigger::{CloudConvertTrigger, HookContext, WebhookLifecycle};
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use routes_webhook::webhook_routes;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared state of the receiver.
#[derive(Clone)]
pub struct AppContext {
    pub trigger: Arc<CloudConvertTrigger>,
    pub static_data: Arc<NodeStaticData>,
    /// Public URL the subscription points to
    pub webhook_url: Arc<str>,
    /// Where downloaded attachments are written
    pub output_dir: PathBuf,
}

impl AppContext {
    pub fn hook_context(&self) -> HookContext<'_> {
        HookContext::new(&self.webhook_url, self.static_data.as_ref())
    }
}

/// Create the router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Activate the trigger, serve deliveries until shutdown, then deactivate.
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let public_url = config
        .server
        .public_url
        .clone()
        .context("server.public_url is required to receive webhooks")?;

    let client = config::build_client(&config);
    let ctx = AppContext {
        trigger: Arc::new(CloudConvertTrigger::new(
            client,
            config.trigger.to_settings(),
        )),
        static_data: Arc::new(NodeStaticData::persistent(config.server.state_file.clone())),
        webhook_url: Arc::from(public_url.as_str()),
        output_dir: config.server.output_dir.clone(),
    };

    if !ctx.trigger.activate(&ctx.hook_context()).await? {
        anyhow::bail!("CloudConvert did not accept the webhook subscription");
    }
    tracing::info!("Webhook trigger active for {}", public_url);

    let app = create_router(ctx.clone());

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("Shutting down...");
    match ctx.trigger.delete(&ctx.hook_context()).await {
        Ok(true) => tracing::info!("Webhook subscription removed"),
        Ok(false) => tracing::warn!("Webhook subscription could not be removed upstream"),
        Err(e) => tracing::error!("Failed to clear webhook state: {}", e),
    }

    server_result?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
