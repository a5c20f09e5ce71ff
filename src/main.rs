use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use telemon::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!("{} starting", version::banner());
    let app_config = config::AppConfig::load()?;

    let aggregator = Arc::new(aggregator::Aggregator::new(
        app_config.window.history,
        app_config.window.default_interval_secs,
    ));
    let pipeline =
        pipeline::Pipeline::with_capacity(aggregator, app_config.publishing.broadcast_capacity);

    let ws_event_connections = Arc::new(AtomicUsize::new(0));
    let (views_tx, _) = tokio::sync::watch::channel(None);
    let (refresher_shutdown_tx, refresher_shutdown_rx) = tokio::sync::oneshot::channel();
    let refresher_handle = refresher::spawn(
        refresher::RefresherDeps {
            pipeline: pipeline.clone(),
            views: views_tx,
            ws_event_connections: ws_event_connections.clone(),
            shutdown_rx: refresher_shutdown_rx,
        },
        refresher::RefresherConfig {
            history: app_config.window.history,
            min_refresh_ms: app_config.refresh.min_refresh_ms,
            stats_log_interval_secs: app_config.refresh.stats_log_interval_secs,
        },
    );

    let telemetry =
        listener::TelemetryListener::new(app_config.listener.clone(), pipeline.clone());
    let (listener_shutdown_tx, listener_handle) = listener::spawn(telemetry);

    #[cfg(unix)]
    spawn_reset_on_sighup(pipeline.clone());

    let app = routes::app(pipeline, ws_event_connections, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let http_listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP API on http://{}", addr);

    tokio::select! {
        result = axum::serve(http_listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }

    let _ = listener_shutdown_tx.send(());
    let _ = refresher_shutdown_tx.send(());
    let _ = listener_handle.await;
    let _ = refresher_handle.await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// SIGHUP clears the rolling window, standing in for a UI reset button.
#[cfg(unix)]
fn spawn_reset_on_sighup(pipeline: pipeline::Pipeline) {
    use tokio::signal::unix::{SignalKind, signal};
    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP handler unavailable; reset only via HTTP");
            return;
        }
    };
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            pipeline.reset();
        }
    });
}
