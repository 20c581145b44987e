use anyhow::Result;
use site_exporter::*;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
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

    tracing::info!(service = version::NAME, version = version::VERSION, "starting exporter");
    let app_config = config::AppConfig::load()?;

    let credential = models::Credential::new(
        &app_config.inventory.username,
        &app_config.inventory.password,
    )?;
    let client = Arc::new(inventory_repo::InventoryClient::new(
        &app_config.inventory.url,
        credential,
        app_config.inventory.request_timeout(),
    )?);
    let push_sender = sender::PushSender::new(
        &app_config.ingestion.url,
        app_config.ingestion.request_timeout(),
    )?;
    let buffer = Arc::new(buffer::SnapshotBuffer::new());
    let stats = Arc::new(stats::ExporterStats::new()?);
    let cancel = CancellationToken::new();

    let scraper_handle = scraper::spawn(
        scraper::ScraperDeps {
            client,
            buffer: buffer.clone(),
            stats: stats.clone(),
            cancel: cancel.clone(),
        },
        scraper::ScraperConfig {
            interval: app_config.inventory.scrape_interval(),
            concurrency: app_config.inventory.scrape_concurrency,
            mode: app_config.inventory.scrape_mode,
            stats_log_interval: std::time::Duration::from_secs(
                app_config.monitoring.stats_log_interval_secs,
            ),
        },
    );
    let sender_handle = sender::spawn(
        sender::SenderDeps {
            sender: push_sender,
            buffer: buffer.clone(),
            stats: stats.clone(),
            cancel: cancel.clone(),
        },
        sender::SenderConfig {
            interval: app_config.ingestion.push_interval(),
        },
    );

    let app = routes::app(buffer, stats);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_cancel.cancelled_owned())
            .await
    });

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let started = Instant::now();
    cancel.cancel();

    tracing::info!("waiting for scraper and sender to stop");
    if let Err(e) = scraper_handle.await {
        tracing::warn!(error = %e, "scraper task ended abnormally");
    }
    if let Err(e) = sender_handle.await {
        tracing::warn!(error = %e, "sender task ended abnormally");
    }
    if let Err(e) = server.await? {
        tracing::warn!(error = %e, "http server stopped with error");
    }
    tracing::info!(
        "successfully stopped exporter after: {:.3} seconds",
        started.elapsed().as_secs_f64()
    );
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
