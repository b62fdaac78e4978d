use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tinytrace_api::shutdown_channel;
use tokio::net::TcpListener;

use crate::app::{AppState, create_app, start_dispatcher, start_monitor};
use crate::configs::Settings;
use crate::services::{AlertLog, MonitorPublisher};

pub mod app;
pub mod configs;
pub mod errors;
pub mod handles;
pub mod services;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let (trigger, shutdown) = shutdown_channel();

    let publisher = MonitorPublisher::new(settings.monitor.window_size, settings.monitor.threshold);
    let reader = publisher.reader();

    let scan_task = start_monitor(settings, publisher, shutdown.clone()).await;
    let (dispatch, dispatch_task) = match start_dispatcher(settings, shutdown.clone()) {
        Some((handle, task)) => (Some(handle), Some(task)),
        None => (None, None),
    };

    let app = create_app(AppState {
        reader,
        alert_log: AlertLog::new(),
        dispatch,
    });

    let ip_addr = settings.server.host.parse::<IpAddr>()?;
    let address = SocketAddr::from((ip_addr, settings.server.port));
    let listener = TcpListener::bind(&address).await?;

    tracing::info!("listening on {:?}", address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await;

    trigger.trigger();

    if let Some(task) = scan_task {
        match task.await {
            Ok(summary) => tracing::info!(?summary, "scan loop finished"),
            Err(e) => tracing::error!("scan loop panicked: {}", e),
        }
    }
    if let Some(task) = dispatch_task {
        match task.await {
            Ok(outcomes) => tracing::info!("{} confirmation workers finished", outcomes.len()),
            Err(e) => tracing::error!("confirmation dispatcher panicked: {}", e),
        }
    }

    Ok(served?)
}
