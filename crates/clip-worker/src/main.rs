//! Video clip worker binary.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use clip_backend::{BackendClient, JobBackend};
use clip_worker::{init_tracing, metrics, HandlerRegistry, PollLoop, VideoClipHandler, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting clip-worker");

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        match metrics::install_exporter(port) {
            Ok(()) => info!("Serving metrics on port {}", port),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    let backend: Arc<dyn JobBackend> = match BackendClient::new(config.backend_config()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create backend client: {}", e);
            std::process::exit(1);
        }
    };

    let video_clip = match VideoClipHandler::from_config(&config) {
        Ok(handler) => handler,
        Err(e) => {
            error!("Failed to create VIDEO_CLIP handler: {}", e);
            std::process::exit(1);
        }
    };

    let registry = HandlerRegistry::new().register(Arc::new(video_clip));
    let poll_loop = PollLoop::new(backend, registry, &config);

    // Setup signal handlers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal, finishing current job");
        let _ = shutdown_tx.send(true);
    });

    poll_loop.run(shutdown_rx).await;

    info!("Worker shutdown complete");
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("Cannot listen for SIGTERM: {}", e);
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
