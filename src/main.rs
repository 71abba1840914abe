//! Motion Sentry daemon.
//!
//! Loads the configuration, starts the capture loop, and serves the
//! HTTP control surface until interrupted.

use clap::Parser;
use motion_sentry::control::{CameraFactory, ControlServer, ControlServerConfig, RunController};
use motion_sentry::metrics::PipelineMetrics;
use motion_sentry::notify::{HttpNotifier, NoopNotifier, Notifier};
use motion_sentry::FileConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Default notifier timeout when the config leaves it unset.
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "motion-sentry", version, about = "Camera motion detection daemon")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "conf.toml")]
    config: PathBuf,

    /// Override the control server port from the configuration.
    #[arg(long)]
    port: Option<u16>,

    /// Do not start the capture loop at boot; wait for the control API.
    #[arg(long)]
    no_autostart: bool,
}

#[cfg(feature = "camera")]
fn camera_factory() -> CameraFactory {
    use motion_sentry::capture::DeviceCamera;
    Box::new(|| Box::new(DeviceCamera::new()))
}

#[cfg(not(feature = "camera"))]
fn camera_factory() -> CameraFactory {
    use motion_sentry::capture::MockCamera;
    Box::new(|| Box::new(MockCamera::new().with_moving_target().with_pacing()))
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Motion Sentry v{}", motion_sentry::VERSION);

    let config = match FileConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration ({}): {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    let metrics = match PipelineMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };

    let notifier: Arc<dyn Notifier> = if config.notify.is_disabled() {
        info!("motion reports disabled (no endpoint configured)");
        Arc::new(NoopNotifier)
    } else {
        let timeout = Duration::from_secs(
            config
                .notify
                .timeout_secs
                .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS),
        );
        info!(endpoint = %config.notify.endpoint, "motion reports enabled");
        Arc::new(HttpNotifier::new(config.notify.endpoint.clone(), timeout))
    };

    if cfg!(not(feature = "camera")) {
        warn!("built without the `camera` feature; using the synthetic scene camera");
    }

    let port = cli.port.unwrap_or(config.control.port);
    let controller = Arc::new(RunController::new(
        config,
        notifier,
        Arc::clone(&metrics),
        camera_factory(),
    ));

    if !cli.no_autostart {
        controller.start();
    }

    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || shutdown.notify_one()) {
            warn!(error = %e, "failed to install signal handler");
        }
    }

    let server = ControlServer::new(
        ControlServerConfig::with_port(port),
        Arc::clone(&controller),
        metrics,
    );
    if let Err(e) = server.run(shutdown).await {
        eprintln!("Control server failed: {}", e);
        controller.stop();
        std::process::exit(1);
    }

    controller.stop();
    info!("shut down cleanly");
}
