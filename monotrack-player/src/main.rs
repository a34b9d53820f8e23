//! Monotrack player - Main entry point
//!
//! Opens the audio device, starts the player service and serves the HTTP/SSE
//! control surface until Ctrl+C or SIGTERM.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use monotrack_common::human_time::format_progress;
use monotrack_common::PlaybackMode;
use monotrack_player::api::{self, AppState};
use monotrack_player::audio::CpalEngine;
use monotrack_player::config::{LoggingConfig, PlayerConfig};
use monotrack_player::playback::{PlayerSnapshot, Resource};
use monotrack_player::PlayerService;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for monotrack-player
#[derive(Parser, Debug)]
#[command(name = "monotrack-player")]
#[command(about = "Single-track audio player with an HTTP control surface")]
#[command(version)]
struct Args {
    /// Config file (overrides MONOTRACK_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "MONOTRACK_PORT")]
    port: Option<u16>,

    /// Output device name (overrides [audio] device)
    #[arg(short, long, env = "MONOTRACK_DEVICE")]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Start playing as soon as the initial resource has loaded
    #[arg(long, requires = "resource")]
    autoplay: bool,

    /// Resource to load at startup (URL or file path)
    resource: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The [logging] section is not known yet: report config resolution
    // through a bootstrap subscriber until the real one is installed
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("monotrack_player=info,monotrack_common=info")),
        )
        .finish();
    let mut config =
        tracing::subscriber::with_default(bootstrap, || PlayerConfig::load(args.config.as_deref()))
            .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.device.is_some() {
        config.audio.device = args.device.clone();
    }

    init_logging(&config.logging)?;
    info!(
        "Starting monotrack-player {} (git {}, {} build {})",
        env!("CARGO_PKG_VERSION"),
        env!("MONOTRACK_GIT_HASH"),
        env!("MONOTRACK_BUILD_PROFILE"),
        env!("MONOTRACK_BUILD_TIMESTAMP")
    );

    if args.list_devices {
        for name in CpalEngine::list_devices().context("Failed to enumerate audio devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let (player, service) =
        PlayerService::start_default(&config).context("Failed to open audio output")?;
    tokio::spawn(log_progress(player.watch()));

    if let Some(resource) = args.resource {
        player
            .load(Resource::parse(&resource))
            .await
            .context("Failed to queue initial load")?;
        if args.autoplay {
            let player = player.clone();
            tokio::spawn(async move {
                let mut snapshots = player.watch();
                let loaded = snapshots
                    .wait_for(|s| s.mode == PlaybackMode::Ready || s.error.is_some())
                    .await
                    .map(|s| s.mode == PlaybackMode::Ready)
                    .unwrap_or(false);
                if loaded {
                    if let Err(e) = player.play().await {
                        error!("Autoplay failed: {}", e);
                    }
                }
            });
        }
    }

    let app = api::create_router(AppState {
        player: player.clone(),
        port: config.server.port,
    });

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Release the device before exiting
    if player.shutdown().await.is_ok() {
        service.await.context("Player service panicked")?;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over `[logging] level`. A bare level applies to the
/// monotrack crates; anything else is used as a filter directive.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        let level = logging.level.trim();
        let directive = if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!(
                "monotrack_player={level},monotrack_common={level},tower_http={level}",
                level = level
            )
        };
        EnvFilter::try_new(directive)
    })
    .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.init(),
    }
    Ok(())
}

/// Log mode changes at info and whole-second progress at debug
async fn log_progress(mut snapshots: watch::Receiver<PlayerSnapshot>) {
    let mut last_mode = snapshots.borrow().mode;
    let mut last_second = -1i64;

    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let progress = format_progress(snapshot.position_seconds, snapshot.duration_seconds);

        if snapshot.mode != last_mode {
            info!("{} -> {} [{}]", last_mode, snapshot.mode, progress);
            last_mode = snapshot.mode;
        } else if snapshot.mode.is_playing() {
            let second = snapshot.position_seconds.floor() as i64;
            if second != last_second {
                debug!("Playing [{}]", progress);
                last_second = second;
            }
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
