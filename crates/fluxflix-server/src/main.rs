#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use fluxflix::{DEMO_TITLES, seed_demo_data};
use server::config::{CliArgs, ServerConfig};
use server::service::{AppState, router};
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let state = AppState::new(config.clone());
    if config.seed_demo_data {
        let seeded = seed_demo_data(state.movies.store().as_ref(), DEMO_TITLES)?;
        tracing::info!("Seeded {} demo movies", seeded.len());
    }
    let app = router(state.clone());

    if config.uds {
        #[cfg(unix)]
        {
            use tokio::net::UnixListener;
            let uds_path = config.server_addr.clone();
            let uds = UnixListener::bind(&uds_path)?;
            log_startup_info(&uds_path, &config);
            let res = axum::serve(uds, app)
                .with_graceful_shutdown(shutdown_signal(state))
                .await;
            // Removed on every normal exit; a panic still leaves it behind.
            let _ = std::fs::remove_file(&uds_path);
            res?;
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!("Unix domain sockets are not supported on this platform");
        }
    } else {
        let tcp_path = config.server_addr.clone();
        let tcp = TcpListener::bind(&tcp_path).await?;
        log_startup_info(&tcp_path, &config);
        axum::serve(tcp, app)
            .with_graceful_shutdown(shutdown_signal(state))
            .await?;
    }

    tracing::info!("Service shut down successfully");
    providers.shutdown();
    Ok(())
}

fn log_startup_info(addr: &str, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting movie service on {} with full config: {:#?}", addr, config);
    } else {
        tracing::info!(
            "Starting movie service on {} with a {} ms event cadence",
            addr,
            config.cadence.as_millis_ceil()
        );
    }
}

async fn shutdown_signal(state: AppState) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    state.shutdown().await;
}
