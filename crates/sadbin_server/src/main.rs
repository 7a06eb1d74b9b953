//! Paste server entrypoint.

use sadbin_core::constants::{DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT, DEFAULT_TTL_SECONDS};
use sadbin_server::{config::Config, maintenance, serve_router, AppState};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sadbin=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if parse_cli_flags(&args)?.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let store = sadbin_core::open_store(&config)?;
    let state = AppState::new(config.clone(), store);

    if config.allow_public_access {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = sadbin_server::resolve_bind_address(&config);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("sadbin running at http://{}", actual_addr);

    let purge = maintenance::spawn_purge_task(
        state.service.clone(),
        Duration::from_secs(config.purge_interval_secs),
    );
    let serve_result = serve_router(listener, state, shutdown_signal()).await;
    purge.abort();
    tracing::info!("sadbin stopped");

    serve_result?;
    Ok(())
}

fn print_help() {
    println!("sadbin paste server\n");
    println!("Usage: sadbin [OPTIONS]\n");
    println!("Options:");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           redb file path (default: ~/.cache/sadbin/pastes.redb)");
    println!("  STORE             Backing store: redb or memory (default: redb)");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin and non-loopback binds");
    println!(
        "  MAX_PASTE_SIZE    Maximum paste size in bytes (default: {})",
        DEFAULT_MAX_PASTE_SIZE
    );
    println!(
        "  DEFAULT_TTL       Lifetime in seconds when none is chosen, -1 for never (default: {})",
        DEFAULT_TTL_SECONDS
    );
    println!("  MAX_TITLE_LENGTH  Maximum title length in characters (default: 256)");
    println!("  MAX_AUTHOR_LENGTH Maximum author length in characters (default: 256)");
    println!("  PURGE_INTERVAL    Seconds between expired paste sweeps (default: 60)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
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
    tracing::info!("Shutdown requested");
}
