// # rosdns-webhook - external-dns webhook for RouterOS
//
// The daemon is a thin integration layer:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the RouterOS store into the sync engine
// 4. Serving the webhook and health listeners until SIGTERM/SIGINT
//
// All DNS logic lives in rosdns-core.
//
// ## Configuration
//
// Every flag falls back to an environment variable:
//
// ### Listeners
// - `--bind-addr` / `WEBHOOK_BIND_ADDR`: webhook listener (default `localhost:8888`)
// - `--health-addr` / `WEBHOOK_METRICS_BIND_ADDR`: health listener (default `localhost:8080`)
//
// ### Router
// - `--router-url` / `WEBHOOK_ROUTER_URL`: router base URL (default `http://192.168.88.1`)
// - `--router-username` / `WEBHOOK_ROUTER_USERNAME`: REST API user (default `admin`)
// - `--router-password` / `WEBHOOK_ROUTER_PASSWORD`: REST API password
// - `--timeout-secs` / `WEBHOOK_ROUTER_TIMEOUT_SECS`: request timeout, 1-300 (default 30)
// - `--dry-run` / `WEBHOOK_DRY_RUN`: log mutations instead of sending them
//
// ### Logging
// - `--log-level` / `WEBHOOK_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `--debug` / `WEBHOOK_DEBUG`: shorthand for `--log-level debug`
//
// ## Example
//
// ```bash
// export WEBHOOK_ROUTER_URL=https://192.168.88.1
// export WEBHOOK_ROUTER_USERNAME=external-dns
// export WEBHOOK_ROUTER_PASSWORD=your_password
//
// rosdns-webhook --bind-addr 0.0.0.0:8888
// ```

mod server;

use anyhow::{Context, Result};
use clap::Parser;
use rosdns_core::config::{
    DEFAULT_BIND_ADDR, DEFAULT_HEALTH_ADDR, DEFAULT_LOG_LEVEL, DEFAULT_ROUTER_URL,
    DEFAULT_ROUTER_USERNAME, DEFAULT_TIMEOUT_SECS, ServerConfig, StoreConfig, WebhookConfig,
};
use rosdns_core::SyncEngine;
use rosdns_store_routeros::RouterOsStore;
use secrecy::SecretString;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Time allowed for in-flight requests after a shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WebhookExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WebhookExitCode> for ExitCode {
    fn from(code: WebhookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "rosdns-webhook", version, about = "external-dns webhook for the RouterOS static DNS table")]
struct Args {
    /// Webhook listen address
    #[arg(long, env = "WEBHOOK_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Health listen address
    #[arg(long, env = "WEBHOOK_METRICS_BIND_ADDR", default_value = DEFAULT_HEALTH_ADDR)]
    health_addr: String,

    /// Router base URL
    #[arg(long, env = "WEBHOOK_ROUTER_URL", default_value = DEFAULT_ROUTER_URL)]
    router_url: String,

    /// REST API user
    #[arg(long, env = "WEBHOOK_ROUTER_USERNAME", default_value = DEFAULT_ROUTER_USERNAME)]
    router_username: String,

    /// REST API password
    #[arg(long, env = "WEBHOOK_ROUTER_PASSWORD", default_value = "", hide_env_values = true)]
    router_password: String,

    /// Router request timeout in seconds
    #[arg(long, env = "WEBHOOK_ROUTER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Log mutations instead of sending them
    #[arg(long, env = "WEBHOOK_DRY_RUN")]
    dry_run: bool,

    /// Enable debug logging
    #[arg(long, env = "WEBHOOK_DEBUG")]
    debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WEBHOOK_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

impl From<Args> for WebhookConfig {
    fn from(args: Args) -> Self {
        Self {
            server: ServerConfig {
                bind_addr: args.bind_addr,
                health_addr: args.health_addr,
            },
            store: StoreConfig {
                base_url: args.router_url,
                username: args.router_username,
                password: SecretString::from(args.router_password),
                timeout_secs: args.timeout_secs,
                dry_run: args.dry_run,
            },
            log_level: args.log_level,
            debug: args.debug,
        }
    }
}

fn main() -> ExitCode {
    // Flags and environment
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return WebhookExitCode::CleanShutdown.into();
        }
        Err(e) => {
            let _ = e.print();
            return WebhookExitCode::ConfigError.into();
        }
    };
    let config = WebhookConfig::from(args);

    // Initialize tracing before validation so its warnings are visible
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.max_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    info!("Starting rosdns-webhook {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Router {} as user {}{}",
        config.store.base_url,
        config.store.username,
        if config.store.dry_run { " [DRY-RUN]" } else { "" }
    );

    let store = match RouterOsStore::new(&config.store) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create RouterOS store: {}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebhookExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, store).await {
            error!("Daemon error: {:#}", e);
            WebhookExitCode::RuntimeError
        } else {
            WebhookExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run both listeners until a shutdown signal arrives
async fn run_daemon(config: WebhookConfig, store: RouterOsStore) -> Result<()> {
    let engine = SyncEngine::new(Arc::new(store));

    let webhook_listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind webhook listener on {}", config.server.bind_addr))?;
    let health_listener = TcpListener::bind(&config.server.health_addr)
        .await
        .with_context(|| format!("Failed to bind health listener on {}", config.server.health_addr))?;

    info!("Webhook listening on {}", config.server.bind_addr);
    info!("Health checks listening on {}", config.server.health_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut webhook = tokio::spawn(serve(webhook_listener, server::router(engine), shutdown_rx.clone()));
    let mut health = tokio::spawn(serve(health_listener, server::health_router(), shutdown_rx));

    // A listener that stops before a signal arrives is a runtime error
    tokio::select! {
        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
        }
        result = &mut webhook => return listener_stopped("webhook", result),
        result = &mut health => return listener_stopped("health", result),
    }

    info!("Shutting down, draining in-flight requests");
    let _ = shutdown_tx.send(());

    let (webhook_result, health_result) =
        tokio::time::timeout(SHUTDOWN_TIMEOUT, async { tokio::join!(webhook, health) })
            .await
            .map_err(|_| anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT))?;
    webhook_result.context("webhook listener panicked")??;
    health_result.context("health listener panicked")??;

    info!("Shutdown complete");
    Ok(())
}

/// Serve `app` until the shutdown channel fires
async fn serve(
    listener: TcpListener,
    app: axum::Router,
    mut shutdown: watch::Receiver<()>,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
}

fn listener_stopped(name: &str, result: Result<std::io::Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => anyhow::bail!("{} listener stopped unexpectedly", name),
        Ok(Err(e)) => Err(anyhow::Error::new(e).context(format!("{} listener failed", name))),
        Err(e) => Err(anyhow::Error::new(e).context(format!("{} listener panicked", name))),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
