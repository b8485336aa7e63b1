/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Running event hub with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bbb_hub::config::ServerConfig;
use bbb_hub::{AppState, HubConfig};

#[derive(Parser, Debug)]
#[command(name = "bbb-hub", version, about = "BigBlueButton API event hub")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "listen", value_name = "ADDR")]
    listen: Option<SocketAddr>,
    /// Overrides `log_level` from the config file
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
    #[arg(long = "server-url", value_name = "URL", requires = "server_secret")]
    server_url: Option<String>,
    #[arg(long = "server-secret", value_name = "SECRET", requires = "server_url")]
    server_secret: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut HubConfig) {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let (Some(url), Some(secret)) = (&self.server_url, &self.server_secret) {
            config.server = Some(ServerConfig {
                url: url.clone(),
                secret: secret.clone(),
            });
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config = match &args.config_path {
        Some(path) => HubConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => HubConfig::default(),
    };
    args.apply(&mut config);
    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen_addr,
        default_server = config.server.is_some(),
        outbound_buffer = config.outbound_buffer,
        "starting bbb-hub"
    );

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("bind {}", config.listen_addr))?;
    let state = AppState::from_config(config, shutdown).context("build hub state")?;

    bbb_hub::server::serve(listener, state)
        .await
        .context("serve hub")?;
    info!("shutdown complete");

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
