mod bootstrap;
mod health;
mod ingress;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use kudos_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use kudos_slack::{event_channel, EventLoop, LoopExit, SignatureVerifier};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "kudos-server",
    about = "Slack kudos bot",
    long_about = "Receives Slack Events API callbacks, records kudos in SQLite and answers stats and leaderboard queries.",
    after_help = "Examples:\n  kudos-server --config config/kudos.toml\n  kudos-server --log-level debug"
)]
struct Cli {
    #[arg(long, help = "Path to a kudos.toml file (must exist when given)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Override the configured log level")]
    log_level: Option<String>,
    #[arg(long, help = "Override the configured database URL")]
    database_url: Option<String>,
}

impl Cli {
    fn load_options(self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                log_level: self.log_level,
                database_url: self.database_url,
                ..ConfigOverrides::default()
            },
        }
    }
}

fn init_logging(config: &AppConfig) {
    use kudos_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(cli.load_options())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let interpreter = Arc::new(app.interpreter()?);

    let (queue, mut events) = event_channel(app.config.kudos.event_queue_capacity);
    let verifier = SignatureVerifier::new(app.config.slack.signing_secret.clone());
    let router = ingress::router(ingress::IngressState::new(verifier, queue.clone()))
        .merge(health::router(app.db_pool.clone(), queue));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        events_path = ingress::EVENTS_PATH,
        "kudos-server listening"
    );
    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(
                event_name = "system.server.error",
                correlation_id = "bootstrap",
                error = %error,
                "http server terminated unexpectedly"
            );
        }
    });

    let event_loop = EventLoop::new(interpreter);
    let exit = tokio::select! {
        exit = event_loop.run(&mut events) => Some(exit),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
    };

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        exit = ?exit,
        "kudos-server stopping"
    );
    app.db_pool.close().await;

    if exit == Some(LoopExit::AuthInvalid) {
        bail!("slack credentials were revoked; reinstall the app and update slack.bot_token");
    }
    Ok(())
}
