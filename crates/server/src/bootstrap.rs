use std::sync::Arc;

use kudos_core::command::ParserError;
use kudos_core::config::{AppConfig, ConfigError};
use kudos_db::{connect, migrations, DbPool, SqlKudosLedger};
use kudos_slack::{BotIdentity, CommandInterpreter, GatewayError, SlackWebApi};
use thiserror::Error;
use tracing::info;

pub type KudosInterpreter = CommandInterpreter<SlackWebApi, SqlKudosLedger>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub gateway: Arc<SlackWebApi>,
    pub ledger: Arc<SqlKudosLedger>,
    pub bot: BotIdentity,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack client setup failed: {0}")]
    Gateway(#[source] GatewayError),
    #[error("could not identify the bot user: {0}")]
    BotIdentity(#[source] GatewayError),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

impl Application {
    pub fn interpreter(&self) -> Result<KudosInterpreter, BootstrapError> {
        let interpreter = CommandInterpreter::new(
            self.gateway.clone(),
            self.ledger.clone(),
            Arc::new(self.config.kudos.clone()),
            self.bot.clone(),
        )?;
        Ok(interpreter)
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let gateway = SlackWebApi::new(&config.slack).map_err(BootstrapError::Gateway)?;
    let bot = gateway.bot_identity().await.map_err(BootstrapError::BotIdentity)?;
    info!(
        event_name = "system.bootstrap.bot_identified",
        correlation_id = "bootstrap",
        bot_id = %bot.id,
        bot_name = %bot.name,
        "slack bot identity resolved"
    );

    let ledger = Arc::new(SqlKudosLedger::new(db_pool.clone()));

    Ok(Application { config, db_pool, gateway: Arc::new(gateway), ledger, bot })
}
