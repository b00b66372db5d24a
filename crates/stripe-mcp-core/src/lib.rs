pub mod audit;
pub mod config;
pub mod logging;
pub mod mcp;
pub mod resources;
pub mod socket;
pub mod storage;
pub mod stripe;
pub mod tools;
pub mod transport;

use audit::{AuditLog, AuditSink, TracingSink};
use config::{Config, ConfigError};
use mcp::{Server, ServerInfo};
use std::fmt::{Display, Formatter};
use storage::SqliteAuditStore;
use stripe::{HttpClient, StripeApi, StripeError};
use tracing::Instrument;
use transport::TransportError;

#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Stripe(StripeError),
    Storage(sqlx::Error),
    Transport(TransportError),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "{}", e),
            ServerError::Stripe(e) => write!(f, "Stripe: {}", e),
            ServerError::Storage(e) => write!(f, "audit storage: {}", e),
            ServerError::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        ServerError::Config(e)
    }
}

impl From<StripeError> for ServerError {
    fn from(e: StripeError) -> Self {
        ServerError::Stripe(e)
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(e: sqlx::Error) -> Self {
        ServerError::Storage(e)
    }
}

impl From<TransportError> for ServerError {
    fn from(e: TransportError) -> Self {
        ServerError::Transport(e)
    }
}

async fn audit_log(config: &Config) -> Result<AuditLog, ServerError> {
    match &config.audit_db {
        Some(path) => {
            let store = SqliteAuditStore::open(path).await?;
            tracing::info!("persisting audit log to {}", path.display());
            let sinks: Vec<Box<dyn AuditSink + Send + Sync>> =
                vec![Box::new(TracingSink), Box::new(store)];
            Ok(AuditLog::with_sink(Box::new(audit::multi_sink(sinks))))
        }
        None => Ok(AuditLog::default()),
    }
}

/// Builds a server from `api`, checking the key first when the config asks
/// for it.
pub async fn build_server_with<A>(api: A, config: &Config) -> Result<Server, ServerError>
where
    A: StripeApi + 'static,
{
    tracing::info!("Initializing Stripe client");
    if config.verify_credentials {
        tracing::debug!("Testing connection to Stripe");
        if let Err(e) = api.verify().await {
            match &e {
                StripeError::Authentication(message) => {
                    tracing::error!("Invalid API key: {}", message)
                }
                other => tracing::error!("Stripe connection test failed: {}", other),
            }
            return Err(e.into());
        }
    }
    tracing::info!("Stripe configured");

    let audit = audit_log(config).await?;
    Ok(Server::new(api, audit, ServerInfo::from(config)))
}

pub async fn build_server(config: &Config) -> Result<Server, ServerError> {
    build_server_with(HttpClient::new(config)?, config).await
}

pub async fn stdio_server(config: &Config) -> Result<(), ServerError> {
    let server = build_server(config).await?;
    tracing::info!("Starting Stripe MCP server on stdio");
    transport::serve_lines(tokio::io::stdin(), tokio::io::stdout(), server)
        .instrument(transport::session_span("stdio"))
        .await?;
    Ok(())
}

pub async fn tcp_server(addr: &str, config: &Config) -> Result<(), ServerError> {
    let server = build_server(config).await?;
    socket::run(addr, server).await?;
    Ok(())
}
