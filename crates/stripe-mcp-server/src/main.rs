use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stripe_mcp_core::config::{Config, ConfigError, DEFAULT_API_BASE};
use stripe_mcp_core::logging;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(env = "STRIPE_API_KEY", long, hide_env_values = true)]
    stripe_api_key: Option<String>,

    #[arg(env = "STRIPE_API_BASE", long, default_value = DEFAULT_API_BASE)]
    stripe_api_base: String,

    /// Skip the startup call that checks the API key.
    #[arg(long)]
    skip_verify: bool,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Also persist audit entries to this SQLite file.
    #[arg(env = "AUDIT_DB", long)]
    audit_db: Option<PathBuf>,

    /// Serve MCP over TCP on this address instead of stdio.
    #[arg(long)]
    listen: Option<String>,
}

fn config(args: &Args) -> Result<Config, ConfigError> {
    let mut builder = Config::builder();
    builder
        .api_key(args.stripe_api_key.clone().unwrap_or_default())
        .api_base(args.stripe_api_base.clone())
        .verify_credentials(!args.skip_verify)
        .request_timeout_secs(args.timeout_secs);
    if let Some(path) = &args.audit_db {
        builder.audit_db(path.clone());
    }
    builder.build()
}

/// Values already in the environment win over the `.env` file; a missing
/// file is not an error.
fn report_dotenv(result: &Result<PathBuf, dotenvy::Error>) {
    match result {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("failed to load .env: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // before logging so RUST_LOG and DEBUG from .env apply
    let dotenv = dotenvy::dotenv();
    logging::setup();
    report_dotenv(&dotenv);
    let args = Args::parse();

    let config = match config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.listen {
        Some(addr) => stripe_mcp_core::tcp_server(addr, &config).await,
        None => stripe_mcp_core::stdio_server(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
