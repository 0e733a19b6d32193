use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fact_check_rs::api::{AppServer, AppState};
use fact_check_rs::config::Config;
use fact_check_rs::helpers::build_agent;

#[derive(Parser, Debug)]
#[command(name = "fact-check")]
#[command(version)]
#[command(about = "Fact-checking service backed by a tool-using LLM agent")]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 10000)]
    port: u16,

    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Settings file; a missing file means defaults.
    #[arg(long, env = "FACT_CHECK_SETTINGS", default_value = "settings.json")]
    settings: PathBuf,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = Config::load(&cli.settings)
        .with_context(|| format!("invalid configuration (settings: {})", cli.settings.display()))?;
    let (agent, router) = build_agent(&config).context("failed to register tools")?;
    info!(
        provider = %config.provider,
        model = %agent.config.model,
        tools = agent.tools.count(),
        max_turns = agent.config.max_turns,
        "fact-check agent ready"
    );

    let state = AppState {
        agent,
        router,
        request_timeout: config.settings.request_timeout(),
    };
    AppServer::new(SocketAddr::new(cli.host, cli.port), state).start().await
}
