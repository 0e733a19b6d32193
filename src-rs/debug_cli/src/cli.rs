use clap::Parser;

use crate::models::CLIConfig;

#[derive(Parser, Debug)]
#[command(name = "fact-check-cli")]
#[command(about = "Interactive client for the fact-check service")]
struct Args {
    /// Base URL of the service.
    #[arg(long = "base", env = "FACT_CHECK_URL", default_value = "http://localhost:10000")]
    base_url: String,

    /// Seconds to wait for a verdict.
    #[arg(long, env = "FACT_CHECK_TIMEOUT", default_value_t = 180)]
    timeout: u64,

    /// Print raw JSON responses.
    #[arg(long, env = "FACT_CHECK_DEBUG")]
    debug: bool,
}

pub fn parse_config() -> CLIConfig {
    let args = Args::parse();
    CLIConfig {
        base_url: args.base_url,
        timeout_secs: args.timeout,
        debug: args.debug,
        pending_image: None,
    }
}
