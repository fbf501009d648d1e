//! FaceGate daemon — entry point for running the liveness API.

use clap::Parser;
use facegate_rpc::{RpcServer, ServiceConfig};
use facegate_utils::{init_logging, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facegate-daemon", about = "FaceGate liveness service daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "FACEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Port for the HTTP API.
    #[arg(long, env = "FACEGATE_PORT")]
    port: Option<u16>,

    /// Service credential expected in the X-Api-Key header.
    #[arg(long, env = "FACEGATE_API_KEY")]
    api_key: Option<String>,

    /// Base URL of the face engine.
    #[arg(long, env = "FACEGATE_ENGINE_URL")]
    engine_url: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "FACEGATE_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, env = "FACEGATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the liveness API server.
    Serve,
    /// Print the effective configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: Option<ServiceConfig> = match cli.config {
        Some(ref config_path) => match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<ServiceConfig>(&contents) {
                Ok(cfg) => Some(cfg),
                Err(e) => anyhow::bail!("failed to parse {}: {e}", config_path.display()),
            },
            Err(e) => anyhow::bail!("failed to read {}: {e}", config_path.display()),
        },
        None => None,
    };

    let mut config = file_config.unwrap_or_default();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    if let Some(engine_url) = cli.engine_url {
        config.engine_url = engine_url;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }
    config.log_level = cli.log_level;

    match cli.command {
        Command::CheckConfig => {
            println!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Serve => {
            init_logging(
                LogFormat::from_config(&config.log_format),
                &config.log_level,
            );
            if config.api_key == "change_me" {
                tracing::warn!("running with the default API key — set FACEGATE_API_KEY");
            }
            tracing::info!(
                port = config.port,
                engine = %config.engine_url,
                branches = config.directory.len(),
                ttl = config.liveness.challenge_ttl_secs,
                "starting FaceGate"
            );

            let server = RpcServer::from_config(config);
            server.start().await?;

            tracing::info!("FaceGate daemon exited cleanly");
            Ok(())
        }
    }
}
