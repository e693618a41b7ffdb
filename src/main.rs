use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use crank_scenario_language_server::config::ServerConfig;
use crank_scenario_language_server::logging::init_logger;
use crank_scenario_language_server::lsp::backend::{
    CrankBackend, SCHEMA_CONTENT_METHOD, SCHEMA_URI_METHOD,
};
use crank_scenario_language_server::lsp::services::ScenarioServices;

/// Language server for Crank scenario files
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Log filter for stderr, e.g. `debug` or `crank_scenario_language_server=trace` (defaults to RUST_LOG, then `info`)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log to the cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Cog registry file (overrides CRANK_REGISTRY_PATH)
    #[arg(long, value_name = "PATH")]
    registry: Option<PathBuf>,

    /// Command used to run scenarios (overrides CRANK_RUNNER)
    #[arg(long, value_name = "CMD")]
    runner: Option<String>,

    /// Communicate over stdio (the only supported transport)
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)?;

    let config = ServerConfig::from_env(args.registry, args.runner);
    info!(
        "Starting {} {} (registry {:?}, runner {:?})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.registry_path,
        config.runner
    );

    let (services, shell_events) = ScenarioServices::from_config(&config);
    let services = Arc::new(services);

    if !args.stdio {
        info!("No transport selected, using stdio");
    }

    let (service, socket) = LspService::build(move |client| {
        CrankBackend::new(client, services, Some(shell_events))
    })
    .custom_method(SCHEMA_URI_METHOD, CrankBackend::schema_uri)
    .custom_method(SCHEMA_CONTENT_METHOD, CrankBackend::schema_content)
    .finish();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Server stopped");
    Ok(())
}
