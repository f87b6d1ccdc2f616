use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;

use cli::{Error, Result, report, telemetry};

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "calc-server")]
#[command(about = "Calculator MCP server over stdio", long_about = None)]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();
    if let Err(e) = run().await {
        report("Error running calc server", &e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    telemetry::init(DEFAULT_LOG_FILTER)?;

    let registry = registry::calculator()?;
    info!(
        name = registry.name(),
        version = registry.version(),
        "serving on stdio"
    );

    let service = registry
        .serve(stdio())
        .await
        .map_err(|e| Error::Serve(e.to_string()))?;
    let reason = service
        .waiting()
        .await
        .map_err(|e| Error::Serve(e.to_string()))?;
    info!(?reason, "session ended");
    Ok(())
}
