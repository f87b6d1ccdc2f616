use std::path::PathBuf;

use clap::Parser;

use cli::{Config, Result, report, telemetry};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "calc-client")]
#[command(about = "Run the calculator demo against calc-server", long_about = None)]
#[command(version)]
struct Cli {
    /// Server executable (defaults to calc-server next to this binary)
    #[arg(long)]
    server: Option<PathBuf>,

    /// Config file (defaults to ./calc.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        report("Error running calc client", &e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?;
    telemetry::init(config.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))?;

    let server = config.server_config(cli.server)?;
    println!("Using server at: {}", server.command);

    let mut stdout = std::io::stdout();
    runtime::run_demo(server, &mut stdout).await?;
    Ok(())
}
