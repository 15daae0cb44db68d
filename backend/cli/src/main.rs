mod config;
mod process_cmd;
mod status_cmd;
mod terminal_output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docintake_config::IntakeConfig;
use docintake_gateway::{start_server, GatewayState};
use docintake_logging::init_logger;
use tracing::info;

use process_cmd::ProcessArgs;

#[derive(Parser)]
#[command(name = "docintake")]
#[command(about = "ID card intake: validate, OCR and merge front and back images")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.docintake/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP intake server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Process one card from local files and print the JSON result
    Process {
        #[arg(long)]
        front: PathBuf,
        #[arg(long)]
        back: PathBuf,
        /// Content type of the front image (inferred from the extension otherwise)
        #[arg(long)]
        front_type: Option<String>,
        #[arg(long)]
        back_type: Option<String>,
    },
    /// Show the status of a running server
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn init_logging(config: &IntakeConfig) {
    init_logger(
        config.log_dir().map(Path::new),
        config.log_level(),
        config.log_json(),
    );
}

async fn serve(config_path: Option<&Path>, port: Option<u16>) -> Result<bool> {
    let config = config::load(config_path).await?;
    init_logging(&config);
    let addr = config::listen_addr(&config, port)?;
    let orchestrator = config::build_orchestrator(&config).await?;
    info!(engine = orchestrator.engine_name(), "Pipeline ready");

    let state = GatewayState::new(Arc::new(orchestrator), config::gateway_options(&config));
    start_server(addr, state).await?;
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let ok = match cli.command {
        Commands::Serve { port } => serve(config_path, port).await?,
        Commands::Process {
            front,
            back,
            front_type,
            back_type,
        } => {
            let config = config::load(config_path).await?;
            let orchestrator = config::build_orchestrator(&config).await?;
            let args = ProcessArgs {
                front: &front,
                back: &back,
                front_type: front_type.as_deref(),
                back_type: back_type.as_deref(),
            };
            process_cmd::run(&orchestrator, args).await?
        }
        // Only needs the port; a missing engine section must not block it.
        Commands::Status { port } => {
            let config = config::load_lenient(config_path).await?;
            status_cmd::run(config::status_port(&config, port)).await?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
