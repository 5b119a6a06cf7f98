// ABOUTME: CloudTrain command line entry point
// ABOUTME: Starts the task server or applies database migrations

use clap::{Parser, Subcommand};
use std::process;
use tracing::error;

use cloudtrain_cli::{init_tracing, run_migrations, run_server, Config};

#[derive(Parser)]
#[command(name = "cloudtrain")]
#[command(about = "CloudTrain task management service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[arg(long, help = "API server port (overrides CLOUDTRAIN_API_PORT)")]
        port: Option<u16>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port.filter(|port| *port != 0) {
                config.port = port;
            }
            run_server(config).await
        }
        Commands::Migrate => run_migrations(&config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
}
