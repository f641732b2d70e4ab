mod api;
mod backend;
mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ServeArgs};
use crate::output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dossier=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::Info(args)) => {
            commands::info::run_stats(&args.backend_config, OutputFormat::from_json_flag(args.json))
                .await
        }
        Some(Commands::Accounts(args)) => {
            commands::info::run_accounts(
                &args.backend_config,
                OutputFormat::from_json_flag(args.json),
            )
            .await
        }
        None => commands::serve::run(&ServeArgs::from_env()).await,
    }
}
