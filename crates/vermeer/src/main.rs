//! Entry point for the vermeer binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vermeer::cli::{
    Cli, Commands, handle_balance_command, handle_credits_command, handle_status_command,
    handle_submit_command, handle_worker_command,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Worker { runtime } => handle_worker_command(&runtime).await?,
        Commands::Submit {
            runtime,
            user,
            project,
            template,
            text,
            file,
            wait,
        } => handle_submit_command(&runtime, user, project, template, text, file, wait).await?,
        Commands::Status { image, json } => handle_status_command(image, json).await?,
        Commands::Balance { user, limit } => handle_balance_command(user, limit).await?,
        Commands::Credits {
            user,
            amount,
            reason,
        } => handle_credits_command(user, amount, reason).await?,
    }
    Ok(())
}
