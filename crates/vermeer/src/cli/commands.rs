//! Command definitions for the vermeer binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Command-line interface for the vermeer pipeline.
#[derive(Parser, Debug)]
#[command(name = "vermeer")]
#[command(about = "Asynchronous text-to-image generation pipeline with a credit ledger")]
#[command(
    long_about = "Asynchronous text-to-image generation pipeline with a credit ledger.\n\n\
    Commands that touch the database read DATABASE_URL from the environment;\n\
    commands that run the pipeline additionally read OPENAI_API_KEY. Both are\n\
    loaded from a .env file when present."
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Collaborator settings shared by the pipeline-running commands.
#[derive(Args, Debug)]
pub struct RuntimeArgs {
    /// Directory generated images are written to
    #[arg(long, env = "STORAGE_ROOT", default_value = "objects")]
    pub storage_root: PathBuf,

    /// Base URL the stored objects are served from
    #[arg(
        long,
        env = "PUBLIC_BASE_URL",
        default_value = "http://localhost:3000/objects"
    )]
    pub public_base_url: String,

    /// Workers spawned per queue
    #[arg(long, default_value_t = 2)]
    pub concurrency: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the queue workers until interrupted
    Worker {
        #[command(flatten)]
        runtime: RuntimeArgs,
    },

    /// Submit a render and wait for it to settle
    Submit {
        #[command(flatten)]
        runtime: RuntimeArgs,

        /// User submitting the render
        #[arg(short, long)]
        user: String,

        /// Project the render belongs to
        #[arg(short, long)]
        project: Uuid,

        /// Template holding the art direction
        #[arg(short, long)]
        template: Uuid,

        /// Source text to summarize and illustrate
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the source text from a file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Seconds to wait for the render to settle
        #[arg(long, default_value_t = 120)]
        wait: u64,
    },

    /// Report an image's progress
    Status {
        /// Image to look up
        #[arg(short, long)]
        image: Uuid,

        /// Emit the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's credit balance and recent transactions
    Balance {
        /// User to report on
        #[arg(short, long)]
        user: String,

        /// Transactions to list, newest first
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Apply a manual credit adjustment
    Credits {
        /// User whose balance changes
        #[arg(short, long)]
        user: String,

        /// Signed credit delta; positive grants, negative deducts
        #[arg(short, long, allow_hyphen_values = true)]
        amount: i64,

        /// Reason recorded on the ledger entry
        #[arg(short, long)]
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn worker_parses_with_defaults() {
        let cli = Cli::try_parse_from(["vermeer", "worker"]).unwrap();
        let Commands::Worker { runtime } = cli.command else {
            panic!("expected worker command");
        };
        assert_eq!(runtime.concurrency, 2);
        assert_eq!(runtime.storage_root, PathBuf::from("objects"));
    }

    #[test]
    fn submit_requires_uuid_arguments() {
        let err = Cli::try_parse_from([
            "vermeer",
            "submit",
            "--user",
            "user_1",
            "--project",
            "not-a-uuid",
            "--template",
            "f6a7c4de-9b1d-4a09-9e9e-3f8d6f1b2c3a",
            "--text",
            "A lighthouse keeper.",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn credits_accepts_negative_amounts() {
        let cli = Cli::try_parse_from([
            "vermeer", "credits", "--user", "user_1", "--amount", "-5", "--reason", "Correction",
        ])
        .unwrap();
        let Commands::Credits { amount, .. } = cli.command else {
            panic!("expected credits command");
        };
        assert_eq!(amount, -5);
    }
}
