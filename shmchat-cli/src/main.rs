// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! shmchat CLI
//!
//! Console front end: two participants taking turns on this terminal,
//! talking through a named shared memory mailbox.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod console;
mod error;
mod shutdown;

pub use error::CliError;

/// shmchat - turn-based chat over shared memory
#[derive(Parser)]
#[command(name = "shmchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults apply if omitted and shmchat.yaml is absent)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a chat between two participants on this console
    Run {
        /// Shared memory region name
        #[arg(long)]
        region: Option<String>,

        /// Mailbox capacity in bytes
        #[arg(long)]
        capacity: Option<usize>,

        /// Truncate overlong messages instead of rejecting them
        #[arg(long)]
        truncate: bool,

        /// Print a JSON report when the chat ends
        #[arg(long)]
        report: bool,
    },

    /// Show the message currently held by an existing mailbox
    Peek {
        /// Shared memory region name
        #[arg(long)]
        region: Option<String>,

        /// Mailbox capacity in bytes
        #[arg(long)]
        capacity: Option<usize>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the chat prompts
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            region,
            capacity,
            truncate,
            report,
        } => commands::run::execute(cli.config.as_deref(), region, capacity, truncate, report),
        Commands::Peek { region, capacity } => {
            commands::peek::execute(cli.config.as_deref(), region, capacity)
        }
        Commands::Validate { file } => commands::validate::execute(&file),
    };

    exit_code(result)
}

/// Print a command failure to stderr and map it to the process status.
fn exit_code(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shmchat_core::{ChatError, SharedMemoryError};

    #[test]
    fn test_mailbox_failure_exits_nonzero() {
        let err = CliError::from(ChatError::from(SharedMemoryError::CreateFailed {
            name: "ChatSharedMemory".to_string(),
            reason: "shm_open failed: Permission denied".to_string(),
        }));
        assert_eq!(exit_code(Err(err)), ExitCode::FAILURE);
        assert_eq!(exit_code(Ok(())), ExitCode::SUCCESS);
    }

    #[test]
    fn test_peek_missing_region_exits_nonzero() {
        let region = format!("shmchat-cli-absent-{}", std::process::id());
        let result = commands::peek::execute(None, Some(region), None);
        assert!(matches!(
            result,
            Err(CliError::Chat(ChatError::SharedMemory(
                SharedMemoryError::OpenFailed { .. }
            )))
        ));
        assert_eq!(exit_code(result), ExitCode::FAILURE);
    }

    #[test]
    fn test_cli_parses_run_overrides() {
        let cli = Cli::parse_from([
            "shmchat",
            "run",
            "--region",
            "room",
            "--capacity",
            "64",
            "--truncate",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Run {
                region: Some(ref r),
                capacity: Some(64),
                truncate: true,
                report: false,
            } if r == "room"
        ));
    }
}
