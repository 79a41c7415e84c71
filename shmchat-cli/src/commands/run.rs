// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmchat run` command - Chat on this console.

use std::io;
use std::sync::Arc;

use shmchat_core::{run_pair, ChatError, Mailbox, OverflowPolicy, TurnArbiter, WriteSink};

use crate::console::StdinSource;
use crate::shutdown;
use crate::CliError;

pub fn execute(
    config_path: Option<&str>,
    region: Option<String>,
    capacity: Option<usize>,
    truncate: bool,
    report: bool,
) -> Result<(), CliError> {
    let mut config = super::load_config(config_path, region, capacity)?;
    if truncate {
        config.mailbox.overflow = OverflowPolicy::Truncate;
    }

    tracing::info!(
        region = %config.mailbox.region_name,
        capacity = config.mailbox.capacity.bytes(),
        overflow = ?config.mailbox.overflow,
        "Starting chat"
    );

    // Fatal on failure: no retry, no fallback transport
    let mailbox = Mailbox::create(
        &config.mailbox.region_name,
        config.mailbox.capacity,
        config.mailbox.overflow,
    )
    .map_err(ChatError::from)?;

    let arbiter = Arc::new(TurnArbiter::new());
    shutdown::watch(Arc::clone(&arbiter), config.mailbox.region_name.clone()).map_err(|e| {
        ChatError::Io {
            context: "installing signal handlers",
            source: e,
        }
    })?;

    println!("=== Turn-based chat (shared memory) ===");
    println!(
        "{} and {} take turns sending and reading messages",
        config.session.participant_a, config.session.participant_b
    );
    println!("Type '{}' to quit", config.session.exit_command);
    println!();

    let pair = run_pair(
        &config.session,
        arbiter,
        Arc::new(mailbox),
        [
            (StdinSource, WriteSink::new(io::stdout())),
            (StdinSource, WriteSink::new(io::stdout())),
        ],
    )?;

    println!("Program finished.");

    if report {
        println!("{}", serde_json::to_string_pretty(&pair)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shmchat_core::HardValidationError;

    #[test]
    fn test_overlong_region_name_fails_before_chat() {
        let region = "r".repeat(300);
        let err = execute(None, Some(region), None, false, false).unwrap_err();
        assert!(matches!(
            err,
            CliError::InvalidOption(HardValidationError::InvalidFieldValue { field: "region_name", .. })
        ));
    }

    #[test]
    fn test_capacity_out_of_range_fails_before_chat() {
        let err = execute(None, None, Some(1), false, false).unwrap_err();
        assert!(matches!(err, CliError::InvalidOption(_)));
    }

    #[test]
    fn test_missing_config_file_fails() {
        let err = execute(Some("/nonexistent/shmchat.yaml"), None, None, false, false).unwrap_err();
        assert!(matches!(err, CliError::Chat(ChatError::ConfigNotFound { .. })));
    }
}
