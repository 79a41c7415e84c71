// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmchat validate` command - Validate configuration file.

use shmchat_core::ConfigLoader;

use crate::CliError;

pub fn execute(file: &str) -> Result<(), CliError> {
    tracing::info!(file = %file, "Validating configuration");

    let config = match ConfigLoader::load_file(file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            return Err(e.into());
        }
    };

    println!("✓ Configuration is valid");
    println!();
    println!("Mailbox Settings:");
    println!("  Region Name:   {}", config.mailbox.region_name);
    println!("  Capacity:      {}", config.mailbox.capacity);
    println!("  Overflow:      {:?}", config.mailbox.overflow);
    println!();
    println!("Session Settings:");
    println!("  Participant A: {}", config.session.participant_a);
    println!("  Participant B: {}", config.session.participant_b);
    println!("  Exit Command:  {}", config.session.exit_command);
    println!(
        "  Yield Delay:   {}ms",
        config.session.yield_delay.as_millis()
    );
    Ok(())
}
