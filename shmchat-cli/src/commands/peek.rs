// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmchat peek` command - Attach to a running chat's mailbox.
//!
//! Reads without any turn coordination, so a write landing mid-read shows
//! up as an empty or malformed slot.

use shmchat_core::{ChatError, Envelope, Mailbox};

use crate::CliError;

pub fn execute(
    config_path: Option<&str>,
    region: Option<String>,
    capacity: Option<usize>,
) -> Result<(), CliError> {
    let config = super::load_config(config_path, region, capacity)?;

    tracing::info!(region = %config.mailbox.region_name, "Attaching to mailbox");

    let mailbox = Mailbox::open(
        &config.mailbox.region_name,
        config.mailbox.capacity,
        config.mailbox.overflow,
    )
    .map_err(ChatError::from)?;

    // SAFETY: the only writers live in another process and never share a
    // Rust allocation with us. A write landing mid-copy tears the bytes,
    // which read() turns into an empty or unparsable slot.
    let raw = unsafe { mailbox.read() };
    if raw.is_empty() {
        println!("(mailbox '{}' is empty)", mailbox.region_name());
        return Ok(());
    }

    match Envelope::parse(&raw) {
        Ok(envelope) => println!("{}: \"{}\"", envelope.sender, envelope.text),
        Err(e) => println!("(unparsed: {}) {}", e, raw),
    }

    Ok(())
}
