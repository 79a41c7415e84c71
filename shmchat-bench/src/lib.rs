// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared helpers for the shmchat benchmarks.

use shmchat_core::{Capacity, Mailbox, OverflowPolicy, RegionName};

/// Create a mailbox whose name is unique to this process and tag.
pub fn bench_mailbox(tag: &str, capacity: usize) -> Mailbox {
    let name = RegionName::new(format!("shmchat-bench-{}-{}", tag, std::process::id()))
        .expect("bench region name is valid");
    let capacity = Capacity::new(capacity).expect("bench capacity is in range");
    Mailbox::create(&name, capacity, OverflowPolicy::Truncate).expect("Failed to create SHM region")
}
