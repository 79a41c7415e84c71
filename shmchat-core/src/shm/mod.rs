// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared memory transport.
//!
//! A named POSIX shared memory region, wrapped as a single-slot mailbox
//! that carries one encoded message at a time.

mod mailbox;
mod region;

pub use mailbox::{Mailbox, OverflowPolicy};
pub use region::SharedMemoryRegion;
