// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Single-slot mailbox over a shared memory region.
//!
//! The slot holds one UTF-8 message followed by zero fill. Every write clears
//! the whole region first, so a shorter message never exposes the tail of a
//! longer one. Reads are non-destructive.
//!
//! The mailbox has no lock of its own, so the accessors that touch the slot
//! are `unsafe`. Both participants share it by reference and only touch it
//! while they hold the turn; the mutex and condvar inside `TurnArbiter` are
//! what make one side's write visible to the other side's read.
//!
//! ```compile_fail,E0133
//! fn post(mailbox: &shmchat_core::Mailbox) {
//!     mailbox.write("Chat1: hi").ok();
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SharedMemoryError;
use crate::shm::SharedMemoryRegion;
use crate::types::{Capacity, RegionName};

/// What `Mailbox::write` does with a message longer than `capacity - 1` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Return `PayloadTooLarge` and leave the slot untouched.
    #[default]
    Reject,
    /// Store the longest prefix that fits and ends on a character boundary.
    Truncate,
}

/// Fixed-capacity single-message mailbox.
pub struct Mailbox {
    region: SharedMemoryRegion,
    policy: OverflowPolicy,
}

impl Mailbox {
    /// Create the named region and wrap it as a mailbox.
    ///
    /// A stale region left by an earlier run that never cleaned up is
    /// replaced, so the new mailbox always starts empty and owns the name.
    pub fn create(
        name: &RegionName,
        capacity: Capacity,
        policy: OverflowPolicy,
    ) -> Result<Self, SharedMemoryError> {
        let region = SharedMemoryRegion::create_or_replace(name.as_str(), capacity.bytes())?;
        Ok(Self::from_region(region, policy))
    }

    /// Attach to a region some other process already created.
    pub fn open(
        name: &RegionName,
        capacity: Capacity,
        policy: OverflowPolicy,
    ) -> Result<Self, SharedMemoryError> {
        let region = SharedMemoryRegion::open(name.as_str(), capacity.bytes())?;
        Ok(Self::from_region(region, policy))
    }

    pub fn from_region(region: SharedMemoryRegion, policy: OverflowPolicy) -> Self {
        Self { region, policy }
    }

    /// Total slot size in bytes, terminator included.
    pub fn capacity(&self) -> usize {
        self.region.size()
    }

    /// Longest encoded message the slot accepts without truncation.
    pub fn max_message_len(&self) -> usize {
        self.capacity() - 1
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn region_name(&self) -> &str {
        self.region.name()
    }

    /// False when the region already existed and this mailbox attached to it.
    pub fn is_owner(&self) -> bool {
        self.region.is_owner()
    }

    /// Store `text` in the slot, replacing whatever was there.
    ///
    /// Returns the number of bytes stored.
    ///
    /// # Safety
    /// The caller must have exclusive access to the slot for the duration of
    /// the call: no other `write`, `read` or `clear` on this mailbox (or on
    /// another mapping of the same region) may run concurrently. In a chat
    /// session that means holding the turn.
    pub unsafe fn write(&self, text: &str) -> Result<usize, SharedMemoryError> {
        let max = self.max_message_len();
        let len = if text.len() <= max {
            text.len()
        } else {
            match self.policy {
                OverflowPolicy::Reject => {
                    return Err(SharedMemoryError::PayloadTooLarge {
                        size: text.len(),
                        max,
                    });
                }
                OverflowPolicy::Truncate => {
                    let cut = floor_char_boundary(text, max);
                    tracing::debug!(size = text.len(), kept = cut, "Truncating mailbox write");
                    cut
                }
            }
        };

        // SAFETY: the region is valid for capacity bytes and len < capacity.
        // The caller guarantees exclusive access.
        unsafe {
            let dst = self.region.as_ptr();
            std::ptr::write_bytes(dst, 0, self.capacity());
            std::ptr::copy_nonoverlapping(text.as_ptr(), dst, len);
        }

        tracing::debug!(region = %self.region_name(), bytes = len, "Mailbox written");
        Ok(len)
    }

    /// Decode the slot up to the first NUL (or the full capacity).
    ///
    /// An empty slot and undecodable bytes both come back as an empty string.
    ///
    /// # Safety
    /// No `write` or `clear` on this region may run concurrently with the
    /// read. Holding the turn satisfies this.
    pub unsafe fn read(&self) -> String {
        let mut buf = vec![0u8; self.capacity()];
        // SAFETY: the region is valid for capacity bytes; the caller rules out
        // concurrent writers.
        unsafe {
            std::ptr::copy_nonoverlapping(self.region.as_ptr(), buf.as_mut_ptr(), buf.len());
        }

        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        buf.truncate(end);

        match String::from_utf8(buf) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(
                    region = %self.region_name(),
                    valid_up_to = e.utf8_error().valid_up_to(),
                    "Mailbox holds malformed UTF-8, treating as empty"
                );
                String::new()
            }
        }
    }

    /// Zero-fill the slot.
    ///
    /// # Safety
    /// Same contract as [`Mailbox::write`].
    pub unsafe fn clear(&self) {
        // SAFETY: the region is valid for capacity bytes
        unsafe { std::ptr::write_bytes(self.region.as_ptr(), 0, self.capacity()) };
    }
}

/// Largest index `<= max` that lies on a char boundary of `text`.
fn floor_char_boundary(text: &str, max: usize) -> usize {
    (0..=max.min(text.len()))
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0)
}
