// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time, so a value that
//! exists is a value that can be handed to the arbiter or the mailbox.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Smallest usable mailbox: one content byte plus the terminator.
pub const MIN_CAPACITY: usize = 2;
/// Largest mailbox we are willing to map (1 MiB).
pub const MAX_CAPACITY: usize = 1024 * 1024;
/// Capacity used when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 1024;
/// Name the mailbox region is published under unless configured otherwise.
pub const DEFAULT_REGION_NAME: &str = "ChatSharedMemory";

/// One of the two chat participants.
///
/// The turn always starts with `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantId {
    A,
    B,
}

impl ParticipantId {
    /// Both participants in turn order.
    pub const ALL: [ParticipantId; 2] = [ParticipantId::A, ParticipantId::B];

    /// The counterpart of this participant.
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated participant display name.
/// Non-empty, at most 64 bytes, no `:` (the envelope delimiter) and no control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantName(String);

impl ParticipantName {
    pub const MAX_LEN: usize = 64;

    /// Create a new ParticipantName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "participant_name",
                value: name,
                reason: "Participant name cannot be empty".to_string(),
            });
        }

        if name.len() > Self::MAX_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "participant_name",
                value: name.clone(),
                reason: format!(
                    "Participant name too long: {} bytes (max {})",
                    name.len(),
                    Self::MAX_LEN
                ),
            });
        }

        if name.contains(':') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "participant_name",
                value: name,
                reason: "Participant name must not contain ':'".to_string(),
            });
        }

        if name.chars().any(char::is_control) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "participant_name",
                value: name,
                reason: "Participant name must not contain control characters".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Display name a participant gets when none is configured.
    pub fn default_for(id: ParticipantId) -> Self {
        match id {
            ParticipantId::A => Self("Chat1".to_string()),
            ParticipantId::B => Self("Chat2".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ParticipantName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ParticipantName> for String {
    fn from(name: ParticipantName) -> Self {
        name.0
    }
}

/// Validated shared memory object name (without the leading `/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionName(String);

impl RegionName {
    /// Linux caps shm names at NAME_MAX (255); leave room for the prefix.
    pub const MAX_LEN: usize = 200;

    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "region_name",
                value: name,
                reason: "Region name cannot be empty".to_string(),
            });
        }

        if name.len() > Self::MAX_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "region_name",
                value: name.clone(),
                reason: format!(
                    "Region name too long: {} bytes (max {})",
                    name.len(),
                    Self::MAX_LEN
                ),
            });
        }

        if name.contains('/') || name.contains('\0') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "region_name",
                value: name,
                reason: "Region name must not contain '/' or NUL".to_string(),
            });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RegionName {
    fn default() -> Self {
        Self(DEFAULT_REGION_NAME.to_string())
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegionName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionName> for String {
    fn from(name: RegionName) -> Self {
        name.0
    }
}

/// Validated mailbox capacity in bytes, terminator included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Capacity(usize);

impl Capacity {
    pub fn new(bytes: usize) -> Result<Self, HardValidationError> {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&bytes) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "capacity",
                value: bytes.to_string(),
                reason: format!("Must be between {} and {} bytes", MIN_CAPACITY, MAX_CAPACITY),
            });
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> usize {
        self.0
    }

    /// Longest encoded message that fits: one byte is reserved for the terminator.
    pub fn max_message_len(&self) -> usize {
        self.0 - 1
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self(DEFAULT_CAPACITY)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

impl TryFrom<usize> for Capacity {
    type Error = HardValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Capacity> for usize {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}
