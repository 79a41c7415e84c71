// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Every field has a default, so an empty document is a valid config.
//! Any invalid field results in a HardValidationError that prevents startup.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ChatError, ChatResult, HardValidationError};
use crate::shm::OverflowPolicy;
use crate::types::{
    Capacity, ParticipantId, ParticipantName, RegionName, DEFAULT_CAPACITY, DEFAULT_REGION_NAME,
};

/// Input line that ends the chat.
pub const DEFAULT_EXIT_COMMAND: &str = "exit";

const DEFAULT_YIELD_DELAY_MS: u64 = 100;
const MAX_YIELD_DELAY_MS: u64 = 10_000;

/// Raw mailbox configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMailboxConfig {
    #[serde(default = "default_region_name")]
    region_name: String,
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    overflow: OverflowPolicy,
}

fn default_region_name() -> String {
    DEFAULT_REGION_NAME.to_string()
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for RawMailboxConfig {
    fn default() -> Self {
        Self {
            region_name: default_region_name(),
            capacity: default_capacity(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Raw session configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSessionConfig {
    #[serde(default = "default_participant_a")]
    participant_a: String,
    #[serde(default = "default_participant_b")]
    participant_b: String,
    #[serde(default = "default_exit_command")]
    exit_command: String,
    #[serde(default = "default_yield_delay_ms")]
    yield_delay_ms: u64,
}

fn default_participant_a() -> String {
    ParticipantName::default_for(ParticipantId::A).into()
}

fn default_participant_b() -> String {
    ParticipantName::default_for(ParticipantId::B).into()
}

fn default_exit_command() -> String {
    DEFAULT_EXIT_COMMAND.to_string()
}

fn default_yield_delay_ms() -> u64 {
    DEFAULT_YIELD_DELAY_MS
}

impl Default for RawSessionConfig {
    fn default() -> Self {
        Self {
            participant_a: default_participant_a(),
            participant_b: default_participant_b(),
            exit_command: default_exit_command(),
            yield_delay_ms: default_yield_delay_ms(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    mailbox: RawMailboxConfig,
    #[serde(default)]
    session: RawSessionConfig,
}

/// Validated mailbox configuration.
#[derive(Debug, Clone, Default)]
pub struct MailboxConfig {
    pub region_name: RegionName,
    pub capacity: Capacity,
    pub overflow: OverflowPolicy,
}

/// Validated session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub participant_a: ParticipantName,
    pub participant_b: ParticipantName,
    pub exit_command: String,
    pub yield_delay: Duration,
}

impl SessionConfig {
    /// Display name for a participant.
    pub fn name_of(&self, id: ParticipantId) -> &ParticipantName {
        match id {
            ParticipantId::A => &self.participant_a,
            ParticipantId::B => &self.participant_b,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            participant_a: ParticipantName::default_for(ParticipantId::A),
            participant_b: ParticipantName::default_for(ParticipantId::B),
            exit_command: DEFAULT_EXIT_COMMAND.to_string(),
            yield_delay: Duration::from_millis(DEFAULT_YIELD_DELAY_MS),
        }
    }
}

/// Complete validated configuration.
///
/// `Default` is built from the typed defaults of each field and equals what
/// an empty YAML document loads to.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub mailbox: MailboxConfig,
    pub session: SessionConfig,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> ChatResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ChatError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ChatError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> ChatResult<Config> {
        // serde_yaml rejects an empty document; treat it as all defaults
        if content.trim().is_empty() {
            return Self::validate(RawConfig::default());
        }

        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| ChatError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> ChatResult<Config> {
        Ok(Config {
            mailbox: Self::validate_mailbox(raw.mailbox)?,
            session: Self::validate_session(raw.session)?,
        })
    }

    fn validate_mailbox(raw: RawMailboxConfig) -> ChatResult<MailboxConfig> {
        Ok(MailboxConfig {
            region_name: RegionName::new(raw.region_name)?,
            capacity: Capacity::new(raw.capacity)?,
            overflow: raw.overflow,
        })
    }

    fn validate_session(raw: RawSessionConfig) -> ChatResult<SessionConfig> {
        let participant_a = ParticipantName::new(raw.participant_a)?;
        let participant_b = ParticipantName::new(raw.participant_b)?;

        if participant_a == participant_b {
            return Err(HardValidationError::DuplicateParticipantName {
                name: participant_a.to_string(),
            }
            .into());
        }

        if raw.exit_command.trim().is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "exit_command",
                value: raw.exit_command,
                reason: "Exit command cannot be blank".to_string(),
            }
            .into());
        }

        if raw.yield_delay_ms > MAX_YIELD_DELAY_MS {
            return Err(HardValidationError::InvalidFieldValue {
                field: "yield_delay_ms",
                value: raw.yield_delay_ms.to_string(),
                reason: format!("Must not exceed {}ms", MAX_YIELD_DELAY_MS),
            }
            .into());
        }

        Ok(SessionConfig {
            participant_a,
            participant_b,
            exit_command: raw.exit_command,
            yield_delay: Duration::from_millis(raw.yield_delay_ms),
        })
    }
}
