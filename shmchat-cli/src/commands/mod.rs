// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod peek;
pub mod run;
pub mod validate;

use std::path::Path;

use shmchat_core::{Capacity, Config, ConfigLoader, RegionName};

use crate::CliError;

/// Looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "shmchat.yaml";

/// Load the configuration and apply mailbox overrides from the command line.
///
/// An explicit path must exist; the default path is optional.
pub fn load_config(
    path: Option<&str>,
    region: Option<String>,
    capacity: Option<usize>,
) -> Result<Config, CliError> {
    let mut config = match path {
        Some(path) => ConfigLoader::load_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            ConfigLoader::load_file(DEFAULT_CONFIG_PATH)?
        }
        None => Config::default(),
    };

    if let Some(region) = region {
        config.mailbox.region_name = RegionName::new(region)?;
    }
    if let Some(capacity) = capacity {
        config.mailbox.capacity = Capacity::new(capacity)?;
    }

    Ok(config)
}
