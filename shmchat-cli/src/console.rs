// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Console collaborators for the session loop.

use std::io;

use shmchat_core::session::strip_line_ending;
use shmchat_core::LineSource;

/// Reads one line from the process stdin per call.
///
/// Both participants hold one of these; only the turn holder ever calls it,
/// so they never compete for a line.
pub struct StdinSource;

impl LineSource for StdinSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}
