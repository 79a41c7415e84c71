// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Turn state machine.
//!
//! States are {A turn, B turn} × {Running, Stopped}. Flipping the turn is
//! only possible while running; stopping is allowed from either turn and
//! Stopped is terminal.

use serde::{Deserialize, Serialize};

use crate::types::ParticipantId;

/// Whether the chat is still exchanging turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liveness {
    Running,
    Stopped,
}

impl Liveness {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        }
    }
}

/// Snapshot of whose turn it is and whether the chat is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    active: ParticipantId,
    liveness: Liveness,
}

impl TurnState {
    /// A's turn, running.
    pub const fn new() -> Self {
        Self {
            active: ParticipantId::A,
            liveness: Liveness::Running,
        }
    }

    /// Participant currently authorized to send.
    pub fn active(&self) -> ParticipantId {
        self.active
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_running(&self) -> bool {
        self.liveness == Liveness::Running
    }

    pub fn is_turn_of(&self, id: ParticipantId) -> bool {
        self.active == id
    }

    /// Wake-up predicate for `id`: stopped, or `id` holds the turn.
    pub fn releases(&self, id: ParticipantId) -> bool {
        !self.is_running() || self.is_turn_of(id)
    }

    /// Hand the turn to the other participant.
    /// Returns false (and changes nothing) once stopped.
    pub fn flip(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.active = self.active.other();
        true
    }

    /// Move to Stopped. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.liveness = Liveness::Stopped;
        true
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_TURN/{}", self.active, self.liveness.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = TurnState::new();
        assert_eq!(state.active(), ParticipantId::A);
        assert!(state.is_running());
        assert_eq!(state.to_string(), "A_TURN/Running");
    }

    #[test]
    fn test_flip_alternates_while_running() {
        let mut state = TurnState::new();
        assert!(state.flip());
        assert_eq!(state.active(), ParticipantId::B);
        assert!(state.flip());
        assert_eq!(state.active(), ParticipantId::A);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let mut state = TurnState::new();
        state.flip();
        assert!(state.stop());
        assert!(!state.stop());
        assert!(!state.flip());
        assert_eq!(state.active(), ParticipantId::B);
        assert_eq!(state.liveness(), Liveness::Stopped);
    }

    #[test]
    fn test_releases_predicate() {
        let mut state = TurnState::new();
        assert!(state.releases(ParticipantId::A));
        assert!(!state.releases(ParticipantId::B));

        state.stop();
        assert!(state.releases(ParticipantId::A));
        assert!(state.releases(ParticipantId::B));
    }
}
