// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! TurnArbiter - blocking turn-taking between two participants.
//!
//! All state changes happen under one mutex and are announced with
//! `notify_all`; waiters re-check their predicate after every wake.
//! `running` is mirrored into an atomic for lock-free liveness polling.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::state::TurnState;
use crate::types::ParticipantId;

/// Decides which participant may touch the mailbox.
///
/// Starts with A's turn. The only way out of `wait_for_turn` is the
/// predicate becoming true, either by `switch_turn` or by `stop`; no
/// timeout is applied.
#[derive(Debug)]
pub struct TurnArbiter {
    state: Mutex<TurnState>,
    turn_changed: Condvar,
    running: AtomicBool,
    switches: AtomicU64,
}

impl TurnArbiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TurnState::new()),
            turn_changed: Condvar::new(),
            running: AtomicBool::new(true),
            switches: AtomicU64::new(0),
        }
    }

    // TurnState is two Copy fields and every update is a single assignment,
    // so a panic elsewhere can't leave it inconsistent.
    fn lock(&self) -> MutexGuard<'_, TurnState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until it is `id`'s turn or the arbiter is stopped.
    pub fn wait_for_turn(&self, id: ParticipantId) {
        let guard = self.lock();
        let guard = self
            .turn_changed
            .wait_while(guard, |state| !state.releases(id))
            .unwrap_or_else(PoisonError::into_inner);
        tracing::trace!(participant = %id, running = guard.is_running(), "Turn acquired");
    }

    /// Hand the turn to the other participant and wake all waiters.
    /// Ignored once stopped.
    pub fn switch_turn(&self) {
        let mut state = self.lock();
        if state.flip() {
            self.switches.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(active = %state.active(), "Turn switched");
        }
        self.turn_changed.notify_all();
    }

    /// Stop the chat and release every pending and future waiter.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.stop() {
            tracing::debug!(active = %state.active(), "Arbiter stopped");
        }
        self.running.store(false, Ordering::Release);
        self.turn_changed.notify_all();
    }

    /// Lock-free liveness check.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_turn_of(&self, id: ParticipantId) -> bool {
        self.lock().is_turn_of(id)
    }

    pub fn active(&self) -> ParticipantId {
        self.lock().active()
    }

    pub fn snapshot(&self) -> TurnState {
        *self.lock()
    }

    /// Number of effective turn flips so far.
    pub fn switch_count(&self) -> u64 {
        self.switches.load(Ordering::Relaxed)
    }
}

impl Default for TurnArbiter {
    fn default() -> Self {
        Self::new()
    }
}
