// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Termination signal handling for `shmchat run`.
//!
//! Without a handler, Ctrl+C or SIGTERM ends the process before any
//! destructor runs and the region name stays linked. A watcher thread waits
//! for either signal on a current-thread tokio runtime, stops the arbiter,
//! unlinks the region and exits. The participant holding the turn may be
//! blocked on stdin, so the process exits instead of joining it.

use std::io;
use std::process;
use std::sync::Arc;
use std::thread;

use shmchat_core::{RegionName, SharedMemoryRegion, TurnArbiter};
use tokio::signal::unix::{signal, SignalKind};

/// 128 + signal number, as shells report it.
const SIGINT_EXIT_CODE: i32 = 130;
const SIGTERM_EXIT_CODE: i32 = 143;

/// Install SIGINT/SIGTERM handlers and spawn the thread that acts on them.
///
/// Both handlers are registered before this returns.
pub fn watch(arbiter: Arc<TurnArbiter>, region: RegionName) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (mut interrupt, mut terminate) = {
        let _guard = runtime.enter();
        (
            signal(SignalKind::interrupt())?,
            signal(SignalKind::terminate())?,
        )
    };

    thread::Builder::new()
        .name("shutdown".to_string())
        .spawn(move || {
            let (name, code) = runtime.block_on(async {
                tokio::select! {
                    _ = interrupt.recv() => ("SIGINT", SIGINT_EXIT_CODE),
                    _ = terminate.recv() => ("SIGTERM", SIGTERM_EXIT_CODE),
                }
            });

            tracing::info!(signal = name, "Received termination signal");
            release(&arbiter, &region);
            eprintln!();
            eprintln!("Interrupted.");
            process::exit(code);
        })?;

    Ok(())
}

/// Stop the chat and remove the region name.
fn release(arbiter: &TurnArbiter, region: &RegionName) {
    arbiter.stop();
    if let Err(e) = SharedMemoryRegion::unlink(region.as_str()) {
        tracing::warn!(region = %region, error = %e, "Failed to unlink region");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shmchat_core::{Capacity, Mailbox, OverflowPolicy, ParticipantId};

    #[test]
    fn test_release_stops_arbiter_and_unlinks_region() {
        let region = RegionName::new(format!("shmchat-cli-release-{}", std::process::id())).unwrap();
        let mailbox = Mailbox::create(&region, Capacity::default(), OverflowPolicy::Reject).unwrap();
        let arbiter = TurnArbiter::new();

        release(&arbiter, &region);

        assert!(!arbiter.is_running());
        // B would otherwise block forever on A's turn
        arbiter.wait_for_turn(ParticipantId::B);
        assert!(Mailbox::open(&region, Capacity::default(), OverflowPolicy::Reject).is_err());

        // Owner's later unlink finds the name already gone
        drop(mailbox);
    }

    #[test]
    fn test_watch_installs_handlers() {
        let region = RegionName::new(format!("shmchat-cli-watch-{}", std::process::id())).unwrap();
        watch(Arc::new(TurnArbiter::new()), region).unwrap();
    }
}
