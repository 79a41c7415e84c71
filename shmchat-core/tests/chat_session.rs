// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end chat tests.
//!
//! Both participants run on real threads over a real shared memory region,
//! with scripted input and a shared transcript to observe the interleaving.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shmchat_core::{
    run_pair, Capacity, ConfigLoader, Envelope, ExitReason, LineSink, LineSource, Mailbox,
    OverflowPolicy, ParticipantName, RegionName, SessionConfig, SharedMemoryError, TurnArbiter,
};

struct Script(VecDeque<String>);

impl Script {
    fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| l.to_string()).collect())
    }
}

impl LineSource for Script {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.0.pop_front())
    }
}

/// Sink shared by both participants; records events in global order.
#[derive(Clone, Default)]
struct SharedTranscript(Arc<Mutex<Vec<String>>>);

impl SharedTranscript {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl LineSink for SharedTranscript {
    fn prompt(&mut self, sender: &ParticipantName) {
        self.0.lock().unwrap().push(format!("{}: ", sender));
    }

    fn received(&mut self, reader: &ParticipantName, envelope: &Envelope) {
        self.0.lock().unwrap().push(format!(
            "{} read {}: \"{}\"",
            reader, envelope.sender, envelope.text
        ));
    }

    fn rejected(&mut self, sender: &ParticipantName, error: &SharedMemoryError) {
        self.0
            .lock()
            .unwrap()
            .push(format!("{} rejected: {}", sender, error));
    }
}

fn session_config() -> SessionConfig {
    let mut config = ConfigLoader::load_string("").unwrap().session;
    config.yield_delay = Duration::from_millis(1);
    config
}

fn mailbox(tag: &str, capacity: usize, policy: OverflowPolicy) -> Arc<Mailbox> {
    let name = RegionName::new(format!("shmchat-it-{}-{}", tag, std::process::id())).unwrap();
    Arc::new(Mailbox::create(&name, Capacity::new(capacity).unwrap(), policy).unwrap())
}

#[test]
fn test_hello_then_exit_scenario() {
    let transcript = SharedTranscript::default();
    let mb = mailbox("scenario", 1024, OverflowPolicy::Reject);

    let report = run_pair(
        &session_config(),
        Arc::new(TurnArbiter::new()),
        Arc::clone(&mb),
        [
            (Script::new(&["hello", "never sent"]), transcript.clone()),
            (Script::new(&["exit"]), transcript.clone()),
        ],
    )
    .unwrap();

    assert_eq!(
        transcript.lines(),
        vec![
            "Chat1: ",
            "Chat2 read Chat1: \"hello\"",
            "Chat2: ",
        ]
    );
    assert_eq!(report.a.exit_reason, ExitReason::PeerStopped);
    assert_eq!(report.a.sent, 1);
    assert_eq!(report.b.exit_reason, ExitReason::Sentinel);
    // A wrote nothing after B stopped the chat
    // SAFETY: both participants have been joined
    assert_eq!(unsafe { mb.read() }, "Chat1: hello");
}

#[test]
fn test_turns_alternate_every_iteration() {
    let transcript = SharedTranscript::default();

    let report = run_pair(
        &session_config(),
        Arc::new(TurnArbiter::new()),
        mailbox("alternation", 1024, OverflowPolicy::Reject),
        [
            (Script::new(&["a1", "a2", "exit"]), transcript.clone()),
            (Script::new(&["b1", "b2"]), transcript.clone()),
        ],
    )
    .unwrap();

    assert_eq!(
        transcript.lines(),
        vec![
            "Chat1: ",
            "Chat2 read Chat1: \"a1\"",
            "Chat2: ",
            "Chat1 read Chat2: \"b1\"",
            "Chat1: ",
            "Chat2 read Chat1: \"a2\"",
            "Chat2: ",
            "Chat1 read Chat2: \"b2\"",
            "Chat1: ",
        ]
    );
    assert_eq!(report.turn_switches, 4);
    assert_eq!((report.a.sent, report.b.sent), (2, 2));
    assert_eq!((report.a.received, report.b.received), (2, 2));
}

#[test]
fn test_end_of_input_stops_both_sides() {
    let transcript = SharedTranscript::default();

    let report = run_pair(
        &session_config(),
        Arc::new(TurnArbiter::new()),
        mailbox("eof", 1024, OverflowPolicy::Reject),
        [
            (Script::new(&["only line"]), transcript.clone()),
            (Script::new(&[]), transcript.clone()),
        ],
    )
    .unwrap();

    assert_eq!(report.b.exit_reason, ExitReason::EndOfInput);
    assert_eq!(report.a.exit_reason, ExitReason::PeerStopped);
}

#[test]
fn test_rejected_message_still_passes_turn() {
    let transcript = SharedTranscript::default();
    // "Chat1: " is 7 bytes; capacity 16 leaves room for 8 bytes of text
    let long = "x".repeat(32);

    let report = run_pair(
        &session_config(),
        Arc::new(TurnArbiter::new()),
        mailbox("reject", 16, OverflowPolicy::Reject),
        [
            (Script::new(&[long.as_str(), "exit"]), transcript.clone()),
            (Script::new(&["ok"]), transcript.clone()),
        ],
    )
    .unwrap();

    let lines = transcript.lines();
    assert_eq!(lines[0], "Chat1: ");
    assert!(lines[1].starts_with("Chat1 rejected: Payload size exceeds maximum"));
    // Nothing to read for B, so B goes straight to its prompt
    assert_eq!(lines[2], "Chat2: ");
    assert_eq!(lines[3], "Chat1 read Chat2: \"ok\"");
    assert_eq!(report.a.rejected, 1);
    assert_eq!(report.b.received, 0);
}

#[test]
fn test_truncating_mailbox_delivers_prefix() {
    let transcript = SharedTranscript::default();

    run_pair(
        &session_config(),
        Arc::new(TurnArbiter::new()),
        mailbox("truncate", 16, OverflowPolicy::Truncate),
        [
            (Script::new(&["abcdefghijklmnop"]), transcript.clone()),
            (Script::new(&["exit"]), transcript.clone()),
        ],
    )
    .unwrap();

    // 15 usable bytes: "Chat1: " + 8 chars
    assert_eq!(transcript.lines()[1], "Chat2 read Chat1: \"abcdefgh\"");
}

#[test]
fn test_session_after_leaked_region_starts_clean() {
    let name = RegionName::new(format!("shmchat-it-leaked-{}", std::process::id())).unwrap();
    let capacity = Capacity::default();

    // A previous run that was killed before its destructor ran
    let leaked = Mailbox::create(&name, capacity, OverflowPolicy::Reject).unwrap();
    // SAFETY: not shared with any session
    unsafe { leaked.write("Chat2: from a dead session") }.unwrap();
    std::mem::forget(leaked);

    let mb = Arc::new(Mailbox::create(&name, capacity, OverflowPolicy::Reject).unwrap());
    assert!(mb.is_owner());

    let transcript = SharedTranscript::default();
    run_pair(
        &session_config(),
        Arc::new(TurnArbiter::new()),
        Arc::clone(&mb),
        [
            (Script::new(&["exit"]), transcript.clone()),
            (Script::new(&[]), transcript.clone()),
        ],
    )
    .unwrap();

    // A's first read found nothing to show
    assert_eq!(transcript.lines(), vec!["Chat1: "]);

    drop(mb);
    assert!(Mailbox::open(&name, capacity, OverflowPolicy::Reject).is_err());
}
