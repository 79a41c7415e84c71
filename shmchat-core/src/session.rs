// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-participant session loop.
//!
//! Each iteration: wait for the turn, show whatever is in the mailbox, send
//! one line if this side holds the turn, then pass the turn on. The turn is
//! passed on every iteration, whether or not a line was sent.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::arbiter::TurnArbiter;
use crate::config::SessionConfig;
use crate::envelope::Envelope;
use crate::error::{ChatError, ChatResult, SharedMemoryError};
use crate::shm::Mailbox;
use crate::types::{ParticipantId, ParticipantName};

/// Supplies one line of text per sending turn.
pub trait LineSource {
    /// `Ok(None)` means the input is exhausted.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Receives everything a participant displays.
pub trait LineSink {
    /// Shown before reading a line: `"<Sender>: "`.
    fn prompt(&mut self, sender: &ParticipantName);

    /// A message found in the mailbox: `"<Reader> read <Sender>: \"<text>\""`.
    fn received(&mut self, reader: &ParticipantName, envelope: &Envelope);

    /// The mailbox refused the line.
    fn rejected(&mut self, _sender: &ParticipantName, _error: &SharedMemoryError) {}
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

impl<T: LineSink + ?Sized> LineSink for &mut T {
    fn prompt(&mut self, sender: &ParticipantName) {
        (**self).prompt(sender)
    }

    fn received(&mut self, reader: &ParticipantName, envelope: &Envelope) {
        (**self).received(reader, envelope)
    }

    fn rejected(&mut self, sender: &ParticipantName, error: &SharedMemoryError) {
        (**self).rejected(sender, error)
    }
}

/// Line source over any buffered reader. Line endings are stripped.
pub struct BufReadSource<R> {
    reader: R,
}

impl<R: BufRead> BufReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for BufReadSource<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}

/// Remove one trailing `\n` or `\r\n`.
pub fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Line sink that formats onto any writer.
pub struct WriteSink<W> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        let result = self
            .writer
            .write_fmt(args)
            .and_then(|_| self.writer.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write chat output");
        }
    }
}

impl<W: Write> LineSink for WriteSink<W> {
    fn prompt(&mut self, sender: &ParticipantName) {
        self.emit(format_args!("{}: ", sender));
    }

    fn received(&mut self, reader: &ParticipantName, envelope: &Envelope) {
        self.emit(format_args!(
            "{} read {}: \"{}\"\n",
            reader, envelope.sender, envelope.text
        ));
    }

    fn rejected(&mut self, sender: &ParticipantName, error: &SharedMemoryError) {
        self.emit(format_args!("{}: message not sent - {}\n", sender, error));
    }
}

/// Why a session loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// This participant typed the exit command.
    Sentinel,
    /// This participant's input ran out.
    EndOfInput,
    /// The arbiter was stopped by someone else.
    PeerStopped,
    /// Reading input failed; the chat was stopped.
    InputError(String),
}

/// What one participant did during the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub participant: ParticipantId,
    pub name: String,
    pub sent: u64,
    pub received: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub exit_reason: ExitReason,
}

/// Reports for both sides of a finished chat.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub a: SessionReport,
    pub b: SessionReport,
    pub turn_switches: u64,
}

/// Stops the arbiter when a session ends, however it ends, so the peer is
/// never left waiting for a turn that will not come.
struct StopOnDrop<'a>(&'a TurnArbiter);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

#[derive(Debug, Default)]
struct Counters {
    sent: u64,
    received: u64,
    skipped: u64,
    rejected: u64,
}

/// One participant's side of the chat.
pub struct ChatSession {
    id: ParticipantId,
    name: ParticipantName,
    exit_command: String,
    yield_delay: Duration,
    arbiter: Arc<TurnArbiter>,
    mailbox: Arc<Mailbox>,
}

impl ChatSession {
    pub fn new(
        id: ParticipantId,
        config: &SessionConfig,
        arbiter: Arc<TurnArbiter>,
        mailbox: Arc<Mailbox>,
    ) -> Self {
        Self {
            id,
            name: config.name_of(id).clone(),
            exit_command: config.exit_command.clone(),
            yield_delay: config.yield_delay,
            arbiter,
            mailbox,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &ParticipantName {
        &self.name
    }

    /// Drive this participant until the chat stops.
    pub fn run<S, O>(&self, source: &mut S, sink: &mut O) -> SessionReport
    where
        S: LineSource + ?Sized,
        O: LineSink + ?Sized,
    {
        let _stop = StopOnDrop(&self.arbiter);
        let mut counters = Counters::default();

        tracing::info!(participant = %self.id, name = %self.name, "Session started");

        let exit_reason = loop {
            if !self.arbiter.is_running() {
                break ExitReason::PeerStopped;
            }

            self.arbiter.wait_for_turn(self.id);
            if !self.arbiter.is_running() {
                break ExitReason::PeerStopped;
            }

            self.deliver(sink, &mut counters);

            if self.arbiter.is_turn_of(self.id) {
                if let Some(reason) = self.send(source, sink, &mut counters) {
                    break reason;
                }
            }

            self.arbiter.switch_turn();
            if !self.yield_delay.is_zero() {
                thread::sleep(self.yield_delay);
            }
        };

        tracing::info!(
            participant = %self.id,
            reason = ?exit_reason,
            sent = counters.sent,
            received = counters.received,
            "Session finished"
        );

        SessionReport {
            participant: self.id,
            name: self.name.to_string(),
            sent: counters.sent,
            received: counters.received,
            skipped: counters.skipped,
            rejected: counters.rejected,
            exit_reason,
        }
    }

    /// Show the current mailbox content, if it parses.
    fn deliver<O: LineSink + ?Sized>(&self, sink: &mut O, counters: &mut Counters) {
        // SAFETY: only called between wait_for_turn and switch_turn, and the
        // peer touches the mailbox only while it holds the turn.
        let raw = unsafe { self.mailbox.read() };
        if raw.is_empty() {
            return;
        }

        match Envelope::parse(&raw) {
            Ok(envelope) => {
                sink.received(&self.name, &envelope);
                counters.received += 1;
            }
            Err(e) => {
                tracing::debug!(participant = %self.id, error = %e, "Skipping malformed envelope");
                counters.skipped += 1;
            }
        }
    }

    /// Read one line and post it. Returns the exit reason if the loop must end.
    fn send<S, O>(&self, source: &mut S, sink: &mut O, counters: &mut Counters) -> Option<ExitReason>
    where
        S: LineSource + ?Sized,
        O: LineSink + ?Sized,
    {
        sink.prompt(&self.name);

        let line = match source.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.arbiter.stop();
                return Some(ExitReason::EndOfInput);
            }
            Err(e) => {
                tracing::warn!(participant = %self.id, error = %e, "Input failed, stopping chat");
                self.arbiter.stop();
                return Some(ExitReason::InputError(e.to_string()));
            }
        };

        if line == self.exit_command {
            self.arbiter.stop();
            return Some(ExitReason::Sentinel);
        }

        let message = Envelope::encode(self.name.as_str(), &line);
        // SAFETY: the caller checked is_turn_of(self.id) and the turn is not
        // switched until this returns.
        match unsafe { self.mailbox.write(&message) } {
            Ok(_) => counters.sent += 1,
            Err(e) => {
                tracing::warn!(participant = %self.id, error = %e, "Message rejected by mailbox");
                sink.rejected(&self.name, &e);
                counters.rejected += 1;
            }
        }
        None
    }
}

/// Run both participants on their own threads until the chat stops.
///
/// `io` holds the (source, sink) pair for A and B, in that order. The
/// arbiter is passed in so the caller can `stop()` the chat from outside,
/// e.g. on a termination signal.
pub fn run_pair<S, O>(
    config: &SessionConfig,
    arbiter: Arc<TurnArbiter>,
    mailbox: Arc<Mailbox>,
    io: [(S, O); 2],
) -> ChatResult<PairReport>
where
    S: LineSource + Send,
    O: LineSink + Send,
{
    let [io_a, io_b] = io;

    let (a, b) = thread::scope(|scope| -> ChatResult<_> {
        let spawn = |id: ParticipantId, (mut source, mut sink): (S, O)| {
            let session = ChatSession::new(id, config, Arc::clone(&arbiter), Arc::clone(&mailbox));
            thread::Builder::new()
                .name(format!("chat-{}", session.name()))
                .spawn_scoped(scope, move || session.run(&mut source, &mut sink))
                .map_err(|e| ChatError::Io {
                    context: "spawning participant thread",
                    source: e,
                })
        };

        let handle_a = spawn(ParticipantId::A, io_a)?;
        let handle_b = match spawn(ParticipantId::B, io_b) {
            Ok(handle) => handle,
            Err(e) => {
                // Release A before the scope joins it
                arbiter.stop();
                return Err(e);
            }
        };

        let a = handle_a.join().unwrap_or_else(|p| std::panic::resume_unwind(p));
        let b = handle_b.join().unwrap_or_else(|p| std::panic::resume_unwind(p));
        Ok((a, b))
    })?;

    Ok(PairReport {
        a,
        b,
        turn_switches: arbiter.switch_count(),
    })
}
