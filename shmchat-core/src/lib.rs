//! shmchat Core Library
//!
//! Two chat participants taking turns over a single-slot shared memory
//! mailbox. Provides the turn arbiter, the mailbox and its envelope format,
//! the per-participant session loop, and configuration parsing.

pub mod arbiter;
pub mod config;
pub mod envelope;
pub mod error;
pub mod session;
pub mod shm;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use arbiter::TurnArbiter;
pub use config::{Config, ConfigLoader, MailboxConfig, SessionConfig};
pub use envelope::Envelope;
pub use error::{ChatError, ChatResult, EnvelopeError, HardValidationError, SharedMemoryError};
pub use session::{
    run_pair, BufReadSource, ChatSession, ExitReason, LineSink, LineSource, PairReport,
    SessionReport, WriteSink,
};
pub use shm::{Mailbox, OverflowPolicy, SharedMemoryRegion};
pub use state::{Liveness, TurnState};
pub use types::{Capacity, ParticipantId, ParticipantName, RegionName};
