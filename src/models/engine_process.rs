//! Engine Process Model
//!
//! Tracks the lifecycle of one engine session, from spawning the
//! subprocess through the UCI handshake to shutdown.

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of an engine session
///
/// Sessions only ever move forward through these states, except that
/// `Closed` is reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SessionState {
    /// Nothing has been spawned yet
    #[default]
    Created,
    /// The subprocess is running but no protocol traffic has happened
    ProcessSpawned,
    /// `uci` has been sent
    HandshakeSent,
    /// Handshake, readiness probe and option setup completed
    Ready,
    /// `quit` was sent and the process was terminated
    Closed,
}

impl SessionState {
    /// Whether a transition from `self` to `next` is allowed
    pub fn can_advance_to(self, next: SessionState) -> bool {
        next == SessionState::Closed || next > self && self != SessionState::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "Created",
            SessionState::ProcessSpawned => "ProcessSpawned",
            SessionState::HandshakeSent => "HandshakeSent",
            SessionState::Ready => "Ready",
            SessionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// Bookkeeping for a spawned engine process
#[derive(Debug, Clone)]
pub struct EngineProcess {
    /// OS process identifier
    pub pid: Option<u32>,

    /// Current session state
    pub state: SessionState,

    /// When the process was spawned
    pub start_time: Option<DateTime<Utc>>,

    /// When the session was closed
    pub end_time: Option<DateTime<Utc>>,

    /// Executable that was launched
    pub command: String,

    /// Arguments passed to the executable
    pub args: Vec<String>,
}

impl EngineProcess {
    /// Create a new record in the `Created` state
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self {
            pid: None,
            state: SessionState::Created,
            start_time: None,
            end_time: None,
            command,
            args,
        }
    }

    /// Mark the process as spawned with the given PID
    pub fn mark_spawned(&mut self, pid: Option<u32>) {
        self.pid = pid;
        self.start_time = Some(Utc::now());
        self.advance(SessionState::ProcessSpawned);
    }

    /// Mark the session closed
    pub fn mark_closed(&mut self) {
        self.end_time = Some(Utc::now());
        self.advance(SessionState::Closed);
    }

    /// Move to `next`, ignoring backwards transitions
    pub fn advance(&mut self, next: SessionState) {
        if self.state.can_advance_to(next) {
            trace!("Session '{}': {} -> {}", self.command, self.state, next);
            self.state = next;
        } else {
            warn!(
                "Session '{}': ignoring transition {} -> {}",
                self.command, self.state, next
            );
        }
    }

    /// Check if the session accepts protocol operations
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Check if the session has been closed
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// How long the session has been (or was) alive
    pub fn uptime(&self) -> Option<std::time::Duration> {
        let start = self.start_time?;
        let end = self.end_time.unwrap_or_else(Utc::now);
        end.signed_duration_since(start).to_std().ok()
    }
}

impl Default for EngineProcess {
    fn default() -> Self {
        Self::new(String::new(), Vec::new())
    }
}

impl fmt::Display for EngineProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pid = self.pid.map_or("N/A".to_string(), |pid| pid.to_string());
        write!(f, "{} [{}] - {}", self.command, pid, self.state)?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.join(" "))?;
        }
        Ok(())
    }
}
