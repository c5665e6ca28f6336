//! Process Channel
//!
//! Async-friendly duplex access to an engine process. Output is pumped by a
//! background task into an unbounded channel so it can be polled without
//! blocking; input is written straight to the child's stdin.

use crate::error::{Error, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

/// Items produced by the engine's output pump
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk of stdout text. Chunk boundaries carry no meaning.
    Output(String),
    /// Reading stdout failed
    Error(String),
    /// stdout reached EOF, i.e. the engine exited
    Exited,
}

/// Duplex byte stream to one engine process
pub struct ProcessChannel {
    /// Name used in log lines
    label: String,
    /// Engine stdin
    input: Box<dyn AsyncWrite + Send + Unpin>,
    /// Output chunks and termination signals from the pump task
    output_rx: UnboundedReceiver<StreamEvent>,
    /// The child, when this channel owns a real process
    child: Option<Child>,
    /// Set once a termination signal has been consumed
    terminated: Option<String>,
    stats: StreamStats,
}

impl ProcessChannel {
    /// Build a channel from an arbitrary writer and an event receiver
    ///
    /// Used for real processes by [`spawn_engine`](super::spawn_engine) and
    /// directly by tests that simulate an engine.
    pub fn from_parts<W>(
        label: impl Into<String>,
        input: W,
        output_rx: UnboundedReceiver<StreamEvent>,
    ) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            label: label.into(),
            input: Box::new(input),
            output_rx,
            child: None,
            terminated: None,
            stats: StreamStats::default(),
        }
    }

    pub(crate) fn with_child(mut self, child: Child) -> Self {
        self.child = Some(child);
        self
    }

    /// Label of the engine behind this channel
    pub fn label(&self) -> &str {
        &self.label
    }

    /// OS process id, if this channel owns a running child
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// I/O counters for this channel
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Reason the engine stopped, once a termination signal was seen
    pub fn termination(&self) -> Option<&str> {
        self.terminated.as_deref()
    }

    /// Write one protocol line; the newline terminator is appended here
    pub async fn write(&mut self, text: &str) -> Result<()> {
        let line = format!("{}\n", text);
        let result = async {
            self.input.write_all(line.as_bytes()).await?;
            self.input.flush().await
        }
        .await;

        match result {
            Ok(()) => {
                self.stats.bytes_written += line.len() as u64;
                self.stats.write_operations += 1;
                trace!("[{}] >> {}", self.label, text);
                Ok(())
            }
            Err(e) => {
                self.stats.write_errors += 1;
                warn!("[{}] write of '{}' failed: {}", self.label, text, e);
                Err(Error::WriteFailed {
                    command: text.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Take all output buffered so far without waiting
    ///
    /// Returns `None` if nothing is buffered. A termination signal found
    /// while polling is recorded and ends the poll.
    pub fn poll_available(&mut self) -> Option<String> {
        self.stats.poll_operations += 1;
        let mut text = String::new();

        loop {
            match self.output_rx.try_recv() {
                Ok(StreamEvent::Output(chunk)) => text.push_str(&chunk),
                Ok(StreamEvent::Error(reason)) => {
                    self.record_termination(reason);
                    break;
                }
                Ok(StreamEvent::Exited) => {
                    self.record_termination("engine exited".to_string());
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.record_termination("output stream closed".to_string());
                    break;
                }
            }
        }

        if text.is_empty() {
            None
        } else {
            self.stats.bytes_read += text.len() as u64;
            trace!("[{}] << {:?}", self.label, text);
            Some(text)
        }
    }

    /// Wait for the next output event
    ///
    /// Once the engine has terminated this keeps returning the termination
    /// event instead of blocking.
    pub async fn next_event(&mut self) -> StreamEvent {
        if let Some(reason) = &self.terminated {
            return StreamEvent::Error(reason.clone());
        }

        let event = self.output_rx.recv().await.unwrap_or(StreamEvent::Exited);
        match &event {
            StreamEvent::Output(chunk) => {
                self.stats.bytes_read += chunk.len() as u64;
                trace!("[{}] << {:?}", self.label, chunk);
            }
            StreamEvent::Error(reason) => self.record_termination(reason.clone()),
            StreamEvent::Exited => self.record_termination("engine exited".to_string()),
        }
        event
    }

    /// Kill the child process and reap it
    ///
    /// A no-op for channels that do not own a process.
    pub async fn terminate(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("[{}] engine already exited with {}", self.label, status);
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => warn!("[{}] failed to query engine status: {}", self.label, e),
        }

        child.kill().await?;
        debug!("[{}] engine process killed", self.label);
        Ok(())
    }

    fn record_termination(&mut self, reason: String) {
        if self.terminated.is_none() {
            debug!("[{}] output stream ended: {}", self.label, reason);
            self.terminated = Some(reason);
        }
    }
}

impl std::fmt::Debug for ProcessChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessChannel")
            .field("label", &self.label)
            .field("pid", &self.pid())
            .field("terminated", &self.terminated)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Stream statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    /// Total bytes read from the engine
    pub bytes_read: u64,
    /// Total bytes written to the engine
    pub bytes_written: u64,
    /// Number of successful writes
    pub write_operations: u64,
    /// Number of non-blocking polls
    pub poll_operations: u64,
    /// Number of failed writes
    pub write_errors: u64,
}
