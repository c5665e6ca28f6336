//! Response Reader
//!
//! UCI has no framing and, for most commands, no terminator. Two strategies
//! decide when a response is complete:
//!
//! - **Quiescence polling** ([`drain`]): the response is over once the engine
//!   stays silent for a whole window. A heuristic: a slow engine can be cut
//!   off, and every read costs at least one window.
//! - **Predicate-gated listening** ([`wait_until`]): the response is over once
//!   the accumulated text satisfies a predicate, typically "contains the
//!   command's terminal token". Has no timeout; wrap it in
//!   `tokio::time::timeout` if you need a deadline.
//!
//! Both return raw text; interpreting it is up to the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::channel::{ProcessChannel, StreamEvent};
use crate::error::{Error, Result};

/// Predicate over the text accumulated so far
pub type ResponsePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// How a read decides that the engine is done answering
#[derive(Clone)]
pub enum EndCondition {
    /// Stop after one window with no new output
    Quiescence(Duration),
    /// Stop as soon as the predicate accepts the accumulated text
    Predicate(ResponsePredicate),
}

impl EndCondition {
    /// Quiescence window given in milliseconds
    pub fn window_ms(ms: u64) -> Self {
        EndCondition::Quiescence(Duration::from_millis(ms))
    }

    /// Predicate-gated end condition
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        EndCondition::Predicate(Arc::new(predicate))
    }

    /// Wait until the accumulated text contains `token`
    pub fn token(token: &'static str) -> Self {
        Self::predicate(move |text| text.contains(token))
    }
}

impl fmt::Debug for EndCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndCondition::Quiescence(window) => f.debug_tuple("Quiescence").field(window).finish(),
            EndCondition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Trim a raw response, mapping blank text to `None`
pub fn trim_response(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read until the engine has been silent for one `window`
///
/// Never fails: a dead or silent engine just produces `None`.
pub async fn drain(channel: &mut ProcessChannel, window: Duration) -> Option<String> {
    let mut buffer = String::new();

    loop {
        tokio::time::sleep(window).await;
        match channel.poll_available() {
            Some(chunk) => buffer.push_str(&chunk),
            None => break,
        }
    }

    trim_response(&buffer)
}

/// Read until `predicate` accepts the accumulated text
///
/// # Errors
///
/// Returns [`Error::UnexpectedTermination`] if the engine exits or its
/// output fails before the predicate matches.
pub async fn wait_until<P>(channel: &mut ProcessChannel, predicate: P) -> Result<String>
where
    P: Fn(&str) -> bool,
{
    let mut buffer = String::new();

    loop {
        match channel.next_event().await {
            StreamEvent::Output(chunk) => {
                buffer.push_str(&chunk);
                if predicate(&buffer) {
                    return Ok(buffer);
                }
            }
            StreamEvent::Error(reason) => {
                return Err(Error::UnexpectedTermination { reason });
            }
            StreamEvent::Exited => {
                return Err(Error::UnexpectedTermination {
                    reason: "engine exited".to_string(),
                });
            }
        }
    }
}

/// Read one response according to `end`, trimmed
pub async fn read(channel: &mut ProcessChannel, end: &EndCondition) -> Result<Option<String>> {
    match end {
        EndCondition::Quiescence(window) => Ok(drain(channel, *window).await),
        EndCondition::Predicate(predicate) => {
            let text = wait_until(channel, |text| predicate(text)).await?;
            Ok(trim_response(&text))
        }
    }
}
