//! Command dispatch
//!
//! Turns a command name plus ordered parameters into one protocol line,
//! writes it, and reads the answer with the requested end condition.
//!
//! UCI does not support pipelining: every write must be followed by its
//! read before the next write. [`Dispatcher::command`] takes `&mut self`, so
//! one session can never have two commands in flight.

use std::fmt;
use std::time::Duration;

use crate::config::DEFAULT_WINDOW_MS;
use crate::error::Result;
use crate::process::{self, EndCondition, ProcessChannel};

/// Protocol vocabulary sent to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UciCommand {
    Uci,
    IsReady,
    SetOption,
    NewGame,
    /// Board dump (Stockfish extension)
    Board,
    /// Static evaluation (Stockfish extension)
    Eval,
    Position,
    Go,
    Stop,
    PonderHit,
    Quit,
}

impl UciCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            UciCommand::Uci => "uci",
            UciCommand::IsReady => "isready",
            UciCommand::SetOption => "setoption",
            UciCommand::NewGame => "ucinewgame",
            UciCommand::Board => "d",
            UciCommand::Eval => "eval",
            UciCommand::Position => "position",
            UciCommand::Go => "go",
            UciCommand::Stop => "stop",
            UciCommand::PonderHit => "ponderhit",
            UciCommand::Quit => "quit",
        }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters and end condition of one command
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Tokens following the command name
    pub params: Vec<String>,
    /// How to read the answer; `None` uses the dispatcher's default window
    pub end: Option<EndCondition>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn end(mut self, end: EndCondition) -> Self {
        self.end = Some(end);
        self
    }

    pub fn window(self, window: Duration) -> Self {
        self.end(EndCondition::Quiescence(window))
    }
}

/// Protocol line for a command: the name, then the space-joined params
pub fn format_message(command: UciCommand, params: &[String]) -> String {
    if params.is_empty() {
        command.as_str().to_string()
    } else {
        format!("{} {}", command, params.join(" "))
    }
}

/// `setoption` params for a valued option
pub fn option_params(key: &str, value: &impl fmt::Display) -> Vec<String> {
    vec![format!("name {}", key), format!("value {}", value)]
}

/// Writes commands and reads their answers over one channel
#[derive(Debug)]
pub struct Dispatcher {
    channel: ProcessChannel,
    default_window: Duration,
}

impl Dispatcher {
    pub fn new(channel: ProcessChannel) -> Self {
        Self::with_default_window(channel, Duration::from_millis(DEFAULT_WINDOW_MS))
    }

    pub fn with_default_window(channel: ProcessChannel, default_window: Duration) -> Self {
        Self {
            channel,
            default_window,
        }
    }

    pub fn default_window(&self) -> Duration {
        self.default_window
    }

    pub fn channel(&self) -> &ProcessChannel {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut ProcessChannel {
        &mut self.channel
    }

    /// Send one command and read its answer
    ///
    /// Returns the trimmed answer, or `None` if the engine said nothing.
    ///
    /// # Errors
    ///
    /// [`Error::WriteFailed`](crate::Error::WriteFailed) if the line cannot
    /// be written; [`Error::UnexpectedTermination`](crate::Error::UnexpectedTermination)
    /// if a predicate-gated read sees the engine exit. Quiescence reads never
    /// fail.
    pub async fn command(
        &mut self,
        command: UciCommand,
        options: CommandOptions,
    ) -> Result<Option<String>> {
        let message = format_message(command, &options.params);
        let end = options
            .end
            .unwrap_or(EndCondition::Quiescence(self.default_window));

        debug!("[{}] {} ({:?})", self.channel.label(), message, end);
        self.channel.write(&message).await?;
        self.read(&end).await
    }

    /// Read without writing anything first
    pub async fn read(&mut self, end: &EndCondition) -> Result<Option<String>> {
        process::read(&mut self.channel, end).await
    }

    /// Consume the dispatcher, handing back its channel
    pub fn into_channel(self) -> ProcessChannel {
        self.channel
    }
}
