//! Protocol client
//!
//! [`Engine`] is one UCI session: it spawns the engine, runs the handshake,
//! and exposes typed operations that translate to commands and parse the
//! answers.
//!
//! Every operation takes `&mut self`, so a session handles one request at a
//! time. Separate `Engine` values are fully independent and may be driven
//! concurrently, e.g. with `tokio::join!`.
//!
//! Reads that rely on a terminal token (`wait_ready`,
//! `search_until_best_move`, and the handshake with
//! [`ReadStrategy::TerminalToken`]) have no timeout. Wrap them in
//! `tokio::time::timeout` when a deadline is needed.

use std::time::Duration;

use crate::commands::{option_params, CommandOptions, Dispatcher, UciCommand};
use crate::config::{EngineConfig, OptionMap, OptionValue, ReadStrategy};
use crate::error::{Error, Result};
use crate::models::{EngineProcess, SessionState};
use crate::params::{to_tokens, GoParams, Param, PositionParams};
use crate::parse::{self, BestMove, EngineInfo};
use crate::process::{spawn_engine, EndCondition, ProcessChannel};

/// A running UCI engine session
#[derive(Debug)]
pub struct Engine {
    process: EngineProcess,
    dispatcher: Dispatcher,
    handshake: ReadStrategy,
    search_window: Duration,
    info: EngineInfo,
}

impl Engine {
    /// Spawn the configured engine and bring it to the `Ready` state
    ///
    /// # Errors
    ///
    /// [`Error::ConfigInvalid`] for a bad config, [`Error::SpawnFailed`] if
    /// the executable cannot be started, and any error of the handshake
    /// commands.
    pub async fn init(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let (process, channel) = spawn_engine(&config.engine).await?;
        Self::start(process, channel, config).await
    }

    /// [`init`](Self::init) with the default configuration
    pub async fn init_default() -> Result<Self> {
        Self::init(&EngineConfig::default()).await
    }

    /// Run the handshake over an existing channel
    ///
    /// `config.engine` is ignored; the channel is already connected.
    pub async fn from_channel(channel: ProcessChannel, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut process = EngineProcess::new(channel.label().to_string(), Vec::new());
        process.mark_spawned(channel.pid());
        Self::start(process, channel, config).await
    }

    async fn start(
        process: EngineProcess,
        channel: ProcessChannel,
        config: &EngineConfig,
    ) -> Result<Self> {
        let mut engine = Self {
            process,
            dispatcher: Dispatcher::with_default_window(channel, config.timing.command_window()),
            handshake: config.handshake,
            search_window: config.timing.search_window(),
            info: EngineInfo::default(),
        };

        if let Err(e) = engine.initialize(config.option_map()).await {
            error!("Engine '{}' failed to initialize: {}", engine.label(), e);
            engine.shutdown_process().await;
            return Err(e);
        }
        Ok(engine)
    }

    /// Handshake: banner, `uci`, readiness, `ucinewgame`, options
    async fn initialize(&mut self, options: OptionMap) -> Result<()> {
        let window = EndCondition::Quiescence(self.dispatcher.default_window());

        if let Some(banner) = self.dispatcher.read(&window).await? {
            debug!("[{}] banner: {}", self.label(), banner);
        }

        let uci_end = match self.handshake {
            ReadStrategy::TerminalToken => EndCondition::predicate(parse::uci_end),
            ReadStrategy::Quiescence => window.clone(),
        };
        let response = self
            .dispatcher
            .command(UciCommand::Uci, CommandOptions::new().end(uci_end))
            .await?;
        self.process.advance(SessionState::HandshakeSent);
        self.info = response.as_deref().map(parse::parse_engine_info).unwrap_or_default();

        self.await_readiness(self.handshake).await?;
        self.dispatcher.command(UciCommand::NewGame, CommandOptions::new()).await?;

        for (key, value) in options.sendable() {
            self.send_option(key, value).await?;
        }

        if let Some(trailing) = self.dispatcher.read(&window).await? {
            debug!("[{}] trailing output after setup: {}", self.label(), trailing);
        }

        self.process.advance(SessionState::Ready);
        info!(
            "Engine '{}' ready ({})",
            self.label(),
            self.info.name.as_deref().unwrap_or("unnamed engine")
        );
        Ok(())
    }

    async fn await_readiness(&mut self, strategy: ReadStrategy) -> Result<()> {
        match strategy {
            ReadStrategy::TerminalToken => {
                let end = EndCondition::predicate(parse::ready_end);
                self.dispatcher
                    .command(UciCommand::IsReady, CommandOptions::new().end(end))
                    .await?;
            }
            ReadStrategy::Quiescence => {
                // Unbounded: only a write failure ends this loop early
                let mut attempts = 0u64;
                loop {
                    attempts += 1;
                    let response = self
                        .dispatcher
                        .command(UciCommand::IsReady, CommandOptions::new())
                        .await?;
                    if parse::is_readyok(response.as_deref()) {
                        break;
                    }
                    trace!(
                        "[{}] readiness probe {} answered {:?}",
                        self.label(),
                        attempts,
                        response
                    );
                }
                debug!("[{}] ready after {} probe(s)", self.label(), attempts);
            }
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.process.is_ready() {
            Ok(())
        } else {
            Err(Error::NotReady {
                state: self.process.state,
            })
        }
    }

    async fn send_option(&mut self, key: &str, value: &OptionValue) -> Result<Option<String>> {
        let options = CommandOptions::new().params(option_params(key, value));
        self.dispatcher.command(UciCommand::SetOption, options).await
    }

    async fn simple(&mut self, command: UciCommand) -> Result<Option<String>> {
        self.ensure_ready()?;
        self.dispatcher.command(command, CommandOptions::new()).await
    }

    /// Name used in logs (the executable path)
    pub fn label(&self) -> &str {
        self.dispatcher.channel().label()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.process.state
    }

    /// Process bookkeeping (pid, start time, ...)
    pub fn process(&self) -> &EngineProcess {
        &self.process
    }

    /// Identification sent during the handshake
    pub fn engine_info(&self) -> &EngineInfo {
        &self.info
    }

    /// Re-run `uci`, returning the raw answer and refreshing
    /// [`engine_info`](Self::engine_info)
    pub async fn uci(&mut self) -> Result<Option<String>> {
        self.ensure_ready()?;
        let end = match self.handshake {
            ReadStrategy::TerminalToken => EndCondition::predicate(parse::uci_end),
            ReadStrategy::Quiescence => EndCondition::Quiescence(self.dispatcher.default_window()),
        };
        let response = self
            .dispatcher
            .command(UciCommand::Uci, CommandOptions::new().end(end))
            .await?;
        if let Some(text) = &response {
            self.info = parse::parse_engine_info(text);
        }
        Ok(response)
    }

    /// Probe readiness; true iff the engine answered exactly `readyok`
    /// within one quiet window
    pub async fn is_ready(&mut self) -> Result<bool> {
        let response = self.simple(UciCommand::IsReady).await?;
        Ok(parse::is_readyok(response.as_deref()))
    }

    /// Block until the engine answers `readyok`
    pub async fn wait_ready(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.await_readiness(ReadStrategy::TerminalToken).await
    }

    /// `ucinewgame`
    pub async fn new_game(&mut self) -> Result<Option<String>> {
        self.simple(UciCommand::NewGame).await
    }

    /// Raw board dump (`d`)
    pub async fn board(&mut self) -> Result<Option<String>> {
        self.simple(UciCommand::Board).await
    }

    /// Raw static evaluation (`eval`)
    pub async fn eval(&mut self) -> Result<Option<String>> {
        self.simple(UciCommand::Eval).await
    }

    /// FEN of the current position, taken from the board dump
    pub async fn fen(&mut self) -> Result<Option<String>> {
        let board = self.board().await?;
        Ok(board.as_deref().and_then(parse::parse_fen))
    }

    /// `setoption name <key> value <value>`
    ///
    /// Triggers and empty strings are not sent at all; use
    /// [`trigger_option`](Self::trigger_option) for button options.
    pub async fn set_option(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<()> {
        self.ensure_ready()?;
        let value = value.into();
        if value.is_sendable() {
            self.send_option(key, &value).await?;
        } else {
            trace!("[{}] not sending option '{}' without a value", self.label(), key);
        }
        Ok(())
    }

    /// `setoption name <key>`, for button options such as `Clear Hash`
    pub async fn trigger_option(&mut self, key: &str) -> Result<()> {
        self.ensure_ready()?;
        let options = CommandOptions::new().params([format!("name {}", key)]);
        self.dispatcher.command(UciCommand::SetOption, options).await?;
        Ok(())
    }

    /// `go` with quiescence reading; returns the raw analysis text
    ///
    /// `window` defaults to the configured search window (100ms).
    pub async fn search(
        &mut self,
        params: &GoParams,
        window: Option<Duration>,
    ) -> Result<Option<String>> {
        self.search_with(&params.to_params(), window).await
    }

    /// `go` with arbitrary tagged parameters
    pub async fn search_with(
        &mut self,
        params: &[Param],
        window: Option<Duration>,
    ) -> Result<Option<String>> {
        self.ensure_ready()?;
        let options = CommandOptions::new()
            .params(to_tokens(params))
            .window(window.unwrap_or(self.search_window));
        self.dispatcher.command(UciCommand::Go, options).await
    }

    /// Best move of a quiescence-read search
    ///
    /// `None` if the search produced no `bestmove` line within the window
    /// or the engine has no move.
    pub async fn best_move(
        &mut self,
        params: &GoParams,
        window: Option<Duration>,
    ) -> Result<Option<String>> {
        Ok(self.best_move_with_ponder(params, window).await?.map(|best| best.mv))
    }

    /// Like [`best_move`](Self::best_move), keeping the ponder move
    pub async fn best_move_with_ponder(
        &mut self,
        params: &GoParams,
        window: Option<Duration>,
    ) -> Result<Option<BestMove>> {
        let response = self.search(params, window).await?;
        Ok(response.as_deref().and_then(parse::parse_best_move))
    }

    /// `go`, reading until the `bestmove` line arrives
    ///
    /// With `infinite` or `ponder` this only returns once the engine stops
    /// on its own, since `stop` cannot be sent while the read is pending.
    pub async fn search_until_best_move(&mut self, params: &GoParams) -> Result<Option<BestMove>> {
        self.ensure_ready()?;
        let options = CommandOptions::new()
            .params(params.to_tokens())
            .end(EndCondition::predicate(parse::bestmove_end));
        let response = self.dispatcher.command(UciCommand::Go, options).await?;
        Ok(response.as_deref().and_then(parse::parse_best_move))
    }

    /// `position startpos|fen <F> [moves ...]`
    pub async fn set_position(&mut self, params: &PositionParams) -> Result<Option<String>> {
        self.ensure_ready()?;
        let options = CommandOptions::new().params(params.to_tokens());
        self.dispatcher.command(UciCommand::Position, options).await
    }

    /// Play `mv` from the current position
    ///
    /// Reads the FEN from the board dump and sets `position fen <F> moves
    /// <mv>`. Returns false (and sends nothing) when no FEN is available.
    /// Legality is the engine's business.
    pub async fn apply_move(&mut self, mv: &str) -> Result<bool> {
        let Some(fen) = self.fen().await? else {
            return Ok(false);
        };
        self.set_position(&PositionParams::fen(fen).with_moves([mv])).await?;
        Ok(true)
    }

    /// `ponderhit`
    pub async fn ponder_hit(&mut self) -> Result<Option<String>> {
        self.simple(UciCommand::PonderHit).await
    }

    /// `stop`; the answer usually holds the final `bestmove`
    pub async fn stop(&mut self) -> Result<Option<String>> {
        self.simple(UciCommand::Stop).await
    }

    /// Send `quit` and terminate the process
    ///
    /// The session ends up `Closed` whatever happens to `quit`.
    pub async fn close(&mut self) -> Result<()> {
        if self.process.is_closed() {
            return Ok(());
        }

        if let Err(e) = self.dispatcher.command(UciCommand::Quit, CommandOptions::new()).await {
            warn!("[{}] quit failed: {}", self.label(), e);
        }
        self.shutdown_process().await;

        let stats = self.dispatcher.channel().stats();
        info!(
            "Engine '{}' closed ({} bytes out, {} bytes in)",
            self.label(),
            stats.bytes_written,
            stats.bytes_read
        );
        Ok(())
    }

    async fn shutdown_process(&mut self) {
        if let Err(e) = self.dispatcher.channel_mut().terminate().await {
            warn!("[{}] failed to terminate engine: {}", self.label(), e);
        }
        self.process.mark_closed();
    }
}
