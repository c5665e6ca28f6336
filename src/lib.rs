//! ucidriver - An async client for UCI chess engines
//!
//! Spawns a UCI engine (Stockfish by default) as a subprocess and drives it
//! over its standard input and output: a line-oriented protocol with no
//! framing and no request ids, where the only way to know an answer is
//! complete is to recognise a terminal token or to notice that the engine
//! went quiet.
//!
//! ## Module Organization
//!
//! - [`process`] - Subprocess spawning, the byte channel, and response reading
//! - [`commands`] - Command vocabulary and the write-then-read dispatcher
//! - [`client`] - The [`Engine`] session: handshake and typed operations
//! - [`params`] - Tagged `go` / `position` parameters
//! - [`parse`] - FEN, best move and engine identification parsing
//! - [`config`] - Engine configuration, option catalog, file loading
//! - [`models`] - Session lifecycle state and process bookkeeping
//! - [`demo`] - Engine-vs-engine and human-vs-engine games
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use ucidriver::{Engine, EngineConfig, GoParams};
//!
//! # async fn run() -> ucidriver::Result<()> {
//! let config = EngineConfig::for_engine("stockfish").with_option("Skill Level", 10);
//! let mut engine = Engine::init(&config).await?;
//!
//! let mv = engine.best_move(&GoParams::depth(11), None).await?;
//! println!("best move: {:?}", mv);
//!
//! engine.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading answers
//!
//! Every command is written and then read with one of two end conditions:
//!
//! - **Quiescence:** collect output until nothing new arrives for a window
//!   (10ms for commands, 100ms for `go`). Never fails; a silent engine yields
//!   `None`.
//! - **Predicate:** collect output until the accumulated text satisfies a
//!   predicate such as "contains `uciok`". No timeout; fails only if the
//!   engine exits.
//!
//! A session handles one command at a time; separate sessions are
//! independent and can run concurrently.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod commands;
pub mod config;
pub mod demo;
pub mod error;
pub mod models;
pub mod params;
pub mod parse;
pub mod process;

// Re-exports for core functionality
pub use client::Engine;
pub use config::loader::ConfigLoader;
pub use config::{EngineConfig, OptionValue, ReadStrategy};
pub use error::{Error, Result};
pub use models::SessionState;
pub use params::{GoParams, Param, PositionParams};
pub use parse::{BestMove, EngineInfo};

/// The current version of ucidriver from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
