//! Demo games
//!
//! Application-level glue on top of [`Engine`]: two engines playing each
//! other, or an engine playing moves typed by a human. Input and output
//! streams are passed in through [`MatchContext`], so the same loops run
//! against stdin/stdout in the binary and against in-memory buffers in
//! tests.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::client::Engine;
use crate::error::Result;
use crate::params::{GoParams, PositionParams};

/// I/O used by an interactive game
pub struct MatchContext<R, W> {
    /// Where human moves come from, one per line
    pub input: R,
    /// Where boards and moves are reported
    pub output: W,
}

impl<R, W> MatchContext<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Next non-empty line, or `None` at end of input
    async fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        self.output.write_all(question.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(Some(answer.to_string()));
            }
        }
    }
}

/// Game settings shared by both demo modes
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Search limits for every engine move
    pub go: GoParams,
    /// Stop after this many plies
    pub max_plies: Option<usize>,
    /// Print the board dump after every engine move
    pub show_board: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            go: GoParams::depth(11),
            max_plies: None,
            show_board: true,
        }
    }
}

/// Why a game stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEnd {
    /// The side to move had no best move (mate, stalemate, or no answer)
    NoMove,
    /// `max_plies` was reached
    PlyLimit,
    /// The human quit or input ran out
    InputClosed,
    /// The engine could not report a position to play from
    NoPosition,
}

/// Moves played and how the game ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub moves: Vec<String>,
    pub end: MatchEnd,
}

fn ply_limit_reached(settings: &MatchSettings, plies: usize) -> bool {
    settings.max_plies.is_some_and(|max| plies >= max)
}

/// Let two engines play each other from the starting position
///
/// Each move is applied to both engines concurrently; they are separate
/// sessions, so this is safe.
pub async fn play_engine_match<W>(
    white: &mut Engine,
    black: &mut Engine,
    settings: &MatchSettings,
    output: &mut W,
) -> Result<MatchReport>
where
    W: AsyncWrite + Unpin,
{
    let start = PositionParams::startpos();
    let (w, b) = tokio::join!(white.set_position(&start), black.set_position(&start));
    w?;
    b?;

    let mut moves = Vec::new();
    let end = loop {
        if ply_limit_reached(settings, moves.len()) {
            break MatchEnd::PlyLimit;
        }

        let mover = if moves.len() % 2 == 0 { &mut *white } else { &mut *black };
        let Some(mv) = mover.best_move(&settings.go, None).await? else {
            break MatchEnd::NoMove;
        };
        info!("Ply {}: {} plays {}", moves.len() + 1, mover.label(), mv);

        let (w, b) = tokio::join!(white.apply_move(&mv), black.apply_move(&mv));
        if !(w? && b?) {
            break MatchEnd::NoPosition;
        }

        output
            .write_all(format!("{}. {}\n", moves.len() + 1, mv).as_bytes())
            .await?;
        moves.push(mv);

        if settings.show_board {
            if let Some(board) = white.board().await? {
                output.write_all(board.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
        }
        output.flush().await?;
    };

    info!("Match finished after {} plies: {:?}", moves.len(), end);
    Ok(MatchReport { moves, end })
}

/// Play against the engine, reading the human's moves from `ctx.input`
///
/// The human has White. Typing `quit` or closing the input ends the game.
/// Move legality is left to the engine.
pub async fn play_against_human<R, W>(
    engine: &mut Engine,
    ctx: &mut MatchContext<R, W>,
    settings: &MatchSettings,
) -> Result<MatchReport>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    engine.set_position(&PositionParams::startpos()).await?;

    let mut moves = Vec::new();
    let end = loop {
        if ply_limit_reached(settings, moves.len()) {
            break MatchEnd::PlyLimit;
        }

        let Some(mv) = ctx.prompt("your move> ").await? else {
            break MatchEnd::InputClosed;
        };
        if mv == "quit" {
            break MatchEnd::InputClosed;
        }
        if !engine.apply_move(&mv).await? {
            break MatchEnd::NoPosition;
        }
        moves.push(mv);

        if ply_limit_reached(settings, moves.len()) {
            break MatchEnd::PlyLimit;
        }

        let Some(reply) = engine.best_move(&settings.go, None).await? else {
            ctx.say("engine has no move").await?;
            break MatchEnd::NoMove;
        };
        if !engine.apply_move(&reply).await? {
            break MatchEnd::NoPosition;
        }
        ctx.say(&format!("engine plays {}", reply)).await?;
        moves.push(reply);

        if settings.show_board {
            if let Some(board) = engine.board().await? {
                ctx.say(&board).await?;
            }
        }
    };

    Ok(MatchReport { moves, end })
}
