//! Response parsing
//!
//! Extracts structured results from raw engine output. A parser that finds
//! nothing returns `None`; missing text is never an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Exact acknowledgement of `isready`
pub const READYOK: &str = "readyok";

/// Acknowledgement that ends the `uci` handshake
pub const UCIOK: &str = "uciok";

/// Marker preceding the chosen move in a search response
pub const BESTMOVE: &str = "bestmove";

/// Reserved best move meaning "no move"
pub const NONE_MOVE: &str = "(none)";

static FEN_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)fen:").expect("valid regex"));

static BESTMOVE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bbestmove(?:\s+(\S+))?(?:\s+ponder\s+(\S+))?").expect("valid regex")
});

static ID_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*id\s+(name|author)\s+(.+?)\s*$").expect("valid regex"));

/// Result of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// The chosen move
    pub mv: String,
    /// The reply the engine would like to ponder on
    pub ponder: Option<String>,
}

/// Identification the engine sends during the handshake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineInfo {
    pub name: Option<String>,
    pub author: Option<String>,
}

/// Whether a response is exactly the readiness acknowledgement
pub fn is_readyok(response: Option<&str>) -> bool {
    response.map(str::trim) == Some(READYOK)
}

/// FEN from a board dump
///
/// Finds the first line containing a case-insensitive `fen:` label and
/// returns the rest of the line without the label.
pub fn parse_fen(board: &str) -> Option<String> {
    let line = board.lines().find(|line| FEN_LABEL.is_match(line))?;
    let fen = FEN_LABEL.replace_all(line, "");
    let fen = fen.trim();
    if fen.is_empty() {
        None
    } else {
        Some(fen.to_string())
    }
}

/// Best move (and ponder move) from a search response
///
/// `None` when there is no `bestmove` line, it has no move, or the move is
/// `(none)`.
pub fn parse_best_move(response: &str) -> Option<BestMove> {
    let line = response.lines().find(|line| line.contains(BESTMOVE))?;
    let captures = BESTMOVE_LINE.captures(line)?;
    let mv = captures.get(1)?.as_str();
    if mv == NONE_MOVE {
        return None;
    }

    Some(BestMove {
        mv: mv.to_string(),
        ponder: captures.get(2).map(|m| m.as_str().to_string()),
    })
}

/// `id name` / `id author` from a handshake response
pub fn parse_engine_info(response: &str) -> EngineInfo {
    let mut info = EngineInfo::default();
    for captures in ID_LINE.captures_iter(response) {
        let value = captures[2].to_string();
        match &captures[1] {
            "name" => info.name = Some(value),
            _ => info.author = Some(value),
        }
    }
    info
}

/// Predicate ending a handshake read
pub fn uci_end(text: &str) -> bool {
    text.contains(UCIOK)
}

/// Predicate ending a readiness read
pub fn ready_end(text: &str) -> bool {
    text.contains(READYOK)
}

/// Predicate ending a search read
pub fn bestmove_end(text: &str) -> bool {
    text.lines().any(|line| line.trim_start().starts_with(BESTMOVE))
}
