//! Command parameters
//!
//! `go` and `position` take keyword parameters of three shapes: bare flags
//! (`infinite`), lists (`searchmoves e2e4 d2d4`) and scalars (`depth 11`).
//! Each parameter carries its shape as a tag, and translation to protocol
//! tokens matches on that tag.

use std::fmt;

/// Literal token selecting the standard starting position
pub const STARTPOS: &str = "startpos";

/// Shape and value of one keyword parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Emits the key alone when set; omitted otherwise
    Flag(bool),
    /// Emits the key followed by the space-joined items; omitted when empty
    List(Vec<String>),
    /// Emits `<key> <value>`
    Scalar(String),
}

/// A keyword parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: ParamValue,
}

impl Param {
    pub fn flag(key: impl Into<String>, set: bool) -> Self {
        Self {
            key: key.into(),
            value: ParamValue::Flag(set),
        }
    }

    pub fn list<I, S>(key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            value: ParamValue::List(items.into_iter().map(Into::into).collect()),
        }
    }

    pub fn scalar(key: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            key: key.into(),
            value: ParamValue::Scalar(value.to_string()),
        }
    }

    /// Protocol token for this parameter, or `None` if it emits nothing
    pub fn to_token(&self) -> Option<String> {
        match &self.value {
            ParamValue::Flag(true) => Some(self.key.clone()),
            ParamValue::Flag(false) => None,
            ParamValue::List(items) if items.is_empty() => None,
            ParamValue::List(items) => Some(format!("{} {}", self.key, items.join(" "))),
            ParamValue::Scalar(value) => Some(format!("{} {}", self.key, value)),
        }
    }
}

/// Translate parameters to protocol tokens, preserving order
pub fn to_tokens(params: &[Param]) -> Vec<String> {
    params.iter().filter_map(Param::to_token).collect()
}

/// Parameters of `go`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// Restrict the search to these moves
    pub searchmoves: Vec<String>,
    /// Search in pondering mode
    pub ponder: bool,
    /// White's remaining time, in ms
    pub wtime: Option<u64>,
    /// Black's remaining time, in ms
    pub btime: Option<u64>,
    /// White's increment per move, in ms
    pub winc: Option<u64>,
    /// Black's increment per move, in ms
    pub binc: Option<u64>,
    /// Moves to the next time control
    pub movestogo: Option<u32>,
    /// Search this many plies only
    pub depth: Option<u32>,
    /// Search this many nodes only
    pub nodes: Option<u64>,
    /// Search for a mate in this many moves
    pub mate: Option<u32>,
    /// Search exactly this many ms
    pub movetime: Option<u64>,
    /// Search until `stop`
    pub infinite: bool,
}

impl GoParams {
    /// Fixed-depth search
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// Fixed-time search
    pub fn movetime(ms: u64) -> Self {
        Self {
            movetime: Some(ms),
            ..Self::default()
        }
    }

    /// Search until `stop`
    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Self::default()
        }
    }

    /// Tagged parameters in protocol order
    pub fn to_params(&self) -> Vec<Param> {
        let scalars = [
            ("wtime", self.wtime),
            ("btime", self.btime),
            ("winc", self.winc),
            ("binc", self.binc),
            ("movestogo", self.movestogo.map(u64::from)),
            ("depth", self.depth.map(u64::from)),
            ("nodes", self.nodes),
            ("mate", self.mate.map(u64::from)),
            ("movetime", self.movetime),
        ];

        let mut params = vec![
            Param::list("searchmoves", self.searchmoves.iter().cloned()),
            Param::flag("ponder", self.ponder),
        ];
        params.extend(
            scalars
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| Param::scalar(key, v))),
        );
        params.push(Param::flag("infinite", self.infinite));
        params
    }

    /// Protocol tokens following `go`
    pub fn to_tokens(&self) -> Vec<String> {
        to_tokens(&self.to_params())
    }
}

/// Where a `position` command starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSource {
    StartPos,
    Fen(String),
}

impl PositionSource {
    /// `startpos` maps to [`PositionSource::StartPos`], anything else is a FEN
    pub fn parse(value: &str) -> Self {
        if value == STARTPOS {
            PositionSource::StartPos
        } else {
            PositionSource::Fen(value.to_string())
        }
    }

    fn to_token(&self) -> String {
        match self {
            PositionSource::StartPos => STARTPOS.to_string(),
            PositionSource::Fen(fen) => format!("fen {}", fen),
        }
    }
}

/// Parameters of `position`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionParams {
    pub from: Option<PositionSource>,
    pub moves: Vec<String>,
}

impl PositionParams {
    /// The starting position
    pub fn startpos() -> Self {
        Self {
            from: Some(PositionSource::StartPos),
            moves: Vec::new(),
        }
    }

    /// A FEN position
    pub fn fen(fen: impl Into<String>) -> Self {
        Self {
            from: Some(PositionSource::Fen(fen.into())),
            moves: Vec::new(),
        }
    }

    /// Builder-style move list
    pub fn with_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.moves = moves.into_iter().map(Into::into).collect();
        self
    }

    /// Protocol tokens following `position`
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.from.iter().map(PositionSource::to_token).collect();
        tokens.extend(Param::list("moves", self.moves.iter().cloned()).to_token());
        tokens
    }
}
