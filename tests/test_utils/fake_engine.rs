//! Scripted in-process engine
//!
//! Speaks enough UCI over a `tokio::io::duplex` pipe to drive a session
//! without a real engine binary. Every line the client writes is recorded
//! so tests can assert on the exact wire traffic.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;
use ucidriver::process::{ProcessChannel, StreamEvent};

use super::fixtures::STARTPOS_FEN;

/// How the fake engine behaves
#[derive(Debug, Clone)]
pub struct FakeScript {
    /// Reported as `id name`
    pub name: String,
    /// Printed before any command, like Stockfish's greeting
    pub banner: Option<String>,
    /// FEN shown by the `d` board dump; `None` prints a dump without one
    pub fen: Option<String>,
    /// Best moves handed out in turn by `go`; empty means `bestmove (none)`
    pub moves: Vec<String>,
    /// Ponder move appended to every `bestmove`
    pub ponder: Option<String>,
    /// Number of initial `isready` probes answered with silence
    pub silent_probes: usize,
    /// Delay between the first `info` line and `bestmove`
    pub search_delay: Duration,
    /// Split every reply in two chunks sent a moment apart
    pub split_replies: bool,
    /// Exit without answering when a command starts with this text
    pub exit_on: Option<String>,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            name: "Fake Engine 1.0".to_string(),
            banner: Some("Fake Engine 1.0 by the test suite".to_string()),
            fen: Some(STARTPOS_FEN.to_string()),
            moves: vec!["e2e4".to_string()],
            ponder: Some("e7e5".to_string()),
            silent_probes: 0,
            search_delay: Duration::ZERO,
            split_replies: false,
            exit_on: None,
        }
    }
}

impl FakeScript {
    pub fn with_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.moves = moves.into_iter().map(Into::into).collect();
        self
    }

    pub fn exit_on(mut self, prefix: &str) -> Self {
        self.exit_on = Some(prefix.to_string());
        self
    }

    /// Start the engine task and return the client side of the pipe
    pub fn spawn(self, label: &str) -> (ProcessChannel, FakeEngine) {
        let (client, engine) = tokio::io::duplex(64 * 1024);
        let (tx, rx) = unbounded_channel();

        if let Some(banner) = &self.banner {
            let _ = tx.send(StreamEvent::Output(format!("{}\n", banner)));
        }

        let task = tokio::spawn(run(self, engine, tx));
        (ProcessChannel::from_parts(label, client, rx), FakeEngine { task })
    }
}

/// Handle to a running fake engine
pub struct FakeEngine {
    task: JoinHandle<Vec<String>>,
}

impl FakeEngine {
    /// Wait for the engine to stop and return every line it received
    ///
    /// The engine stops on `quit`, on its `exit_on` command, or when the
    /// client side of the pipe is dropped.
    pub async fn received(self) -> Vec<String> {
        self.task.await.unwrap_or_default()
    }
}

async fn run(
    script: FakeScript,
    engine: DuplexStream,
    tx: UnboundedSender<StreamEvent>,
) -> Vec<String> {
    let mut received = Vec::new();
    let mut probes = 0usize;
    let mut searches = 0usize;
    let mut lines = BufReader::new(engine).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        received.push(line.clone());

        if let Some(prefix) = &script.exit_on {
            if line.starts_with(prefix.as_str()) {
                let _ = tx.send(StreamEvent::Exited);
                break;
            }
        }

        let command = line.split_whitespace().next().unwrap_or("");
        match command {
            "uci" => {
                let reply = format!(
                    "id name {}\nid author The Test Suite\n\n\
                     option name Threads type spin default 1 min 1 max 1024\n\
                     option name Skill Level type spin default 20 min 0 max 20\n\
                     option name Clear Hash type button\n\
                     uciok\n",
                    script.name
                );
                send(&tx, &reply, script.split_replies).await;
            }
            "isready" => {
                probes += 1;
                if probes > script.silent_probes {
                    send(&tx, "readyok\n", script.split_replies).await;
                }
            }
            "d" => {
                let reply = match &script.fen {
                    Some(fen) => format!(
                        "\n +---+\n | k | 8\n +---+\n\nFen: {}\nKey: 0000\nCheckers:\n",
                        fen
                    ),
                    None => "\n +---+\n | k | 8\n +---+\n".to_string(),
                };
                send(&tx, &reply, script.split_replies).await;
            }
            "eval" => {
                let reply = "Final evaluation       +0.25 (white side)\n";
                send(&tx, reply, script.split_replies).await;
            }
            "go" => {
                let mv = if script.moves.is_empty() {
                    "(none)".to_string()
                } else {
                    script.moves[searches % script.moves.len()].clone()
                };
                searches += 1;

                let _ = tx.send(StreamEvent::Output(format!(
                    "info depth 1 seldepth 1 score cp 20 nodes 20 pv {}\n",
                    mv
                )));
                if !script.search_delay.is_zero() {
                    tokio::time::sleep(script.search_delay).await;
                }

                let reply = match (&script.ponder, script.moves.is_empty()) {
                    (Some(ponder), false) => format!("bestmove {} ponder {}\n", mv, ponder),
                    _ => format!("bestmove {}\n", mv),
                };
                send(&tx, &reply, script.split_replies).await;
            }
            "quit" => {
                let _ = tx.send(StreamEvent::Exited);
                break;
            }
            // setoption, ucinewgame, position, stop, ponderhit: silent
            _ => {}
        }
    }

    received
}

async fn send(tx: &UnboundedSender<StreamEvent>, reply: &str, split: bool) {
    if split && reply.len() > 1 {
        let mut mid = reply.len() / 2;
        while !reply.is_char_boundary(mid) {
            mid += 1;
        }
        let _ = tx.send(StreamEvent::Output(reply[..mid].to_string()));
        tokio::time::sleep(Duration::from_millis(1)).await;
        let _ = tx.send(StreamEvent::Output(reply[mid..].to_string()));
    } else {
        let _ = tx.send(StreamEvent::Output(reply.to_string()));
    }
}
