//! Unit Tests for response parsing
//!
//! Realistic engine output, including the noise real engines interleave
//! with the lines that matter.

use ucidriver::parse::{
    bestmove_end, is_readyok, parse_best_move, parse_engine_info, parse_fen, ready_end, uci_end,
};
use ucidriver::process::trim_response;

const STOCKFISH_BOARD: &str = "
 +---+---+---+---+---+---+---+---+
 | r |   | b | q | k | b | n | r | 8
 +---+---+---+---+---+---+---+---+
 | p | p | p | p |   | p | p | p | 7
 +---+---+---+---+---+---+---+---+
 |   |   | n |   |   |   |   |   | 6
 +---+---+---+---+---+---+---+---+
 |   |   |   |   | p |   |   |   | 5
 +---+---+---+---+---+---+---+---+
 |   |   |   |   | P |   |   |   | 4
 +---+---+---+---+---+---+---+---+
 |   |   |   |   |   | N |   |   | 3
 +---+---+---+---+---+---+---+---+
 | P | P | P | P |   | P | P | P | 2
 +---+---+---+---+---+---+---+---+
 | R | N | B | Q | K | B |   | R | 1
 +---+---+---+---+---+---+---+---+
   a   b   c   d   e   f   g   h

Fen: r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3
Key: 463B96181691FC9C
Checkers: ";

const SEARCH_OUTPUT: &str = "info string NNUE evaluation using nn-5af11540bbfe.nnue enabled
info depth 1 seldepth 1 multipv 1 score cp 18 nodes 20 nps 10000 tbhits 0 time 2 pv e2e4
info depth 2 seldepth 2 multipv 1 score cp 46 nodes 66 nps 33000 tbhits 0 time 2 pv d2d4
info depth 3 seldepth 2 multipv 1 score cp 51 nodes 120 nps 60000 tbhits 0 time 2 pv e2e4 e7e5
bestmove e2e4 ponder e7e5";

const UCI_OUTPUT: &str = "id name Stockfish 16.1
id author the Stockfish developers (see AUTHORS file)

option name Debug Log File type string default
option name Threads type spin default 1 min 1 max 1024
option name Hash type spin default 16 min 1 max 33554432
option name Clear Hash type button
option name Ponder type check default false
uciok";

#[test]
fn test_fen_from_full_board_dump() {
    assert_eq!(
        parse_fen(STOCKFISH_BOARD).as_deref(),
        Some("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
    );
}

#[test]
fn test_fen_label_is_case_insensitive() {
    let fen = "8/8/8/8/8/8/8/K6k b - - 0 1";
    assert_eq!(parse_fen(&format!("fen: {}", fen)).as_deref(), Some(fen));
    assert_eq!(parse_fen(&format!("FEN:{}", fen)).as_deref(), Some(fen));
}

#[test]
fn test_fen_missing() {
    assert_eq!(parse_fen(""), None);
    assert_eq!(parse_fen("Unknown command: d"), None);
    assert_eq!(parse_fen("Key: 463B96181691FC9C\nCheckers:"), None);
}

#[test]
fn test_best_move_after_info_lines() {
    let best = parse_best_move(SEARCH_OUTPUT).unwrap();
    assert_eq!(best.mv, "e2e4");
    assert_eq!(best.ponder.as_deref(), Some("e7e5"));
}

#[test]
fn test_best_move_promotion_and_no_ponder() {
    let best = parse_best_move("info depth 30 score mate 1 pv a7a8q\nbestmove a7a8q").unwrap();
    assert_eq!(best.mv, "a7a8q");
    assert_eq!(best.ponder, None);
}

#[test]
fn test_best_move_none_cases() {
    assert_eq!(parse_best_move("info depth 0 score mate 0\nbestmove (none)"), None);
    assert_eq!(parse_best_move("info depth 12 score cp 10 pv e2e4"), None);
    assert_eq!(parse_best_move("bestmove   "), None);
}

#[test]
fn test_engine_info_ignores_options() {
    let info = parse_engine_info(UCI_OUTPUT);
    assert_eq!(info.name.as_deref(), Some("Stockfish 16.1"));
    assert_eq!(info.author.as_deref(), Some("the Stockfish developers (see AUTHORS file)"));
}

#[test]
fn test_readiness_requires_exact_token() {
    assert!(is_readyok(Some("readyok")));
    assert!(is_readyok(Some("readyok\r\n")));
    assert!(!is_readyok(Some("info string readyok")));
    assert!(!is_readyok(Some("")));
    assert!(!is_readyok(None));
}

#[test]
fn test_end_predicates_on_real_output() {
    assert!(uci_end(UCI_OUTPUT));
    assert!(!uci_end("id name Stockfish 16.1\n"));
    assert!(bestmove_end(SEARCH_OUTPUT));
    assert!(!bestmove_end(SEARCH_OUTPUT.rsplit_once('\n').unwrap().0));
    assert!(ready_end("info string ok\nreadyok\n"));
}

#[test]
fn test_trim_response_keeps_inner_whitespace() {
    assert_eq!(
        trim_response("\n\nline one\n\nline two  \n").as_deref(),
        Some("line one\n\nline two")
    );
    assert_eq!(trim_response("\r\n"), None);
}
