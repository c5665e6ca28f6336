//! Integration Tests for the Session Lifecycle
//!
//! Drives full sessions against the scripted engine: handshake with both
//! read strategies, typed operations, failure handling, and shutdown.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::time::Duration;

use test_utils::{fast_config, FakeScript, STARTPOS_FEN};
use ucidriver::{Engine, Error, GoParams, OptionValue, PositionParams, ReadStrategy, SessionState};

fn setoption_lines(received: &[String]) -> Vec<&str> {
    received
        .iter()
        .map(String::as_str)
        .filter(|line| line.starts_with("setoption"))
        .collect()
}

#[tokio::test]
async fn test_terminal_token_handshake() {
    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    assert_eq!(engine.state(), SessionState::Ready);
    assert_eq!(engine.engine_info().name.as_deref(), Some("Fake Engine 1.0"));
    assert_eq!(engine.engine_info().author.as_deref(), Some("The Test Suite"));

    engine.close().await.unwrap();
    let received = fake.received().await;

    assert_eq!(&received[..3], ["uci", "isready", "ucinewgame"]);
    assert_eq!(received.last().map(String::as_str), Some("quit"));
}

#[tokio::test]
async fn test_handshake_sends_default_options_in_order() {
    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();
    engine.close().await.unwrap();

    let received = fake.received().await;
    let options = setoption_lines(&received);

    assert_eq!(options.first(), Some(&"setoption name Threads value 1"));
    assert!(options.contains(&"setoption name Skill Level value 20"));
    assert!(options.contains(&"setoption name Ponder value false"));
    // Buttons and empty strings are never sent during setup
    assert!(!options.iter().any(|line| line.contains("Clear Hash")));
    assert!(!options.iter().any(|line| line.contains("EvalFile")));
    assert!(!options.iter().any(|line| line.contains("Debug Log File")));

    let hash = options.iter().position(|l| l.contains("name Hash")).unwrap();
    let skill = options.iter().position(|l| l.contains("name Skill Level")).unwrap();
    assert!(hash < skill);
}

#[tokio::test]
async fn test_option_overrides_replace_defaults() {
    let config = fast_config()
        .with_option("Skill Level", 5)
        .with_option("Threads", 4)
        .with_option("Hash", 64);

    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &config).await.unwrap();
    engine.close().await.unwrap();

    let received = fake.received().await;
    let options = setoption_lines(&received);
    assert!(options.contains(&"setoption name Skill Level value 5"));
    assert!(options.contains(&"setoption name Threads value 4"));
    assert!(options.contains(&"setoption name Hash value 64"));
    assert!(!options.contains(&"setoption name Skill Level value 20"));
}

#[tokio::test]
async fn test_unsendable_overrides_suppress_defaults() {
    let config = fast_config()
        .with_option("Hash", OptionValue::Trigger)
        .with_option("Skill Level", "");

    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &config).await.unwrap();
    assert_eq!(engine.state(), SessionState::Ready);
    engine.close().await.unwrap();

    let received = fake.received().await;
    let options = setoption_lines(&received);
    assert!(!options.iter().any(|line| line.starts_with("setoption name Hash")));
    assert!(!options.iter().any(|line| line.starts_with("setoption name Skill Level")));
    assert!(options.contains(&"setoption name Threads value 1"));
}

#[tokio::test]
async fn test_quiescence_handshake_retries_readiness() {
    let script = FakeScript {
        silent_probes: 2,
        ..FakeScript::default()
    };
    let config = fast_config().with_handshake(ReadStrategy::Quiescence);

    let (channel, fake) = script.spawn("fake");
    let mut engine = Engine::from_channel(channel, &config).await.unwrap();
    assert_eq!(engine.state(), SessionState::Ready);
    engine.close().await.unwrap();

    let received = fake.received().await;
    let probes = received
        .iter()
        .take_while(|l| *l != "ucinewgame")
        .filter(|l| *l == "isready")
        .count();
    assert_eq!(probes, 3);
}

#[tokio::test]
async fn test_set_option_skips_empty_values() {
    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    // Marks the end of the setup traffic
    engine.new_game().await.unwrap();
    engine.set_option("Debug Log File", "").await.unwrap();
    engine.set_option("Clear Hash", OptionValue::Trigger).await.unwrap();
    engine.set_option("MultiPV", 3).await.unwrap();
    engine.set_option("UCI_Chess960", true).await.unwrap();
    engine.trigger_option("Clear Hash").await.unwrap();
    engine.close().await.unwrap();

    let received = fake.received().await;
    let marker = received.iter().rposition(|l| l == "ucinewgame").unwrap();
    let after_setup: Vec<&str> = received[marker + 1..].iter().map(String::as_str).collect();

    assert_eq!(
        after_setup,
        [
            "setoption name MultiPV value 3",
            "setoption name UCI_Chess960 value true",
            "setoption name Clear Hash",
            "quit",
        ]
    );
}

#[tokio::test]
async fn test_board_fen_and_eval() {
    let (channel, _fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    let board = engine.board().await.unwrap().unwrap();
    assert!(board.contains("Fen:"));
    assert_eq!(engine.fen().await.unwrap().as_deref(), Some(STARTPOS_FEN));

    let eval = engine.eval().await.unwrap().unwrap();
    assert!(eval.starts_with("Final evaluation"));

    assert!(engine.is_ready().await.unwrap());
    engine.wait_ready().await.unwrap();
    engine.close().await.unwrap();
}

#[tokio::test]
async fn test_fen_absent_from_board() {
    let script = FakeScript {
        fen: None,
        ..FakeScript::default()
    };
    let (channel, fake) = script.spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    assert_eq!(engine.fen().await.unwrap(), None);
    assert!(!engine.apply_move("e2e4").await.unwrap());
    engine.close().await.unwrap();

    let received = fake.received().await;
    assert!(!received.iter().any(|l| l.starts_with("position")));
}

#[tokio::test]
async fn test_best_move_and_ponder() {
    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    engine.set_position(&PositionParams::startpos()).await.unwrap();
    assert_eq!(
        engine.best_move(&GoParams::depth(11), None).await.unwrap().as_deref(),
        Some("e2e4")
    );

    let best = engine
        .best_move_with_ponder(&GoParams::movetime(50), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(best.mv, "e2e4");
    assert_eq!(best.ponder.as_deref(), Some("e7e5"));

    let raw = engine.search(&GoParams::depth(3), None).await.unwrap().unwrap();
    assert!(raw.starts_with("info depth 1"));
    engine.close().await.unwrap();

    let received = fake.received().await;
    assert!(received.contains(&"position startpos".to_string()));
    assert!(received.contains(&"go depth 11".to_string()));
    assert!(received.contains(&"go movetime 50".to_string()));
}

#[tokio::test]
async fn test_no_move_is_none() {
    let script = FakeScript::default().with_moves(Vec::<String>::new());
    let (channel, _fake) = script.spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    assert_eq!(engine.best_move(&GoParams::depth(1), None).await.unwrap(), None);
    assert_eq!(engine.search_until_best_move(&GoParams::depth(1)).await.unwrap(), None);
    engine.close().await.unwrap();
}

#[tokio::test]
async fn test_apply_move_sets_fen_position() {
    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    assert!(engine.apply_move("e2e4").await.unwrap());
    engine.close().await.unwrap();

    let received = fake.received().await;
    let expected = format!("position fen {} moves e2e4", STARTPOS_FEN);
    let at = received.iter().position(|l| *l == expected).unwrap();
    assert_eq!(received[at - 1], "d");
}

#[tokio::test]
async fn test_stop_and_ponder_hit_are_sent() {
    let (channel, fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    assert_eq!(engine.ponder_hit().await.unwrap(), None);
    assert_eq!(engine.stop().await.unwrap(), None);
    engine.new_game().await.unwrap();
    engine.close().await.unwrap();

    let received = fake.received().await;
    let tail: Vec<&str> = received.iter().rev().take(4).rev().map(String::as_str).collect();
    assert_eq!(tail, ["ponderhit", "stop", "ucinewgame", "quit"]);
}

#[tokio::test]
async fn test_engine_exit_during_handshake() {
    let script = FakeScript::default().exit_on("isready");
    let (channel, fake) = script.spawn("fake");

    let err = Engine::from_channel(channel, &fast_config()).await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedTermination { .. }), "got {:?}", err);

    let received = fake.received().await;
    assert_eq!(received, ["uci", "isready"]);
}

#[tokio::test]
async fn test_engine_exit_during_search() {
    let script = FakeScript::default().exit_on("go");
    let (channel, _fake) = script.spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();

    let err = engine.search_until_best_move(&GoParams::depth(5)).await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedTermination { .. }));

    // The pipe is gone, so the next write fails
    let err = engine
        .search(&GoParams::depth(5), Some(Duration::from_millis(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WriteFailed { .. }));

    // Closing still succeeds and ends the session
    engine.close().await.unwrap();
    assert_eq!(engine.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_closed_session_rejects_operations() {
    let (channel, _fake) = FakeScript::default().spawn("fake");
    let mut engine = Engine::from_channel(channel, &fast_config()).await.unwrap();
    engine.close().await.unwrap();
    engine.close().await.unwrap();

    assert!(matches!(
        engine.best_move(&GoParams::depth(1), None).await,
        Err(Error::NotReady { state: SessionState::Closed })
    ));
    assert!(matches!(engine.set_option("Threads", 2).await, Err(Error::NotReady { .. })));
    assert!(matches!(engine.fen().await, Err(Error::NotReady { .. })));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = fast_config();
    config.timing.command_window_ms = 0;

    let (channel, fake) = FakeScript::default().spawn("fake");
    let err = Engine::from_channel(channel, &config).await.unwrap_err();
    assert!(matches!(err, Error::ConfigInvalid(_)));

    // Nothing was written; dropping the client side stops the engine
    assert!(fake.received().await.is_empty());
}
