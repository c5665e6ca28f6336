//! ucidriver - play chess against (or between) UCI engines
//!
//! Loads the engine configuration, starts one or two engine sessions and
//! runs a demo game on the terminal.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use tokio::io::BufReader;
use tracing::{debug, error, info, warn};

use ucidriver::demo::{self, MatchContext, MatchSettings};
use ucidriver::{ConfigLoader, Engine, EngineConfig, GoParams};

/// Which demo to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Engine against itself, in two sessions
    Match,
    /// Human (White) against the engine
    Play,
}

/// Command line arguments
#[derive(Debug)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Engine executable override
    engine: Option<PathBuf>,
    /// Search depth per move
    depth: u32,
    /// Demo to run
    mode: Mode,
    /// Stop after this many plies
    max_plies: Option<usize>,
    /// Suppress board dumps
    quiet: bool,
    /// Enable debug logging
    debug: bool,
}

impl Default for AppArgs {
    fn default() -> Self {
        Self {
            config_path: None,
            engine: None,
            depth: 11,
            mode: Mode::Match,
            max_plies: None,
            quiet: false,
            debug: false,
        }
    }
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> anyhow::Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    let value = args.get(i + 1).context("Missing config file path")?;
                    app_args.config_path = Some(PathBuf::from(value));
                    i += 1;
                }
                "--engine" | "-e" => {
                    let value = args.get(i + 1).context("Missing engine path")?;
                    app_args.engine = Some(PathBuf::from(value));
                    i += 1;
                }
                "--depth" | "-d" => {
                    let value = args.get(i + 1).context("Missing search depth")?;
                    app_args.depth = value
                        .parse()
                        .with_context(|| format!("Invalid depth: {}", value))?;
                    i += 1;
                }
                "--mode" | "-m" => {
                    app_args.mode = match args.get(i + 1).map(String::as_str) {
                        Some("match") => Mode::Match,
                        Some("play") => Mode::Play,
                        Some(other) => bail!("Unknown mode: {} (expected match or play)", other),
                        None => bail!("Missing mode"),
                    };
                    i += 1;
                }
                "--plies" | "-p" => {
                    let value = args.get(i + 1).context("Missing ply count")?;
                    app_args.max_plies = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid ply count: {}", value))?,
                    );
                    i += 1;
                }
                "--quiet" | "-q" => {
                    app_args.quiet = true;
                }
                "--debug" => {
                    app_args.debug = true;
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ucidriver v{}", ucidriver::VERSION);
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    bail!("Unknown option: {}", arg);
                }
                _ => {
                    warn!("Ignoring positional argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("ucidriver - drive UCI chess engines from the terminal");
    println!();
    println!("USAGE:");
    println!("    ucidriver [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -e, --engine <PATH>    Engine executable (default: stockfish)");
    println!("    -d, --depth <N>        Search depth per move (default: 11)");
    println!("    -m, --mode <MODE>      match (engine vs engine) or play (you vs engine)");
    println!("    -p, --plies <N>        Stop after N plies");
    println!("    -q, --quiet            Do not print the board after each move");
    println!("        --debug            Enable debug logging");
    println!("    -h, --help             Print this help message");
    println!("    -v, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    ucidriver looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. ~/.config/ucidriver/config.toml (or config.json)");
    println!("    3. $XDG_CONFIG_HOME/ucidriver/config.toml");
    println!("    4. ~/.ucidriver/config.toml");
    println!("    5. ./ucidriver/config.toml");
    println!("    6. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    UCIDRIVER_CONFIG       Path to configuration file");
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("Failed to parse arguments: {}", e);
        print_help();
        process::exit(1);
    });

    let log_level = if args.debug { "debug" } else { "info" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("Starting {} v{}", ucidriver::NAME, ucidriver::VERSION);
    debug!("Arguments: {:?}", args);

    let config = load_configuration(&args)?;
    let settings = MatchSettings {
        go: GoParams::depth(args.depth),
        max_plies: args.max_plies,
        show_board: !args.quiet,
    };

    if let Err(e) = run(args.mode, &config, &settings).await {
        error!("{:#}", e);
        process::exit(1);
    }

    info!("ucidriver shutdown complete");
    Ok(())
}

/// Load configuration from file or use defaults
fn load_configuration(args: &AppArgs) -> anyhow::Result<EngineConfig> {
    let config_path = args
        .config_path
        .clone()
        .or_else(|| env::var("UCIDRIVER_CONFIG").ok().map(PathBuf::from));

    let mut config = match &config_path {
        Some(path) => {
            debug!("Loading config from: {}", path.display());
            match ConfigLoader::load_from_path(path) {
                Ok(config) => {
                    info!("Configuration loaded from: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {}", path.display(), e);
                    info!("Falling back to default configuration");
                    EngineConfig::default()
                }
            }
        }
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };

    if let Some(engine) = &args.engine {
        debug!("Engine override: {}", engine.display());
        config.engine.path = engine.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(mode: Mode, config: &EngineConfig, settings: &MatchSettings) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();

    match mode {
        Mode::Match => {
            let (mut white, mut black) =
                futures::try_join!(Engine::init(config), Engine::init(config)).with_context(
                    || format!("Failed to start '{}'", config.engine.path.display()),
                )?;

            let result =
                demo::play_engine_match(&mut white, &mut black, settings, &mut stdout).await;
            let (w, b) = tokio::join!(white.close(), black.close());
            w?;
            b?;

            let report = result?;
            println!("{} plies played ({:?})", report.moves.len(), report.end);
        }
        Mode::Play => {
            let mut engine = Engine::init(config)
                .await
                .with_context(|| format!("Failed to start '{}'", config.engine.path.display()))?;

            let mut ctx = MatchContext::new(BufReader::new(tokio::io::stdin()), stdout);
            let result = demo::play_against_human(&mut engine, &mut ctx, settings).await;
            engine.close().await?;

            let report = result?;
            println!("{} plies played ({:?})", report.moves.len(), report.end);
        }
    }

    Ok(())
}
