use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use shakmaty::{CastlingMode, Color};

use chronofish::{Engine, EngineConfig, GameState, PositionError, PositionOracle, TurnClock};

const DEFAULT_REMAINING: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(
    name = "chronofish",
    version,
    about = "Time-budgeted alpha-beta chess engine speaking UCI"
)]
struct Args {
    /// TOML file with engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transposition table size in entries (overrides the config file)
    #[arg(long)]
    hash_entries: Option<usize>,
}

fn main() -> Result<()> {
    // stdout belongs to the UCI protocol
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(entries) = args.hash_entries {
        config.tt_entries = entries;
    }
    config.validate().context("invalid engine configuration")?;

    log::info!("transposition table: {} entries", config.tt_entries);
    let mut engine = Engine::new(config);
    let mut state = GameState::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "uci" => {
                writeln!(stdout, "id name chronofish")?;
                writeln!(stdout, "id author chronofish developers")?;
                writeln!(stdout, "uciok")?;
            }
            "isready" => writeln!(stdout, "readyok")?,
            "ucinewgame" => {
                state = GameState::new();
                engine.new_game();
            }
            "position" => match parse_position(&parts[1..]) {
                Ok(next) => state = next,
                Err(err) => log::error!("ignoring `{line}`: {err}"),
            },
            "go" => {
                let go = GoParams::parse(&parts[1..]);
                let result = match go.depth {
                    Some(depth) => engine.search_depth(&mut state, depth).map(|r| r.best_move),
                    None => {
                        let clock = TurnClock::start(go.remaining(state.turn()));
                        engine.think(&mut state, &clock)
                    }
                };
                match result {
                    Ok(mv) => writeln!(stdout, "bestmove {}", mv.to_uci(CastlingMode::Standard))?,
                    Err(err) => {
                        log::error!("{err}");
                        writeln!(stdout, "bestmove 0000")?;
                    }
                }
            }
            "quit" => break,
            _ => {}
        }
        stdout.flush()?;
    }
    Ok(())
}

fn parse_position(parts: &[&str]) -> Result<GameState, PositionError> {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let setup = &parts[..moves_at.unwrap_or(parts.len())];

    let mut state = match setup {
        ["startpos"] => GameState::new(),
        ["fen", fen @ ..] => GameState::from_fen(&fen.join(" "))?,
        _ => return Err(PositionError::Illegal(setup.join(" "))),
    };
    if let Some(idx) = moves_at {
        for uci in &parts[idx + 1..] {
            state.play_uci(uci)?;
        }
    }
    Ok(state)
}

#[derive(Debug, Default, PartialEq)]
struct GoParams {
    wtime: Option<Duration>,
    btime: Option<Duration>,
    movetime: Option<Duration>,
    depth: Option<u32>,
}

impl GoParams {
    fn parse(parts: &[&str]) -> Self {
        let mut go = GoParams::default();
        let millis = |v: &str| v.parse::<u64>().ok().map(Duration::from_millis);
        for pair in parts.windows(2) {
            match pair {
                ["wtime", v] => go.wtime = millis(v),
                ["btime", v] => go.btime = millis(v),
                ["movetime", v] => go.movetime = millis(v),
                ["depth", v] => go.depth = v.parse().ok(),
                _ => {}
            }
        }
        go
    }

    /// Game time left for `side`; a fixed move time is treated as the whole
    /// remaining budget.
    fn remaining(&self, side: Color) -> Duration {
        let clock = match side {
            Color::White => self.wtime,
            Color::Black => self.btime,
        };
        self.movetime.or(clock).unwrap_or(DEFAULT_REMAINING)
    }
}
