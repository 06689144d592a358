//! Command-line front end for the UCT engine.
//!
//! - `connect4`: play Connect Four against the engine, reading columns from stdin
//! - `g2048`: let the engine play 2048 on its own until the board locks

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use uct_core::GameState;
use uct_games::{Column, Connect4State, G2048State};
use uct_mcts::config::ENV_PREFIX;
use uct_mcts::{Mcts, SearchConfig};

/// UCT Monte Carlo Tree Search demo games.
#[derive(Parser)]
#[command(name = "uct-play")]
#[command(about = "Play games against a UCT Monte Carlo Tree Search engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play Connect Four against the engine. Type a column (0-6) per move.
    Connect4 {
        #[command(flatten)]
        engine: EngineArgs,

        /// Let the engine make the first move.
        #[arg(long)]
        engine_first: bool,
    },

    /// Watch the engine play 2048.
    G2048 {
        #[command(flatten)]
        engine: EngineArgs,

        /// Stop after this many engine moves.
        #[arg(long)]
        max_moves: Option<u32>,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// Thinking time per move, in milliseconds.
    #[arg(long, default_value = "2000")]
    think_ms: u64,

    /// Random seed for reproducibility.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Stop playouts once the engine's utility passes this value.
    /// Defaults to never stopping early.
    #[arg(long)]
    utility_goal: Option<f64>,

    /// Cap on search iterations per move, on top of the time budget.
    #[arg(long)]
    max_iterations: Option<u64>,

    /// TOML file with search settings. UCT_* environment variables and the
    /// flags above override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl EngineArgs {
    fn search_config(&self) -> Result<SearchConfig> {
        self.search_config_with(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// File (or defaults), then `lookup` overrides, then command-line flags.
    fn search_config_with<F>(&self, lookup: F) -> Result<SearchConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match &self.config {
            Some(path) => SearchConfig::load(path)
                .with_context(|| format!("Failed to load search config from {:?}", path))?,
            None => SearchConfig::default(),
        };
        let mut config = config
            .apply_overrides_from(lookup)
            .context("Invalid UCT_* environment override")?;
        if let Some(n) = self.max_iterations {
            config.max_iterations = Some(n);
        }
        config.validate()?;
        Ok(config)
    }

    fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_ms)
    }

    fn goal(&self) -> f64 {
        self.utility_goal.unwrap_or(f64::INFINITY)
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Connect4 {
            engine,
            engine_first,
        } => {
            init_tracing(&engine.log_level);
            play_connect4(&engine, engine_first)
        }
        Commands::G2048 { engine, max_moves } => {
            init_tracing(&engine.log_level);
            play_2048(&engine, max_moves)
        }
    }
}

/// Parse one line of human input into a column.
fn parse_column(line: &str) -> Result<Column> {
    let col: u8 = line
        .trim()
        .parse()
        .with_context(|| format!("not a column number: {:?}", line.trim()))?;
    if col > 6 {
        bail!("column must be between 0 and 6, got {}", col);
    }
    Ok(Column(col))
}

fn play_connect4(args: &EngineArgs, engine_first: bool) -> Result<()> {
    let config = args.search_config()?;
    info!(?config, "Starting Connect Four");
    let mut mcts = Mcts::new(config, ChaCha8Rng::seed_from_u64(args.seed));

    let mut state = Connect4State::new();
    let engine_player = if engine_first { 1 } else { 2 };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    while !state.terminated() {
        println!("{}\n", state);

        if state.current_player() == engine_player {
            let result = mcts.search(&state, args.think_time(), args.goal())?;
            info!(
                mv = %result.best_move,
                score = result.best_score,
                iterations = result.iterations,
                "Engine move"
            );
            for child in &result.children {
                debug!(mv = %child.mv, visits = child.visits, mean = child.mean_score);
            }
            println!("Engine plays {}", result.best_move);
            state.apply_move(result.best_move)?;
            continue;
        }

        print!("Your move (0-6): ");
        stdout.flush()?;
        let Some(line) = lines.next() else {
            println!();
            info!("Input closed, ending game");
            return Ok(());
        };
        let line = line?;

        let applied = parse_column(&line).and_then(|mv| state.apply_move(mv).map_err(Into::into));
        if let Err(e) = applied {
            println!("{:#}", e);
        }
    }

    println!("{}\n", state);
    match state.winner() {
        Some(p) if p == engine_player => println!("Engine wins."),
        Some(_) => println!("You win."),
        None => println!("Draw."),
    }
    Ok(())
}

fn play_2048(args: &EngineArgs, max_moves: Option<u32>) -> Result<()> {
    let config = args.search_config()?;
    info!(?config, "Starting 2048");
    let mut mcts = Mcts::new(config, ChaCha8Rng::seed_from_u64(args.seed));
    let mut spawn_rng = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(1));

    let mut state = G2048State::random_start(&mut spawn_rng)?;
    let mut played = 0u32;

    while !state.terminated() && max_moves.map_or(true, |max| played < max) {
        println!("{}\n", state);

        let mv = mcts.search_good_move(&state, args.think_time(), args.goal())?;
        println!("Engine slides {}", mv);
        state.apply_move(mv)?;
        played += 1;

        if !state.terminated() {
            state.apply_chance_outcome(&mut spawn_rng)?;
        }
    }

    println!("{}\n", state);
    info!(moves = played, max_tile = state.max_tile(), "Game over");
    println!("Played {} moves, highest tile {}", played, state.max_tile());
    Ok(())
}
