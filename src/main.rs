//! Ninuki: a capture-and-five board game engine speaking GTP.
//!
//! ## Usage
//!
//! - `ninuki` - Start the GTP server (default)
//! - `ninuki gtp --policy rule_based` - GTP server with the rule-based policy
//! - `ninuki demo` - Play a short self-play game and print the board

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use ninuki::board::{Board, Color, Move};
use ninuki::constants::{DEFAULT_SIMULATIONS, DEFAULT_SIZE};
use ninuki::gtp::GtpEngine;
use ninuki::policy::{FlatMonteCarloPlayer, Policy};

/// Ninuki: flat Monte Carlo engine for the Ninuki capture game
#[derive(Parser)]
#[command(name = "ninuki")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GoGui
    Gtp(EngineArgs),
    /// Play a self-play game between the two policies
    Demo(EngineArgs),
}

#[derive(Args, Clone)]
struct EngineArgs {
    /// Board size (2-25)
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,
    /// Random playouts per candidate move
    #[arg(long, default_value_t = DEFAULT_SIMULATIONS)]
    simulations: usize,
    /// Move generation policy: random or rule_based
    #[arg(long, default_value_t = Policy::Random)]
    policy: Policy,
    /// Seed for reproducible play
    #[arg(long)]
    seed: Option<u64>,
    /// Evaluate candidate moves in parallel
    #[arg(long)]
    parallel: bool,
    /// Print diagnostics to stderr
    #[arg(long)]
    debug: bool,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            simulations: DEFAULT_SIMULATIONS,
            policy: Policy::Random,
            seed: None,
            parallel: false,
            debug: false,
        }
    }
}

impl EngineArgs {
    fn player(&self) -> Result<FlatMonteCarloPlayer> {
        anyhow::ensure!(self.simulations > 0, "--simulations must be at least 1");
        let mut player = FlatMonteCarloPlayer::new(self.simulations)
            .with_parallel(self.parallel)
            .with_debug(self.debug);
        if let Some(seed) = self.seed {
            player = player.with_seed(seed);
        }
        Ok(player)
    }

    fn board(&self) -> Result<Board> {
        Board::new(self.size).with_context(|| format!("invalid --size {}", self.size))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Gtp(args)) => run_gtp(&args),
        Some(Commands::Demo(args)) => run_demo(&args),
        None => run_gtp(&EngineArgs::default()),
    }
}

fn run_gtp(args: &EngineArgs) -> Result<()> {
    let mut engine = GtpEngine::with_player(args.board()?, args.player()?)
        .with_policy(args.policy)
        .with_debug(args.debug);
    engine.run()
}

fn run_demo(args: &EngineArgs) -> Result<()> {
    println!("Ninuki: flat Monte Carlo vs rule-based policy\n");

    let mut board = args.board()?;
    let mut player = args.player()?;
    let policies = [(Color::Black, Policy::Random), (Color::White, Policy::RuleBased)];

    while !board.end_of_game() {
        let color = board.current_player();
        let policy = if color == policies[0].0 { policies[0].1 } else { policies[1].1 };
        let pt = player.genmove(&mut board, policy);
        board
            .play(Move::Place(pt), color)
            .with_context(|| format!("engine chose unplayable point {}", board.format_point(pt)))?;
        println!("{color} ({policy}) plays {}", board.format_point(pt));
    }

    println!("\n{board}");
    println!(
        "Result: {} (captures black {}, white {})",
        board.get_final_result(),
        board.get_captures(Color::Black),
        board.get_captures(Color::White)
    );
    Ok(())
}
