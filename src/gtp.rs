//! Go Text Protocol (GTP) front end for the Ninuki engine.
//!
//! Implements GTP version 2 plus the GoGui rules extensions, so the engine
//! can be driven by GoGui or a regression script.
//!
//! ## Supported Commands
//!
//! - `protocol_version`, `name`, `version`, `quit`
//! - `known_command <cmd>`, `list_commands`
//! - `boardsize <size>`, `clear_board`, `komi <value>`, `showboard`
//! - `play <b|w> <vertex>` - Play a move
//! - `genmove <b|w>` - Generate and play a move with the active policy
//! - `legal_moves <b|w>` - Sorted list of empty points
//! - `gogui-rules_*`, `gogui-analyze_commands` - GoGui rules interface
//! - `timelimit <seconds>` - Accepted and stored
//! - `policy <random|rule_based>` - Select the move generation policy
//! - `policy_moves` - Tier and moves of the active policy
//!
//! ## Example
//!
//! ```ignore
//! use ninuki::gtp::GtpEngine;
//! let mut engine = GtpEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::board::{Board, BoardError, Color, Move, Point};
use crate::constants::{DEFAULT_SIZE, ENGINE_NAME, GAME_ID};
use crate::policy::{FlatMonteCarloPlayer, MoveTier, Policy};
use crate::rules::GameResult;

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "protocol_version",
    "quit",
    "name",
    "boardsize",
    "showboard",
    "clear_board",
    "komi",
    "version",
    "known_command",
    "genmove",
    "list_commands",
    "play",
    "legal_moves",
    "gogui-rules_legal_moves",
    "gogui-rules_final_result",
    "gogui-rules_captured_count",
    "gogui-rules_game_id",
    "gogui-rules_board_size",
    "gogui-rules_side_to_move",
    "gogui-rules_board",
    "gogui-analyze_commands",
    "timelimit",
    "policy",
    "policy_moves",
];

const ANALYZE_COMMANDS: &str = "pstring/Legal Moves For ToPlay/gogui-rules_legal_moves\n\
    pstring/Side to Play/gogui-rules_side_to_move\n\
    pstring/Final Result/gogui-rules_final_result\n\
    pstring/Board Size/gogui-rules_board_size\n\
    pstring/Rules GameID/gogui-rules_game_id\n\
    pstring/Show Board/gogui-rules_board\n\
    pstring/Policy Moves/policy_moves";

/// Required argument count and usage message for commands that check it.
fn arg_spec(command: &str) -> Option<(usize, &'static str)> {
    match command {
        "boardsize" => Some((1, "Usage: boardsize INT")),
        "komi" => Some((1, "Usage: komi FLOAT")),
        "known_command" => Some((1, "Usage: known_command CMD_NAME")),
        "genmove" => Some((1, "Usage: genmove {w,b}")),
        "play" => Some((2, "Usage: play {b,w} MOVE")),
        "legal_moves" => Some((1, "Usage: legal_moves {w,b}")),
        "timelimit" => Some((1, "Usage: timelimit INT")),
        "policy" => Some((1, "Usage: policy {random,rule_based}")),
        _ => None,
    }
}

/// GTP engine state.
pub struct GtpEngine {
    /// Current game
    board: Board,
    /// Move generator
    player: FlatMonteCarloPlayer,
    /// Active move generation policy
    policy: Policy,
    komi: f32,
    /// Seconds per move requested by the controller
    time_limit: u32,
    /// Write diagnostics to stderr
    debug: bool,
}

impl Default for GtpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GtpEngine {
    /// Create a new GTP engine with default settings.
    pub fn new() -> Self {
        let board = match Board::new(DEFAULT_SIZE) {
            Ok(board) => board,
            Err(e) => unreachable!("default board size rejected: {e}"),
        };
        Self::with_player(board, FlatMonteCarloPlayer::default())
    }

    /// Create a GTP engine around an existing board and player.
    pub fn with_player(board: Board, player: FlatMonteCarloPlayer) -> Self {
        Self {
            board,
            player,
            policy: Policy::default(),
            komi: 0.0,
            time_limit: 1,
            debug: false,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Run the GTP command loop on stdin and stdout.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the GTP command loop until `quit` or end of input.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read GTP command")?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            write!(output, "{prefix}{id_str} {message}\n\n")
                .context("failed to write GTP response")?;
            output.flush().context("failed to flush GTP response")?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn debug_msg(&self, msg: &str) {
        if self.debug {
            eprintln!("{msg}");
        }
    }

    /// Execute a GTP command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        if let Some((count, usage)) = arg_spec(command) {
            if args.len() != count {
                return (false, usage.to_string());
            }
        }

        match command {
            "protocol_version" => (true, "2".to_string()),

            "name" => (true, ENGINE_NAME.to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "quit" => (true, String::new()),

            "list_commands" => (true, KNOWN_COMMANDS.join(" ")),

            "known_command" => {
                let known = KNOWN_COMMANDS.contains(&args[0].to_lowercase().as_str());
                (true, known.to_string())
            }

            "boardsize" => match args[0].parse::<usize>() {
                Ok(size) => match self.board.reset(size) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                },
                Err(_) => (false, "invalid size".to_string()),
            },

            "clear_board" => {
                let size = self.board.size();
                match self.board.reset(size) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "komi" => match args[0].parse::<f32>() {
                Ok(komi) => {
                    self.komi = komi;
                    (true, String::new())
                }
                Err(_) => (false, "invalid komi".to_string()),
            },

            "showboard" => (true, format!("\n{}", self.board).trim_end().to_string()),

            "play" => self.play(args[0], args[1]),

            "genmove" => self.genmove(args[0]),

            "legal_moves" => match Color::from_gtp(args[0]) {
                Some(_) => (true, self.sorted_moves(&self.board.get_empty_points(), false)),
                None => (false, "invalid color".to_string()),
            },

            "gogui-rules_legal_moves" => {
                let decided = self.board.detect_five_in_a_row() != Color::Empty
                    || self.board.capture_winner() != Color::Empty;
                if decided {
                    (true, String::new())
                } else {
                    (true, self.sorted_moves(&self.board.get_empty_points(), false))
                }
            }

            "gogui-rules_final_result" => (true, self.board.get_final_result().to_string()),

            "gogui-rules_captured_count" => (
                true,
                format!(
                    "{} {}",
                    self.board.get_captures(Color::White),
                    self.board.get_captures(Color::Black)
                ),
            ),

            "gogui-rules_game_id" => (true, GAME_ID.to_string()),

            "gogui-rules_board_size" => (true, self.board.size().to_string()),

            "gogui-rules_side_to_move" => (true, self.board.current_player().to_string()),

            "gogui-rules_board" => (true, self.board.to_rows().trim_end().to_string()),

            "gogui-analyze_commands" => (true, ANALYZE_COMMANDS.to_string()),

            "timelimit" => match args[0].parse::<u32>() {
                Ok(seconds) => {
                    self.time_limit = seconds;
                    self.debug_msg(&format!("time limit set to {seconds}s"));
                    (true, String::new())
                }
                Err(_) => (false, "invalid time limit".to_string()),
            },

            "policy" => match args[0].parse::<Policy>() {
                Ok(policy) => {
                    self.policy = policy;
                    (true, String::new())
                }
                Err(e) => (false, e.to_string()),
            },

            "policy_moves" => {
                let (tier, moves) = match self.policy {
                    Policy::Random => (MoveTier::Random, self.board.get_empty_points()),
                    Policy::RuleBased => self.player.policy_move_list(&mut self.board),
                };
                let listed = self.sorted_moves(&moves, true);
                (true, format!("{tier} {listed}").trim_end().to_string())
            }

            _ => (false, "Unknown command".to_string()),
        }
    }

    /// Format points as GTP vertices, sorted as strings.
    fn sorted_moves(&self, moves: &[Point], lowercase: bool) -> String {
        let mut out: Vec<String> = moves
            .iter()
            .map(|&p| {
                let s = self.board.format_point(p);
                if lowercase { s.to_lowercase() } else { s }
            })
            .collect();
        out.sort();
        out.join(" ")
    }

    /// Handle `play`. Illegal moves are reported as a normal response.
    fn play(&mut self, color_arg: &str, vertex: &str) -> (bool, String) {
        let color_arg = color_arg.to_lowercase();
        let illegal = |reason: &str| {
            (true, format!("illegal move: \"{color_arg} {vertex}\" {reason}"))
        };

        let color = match color_arg.as_str() {
            "b" => Color::Black,
            "w" => Color::White,
            _ => return illegal("wrong color"),
        };
        let mv = match self.board.parse_move(vertex) {
            Ok(mv) => mv,
            Err(e) => return illegal(&e.to_string()),
        };
        match self.board.play(mv, color) {
            Ok(()) => {
                self.debug_msg(&format!("Move: {vertex}\nBoard:\n{}", self.board));
                (true, String::new())
            }
            Err(BoardError::Occupied(_)) => illegal("occupied"),
            Err(e) => illegal(&e.to_string()),
        }
    }

    /// Handle `genmove`: resign if lost, pass if won or drawn, otherwise
    /// play the active policy's move and return it in lowercase.
    fn genmove(&mut self, color_arg: &str) -> (bool, String) {
        let Some(color) = Color::from_gtp(color_arg) else {
            return (false, "invalid color".to_string());
        };

        let result = self.board.get_final_result();
        if result.winner() == Some(color.opponent()) {
            return (true, "resign".to_string());
        }
        if result != GameResult::Unknown {
            return (true, "pass".to_string());
        }

        if self.board.current_player() != color {
            self.board.set_current_player(color);
        }
        let pt = self.player.genmove(&mut self.board, self.policy);
        match self.board.play(Move::Place(pt), color) {
            Ok(()) => {
                self.debug_msg(&format!(
                    "Generated {} ({}, komi {}, time limit {}s)\nBoard:\n{}",
                    self.board.format_point(pt),
                    self.policy,
                    self.komi,
                    self.time_limit,
                    self.board
                ));
                (true, self.board.format_point(pt).to_lowercase())
            }
            Err(e) => (false, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = GtpEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = GtpEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_and_protocol() {
        let mut engine = GtpEngine::new();
        assert_eq!(engine.execute("name", &[]), (true, "Ninuki".to_string()));
        assert_eq!(engine.execute("protocol_version", &[]), (true, "2".to_string()));
        assert_eq!(engine.execute("gogui-rules_game_id", &[]), (true, "Ninuki".to_string()));
    }

    #[test]
    fn test_known_command() {
        let mut engine = GtpEngine::new();
        assert_eq!(engine.execute("known_command", &["policy_moves"]).1, "true");
        assert_eq!(engine.execute("known_command", &["solve"]).1, "false");
    }

    #[test]
    fn test_argument_count_checked() {
        let mut engine = GtpEngine::new();
        let (success, msg) = engine.execute("play", &["b"]);
        assert!(!success);
        assert_eq!(msg, "Usage: play {b,w} MOVE");
        assert!(!engine.execute("genmove", &[]).0);
    }

    #[test]
    fn test_boardsize() {
        let mut engine = GtpEngine::new();
        assert!(engine.execute("boardsize", &["9"]).0);
        assert_eq!(engine.execute("gogui-rules_board_size", &[]).1, "9");
        assert!(!engine.execute("boardsize", &["1"]).0);
        assert!(!engine.execute("boardsize", &["x"]).0);
        assert_eq!(engine.board().size(), 9);
    }

    #[test]
    fn test_play_and_clear() {
        let mut engine = GtpEngine::new();
        assert_eq!(engine.execute("play", &["b", "D4"]), (true, String::new()));
        assert_eq!(engine.execute("gogui-rules_side_to_move", &[]).1, "white");
        assert_eq!(engine.board().move_number(), 1);

        assert!(engine.execute("clear_board", &[]).0);
        assert_eq!(engine.board().move_number(), 0);
        assert_eq!(engine.execute("gogui-rules_side_to_move", &[]).1, "black");
    }

    #[test]
    fn test_illegal_play_responses() {
        let mut engine = GtpEngine::new();
        engine.execute("play", &["b", "a1"]);
        assert_eq!(
            engine.execute("play", &["w", "a1"]),
            (true, "illegal move: \"w a1\" occupied".to_string())
        );
        assert_eq!(
            engine.execute("play", &["x", "a2"]),
            (true, "illegal move: \"x a2\" wrong color".to_string())
        );
        assert_eq!(
            engine.execute("play", &["b", "z99"]),
            (true, "illegal move: \"b z99\" wrong coordinate".to_string())
        );
        assert_eq!(engine.board().move_number(), 1);
    }

    #[test]
    fn test_policy_command() {
        let mut engine = GtpEngine::new();
        assert_eq!(engine.policy(), Policy::Random);
        assert!(engine.execute("policy", &["rule_based"]).0);
        assert_eq!(engine.policy(), Policy::RuleBased);
        let (success, msg) = engine.execute("policy", &["minimax"]);
        assert!(!success);
        assert!(msg.contains("incorrect policy type"));
        assert_eq!(engine.policy(), Policy::RuleBased);
    }

    #[test]
    fn test_unknown_command() {
        let mut engine = GtpEngine::new();
        assert_eq!(
            engine.execute("solve", &[]),
            (false, "Unknown command".to_string())
        );
    }
}
