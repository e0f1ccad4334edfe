//! Move selection: flat Monte Carlo and the rule-based tier policy.
//!
//! Flat Monte Carlo plays every legal move, runs a fixed number of random
//! playouts from the resulting position and picks the move with the best
//! average outcome for the side to move.
//!
//! The rule-based policy sorts legal moves into tiers checked in priority
//! order (Win, BlockWin, OpenFour, Capture) and falls back to all moves
//! (Random) when every tier is empty.
//!
//! All exploratory moves go through [`Board::trial`], so the board is
//! always returned to its original state.

use std::fmt;
use std::str::FromStr;

use fastrand::Rng;
use rayon::prelude::*;

use crate::board::{Board, Color, Point};
use crate::constants::{DEFAULT_SIMULATIONS, OPEN_FOUR_MIN_SIZE};
use crate::playout::simulate;
use crate::rules::GameResult;

/// Move generation policy selected over GTP with `policy`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Policy {
    /// Flat Monte Carlo with uniformly random playouts
    #[default]
    Random,
    /// Tiered rule-based move classification
    RuleBased,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Random => f.write_str("random"),
            Policy::RuleBased => f.write_str("rule_based"),
        }
    }
}

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyParseError(pub String);

impl fmt::Display for PolicyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incorrect policy type: {} type 'random' or 'rule_based'",
            self.0
        )
    }
}

impl std::error::Error for PolicyParseError {}

impl FromStr for Policy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Policy::Random),
            "rule_based" | "rule-based" => Ok(Policy::RuleBased),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

/// Priority tier of the rule-based policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MoveTier {
    /// The move wins immediately
    Win,
    /// The opponent would win by playing here, or a capture defuses that
    BlockWin,
    /// The move makes an open four
    OpenFour,
    /// The move captures a pair
    Capture,
    /// No tier applies; all legal moves
    Random,
}

impl fmt::Display for MoveTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveTier::Win => "Win",
            MoveTier::BlockWin => "BlockWin",
            MoveTier::OpenFour => "OpenFour",
            MoveTier::Capture => "Capture",
            MoveTier::Random => "Random",
        };
        f.write_str(name)
    }
}

/// Playout outcomes counted from Black's point of view.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub black_wins: usize,
    pub white_wins: usize,
    pub draws: usize,
}

impl Stats {
    pub fn record(&mut self, winner: Color) {
        match winner {
            Color::Black => self.black_wins += 1,
            Color::White => self.white_wins += 1,
            _ => self.draws += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.black_wins + self.white_wins + self.draws
    }

    /// Win rate for `mover`, counting a draw as half a win.
    pub fn score_for(&self, mover: Color) -> f64 {
        let black = (self.black_wins as f64 + 0.5 * self.draws as f64) / self.total() as f64;
        if mover == Color::White { 1.0 - black } else { black }
    }
}

/// Play `mv` for the side to move and run `sims` playouts from there.
///
/// Each playout is rolled back to the position after `mv`; `mv` itself is
/// undone before returning.
pub fn evaluate_move(board: &mut Board, mv: Point, sims: usize, rng: &mut Rng) -> Stats {
    let mover = board.current_player();
    let mut stats = Stats::default();
    let mut trial = board.trial();
    let played = trial.play_move(mv, mover);
    assert!(played, "evaluated move is not legal");
    let checkpoint = trial.move_number();
    for _ in 0..sims {
        stats.record(simulate(&mut trial, rng));
        trial.reset_to_move_number(checkpoint);
    }
    debug_assert_eq!(stats.total(), sims, "playout tally does not match");
    debug_assert_eq!(trial.move_number(), checkpoint);
    stats
}

/// Index of the first maximum.
fn best_index(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

/// Sort the legal moves of the side to move into the first non-empty tier.
///
/// Tiers, in priority order:
/// 1. `Win`: the move ends the game in the mover's favor.
/// 2. `BlockWin`: the opponent would win by playing this point. Capturing
///    moves after which the opponent's winning point no longer wins are
///    appended, checked pairwise against each such point.
/// 3. `OpenFour`: the move makes an open four (boards larger than 5 only).
/// 4. `Capture`: the move captures at least one pair.
/// 5. `Random`: every legal move.
///
/// Leaves the board unchanged.
pub fn policy_move_list(board: &mut Board) -> (MoveTier, Vec<Point>) {
    let moves = board.get_empty_points();
    let mover = board.current_player();
    let opp = mover.opponent();
    let mover_wins = GameResult::win_for(mover);
    let opp_wins = GameResult::win_for(opp);
    let prev_captures = board.get_captures(mover);
    let check_open_four = board.size() > OPEN_FOUR_MIN_SIZE;

    let mut wins = Vec::new();
    let mut blocks = Vec::new();
    let mut open_fours = Vec::new();
    let mut captures = Vec::new();

    for &mv in &moves {
        {
            let mut trial = board.trial();
            trial.play_move(mv, mover);
            if trial.get_final_result() == mover_wins {
                wins.push(mv);
            }
            if check_open_four && trial.detect_open_four(mover) {
                open_fours.push(mv);
            }
            if trial.get_captures(mover) > prev_captures {
                captures.push(mv);
            }
        }
        let mut trial = board.trial();
        trial.play_move(mv, opp);
        if trial.get_final_result() == opp_wins {
            blocks.push(mv);
        }
    }

    if !blocks.is_empty() && !captures.is_empty() {
        let mut defusing = Vec::new();
        for &threat in &blocks {
            for &cap in &captures {
                let mut trial = board.trial();
                trial.play_move(cap, mover);
                // Fails when cap == threat; occupying the point blocks it.
                trial.play_move(threat, opp);
                if trial.get_final_result() != opp_wins
                    && !blocks.contains(&cap)
                    && !defusing.contains(&cap)
                {
                    defusing.push(cap);
                }
            }
        }
        blocks.extend(defusing);
    }

    [
        (MoveTier::Win, wins),
        (MoveTier::BlockWin, blocks),
        (MoveTier::OpenFour, open_fours),
        (MoveTier::Capture, captures),
    ]
    .into_iter()
    .find(|(_, tier)| !tier.is_empty())
    .unwrap_or((MoveTier::Random, moves))
}

/// Flat Monte Carlo player with a rule-based alternative.
pub struct FlatMonteCarloPlayer {
    num_simulations: usize,
    parallel: bool,
    debug: bool,
    rng: Rng,
}

impl Default for FlatMonteCarloPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATIONS)
    }
}

impl FlatMonteCarloPlayer {
    /// Create a player running `num_simulations` playouts per candidate.
    ///
    /// # Panics
    /// If `num_simulations` is zero.
    pub fn new(num_simulations: usize) -> Self {
        assert!(num_simulations > 0, "need at least one simulation per move");
        Self {
            num_simulations,
            parallel: false,
            debug: false,
            rng: Rng::new(),
        }
    }

    /// Seed the player's random source for reproducible play.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self
    }

    /// Evaluate candidate moves on a rayon thread pool, one board clone per
    /// candidate.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Print per-move scores and the chosen tier to stderr.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn num_simulations(&self) -> usize {
        self.num_simulations
    }

    pub fn name(&self) -> String {
        format!("Flat Monte Carlo Player ({} sim.)", self.num_simulations)
    }

    /// Generate a move for the side to move with the given policy.
    pub fn genmove(&mut self, board: &mut Board, policy: Policy) -> Point {
        match policy {
            Policy::Random => self.genmove_random(board),
            Policy::RuleBased => self.genmove_policy(board),
        }
    }

    /// Flat Monte Carlo: the legal move with the best playout score, the
    /// first one in point order on ties.
    ///
    /// # Panics
    /// If the game is already over.
    pub fn genmove_random(&mut self, board: &mut Board) -> Point {
        assert!(!board.end_of_game(), "genmove called on a finished game");
        let moves = board.get_empty_points();
        let sims = self.num_simulations;
        let mover = board.current_player();
        let seeds: Vec<u64> = moves.iter().map(|_| self.rng.u64(..)).collect();

        let stats: Vec<Stats> = if self.parallel {
            let shared: &Board = &*board;
            moves
                .par_iter()
                .zip(seeds.par_iter())
                .map(|(&mv, &seed)| {
                    let mut local = shared.clone();
                    evaluate_move(&mut local, mv, sims, &mut Rng::with_seed(seed))
                })
                .collect()
        } else {
            moves
                .iter()
                .zip(&seeds)
                .map(|(&mv, &seed)| {
                    evaluate_move(&mut *board, mv, sims, &mut Rng::with_seed(seed))
                })
                .collect()
        };

        let scores: Vec<f64> = stats.iter().map(|s| s.score_for(mover)).collect();
        let best = best_index(&scores);
        if self.debug {
            for (&mv, s) in moves.iter().zip(&stats) {
                eprintln!(
                    "move {} b={} w={} d={} score={:.3}",
                    board.format_point(mv),
                    s.black_wins,
                    s.white_wins,
                    s.draws,
                    s.score_for(mover)
                );
            }
            eprintln!("best {} score={:.3}", board.format_point(moves[best]), scores[best]);
        }
        moves[best]
    }

    /// Rule-based: a uniformly random move from the first non-empty tier.
    ///
    /// Tiers hold distinct points, so a capture that defuses several threats
    /// is no more likely to be picked than any other block.
    ///
    /// # Panics
    /// If the game is already over.
    pub fn genmove_policy(&mut self, board: &mut Board) -> Point {
        assert!(!board.end_of_game(), "genmove called on a finished game");
        let (tier, moves) = policy_move_list(board);
        let mv = moves[self.rng.usize(..moves.len())];
        if self.debug {
            eprintln!("tier {tier} ({} moves) -> {}", moves.len(), board.format_point(mv));
        }
        mv
    }

    /// See [`policy_move_list`].
    pub fn policy_move_list(&self, board: &mut Board) -> (MoveTier, Vec<Point>) {
        policy_move_list(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(board: &mut Board, color: Color, stones: &[(usize, usize)]) {
        for &(row, col) in stones {
            let p = board.pt(row, col);
            assert!(board.play_move(p, color), "could not place at {row},{col}");
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("random".parse::<Policy>(), Ok(Policy::Random));
        assert_eq!("RULE_BASED".parse::<Policy>(), Ok(Policy::RuleBased));
        assert!("greedy".parse::<Policy>().is_err());
        assert_eq!(Policy::RuleBased.to_string(), "rule_based");
    }

    #[test]
    fn test_stats_score() {
        let stats = Stats {
            black_wins: 6,
            white_wins: 2,
            draws: 2,
        };
        assert_eq!(stats.total(), 10);
        assert!((stats.score_for(Color::Black) - 0.7).abs() < 1e-9);
        assert!((stats.score_for(Color::White) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_best_index_prefers_first() {
        assert_eq!(best_index(&[0.2, 0.5, 0.5, 0.1]), 1);
        assert_eq!(best_index(&[0.0]), 0);
    }

    #[test]
    fn test_evaluate_move_restores_board() {
        let mut board = Board::new(5).unwrap();
        place(&mut board, Color::Black, &[(3, 3)]);
        let before = board.clone();
        let mv = board.pt(2, 2);
        let stats = evaluate_move(&mut board, mv, 8, &mut Rng::with_seed(3));
        assert_eq!(stats.total(), 8);
        assert_eq!(board.history(), before.history());
        assert_eq!(board.get_empty_points(), before.get_empty_points());
        assert_eq!(board.current_player(), before.current_player());
    }

    #[test]
    fn test_first_move_is_random_tier() {
        let mut board = Board::new(5).unwrap();
        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::Random);
        assert_eq!(moves.len(), 25);
    }

    #[test]
    fn test_win_tier() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(1, 1), (1, 2), (1, 3), (1, 4)]);
        place(&mut board, Color::White, &[(3, 1), (3, 2), (3, 3), (7, 7)]);
        assert_eq!(board.current_player(), Color::Black);

        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::Win);
        assert_eq!(moves, vec![board.pt(1, 5)]);
    }

    #[test]
    fn test_block_win_tier() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(7, 7), (5, 7)]);
        place(&mut board, Color::White, &[(3, 1), (3, 2), (3, 3), (3, 4)]);
        assert_eq!(board.current_player(), Color::Black);

        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::BlockWin);
        assert_eq!(moves, vec![board.pt(3, 5)]);
    }

    #[test]
    fn test_capture_defusing_threat_joins_block_win() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(7, 7), (6, 7), (5, 3)]);
        place(&mut board, Color::White, &[(3, 1), (3, 2), (3, 3), (3, 4), (4, 3)]);
        assert_eq!(board.current_player(), Color::Black);

        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::BlockWin);
        assert_eq!(moves, vec![board.pt(3, 5), board.pt(2, 3)]);
    }

    #[test]
    fn test_capture_defusing_two_threats_listed_once() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(5, 3)]);
        place(&mut board, Color::White, &[(3, 2), (3, 3), (3, 4), (3, 5), (4, 3)]);
        board.set_current_player(Color::Black);

        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::BlockWin);
        assert_eq!(moves, vec![board.pt(3, 1), board.pt(3, 6), board.pt(2, 3)]);

        let mut player = FlatMonteCarloPlayer::new(1).with_seed(5);
        for _ in 0..20 {
            assert!(moves.contains(&player.genmove_policy(&mut board)));
        }
    }

    #[test]
    fn test_open_four_tier() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(2, 2), (2, 3), (2, 4)]);
        place(&mut board, Color::White, &[(7, 7), (6, 7), (7, 1)]);

        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::OpenFour);
        assert_eq!(moves, vec![board.pt(2, 5)]);
    }

    #[test]
    fn test_open_four_ignored_on_small_board() {
        let mut board = Board::new(5).unwrap();
        place(&mut board, Color::Black, &[(3, 2), (3, 3), (3, 4)]);
        place(&mut board, Color::White, &[(5, 5), (5, 1), (1, 3)]);
        let (tier, _) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::Random);
    }

    #[test]
    fn test_capture_tier() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(4, 1)]);
        place(&mut board, Color::White, &[(4, 2), (4, 3)]);
        board.set_current_player(Color::Black);

        let (tier, moves) = policy_move_list(&mut board);
        assert_eq!(tier, MoveTier::Capture);
        assert_eq!(moves, vec![board.pt(4, 4)]);
    }

    #[test]
    fn test_classification_leaves_board_unchanged() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(7, 7), (6, 7), (5, 3)]);
        place(&mut board, Color::White, &[(3, 1), (3, 2), (3, 3), (3, 4), (4, 3)]);
        let before = board.clone();
        policy_move_list(&mut board);
        assert_eq!(board.history(), before.history());
        assert_eq!(board.to_rows(), before.to_rows());
        assert_eq!(board.current_player(), before.current_player());
        assert_eq!(board.get_captures(Color::Black), 0);
    }

    #[test]
    fn test_genmove_random_single_legal_move() {
        let mut board = Board::new(2).unwrap();
        place(&mut board, Color::Black, &[(1, 1)]);
        place(&mut board, Color::White, &[(1, 2)]);
        place(&mut board, Color::Black, &[(2, 1)]);

        let mut player = FlatMonteCarloPlayer::new(1);
        assert_eq!(player.genmove_random(&mut board), board.pt(2, 2));
        assert_eq!(board.move_number(), 3);
    }

    #[test]
    fn test_genmove_random_takes_immediate_win() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(1, 1), (1, 2), (1, 3), (1, 4)]);
        place(&mut board, Color::White, &[(5, 1), (5, 2), (5, 3), (7, 7)]);

        let mut player = FlatMonteCarloPlayer::new(10).with_seed(11);
        assert_eq!(player.genmove_random(&mut board), board.pt(1, 5));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut board = Board::new(5).unwrap();
        place(&mut board, Color::Black, &[(3, 3)]);
        place(&mut board, Color::White, &[(2, 2)]);

        let mut seq = FlatMonteCarloPlayer::new(4).with_seed(5);
        let mut par = FlatMonteCarloPlayer::new(4).with_seed(5).with_parallel(true);
        let a = seq.genmove_random(&mut board);
        let b = par.genmove_random(&mut board);
        assert_eq!(a, b);
        assert_eq!(board.move_number(), 2);
    }

    #[test]
    fn test_genmove_policy_picks_from_tier() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(7, 7), (5, 7)]);
        place(&mut board, Color::White, &[(3, 1), (3, 2), (3, 3), (3, 4)]);
        let mut player = FlatMonteCarloPlayer::default().with_seed(1);
        assert_eq!(player.genmove(&mut board, Policy::RuleBased), board.pt(3, 5));
    }

    #[test]
    #[should_panic(expected = "finished game")]
    fn test_genmove_on_finished_game_panics() {
        let mut board = Board::new(7).unwrap();
        place(&mut board, Color::Black, &[(1, 1), (1, 2), (1, 3), (1, 4), (1, 5)]);
        FlatMonteCarloPlayer::new(1).genmove_random(&mut board);
    }
}
