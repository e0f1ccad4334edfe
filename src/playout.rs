//! Random playouts (game simulation to the end).
//!
//! A playout picks uniformly random empty points for the side to move until
//! the game is decided. The board is left at the final position; callers
//! roll back with [`Board::reset_to_move_number`] or a [`Board::trial`].

use fastrand::Rng;

use crate::board::{Board, Color};
use crate::rules::{get_final_result, GameResult};

/// Play random moves until the game ends and return the winner, or `Empty`
/// for a draw.
///
/// Terminates because every move fills a cell and only pair captures,
/// bounded by the capture threshold, empty cells again.
pub fn simulate(board: &mut Board, rng: &mut Rng) -> Color {
    loop {
        match get_final_result(board) {
            GameResult::Unknown => {}
            result => return result.winner().unwrap_or(Color::Empty),
        }
        let moves = board.get_empty_points();
        let pt = moves[rng.usize(..moves.len())];
        let color = board.current_player();
        let played = board.play_move(pt, color);
        debug_assert!(played, "empty point rejected during playout");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CAPTURE_WIN;

    #[test]
    fn test_simulate_reaches_terminal_state() {
        let mut board = Board::new(7).unwrap();
        let mut rng = Rng::with_seed(7);
        for _ in 0..20 {
            let winner = simulate(&mut board, &mut rng);
            assert!(board.end_of_game());
            match winner {
                Color::Empty => assert!(board.get_empty_points().is_empty()),
                color => assert_eq!(board.get_final_result().winner(), Some(color)),
            }
            board.reset_to_move_number(0);
        }
    }

    #[test]
    fn test_simulate_bounded_move_count() {
        let mut board = Board::new(5).unwrap();
        let mut rng = Rng::with_seed(42);
        for _ in 0..50 {
            simulate(&mut board, &mut rng);
            // Each capture reopens two cells; at most CAPTURE_WIN stones
            // per side can be captured before the game ends.
            let bound = 25 + 2 * CAPTURE_WIN as usize;
            assert!(board.move_number() <= bound);
            board.reset_to_move_number(0);
        }
    }

    #[test]
    fn test_simulate_on_finished_game_plays_nothing() {
        let mut board = Board::new(2).unwrap();
        for (i, p) in board.get_empty_points().into_iter().enumerate() {
            let color = if i % 2 == 0 { Color::Black } else { Color::White };
            board.play_move(p, color);
        }
        let mut rng = Rng::with_seed(1);
        assert_eq!(simulate(&mut board, &mut rng), Color::Empty);
        assert_eq!(board.move_number(), 4);
    }

    #[test]
    fn test_simulate_is_reproducible_with_seed() {
        let mut a = Board::new(6).unwrap();
        let mut b = Board::new(6).unwrap();
        let wa = simulate(&mut a, &mut Rng::with_seed(99));
        let wb = simulate(&mut b, &mut Rng::with_seed(99));
        assert_eq!(wa, wb);
        assert_eq!(a.history(), b.history());
    }
}
