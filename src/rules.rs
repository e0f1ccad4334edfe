//! Ninuki rules: pair captures, five in a row, open fours and game result.
//!
//! All functions are pure reads of a [`Board`]. Lines are scanned along the
//! four axes (horizontal, vertical, and both diagonals); captures look in
//! both directions of each axis, so all 8 neighbors are covered.

use std::fmt;

use crate::board::{Board, Color, Point};
use crate::constants::{CAPTURE_WIN, FIVE};

/// Outcome of a game as reported by `gogui-rules_final_result`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GameResult {
    Black,
    White,
    Draw,
    /// The game is still in progress
    Unknown,
}

impl GameResult {
    /// The result in which `color` has won.
    pub fn win_for(color: Color) -> GameResult {
        match color {
            Color::Black => GameResult::Black,
            Color::White => GameResult::White,
            other => panic!("{other} cannot win"),
        }
    }

    /// Winning color, if any.
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::Black => Some(Color::Black),
            GameResult::White => Some(Color::White),
            GameResult::Draw | GameResult::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::Black => "black",
            GameResult::White => "white",
            GameResult::Draw => "draw",
            GameResult::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Offsets along the 4 axes: East, North, North-East, North-West.
#[inline]
fn axes(board: &Board) -> [isize; 4] {
    let w = board.width() as isize;
    [1, w, w + 1, w - 1]
}

#[inline]
fn step(pt: Point, d: isize) -> Point {
    (pt as isize + d) as usize
}

/// Number of consecutive `color` stones starting at `pt` and walking by `d`.
fn run_length(board: &Board, pt: Point, d: isize, color: Color) -> usize {
    let mut len = 0;
    let mut p = pt;
    while board.get_color(p) == color {
        len += 1;
        p = step(p, d);
    }
    len
}

/// Stones captured by a `color` stone just placed at `pt`.
///
/// In each of the 8 directions, two opponent stones followed by a `color`
/// stone are captured. Several directions may capture at once.
pub fn find_captures(board: &Board, pt: Point, color: Color) -> Vec<Point> {
    let opp = color.opponent();
    let mut captured = Vec::new();
    for axis in axes(board) {
        for d in [axis, -axis] {
            let p1 = step(pt, d);
            if board.get_color(p1) != opp {
                continue;
            }
            let p2 = step(p1, d);
            if board.get_color(p2) != opp {
                continue;
            }
            if board.get_color(step(p2, d)) == color {
                captured.push(p1);
                captured.push(p2);
            }
        }
    }
    captured
}

/// Lengths of every maximal run of `color`, with the run's start and axis.
fn runs(board: &Board, color: Color) -> impl Iterator<Item = (Point, isize, usize)> + '_ {
    let axes = axes(board);
    board
        .points()
        .filter(move |&p| board.get_color(p) == color)
        .flat_map(move |p| {
            axes.into_iter()
                .filter(move |&d| board.get_color(step(p, -d)) != color)
                .map(move |d| (p, d, run_length(board, p, d, color)))
        })
}

/// True if `color` has five or more stones in a row.
pub fn has_five(board: &Board, color: Color) -> bool {
    runs(board, color).any(|(_, _, len)| len >= FIVE)
}

/// Color with five or more in a row, or `Empty`. Black is checked first.
pub fn detect_five_in_a_row(board: &Board) -> Color {
    if has_five(board, Color::Black) {
        Color::Black
    } else if has_five(board, Color::White) {
        Color::White
    } else {
        Color::Empty
    }
}

/// True if `color` has exactly four in a row with both ends empty.
pub fn detect_open_four(board: &Board, color: Color) -> bool {
    runs(board, color).any(|(start, d, len)| {
        len == 4
            && board.get_color(step(start, -d)) == Color::Empty
            && board.get_color(step(start, 4 * d)) == Color::Empty
    })
}

/// Result of the game in its current state.
///
/// Five in a row and the capture threshold both win; Black is reported
/// first if both colors qualify. A full board with no winner is a draw.
pub fn get_final_result(board: &Board) -> GameResult {
    let five = detect_five_in_a_row(board);
    let captures = board.capture_winner();
    if five == Color::Black || captures == Color::Black {
        GameResult::Black
    } else if five == Color::White || captures == Color::White {
        GameResult::White
    } else if !board.has_empty_point() {
        GameResult::Draw
    } else {
        GameResult::Unknown
    }
}

/// True once either side has won or the board is full.
pub fn end_of_game(board: &Board) -> bool {
    board.get_captures(Color::Black) >= CAPTURE_WIN
        || board.get_captures(Color::White) >= CAPTURE_WIN
        || !board.has_empty_point()
        || detect_five_in_a_row(board) != Color::Empty
}
