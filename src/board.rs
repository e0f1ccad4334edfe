//! Ninuki board representation with an undoable move history.
//!
//! The board is a 1D array with a one-cell border on every side, so that
//! stepping one cell in any of the 8 directions from an on-board point never
//! leaves the array. A point is `row * width + col` with `row` and `col` in
//! `1..=size`; row 1 is the bottom row ("A1" in GTP).
//!
//! Every applied move pushes a [`MoveRecord`] holding everything needed to
//! reverse it exactly. Rollouts and speculative evaluation rely on strict
//! play/undo pairing, either directly through [`Board::undo_move`] and
//! [`Board::reset_to_move_number`] or through the [`Trial`] guard.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::constants::{CAPTURE_WIN, COLUMN_LETTERS, MAX_SIZE, MIN_SIZE};
use crate::rules::{self, GameResult};

/// A point on the board, represented as an index into the 1D board array.
pub type Point = usize;

/// Contents of a board cell, also used for players and winners.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Empty,
    Black,
    White,
    Border,
}

impl Color {
    /// The other player. `Empty` and `Border` map to themselves.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            other => other,
        }
    }

    /// True for `Black` and `White`.
    #[inline]
    pub fn is_stone(self) -> bool {
        matches!(self, Color::Black | Color::White)
    }

    /// Parse a GTP color argument (`b`, `w`, `black`, `white`).
    pub fn from_gtp(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }

    fn capture_index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
            other => panic!("{other} has no capture count"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Empty => "empty",
            Color::Black => "black",
            Color::White => "white",
            Color::Border => "border",
        };
        f.write_str(name)
    }
}

/// A move: either a stone on a point or a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Place(Point),
    Pass,
}

/// Errors reported by board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Board size outside `MIN_SIZE..=MAX_SIZE`
    InvalidSize(usize),
    /// Point is a border cell or outside the array
    OffBoard(Point),
    /// Point already holds a stone
    Occupied(Point),
    /// Coordinate string could not be parsed for this board
    WrongCoordinate(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidSize(size) => {
                write!(f, "board size {size} out of range {MIN_SIZE}..={MAX_SIZE}")
            }
            BoardError::OffBoard(_) => write!(f, "off board"),
            BoardError::Occupied(_) => write!(f, "occupied"),
            BoardError::WrongCoordinate(_) => write!(f, "wrong coordinate"),
        }
    }
}

impl std::error::Error for BoardError {}

/// One entry of the move history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub mv: Move,
    /// Color the move was played for
    pub color: Color,
    /// Side to move before this move was applied
    pub prev_player: Color,
    /// Stones removed by this move, with the color they had
    pub captured: Vec<(Point, Color)>,
}

/// A Ninuki board: grid, side to move, capture counts and move history.
#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    width: usize,
    grid: Vec<Color>,
    current_player: Color,
    /// Stones captured by Black and White, in that order
    captures: [u32; 2],
    history: Vec<MoveRecord>,
}

impl Board {
    /// Create an empty board with Black to move.
    pub fn new(size: usize) -> Result<Self, BoardError> {
        let mut board = Board {
            size: 0,
            width: 0,
            grid: Vec::new(),
            current_player: Color::Black,
            captures: [0; 2],
            history: Vec::new(),
        };
        board.reset(size)?;
        Ok(board)
    }

    /// Clear the board and resize it. On error the board is left unchanged.
    pub fn reset(&mut self, size: usize) -> Result<(), BoardError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(BoardError::InvalidSize(size));
        }
        let width = size + 2;
        let mut grid = vec![Color::Border; width * width];
        for row in 1..=size {
            for col in 1..=size {
                grid[row * width + col] = Color::Empty;
            }
        }
        self.size = size;
        self.width = width;
        self.grid = grid;
        self.current_player = Color::Black;
        self.captures = [0; 2];
        self.history.clear();
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row stride of the padded array (`size + 2`).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn current_player(&self) -> Color {
        self.current_player
    }

    /// Hand the move to `color` without playing a stone.
    pub fn set_current_player(&mut self, color: Color) {
        assert!(color.is_stone(), "cannot give the move to {color}");
        self.current_player = color;
    }

    /// Number of moves in the history. Used as a rollback checkpoint.
    #[inline]
    pub fn move_number(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|r| r.mv)
    }

    /// Color at `point`. Anything outside the array reads as `Border`.
    #[inline]
    pub fn get_color(&self, point: Point) -> Color {
        self.grid.get(point).copied().unwrap_or(Color::Border)
    }

    /// Number of opponent stones captured by `color`.
    pub fn get_captures(&self, color: Color) -> u32 {
        self.captures[color.capture_index()]
    }

    /// Number of stones of `color` on the board.
    pub fn stone_count(&self, color: Color) -> usize {
        self.grid.iter().filter(|&&c| c == color).count()
    }

    /// Convert a 1-based (row, col) pair to a point.
    #[inline]
    pub fn pt(&self, row: usize, col: usize) -> Point {
        debug_assert!((1..=self.size).contains(&row) && (1..=self.size).contains(&col));
        row * self.width + col
    }

    /// Convert a point back to its 1-based (row, col) pair.
    #[inline]
    pub fn point_to_coord(&self, point: Point) -> (usize, usize) {
        (point / self.width, point % self.width)
    }

    #[inline]
    pub fn is_on_board(&self, point: Point) -> bool {
        !matches!(self.get_color(point), Color::Border)
    }

    /// All on-board points in ascending index order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (size, width) = (self.size, self.width);
        (1..=size).flat_map(move |row| (1..=size).map(move |col| row * width + col))
    }

    /// Empty points in ascending index order. Every empty point is legal.
    pub fn get_empty_points(&self) -> Vec<Point> {
        self.points()
            .filter(|&p| self.grid[p] == Color::Empty)
            .collect()
    }

    pub fn has_empty_point(&self) -> bool {
        self.points().any(|p| self.grid[p] == Color::Empty)
    }

    /// Play `mv` for `color`.
    ///
    /// On success the captures are applied, a history entry is pushed and
    /// the opponent of `color` is to move. On error nothing changes.
    ///
    /// # Panics
    /// If `color` is not `Black` or `White`.
    pub fn play(&mut self, mv: Move, color: Color) -> Result<(), BoardError> {
        assert!(color.is_stone(), "cannot play a move for {color}");

        let mut captured = Vec::new();
        if let Move::Place(point) = mv {
            match self.get_color(point) {
                Color::Empty => {}
                Color::Border => return Err(BoardError::OffBoard(point)),
                _ => return Err(BoardError::Occupied(point)),
            }
            self.grid[point] = color;
            for p in rules::find_captures(self, point, color) {
                captured.push((p, self.grid[p]));
                self.grid[p] = Color::Empty;
            }
            self.captures[color.capture_index()] += captured.len() as u32;
        }

        self.history.push(MoveRecord {
            mv,
            color,
            prev_player: self.current_player,
            captured,
        });
        self.current_player = color.opponent();
        Ok(())
    }

    /// Place a stone of `color` at `point`. Returns false, without changing
    /// anything, if the point is occupied or off the board.
    pub fn play_move(&mut self, point: Point, color: Color) -> bool {
        self.play(Move::Place(point), color).is_ok()
    }

    /// Undo the most recent move, restoring the exact prior state.
    ///
    /// # Panics
    /// If the history is empty.
    pub fn undo_move(&mut self) {
        let Some(record) = self.history.pop() else {
            panic!("undo_move called with an empty move history");
        };
        if let Move::Place(point) = record.mv {
            self.grid[point] = Color::Empty;
            for &(p, c) in &record.captured {
                self.grid[p] = c;
            }
            self.captures[record.color.capture_index()] -= record.captured.len() as u32;
        }
        self.current_player = record.prev_player;
    }

    /// Undo moves until `move_number() == n`.
    ///
    /// # Panics
    /// If `n` is ahead of the current move number.
    pub fn reset_to_move_number(&mut self, n: usize) {
        assert!(
            n <= self.move_number(),
            "cannot reset to move {n}, only {} moves played",
            self.move_number()
        );
        while self.move_number() > n {
            self.undo_move();
        }
    }

    /// Start a speculative evaluation. Every move played through the
    /// returned guard is undone when it goes out of scope.
    pub fn trial(&mut self) -> Trial<'_> {
        let checkpoint = self.move_number();
        Trial {
            board: self,
            checkpoint,
        }
    }

    /// Color with five or more in a row, or `Empty`.
    pub fn detect_five_in_a_row(&self) -> Color {
        rules::detect_five_in_a_row(self)
    }

    /// True if `color` has an open four.
    pub fn detect_open_four(&self, color: Color) -> bool {
        rules::detect_open_four(self, color)
    }

    pub fn get_final_result(&self) -> GameResult {
        rules::get_final_result(self)
    }

    pub fn end_of_game(&self) -> bool {
        rules::end_of_game(self)
    }

    /// Color that has reached the capture threshold, or `Empty`.
    pub fn capture_winner(&self) -> Color {
        if self.get_captures(Color::Black) >= CAPTURE_WIN {
            Color::Black
        } else if self.get_captures(Color::White) >= CAPTURE_WIN {
            Color::White
        } else {
            Color::Empty
        }
    }

    /// Parse a GTP vertex such as "C3" or "pass" for this board size.
    ///
    /// Columns run A-Z skipping I; rows start at 1.
    pub fn parse_move(&self, s: &str) -> Result<Move, BoardError> {
        let wrong = || BoardError::WrongCoordinate(s.to_string());
        let lower = s.trim().to_ascii_lowercase();
        if lower == "pass" {
            return Ok(Move::Pass);
        }

        let col_c = lower.chars().next().ok_or_else(wrong)?;
        if !col_c.is_ascii_lowercase() || col_c == 'i' {
            return Err(wrong());
        }
        let mut col = (col_c as u8 - b'a') as usize;
        if col_c < 'i' {
            col += 1;
        }
        let row: usize = lower[1..].parse().map_err(|_| wrong())?;
        if row < 1 || row > self.size || col > self.size {
            return Err(wrong());
        }
        Ok(Move::Place(self.pt(row, col)))
    }

    /// Format a point as a GTP vertex such as "C3".
    pub fn format_point(&self, point: Point) -> String {
        let (row, col) = self.point_to_coord(point);
        format!("{}{row}", COLUMN_LETTERS[col - 1] as char)
    }

    /// Format a move as a GTP vertex, "PASS" for a pass.
    pub fn format_move(&self, mv: Move) -> String {
        match mv {
            Move::Place(point) => self.format_point(point),
            Move::Pass => "PASS".to_string(),
        }
    }

    /// Board rows top to bottom as `X`/`O`/`.` lines, without labels.
    pub fn to_rows(&self) -> String {
        let mut out = String::with_capacity(self.size * (self.size + 1));
        for row in (1..=self.size).rev() {
            for col in 1..=self.size {
                out.push(cell_char(self.grid[self.pt(row, col)]));
            }
            out.push('\n');
        }
        out
    }
}

fn cell_char(color: Color) -> char {
    match color {
        Color::Black => 'X',
        Color::White => 'O',
        Color::Empty => '.',
        Color::Border => '#',
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (1..=self.size).rev() {
            write!(f, "{row:>2} ")?;
            for col in 1..=self.size {
                write!(f, "{} ", cell_char(self.grid[self.pt(row, col)]))?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for &letter in &COLUMN_LETTERS[..self.size] {
            write!(f, "{} ", letter as char)?;
        }
        writeln!(f)
    }
}

/// Scoped speculative mutation of a [`Board`].
///
/// Dereferences to the board. On drop, including during unwinding, the board
/// is reset to the move number it had when the trial started.
pub struct Trial<'a> {
    board: &'a mut Board,
    checkpoint: usize,
}

impl Trial<'_> {
    /// Move number the board returns to when the trial ends.
    pub fn checkpoint(&self) -> usize {
        self.checkpoint
    }
}

impl Deref for Trial<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        &*self.board
    }
}

impl DerefMut for Trial<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        &mut *self.board
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        self.board.reset_to_move_number(self.checkpoint);
    }
}
