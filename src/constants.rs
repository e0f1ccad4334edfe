//! Constants for board dimensions, game rules, and engine parameters.
//!
//! The board uses a 1D array representation with a one-cell border on every
//! side, so a board of size `n` occupies `(n + 2) * (n + 2)` cells.

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest supported board size.
pub const MIN_SIZE: usize = 2;

/// Largest supported board size (limited by the GTP column letters).
pub const MAX_SIZE: usize = 25;

/// Board size used when none is given.
pub const DEFAULT_SIZE: usize = 7;

// =============================================================================
// Game Rules
// =============================================================================

/// Number of captured stones that wins the game.
pub const CAPTURE_WIN: u32 = 10;

/// Number of consecutive stones that wins the game.
pub const FIVE: usize = 5;

/// Open fours are only considered on boards larger than this.
pub const OPEN_FOUR_MIN_SIZE: usize = 5;

// =============================================================================
// Engine Parameters
// =============================================================================

/// Default number of random playouts per candidate move.
pub const DEFAULT_SIMULATIONS: usize = 10;

/// Engine name reported over GTP.
pub const ENGINE_NAME: &str = "Ninuki";

/// Game id reported by `gogui-rules_game_id`.
pub const GAME_ID: &str = "Ninuki";

/// GTP column letters. 'I' is skipped.
pub const COLUMN_LETTERS: &[u8; MAX_SIZE] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";
