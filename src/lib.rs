//! Ninuki: a capture-and-five board game engine.
//!
//! Ninuki is played on a square board. Players alternately place stones;
//! bracketing exactly two enemy stones in a line captures them. A player
//! wins with five or more in a row or with ten captured stones.
//!
//! ## Modules
//!
//! - [`constants`] - Board limits, rule thresholds and engine defaults
//! - [`board`] - Board state, play/undo, coordinates
//! - [`rules`] - Captures, five in a row, open fours, game result
//! - [`playout`] - Random game simulation
//! - [`policy`] - Flat Monte Carlo and rule-based move selection
//! - [`gtp`] - Go Text Protocol front end
//!
//! ## Example
//!
//! ```
//! use ninuki::board::{Board, Color};
//! use ninuki::policy::{FlatMonteCarloPlayer, Policy};
//!
//! let mut board = Board::new(7).unwrap();
//! let pt = board.pt(4, 4);
//! assert!(board.play_move(pt, Color::Black));
//!
//! let mut player = FlatMonteCarloPlayer::new(5).with_seed(1);
//! let reply = player.genmove(&mut board, Policy::Random);
//! println!("White plays {}", board.format_point(reply));
//! assert_eq!(board.move_number(), 1);
//! ```

pub mod board;
pub mod constants;
pub mod gtp;
pub mod playout;
pub mod policy;
pub mod rules;
