//! Canonical chess-rule constants.

use crate::game_state::chess_types::{Color, Square};

/// Standard chess starting position in the six-field board notation.
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The four central squares d4, e4, d5, e5.
pub const CENTER_SQUARES: [Square; 4] = [27, 28, 35, 36];

/// King home square per side (e1 / e8).
#[inline]
pub const fn king_home_square(color: Color) -> Square {
    match color {
        Color::White => 4,
        Color::Black => 60,
    }
}

/// Rook home squares per side as (queenside, kingside).
#[inline]
pub const fn rook_home_squares(color: Color) -> (Square, Square) {
    match color {
        Color::White => (0, 7),
        Color::Black => (56, 63),
    }
}
