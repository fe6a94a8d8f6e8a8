//! Core board-state representation.
//!
//! `Position` is the central value type of the engine: piece bitboards,
//! occupancy caches, side/rights/en-passant flags, and move clocks. It is a
//! plain immutable value — move application produces a fresh successor — so
//! the codec, generator, filter, and evaluator stay pure and thread-safe.

use crate::errors::FormatError;
use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::*;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    // [color][piece_kind]
    pub pieces: [[u64; 6]; 2],

    // Occupancy caches, derived from `pieces`.
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,

    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,

    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl Position {
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn new_game() -> Self {
        parse_fen(STARTING_POSITION_FEN).expect("starting position notation should always parse")
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<Self, FormatError> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Identify the piece standing on `square`, if any.
    pub fn piece_on_square(&self, square: Square) -> Option<(Color, PieceKind)> {
        let mask = 1u64 << square;
        for color in [Color::White, Color::Black] {
            if (self.occupancy_by_color[color.index()] & mask) == 0 {
                continue;
            }
            for piece in ALL_PIECE_KINDS {
                if (self.pieces[color.index()][piece.index()] & mask) != 0 {
                    return Some((color, piece));
                }
            }
        }
        None
    }

    /// Lowest set bit of the king bitboard, if the king is on the board.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let kings = self.pieces[color.index()][PieceKind::King.index()];
        if kings == 0 {
            None
        } else {
            Some(kings.trailing_zeros() as Square)
        }
    }

    /// Rebuild the occupancy caches after direct bitboard edits.
    pub fn recalc_occupancy(&mut self) {
        for color in [Color::White, Color::Black] {
            self.occupancy_by_color[color.index()] = self.pieces[color.index()]
                .iter()
                .copied()
                .fold(0u64, |acc, bb| acc | bb);
        }
        self.occupancy_all =
            self.occupancy_by_color[Color::White.index()] | self.occupancy_by_color[Color::Black.index()];
    }

    /// Identity key for repetition tracking and transposition caching:
    /// board occupancy, side to move, castling rights, en-passant target.
    /// Clocks are deliberately excluded.
    #[inline]
    pub fn key(&self) -> PositionKey {
        PositionKey {
            pieces: self.pieces,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
        }
    }
}

/// Structured position identity with a proper equality/hash contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub pieces: [[u64; 6]; 2],
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,
}
