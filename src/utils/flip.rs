//! Board mirroring: rotate the board 180 degrees and swap colors.
//!
//! The mirror image of a position is the canonical probe for evaluation
//! symmetry: a colorblind evaluation must negate exactly under this map.

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;

/// Rotate 180 degrees, swap piece colors, flip the side to move, mirror
/// castling rights and the en-passant target. Clocks carry over unchanged.
pub fn flip_position(position: &Position) -> Position {
    let mut flipped = Position::new_empty();

    for color in [Color::White, Color::Black] {
        for piece in ALL_PIECE_KINDS {
            let mut bb = position.pieces[color.index()][piece.index()];
            while bb != 0 {
                let sq = bb.trailing_zeros() as Square;
                let rotated = 63 - sq;
                flipped.pieces[color.opposite().index()][piece.index()] |= 1u64 << rotated;
                bb &= bb - 1;
            }
        }
    }

    flipped.side_to_move = position.side_to_move.opposite();
    flipped.castling_rights = flip_castling_rights(position.castling_rights);
    flipped.en_passant_square = position.en_passant_square.map(|sq| 63 - sq);
    flipped.halfmove_clock = position.halfmove_clock;
    flipped.fullmove_number = position.fullmove_number;
    flipped.recalc_occupancy();

    flipped
}

fn flip_castling_rights(rights: CastlingRights) -> CastlingRights {
    let mut out = 0;
    if (rights & CASTLE_WHITE_KINGSIDE) != 0 {
        out |= CASTLE_BLACK_KINGSIDE;
    }
    if (rights & CASTLE_WHITE_QUEENSIDE) != 0 {
        out |= CASTLE_BLACK_QUEENSIDE;
    }
    if (rights & CASTLE_BLACK_KINGSIDE) != 0 {
        out |= CASTLE_WHITE_KINGSIDE;
    }
    if (rights & CASTLE_BLACK_QUEENSIDE) != 0 {
        out |= CASTLE_WHITE_QUEENSIDE;
    }
    out
}
