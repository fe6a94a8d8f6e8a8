//! Move application: pure successor-state construction.

use crate::errors::EngineError;
use crate::game_state::chess_rules::rook_home_squares;
use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::moves::move_descriptions::*;
use crate::options::AnalysisOptions;
use crate::utils::long_algebraic::long_algebraic_to_move;

/// Produce the successor position for a packed move description.
///
/// The move must have been generated from `position`; this function performs
/// bookkeeping, not legality checking.
pub fn apply_move(position: &Position, mv: u64) -> Result<Position, EngineError> {
    let from = move_from(mv);
    let to = move_to(mv);
    let from_mask = 1u64 << from;
    let to_mask = 1u64 << to;

    let mover = position.side_to_move;
    let enemy = mover.opposite();

    let moved = position
        .piece_on_square(from)
        .filter(|(color, _)| *color == mover)
        .map(|(_, piece)| piece)
        .ok_or_else(|| {
            EngineError::InvalidState(format!("no piece of the side to move on square {from}"))
        })?;

    let mut next = position.clone();

    // Lift the moving piece off its origin.
    next.pieces[mover.index()][moved.index()] &= !from_mask;

    // Captures. The en-passant victim is not on the destination square; it
    // sits on the passed-through rank in the destination file.
    if is_en_passant(mv) {
        let victim_sq = match mover {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        next.pieces[enemy.index()][PieceKind::Pawn.index()] &= !(1u64 << victim_sq);
    } else if is_capture(mv) {
        for piece in ALL_PIECE_KINDS {
            next.pieces[enemy.index()][piece.index()] &= !to_mask;
        }
    }

    // Drop the (possibly promoted) piece on the destination.
    let landed = promotion_piece(mv).unwrap_or(moved);
    next.pieces[mover.index()][landed.index()] |= to_mask;

    // Castling relocates the matching rook.
    if is_castling(mv) && moved == PieceKind::King {
        let (queenside_rook, kingside_rook) = rook_home_squares(mover);
        if to == from + 2 {
            relocate_rook(&mut next, mover, kingside_rook, to - 1);
        } else if to + 2 == from {
            relocate_rook(&mut next, mover, queenside_rook, to + 1);
        }
    }

    update_castling_rights(&mut next, mover, moved, from, to);

    // En-passant target lives exactly one ply after a double push.
    next.en_passant_square = if is_double_pawn_push(mv) {
        Some((from + to) / 2)
    } else {
        None
    };

    if moved == PieceKind::Pawn || is_capture(mv) {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if mover == Color::Black {
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }

    next.side_to_move = enemy;
    next.recalc_occupancy();

    Ok(next)
}

/// Parse a move in move notation, verify it against the legal move list, and
/// apply it. An unlisted move is surfaced as `IllegalMove`, never silently
/// substituted.
pub fn apply_uci_if_legal(
    position: &Position,
    uci: &str,
    options: &AnalysisOptions,
) -> Result<Position, EngineError> {
    let wanted = long_algebraic_to_move(uci, position).map_err(|_| EngineError::IllegalMove {
        mv: uci.to_owned(),
        fen: position.to_fen(),
    })?;

    let legal = crate::move_generation::legality_filter::legal_moves(position, options)?;
    if !legal.contains(&wanted) {
        return Err(EngineError::IllegalMove {
            mv: uci.to_owned(),
            fen: position.to_fen(),
        });
    }

    apply_move(position, wanted)
}

fn relocate_rook(position: &mut Position, color: Color, from: Square, to: Square) {
    let rooks = &mut position.pieces[color.index()][PieceKind::Rook.index()];
    *rooks &= !(1u64 << from);
    *rooks |= 1u64 << to;
}

/// Rights are monotonically non-increasing: cleared when the king or a rook
/// leaves its home square, or when a rook is captured on its home square.
fn update_castling_rights(
    position: &mut Position,
    mover: Color,
    moved: PieceKind,
    from: Square,
    to: Square,
) {
    if moved == PieceKind::King {
        position.castling_rights &= !both_rights(mover);
    }

    if moved == PieceKind::Rook {
        let (queenside_rook, kingside_rook) = rook_home_squares(mover);
        if from == queenside_rook {
            position.castling_rights &= !queenside_right(mover);
        } else if from == kingside_rook {
            position.castling_rights &= !kingside_right(mover);
        }
    }

    let enemy = mover.opposite();
    let (enemy_queenside_rook, enemy_kingside_rook) = rook_home_squares(enemy);
    if to == enemy_queenside_rook {
        position.castling_rights &= !queenside_right(enemy);
    } else if to == enemy_kingside_rook {
        position.castling_rights &= !kingside_right(enemy);
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_move, apply_uci_if_legal};
    use crate::errors::EngineError;
    use crate::game_state::chess_types::*;
    use crate::game_state::position::Position;
    use crate::options::AnalysisOptions;
    use crate::utils::long_algebraic::long_algebraic_to_move;

    fn apply(fen: &str, uci: &str) -> Position {
        let position = Position::from_fen(fen).expect("notation should parse");
        let mv = long_algebraic_to_move(uci, &position).expect("move should parse");
        apply_move(&position, mv).expect("move should apply")
    }

    #[test]
    fn double_push_sets_the_en_passant_target() {
        let next = apply("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", "e2e4");
        assert_eq!(next.to_fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPPPPPP/RNBQKBNR b KQkq e3 0 1");
    }

    #[test]
    fn quiet_move_clears_the_target_and_bumps_the_clock() {
        let next = apply("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1", "g8f6");
        assert_eq!(next.en_passant_square, None);
        assert_eq!(next.halfmove_clock, 1);
        assert_eq!(next.fullmove_number, 2);
        assert_eq!(next.side_to_move, Color::White);
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let next = apply("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5d6");
        assert_eq!(next.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn kingside_castle_relocates_the_rook() {
        let next = apply("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1", "e1g1");
        assert_eq!(next.to_fen(), "4k3/8/8/8/8/8/8/R4RK1 b - - 1 1");
    }

    #[test]
    fn queenside_castle_relocates_the_rook() {
        let next = apply("r3k3/8/8/8/8/8/8/4K3 b q - 0 1", "e8c8");
        assert_eq!(next.to_fen(), "2kr4/8/8/8/8/8/8/4K3 w - - 1 2");
    }

    #[test]
    fn promotion_with_capture_replaces_the_pawn() {
        let next = apply("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1", "a7b8q");
        assert_eq!(next.to_fen(), "1Q2k3/8/8/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn rook_moves_and_rook_captures_clear_rights() {
        let after_rook_move = apply("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "h1h2");
        assert_eq!(after_rook_move.castling_rights & CASTLE_WHITE_KINGSIDE, 0);
        assert_ne!(after_rook_move.castling_rights & CASTLE_WHITE_QUEENSIDE, 0);

        // A capture landing on h8 strips black's kingside right.
        let capture = apply("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "h1h8");
        assert_eq!(capture.castling_rights & CASTLE_BLACK_KINGSIDE, 0);
        assert_ne!(capture.castling_rights & CASTLE_BLACK_QUEENSIDE, 0);
    }

    #[test]
    fn capture_resets_the_halfmove_clock() {
        let next = apply("4k3/8/8/3p4/4P3/8/8/4K3 w - - 7 20", "e4d5");
        assert_eq!(next.halfmove_clock, 0);
    }

    #[test]
    fn illegal_moves_are_surfaced_not_substituted() {
        let position = Position::new_game();
        let options = AnalysisOptions::default();

        assert!(matches!(
            apply_uci_if_legal(&position, "e2e5", &options),
            Err(EngineError::IllegalMove { .. })
        ));
        assert!(matches!(
            apply_uci_if_legal(&position, "banana", &options),
            Err(EngineError::IllegalMove { .. })
        ));

        let next = apply_uci_if_legal(&position, "g1f3", &options).expect("legal move should apply");
        assert_eq!(next.side_to_move, Color::Black);
    }
}
