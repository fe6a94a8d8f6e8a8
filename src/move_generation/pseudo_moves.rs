//! Piece-wise pseudo-legal move generation.
//!
//! Moves produced here obey individual piece movement rules and the
//! generation options (castling/en-passant toggles, promotion set, per-parent
//! cap) but are not yet checked against leaving the mover's own king
//! attacked — that is the legality filter's job. The only check-awareness
//! here is castling-path safety, which is itself toggleable.

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::move_generation::legality_filter::is_square_attacked;
use crate::moves::bishop_moves::bishop_attacks;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_descriptions::*;
use crate::moves::queen_moves::queen_attacks;
use crate::moves::rook_moves::rook_attacks;
use crate::options::AnalysisOptions;

pub fn generate_pseudo(position: &Position, options: &AnalysisOptions) -> Vec<u64> {
    let mut out = Vec::<u64>::with_capacity(64);

    generate_pawn_moves(position, options, &mut out);
    generate_knight_moves(position, &mut out);
    generate_slider_moves(position, PieceKind::Bishop, &mut out);
    generate_slider_moves(position, PieceKind::Rook, &mut out);
    generate_slider_moves(position, PieceKind::Queen, &mut out);
    generate_king_moves(position, options, &mut out);

    if options.cap_per_parent > 0 && out.len() > options.cap_per_parent {
        out.truncate(options.cap_per_parent);
    }

    out
}

fn generate_pawn_moves(position: &Position, options: &AnalysisOptions, out: &mut Vec<u64>) {
    let side = position.side_to_move;
    let enemy_occ = position.occupancy_by_color[side.opposite().index()];
    let empty = !position.occupancy_all;
    let promotion_set = options.promotion_set();

    let (promotion_rank, start_rank) = match side {
        Color::White => (7u8, 1u8),
        Color::Black => (0u8, 6u8),
    };

    let mut pawns = position.pieces[side.index()][PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;

        let file = from % 8;
        let rank = from / 8;

        // Advances onto empty squares only.
        let one_step = match side {
            Color::White => from + 8,
            Color::Black => from.wrapping_sub(8),
        };
        if one_step < 64 && (1u64 << one_step) & empty != 0 {
            if one_step / 8 == promotion_rank {
                for promo in &promotion_set {
                    out.push(pack_move(from, one_step, PieceKind::Pawn, None, Some(*promo), 0));
                }
            } else {
                out.push(pack_move(from, one_step, PieceKind::Pawn, None, None, 0));

                if rank == start_rank {
                    let two_step = match side {
                        Color::White => from + 16,
                        Color::Black => from - 16,
                    };
                    if (1u64 << two_step) & empty != 0 {
                        out.push(pack_move(
                            from,
                            two_step,
                            PieceKind::Pawn,
                            None,
                            None,
                            FLAG_DOUBLE_PAWN_PUSH,
                        ));
                    }
                }
            }
        }

        // Diagonal captures and en-passant.
        for file_delta in [-1i8, 1i8] {
            let to_file = file as i8 + file_delta;
            if !(0..8).contains(&to_file) {
                continue;
            }

            let to = match side {
                Color::White => from as i8 + 8 + file_delta,
                Color::Black => from as i8 - 8 + file_delta,
            };
            if !(0..64).contains(&to) {
                continue;
            }
            let to = to as Square;
            let to_mask = 1u64 << to;

            if (to_mask & enemy_occ) != 0 {
                let captured = position.piece_on_square(to).map(|(_, piece)| piece);
                if to / 8 == promotion_rank {
                    for promo in &promotion_set {
                        out.push(pack_move(
                            from,
                            to,
                            PieceKind::Pawn,
                            captured,
                            Some(*promo),
                            FLAG_CAPTURE,
                        ));
                    }
                } else {
                    out.push(pack_move(from, to, PieceKind::Pawn, captured, None, FLAG_CAPTURE));
                }
            } else if options.include_en_passant && position.en_passant_square == Some(to) {
                out.push(pack_move(
                    from,
                    to,
                    PieceKind::Pawn,
                    Some(PieceKind::Pawn),
                    None,
                    FLAG_CAPTURE | FLAG_EN_PASSANT,
                ));
            }
        }
    }
}

fn generate_knight_moves(position: &Position, out: &mut Vec<u64>) {
    let side = position.side_to_move;
    let own_occ = position.occupancy_by_color[side.index()];
    let enemy_occ = position.occupancy_by_color[side.opposite().index()];

    let mut knights = position.pieces[side.index()][PieceKind::Knight.index()];
    while knights != 0 {
        let from = knights.trailing_zeros() as Square;
        knights &= knights - 1;

        push_destination_set(
            position,
            from,
            PieceKind::Knight,
            knight_attacks(from) & !own_occ,
            enemy_occ,
            out,
        );
    }
}

fn generate_slider_moves(position: &Position, piece: PieceKind, out: &mut Vec<u64>) {
    let side = position.side_to_move;
    let own_occ = position.occupancy_by_color[side.index()];
    let enemy_occ = position.occupancy_by_color[side.opposite().index()];

    let mut sliders = position.pieces[side.index()][piece.index()];
    while sliders != 0 {
        let from = sliders.trailing_zeros() as Square;
        sliders &= sliders - 1;

        let attacks = match piece {
            PieceKind::Bishop => bishop_attacks(from, position.occupancy_all),
            PieceKind::Rook => rook_attacks(from, position.occupancy_all),
            PieceKind::Queen => queen_attacks(from, position.occupancy_all),
            _ => unreachable!("only sliding pieces are generated here"),
        };

        push_destination_set(position, from, piece, attacks & !own_occ, enemy_occ, out);
    }
}

fn generate_king_moves(position: &Position, options: &AnalysisOptions, out: &mut Vec<u64>) {
    let side = position.side_to_move;
    let own_occ = position.occupancy_by_color[side.index()];
    let enemy_occ = position.occupancy_by_color[side.opposite().index()];

    let Some(from) = position.king_square(side) else {
        return;
    };

    push_destination_set(
        position,
        from,
        PieceKind::King,
        king_attacks(from) & !own_occ,
        enemy_occ,
        out,
    );

    if options.include_castling {
        generate_castling_moves(position, options, from, out);
    }
}

fn generate_castling_moves(
    position: &Position,
    options: &AnalysisOptions,
    king_from: Square,
    out: &mut Vec<u64>,
) {
    let side = position.side_to_move;
    let home = crate::game_state::chess_rules::king_home_square(side);
    if king_from != home {
        return;
    }

    // (rights bit, destination, between-mask, safety squares)
    let rank_base = home - 4;
    let kingside = (
        kingside_right(side),
        home + 2,
        (1u64 << (rank_base + 5)) | (1u64 << (rank_base + 6)),
        [home, home + 1, home + 2],
    );
    let queenside = (
        queenside_right(side),
        home - 2,
        (1u64 << (rank_base + 1)) | (1u64 << (rank_base + 2)) | (1u64 << (rank_base + 3)),
        [home, home - 1, home - 2],
    );

    for (right, to, between, safety_squares) in [kingside, queenside] {
        if (position.castling_rights & right) == 0 {
            continue;
        }
        if (position.occupancy_all & between) != 0 {
            continue;
        }

        if options.castle_safety {
            let enemy = side.opposite();
            let attacked = safety_squares
                .iter()
                .any(|sq| is_square_attacked(position, *sq, enemy));
            if attacked {
                continue;
            }
        }

        out.push(pack_move(king_from, to, PieceKind::King, None, None, FLAG_CASTLING));
    }
}

fn push_destination_set(
    position: &Position,
    from: Square,
    piece: PieceKind,
    mut destinations: u64,
    enemy_occ: u64,
    out: &mut Vec<u64>,
) {
    while destinations != 0 {
        let to = destinations.trailing_zeros() as Square;
        destinations &= destinations - 1;

        let to_mask = 1u64 << to;
        if (to_mask & enemy_occ) != 0 {
            let captured = position.piece_on_square(to).map(|(_, captured)| captured);
            out.push(pack_move(from, to, piece, captured, None, FLAG_CAPTURE));
        } else {
            out.push(pack_move(from, to, piece, None, None, 0));
        }
    }
}
