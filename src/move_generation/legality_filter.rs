//! Legality filtering on top of the pseudo-legal generator.
//!
//! Classifies check (none / single / double), restricts candidates
//! accordingly (double check forces a king move; a single sliding checker
//! limits non-king moves to the capture-or-interpose mask), then tentatively
//! applies every surviving candidate and rejects it if the mover's own king
//! is attacked in the successor. The final apply-and-verify pass is what
//! catches pins, including the en-passant capture that strips the only
//! blocker from the king's rank.

use crate::errors::EngineError;
use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::move_generation::apply_move::apply_move;
use crate::move_generation::pseudo_moves::generate_pseudo;
use crate::moves::bishop_moves::bishop_attacks;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_descriptions::{move_from, move_to, moved_piece};
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::rook_moves::rook_attacks;
use crate::options::AnalysisOptions;

/// Is `square` attacked by any piece of `attacker_color`?
pub fn is_square_attacked(position: &Position, square: Square, attacker_color: Color) -> bool {
    let target_mask = 1u64 << square;
    let boards = &position.pieces[attacker_color.index()];

    let mut pawns = boards[PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;
        if pawn_attacks(attacker_color, from) & target_mask != 0 {
            return true;
        }
    }

    if knight_attacks(square) & boards[PieceKind::Knight.index()] != 0 {
        return true;
    }
    if king_attacks(square) & boards[PieceKind::King.index()] != 0 {
        return true;
    }

    let diagonal = boards[PieceKind::Bishop.index()] | boards[PieceKind::Queen.index()];
    if bishop_attacks(square, position.occupancy_all) & diagonal != 0 {
        return true;
    }

    let orthogonal = boards[PieceKind::Rook.index()] | boards[PieceKind::Queen.index()];
    if rook_attacks(square, position.occupancy_all) & orthogonal != 0 {
        return true;
    }

    false
}

/// Is the king of `color` currently attacked?
#[inline]
pub fn is_king_in_check(position: &Position, color: Color) -> bool {
    match position.king_square(color) {
        Some(king_sq) => is_square_attacked(position, king_sq, color.opposite()),
        None => false,
    }
}

/// All pieces of `attacker_color` that attack `square`.
pub fn attackers_to_square(
    position: &Position,
    square: Square,
    attacker_color: Color,
) -> Vec<(Square, PieceKind)> {
    let target_mask = 1u64 << square;
    let boards = &position.pieces[attacker_color.index()];
    let mut attackers = Vec::new();

    let mut pawns = boards[PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;
        if pawn_attacks(attacker_color, from) & target_mask != 0 {
            attackers.push((from, PieceKind::Pawn));
        }
    }

    let mut knights = boards[PieceKind::Knight.index()] & knight_attacks(square);
    while knights != 0 {
        attackers.push((knights.trailing_zeros() as Square, PieceKind::Knight));
        knights &= knights - 1;
    }

    let mut kings = boards[PieceKind::King.index()] & king_attacks(square);
    while kings != 0 {
        attackers.push((kings.trailing_zeros() as Square, PieceKind::King));
        kings &= kings - 1;
    }

    let diagonal_reach = bishop_attacks(square, position.occupancy_all);
    let mut bishops = boards[PieceKind::Bishop.index()] & diagonal_reach;
    while bishops != 0 {
        attackers.push((bishops.trailing_zeros() as Square, PieceKind::Bishop));
        bishops &= bishops - 1;
    }

    let orthogonal_reach = rook_attacks(square, position.occupancy_all);
    let mut rooks = boards[PieceKind::Rook.index()] & orthogonal_reach;
    while rooks != 0 {
        attackers.push((rooks.trailing_zeros() as Square, PieceKind::Rook));
        rooks &= rooks - 1;
    }

    let mut queens = boards[PieceKind::Queen.index()] & (diagonal_reach | orthogonal_reach);
    while queens != 0 {
        attackers.push((queens.trailing_zeros() as Square, PieceKind::Queen));
        queens &= queens - 1;
    }

    attackers
}

/// Bitboard of squares strictly between two aligned squares; empty when the
/// squares do not share a rank, file, or diagonal.
pub fn squares_between(a: Square, b: Square) -> u64 {
    let af = (a % 8) as i8;
    let ar = (a / 8) as i8;
    let bf = (b % 8) as i8;
    let br = (b / 8) as i8;

    let df = bf - af;
    let dr = br - ar;
    if !(df == 0 || dr == 0 || df.abs() == dr.abs()) {
        return 0;
    }

    let step_f = df.signum();
    let step_r = dr.signum();

    let mut out = 0u64;
    let mut f = af + step_f;
    let mut r = ar + step_r;
    while f != bf || r != br {
        out |= 1u64 << (r * 8 + f);
        f += step_f;
        r += step_r;
    }

    out
}

/// Remove pseudo-legal moves that leave the mover's king attacked.
pub fn filter_legal(position: &Position, pseudo_moves: &[u64]) -> Result<Vec<u64>, EngineError> {
    let mover = position.side_to_move;
    let king_sq = position.king_square(mover);

    let checkers = match king_sq {
        Some(king_sq) => attackers_to_square(position, king_sq, mover.opposite()),
        None => Vec::new(),
    };

    // Double check: only the king can resolve it. A single sliding checker
    // additionally allows capturing it or interposing on its ray.
    let double_check = checkers.len() >= 2;
    let block_mask = match (king_sq, checkers.as_slice()) {
        (Some(king_sq), [(checker_sq, piece)])
            if matches!(piece, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen) =>
        {
            Some(squares_between(king_sq, *checker_sq) | (1u64 << checker_sq))
        }
        _ => None,
    };

    let mut legal = Vec::with_capacity(pseudo_moves.len());
    for &mv in pseudo_moves {
        let is_king_move = moved_piece(mv) == Some(PieceKind::King);

        if double_check && !is_king_move {
            continue;
        }
        if let Some(mask) = block_mask {
            if !is_king_move && (1u64 << move_to(mv)) & mask == 0 {
                continue;
            }
        }

        let successor = apply_move(position, mv)?;
        if is_king_in_check(&successor, mover) {
            continue;
        }

        legal.push(mv);
    }

    Ok(legal)
}

/// Full legal move list for the side to move.
pub fn legal_moves(position: &Position, options: &AnalysisOptions) -> Result<Vec<u64>, EngineError> {
    let pseudo = generate_pseudo(position, options);
    filter_legal(position, &pseudo)
}

/// Legal moves restricted to a single origin square.
pub fn legal_moves_from(
    position: &Position,
    origin: Square,
    options: &AnalysisOptions,
) -> Result<Vec<u64>, EngineError> {
    let mut moves = legal_moves(position, options)?;
    moves.retain(|mv| move_from(*mv) == origin);
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::{filter_legal, is_king_in_check, legal_moves, legal_moves_from, squares_between};
    use crate::game_state::chess_types::{Color, PieceKind};
    use crate::game_state::position::Position;
    use crate::move_generation::apply_move::apply_move;
    use crate::move_generation::pseudo_moves::generate_pseudo;
    use crate::moves::move_descriptions::{move_to, moved_piece};
    use crate::options::AnalysisOptions;
    use crate::utils::long_algebraic::move_to_long_algebraic;

    fn ucis(moves: &[u64]) -> Vec<String> {
        moves
            .iter()
            .map(|mv| move_to_long_algebraic(*mv).expect("move should render"))
            .collect()
    }

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        let options = AnalysisOptions::default();
        let moves = legal_moves(&Position::new_game(), &options).expect("generation should succeed");
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn excluded_pseudo_moves_expose_the_king_when_forced() {
        let options = AnalysisOptions::default();
        // White is in check from the queen on h4.
        let position =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .expect("notation should parse");

        let pseudo = generate_pseudo(&position, &options);
        let legal = filter_legal(&position, &pseudo).expect("filter should succeed");

        for mv in &legal {
            let successor = apply_move(&position, *mv).expect("legal move should apply");
            assert!(!is_king_in_check(&successor, Color::White));
        }
        for mv in pseudo.iter().filter(|mv| !legal.contains(mv)) {
            let successor = apply_move(&position, *mv).expect("pseudo move should apply");
            assert!(is_king_in_check(&successor, Color::White));
        }
    }

    #[test]
    fn double_check_restricts_to_king_moves() {
        // Knight f6 and rook e1 both check the king on e8.
        let position =
            Position::from_fen("3qk3/8/5N2/8/8/8/8/3KR3 b - - 0 1").expect("notation should parse");
        let moves = legal_moves(&position, &AnalysisOptions::default()).expect("generation should succeed");

        assert!(!moves.is_empty());
        assert!(moves.iter().all(|mv| moved_piece(*mv) == Some(PieceKind::King)));
    }

    #[test]
    fn single_slider_check_allows_capture_or_interpose() {
        // Rook e1 checks along the e-file; the queen may interpose on e7.
        let position =
            Position::from_fen("3qk3/8/8/8/8/8/8/3KR3 b - - 0 1").expect("notation should parse");
        let moves = legal_moves(&position, &AnalysisOptions::default()).expect("generation should succeed");

        assert!(ucis(&moves).contains(&"d8e7".to_owned()));
        assert!(moves
            .iter()
            .all(|mv| moved_piece(*mv) == Some(PieceKind::King) || move_to(*mv) % 8 == 4));
    }

    #[test]
    fn pinned_piece_cannot_expose_the_king() {
        // The knight on e2 is pinned against the king on e1 by the rook on e8.
        let position =
            Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").expect("notation should parse");
        let moves = legal_moves(&position, &AnalysisOptions::default()).expect("generation should succeed");
        assert!(moves.iter().all(|mv| moved_piece(*mv) != Some(PieceKind::Knight)));
    }

    #[test]
    fn en_passant_rank_exposure_is_rejected() {
        let open = Position::from_fen("4k3/8/8/3pP2r/8/8/8/4K3 w - d6 0 1").expect("notation should parse");
        let open_moves = legal_moves(&open, &AnalysisOptions::default()).expect("generation should succeed");
        assert!(ucis(&open_moves).contains(&"e5d6".to_owned()));

        // With the white king on the fifth rank, taking en passant removes
        // both pawns from the rank and walks into the rook on h5.
        let pinned =
            Position::from_fen("4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 1").expect("notation should parse");
        let pinned_moves = legal_moves(&pinned, &AnalysisOptions::default()).expect("generation should succeed");
        assert!(!ucis(&pinned_moves).contains(&"e5d6".to_owned()));
    }

    #[test]
    fn checkmate_and_stalemate_are_distinguishable() {
        let options = AnalysisOptions::default();

        // Fool's mate: no legal moves and the king is attacked.
        let mated =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .expect("notation should parse");
        assert!(legal_moves(&mated, &options).expect("generation should succeed").is_empty());
        assert!(is_king_in_check(&mated, Color::White));

        // Cornered king with no moves but no attacker: stalemate.
        let stalemated =
            Position::from_fen("k7/8/1Q6/8/8/8/8/4K3 b - - 0 1").expect("notation should parse");
        assert!(legal_moves(&stalemated, &options).expect("generation should succeed").is_empty());
        assert!(!is_king_in_check(&stalemated, Color::Black));
    }

    #[test]
    fn castling_safety_toggle_gates_the_attacked_transit_square() {
        let clear = Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w K - 0 1").expect("notation should parse");
        let clear_moves =
            legal_moves(&clear, &AnalysisOptions::default()).expect("generation should succeed");
        assert!(ucis(&clear_moves).contains(&"e1g1".to_owned()));

        // A rook on f7 attacks the f1 transit square.
        let transit_attacked =
            Position::from_fen("4k3/5r2/8/8/8/8/8/R3K2R w K - 0 1").expect("notation should parse");
        let guarded = legal_moves(&transit_attacked, &AnalysisOptions::default())
            .expect("generation should succeed");
        assert!(!ucis(&guarded).contains(&"e1g1".to_owned()));

        let mut unguarded_options = AnalysisOptions::default();
        unguarded_options.castle_safety = false;
        let unguarded = legal_moves(&transit_attacked, &unguarded_options)
            .expect("generation should succeed");
        assert!(ucis(&unguarded).contains(&"e1g1".to_owned()));
    }

    #[test]
    fn squares_between_covers_rays_only() {
        assert_eq!(squares_between(0, 7), 0b0111_1110);
        assert_eq!(squares_between(0, 63).count_ones(), 6);
        assert_eq!(squares_between(0, 12), 0);
        assert_eq!(squares_between(4, 6), 1u64 << 5);
    }

    #[test]
    fn origin_filter_narrows_the_move_list() {
        let options = AnalysisOptions::default();
        let moves =
            legal_moves_from(&Position::new_game(), 12, &options).expect("generation should succeed");
        assert_eq!(moves.len(), 2);
    }
}
