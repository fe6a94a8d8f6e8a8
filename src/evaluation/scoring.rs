//! Static position evaluation.
//!
//! All scores are white-centric centipawns. Positional terms are progress
//! terms measured against a `RootReference` snapshot, and every term is
//! computed for both sides with the opponent contribution sign-inverted, so
//! a from-scratch single-position call (which snapshots the position itself)
//! stays symmetry-correct: `evaluate(p) == -evaluate(flip(p))`.

use crate::evaluation::nnue_stub;
use crate::evaluation::root_reference::RootReference;
use crate::game_state::chess_rules::{king_home_square, CENTER_SQUARES};
use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::moves::bishop_moves::bishop_attacks;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::queen_moves::queen_attacks;
use crate::moves::rook_moves::rook_attacks;
use crate::options::{AnalysisOptions, PieceWeights};

/// Center-occupancy weights per piece kind: pawns count most, the king not
/// at all.
const CENTER_PIECE_WEIGHTS: [i32; 6] = [4, 3, 3, 2, 1, 0];

/// Evaluate a position on its own, snapshotting it as its own root.
pub fn evaluate(position: &Position, options: &AnalysisOptions) -> i32 {
    let root = RootReference::new(position, options.engine_side.color(), options);
    evaluate_with_root(position, options, &root)
}

/// Evaluate a position against an existing root snapshot.
pub fn evaluate_with_root(
    position: &Position,
    options: &AnalysisOptions,
    root: &RootReference,
) -> i32 {
    let mut score = 0i32;

    if options.terms.material {
        score += material_balance(position, &options.weights);
    }
    if options.terms.tempo {
        score += position.side_to_move.sign() * options.tempo;
    }

    let mut positional = 0f64;
    for side in [Color::White, Color::Black] {
        let sign = side.sign() as f64;
        positional += sign * center_progress_term(position, side, options, root);
        positional += sign * king_centralization_term(position, side, options, root);
        positional += sign * development_term(position, side, options, root);
        positional += sign * castle_safety_term(position, side, options, root) as f64;
    }
    score += positional.round() as i32;

    score + nnue_stub::evaluate(position)
}

/// Signed material sum, white minus black.
pub fn material_balance(position: &Position, weights: &PieceWeights) -> i32 {
    let mut score = 0i32;

    for piece in ALL_PIECE_KINDS {
        let value = weights.weight(piece);
        let white = position.pieces[Color::White.index()][piece.index()].count_ones() as i32;
        let black = position.pieces[Color::Black.index()][piece.index()].count_ones() as i32;
        score += (white - black) * value;
    }

    score
}

/// Weighted count of `color`'s pieces on the four central squares.
pub fn center_occupancy_count(position: &Position, color: Color) -> i32 {
    let mut count = 0i32;

    for sq in CENTER_SQUARES {
        let mask = 1u64 << sq;
        if (position.occupancy_by_color[color.index()] & mask) == 0 {
            continue;
        }
        for piece in ALL_PIECE_KINDS {
            if (position.pieces[color.index()][piece.index()] & mask) != 0 {
                count += CENTER_PIECE_WEIGHTS[piece.index()];
                break;
            }
        }
    }

    count
}

fn center_progress_term(
    position: &Position,
    side: Color,
    options: &AnalysisOptions,
    root: &RootReference,
) -> f64 {
    if options.center_piece_placement_reward == 0 {
        return 0.0;
    }
    let delta = center_occupancy_count(position, side) - root.center_counts[side.index()];
    (options.center_piece_placement_reward * delta) as f64
}

/// Chebyshev distance from a square to the nearest central square.
pub fn king_center_distance(square: Square) -> i32 {
    CENTER_SQUARES
        .iter()
        .map(|center| {
            let df = (square % 8) as i32 - (center % 8) as i32;
            let dr = (square / 8) as i32 - (center / 8) as i32;
            df.abs().max(dr.abs())
        })
        .min()
        .unwrap_or(0)
}

/// Saturating endgame factor: 0 while the opponent retains attacking
/// material above the ceiling, 1 once it drops to the floor.
fn endgame_factor(position: &Position, side: Color, options: &AnalysisOptions) -> f64 {
    let opponent = side.opposite();
    let mut attacking_material = 0i32;
    for piece in [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
        let count = position.pieces[opponent.index()][piece.index()].count_ones() as i32;
        attacking_material += count * options.weights.weight(piece);
    }

    let ceiling = options.end_game_material_ceiling as f64;
    let floor = options.end_game_material_floor as f64;
    ((ceiling - attacking_material as f64) / (ceiling - floor)).clamp(0.0, 1.0)
}

fn king_centralization_term(
    position: &Position,
    side: Color,
    options: &AnalysisOptions,
    root: &RootReference,
) -> f64 {
    if options.end_game_king_center_magnet == 0 {
        return 0.0;
    }
    let (Some(now), Some(at_root)) = (position.king_square(side), root.king_squares[side.index()])
    else {
        return 0.0;
    };

    let improvement = king_center_distance(at_root) - king_center_distance(now);
    options.end_game_king_center_magnet as f64
        * improvement as f64
        * endgame_factor(position, side, options)
}

/// Space-control score for `color`: every square its pieces attack in the
/// opponent's half contributes a geometric term in how deep the square sits.
pub fn development_score(position: &Position, color: Color, options: &AnalysisOptions) -> f64 {
    let mut attacked = 0u64;
    let occupancy = position.occupancy_all;

    for piece in ALL_PIECE_KINDS {
        let mut pieces = position.pieces[color.index()][piece.index()];
        while pieces != 0 {
            let from = pieces.trailing_zeros() as Square;
            pieces &= pieces - 1;

            attacked |= match piece {
                PieceKind::Pawn => pawn_attacks(color, from),
                PieceKind::Knight => knight_attacks(from),
                PieceKind::Bishop => bishop_attacks(from, occupancy),
                PieceKind::Rook => rook_attacks(from, occupancy),
                PieceKind::Queen => queen_attacks(from, occupancy),
                PieceKind::King => king_attacks(from),
            };
        }
    }

    let mut score = 0f64;
    let mut targets = attacked;
    while targets != 0 {
        let sq = targets.trailing_zeros() as Square;
        targets &= targets - 1;

        let rank = (sq / 8) as i32;
        let depth_into_half = match color {
            Color::White => rank - 3,
            Color::Black => 4 - rank,
        };
        if depth_into_half < 1 {
            continue;
        }
        if !options.not_just_empty_squares_threat_reward && (occupancy & (1u64 << sq)) != 0 {
            continue;
        }

        score += options.rank_attack_factor.powi(depth_into_half);
    }

    score
}

fn development_term(
    position: &Position,
    side: Color,
    options: &AnalysisOptions,
    root: &RootReference,
) -> f64 {
    if options.development_incentive == 0.0 {
        return 0.0;
    }

    let own_delta =
        development_score(position, side, options) - root.development_scores[side.index()];
    let opponent = side.opposite();
    let opponent_delta = development_score(position, opponent, options)
        - root.development_scores[opponent.index()];

    options.development_incentive * (own_delta - options.development_opponent_weight * opponent_delta)
}

/// Castling outcome relative to the root: a one-time reward for having
/// castled, a penalty for a king that left home any other way, and a partial
/// penalty per castling right lost through rook movement or capture while
/// the king never moved.
fn castle_safety_term(
    position: &Position,
    side: Color,
    options: &AnalysisOptions,
    root: &RootReference,
) -> i32 {
    if options.castle_king_side_reward == 0
        && options.castle_queen_side_reward == 0
        && options.king_non_castle_move_penalty == 0
    {
        return 0;
    }

    let home = king_home_square(side);
    if root.king_squares[side.index()] != Some(home) {
        return 0;
    }
    let Some(king_now) = position.king_square(side) else {
        return 0;
    };

    if king_now == home {
        let lost = root.castling_rights & both_rights(side) & !position.castling_rights;
        return -(options.king_non_castle_move_penalty / 2) * lost.count_ones() as i32;
    }

    let rooks = position.pieces[side.index()][PieceKind::Rook.index()];
    let castled_kingside = root.castling_rights & kingside_right(side) != 0
        && king_now == home + 2
        && (rooks & (1u64 << (home + 1))) != 0;
    let castled_queenside = root.castling_rights & queenside_right(side) != 0
        && king_now == home - 2
        && (rooks & (1u64 << (home - 1))) != 0;

    if castled_kingside {
        options.castle_king_side_reward
    } else if castled_queenside {
        options.castle_queen_side_reward
    } else {
        -options.king_non_castle_move_penalty
    }
}

#[cfg(test)]
mod tests {
    use super::{center_occupancy_count, evaluate, evaluate_with_root, king_center_distance, material_balance};
    use crate::evaluation::root_reference::RootReference;
    use crate::game_state::chess_types::Color;
    use crate::game_state::position::Position;
    use crate::options::AnalysisOptions;
    use crate::utils::flip::flip_position;

    #[test]
    fn starting_position_material_is_zero() {
        let options = AnalysisOptions::default();
        assert_eq!(evaluate(&Position::new_game(), &options), 0);
    }

    #[test]
    fn material_balance_tracks_weights() {
        let options = AnalysisOptions::default();
        let position = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").expect("notation should parse");
        assert_eq!(material_balance(&position, &options.weights), 100);

        let down_a_rook =
            Position::from_fen("r3k3/8/8/8/8/8/8/4K2N w - - 0 1").expect("notation should parse");
        assert_eq!(material_balance(&down_a_rook, &options.weights), -200);
    }

    #[test]
    fn tempo_bonus_follows_the_side_to_move() {
        let mut options = AnalysisOptions::default();
        options.terms.tempo = true;

        let white = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("notation should parse");
        let black = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").expect("notation should parse");
        assert_eq!(evaluate(&white, &options), 10);
        assert_eq!(evaluate(&black, &options), -10);
    }

    #[test]
    fn evaluation_negates_under_mirror() {
        let mut options = AnalysisOptions::default();
        options.terms.tempo = true;
        options.center_piece_placement_reward = 50;
        options.end_game_king_center_magnet = 15;
        options.development_incentive = 10.0;
        options.rank_attack_factor = 1.1;
        options.castle_king_side_reward = 60;
        options.castle_queen_side_reward = 60;
        options.king_non_castle_move_penalty = 100;

        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQ1RK1 b - - 4 6",
            "4k3/8/8/3p4/8/2P5/8/4K3 w - - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let position = Position::from_fen(fen).expect("notation should parse");
            let mirrored = flip_position(&position);
            assert_eq!(
                evaluate(&position, &options),
                -evaluate(&mirrored, &options),
                "symmetry failed for {fen}"
            );
        }
    }

    #[test]
    fn center_progress_rewards_advances_since_the_root() {
        let mut options = AnalysisOptions::default();
        options.center_piece_placement_reward = 50;

        let root_pos = Position::new_game();
        let root = RootReference::new(&root_pos, Color::White, &options);

        // After e2e4 the white pawn occupies e4 (weight 4).
        let advanced = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
            .expect("notation should parse");
        assert_eq!(evaluate_with_root(&advanced, &options, &root), 200);
        assert_eq!(center_occupancy_count(&advanced, Color::White), 4);
    }

    #[test]
    fn king_centralization_scales_with_opponent_material() {
        let mut options = AnalysisOptions::default();
        options.end_game_king_center_magnet = 16;
        options.terms.material = false;

        // Bare kings: full endgame factor. King on e4 from e1 improves the
        // center distance by 3.
        let root_pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("notation should parse");
        let root = RootReference::new(&root_pos, Color::White, &options);
        let centralized =
            Position::from_fen("4k3/8/8/8/4K3/8/8/8 b - - 1 1").expect("notation should parse");
        assert_eq!(evaluate_with_root(&centralized, &options, &root), 48);

        // With two enemy queens on the board the factor saturates at zero.
        let root_heavy =
            Position::from_fen("qq2k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("notation should parse");
        let root2 = RootReference::new(&root_heavy, Color::White, &options);
        let centralized_heavy =
            Position::from_fen("qq2k3/8/8/8/4K3/8/8/8 b - - 1 1").expect("notation should parse");
        assert_eq!(evaluate_with_root(&centralized_heavy, &options, &root2), 0);
    }

    #[test]
    fn castling_is_rewarded_and_king_walks_are_punished() {
        let mut options = AnalysisOptions::default();
        options.terms.material = false;
        options.castle_king_side_reward = 60;
        options.castle_queen_side_reward = 40;
        options.king_non_castle_move_penalty = 100;

        let root_pos =
            Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("notation should parse");
        let root = RootReference::new(&root_pos, Color::White, &options);

        let castled =
            Position::from_fen("4k3/8/8/8/8/8/8/R4RK1 b - - 1 1").expect("notation should parse");
        assert_eq!(evaluate_with_root(&castled, &options, &root), 60);

        let castled_long =
            Position::from_fen("4k3/8/8/8/8/8/8/2KR3R b - - 1 1").expect("notation should parse");
        assert_eq!(evaluate_with_root(&castled_long, &options, &root), 40);

        let king_walk =
            Position::from_fen("4k3/8/8/8/8/8/4K3/R6R b - - 1 1").expect("notation should parse");
        assert_eq!(evaluate_with_root(&king_walk, &options, &root), -100);

        // Rook lifted while the king stayed home: half penalty for the lost
        // wing.
        let rook_lift =
            Position::from_fen("4k3/8/8/8/8/8/7R/R3K3 b Q - 1 1").expect("notation should parse");
        assert_eq!(evaluate_with_root(&rook_lift, &options, &root), -50);
    }

    #[test]
    fn development_term_rewards_deeper_space_control() {
        let mut options = AnalysisOptions::default();
        options.terms.material = false;
        options.development_incentive = 10.0;
        options.rank_attack_factor = 1.1;

        let root_pos = Position::from_fen("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").expect("notation should parse");
        let root = RootReference::new(&root_pos, Color::White, &options);

        // The knight hop gains reach into black's half.
        let developed =
            Position::from_fen("4k3/8/8/8/8/2N5/8/4K3 b - - 1 1").expect("notation should parse");
        assert!(evaluate_with_root(&developed, &options, &root) > 0);
    }

    #[test]
    fn king_center_distance_reference_values() {
        assert_eq!(king_center_distance(27), 0);
        assert_eq!(king_center_distance(4), 3);
        assert_eq!(king_center_distance(0), 3);
        assert_eq!(king_center_distance(63), 3);
        assert_eq!(king_center_distance(20), 1);
    }
}
