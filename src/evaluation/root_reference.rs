//! Root-position snapshot for delta-based evaluation terms.
//!
//! Progress-style terms (center occupancy, king centralization, development,
//! castling state) measure change against the position the search started
//! from. The snapshot is computed once per top-level call and threaded
//! through every evaluation during that call.

use crate::evaluation::scoring::{center_occupancy_count, development_score};
use crate::game_state::chess_types::{CastlingRights, Color, Square};
use crate::game_state::position::Position;
use crate::options::AnalysisOptions;

#[derive(Debug, Clone, Copy)]
pub struct RootReference {
    pub engine_side: Color,
    pub center_counts: [i32; 2],
    pub king_squares: [Option<Square>; 2],
    pub development_scores: [f64; 2],
    pub castling_rights: CastlingRights,
}

impl RootReference {
    pub fn new(root: &Position, engine_side: Color, options: &AnalysisOptions) -> Self {
        Self {
            engine_side,
            center_counts: [
                center_occupancy_count(root, Color::White),
                center_occupancy_count(root, Color::Black),
            ],
            king_squares: [root.king_square(Color::White), root.king_square(Color::Black)],
            development_scores: [
                development_score(root, Color::White, options),
                development_score(root, Color::Black, options),
            ],
            castling_rights: root.castling_rights,
        }
    }
}
