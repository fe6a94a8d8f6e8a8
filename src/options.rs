//! Analysis options schema.
//!
//! One options value covers move generation, evaluation, and search knobs,
//! deserialized from the JSON strings consumers pass in. Field names match
//! the documented external schema; defaults and range clamps are applied
//! once at entry, not scattered through the search.

use serde::Deserialize;

use crate::errors::EngineError;
use crate::game_state::chess_types::{Color, PieceKind};

/// Per-piece material weights keyed by piece letter.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PieceWeights {
    pub p: i32,
    pub n: i32,
    pub b: i32,
    pub r: i32,
    pub q: i32,
    pub k: i32,
}

impl Default for PieceWeights {
    fn default() -> Self {
        Self {
            p: 100,
            n: 300,
            b: 300,
            r: 500,
            q: 900,
            k: 0,
        }
    }
}

impl PieceWeights {
    #[inline]
    pub fn weight(&self, piece: PieceKind) -> i32 {
        match piece {
            PieceKind::Pawn => self.p,
            PieceKind::Knight => self.n,
            PieceKind::Bishop => self.b,
            PieceKind::Rook => self.r,
            PieceKind::Queen => self.q,
            PieceKind::King => self.k,
        }
    }
}

/// Enabled scoring terms.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringTerms {
    pub material: bool,
    pub tempo: bool,
}

impl Default for ScoringTerms {
    fn default() -> Self {
        Self {
            material: true,
            tempo: false,
        }
    }
}

/// The side an analysis request speaks for, `"w"` or `"b"`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum SideName {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl SideName {
    #[inline]
    pub fn color(self) -> Color {
        match self {
            SideName::White => Color::White,
            SideName::Black => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub weights: PieceWeights,
    pub terms: ScoringTerms,
    /// Tempo bonus in centipawns for the side to move.
    pub tempo: i32,

    /// Nominal search depth in plies; minimum 1, no enforced maximum.
    pub search_depth: u32,
    pub extend_on_capture: bool,
    pub extend_on_check: bool,

    pub include_castling: bool,
    pub include_en_passant: bool,
    /// Promotion piece letters, subset of `qrbn`, order preserved.
    pub promotions: String,
    /// Per-parent generation cap, 0 = unlimited.
    pub cap_per_parent: usize,
    /// Dedupe identical resulting positions within a generation ply.
    pub unique_per_ply: bool,
    pub castle_safety: bool,

    pub center_piece_placement_reward: i32,
    pub end_game_king_center_magnet: i32,
    pub end_game_material_floor: i32,
    pub end_game_material_ceiling: i32,
    pub development_incentive: f64,
    pub rank_attack_factor: f64,
    pub not_just_empty_squares_threat_reward: bool,
    pub development_opponent_weight: f64,
    pub castle_king_side_reward: i32,
    pub castle_queen_side_reward: i32,
    pub king_non_castle_move_penalty: i32,

    pub colorblind_search: bool,
    pub engine_side: SideName,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            weights: PieceWeights::default(),
            terms: ScoringTerms::default(),
            tempo: 10,

            search_depth: 1,
            extend_on_capture: true,
            extend_on_check: false,

            include_castling: true,
            include_en_passant: true,
            promotions: "qrbn".to_owned(),
            cap_per_parent: 0,
            unique_per_ply: false,
            castle_safety: true,

            center_piece_placement_reward: 0,
            end_game_king_center_magnet: 0,
            end_game_material_floor: 600,
            end_game_material_ceiling: 1800,
            development_incentive: 0.0,
            rank_attack_factor: 1.0,
            not_just_empty_squares_threat_reward: false,
            development_opponent_weight: 1.0,
            castle_king_side_reward: 0,
            castle_queen_side_reward: 0,
            king_non_castle_move_penalty: 0,

            colorblind_search: true,
            engine_side: SideName::White,
        }
    }
}

impl AnalysisOptions {
    /// Deserialize an options JSON string, then normalize it.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let mut options: AnalysisOptions = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidRequest(format!("options do not match schema: {e}")))?;
        options.normalize();
        Ok(options)
    }

    /// Apply range clamps and input sanitation in one place.
    pub fn normalize(&mut self) {
        if self.search_depth < 1 {
            self.search_depth = 1;
        }
        if self.end_game_material_ceiling <= self.end_game_material_floor {
            self.end_game_material_ceiling = self.end_game_material_floor + 1;
        }

        let mut cleaned = String::new();
        for ch in self.promotions.chars() {
            let lower = ch.to_ascii_lowercase();
            if matches!(lower, 'q' | 'r' | 'b' | 'n') && !cleaned.contains(lower) {
                cleaned.push(lower);
            }
        }
        self.promotions = if cleaned.is_empty() {
            "qrbn".to_owned()
        } else {
            cleaned
        };
    }

    /// Promotion choices in the caller-requested order.
    pub fn promotion_set(&self) -> Vec<PieceKind> {
        self.promotions
            .chars()
            .filter_map(|ch| match ch {
                'q' => Some(PieceKind::Queen),
                'r' => Some(PieceKind::Rook),
                'b' => Some(PieceKind::Bishop),
                'n' => Some(PieceKind::Knight),
                _ => None,
            })
            .collect()
    }
}
