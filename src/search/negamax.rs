//! Search controller: negamax with alpha-beta pruning, single-budget
//! extensions, capture-only quiescence, line-local repetition cutoff, and
//! transposition caching.
//!
//! The search maximizes for the engine side — the side to move at the
//! search root. Internal node scores are side-to-move relative and negated
//! on the way up; top-level aggregates are converted to the fixed
//! white-centric external scale. The colorblind variant additionally
//! requires the root side to move to be the analyzed side and rejects any
//! other request before computing — an explicit API contract.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::EngineError;
use crate::evaluation::root_reference::RootReference;
use crate::evaluation::scoring::{evaluate_with_root, material_balance};
use crate::game_state::chess_types::Color;
use crate::game_state::position::Position;
use crate::move_generation::apply_move::apply_move;
use crate::move_generation::legality_filter::{is_king_in_check, legal_moves};
use crate::options::AnalysisOptions;
use crate::search::search_context::{ContinuationReason, LineState, NodeOutcome, SearchContext};
use crate::search::transposition_table::{
    TranspositionEntry, TranspositionKey, TranspositionTable,
};
use crate::utils::long_algebraic::move_to_long_algebraic;

/// Capture-only quiescence is depth-limited by this fixed cap.
const QUIESCENCE_DEPTH_CAP: u32 = 8;

const SCORE_FLOOR: i32 = i32::MIN + 1;

/// Best-move answer for one search invocation, owned by the caller.
#[derive(Debug, Clone)]
pub struct BestMoveResult {
    pub best: Option<u64>,
    pub best_uci: Option<String>,
    /// Aggregate score on the fixed white-centric scale.
    pub score: i32,
    /// Material-only swing of the chosen move, white-centric.
    pub immediate_delta: i32,
    /// Static evaluation of the root, white-centric.
    pub base_eval: i32,
    pub nodes: u64,
    pub plies: u32,
    pub pv: Vec<String>,
}

/// Per-child breakdown for the "score all children" query.
#[derive(Debug, Clone)]
pub struct ChildScore {
    pub mv: u64,
    pub uci: String,
    /// Aggregate score on the fixed white-centric scale.
    pub aggregate: i32,
    pub immediate_delta: i32,
    pub resulting: Position,
    pub nodes: u64,
    pub reasons: Vec<ContinuationReason>,
    pub pv: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScoreChildrenResult {
    pub parent: Position,
    pub depth: u32,
    pub base_eval: i32,
    pub children: Vec<ChildScore>,
}

/// Caller-owned search state: the transposition cache and the root
/// tie-break RNG. No process-wide singletons.
pub struct AnalysisEngine {
    tt: Mutex<TranspositionTable>,
    rng: Mutex<StdRng>,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            tt: Mutex::new(TranspositionTable::new()),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_transposition_budget(budget_bytes: usize) -> Self {
        Self {
            tt: Mutex::new(TranspositionTable::with_budget(budget_bytes)),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reseed the tie-break RNG. Seed 0 reseeds from system entropy; any
    /// other value is deterministic, which exists to make tests
    /// reproducible.
    pub fn set_seed(&self, seed: u64) {
        if let Ok(mut rng) = self.rng.lock() {
            *rng = if seed == 0 {
                StdRng::from_os_rng()
            } else {
                StdRng::seed_from_u64(seed)
            };
        }
    }

    pub fn transposition_len(&self) -> usize {
        self.tt.lock().map(|table| table.len()).unwrap_or(0)
    }

    pub fn clear_transpositions(&self) {
        if let Ok(mut table) = self.tt.lock() {
            table.clear();
        }
    }

    /// Search for the best move, blocking until done.
    pub fn choose_best_move(
        &self,
        position: &Position,
        options: &AnalysisOptions,
    ) -> Result<BestMoveResult, EngineError> {
        match self.choose_best_move_with_cancel(position, options, None)? {
            Some(result) => Ok(result),
            None => Err(EngineError::InvalidState(
                "search aborted without a cancellation request".to_owned(),
            )),
        }
    }

    /// Search for the best move, observing a cooperative cancellation flag
    /// once per explored node. Returns `Ok(None)` when cancelled — no winner
    /// is credited.
    pub fn choose_best_move_with_cancel(
        &self,
        position: &Position,
        options: &AnalysisOptions,
        cancel: Option<&AtomicBool>,
    ) -> Result<Option<BestMoveResult>, EngineError> {
        let Some((children, base_eval, engine_side)) =
            self.analyze_root(position, options, cancel)?
        else {
            return Ok(None);
        };

        let depth = options.search_depth;
        if children.is_empty() {
            return Ok(Some(BestMoveResult {
                best: None,
                best_uci: None,
                score: base_eval,
                immediate_delta: 0,
                base_eval,
                nodes: 0,
                plies: depth,
                pv: Vec::new(),
            }));
        }

        // Maximize the engine-relative aggregate; break exact ties uniformly.
        let sign = engine_side.sign();
        let best_relative = children
            .iter()
            .map(|child| child.aggregate * sign)
            .max()
            .unwrap_or(SCORE_FLOOR);
        let tied: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.aggregate * sign == best_relative)
            .map(|(i, _)| i)
            .collect();

        let chosen = if tied.len() > 1 {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| EngineError::InvalidState("tie-break RNG lock poisoned".to_owned()))?;
            tied[rng.random_range(0..tied.len())]
        } else {
            tied[0]
        };

        let nodes = children.iter().map(|child| child.nodes).sum();
        let winner = &children[chosen];
        debug!(
            "best move {} score {} over {} candidates ({} nodes)",
            winner.uci,
            winner.aggregate,
            children.len(),
            nodes
        );

        Ok(Some(BestMoveResult {
            best: Some(winner.mv),
            best_uci: Some(winner.uci.clone()),
            score: winner.aggregate,
            immediate_delta: winner.immediate_delta,
            base_eval,
            nodes,
            plies: depth,
            pv: winner.pv.clone(),
        }))
    }

    /// Score every root child, blocking until done.
    pub fn score_children(
        &self,
        position: &Position,
        options: &AnalysisOptions,
    ) -> Result<ScoreChildrenResult, EngineError> {
        match self.score_children_with_cancel(position, options, None)? {
            Some(result) => Ok(result),
            None => Err(EngineError::InvalidState(
                "search aborted without a cancellation request".to_owned(),
            )),
        }
    }

    pub fn score_children_with_cancel(
        &self,
        position: &Position,
        options: &AnalysisOptions,
        cancel: Option<&AtomicBool>,
    ) -> Result<Option<ScoreChildrenResult>, EngineError> {
        let Some((children, base_eval, _)) = self.analyze_root(position, options, cancel)? else {
            return Ok(None);
        };

        Ok(Some(ScoreChildrenResult {
            parent: position.clone(),
            depth: options.search_depth,
            base_eval,
            children,
        }))
    }

    /// Shared root expansion: enumerate legal root moves, search each child
    /// at `depth - 1` with a fresh full window, and convert aggregates to
    /// the external perspective. Returns `None` when cancelled mid-flight.
    fn analyze_root(
        &self,
        position: &Position,
        options: &AnalysisOptions,
        cancel: Option<&AtomicBool>,
    ) -> Result<Option<(Vec<ChildScore>, i32, Color)>, EngineError> {
        if options.colorblind_search && position.side_to_move != options.engine_side.color() {
            return Err(EngineError::InvalidRequest(
                "side to move does not match the analyzed side in a colorblind search".to_owned(),
            ));
        }
        let engine_side = position.side_to_move;
        let sign = engine_side.sign();

        let ctx = SearchContext {
            options,
            root: RootReference::new(position, engine_side, options),
            tt: &self.tt,
            cancel,
        };

        let depth = options.search_depth;
        debug!("root search depth {} on {}", depth, position.to_fen());

        let base_eval = evaluate_with_root(position, options, &ctx.root);
        let root_material = material_balance(position, &options.weights);
        let moves = legal_moves(position, options)?;

        let mut root_line = LineState::new();
        root_line.record(position.key());

        let mut children = Vec::with_capacity(moves.len());
        for mv in moves {
            if ctx.cancelled() {
                return Ok(None);
            }

            let child = apply_move(position, mv)?;
            let immediate_delta = material_balance(&child, &options.weights) - root_material;
            let uci = move_to_long_algebraic(mv)?;

            let (aggregate_relative, nodes, reasons, child_pv) = if depth <= 1 {
                (
                    sign * evaluate_with_root(&child, options, &ctx.root),
                    1,
                    Vec::new(),
                    Vec::new(),
                )
            } else {
                let child_line = root_line.descend(child.key());
                let outcome = search_node(
                    &child,
                    depth - 1,
                    SCORE_FLOOR,
                    -SCORE_FLOOR,
                    true,
                    &child_line,
                    &ctx,
                )?;
                if outcome.aborted {
                    return Ok(None);
                }

                // The child node's score is relative to its own side to
                // move, i.e. the opponent.
                (-outcome.score, outcome.nodes, outcome.reasons, outcome.pv)
            };

            let mut pv = Vec::with_capacity(1 + child_pv.len());
            pv.push(uci.clone());
            for continuation in &child_pv {
                pv.push(move_to_long_algebraic(*continuation)?);
            }

            children.push(ChildScore {
                mv,
                uci,
                aggregate: sign * aggregate_relative,
                immediate_delta,
                resulting: child,
                nodes,
                reasons,
                pv,
            });
        }

        Ok(Some((children, base_eval, engine_side)))
    }
}

/// Static evaluation from the perspective of the side to move at this node.
#[inline]
fn relative_eval(position: &Position, ctx: &SearchContext) -> i32 {
    position.side_to_move.sign() * evaluate_with_root(position, ctx.options, &ctx.root)
}

/// One internal search node. `line` already includes this position's key.
fn search_node(
    position: &Position,
    depth: u32,
    mut alpha: i32,
    beta: i32,
    ext_available: bool,
    line: &LineState,
    ctx: &SearchContext,
) -> Result<NodeOutcome, EngineError> {
    if ctx.cancelled() {
        return Ok(NodeOutcome::aborted());
    }
    if depth == 0 {
        return quiescence(position, QUIESCENCE_DEPTH_CAP, alpha, beta, ctx);
    }

    // Third arrival of this key on the current line is treated as drawn,
    // regardless of material on the board.
    let key = position.key();
    if line.occurrences(&key) >= 3 {
        return Ok(NodeOutcome::with_reason(0, ContinuationReason::ThreefoldCutoff));
    }

    let tt_key = TranspositionKey {
        position: key,
        depth,
    };
    if let Some(entry) = ctx.tt_probe(&tt_key) {
        let mut outcome = NodeOutcome::with_reason(entry.score, ContinuationReason::CacheHit);
        if let Some(best) = entry.best_move {
            outcome.pv.push(best);
        }
        return Ok(outcome);
    }

    let moves = legal_moves(position, ctx.options)?;
    if moves.is_empty() {
        return Ok(NodeOutcome::with_reason(
            relative_eval(position, ctx),
            ContinuationReason::NoLegalMoves,
        ));
    }

    let parent_material = material_balance(position, &ctx.options.weights);
    let in_check_before = is_king_in_check(position, position.side_to_move);

    let mut result = NodeOutcome::leaf(SCORE_FLOOR);
    let mut best_move = None;

    for mv in moves {
        if ctx.cancelled() {
            return Ok(NodeOutcome::aborted());
        }

        let child = apply_move(position, mv)?;
        let swing = material_balance(&child, &ctx.options.weights) != parent_material;

        // One extension budget per line: a capture/promotion swing or being
        // in check buys one extra ply, and extensions never compound.
        let mut child_depth = depth - 1;
        let mut used_ext = false;
        if ext_available && ctx.options.extend_on_capture && swing {
            child_depth += 1;
            used_ext = true;
        }
        if ext_available && !used_ext && ctx.options.extend_on_check && in_check_before {
            child_depth += 1;
            used_ext = true;
        }

        let child_line = line.descend(child.key());
        let child_outcome = search_node(
            &child,
            child_depth,
            -beta,
            -alpha,
            ext_available && !used_ext,
            &child_line,
            ctx,
        )?;
        if child_outcome.aborted {
            return Ok(NodeOutcome::aborted());
        }

        let score = -child_outcome.score;
        result.nodes += child_outcome.nodes;
        result.absorb_reasons(&child_outcome);

        if score > result.score {
            result.score = score;
            best_move = Some(mv);
            result.pv = Vec::with_capacity(1 + child_outcome.pv.len());
            result.pv.push(mv);
            result.pv.extend_from_slice(&child_outcome.pv);
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    ctx.tt_store(
        tt_key,
        TranspositionEntry {
            depth,
            score: result.score,
            best_move,
        },
    );

    Ok(result)
}

/// Capture-only quiescence with stand-pat: the static evaluation is the
/// floor, and only moves that change the signed material balance are
/// explored, down to a small fixed cap.
fn quiescence(
    position: &Position,
    qdepth: u32,
    mut alpha: i32,
    beta: i32,
    ctx: &SearchContext,
) -> Result<NodeOutcome, EngineError> {
    if ctx.cancelled() {
        return Ok(NodeOutcome::aborted());
    }

    let stand = relative_eval(position, ctx);
    if stand >= beta || qdepth == 0 {
        return Ok(NodeOutcome::leaf(stand));
    }
    if stand > alpha {
        alpha = stand;
    }

    let moves = legal_moves(position, ctx.options)?;
    if moves.is_empty() {
        return Ok(NodeOutcome::with_reason(stand, ContinuationReason::NoLegalMoves));
    }

    let parent_material = material_balance(position, &ctx.options.weights);
    let mut nodes = 1u64;

    for mv in moves {
        if ctx.cancelled() {
            return Ok(NodeOutcome::aborted());
        }

        let child = apply_move(position, mv)?;
        if material_balance(&child, &ctx.options.weights) == parent_material {
            continue;
        }

        let child_outcome = quiescence(&child, qdepth - 1, -beta, -alpha, ctx)?;
        if child_outcome.aborted {
            return Ok(NodeOutcome::aborted());
        }

        let score = -child_outcome.score;
        nodes += child_outcome.nodes;

        if score >= beta {
            let mut outcome = NodeOutcome::leaf(score);
            outcome.nodes = nodes;
            return Ok(outcome);
        }
        if score > alpha {
            alpha = score;
        }
    }

    let mut outcome = NodeOutcome::leaf(alpha);
    outcome.nodes = nodes;
    Ok(outcome)
}
