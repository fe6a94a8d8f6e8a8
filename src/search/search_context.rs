//! Shared search state and per-line bookkeeping.
//!
//! `SearchContext` bundles what a search invocation owns: the options, the
//! root snapshot, the transposition cache handle, and the cooperative
//! cancellation flag. `LineState` is the line-local repetition ledger — it
//! travels down one line of play by value, so sibling branches never observe
//! each other's repetition counts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::evaluation::root_reference::RootReference;
use crate::game_state::position::PositionKey;
use crate::options::AnalysisOptions;
use crate::search::transposition_table::{
    TranspositionEntry, TranspositionKey, TranspositionTable,
};

/// Why a search line stopped or short-circuited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationReason {
    /// The position repeated a third time within the line; scored neutral.
    ThreefoldCutoff,
    /// The score came straight from the transposition cache.
    CacheHit,
    /// The side to move had no legal moves.
    NoLegalMoves,
    /// Cooperative cancellation was observed.
    Cancelled,
}

pub struct SearchContext<'a> {
    pub options: &'a AnalysisOptions,
    pub root: RootReference,
    pub tt: &'a Mutex<TranspositionTable>,
    pub cancel: Option<&'a AtomicBool>,
}

impl SearchContext<'_> {
    #[inline]
    pub fn cancelled(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Probe the transposition cache. The lock is held only for the lookup,
    /// never across a recursive search call; a poisoned lock degrades to a
    /// cache miss.
    #[inline]
    pub fn tt_probe(&self, key: &TranspositionKey) -> Option<TranspositionEntry> {
        self.tt.lock().ok().and_then(|mut table| table.probe(key))
    }

    /// Store into the transposition cache; a poisoned lock skips caching.
    #[inline]
    pub fn tt_store(&self, key: TranspositionKey, entry: TranspositionEntry) {
        if let Ok(mut table) = self.tt.lock() {
            table.store(key, entry);
        }
    }
}

/// Repetition counts along the current line of play, copied on descend.
#[derive(Debug, Clone, Default)]
pub struct LineState {
    repetitions: HashMap<PositionKey, u32>,
}

impl LineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `key` has already occurred on this line.
    #[inline]
    pub fn occurrences(&self, key: &PositionKey) -> u32 {
        self.repetitions.get(key).copied().unwrap_or(0)
    }

    /// Record a visit to `key`.
    #[inline]
    pub fn record(&mut self, key: PositionKey) {
        *self.repetitions.entry(key).or_insert(0) += 1;
    }

    /// Copy this line state and record one more visit on the copy.
    pub fn descend(&self, key: PositionKey) -> Self {
        let mut next = self.clone();
        next.record(key);
        next
    }
}

/// Value returned from one search-tree node.
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    pub score: i32,
    pub pv: Vec<u64>,
    pub nodes: u64,
    pub reasons: Vec<ContinuationReason>,
    pub aborted: bool,
}

impl NodeOutcome {
    pub fn leaf(score: i32) -> Self {
        Self {
            score,
            pv: Vec::new(),
            nodes: 1,
            reasons: Vec::new(),
            aborted: false,
        }
    }

    pub fn with_reason(score: i32, reason: ContinuationReason) -> Self {
        Self {
            score,
            pv: Vec::new(),
            nodes: 1,
            reasons: vec![reason],
            aborted: false,
        }
    }

    pub fn aborted() -> Self {
        Self {
            score: 0,
            pv: Vec::new(),
            nodes: 1,
            reasons: vec![ContinuationReason::Cancelled],
            aborted: true,
        }
    }

    /// Merge a child's noteworthy reasons into this outcome, deduplicated.
    pub fn absorb_reasons(&mut self, child: &NodeOutcome) {
        for reason in &child.reasons {
            if !self.reasons.contains(reason) {
                self.reasons.push(*reason);
            }
        }
    }
}
