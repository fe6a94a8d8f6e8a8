//! Transposition cache: a structured-key map with a byte budget.
//!
//! Keys carry the full position identity plus the remaining search depth.
//! The cache grows until an approximate running byte total crosses the
//! configured soft ceiling and then freezes: further insertions are skipped
//! (the search silently computes without caching), existing entries remain.
//! Overwrites happen only at equal-or-greater depth.

use std::collections::HashMap;
use std::mem;

use log::debug;

use crate::game_state::position::PositionKey;

/// Default soft budget: 10 GiB, matching a long-running analysis process.
pub const DEFAULT_BUDGET_BYTES: usize = 10 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranspositionKey {
    pub position: PositionKey,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionEntry {
    pub depth: u32,
    pub score: i32,
    pub best_move: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranspositionStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
    pub rejected: u64,
}

#[derive(Debug)]
pub struct TranspositionTable {
    entries: HashMap<TranspositionKey, TranspositionEntry>,
    approximate_bytes: usize,
    budget_bytes: usize,
    frozen_logged: bool,
    stats: TranspositionStats,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::with_budget(DEFAULT_BUDGET_BYTES)
    }
}

impl TranspositionTable {
    // Per-entry footprint estimate: key + entry + map overhead fudge.
    const ENTRY_FOOTPRINT: usize =
        mem::size_of::<TranspositionKey>() + mem::size_of::<TranspositionEntry>() + 64;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            approximate_bytes: 0,
            budget_bytes,
            frozen_logged: false,
            stats: TranspositionStats::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> TranspositionStats {
        self.stats
    }

    #[inline]
    pub fn approximate_bytes(&self) -> usize {
        self.approximate_bytes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.approximate_bytes = 0;
        self.frozen_logged = false;
        self.stats = TranspositionStats::default();
    }

    pub fn probe(&mut self, key: &TranspositionKey) -> Option<TranspositionEntry> {
        self.stats.probes += 1;
        let hit = self.entries.get(key).copied();
        if hit.is_some() {
            self.stats.hits += 1;
        }
        hit
    }

    pub fn store(&mut self, key: TranspositionKey, entry: TranspositionEntry) {
        match self.entries.get_mut(&key) {
            Some(existing) => {
                if entry.depth >= existing.depth {
                    *existing = entry;
                    self.stats.stores += 1;
                }
            }
            None => {
                if self.approximate_bytes + Self::ENTRY_FOOTPRINT > self.budget_bytes {
                    self.stats.rejected += 1;
                    if !self.frozen_logged {
                        debug!(
                            "transposition cache frozen at ~{} bytes ({} entries)",
                            self.approximate_bytes,
                            self.entries.len()
                        );
                        self.frozen_logged = true;
                    }
                    return;
                }
                self.entries.insert(key, entry);
                self.approximate_bytes += Self::ENTRY_FOOTPRINT;
                self.stats.stores += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TranspositionEntry, TranspositionKey, TranspositionTable};
    use crate::game_state::position::Position;

    fn key(fen: &str, depth: u32) -> TranspositionKey {
        TranspositionKey {
            position: Position::from_fen(fen).expect("notation should parse").key(),
            depth,
        }
    }

    #[test]
    fn store_and_probe_round_trip() {
        let mut tt = TranspositionTable::new();
        let k = key("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 3);
        let entry = TranspositionEntry {
            depth: 3,
            score: 42,
            best_move: Some(99),
        };

        tt.store(k, entry);
        assert_eq!(tt.probe(&k), Some(entry));
        assert_eq!(tt.stats().hits, 1);

        // A different depth is a different key.
        assert_eq!(tt.probe(&key("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 4)), None);
    }

    #[test]
    fn clock_fields_do_not_split_entries() {
        let mut tt = TranspositionTable::new();
        let a = key("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 2);
        let b = key("4k3/8/8/8/8/8/8/4K3 w - - 30 40", 2);

        tt.store(
            a,
            TranspositionEntry {
                depth: 2,
                score: 7,
                best_move: None,
            },
        );
        assert!(tt.probe(&b).is_some());
    }

    #[test]
    fn budget_freezes_growth_without_evicting() {
        let mut tt = TranspositionTable::with_budget(3 * 300);
        let fens = [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 b - - 0 1",
            "3k4/8/8/8/8/8/8/4K3 w - - 0 1",
            "2k5/8/8/8/8/8/8/4K3 w - - 0 1",
            "1k6/8/8/8/8/8/8/4K3 w - - 0 1",
        ];

        for (i, fen) in fens.iter().enumerate() {
            tt.store(
                key(fen, 1),
                TranspositionEntry {
                    depth: 1,
                    score: i as i32,
                    best_move: None,
                },
            );
        }

        let len_at_freeze = tt.len();
        assert!(len_at_freeze < fens.len());
        assert!(tt.stats().rejected > 0);

        // Early entries survive; overwrites at a stored key still land.
        assert!(tt.probe(&key(fens[0], 1)).is_some());
        tt.store(
            key(fens[0], 1),
            TranspositionEntry {
                depth: 1,
                score: 99,
                best_move: Some(1),
            },
        );
        assert_eq!(tt.probe(&key(fens[0], 1)).map(|e| e.score), Some(99));
        assert_eq!(tt.len(), len_at_freeze);
    }

    #[test]
    fn shallower_results_never_replace_deeper_ones() {
        let mut tt = TranspositionTable::new();
        let k = key("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 2);

        tt.store(
            k,
            TranspositionEntry {
                depth: 5,
                score: 10,
                best_move: None,
            },
        );
        tt.store(
            k,
            TranspositionEntry {
                depth: 2,
                score: -3,
                best_move: None,
            },
        );
        assert_eq!(tt.probe(&k).map(|e| e.score), Some(10));
    }
}
