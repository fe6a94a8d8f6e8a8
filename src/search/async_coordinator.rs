//! Background search coordination.
//!
//! One worker thread at a time runs the search controller: Idle → Running →
//! Idle, never re-entrant. Starting a new search supersedes the previous
//! one by requesting cancellation and joining it first. Cancellation is
//! cooperative — the worker observes the flag once per explored node — and
//! `poll` never blocks. Deployments without background execution use
//! `start_blocking`, which satisfies the same contract synchronously.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::errors::EngineError;
use crate::game_state::position::Position;
use crate::options::AnalysisOptions;
use crate::search::negamax::{AnalysisEngine, BestMoveResult};

/// Snapshot returned by `poll`: the running flag plus the latest completed
/// outcome, if any.
#[derive(Debug, Clone, Default)]
pub struct SearchStatus {
    pub running: bool,
    pub latest: Option<SearchOutcome>,
}

/// Terminal state of one background search.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Finished(BestMoveResult),
    Cancelled,
    Failed(EngineError),
}

struct CoordinatorShared {
    engine: AnalysisEngine,
    running: AtomicBool,
    cancel: AtomicBool,
    latest: Mutex<Option<SearchOutcome>>,
}

pub struct AsyncSearchCoordinator {
    shared: Arc<CoordinatorShared>,
    worker: Option<JoinHandle<()>>,
}

impl Default for AsyncSearchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncSearchCoordinator {
    pub fn new() -> Self {
        Self::with_engine(AnalysisEngine::new())
    }

    /// Wrap an existing engine so the transposition cache and RNG seed
    /// persist across background searches.
    pub fn with_engine(engine: AnalysisEngine) -> Self {
        Self {
            shared: Arc::new(CoordinatorShared {
                engine,
                running: AtomicBool::new(false),
                cancel: AtomicBool::new(false),
                latest: Mutex::new(None),
            }),
            worker: None,
        }
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.shared.engine
    }

    /// Launch a background search. A search already in flight is cancelled
    /// and joined first — there is never more than one active worker.
    pub fn start(&mut self, position: Position, options: AnalysisOptions) {
        self.cancel();

        self.shared.cancel.store(false, Ordering::SeqCst);
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        self.worker = Some(std::thread::spawn(move || {
            debug!("background search started at depth {}", options.search_depth);
            let outcome = match shared.engine.choose_best_move_with_cancel(
                &position,
                &options,
                Some(&shared.cancel),
            ) {
                Ok(Some(result)) => SearchOutcome::Finished(result),
                Ok(None) => SearchOutcome::Cancelled,
                Err(error) => SearchOutcome::Failed(error),
            };

            if let Ok(mut latest) = shared.latest.lock() {
                *latest = Some(outcome);
            }
            shared.running.store(false, Ordering::SeqCst);
        }));
    }

    /// Request cooperative cancellation and block until the worker exits.
    /// No-op when idle.
    pub fn cancel(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.shared.cancel.store(true, Ordering::SeqCst);
            if worker.join().is_err() {
                warn!("background search worker panicked during join");
            }
            self.shared.running.store(false, Ordering::SeqCst);
            self.shared.cancel.store(false, Ordering::SeqCst);
        }
    }

    /// Non-blocking status: the running flag and the latest completed
    /// outcome.
    pub fn poll(&self) -> SearchStatus {
        SearchStatus {
            running: self.shared.running.load(Ordering::SeqCst),
            latest: self
                .shared
                .latest
                .lock()
                .ok()
                .and_then(|latest| latest.clone()),
        }
    }

    /// Synchronous fallback: start blocks until the search completes, and
    /// `poll` afterwards always reports completion.
    pub fn start_blocking(
        &mut self,
        position: &Position,
        options: &AnalysisOptions,
    ) -> Result<BestMoveResult, EngineError> {
        self.cancel();

        self.shared.running.store(true, Ordering::SeqCst);
        let result = self.shared.engine.choose_best_move(position, options);

        if let Ok(mut latest) = self.shared.latest.lock() {
            *latest = Some(match &result {
                Ok(outcome) => SearchOutcome::Finished(outcome.clone()),
                Err(error) => SearchOutcome::Failed(error.clone()),
            });
        }
        self.shared.running.store(false, Ordering::SeqCst);

        result
    }
}

impl Drop for AsyncSearchCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}
