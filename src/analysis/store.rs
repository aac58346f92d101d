//! Injected state container of the analysis runs.
//!
//! Every mutation coming from a run carries its [`RunId`]. Once a newer run has started, or the
//! store has been reset, mutations tagged with an older identifier are ignored, so late timer
//! ticks or responses can never corrupt the current run.

use super::checks::{AnalysisCheck, CheckStatus};
use crate::results::DisplayResult;
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;

/// Highest overall progress the simulation can reach on its own.
pub const SIMULATION_PROGRESS_CAP: u8 = 95;

/// Identifier of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RunId(u64);

impl RunId {
    fn next(self) -> Self {
        RunId(self.0.wrapping_add(1))
    }
}

/// State of the current analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRunState {
    run: RunId,
    is_analyzing: bool,
    overall_progress: u8,
    current_check: Option<&'static str>,
    completed: BTreeSet<&'static str>,
    checks: Vec<AnalysisCheck>,
    results: Vec<DisplayResult>,
    error: Option<String>,
}

impl Default for AnalysisRunState {
    fn default() -> Self {
        Self {
            run: RunId::default(),
            is_analyzing: false,
            overall_progress: 0,
            current_check: None,
            completed: BTreeSet::new(),
            checks: AnalysisCheck::all(),
            results: Vec::new(),
            error: None,
        }
    }
}

impl AnalysisRunState {
    /// Gets the identifier of the current run.
    pub fn run(&self) -> RunId {
        self.run
    }

    /// Returns whether a run is in flight.
    pub fn is_analyzing(&self) -> bool {
        self.is_analyzing
    }

    /// Gets the overall progress, 0 to 100.
    pub fn overall_progress(&self) -> u8 {
        self.overall_progress
    }

    /// Gets the identifier of the check currently shown as running.
    pub fn current_check(&self) -> Option<&'static str> {
        self.current_check
    }

    /// Gets the identifiers of the completed checks.
    pub fn completed(&self) -> &BTreeSet<&'static str> {
        &self.completed
    }

    /// Gets the checks, in display order.
    pub fn checks(&self) -> &[AnalysisCheck] {
        &self.checks
    }

    /// Gets the published results of the last successful run.
    pub fn results(&self) -> &[DisplayResult] {
        &self.results
    }

    /// Gets the user facing error of the last failed run.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn clear(&mut self) {
        self.is_analyzing = false;
        self.overall_progress = 0;
        self.current_check = None;
        self.completed.clear();
        self.checks.iter_mut().for_each(AnalysisCheck::reset);
        self.results.clear();
        self.error = None;
    }

    fn is_current(&self, run: RunId) -> bool {
        self.run == run && self.is_analyzing
    }
}

/// Shared, cloneable handle to the analysis state.
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    state: Arc<Mutex<AnalysisRunState>>,
    runs: Arc<watch::Sender<RunId>>,
}

impl AnalysisStore {
    /// Creates an idle store.
    pub fn new() -> Self {
        let (runs, _) = watch::channel(RunId::default());
        Self {
            state: Arc::new(Mutex::new(AnalysisRunState::default())),
            runs: Arc::new(runs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisRunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new run, superseding the current one.
    pub fn begin_run(&self) -> RunId {
        let run = {
            let mut state = self.lock();
            state.clear();
            state.run = state.run.next();
            state.is_analyzing = true;
            state.current_check = state.checks.first_mut().map(|check| {
                check.start();
                check.id()
            });
            state.run
        };
        let _ = self.runs.send_replace(run);
        run
    }

    /// Advances the simulated progress of the run by `increment` points.
    ///
    /// Returns `false` once the run is stale or every check is done, meaning the simulation
    /// must stop.
    pub fn advance(&self, run: RunId, increment: u8) -> bool {
        let mut state = self.lock();
        if !state.is_current(run) {
            return false;
        }

        let index = match state
            .checks
            .iter()
            .position(|c| c.status() == CheckStatus::Pending || c.status() == CheckStatus::Running)
        {
            Some(i) => i,
            None => return false,
        };

        if state.checks[index].advance(increment) {
            let id = state.checks[index].id();
            let _ = state.completed.insert(id);
            let next = state.checks.get_mut(index + 1).map(|next| {
                next.start();
                next.id()
            });
            state.current_check = next;
        } else {
            state.current_check = Some(state.checks[index].id());
        }

        let total: u32 = state.checks.iter().map(|c| u32::from(c.progress())).sum();
        let count = u32::try_from(state.checks.len()).unwrap_or(1).max(1);
        let mean = u8::try_from(total / count).unwrap_or(100);
        state.overall_progress = state
            .overall_progress
            .max(mean.min(SIMULATION_PROGRESS_CAP));

        state.current_check.is_some()
    }

    /// Completes the run and publishes its results. Ignored if the run is stale.
    pub fn complete(&self, run: RunId, results: Vec<DisplayResult>) -> bool {
        let mut state = self.lock();
        if !state.is_current(run) {
            return false;
        }

        for check in &mut state.checks {
            check.complete();
        }
        let ids: Vec<_> = state.checks.iter().map(AnalysisCheck::id).collect();
        state.completed.extend(ids);
        state.current_check = None;
        state.overall_progress = 100;
        state.is_analyzing = false;
        state.results = results;
        state.error = None;
        true
    }

    /// Fails the run with a user facing message. Ignored if the run is stale.
    pub fn fail<S: Into<String>>(&self, run: RunId, message: S) -> bool {
        let mut state = self.lock();
        if !state.is_current(run) {
            return false;
        }

        for check in &mut state.checks {
            check.fail();
        }
        state.current_check = None;
        state.overall_progress = 0;
        state.is_analyzing = false;
        state.results.clear();
        state.error = Some(message.into());
        true
    }

    /// Records a user facing error outside of any run.
    pub fn set_error<S: Into<String>>(&self, message: S) {
        self.lock().error = Some(message.into());
    }

    /// Invalidates the current run, if any, and returns to the idle state.
    pub fn reset(&self) {
        let run = {
            let mut state = self.lock();
            state.clear();
            state.run = state.run.next();
            state.run
        };
        let _ = self.runs.send_replace(run);
    }

    /// Resets the store and releases this handle.
    pub fn dispose(self) {
        self.reset();
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AnalysisRunState {
        self.lock().clone()
    }

    /// Gets the identifier of the current run.
    pub fn current_run(&self) -> RunId {
        self.lock().run
    }

    /// Subscribes to run changes. The receiver sees a new value whenever a run starts or the
    /// store is reset.
    pub fn subscribe(&self) -> watch::Receiver<RunId> {
        self.runs.subscribe()
    }
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new()
    }
}
