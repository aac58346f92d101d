//! Analysis orchestration.
//!
//! An analysis run sends the package to the backend and, at the same time, runs the cosmetic
//! progress simulation. Only the backend response ends a run: on success every check is
//! completed and the normalized result is published, on failure the classified error is stored.
//!
//! Starting a new run, or resetting the store, supersedes the current one. The superseded
//! request is dropped, which aborts it, and its simulation stops at the next tick.

mod checks;
mod simulation;
mod store;
#[cfg(test)]
mod tests;

pub use self::{
    checks::{AnalysisCheck, CheckStatus},
    simulation::{Schedule, Simulator, Tick},
    store::{AnalysisRunState, AnalysisStore, RunId, SIMULATION_PROGRESS_CAP},
};

use crate::{
    backend::{ScanBackend, ScanOptions},
    error::Kind,
    results::{normalize, DisplayResult},
    validation::SelectedFile,
};
use log::{debug, info, warn};
use std::future::{self, Future};
use tokio::sync::watch;

/// Drives analysis runs against a backend.
#[derive(Debug)]
pub struct Orchestrator<B> {
    backend: B,
    simulator: Simulator,
    options: ScanOptions,
    store: AnalysisStore,
}

impl<B: ScanBackend> Orchestrator<B> {
    /// Creates an orchestrator with its own store.
    pub fn new(backend: B, simulator: Simulator, options: ScanOptions) -> Self {
        Self::with_store(backend, simulator, options, AnalysisStore::new())
    }

    /// Creates an orchestrator publishing into the given store.
    pub fn with_store(
        backend: B,
        simulator: Simulator,
        options: ScanOptions,
        store: AnalysisStore,
    ) -> Self {
        Self {
            backend,
            simulator,
            options,
            store,
        }
    }

    /// Gets the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets the scan options.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Gets the state store.
    pub fn store(&self) -> &AnalysisStore {
        &self.store
    }

    /// Supersedes the current run, if any, and returns to idle.
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Analyzes the selected file.
    pub async fn start_analysis(&self, file: Option<&SelectedFile>) -> Result<DisplayResult, Kind> {
        let file = match file {
            Some(f) => f,
            None => {
                warn!("analysis requested without a selected file");
                self.store.set_error(Kind::NoFileSelected.to_string());
                return Err(Kind::NoFileSelected);
            }
        };

        info!("starting analysis of `{}`", file.name());
        let mut results = self
            .drive(self.backend.scan(file, &self.options), |raw| {
                vec![normalize(&raw, file)]
            })
            .await?;

        results.pop().ok_or(Kind::InvalidResponse)
    }

    /// Analyzes several files with a single batch request.
    pub async fn start_batch_analysis(
        &self,
        files: &[SelectedFile],
    ) -> Result<Vec<DisplayResult>, Kind> {
        if files.is_empty() {
            self.store.set_error(Kind::NoFileSelected.to_string());
            return Err(Kind::NoFileSelected);
        }

        info!("starting batch analysis of {} packages", files.len());
        let request = async move {
            let raws = self.backend.scan_batch(files, &self.options).await?;
            if raws.len() != files.len() {
                warn!(
                    "the batch response has {} results for {} packages",
                    raws.len(),
                    files.len()
                );
                return Err(Kind::InvalidResponse);
            }
            Ok(raws)
        };
        self.drive(request, |raws| {
            raws.iter()
                .zip(files)
                .map(|(raw, file)| normalize(raw, file))
                .collect()
        })
        .await
    }

    /// Runs `request` as a new run, with the progress simulation alongside.
    async fn drive<T, F, N>(&self, request: F, publish: N) -> Result<Vec<DisplayResult>, Kind>
    where
        F: Future<Output = Result<T, Kind>>,
        N: FnOnce(T) -> Vec<DisplayResult>,
    {
        let run = self.store.begin_run();
        let mut runs = self.store.subscribe();
        let simulation = tokio::spawn(simulation::simulate(
            self.store.clone(),
            run,
            self.simulator.schedule(),
        ));

        let outcome = tokio::select! {
            outcome = request => outcome,
            () = superseded(&mut runs, run) => Err(Kind::Cancelled),
        };
        simulation.abort();

        match outcome {
            Ok(raw) => {
                let results = publish(raw);
                if self.store.complete(run, results.clone()) {
                    info!("analysis finished");
                    Ok(results)
                } else {
                    debug!("discarding the result of a superseded run");
                    Err(Kind::Cancelled)
                }
            }
            Err(Kind::Cancelled) => {
                debug!("analysis run superseded");
                Err(Kind::Cancelled)
            }
            Err(e) => {
                warn!("analysis failed: {}", e);
                if self.store.fail(run, e.to_string()) {
                    Err(e)
                } else {
                    Err(Kind::Cancelled)
                }
            }
        }
    }
}

/// Resolves once `run` is no longer the current run.
async fn superseded(runs: &mut watch::Receiver<RunId>, run: RunId) {
    loop {
        if *runs.borrow_and_update() != run {
            return;
        }
        if runs.changed().await.is_err() {
            future::pending::<()>().await;
        }
    }
}
