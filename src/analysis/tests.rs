use super::{CheckStatus, Orchestrator, Simulator, SIMULATION_PROGRESS_CAP};
use crate::{
    backend::{ReportDocument, ScanBackend, ScanOptions},
    criticality::Criticality,
    error::Kind,
    results::{FeatureVector, RawAnalysisResult, RiskColor, Verdict},
    validation::SelectedFile,
};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use tokio::time;

/// Backend answering every scan with the same response after a fixed delay.
struct MockBackend {
    delay: Duration,
    response: Result<RawAnalysisResult, Kind>,
    calls: AtomicUsize,
    batch_limit: Option<usize>,
}

impl MockBackend {
    fn new(delay: Duration, response: Result<RawAnalysisResult, Kind>) -> Self {
        Self {
            delay,
            response,
            calls: AtomicUsize::new(0),
            batch_limit: None,
        }
    }

    /// Answers batches with at most `limit` results.
    fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScanBackend for MockBackend {
    async fn health(&self) -> Result<(), Kind> {
        Ok(())
    }

    async fn scan(
        &self,
        file: &SelectedFile,
        _options: &ScanOptions,
    ) -> Result<RawAnalysisResult, Kind> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        time::sleep(self.delay).await;
        self.response.clone().map(|mut raw| {
            raw.file_name = Some(file.name().to_owned());
            raw
        })
    }

    async fn scan_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<Vec<RawAnalysisResult>, Kind> {
        let mut results = Vec::with_capacity(files.len());
        let limit = self.batch_limit.unwrap_or(files.len());
        for file in files.iter().take(limit) {
            results.push(self.scan(file, options).await?);
        }
        Ok(results)
    }

    async fn report_batch(
        &self,
        _files: &[SelectedFile],
        _options: &ScanOptions,
    ) -> Result<ReportDocument, Kind> {
        Ok(ReportDocument {
            word_report: String::new(),
        })
    }
}

fn fixed_simulator() -> Simulator {
    Simulator::Fixed {
        interval: Duration::from_millis(500),
        increment: 20,
    }
}

fn orchestrator(backend: MockBackend) -> Orchestrator<MockBackend> {
    Orchestrator::new(backend, fixed_simulator(), ScanOptions::default())
}

fn legit_bank() -> RawAnalysisResult {
    RawAnalysisResult {
        prediction: Some("legit".to_owned()),
        probability: Some(0.05),
        feature_vector: Some(FeatureVector {
            cert_present: Some(1.0),
            num_permissions: Some(3.0),
            ..FeatureVector::default()
        }),
        ..RawAnalysisResult::default()
    }
}

fn fake_bank() -> RawAnalysisResult {
    RawAnalysisResult {
        prediction: Some("fake".to_owned()),
        probability: Some(0.92),
        feature_vector: Some(FeatureVector {
            impersonation_score: Some(85.0),
            label_contains_bank: Some(1.0),
            count_suspicious: Some(4.0),
            ..FeatureVector::default()
        }),
        ..RawAnalysisResult::default()
    }
}

#[tokio::test(start_paused = true)]
async fn it_analyzes_a_legitimate_package() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(3), Ok(legit_bank())));
    let file = SelectedFile::new("bank.apk", 5 * 1024 * 1024, "bank.apk");

    let result = orchestrator.start_analysis(Some(&file)).await.unwrap();
    assert_eq!(result.verdict(), Verdict::Safe);
    assert_eq!(result.risk_color(), RiskColor::Success);
    assert_eq!(result.confidence_score(), 95);
    assert!(result
        .warnings()
        .iter()
        .all(|w| w.kind() != Criticality::Critical));

    let state = orchestrator.store().snapshot();
    assert!(!state.is_analyzing());
    assert_eq!(state.overall_progress(), 100);
    assert_eq!(state.completed().len(), 7);
    assert_eq!(state.results(), &[result]);
    assert_eq!(state.error(), None);
}

#[tokio::test(start_paused = true)]
async fn it_analyzes_a_fake_package() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(3), Ok(fake_bank())));
    let file = SelectedFile::new("fake_bank.apk", 2 * 1024 * 1024, "fake_bank.apk");

    let result = orchestrator.start_analysis(Some(&file)).await.unwrap();
    assert_eq!(result.verdict(), Verdict::Dangerous);
    assert_eq!(result.risk_color(), RiskColor::Danger);
    assert_eq!(result.confidence_score(), 92);
    assert_eq!(result.file_name(), "fake_bank.apk");
    assert!(result
        .warnings()
        .iter()
        .any(|w| w.kind() == Criticality::Critical));
    assert!(result
        .warnings()
        .iter()
        .any(|w| w.kind() == Criticality::High));
}

#[tokio::test(start_paused = true)]
async fn it_requires_a_selected_file() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(1), Ok(legit_bank())));

    assert_eq!(
        orchestrator.start_analysis(None).await,
        Err(Kind::NoFileSelected)
    );
    assert_eq!(orchestrator.backend().calls(), 0);
    let state = orchestrator.store().snapshot();
    assert!(!state.is_analyzing());
    assert!(state.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn it_stores_classified_failures() {
    let orchestrator = orchestrator(MockBackend::new(
        Duration::from_secs(3),
        Err(Kind::Server { status: 500 }),
    ));
    let file = SelectedFile::new("app.apk", 1024, "app.apk");

    assert_eq!(
        orchestrator.start_analysis(Some(&file)).await,
        Err(Kind::Server { status: 500 })
    );
    let state = orchestrator.store().snapshot();
    assert!(!state.is_analyzing());
    assert_eq!(state.overall_progress(), 0);
    assert_eq!(
        state.error(),
        Some(Kind::Server { status: 500 }.to_string().as_str())
    );
    assert!(state.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn it_keeps_progress_monotonic() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(30), Ok(legit_bank())));
    let file = SelectedFile::new("app.apk", 1024, "app.apk");
    let store = orchestrator.store().clone();

    let sampler = async {
        let mut samples = Vec::new();
        loop {
            time::sleep(Duration::from_millis(250)).await;
            let state = store.snapshot();
            samples.push((state.is_analyzing(), state.overall_progress()));
            if !state.is_analyzing() {
                return samples;
            }
        }
    };
    let (result, samples) = tokio::join!(orchestrator.start_analysis(Some(&file)), sampler);
    assert!(result.is_ok());

    let (last, running) = samples.split_last().unwrap();
    assert_eq!(*last, (false, 100));
    assert!(running
        .iter()
        .all(|&(analyzing, progress)| analyzing && progress <= SIMULATION_PROGRESS_CAP));
    assert!(running.windows(2).all(|w| w[0].1 <= w[1].1));
    assert_eq!(running.last().map(|s| s.1), Some(SIMULATION_PROGRESS_CAP));
}

#[tokio::test(start_paused = true)]
async fn it_supersedes_older_runs() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(5), Ok(legit_bank())));
    let first = SelectedFile::new("first.apk", 1024, "first.apk");
    let second = SelectedFile::new("second.apk", 1024, "second.apk");

    let (old, new) = tokio::join!(orchestrator.start_analysis(Some(&first)), async {
        time::sleep(Duration::from_secs(2)).await;
        orchestrator.start_analysis(Some(&second)).await
    });

    assert_eq!(old, Err(Kind::Cancelled));
    assert_eq!(new.unwrap().file_name(), "second.apk");
    assert_eq!(orchestrator.backend().calls(), 2);

    let state = orchestrator.store().snapshot();
    assert_eq!(state.results().len(), 1);
    assert_eq!(state.results()[0].file_name(), "second.apk");
    assert_eq!(state.overall_progress(), 100);
}

#[tokio::test(start_paused = true)]
async fn it_ignores_late_ticks_after_supersession() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(60), Ok(legit_bank())));
    let first = SelectedFile::new("first.apk", 1024, "first.apk");
    let store = orchestrator.store().clone();

    let (old, ()) = tokio::join!(orchestrator.start_analysis(Some(&first)), async {
        time::sleep(Duration::from_millis(1_600)).await;
        assert_eq!(store.snapshot().checks()[0].progress(), 60);
        let run = store.begin_run();
        time::sleep(Duration::from_secs(3)).await;

        let state = store.snapshot();
        assert_eq!(state.run(), run);
        assert_eq!(state.overall_progress(), 0);
        assert!(state.checks().iter().all(|c| c.progress() == 0));
    });
    assert_eq!(old, Err(Kind::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn it_resets_while_analyzing() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(10), Ok(legit_bank())));
    let file = SelectedFile::new("app.apk", 1024, "app.apk");

    let (result, ()) = tokio::join!(orchestrator.start_analysis(Some(&file)), async {
        time::sleep(Duration::from_secs(2)).await;
        orchestrator.reset();
    });
    assert_eq!(result, Err(Kind::Cancelled));

    time::sleep(Duration::from_secs(20)).await;
    let state = orchestrator.store().snapshot();
    assert!(!state.is_analyzing());
    assert_eq!(state.overall_progress(), 0);
    assert!(state.results().is_empty());
    assert_eq!(state.error(), None);
}

#[tokio::test(start_paused = true)]
async fn it_analyzes_batches_in_order() {
    let orchestrator = orchestrator(MockBackend::new(Duration::from_secs(1), Ok(fake_bank())));
    let files = [
        SelectedFile::new("one.apk", 1024, "one.apk"),
        SelectedFile::new("two.apk", 1024, "two.apk"),
    ];

    let results = orchestrator.start_batch_analysis(&files).await.unwrap();
    let names: Vec<_> = results.iter().map(|r| r.file_name()).collect();
    assert_eq!(names, ["one.apk", "two.apk"]);
    assert_eq!(orchestrator.store().snapshot().results().len(), 2);

    assert_eq!(
        orchestrator.start_batch_analysis(&[]).await,
        Err(Kind::NoFileSelected)
    );
}

#[tokio::test(start_paused = true)]
async fn it_rejects_incomplete_batch_responses() {
    let orchestrator = orchestrator(
        MockBackend::new(Duration::from_secs(1), Ok(fake_bank())).with_batch_limit(1),
    );
    let files = [
        SelectedFile::new("one.apk", 1024, "one.apk"),
        SelectedFile::new("two.apk", 1024, "two.apk"),
        SelectedFile::new("three.apk", 1024, "three.apk"),
    ];

    assert_eq!(
        orchestrator.start_batch_analysis(&files).await,
        Err(Kind::InvalidResponse)
    );
    let state = orchestrator.store().snapshot();
    assert!(!state.is_analyzing());
    assert_eq!(state.overall_progress(), 0);
    assert!(state.results().is_empty());
    assert_eq!(
        state.error(),
        Some(Kind::InvalidResponse.to_string().as_str())
    );
}

#[tokio::test(start_paused = true)]
async fn it_runs_the_first_check_without_simulation() {
    let orchestrator = Orchestrator::new(
        MockBackend::new(Duration::from_secs(3), Ok(legit_bank())),
        Simulator::Disabled,
        ScanOptions::default(),
    );
    let file = SelectedFile::new("app.apk", 1024, "app.apk");
    let store = orchestrator.store().clone();

    let (result, ()) = tokio::join!(orchestrator.start_analysis(Some(&file)), async {
        time::sleep(Duration::from_secs(1)).await;
        let state = store.snapshot();
        assert!(state.is_analyzing());
        assert_eq!(state.overall_progress(), 0);
        let current = state.current_check().unwrap();
        let check = state.checks().iter().find(|c| c.id() == current).unwrap();
        assert_eq!(check.status(), CheckStatus::Running);
    });
    assert!(result.is_ok());
    assert_eq!(orchestrator.store().snapshot().overall_progress(), 100);
}
