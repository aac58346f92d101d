//! Local backend that fabricates plausible results, for demonstrations.
//!
//! Results are driven by a random risk score, so they go through the three tier verdict
//! mapping instead of the binary prediction of the real server.

use super::{ReportDocument, ScanBackend, ScanOptions};
use crate::{
    error::Kind,
    results::{FeatureVector, RawAnalysisResult, Verdict, SUSPICIOUS_THRESHOLD},
    validation::SelectedFile,
};
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    ops::Range,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tokio::time;

/// Fabricates analysis results locally.
#[derive(Debug)]
pub struct DemoBackend {
    rng: Mutex<StdRng>,
    latency: Option<Range<u64>>,
}

impl DemoBackend {
    /// Creates a demo backend with a few seconds of simulated latency per scan.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency: Some(3_000..6_000),
        }
    }

    /// Creates a reproducible demo backend, without simulated latency.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency: None,
        }
    }

    fn latency(&self) -> Option<Duration> {
        let range = self.latency.clone()?;
        let millis = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(range);
        Some(Duration::from_millis(millis))
    }

    fn fabricate(&self, file: &SelectedFile) -> RawAnalysisResult {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let score: f64 = rng.gen_range(0.0..100.0);
        let verdict = Verdict::from_risk_score(score);
        let risk = match verdict {
            Verdict::Safe => "Green",
            Verdict::Suspicious => "Yellow",
            Verdict::Dangerous => "Red",
        };

        let banking = file.name().to_lowercase().contains("bank");
        let suspicious = if score < SUSPICIOUS_THRESHOLD {
            0
        } else {
            rng.gen_range(1_u32..8)
        };
        let features = FeatureVector {
            cert_present: Some(if verdict == Verdict::Safe || rng.gen_bool(0.3) {
                1.0
            } else {
                0.0
            }),
            num_permissions: Some(f64::from(rng.gen_range(3_u32..25))),
            num_dangerous_permissions: Some((score / 10.0).floor()),
            count_suspicious: Some(f64::from(suspicious)),
            impersonation_score: Some(if banking {
                rng.gen_range(score..=100.0)
            } else {
                rng.gen_range(0.0..=score)
            }),
            label_contains_bank: Some(if banking { 1.0 } else { 0.0 }),
            ..FeatureVector::default()
        };

        debug!("fabricated risk score {:.1} for `{}`", score, file.name());

        RawAnalysisResult {
            probability: Some(score / 100.0),
            risk: Some(risk.to_owned()),
            risk_score: Some(score),
            feature_vector: Some(features),
            file_name: Some(file.name().to_owned()),
            ..RawAnalysisResult::default()
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanBackend for DemoBackend {
    async fn health(&self) -> Result<(), Kind> {
        Ok(())
    }

    async fn scan(
        &self,
        file: &SelectedFile,
        _options: &ScanOptions,
    ) -> Result<RawAnalysisResult, Kind> {
        if let Some(latency) = self.latency() {
            time::sleep(latency).await;
        }
        Ok(self.fabricate(file))
    }

    async fn scan_batch(
        &self,
        files: &[SelectedFile],
        _options: &ScanOptions,
    ) -> Result<Vec<RawAnalysisResult>, Kind> {
        if let Some(latency) = self.latency() {
            time::sleep(latency).await;
        }
        Ok(files.iter().map(|f| self.fabricate(f)).collect())
    }

    async fn report_batch(
        &self,
        _files: &[SelectedFile],
        _options: &ScanOptions,
    ) -> Result<ReportDocument, Kind> {
        Err(Kind::Config {
            message: "report generation is not available in demo mode".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DemoBackend;
    use crate::{
        backend::{ScanBackend, ScanOptions},
        results::{normalize, Verdict},
        validation::SelectedFile,
    };

    #[tokio::test]
    async fn it_fabricates_consistent_results() {
        let backend = DemoBackend::with_seed(42);
        let file = SelectedFile::new("mybank.apk", 1024, "mybank.apk");

        for _ in 0..50 {
            let raw = backend.scan(&file, &ScanOptions::default()).await.unwrap();
            let score = raw.risk_score.unwrap();
            assert!((0.0..100.0).contains(&score));
            assert!(raw.prediction.is_none());

            let display = normalize(&raw, &file);
            assert_eq!(display.verdict(), Verdict::from_risk_score(score));
            assert!(display
                .warnings()
                .iter()
                .any(|w| w.title() == "Banking-related application"));
        }
    }

    #[tokio::test]
    async fn it_has_no_reports() {
        let backend = DemoBackend::with_seed(1);
        assert!(backend
            .report_batch(&[], &ScanOptions::default())
            .await
            .is_err());
    }
}
