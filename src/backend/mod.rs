//! Analysis backends.
//!
//! The actual APK analysis happens on a remote server. [`HttpBackend`] talks to it, while
//! [`DemoBackend`] fabricates plausible results locally for demonstrations.

mod demo;
mod http;

pub use self::{demo::DemoBackend, http::HttpBackend};

use crate::{error::Kind, results::RawAnalysisResult, validation::SelectedFile};
use serde::Deserialize;
use std::time::Duration;

/// Default timeout of a single scan: ten minutes.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Default timeout of a batch report: fifteen minutes.
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(15 * 60);
/// Default timeout of the health check.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Per request scan options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Asks the server for a quick scan.
    pub quick: bool,
    /// Asks the server for debugging information.
    pub debug: bool,
    /// Client side timeout of scan requests.
    pub scan_timeout: Duration,
    /// Client side timeout of report requests.
    pub report_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            quick: false,
            debug: false,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            report_timeout: DEFAULT_REPORT_TIMEOUT,
        }
    }
}

/// Base64 encoded report, as returned by the report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportDocument {
    /// Word document, base64 encoded.
    #[serde(default)]
    pub word_report: String,
}

/// Trait implemented by every analysis backend.
#[allow(async_fn_in_trait)]
pub trait ScanBackend {
    /// Checks that the backend is reachable.
    async fn health(&self) -> Result<(), Kind>;

    /// Analyzes a single package.
    async fn scan(
        &self,
        file: &SelectedFile,
        options: &ScanOptions,
    ) -> Result<RawAnalysisResult, Kind>;

    /// Analyzes several packages in a single request. Results keep the order of `files`.
    async fn scan_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<Vec<RawAnalysisResult>, Kind>;

    /// Generates a Word report for the given packages.
    async fn report_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<ReportDocument, Kind>;
}

/// Backend selected at runtime.
#[derive(Debug)]
pub enum Backend {
    /// Remote analysis server.
    Http(HttpBackend),
    /// Local fabricated results.
    Demo(DemoBackend),
}

impl ScanBackend for Backend {
    async fn health(&self) -> Result<(), Kind> {
        match self {
            Backend::Http(b) => b.health().await,
            Backend::Demo(b) => b.health().await,
        }
    }

    async fn scan(
        &self,
        file: &SelectedFile,
        options: &ScanOptions,
    ) -> Result<RawAnalysisResult, Kind> {
        match self {
            Backend::Http(b) => b.scan(file, options).await,
            Backend::Demo(b) => b.scan(file, options).await,
        }
    }

    async fn scan_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<Vec<RawAnalysisResult>, Kind> {
        match self {
            Backend::Http(b) => b.scan_batch(files, options).await,
            Backend::Demo(b) => b.scan_batch(files, options).await,
        }
    }

    async fn report_batch(
        &self,
        files: &[SelectedFile],
        options: &ScanOptions,
    ) -> Result<ReportDocument, Kind> {
        match self {
            Backend::Http(b) => b.report_batch(files, options).await,
            Backend::Demo(b) => b.report_batch(files, options).await,
        }
    }
}
