//! Word report export.
//!
//! The server renders the report and returns it base64 encoded. The client only decodes it and
//! stores it in the reports folder.

use crate::{
    backend::{ScanBackend, ScanOptions},
    error::Kind,
    validation::SelectedFile,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stem used for reports covering several packages.
const BATCH_STEM: &str = "batch";

/// File name of the report of the package with the given stem, generated on `date`.
pub fn report_file_name(stem: &str, date: NaiveDate) -> String {
    format!("{}_analysis_report_{}.docx", stem, date.format("%Y-%m-%d"))
}

/// Decodes the base64 payload of a report.
///
/// Line breaks and surrounding whitespace are ignored, as some servers wrap long payloads.
pub fn decode_report(payload: &str) -> Result<Vec<u8>, Kind> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(Kind::Decode);
    }
    STANDARD.decode(compact).map_err(|e| {
        debug!("invalid report payload: {}", e);
        Kind::Decode
    })
}

/// Requests the Word report of `files` and writes it into `folder`.
///
/// Returns the path of the written document.
pub async fn export_report<B: ScanBackend, P: AsRef<Path>>(
    backend: &B,
    files: &[SelectedFile],
    folder: P,
    date: NaiveDate,
    options: &ScanOptions,
) -> Result<PathBuf, Kind> {
    let stem = match files {
        [] => return Err(Kind::NoFileSelected),
        [file] => file.stem(),
        _ => BATCH_STEM,
    };

    info!("requesting the report of {} package(s)", files.len());
    let document = backend.report_batch(files, options).await?;
    let bytes = decode_report(&document.word_report)?;

    let folder = folder.as_ref();
    fs::create_dir_all(folder).await?;
    let path = folder.join(report_file_name(stem, date));
    fs::write(&path, bytes).await?;
    info!("report written to `{}`", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{decode_report, export_report, report_file_name};
    use crate::{
        backend::{DemoBackend, ReportDocument, ScanBackend, ScanOptions},
        error::Kind,
        results::RawAnalysisResult,
        validation::SelectedFile,
    };
    use chrono::NaiveDate;
    use std::{env, fs};

    struct ReportBackend(&'static str);

    impl ScanBackend for ReportBackend {
        async fn health(&self) -> Result<(), Kind> {
            Ok(())
        }

        async fn scan(
            &self,
            _file: &SelectedFile,
            _options: &ScanOptions,
        ) -> Result<RawAnalysisResult, Kind> {
            Ok(RawAnalysisResult::default())
        }

        async fn scan_batch(
            &self,
            files: &[SelectedFile],
            _options: &ScanOptions,
        ) -> Result<Vec<RawAnalysisResult>, Kind> {
            Ok(vec![RawAnalysisResult::default(); files.len()])
        }

        async fn report_batch(
            &self,
            _files: &[SelectedFile],
            _options: &ScanOptions,
        ) -> Result<ReportDocument, Kind> {
            Ok(ReportDocument {
                word_report: self.0.to_owned(),
            })
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn it_report_file_name() {
        assert_eq!(
            report_file_name("bank", date()),
            "bank_analysis_report_2024-03-09.docx"
        );
    }

    #[test]
    fn it_decodes_reports() {
        assert_eq!(decode_report("UEsDBA==").unwrap(), b"PK\x03\x04");
        assert_eq!(decode_report("UEsD\nBA==\n").unwrap(), b"PK\x03\x04");
        assert_eq!(decode_report("not base64!"), Err(Kind::Decode));
        assert_eq!(decode_report(""), Err(Kind::Decode));
    }

    #[tokio::test]
    async fn it_exports_reports() {
        let folder = env::temp_dir().join("apk-guardian-export-test");
        let files = [SelectedFile::new("bank.apk", 1024, "bank.apk")];

        let path = export_report(
            &ReportBackend("UEsDBA=="),
            &files,
            &folder,
            date(),
            &ScanOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(path, folder.join("bank_analysis_report_2024-03-09.docx"));
        assert_eq!(fs::read(&path).unwrap(), b"PK\x03\x04");

        fs::remove_dir_all(&folder).unwrap();
    }

    #[tokio::test]
    async fn it_reports_decode_failures() {
        let folder = env::temp_dir().join("apk-guardian-export-failure-test");
        let files = [
            SelectedFile::new("one.apk", 1024, "one.apk"),
            SelectedFile::new("two.apk", 1024, "two.apk"),
        ];

        let result = export_report(
            &ReportBackend("%%%"),
            &files,
            &folder,
            date(),
            &ScanOptions::default(),
        )
        .await;
        assert_eq!(result, Err(Kind::Decode));
        assert!(!folder.join("batch_analysis_report_2024-03-09.docx").exists());
    }

    #[tokio::test]
    async fn it_has_no_demo_reports() {
        let result = export_report(
            &DemoBackend::with_seed(7),
            &[SelectedFile::new("app.apk", 1, "app.apk")],
            env::temp_dir(),
            date(),
            &ScanOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(Kind::Config { .. })));
    }
}
