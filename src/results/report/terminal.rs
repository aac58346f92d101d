//! Terminal report generation module.

use crate::{
    config::Config,
    criticality::Criticality,
    results::{report::Generator, AnalysisReport, RiskColor},
    utils::{format_size, progress_bar},
};
use colored::{ColoredString, Colorize};
use failure::Error;
use std::{fmt, io::Write};

/// Width of the breakdown bars, in cells.
const BAR_WIDTH: usize = 20;

/// Terminal report generator, writing a colored summary.
pub struct Terminal<W: Write> {
    writer: W,
}

impl<W: Write> fmt::Debug for Terminal<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal").finish_non_exhaustive()
    }
}

impl<W: Write> Terminal<W> {
    /// Creates a new terminal report generator writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Gets back the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn paint(text: &str, color: RiskColor) -> ColoredString {
    match color {
        RiskColor::Danger => text.red().bold(),
        RiskColor::Warning => text.yellow().bold(),
        RiskColor::Success => text.green().bold(),
    }
}

fn paint_criticality(criticality: Criticality) -> ColoredString {
    let label = format!("[{}]", criticality);
    match criticality {
        Criticality::Critical => label.red().bold(),
        Criticality::High => label.red(),
        Criticality::Medium => label.yellow(),
    }
}

impl<W: Write> Generator for Terminal<W> {
    fn generate(&mut self, config: &Config, report: &AnalysisReport) -> Result<(), Error> {
        let result = report.result();
        let verdict = result.verdict().to_string().to_uppercase();

        if config.is_quiet() {
            writeln!(
                self.writer,
                "{}: {} ({}%)",
                result.file_name(),
                paint(&verdict, result.risk_color()),
                result.confidence_score()
            )?;
            return Ok(());
        }

        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{} ({})",
            result.file_name().bold(),
            format_size(report.file().size())
        )?;
        writeln!(
            self.writer,
            "  Verdict: {}  {}% confidence, risk level {}",
            paint(&verdict, result.risk_color()),
            result.confidence_score(),
            result.risk_level()
        )?;
        if let Some(fingerprint) = report.fingerprint() {
            writeln!(self.writer, "  SHA-256: {}", fingerprint.sha256())?;
        }
        if result.threat_feed_match() {
            writeln!(
                self.writer,
                "  {}",
                "Matched a known threat in the threat intelligence feed".red().bold()
            )?;
        }

        let breakdown = result.security_breakdown();
        if breakdown.overall() > 0 {
            writeln!(self.writer, "  Security breakdown:")?;
            for (name, score) in &[
                ("Code integrity", breakdown.code_integrity),
                ("Permission analysis", breakdown.permission_analysis),
                ("Network behavior", breakdown.network_behavior),
                ("Data encryption", breakdown.data_encryption),
                ("Overall", breakdown.overall()),
            ] {
                writeln!(
                    self.writer,
                    "    {:<20} {} {:>3}",
                    name,
                    progress_bar(*score, BAR_WIDTH),
                    score
                )?;
            }
        }

        if !result.warnings().is_empty() {
            writeln!(self.writer, "  Warnings:")?;
            for warning in result.warnings() {
                writeln!(
                    self.writer,
                    "    {} {}: {}",
                    paint_criticality(warning.kind()),
                    warning.title().bold(),
                    warning.message()
                )?;
            }
        }

        writeln!(self.writer, "  Recommendations:")?;
        for recommendation in result.recommendations() {
            writeln!(self.writer, "    - {}", recommendation)?;
        }

        if config.is_verbose() {
            if let Some(explanation) = result.explanation() {
                writeln!(self.writer, "  Explanation:")?;
                for line in explanation.lines() {
                    writeln!(self.writer, "    {}", line)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Terminal;
    use crate::{
        cli::generate_cli,
        config::Config,
        results::{
            normalize, report::Generator, AnalysisReport, FeatureVector, FingerPrint,
            RawAnalysisResult,
        },
        validation::SelectedFile,
    };
    use std::io::{self, Write};

    fn config(args: &[&str]) -> Config {
        let mut full = vec!["apk-guardian", "fake_bank.apk"];
        full.extend_from_slice(args);
        let mut config = Config::default();
        config
            .decorate_with_cli(&generate_cli().get_matches_from(full))
            .unwrap();
        config
    }

    fn report() -> AnalysisReport {
        let file = SelectedFile::new("fake_bank.apk", 2 * 1024 * 1024, "fake_bank.apk");
        let raw = RawAnalysisResult {
            prediction: Some("fake".to_owned()),
            probability: Some(0.92),
            ai_explanation: Some("Mimics a banking login screen.".to_owned()),
            feature_vector: Some(FeatureVector {
                impersonation_score: Some(85.0),
                label_contains_bank: Some(1.0),
                count_suspicious: Some(4.0),
                ..FeatureVector::default()
            }),
            ..RawAnalysisResult::default()
        };
        let result = normalize(&raw, &file);
        AnalysisReport::new(file, result, Some(FingerPrint::from_bytes(b"")))
    }

    fn render(config: &Config) -> String {
        let mut terminal = Terminal::new(Vec::new());
        terminal.generate(config, &report()).unwrap();
        String::from_utf8(terminal.into_inner()).unwrap()
    }

    #[test]
    fn it_prints_full_summaries() {
        let output = render(&config(&["-v"]));

        assert!(output.contains("fake_bank.apk"));
        assert!(output.contains("2.0 MB"));
        assert!(output.contains("DANGEROUS"));
        assert!(output.contains("92% confidence"));
        assert!(output.contains(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(output.contains("Security breakdown:"));
        assert!(output.contains("Banking-related application"));
        assert!(output.contains("Recommendations:"));
        assert!(output.contains("Mimics a banking login screen."));
    }

    #[test]
    fn it_prints_quiet_summaries() {
        let output = render(&config(&["-q"]));

        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("fake_bank.apk: "));
        assert!(output.contains("DANGEROUS"));
        assert!(output.contains("(92%)"));
    }

    #[test]
    fn it_debugs_any_writer() {
        struct Sink;

        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        assert_eq!(format!("{:?}", Terminal::new(Sink)), "Terminal { .. }");
    }
}
