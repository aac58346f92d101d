//! Analysis results: raw backend payload, display model and reports.

mod advice;
mod raw;
pub mod report;
mod utils;
mod verdict;

pub use self::{
    advice::{SecurityBreakdown, Warning},
    raw::{FeatureVector, RawAnalysisResult},
    utils::FingerPrint,
    verdict::{RiskColor, RiskLevel, Verdict, DANGEROUS_THRESHOLD, SUSPICIOUS_THRESHOLD},
};

use crate::validation::SelectedFile;
use chrono::{DateTime, Local};
use serde::{
    ser::{SerializeStruct, Serializer},
    Serialize,
};
use serde_json::Value;

/// Display ready result of an analysis.
///
/// Created once per completed analysis and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayResult {
    file_name: String,
    verdict: Verdict,
    risk_color: RiskColor,
    risk_level: RiskLevel,
    confidence_score: u8,
    recommendations: Vec<String>,
    warnings: Vec<Warning>,
    security_breakdown: SecurityBreakdown,
    explanation: Option<String>,
    threat_feed_match: bool,
    top_shap: Option<Value>,
}

impl DisplayResult {
    /// Gets the name of the analyzed file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Gets the verdict.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Gets the risk color.
    pub fn risk_color(&self) -> RiskColor {
        self.risk_color
    }

    /// Gets the risk level.
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Gets the confidence of the verdict, in percent.
    pub fn confidence_score(&self) -> u8 {
        self.confidence_score
    }

    /// Gets the ordered recommendations.
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// Gets the warnings, most severe first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Gets the security breakdown.
    pub fn security_breakdown(&self) -> SecurityBreakdown {
        self.security_breakdown
    }

    /// Gets the natural language explanation of the verdict, if the backend sent one.
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns whether the file matched a threat intelligence feed.
    pub fn threat_feed_match(&self) -> bool {
        self.threat_feed_match
    }

    /// Gets the per-feature contributions sent by the backend.
    pub fn top_shap(&self) -> Option<&Value> {
        self.top_shap.as_ref()
    }
}

/// Maps a raw backend result into the display model. Pure, never panics on missing fields.
pub fn normalize(raw: &RawAnalysisResult, file: &SelectedFile) -> DisplayResult {
    let verdict = verdict_of(raw);
    let confidence = confidence_score(raw);
    let threat_feed_match = raw.threat_feed_matched();
    let features = raw.feature_vector.as_ref();

    let risk_color = raw
        .risk
        .as_deref()
        .and_then(RiskColor::from_backend)
        .unwrap_or_else(|| RiskColor::from(verdict));

    let risk_level = match raw.risk.as_deref().and_then(RiskColor::from_backend) {
        Some(color) => RiskLevel::from_color(color),
        None => raw
            .risk_score
            .map_or(RiskLevel::Unknown, RiskLevel::from_risk_score),
    };

    DisplayResult {
        file_name: raw
            .file_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| file.name().to_owned()),
        verdict,
        risk_color,
        risk_level,
        confidence_score: confidence,
        recommendations: advice::recommendations(verdict, features),
        warnings: advice::warnings(verdict, confidence, features, threat_feed_match),
        security_breakdown: features
            .map(|f| SecurityBreakdown::from_features(f, threat_feed_match))
            .unwrap_or_default(),
        explanation: raw.ai_explanation.clone().filter(|e| !e.trim().is_empty()),
        threat_feed_match,
        top_shap: raw.top_shap.clone(),
    }
}

/// Chooses the verdict: the binary prediction when present, then the risk score.
fn verdict_of(raw: &RawAnalysisResult) -> Verdict {
    match (raw.prediction.as_deref(), raw.risk_score) {
        (Some(prediction), _) => Verdict::from_prediction(prediction),
        (None, Some(score)) => Verdict::from_risk_score(score),
        (None, None) => Verdict::Safe,
    }
}

/// Confidence of the verdict, in percent.
///
/// The probability is always the probability of the package being fake, so a non fake
/// prediction is as confident as the probability is low.
pub fn confidence_score(raw: &RawAnalysisResult) -> u8 {
    if raw.prediction.is_none() {
        if let Some(score) = raw.risk_score {
            return percentage(score);
        }
    }

    let probability = match raw.probability {
        Some(p) if p.is_finite() => p.max(0.0).min(1.0),
        _ => return 0,
    };

    if raw.prediction.as_deref().map_or(false, verdict::is_fake) {
        percentage(probability * 100.0)
    } else {
        percentage((1.0 - probability) * 100.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(value: f64) -> u8 {
    if value.is_finite() {
        value.round().max(0.0).min(100.0) as u8
    } else {
        0
    }
}

/// Complete report of one analyzed package, as written by the report generators.
pub struct AnalysisReport {
    file: SelectedFile,
    result: DisplayResult,
    fingerprint: Option<FingerPrint>,
    generated_at: DateTime<Local>,
}

impl AnalysisReport {
    /// Creates a new report for the given file and result.
    pub fn new(file: SelectedFile, result: DisplayResult, fingerprint: Option<FingerPrint>) -> Self {
        Self {
            file,
            result,
            fingerprint,
            generated_at: Local::now(),
        }
    }

    /// Gets the analyzed file.
    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Gets the display result.
    pub fn result(&self) -> &DisplayResult {
        &self.result
    }

    /// Gets the fingerprint of the file, if it could be computed.
    pub fn fingerprint(&self) -> Option<&FingerPrint> {
        self.fingerprint.as_ref()
    }
}

impl Serialize for AnalysisReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser_struct = serializer.serialize_struct("AnalysisReport", 8)?;

        ser_struct.serialize_field("tool_version", env!("CARGO_PKG_VERSION"))?;
        ser_struct.serialize_field("now", &self.generated_at)?;
        ser_struct.serialize_field("now_rfc2822", &self.generated_at.to_rfc2822())?;
        ser_struct.serialize_field("now_rfc3339", &self.generated_at.to_rfc3339())?;

        ser_struct.serialize_field("file_name", self.file.name())?;
        ser_struct.serialize_field("file_size", &self.file.size())?;
        ser_struct.serialize_field("fingerprint", &self.fingerprint)?;
        ser_struct.serialize_field("result", &self.result)?;

        ser_struct.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{confidence_score, normalize, RawAnalysisResult, RiskColor, RiskLevel, Verdict};
    use crate::validation::SelectedFile;

    fn raw(json: &str) -> RawAnalysisResult {
        serde_json::from_str(json).unwrap()
    }

    fn file() -> SelectedFile {
        SelectedFile::new("app.apk", 1024, "app.apk")
    }

    #[test]
    fn it_confidence_is_asymmetric() {
        assert_eq!(
            confidence_score(&raw(r#"{"prediction": "fake", "probability": 0.8}"#)),
            80
        );
        assert_eq!(
            confidence_score(&raw(r#"{"prediction": "legit", "probability": 0.1}"#)),
            90
        );
        assert_eq!(
            confidence_score(&raw(r#"{"prediction": "other", "probability": 0.1}"#)),
            90
        );
        assert_eq!(
            confidence_score(&raw(r#"{"prediction": "fake", "probability": 1.7}"#)),
            100
        );
        assert_eq!(confidence_score(&raw(r#"{"prediction": "fake"}"#)), 0);
        assert_eq!(confidence_score(&raw(r#"{"risk_score": 33.4}"#)), 33);
        assert_eq!(confidence_score(&raw("{}")), 0);
    }

    #[test]
    fn it_normalizes_empty_payload() {
        let display = normalize(&RawAnalysisResult::default(), &file());
        assert_eq!(display.file_name(), "app.apk");
        assert_eq!(display.verdict(), Verdict::Safe);
        assert_eq!(display.risk_color(), RiskColor::Success);
        assert_eq!(display.risk_level(), RiskLevel::Unknown);
        assert_eq!(display.confidence_score(), 0);
        assert!(display.warnings().is_empty());
        assert_eq!(display.recommendations().len(), 3);
        assert_eq!(display.security_breakdown().overall(), 0);
        assert_eq!(display.explanation(), None);
        assert!(!display.threat_feed_match());
    }

    #[test]
    fn it_backend_risk_color_wins() {
        let display = normalize(
            &raw(r#"{"prediction": "legit", "probability": 0.3, "risk": "Yellow"}"#),
            &file(),
        );
        assert_eq!(display.verdict(), Verdict::Safe);
        assert_eq!(display.risk_color(), RiskColor::Warning);
        assert_eq!(display.risk_level(), RiskLevel::Medium);

        let display = normalize(
            &raw(r#"{"prediction": "fake", "probability": 0.6}"#),
            &file(),
        );
        assert_eq!(display.risk_color(), RiskColor::Danger);
        assert_eq!(display.risk_level(), RiskLevel::Unknown);
    }

    #[test]
    fn it_uses_risk_score_without_prediction() {
        let display = normalize(&raw(r#"{"risk_score": 27}"#), &file());
        assert_eq!(display.verdict(), Verdict::Suspicious);
        assert_eq!(display.risk_color(), RiskColor::Warning);
        assert_eq!(display.risk_level(), RiskLevel::Medium);
        assert_eq!(display.confidence_score(), 27);
        assert!(display.recommendations()[0].starts_with("Proceed with caution"));
    }

    #[test]
    fn it_passes_through_explanations() {
        let display = normalize(
            &raw(
                r#"{"prediction": "fake", "probability": 0.9, "ai_explanation": "Banking trojan.",
                    "top_shap": [{"feature": "cert_present", "value": -0.2}],
                    "threat_feed_match": true, "file_name": "other.apk"}"#,
            ),
            &file(),
        );
        assert_eq!(display.explanation(), Some("Banking trojan."));
        assert!(display.top_shap().is_some());
        assert!(display.threat_feed_match());
        assert_eq!(display.file_name(), "other.apk");
        assert_eq!(display.warnings().len(), 2);
    }
}
