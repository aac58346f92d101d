//! Verdict vocabulary.
//!
//! The backend answers with a binary `fake`/`legit` prediction while the demo flow produces a
//! continuous risk score. Both are mapped into the same [`Verdict`] here, and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk score from which a package is considered suspicious.
pub const SUSPICIOUS_THRESHOLD: f64 = 15.0;
/// Risk score from which a package is considered dangerous.
pub const DANGEROUS_THRESHOLD: f64 = 40.0;

/// Final classification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Nothing harmful was found.
    Safe,
    /// Some characteristics are suspicious.
    Suspicious,
    /// The package is considered malicious.
    Dangerous,
}

impl Verdict {
    /// Maps the binary backend prediction: `"fake"` is dangerous, anything else is safe.
    pub fn from_prediction(prediction: &str) -> Self {
        if is_fake(prediction) {
            Verdict::Dangerous
        } else {
            Verdict::Safe
        }
    }

    /// Maps a risk score between 0 and 100 using the three tier thresholds.
    ///
    /// Non finite scores are treated as 0.
    pub fn from_risk_score(score: f64) -> Self {
        let score = if score.is_finite() { score } else { 0.0 };
        if score < SUSPICIOUS_THRESHOLD {
            Verdict::Safe
        } else if score < DANGEROUS_THRESHOLD {
            Verdict::Suspicious
        } else {
            Verdict::Dangerous
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Verdict::Safe => "safe",
            Verdict::Suspicious => "suspicious",
            Verdict::Dangerous => "dangerous",
        })
    }
}

/// Returns whether the backend prediction flags the package as fake.
pub(crate) fn is_fake(prediction: &str) -> bool {
    prediction == "fake"
}

/// Color coding of the risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    /// Red.
    Danger,
    /// Yellow.
    Warning,
    /// Green.
    Success,
}

impl RiskColor {
    /// Maps the backend `risk` field. Unknown values give `None`.
    pub fn from_backend(risk: &str) -> Option<Self> {
        match risk.trim().to_lowercase().as_str() {
            "red" => Some(RiskColor::Danger),
            "yellow" => Some(RiskColor::Warning),
            "green" => Some(RiskColor::Success),
            _ => None,
        }
    }
}

impl From<Verdict> for RiskColor {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Dangerous => RiskColor::Danger,
            Verdict::Suspicious => RiskColor::Warning,
            Verdict::Safe => RiskColor::Success,
        }
    }
}

/// Severity level of the risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Green.
    Low,
    /// Yellow.
    Medium,
    /// Red.
    High,
    /// The backend gave no usable risk.
    Unknown,
}

impl RiskLevel {
    /// Level matching a risk color.
    pub fn from_color(color: RiskColor) -> Self {
        match color {
            RiskColor::Danger => RiskLevel::High,
            RiskColor::Warning => RiskLevel::Medium,
            RiskColor::Success => RiskLevel::Low,
        }
    }

    /// Level matching a risk score, using the verdict thresholds.
    pub fn from_risk_score(score: f64) -> Self {
        match Verdict::from_risk_score(score) {
            Verdict::Safe => RiskLevel::Low,
            Verdict::Suspicious => RiskLevel::Medium,
            Verdict::Dangerous => RiskLevel::High,
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Unknown
    }
}

impl fmt::Display for RiskLevel {
    #[allow(clippy::use_debug)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
