//! Security breakdown, warnings and recommendations derived from the feature vector.
//!
//! All the thresholds live here so that warnings and recommendations stay gated on the same
//! conditions.

use super::{raw::FeatureVector, verdict::Verdict};
use crate::criticality::Criticality;
use serde::Serialize;

/// Impersonation score above which a warning is raised.
const IMPERSONATION_THRESHOLD: f64 = 70.0;
/// Dangerous permission count above which a warning is raised.
const DANGEROUS_PERMISSIONS_THRESHOLD: u32 = 5;
/// Lowest value a breakdown score can take when it is known.
const SCORE_FLOOR: i64 = 10;
const SCORE_CEILING: i64 = 100;

/// Heuristic sub-scores, 0 to 100, higher is better. All zero when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SecurityBreakdown {
    /// Lowered by suspicious API calls, a missing certificate and threat feed matches.
    pub code_integrity: u8,
    /// Lowered by the number of dangerous permissions.
    pub permission_analysis: u8,
    /// Lowered by suspicious domains and cleartext traffic.
    pub network_behavior: u8,
    /// Based on the certificate, raised when the package uses cryptography.
    pub data_encryption: u8,
}

impl SecurityBreakdown {
    /// Derives the sub-scores from the extracted features.
    pub fn from_features(features: &FeatureVector, threat_feed_match: bool) -> Self {
        let suspicious = i64::from(features.suspicious_api_count());
        let mut code_integrity = 100 - (suspicious * 5).min(40);
        if !features.has_certificate() {
            code_integrity -= 40;
        }
        if threat_feed_match {
            code_integrity -= 20;
        }

        let permission_analysis = 100
            - 2 * i64::from(features.permission_count())
            - 8 * i64::from(features.dangerous_permission_count());

        let mut network_behavior = 100 - 15 * i64::from(features.suspicious_domain_count());
        if features.uses_cleartext_traffic() {
            network_behavior -= 20;
        }

        let mut data_encryption = if features.has_certificate() { 85 } else { 45 };
        if features.uses_crypto() {
            data_encryption += 10;
        }

        Self {
            code_integrity: bounded(code_integrity),
            permission_analysis: bounded(permission_analysis),
            network_behavior: bounded(network_behavior),
            data_encryption: bounded(data_encryption),
        }
    }

    /// Mean of the four sub-scores.
    pub fn overall(&self) -> u8 {
        let sum = u16::from(self.code_integrity)
            + u16::from(self.permission_analysis)
            + u16::from(self.network_behavior)
            + u16::from(self.data_encryption);
        u8::try_from(sum / 4).unwrap_or(u8::MAX)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bounded(score: i64) -> u8 {
    score.max(SCORE_FLOOR).min(SCORE_CEILING) as u8
}

/// Structured warning shown next to the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    #[serde(rename = "type")]
    kind: Criticality,
    icon: &'static str,
    title: &'static str,
    message: String,
}

impl Warning {
    fn new<M: Into<String>>(
        kind: Criticality,
        icon: &'static str,
        title: &'static str,
        message: M,
    ) -> Self {
        Self {
            kind,
            icon,
            title,
            message: message.into(),
        }
    }

    /// Gets the criticality of the warning.
    pub fn kind(&self) -> Criticality {
        self.kind
    }

    /// Gets the icon name.
    pub fn icon(&self) -> &str {
        self.icon
    }

    /// Gets the title.
    pub fn title(&self) -> &str {
        self.title
    }

    /// Gets the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builds the warning list, most severe first.
pub fn warnings(
    verdict: Verdict,
    confidence: u8,
    features: Option<&FeatureVector>,
    threat_feed_match: bool,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if verdict == Verdict::Dangerous {
        warnings.push(Warning::new(
            Criticality::Critical,
            "shield-alert",
            "Malicious application detected",
            format!(
                "This APK was classified as malicious with {}% confidence. Do not install it.",
                confidence
            ),
        ));
    }

    if threat_feed_match {
        warnings.push(Warning::new(
            Criticality::Critical,
            "database",
            "Known threat match",
            "This file matches an entry of a threat intelligence feed.",
        ));
    }

    let features = match features {
        Some(f) => f,
        None => return warnings,
    };

    let impersonation = features.impersonation_score();
    if impersonation > IMPERSONATION_THRESHOLD {
        warnings.push(Warning::new(
            Criticality::High,
            "user-x",
            "Possible impersonation",
            format!(
                "An impersonation score of {:.0} suggests this app mimics a legitimate \
                 application.",
                impersonation
            ),
        ));
    }

    if features.is_banking_related() {
        warnings.push(Warning::new(
            Criticality::High,
            "landmark",
            "Banking-related application",
            "Banking apps are a frequent impersonation target. Make sure this one is published \
             by your bank.",
        ));
    }

    let suspicious = features.suspicious_api_count();
    if suspicious > 0 {
        warnings.push(Warning::new(
            Criticality::High,
            "code",
            "Suspicious API usage",
            format!("{} suspicious API calls were detected in the code.", suspicious),
        ));
    }

    let domains = features.suspicious_domain_count();
    if domains > 0 {
        warnings.push(Warning::new(
            Criticality::Medium,
            "globe",
            "Suspicious network endpoints",
            format!("The app contacts {} domains flagged as suspicious.", domains),
        ));
    }

    let dangerous_permissions = features.dangerous_permission_count();
    if dangerous_permissions > DANGEROUS_PERMISSIONS_THRESHOLD {
        warnings.push(Warning::new(
            Criticality::Medium,
            "key",
            "Excessive dangerous permissions",
            format!(
                "The app requests {} dangerous permissions.",
                dangerous_permissions
            ),
        ));
    }

    warnings
}

/// Builds the ordered recommendation list.
pub fn recommendations(verdict: Verdict, features: Option<&FeatureVector>) -> Vec<String> {
    let mut recommendations = vec![match verdict {
        Verdict::Dangerous => {
            "Do not install this application: it shows strong signs of being malicious."
        }
        Verdict::Suspicious => {
            "Proceed with caution: some characteristics of this application are suspicious."
        }
        Verdict::Safe => "This application appears to be safe to install.",
    }
    .to_owned()];

    if let Some(features) = features {
        if features.impersonation_score() > IMPERSONATION_THRESHOLD {
            recommendations.push(
                "Verify the developer name and package identifier against the official \
                 application."
                    .to_owned(),
            );
        }
        if features.is_banking_related() {
            recommendations.push(
                "Only install banking applications from your bank's official website or the \
                 Google Play Store."
                    .to_owned(),
            );
        }
        if features.suspicious_api_count() > 0 {
            recommendations
                .push("Review the permissions the app requests before granting them.".to_owned());
        }
        if features.suspicious_domain_count() > 0 {
            recommendations.push(
                "Avoid entering credentials or personal data in this application.".to_owned(),
            );
        }
    }

    recommendations.push("Keep your device and its security patches up to date.".to_owned());
    recommendations.push(
        "Only download applications from trusted sources such as the Google Play Store."
            .to_owned(),
    );
    recommendations
}
