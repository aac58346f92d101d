//! Typed view of the JSON payload returned by the scanning backend.
//!
//! Every field is optional. Feature values are parsed leniently: numbers, booleans and numeric
//! strings are accepted, anything else is treated as absent instead of failing the whole
//! payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw analysis result, as received from the backend. Never modified after reception.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisResult {
    /// Binary prediction, `"fake"` for malicious packages.
    #[serde(default)]
    pub prediction: Option<String>,
    /// Probability of the package being fake, between 0 and 1.
    #[serde(default, deserialize_with = "lenient_number")]
    pub probability: Option<f64>,
    /// Risk color: `"Red"`, `"Yellow"` or `"Green"`.
    #[serde(default)]
    pub risk: Option<String>,
    /// Continuous risk score between 0 and 100, produced by the demo flow.
    #[serde(default, deserialize_with = "lenient_number")]
    pub risk_score: Option<f64>,
    /// Attributes extracted from the package.
    #[serde(default)]
    pub feature_vector: Option<FeatureVector>,
    /// Free form security indicators, passed through.
    #[serde(default)]
    pub security_indicators: Option<Value>,
    /// Free form risk factors, passed through.
    #[serde(default)]
    pub risk_factors: Option<Value>,
    /// Natural language explanation of the verdict.
    #[serde(default)]
    pub ai_explanation: Option<String>,
    /// Per-feature contributions to the model decision, passed through for display.
    #[serde(default)]
    pub top_shap: Option<Value>,
    /// Threat intelligence feed match, see [`RawAnalysisResult::threat_feed_matched`].
    #[serde(default)]
    pub threat_feed_match: Option<Value>,
    /// Server side timings, passed through.
    #[serde(default)]
    pub performance_metrics: Option<Value>,
    /// Name of the analyzed file, present in batch responses.
    #[serde(default, alias = "filename")]
    pub file_name: Option<String>,
}

impl RawAnalysisResult {
    /// Returns whether the backend reported a match in a threat intelligence feed.
    ///
    /// Accepts a plain boolean, a non-empty string or an object with a truthy `matched` or
    /// `match` field.
    pub fn threat_feed_matched(&self) -> bool {
        match self.threat_feed_match {
            Some(Value::Bool(b)) => b,
            Some(Value::String(ref s)) => !s.is_empty() && s != "false",
            Some(Value::Object(ref o)) => o
                .get("matched")
                .or_else(|| o.get("match"))
                .map_or(!o.is_empty(), |v| v.as_bool().unwrap_or(false)),
            _ => false,
        }
    }
}

/// Extracted package attributes used as evidence for the verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// 1 if the package is signed.
    #[serde(default, deserialize_with = "lenient_number")]
    pub cert_present: Option<f64>,
    /// Number of requested permissions.
    #[serde(default, deserialize_with = "lenient_number")]
    pub num_permissions: Option<f64>,
    /// Number of dangerous permissions.
    #[serde(default, deserialize_with = "lenient_number")]
    pub num_dangerous_permissions: Option<f64>,
    /// Number of suspicious API calls.
    #[serde(default, deserialize_with = "lenient_number")]
    pub count_suspicious: Option<f64>,
    /// Likeness to a known application, 0 to 100.
    #[serde(default, deserialize_with = "lenient_number")]
    pub impersonation_score: Option<f64>,
    /// 1 if the label mentions banking.
    #[serde(default, deserialize_with = "lenient_number")]
    pub label_contains_bank: Option<f64>,
    /// 1 if the package name mentions banking.
    #[serde(default, deserialize_with = "lenient_number")]
    pub pkg_contains_bank: Option<f64>,
    /// Number of suspicious domains referenced.
    #[serde(default, deserialize_with = "lenient_number")]
    pub num_suspicious_domains: Option<f64>,
    /// 1 if cleartext traffic is allowed.
    #[serde(default, deserialize_with = "lenient_number")]
    pub uses_cleartext_traffic: Option<f64>,
    /// 1 if cryptography APIs are used.
    #[serde(default, deserialize_with = "lenient_number")]
    pub uses_crypto: Option<f64>,
    /// Any other feature sent by the backend.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FeatureVector {
    /// Whether the package carries a signing certificate.
    pub fn has_certificate(&self) -> bool {
        flag(self.cert_present)
    }

    /// Whether the label or the package name refer to banking.
    pub fn is_banking_related(&self) -> bool {
        flag(self.label_contains_bank) || flag(self.pkg_contains_bank)
    }

    /// Number of suspicious API calls.
    pub fn suspicious_api_count(&self) -> u32 {
        count(self.count_suspicious)
    }

    /// Number of requested permissions.
    pub fn permission_count(&self) -> u32 {
        count(self.num_permissions)
    }

    /// Number of requested dangerous permissions.
    pub fn dangerous_permission_count(&self) -> u32 {
        count(self.num_dangerous_permissions)
    }

    /// Number of contacted domains flagged as suspicious.
    pub fn suspicious_domain_count(&self) -> u32 {
        count(self.num_suspicious_domains)
    }

    /// Impersonation score, 0 when absent.
    pub fn impersonation_score(&self) -> f64 {
        self.impersonation_score.unwrap_or(0.0)
    }

    /// Whether the manifest allows clear text traffic.
    pub fn uses_cleartext_traffic(&self) -> bool {
        flag(self.uses_cleartext_traffic)
    }

    /// Whether cryptographic APIs are used.
    pub fn uses_crypto(&self) -> bool {
        flag(self.uses_crypto)
    }
}

fn flag(value: Option<f64>) -> bool {
    value.map_or(false, |v| v > 0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Deserializes an optional number, accepting booleans and numeric strings.
fn lenient_number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
