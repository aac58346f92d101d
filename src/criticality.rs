//! Warning criticality.

use crate::error::Kind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Criticality of a warning shown next to a verdict.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub enum Criticality {
    /// Worth a look, not conclusive on its own.
    Medium,
    /// Strong indicator of a harmful application.
    High,
    /// The application is considered malicious.
    Critical,
}

impl fmt::Display for Criticality {
    #[allow(clippy::use_debug)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

impl Serialize for Criticality {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl<'de> Deserialize<'de> for Criticality {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(de)?;
        Self::from_str(&value)
            .map_err(|_| serde::de::Error::custom(format!("unexpected criticality: {}", value)))
    }
}

impl FromStr for Criticality {
    type Err = Kind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Criticality::Critical),
            "high" => Ok(Criticality::High),
            "medium" => Ok(Criticality::Medium),
            _ => Err(Kind::Parse),
        }
    }
}
