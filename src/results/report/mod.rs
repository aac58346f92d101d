//! Report generation module.

mod json;
mod terminal;

use crate::{config::Config, results::AnalysisReport};
use failure::Error;

pub use self::{json::Json, terminal::Terminal};

/// Trait that represents a type that can generate a report.
pub trait Generator {
    /// Generates an actual report.
    fn generate(&mut self, config: &Config, report: &AnalysisReport) -> Result<(), Error>;
}
