//! The fixed list of checks displayed while a package is being analyzed.

use serde::Serialize;

/// Status of a check within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Not started yet.
    Pending,
    /// Currently shown as in progress.
    Running,
    /// Done.
    Completed,
    /// Interrupted by a failed run.
    Failed,
}

/// One of the checks shown during an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisCheck {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    duration_hint: &'static str,
    status: CheckStatus,
    progress: u8,
}

/// Identifier, name, icon and duration hint of every check, in display order.
const CHECKS: [(&str, &str, &str, &str); 7] = [
    ("structure", "File structure analysis", "file", "2-3s"),
    ("manifest", "Manifest inspection", "file-text", "3-5s"),
    ("permissions", "Permission analysis", "key", "3-5s"),
    ("code", "Code analysis", "code", "10-20s"),
    ("certificate", "Certificate verification", "award", "2-4s"),
    ("network", "Network security", "globe", "4-6s"),
    ("malware", "Malware signature detection", "bug", "10-30s"),
];

impl AnalysisCheck {
    /// Builds the full list of checks, all pending.
    pub fn all() -> Vec<Self> {
        CHECKS
            .iter()
            .map(|&(id, name, icon, duration_hint)| Self {
                id,
                name,
                icon,
                duration_hint,
                status: CheckStatus::Pending,
                progress: 0,
            })
            .collect()
    }

    /// Gets the identifier.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Gets the display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Gets the icon name.
    pub fn icon(&self) -> &'static str {
        self.icon
    }

    /// Gets the expected duration, for display.
    pub fn duration_hint(&self) -> &'static str {
        self.duration_hint
    }

    /// Gets the status.
    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Gets the progress, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub(crate) fn reset(&mut self) {
        self.status = CheckStatus::Pending;
        self.progress = 0;
    }

    pub(crate) fn start(&mut self) {
        if self.status == CheckStatus::Pending {
            self.status = CheckStatus::Running;
        }
    }

    /// Advances the progress, completing the check at 100. Returns whether it completed.
    pub(crate) fn advance(&mut self, increment: u8) -> bool {
        self.start();
        if self.status != CheckStatus::Running {
            return false;
        }
        self.progress = self.progress.saturating_add(increment).min(100);
        if self.progress == 100 {
            self.status = CheckStatus::Completed;
            true
        } else {
            false
        }
    }

    pub(crate) fn complete(&mut self) {
        if self.status != CheckStatus::Failed {
            self.status = CheckStatus::Completed;
            self.progress = 100;
        }
    }

    pub(crate) fn fail(&mut self) {
        if self.status == CheckStatus::Running {
            self.status = CheckStatus::Failed;
        }
    }
}
