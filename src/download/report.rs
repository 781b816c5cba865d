//! Per-wallpaper download outcomes and the run-level tally.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

/// Tri-state result of downloading one wallpaper file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// The file was transferred and verified.
    Succeeded,
    /// The file was already on disk; no request was made.
    Existed,
    /// The download could not be completed.
    Failed,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "succeeded",
            Self::Existed => "existed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Outcome for a single wallpaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Wallpaper id.
    pub id: String,
    /// Remote file path, when known.
    pub remote_path: Option<String>,
    /// Local save path, when one could be computed.
    pub path: Option<PathBuf>,
    pub status: DownloadStatus,
}

/// Outcomes of a download phase, one per distinct wallpaper id.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    outcomes: Vec<DownloadOutcome>,
    seen: HashSet<String>,
}

impl DownloadReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. Later outcomes for an id already recorded are ignored.
    pub fn record(&mut self, outcome: DownloadOutcome) {
        if self.seen.insert(outcome.id.clone()) {
            self.outcomes.push(outcome);
        }
    }

    /// Whether an outcome for `id` has been recorded.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// All outcomes in recording order.
    #[must_use]
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, status: DownloadStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(DownloadStatus::Succeeded)
    }

    #[must_use]
    pub fn existed(&self) -> usize {
        self.count(DownloadStatus::Existed)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(DownloadStatus::Failed)
    }

    /// Outcomes with [`DownloadStatus::Failed`].
    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == DownloadStatus::Failed)
    }

    /// Logs the aggregate counts and every failed id with its remote path.
    pub fn log_summary(&self) {
        info!(
            succeeded = self.succeeded(),
            existed = self.existed(),
            failed = self.failed(),
            "download summary"
        );
        for failure in self.failures() {
            warn!(
                id = %failure.id,
                remote_path = failure.remote_path.as_deref().unwrap_or("-"),
                "download failed"
            );
        }
    }
}
