//! Session report, the exported summary of one participant's run.

use cardsort_core::Result;
use cardsort_trials::PhaseSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: Uuid,
    pub condition: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Demonstration trials played; 0 when the demo is skipped.
    pub demo_trials: usize,
    pub card_sort: PhaseSummary,
    pub transfer: PhaseSummary,
}

impl SessionReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json_pretty(self, path)?;
        tracing::info!(session = %self.session_id, "Wrote report to {}", path.display());
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json_pretty<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
