//! Match report storage

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of one refereed game, saved as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Engine name as reported by `id name`
    pub engine: String,
    /// Side played by UltraChess ("white"/"black")
    pub msx_side: String,
    pub search_time_ms: u64,
    /// Local start time, RFC 3339
    pub started: String,
    pub duration_secs: f64,
    /// PGN result tag; `*` when the game was aborted
    pub result: String,
    /// How the game ended, if it did
    pub outcome: Option<String>,
    /// Fatal error that aborted the match
    pub error: Option<String>,
    /// Moves in UCI notation
    pub moves: Vec<String>,
}

impl MatchReport {
    pub fn plies(&self) -> usize {
        self.moves.len()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        serde_json::from_str(&contents).context("failed to parse report")
    }

    /// Short text summary
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "=== UltraChess ({}) vs {} ===\n",
            self.msx_side, self.engine
        ));
        report.push_str(&format!(
            "Result: {} after {} plies in {:.1}s\n",
            self.result,
            self.plies(),
            self.duration_secs
        ));
        if let Some(outcome) = &self.outcome {
            report.push_str(&format!("Outcome: {outcome}\n"));
        }
        if let Some(error) = &self.error {
            report.push_str(&format!("Aborted: {error}\n"));
        }
        report
    }
}
