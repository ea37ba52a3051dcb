//! Loading an exported dashboard snapshot: the issue catalogue plus the runs
//! that can be selected for a report.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::TrendError;
use crate::types::{Issue, SelectedReport};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub reports: Vec<SelectedReport>,
}

impl Snapshot {
    /// Returns the reports named by `run_ids`, in that order.
    ///
    /// An empty selection returns every report in snapshot order.
    pub fn select_reports<S: AsRef<str>>(
        &self,
        run_ids: &[S],
    ) -> Result<Vec<SelectedReport>, TrendError> {
        if run_ids.is_empty() {
            return Ok(self.reports.clone());
        }
        run_ids
            .iter()
            .map(|run_id| {
                let run_id = run_id.as_ref();
                self.reports
                    .iter()
                    .find(|selected| selected.report.run_id == run_id)
                    .cloned()
                    .ok_or_else(|| TrendError::UnknownRun {
                        run_id: run_id.to_string(),
                    })
            })
            .collect()
    }
}

#[instrument]
pub fn load_snapshot(path: &Path) -> Result<Snapshot, TrendError> {
    let contents = std::fs::read_to_string(path).map_err(|source| TrendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: Snapshot =
        serde_json::from_str(&contents).map_err(|source| TrendError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(
        issues = snapshot.issues.len(),
        reports = snapshot.reports.len(),
        "Loaded snapshot"
    );
    Ok(snapshot)
}
