//! Per-run score summaries for the run overview and the single-report score chart.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::score::{has_human_evaluation, is_passing, passes, result_score};
use crate::types::{SelectedReport, TestResult};

/// How the resolved scores of one run are distributed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunScoreSummary {
    pub model_id: String,
    pub run_id: String,
    pub passed: usize,
    pub failed: usize,
    /// Results without a resolvable score, including `NaN` scores.
    pub none: usize,
    pub human_evaluated: usize,
}

impl RunScoreSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.none
    }

    fn record(&mut self, result: &TestResult) {
        match result_score(result) {
            Some(score) if score.is_nan() => self.none += 1,
            Some(score) if passes(score) => self.passed += 1,
            Some(_) => self.failed += 1,
            None => self.none += 1,
        }
        if has_human_evaluation(result) {
            self.human_evaluated += 1;
        }
    }
}

impl fmt::Display for RunScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} (human: {})",
            self.passed, self.failed, self.none, self.human_evaluated
        )
    }
}

/// Summarizes every selected run, keyed by `run_id` in selection order.
///
/// Unlike the pass rate view, a run whose results are not loaded is still listed,
/// with all counts at zero.
#[instrument(skip_all, fields(reports = reports.len()))]
pub fn summarize_reports(reports: &[SelectedReport]) -> IndexMap<String, RunScoreSummary> {
    let mut summaries = IndexMap::new();
    for selected in reports {
        let mut summary = RunScoreSummary {
            model_id: selected.report.model_id.clone(),
            run_id: selected.report.run_id.clone(),
            ..Default::default()
        };
        for result in selected.results.iter().flatten() {
            summary.record(result);
        }
        summaries.insert(selected.report.run_id.clone(), summary);
    }
    debug!(runs = summaries.len(), "Summarized run scores");
    summaries
}

/// Display label of each selected run, in selection order.
///
/// The model id alone identifies a run unless another selected run used the same
/// model, in which case the run id is appended.
pub fn run_labels(reports: &[SelectedReport]) -> Vec<String> {
    let mut runs_per_model: HashMap<&str, usize> = HashMap::new();
    for selected in reports {
        *runs_per_model
            .entry(selected.report.model_id.as_str())
            .or_default() += 1;
    }
    reports
        .iter()
        .map(|selected| {
            let shared = runs_per_model
                .get(selected.report.model_id.as_str())
                .is_some_and(|&runs| runs > 1);
            if shared {
                selected.report.group_label()
            } else {
                selected.report.model_id.clone()
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PassFailTotals {
    pub passed: usize,
    pub failed: usize,
}

/// Passed/Failed totals of a single run. Unjudged results count as failed.
pub fn pass_fail_totals(results: &[TestResult]) -> PassFailTotals {
    let passed = results.iter().filter(|result| is_passing(result)).count();
    PassFailTotals {
        passed,
        failed: results.len() - passed,
    }
}
