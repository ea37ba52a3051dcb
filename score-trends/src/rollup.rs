//! Per-issue rollup of one run, for the results-by-issue table and its expandable rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::score::{passes, result_score};
use crate::types::{Issue, TestResult};

/// Judge detail of one test, as parallel arrays in judge order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TestJudgeDetail {
    pub id: String,
    pub justification: Vec<String>,
    pub score: Vec<f64>,
    pub judge_model_id: Vec<String>,
}

impl TestJudgeDetail {
    fn from_result(result: &TestResult) -> Self {
        let judges = result.judge_results.as_deref().unwrap_or_default();
        Self {
            id: result.test_id.clone(),
            justification: judges
                .iter()
                .map(|judge| judge.test_justification.clone())
                .collect(),
            score: judges.iter().map(|judge| judge.test_score).collect(),
            judge_model_id: judges.iter().map(|judge| judge.model_id.clone()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct IssueRollup {
    pub issue_id: String,
    pub issue_title: String,
    pub passed_test_total: usize,
    pub test_total: usize,
    pub tests: Vec<TestJudgeDetail>,
}

impl IssueRollup {
    pub fn failed_test_total(&self) -> usize {
        self.test_total.saturating_sub(self.passed_test_total)
    }

    /// Share of failed tests in percent, `0.0` for an issue without tests.
    pub fn failed_percentage(&self) -> f64 {
        if self.test_total == 0 {
            return 0.0;
        }
        100.0 * self.failed_test_total() as f64 / self.test_total as f64
    }
}

/// Rolls one run's results up per issue.
///
/// Every issue listing a result's test id gets that result, in result order. A
/// test passes when its resolved score is above the threshold; a test without a
/// resolvable score counts toward `test_total` but never toward
/// `passed_test_total`. Issues that matched no result are left out.
#[instrument(skip_all, fields(issues = issues.len(), results = results.len()))]
pub fn rollup_by_issue(issues: &[Issue], results: &[TestResult]) -> Vec<IssueRollup> {
    let mut issues_by_test: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, issue) in issues.iter().enumerate() {
        for test_id in &issue.test_ids {
            let positions = issues_by_test.entry(test_id.as_str()).or_default();
            // An issue listing the same test twice still only sees each result once.
            if positions.last() != Some(&position) {
                positions.push(position);
            }
        }
    }

    let mut rollups: Vec<IssueRollup> = issues
        .iter()
        .map(|issue| IssueRollup {
            issue_id: issue.id.clone(),
            issue_title: issue.title.clone(),
            passed_test_total: 0,
            test_total: 0,
            tests: Vec::new(),
        })
        .collect();

    for result in results {
        let Some(positions) = issues_by_test.get(result.test_id.as_str()) else {
            continue;
        };
        let passed = result_score(result).is_some_and(passes);
        for &position in positions {
            let rollup = &mut rollups[position];
            rollup.tests.push(TestJudgeDetail::from_result(result));
            rollup.test_total += 1;
            if passed {
                rollup.passed_test_total += 1;
            }
        }
    }

    rollups.retain(|rollup| !rollup.tests.is_empty());
    debug!(issues_with_results = rollups.len(), "Rolled up results by issue");
    rollups
}
