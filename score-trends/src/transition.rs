//! Test-by-test comparison of two runs.
//!
//! Reports are compared in UI selection order: the report at index 0 ("A") is the
//! *target* and the report at index 1 ("B") is the *base*. A test that passed in
//! the base and failed in the target is `Better`; the reverse is `Worse`. Both
//! directions are fixed by the dashboard and must not be swapped.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::TrendError;
use crate::grouping::group_by_tag_with_index;
use crate::score::is_passing;
use crate::tag_index::IssueTagIndex;
use crate::types::{Issue, ResultByIssueTag, ResultGroup, SelectedReport, TestResult};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[clap(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Same,
    Better,
    Worse,
    NoOverlap,
}

impl Transition {
    pub fn group(self) -> ResultGroup {
        match self {
            Transition::Same => ResultGroup::Same,
            Transition::Better => ResultGroup::Better,
            Transition::Worse => ResultGroup::Worse,
            Transition::NoOverlap => ResultGroup::NoOverlap,
        }
    }
}

/// Pass/fail test ids of one run, restricted to whatever scope is being compared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOutcome<'a> {
    pub passed: IndexSet<&'a str>,
    pub failed: IndexSet<&'a str>,
}

impl<'a> RunOutcome<'a> {
    /// Whole-run outcome. Results without a verdict count as failed.
    pub fn from_results(results: &'a [TestResult]) -> Self {
        let mut outcome = Self::default();
        for result in results {
            if is_passing(result) {
                outcome.passed.insert(result.test_id.as_str());
            } else {
                outcome.failed.insert(result.test_id.as_str());
            }
        }
        outcome
    }

    /// Outcome within a single tag, read from [`group_by_tag`](crate::grouping::group_by_tag) rows.
    pub fn from_tag_rows(rows: &'a [ResultByIssueTag], key: &str) -> Self {
        let mut outcome = Self::default();
        for row in rows.iter().filter(|row| row.key == key) {
            let target = match row.group {
                ResultGroup::Passed => &mut outcome.passed,
                ResultGroup::Failed => &mut outcome.failed,
                _ => continue,
            };
            target.extend(row.test_ids.iter().map(String::as_str));
        }
        outcome
    }

    fn members(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.passed.iter().chain(self.failed.iter()).copied()
    }
}

/// The four-way partition of the tests seen in either run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionSets<'a> {
    pub same: IndexSet<&'a str>,
    pub better: IndexSet<&'a str>,
    pub worse: IndexSet<&'a str>,
    pub no_overlap: IndexSet<&'a str>,
}

impl<'a> TransitionSets<'a> {
    pub fn get(&self, transition: Transition) -> &IndexSet<&'a str> {
        match transition {
            Transition::Same => &self.same,
            Transition::Better => &self.better,
            Transition::Worse => &self.worse,
            Transition::NoOverlap => &self.no_overlap,
        }
    }

    /// Categories in output order. `NoOverlap` is only included when non-empty.
    fn emitted(&self) -> impl Iterator<Item = (Transition, &IndexSet<&'a str>)> {
        [
            (Transition::Same, &self.same),
            (Transition::Worse, &self.worse),
            (Transition::Better, &self.better),
            (Transition::NoOverlap, &self.no_overlap),
        ]
        .into_iter()
        .filter(|(transition, ids)| *transition != Transition::NoOverlap || !ids.is_empty())
    }
}

/// Partitions the tests of `base` and `target` into Same/Better/Worse/No overlap.
///
/// Tests present in only one of the two outcomes end up in `no_overlap`.
pub fn classify_transitions<'a>(
    base: &RunOutcome<'a>,
    target: &RunOutcome<'a>,
) -> TransitionSets<'a> {
    let same: IndexSet<&'a str> = base
        .passed
        .intersection(&target.passed)
        .chain(base.failed.intersection(&target.failed))
        .copied()
        .collect();
    let better: IndexSet<&'a str> = base
        .passed
        .intersection(&target.failed)
        .copied()
        .collect();
    let worse: IndexSet<&'a str> = base
        .failed
        .intersection(&target.passed)
        .copied()
        .collect();
    let no_overlap = base
        .members()
        .chain(target.members())
        .filter(|id| !same.contains(id) && !better.contains(id) && !worse.contains(id))
        .collect();
    TransitionSets {
        same,
        better,
        worse,
        no_overlap,
    }
}

/// One row of the whole-run comparison.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScoreTransition {
    pub group: ResultGroup,
    pub test_ids: Vec<String>,
    pub value: usize,
}

fn owned_ids(ids: &IndexSet<&str>) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Splits a two-report selection into `(target, base)` results.
fn comparison_pair(
    reports: &[SelectedReport],
) -> Result<(&[TestResult], &[TestResult]), TrendError> {
    let [target, base] = reports else {
        return Err(TrendError::ComparisonArity { got: reports.len() });
    };
    for selected in [target, base] {
        if selected.results.is_none() {
            warn!(
                run_id = %selected.report.run_id,
                "Comparing a report whose results are not loaded; treating it as empty"
            );
        }
    }
    debug!(
        target_run_id = %target.report.run_id,
        base_run_id = %base.report.run_id,
        "Resolved comparison direction"
    );
    Ok((
        target.results.as_deref().unwrap_or_default(),
        base.results.as_deref().unwrap_or_default(),
    ))
}

/// Compares two runs tag by tag.
///
/// Each run is grouped with [`group_by_tag`](crate::grouping::group_by_tag)
/// independently; every tag found in either run gets `Same`, `Worse` and `Better`
/// rows (possibly empty) and a `No overlap` row when that set is non-empty.
#[instrument(skip_all, fields(issues = issues.len(), reports = reports.len()))]
pub fn compare_issue_tags(
    issues: &[Issue],
    reports: &[SelectedReport],
) -> Result<Vec<ResultByIssueTag>, TrendError> {
    let (target_results, base_results) = comparison_pair(reports)?;
    let index = IssueTagIndex::new(issues);
    let base_rows = group_by_tag_with_index(&index, base_results);
    let target_rows = group_by_tag_with_index(&index, target_results);

    let categories: IndexSet<&str> = base_rows
        .iter()
        .chain(target_rows.iter())
        .map(|row| row.key.as_str())
        .collect();

    let mut rows = Vec::new();
    for category in categories {
        let base = RunOutcome::from_tag_rows(&base_rows, category);
        let target = RunOutcome::from_tag_rows(&target_rows, category);
        let sets = classify_transitions(&base, &target);
        rows.extend(sets.emitted().map(|(transition, ids)| ResultByIssueTag {
            group: transition.group(),
            key: category.to_string(),
            test_ids: owned_ids(ids),
            value: ids.len() as f64,
        }));
    }
    debug!(rows = rows.len(), "Compared runs by issue tag");
    Ok(rows)
}

/// Compares two runs over their whole test sets, ignoring tags.
#[instrument(skip_all, fields(reports = reports.len()))]
pub fn compare_scores(reports: &[SelectedReport]) -> Result<Vec<ScoreTransition>, TrendError> {
    let (target_results, base_results) = comparison_pair(reports)?;
    let base = RunOutcome::from_results(base_results);
    let target = RunOutcome::from_results(target_results);
    let sets = classify_transitions(&base, &target);
    Ok(sets
        .emitted()
        .map(|(transition, ids)| ScoreTransition {
            group: transition.group(),
            test_ids: owned_ids(ids),
            value: ids.len(),
        })
        .collect())
}

/// Restricts both reports to the tests whose whole-run transition is in `keep`.
///
/// Unloaded result sets come back as empty lists.
#[instrument(skip_all, fields(reports = reports.len(), keep = ?keep))]
pub fn filter_reports_by_transition(
    reports: &[SelectedReport],
    keep: &[Transition],
) -> Result<Vec<SelectedReport>, TrendError> {
    let (target_results, base_results) = comparison_pair(reports)?;
    let base = RunOutcome::from_results(base_results);
    let target = RunOutcome::from_results(target_results);
    let sets = classify_transitions(&base, &target);
    let kept: IndexSet<&str> = keep
        .iter()
        .flat_map(|transition| sets.get(*transition).iter().copied())
        .collect();

    Ok(reports
        .iter()
        .map(|selected| SelectedReport {
            report: selected.report.clone(),
            results: Some(
                selected
                    .results
                    .iter()
                    .flatten()
                    .filter(|result| kept.contains(result.test_id.as_str()))
                    .cloned()
                    .collect(),
            ),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JudgeEvaluation, NO_TAG, TestRun};

    fn scored(test_id: &str, score: f64) -> TestResult {
        TestResult {
            test_id: test_id.to_string(),
            judge_results: Some(vec![JudgeEvaluation {
                model_id: "judge".to_string(),
                test_score: score,
                test_justification: "because".to_string(),
                kind: None,
            }]),
            ..Default::default()
        }
    }

    fn report(run_id: &str, results: Option<Vec<TestResult>>) -> SelectedReport {
        SelectedReport {
            report: TestRun {
                run_id: run_id.to_string(),
                model_id: "granite".to_string(),
                ..Default::default()
            },
            results,
        }
    }

    fn ids<'a>(set: &IndexSet<&'a str>) -> Vec<&'a str> {
        let mut ids: Vec<&str> = set.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Base ("B", index 1) passes t1,t2 and fails t3,t4; target ("A", index 0)
    /// passes t1,t3 and fails t2,t4.
    fn four_test_reports() -> Vec<SelectedReport> {
        vec![
            report(
                "target",
                Some(vec![
                    scored("t1", 1.0),
                    scored("t2", 0.0),
                    scored("t3", 1.0),
                    scored("t4", 0.0),
                ]),
            ),
            report(
                "base",
                Some(vec![
                    scored("t1", 1.0),
                    scored("t2", 1.0),
                    scored("t3", 0.0),
                    scored("t4", 0.0),
                ]),
            ),
        ]
    }

    #[test]
    fn test_classify_transitions_is_complete() {
        let reports = four_test_reports();
        let target_results = reports[0].results.as_deref().unwrap();
        let base_results = reports[1].results.as_deref().unwrap();
        let sets = classify_transitions(
            &RunOutcome::from_results(base_results),
            &RunOutcome::from_results(target_results),
        );
        assert_eq!(ids(&sets.same), vec!["t1", "t4"]);
        assert_eq!(ids(&sets.better), vec!["t2"]);
        assert_eq!(ids(&sets.worse), vec!["t3"]);
        assert!(sets.no_overlap.is_empty());
    }

    #[test]
    fn test_compare_scores_emits_rows_in_dashboard_order() {
        let rows = compare_scores(&four_test_reports()).unwrap();
        let groups: Vec<&ResultGroup> = rows.iter().map(|row| &row.group).collect();
        assert_eq!(
            groups,
            vec![&ResultGroup::Same, &ResultGroup::Worse, &ResultGroup::Better]
        );
        assert_eq!(rows[0].value, 2);
        assert_eq!(rows[1].test_ids, vec!["t3"]);
        assert_eq!(rows[2].test_ids, vec!["t2"]);
    }

    #[test]
    fn test_test_missing_from_target_is_no_overlap() {
        let mut reports = four_test_reports();
        if let Some(base) = reports[1].results.as_mut() {
            base.push(scored("t5", 1.0));
        }
        let rows = compare_scores(&reports).unwrap();
        let no_overlap = rows
            .iter()
            .find(|row| row.group == ResultGroup::NoOverlap)
            .unwrap();
        assert_eq!(no_overlap.test_ids, vec!["t5"]);
        assert_eq!(no_overlap.value, 1);
    }

    #[test]
    fn test_empty_categories_are_still_emitted() {
        let reports = vec![
            report("target", Some(vec![scored("t1", 1.0)])),
            report("base", Some(vec![scored("t1", 1.0)])),
        ];
        let rows = compare_scores(&reports).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].test_ids.is_empty());
        assert!(rows[2].test_ids.is_empty());
    }

    #[test]
    fn test_compare_issue_tags_per_category() {
        let issues = vec![
            Issue {
                id: "i1".to_string(),
                title: "Dates".to_string(),
                tags: Some(vec!["a".to_string(), "b".to_string()]),
                test_ids: vec!["t1".to_string(), "t2".to_string()],
            },
            Issue {
                id: "i2".to_string(),
                title: "Units".to_string(),
                tags: Some(vec!["b".to_string()]),
                test_ids: vec!["t3".to_string()],
            },
        ];
        let reports = vec![
            report(
                "target",
                Some(vec![scored("t1", 0.0), scored("t2", 1.0), scored("t3", 1.0)]),
            ),
            report(
                "base",
                Some(vec![
                    scored("t1", 1.0),
                    scored("t2", 1.0),
                    scored("orphan", 0.0),
                ]),
            ),
        ];
        let rows = compare_issue_tags(&issues, &reports).unwrap();
        let find = |group: ResultGroup, key: &str| {
            rows.iter()
                .find(|row| row.group == group && row.key == key)
                .map(|row| row.test_ids.clone())
        };

        assert_eq!(find(ResultGroup::Same, "a"), Some(vec!["t2".to_string()]));
        assert_eq!(find(ResultGroup::Better, "a"), Some(vec!["t1".to_string()]));
        assert_eq!(find(ResultGroup::Worse, "a"), Some(vec![]));
        assert_eq!(find(ResultGroup::NoOverlap, "a"), None);

        assert_eq!(find(ResultGroup::NoOverlap, "b"), Some(vec!["t3".to_string()]));
        assert_eq!(
            find(ResultGroup::NoOverlap, NO_TAG),
            Some(vec!["orphan".to_string()])
        );

        // Categories follow the base run's first contributions, then the target's.
        let keys: IndexSet<&str> = rows.iter().map(|row| row.key.as_str()).collect();
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["a", "b", NO_TAG]);
    }

    #[test]
    fn test_comparison_requires_two_reports() {
        let one = vec![report("only", Some(vec![]))];
        assert!(matches!(
            compare_scores(&one),
            Err(TrendError::ComparisonArity { got: 1 })
        ));
        assert!(matches!(
            compare_issue_tags(&[], &[]),
            Err(TrendError::ComparisonArity { got: 0 })
        ));
    }

    #[test]
    fn test_unloaded_report_compares_as_empty() {
        let reports = vec![
            report("target", None),
            report("base", Some(vec![scored("t1", 1.0)])),
        ];
        let rows = compare_scores(&reports).unwrap();
        let no_overlap = rows
            .iter()
            .find(|row| row.group == ResultGroup::NoOverlap)
            .unwrap();
        assert_eq!(no_overlap.test_ids, vec!["t1"]);
    }

    #[test]
    fn test_filter_reports_by_transition() {
        let mut reports = four_test_reports();
        if let Some(base) = reports[1].results.as_mut() {
            base.push(scored("t5", 1.0));
        }
        let filtered =
            filter_reports_by_transition(&reports, &[Transition::Better, Transition::NoOverlap])
                .unwrap();
        let kept = |i: usize| -> Vec<String> {
            filtered[i]
                .results
                .iter()
                .flatten()
                .map(|result| result.test_id.clone())
                .collect()
        };
        assert_eq!(kept(0), vec!["t2"]);
        assert_eq!(kept(1), vec!["t2", "t5"]);
    }
}
