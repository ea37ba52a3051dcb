//! Resolving a test's judge ensemble to one representative score, and turning that
//! score into a binary verdict.

use std::cmp::Ordering;

use crate::types::{JudgeEvaluation, TestResult};

/// A score must be strictly greater than this to pass. Exactly `0.5` fails.
pub const PASS_THRESHOLD: f64 = 0.5;

/// Judge responses whose justification starts with this could not be parsed by the runner.
pub const PARSING_ERROR_PREFIX: &str = "Parsing error in the judge response string";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }

    /// The `0 | 1` encoding used by the grids.
    pub fn as_binary(self) -> u8 {
        match self {
            Verdict::Pass => 1,
            Verdict::Fail => 0,
        }
    }
}

/// Returns the last human evaluation in `judge_results`, if any.
pub fn latest_human_evaluation(judge_results: &[JudgeEvaluation]) -> Option<&JudgeEvaluation> {
    judge_results.iter().rev().find(|judge| judge.is_human())
}

/// Resolves the representative score of a judge ensemble.
///
/// A human evaluation, when present, is the score (the last one wins, so that
/// appending a new annotation overrides an earlier one). Otherwise the ensemble
/// mean is used. An empty ensemble has no score. Non-finite scores are not
/// rejected; a `NaN` propagates to the caller.
pub fn resolve_score(judge_results: &[JudgeEvaluation]) -> Option<f64> {
    if judge_results.is_empty() {
        return None;
    }
    if let Some(human) = latest_human_evaluation(judge_results) {
        return Some(human.test_score);
    }
    let sum: f64 = judge_results.iter().map(|judge| judge.test_score).sum();
    Some(sum / judge_results.len() as f64)
}

/// Representative score of a single result, `None` when it has no usable judge entries.
pub fn result_score(result: &TestResult) -> Option<f64> {
    result.judge_results.as_deref().and_then(resolve_score)
}

/// `true` iff `score` is strictly above [`PASS_THRESHOLD`]. `NaN` never passes.
pub fn passes(score: f64) -> bool {
    score > PASS_THRESHOLD
}

/// Classifies a result as pass or fail.
///
/// Returns `None` when the result was never judged (`judge_results` absent). A
/// present but empty judge list resolves to no score, which counts as a failure.
pub fn classify(result: &TestResult) -> Option<Verdict> {
    let judge_results = result.judge_results.as_deref()?;
    let score = resolve_score(judge_results).unwrap_or(0.0);
    Some(if passes(score) {
        Verdict::Pass
    } else {
        Verdict::Fail
    })
}

/// Pass/fail for aggregation purposes, where "no verdict" is bucketed with failures.
pub fn is_passing(result: &TestResult) -> bool {
    classify(result).is_some_and(Verdict::is_pass)
}

pub fn has_human_evaluation(result: &TestResult) -> bool {
    result
        .judge_results
        .as_deref()
        .is_some_and(|judges| latest_human_evaluation(judges).is_some())
}

/// `true` if the judge's justification is empty or reports a parsing failure.
pub fn is_unparseable_justification(justification: &str) -> bool {
    justification.is_empty() || justification.starts_with(PARSING_ERROR_PREFIX)
}

pub fn has_sanity_issue(result: &TestResult) -> bool {
    result.judge_results.as_deref().is_some_and(|judges| {
        judges
            .iter()
            .any(|judge| is_unparseable_justification(&judge.test_justification))
    })
}

/// Sort comparator putting results with unparseable judge responses first.
pub fn sanity_issues_first(a: &TestResult, b: &TestResult) -> Ordering {
    has_sanity_issue(b).cmp(&has_sanity_issue(a))
}
