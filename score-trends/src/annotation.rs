use tracing::{debug, instrument, warn};

use crate::types::{EvaluationKind, JudgeEvaluation, TestResult};

/// What [`apply_annotation`] did to the result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationOutcome {
    /// An existing human evaluation was overwritten in place.
    Replaced,
    /// The annotation was appended to the judge list.
    Appended,
    /// No result has the requested test id; nothing changed.
    TestNotFound,
}

impl AnnotationOutcome {
    pub fn changed(self) -> bool {
        self != AnnotationOutcome::TestNotFound
    }
}

/// Records a human annotation on the in-memory result of `test_id`.
///
/// If the result already carries a human evaluation, the last one is overwritten
/// in place and keeps its position; otherwise the annotation is appended. The
/// stored entry is always marked as human. Nothing is recomputed here: callers
/// re-run the aggregations once they are done patching.
#[instrument(skip(results, annotation), fields(results = results.len()))]
pub fn apply_annotation(
    results: &mut [TestResult],
    test_id: &str,
    annotation: JudgeEvaluation,
) -> AnnotationOutcome {
    let Some(result) = results.iter_mut().find(|result| result.test_id == test_id) else {
        warn!("Annotated test is not part of the result set");
        return AnnotationOutcome::TestNotFound;
    };

    let judges = result.judge_results.get_or_insert_with(Vec::new);
    let outcome = match judges.iter_mut().rev().find(|judge| judge.is_human()) {
        Some(existing) => {
            existing.test_score = annotation.test_score;
            existing.test_justification = annotation.test_justification;
            existing.model_id = annotation.model_id;
            AnnotationOutcome::Replaced
        }
        None => {
            judges.push(JudgeEvaluation {
                kind: Some(EvaluationKind::Human),
                ..annotation
            });
            AnnotationOutcome::Appended
        }
    };
    debug!(outcome = ?outcome, "Applied human annotation");
    outcome
}
