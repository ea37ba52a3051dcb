//! Plain data types shared by every stage of the score aggregation pipeline.
//! Field names follow the dashboard backend's snake_case wire format.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Synthetic tag for tests whose issue carries no tags, or that have no owning issue.
pub const NO_TAG: &str = "No tag";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Issue {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// `None` and an empty list both mean "untagged".
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub test_ids: Vec<String>,
}

impl Issue {
    /// The tags this issue's tests are credited to, substituting [`NO_TAG`] when untagged.
    pub fn effective_tags(&self) -> Vec<&str> {
        match self.tags.as_deref() {
            Some(tags) if !tags.is_empty() => tags.iter().map(String::as_str).collect(),
            _ => vec![NO_TAG],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    Done,
    Failed,
}

/// Judges configured for a run. Older runs store a single id, newer ones a list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum JudgeModelIds {
    Single(String),
    Ensemble(Vec<String>),
}

impl fmt::Display for JudgeModelIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeModelIds::Single(id) => write!(f, "{id}"),
            JudgeModelIds::Ensemble(ids) => write!(f, "{}", ids.join(", ")),
        }
    }
}

/// Metadata for one execution of a model against a set of tests (a "report").
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestRun {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub run_id: String,
    pub model_id: String,
    #[serde(
        default,
        alias = "judge_model_ids",
        skip_serializing_if = "Option::is_none"
    )]
    pub judge_model_id: Option<JudgeModelIds>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: RunStatus,
}

impl TestRun {
    /// Label used for per-run groups in the multi-run pass rate view.
    pub fn group_label(&self) -> String {
        format!("{} ({})", self.model_id, self.run_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    /// A manually entered score that overrides the judge ensemble.
    Human,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct JudgeEvaluation {
    /// The judge model id, or the annotating user for human evaluations.
    pub model_id: String,
    /// Malformed scores load as `NaN` rather than rejecting the snapshot; they never pass.
    #[serde(default = "missing_score", deserialize_with = "deserialize_lenient_score")]
    pub test_score: f64,
    #[serde(default)]
    pub test_justification: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EvaluationKind>,
}

fn missing_score() -> f64 {
    f64::NAN
}

/// Accepts a number or a numeric string. Anything else becomes `NaN`.
fn deserialize_lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match RawScore::deserialize(deserializer)? {
        RawScore::Number(score) => score,
        RawScore::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
        RawScore::Other(_) => f64::NAN,
    })
}

impl JudgeEvaluation {
    pub fn is_human(&self) -> bool {
        self.kind == Some(EvaluationKind::Human)
    }

    pub fn human(
        annotator: impl Into<String>,
        test_score: f64,
        test_justification: impl Into<String>,
    ) -> Self {
        Self {
            model_id: annotator.into(),
            test_score,
            test_justification: test_justification.into(),
            kind: Some(EvaluationKind::Human),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TestResult {
    pub test_id: String,
    /// `None` means the test has not been judged at all, which is distinct from a failing verdict.
    #[serde(default)]
    pub judge_results: Option<Vec<JudgeEvaluation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<String>,
}

/// A run together with its results. `results` stays `None` until loaded.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SelectedReport {
    pub report: TestRun,
    #[serde(default)]
    pub results: Option<Vec<TestResult>>,
}

/// Row label of an aggregation output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResultGroup {
    Passed,
    Failed,
    Same,
    Worse,
    Better,
    NoOverlap,
    /// A per-run group, labelled `"<model_id> (<run_id>)"`.
    Run(String),
}

impl ResultGroup {
    pub fn as_str(&self) -> &str {
        match self {
            ResultGroup::Passed => "Passed",
            ResultGroup::Failed => "Failed",
            ResultGroup::Same => "Same",
            ResultGroup::Worse => "Worse",
            ResultGroup::Better => "Better",
            ResultGroup::NoOverlap => "No overlap",
            ResultGroup::Run(label) => label,
        }
    }
}

impl fmt::Display for ResultGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResultGroup {
    fn from(label: &str) -> Self {
        match label {
            "Passed" => ResultGroup::Passed,
            "Failed" => ResultGroup::Failed,
            "Same" => ResultGroup::Same,
            "Worse" => ResultGroup::Worse,
            "Better" => ResultGroup::Better,
            "No overlap" => ResultGroup::NoOverlap,
            other => ResultGroup::Run(other.to_string()),
        }
    }
}

impl Serialize for ResultGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResultGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(ResultGroup::from(label.as_str()))
    }
}

/// One chart/grid row: a `(group, key)` bucket with its contributing tests.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ResultByIssueTag {
    pub group: ResultGroup,
    pub key: String,
    pub test_ids: Vec<String>,
    /// A count, or a percentage in the multi-run pass rate view.
    pub value: f64,
}
