//! Writing aggregation rows as JSON lines or as human-readable text.

use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::OutputFormat;
use crate::rollup::IssueRollup;
use crate::summary::{PassFailTotals, RunScoreSummary};
use crate::transition::ScoreTransition;
use crate::types::ResultByIssueTag;

/// A row that can be printed by [`write_rows`].
pub trait Row: Serialize {
    fn pretty(&self) -> String;
}

/// A run summary together with the label the run is displayed under.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummaryRow {
    pub label: String,
    #[serde(flatten)]
    pub summary: RunScoreSummary,
}

/// Counts print as integers, percentages with two decimals.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

impl Row for ResultByIssueTag {
    fn pretty(&self) -> String {
        format!(
            "{} / {}: {} ({} tests)",
            self.group,
            self.key,
            format_value(self.value),
            self.test_ids.len()
        )
    }
}

impl Row for ScoreTransition {
    fn pretty(&self) -> String {
        format!("{}: {} tests", self.group, self.value)
    }
}

impl Row for IssueRollup {
    fn pretty(&self) -> String {
        format!(
            "{} [{}]: {}/{} passed ({:.1}% failed)",
            self.issue_title,
            self.issue_id,
            self.passed_test_total,
            self.test_total,
            self.failed_percentage()
        )
    }
}

impl Row for SummaryRow {
    fn pretty(&self) -> String {
        format!("{}: {}", self.label, self.summary)
    }
}

impl Row for PassFailTotals {
    fn pretty(&self) -> String {
        format!("Passed: {}, Failed: {}", self.passed, self.failed)
    }
}

pub fn write_rows<R: Row>(
    rows: &[R],
    format: OutputFormat,
    writer: &mut impl Write,
) -> Result<()> {
    for row in rows {
        match format {
            OutputFormat::Jsonl => {
                let json = serde_json::to_string(row)?;
                writeln!(writer, "{json}")?;
            }
            OutputFormat::Pretty => writeln!(writer, "{}", row.pretty())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResultGroup;

    fn render<R: Row>(rows: &[R], format: OutputFormat) -> String {
        let mut out = Vec::new();
        write_rows(rows, format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_tag_rows() {
        let rows = vec![
            ResultByIssueTag {
                group: ResultGroup::Passed,
                key: "math".to_string(),
                test_ids: vec!["t1".to_string(), "t2".to_string()],
                value: 2.0,
            },
            ResultByIssueTag {
                group: ResultGroup::Run("granite (r1)".to_string()),
                key: "math".to_string(),
                test_ids: vec!["t1".to_string()],
                value: 200.0 / 3.0,
            },
        ];
        assert_eq!(
            render(&rows, OutputFormat::Pretty),
            "Passed / math: 2 (2 tests)\ngranite (r1) / math: 66.67 (1 tests)\n"
        );

        let jsonl = render(&rows[..1], OutputFormat::Jsonl);
        let line: serde_json::Value = serde_json::from_str(jsonl.trim_end()).unwrap();
        assert_eq!(
            line,
            serde_json::json!({
                "group": "Passed",
                "key": "math",
                "test_ids": ["t1", "t2"],
                "value": 2.0
            })
        );
    }

    #[test]
    fn test_summary_rows_are_flat() {
        let rows = vec![SummaryRow {
            label: "granite".to_string(),
            summary: RunScoreSummary {
                model_id: "granite".to_string(),
                run_id: "r1".to_string(),
                passed: 3,
                failed: 1,
                none: 0,
                human_evaluated: 1,
            },
        }];
        assert_eq!(
            render(&rows, OutputFormat::Pretty),
            "granite: 3/1/0 (human: 1)\n"
        );
        let line: serde_json::Value =
            serde_json::from_str(render(&rows, OutputFormat::Jsonl).trim_end()).unwrap();
        assert_eq!(line["label"], "granite");
        assert_eq!(line["run_id"], "r1");
        assert_eq!(line["passed"], 3);
    }
}
