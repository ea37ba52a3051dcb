use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub mod annotation;
pub mod config;
pub mod error;
pub mod grouping;
pub mod helpers;
pub mod pass_rate;
pub mod render;
pub mod rollup;
pub mod score;
pub mod snapshot;
pub mod summary;
pub mod tag_index;
pub mod transition;
pub mod types;

pub use annotation::{AnnotationOutcome, apply_annotation};
pub use error::TrendError;
pub use grouping::group_by_tag;
pub use pass_rate::group_pass_rate_by_tag;
pub use rollup::{IssueRollup, TestJudgeDetail, rollup_by_issue};
pub use score::{Verdict, classify, resolve_score};
pub use summary::{RunScoreSummary, pass_fail_totals, run_labels, summarize_reports};
pub use tag_index::IssueTagIndex;
pub use transition::{
    ScoreTransition, Transition, compare_issue_tags, compare_scores, filter_reports_by_transition,
};
pub use types::{
    Issue, JudgeEvaluation, ResultByIssueTag, ResultGroup, SelectedReport, TestResult, TestRun,
};

use crate::config::load_config;
use crate::render::{SummaryRow, write_rows};
use crate::snapshot::load_snapshot;
use crate::tag_index::filter_results_by_tags;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[clap(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Jsonl,
    #[default]
    Pretty,
}

/// Which aggregation to print.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Passed/Failed tests per issue tag of a single run.
    TagScores,
    /// Pass percentage per run and issue tag.
    PassRate,
    /// Same/Worse/Better tests per issue tag between two runs.
    CompareTags,
    /// Same/Worse/Better tests between two runs, or the pass/fail totals of one run.
    CompareScores,
    /// Per-issue rollup of a single run.
    Issues,
    /// Score distribution of every selected run.
    Summary,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the report config. Defaults to `./config/score-trends.toml` when it exists.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// JSON snapshot of the issues and the runs to report on.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[arg(long, default_value = "tag-scores")]
    pub view: View,

    /// Run ids to select. For comparisons the first run is the target and the second the base.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub runs: Vec<String>,

    /// Only report tests whose issue carries one of these tags (`No tag` for untagged issues).
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub tags: Vec<String>,

    /// Only report tests whose transition between the two selected runs is one of these.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub transitions: Vec<Transition>,

    #[arg(short, long, default_value = "pretty")]
    pub format: OutputFormat,
}

fn single_report(reports: &[SelectedReport], view: View) -> Result<&[TestResult]> {
    let [selected] = reports else {
        bail!(
            "The {view:?} view needs exactly 1 selected run, got {}",
            reports.len()
        );
    };
    Ok(selected.results.as_deref().unwrap_or_default())
}

/// Loads the snapshot, narrows it down and writes the requested view to `writer`.
#[instrument(skip_all, fields(view = ?args.view, format = ?args.format))]
pub fn run_report(args: Args, writer: &mut impl Write) -> Result<()> {
    let config = load_config(args.config_file.as_deref())?;
    let snapshot_path = args
        .snapshot
        .or(config.snapshot)
        .ok_or_else(|| anyhow!("No snapshot given; pass --snapshot or set it in the config"))?;
    let runs = if args.runs.is_empty() {
        config.runs
    } else {
        args.runs
    };
    let tags = if args.tags.is_empty() {
        config.tags
    } else {
        args.tags
    };

    let snapshot = load_snapshot(&snapshot_path)?;
    let issues = snapshot.issues.as_slice();
    let mut reports = snapshot.select_reports(&runs)?;

    if !tags.is_empty() {
        let index = IssueTagIndex::new(issues);
        for selected in &mut reports {
            if let Some(results) = selected.results.as_deref() {
                selected.results = Some(filter_results_by_tags(&index, results, &tags));
            }
        }
    }
    if !args.transitions.is_empty() {
        if reports.len() == 2 {
            reports = filter_reports_by_transition(&reports, &args.transitions)?;
        } else {
            debug!(
                reports = reports.len(),
                "Transition filter needs two runs; skipping it"
            );
        }
    }
    info!(reports = reports.len(), "Selected reports");

    match args.view {
        View::TagScores => {
            let results = single_report(&reports, args.view)?;
            write_rows(&group_by_tag(issues, results), args.format, writer)
        }
        View::PassRate => write_rows(
            &group_pass_rate_by_tag(issues, &reports),
            args.format,
            writer,
        ),
        View::CompareTags => write_rows(
            &compare_issue_tags(issues, &reports)?,
            args.format,
            writer,
        ),
        View::CompareScores => match reports.as_slice() {
            [selected] => {
                let results = selected.results.as_deref().unwrap_or_default();
                write_rows(&[pass_fail_totals(results)], args.format, writer)
            }
            _ => write_rows(&compare_scores(&reports)?, args.format, writer),
        },
        View::Issues => {
            let results = single_report(&reports, args.view)?;
            write_rows(&rollup_by_issue(issues, results), args.format, writer)
        }
        View::Summary => {
            let summaries = summarize_reports(&reports);
            let rows: Vec<SummaryRow> = run_labels(&reports)
                .into_iter()
                .zip(&reports)
                .filter_map(|(label, selected)| {
                    let summary = summaries.get(&selected.report.run_id)?.clone();
                    Some(SummaryRow { label, summary })
                })
                .collect();
            write_rows(&rows, args.format, writer)
        }
    }
}
