use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::grouping::for_each_tag_contribution;
use crate::tag_index::IssueTagIndex;
use crate::types::{Issue, ResultByIssueTag, ResultGroup, SelectedReport};

#[derive(Debug, Default)]
struct PassRateBucket {
    passed_test_ids: Vec<String>,
    total: usize,
}

impl PassRateBucket {
    fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.passed_test_ids.len() as f64 / self.total as f64
    }
}

/// Computes the pass percentage of every `(run, tag)` pair across the selected reports.
///
/// Each row's group is the run label `"<model_id> (<run_id>)"` and its value is
/// `100 * passed / total`. Failures only grow the denominator, so a tag whose tests
/// all failed still yields a `0.0` row. Reports whose results are not loaded yet
/// produce no rows at all.
#[instrument(skip_all, fields(issues = issues.len(), reports = reports.len()))]
pub fn group_pass_rate_by_tag(
    issues: &[Issue],
    reports: &[SelectedReport],
) -> Vec<ResultByIssueTag> {
    let index = IssueTagIndex::new(issues);
    let mut buckets: IndexMap<(ResultGroup, String), PassRateBucket> = IndexMap::new();

    for selected in reports {
        let Some(results) = selected.results.as_deref() else {
            warn!(
                run_id = %selected.report.run_id,
                "Skipping report whose results are not loaded"
            );
            continue;
        };
        let group = ResultGroup::Run(selected.report.group_label());
        for_each_tag_contribution(&index, results, |passed, tag, result| {
            let bucket = buckets
                .entry((group.clone(), tag.to_string()))
                .or_default();
            bucket.total += 1;
            if passed {
                bucket.passed_test_ids.push(result.test_id.clone());
            }
        });
    }

    debug!(buckets = buckets.len(), "Computed pass rates by issue tag");
    buckets
        .into_iter()
        .map(|((group, key), bucket)| ResultByIssueTag {
            value: bucket.percentage(),
            group,
            key,
            test_ids: bucket.passed_test_ids,
        })
        .collect()
}
