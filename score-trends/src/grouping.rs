//! Pass/fail grouping of a single run's results by issue tag.

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::score::is_passing;
use crate::tag_index::IssueTagIndex;
use crate::types::{Issue, ResultByIssueTag, ResultGroup, TestResult};

/// Calls `contribute(passed, tag, result)` once per tag each result is credited to.
///
/// A test whose issue has several tags contributes to every one of them. Results
/// without a verdict are reported as failures.
pub(crate) fn for_each_tag_contribution<'r>(
    index: &IssueTagIndex<'_>,
    results: &'r [TestResult],
    mut contribute: impl FnMut(bool, &str, &'r TestResult),
) {
    for result in results {
        let passed = is_passing(result);
        for tag in index.tags_for(&result.test_id) {
            contribute(passed, tag, result);
        }
    }
}

/// Buckets keyed by `(group, tag)` in first-contribution order.
#[derive(Debug, Default)]
pub(crate) struct TagBuckets {
    buckets: IndexMap<(ResultGroup, String), Vec<String>>,
}

impl TagBuckets {
    pub(crate) fn push(&mut self, group: ResultGroup, key: &str, test_id: &str) {
        self.buckets
            .entry((group, key.to_string()))
            .or_default()
            .push(test_id.to_string());
    }

    pub(crate) fn into_rows(self) -> Vec<ResultByIssueTag> {
        self.buckets
            .into_iter()
            .map(|((group, key), test_ids)| ResultByIssueTag {
                value: test_ids.len() as f64,
                group,
                key,
                test_ids,
            })
            .collect()
    }
}

/// Groups one run's results into `Passed`/`Failed` buckets per issue tag.
///
/// Buckets are created on first contribution, so a tag with no tests in this run
/// does not appear in the output at all.
#[instrument(skip_all, fields(issues = issues.len(), results = results.len()))]
pub fn group_by_tag(issues: &[Issue], results: &[TestResult]) -> Vec<ResultByIssueTag> {
    let index = IssueTagIndex::new(issues);
    group_by_tag_with_index(&index, results)
}

/// Same as [`group_by_tag`], reusing an already built index.
pub fn group_by_tag_with_index(
    index: &IssueTagIndex<'_>,
    results: &[TestResult],
) -> Vec<ResultByIssueTag> {
    let mut buckets = TagBuckets::default();
    for_each_tag_contribution(index, results, |passed, tag, result| {
        let group = if passed {
            ResultGroup::Passed
        } else {
            ResultGroup::Failed
        };
        buckets.push(group, tag, &result.test_id);
    });
    let rows = buckets.into_rows();
    debug!(buckets = rows.len(), "Grouped results by issue tag");
    rows
}
