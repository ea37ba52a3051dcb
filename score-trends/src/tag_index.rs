use std::collections::HashMap;

use indexmap::IndexSet;

use crate::types::{Issue, NO_TAG, TestResult};

/// Maps each test id to the issue that owns it.
///
/// A test is owned by at most one issue. If the input lists a test under several
/// issues, the first issue in input order keeps it.
#[derive(Debug)]
pub struct IssueTagIndex<'a> {
    issues: &'a [Issue],
    owner_by_test: HashMap<&'a str, &'a Issue>,
}

impl<'a> IssueTagIndex<'a> {
    pub fn new(issues: &'a [Issue]) -> Self {
        let mut owner_by_test = HashMap::new();
        for issue in issues {
            for test_id in &issue.test_ids {
                owner_by_test.entry(test_id.as_str()).or_insert(issue);
            }
        }
        Self {
            issues,
            owner_by_test,
        }
    }

    pub fn issue_for(&self, test_id: &str) -> Option<&'a Issue> {
        self.owner_by_test.get(test_id).copied()
    }

    /// Tags a test is credited to: its issue's tags, or `[NO_TAG]` when the issue is
    /// untagged or the test is orphaned.
    pub fn tags_for(&self, test_id: &str) -> Vec<&'a str> {
        match self.issue_for(test_id) {
            Some(issue) => issue.effective_tags(),
            None => vec![NO_TAG],
        }
    }

    /// Every tag used by any issue in first-seen order, with [`NO_TAG`] last.
    ///
    /// Aggregations only emit buckets that received a contribution; chart axes
    /// should be built from this list instead.
    pub fn tag_universe(&self) -> Vec<&'a str> {
        let mut tags: IndexSet<&'a str> = self
            .issues
            .iter()
            .flat_map(|issue| issue.tags.iter().flatten())
            .map(String::as_str)
            .filter(|tag| *tag != NO_TAG)
            .collect();
        tags.insert(NO_TAG);
        tags.into_iter().collect()
    }
}

/// `true` if an issue with `issue_tags` passes a tag filter of `selected` tags.
///
/// Untagged issues only pass when [`NO_TAG`] is selected.
pub fn matches_tag_filter<S: AsRef<str>>(selected: &[S], issue_tags: &[String]) -> bool {
    let is_selected = |tag: &str| selected.iter().any(|s| s.as_ref() == tag);
    (issue_tags.is_empty() && is_selected(NO_TAG))
        || issue_tags.iter().any(|tag| is_selected(tag.as_str()))
}

/// Keeps the results whose owning issue passes the tag filter. Orphaned tests are
/// treated as untagged.
pub fn filter_results_by_tags<S: AsRef<str>>(
    index: &IssueTagIndex<'_>,
    results: &[TestResult],
    selected: &[S],
) -> Vec<TestResult> {
    results
        .iter()
        .filter(|result| {
            let issue_tags = index
                .issue_for(&result.test_id)
                .and_then(|issue| issue.tags.as_deref())
                .unwrap_or_default();
            matches_tag_filter(selected, issue_tags)
        })
        .cloned()
        .collect()
}
