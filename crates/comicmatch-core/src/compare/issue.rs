use crate::parser::normalize_issue;

/// 1.0 when both issues normalize to the same number, else 0.0.
///
/// There is no partial credit: #141 and #142 are different physical issues.
pub fn compare_issues(issue_a: &str, issue_b: &str) -> f64 {
    compare_normalized_issues(
        normalize_issue(issue_a).as_deref(),
        normalize_issue(issue_b).as_deref(),
    )
}

/// Same rule over issues that were normalized at ingest.
pub fn compare_normalized_issues(issue_a: Option<&str>, issue_b: Option<&str>) -> f64 {
    match (issue_a, issue_b) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    }
}
