//! Issue references written in pull request bodies.
//!
//! Three forms are recognised, case-insensitively: a closing keyword
//! (`Resolves`, `Fixes`, `Closes`, `Depends on`, `Related to`) followed by
//! `#<n>`, a full `https://github.com/<owner>/<repo>/issues/<n>` locator, and
//! a bare `#<n>`. HTML comments are ignored.

use regex::Regex;
use std::sync::OnceLock;

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(?:Resolves|Fixes|Closes|Depends on|Related to) #(\d+)|https://(?:www\.)?github\.com/([^/\s]+)/([^/\s]+)/(?:issue|issues)/(\d+)|#(\d+)",
        )
        .expect("valid reference pattern")
    })
}

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
fn html_comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<!-*[\s\S]*?-*>").expect("valid comment pattern"))
}

/// Returns every issue number referenced in `body`, in order of appearance.
///
/// References whose number does not fit in a `u64` are left out.
#[must_use]
pub fn extract_issue_references(body: &str) -> Vec<u64> {
    reference_digits(body)
        .iter()
        .filter_map(|digits| digits.parse().ok())
        .collect()
}

/// Returns whether a pull request body links to `issue_number`.
///
/// The last recognised reference decides: a body mentioning several issues
/// links only to the one written last. Its digits must spell the issue
/// number exactly, so `#02` does not link to issue 2.
#[must_use]
pub fn issue_linked_via_pr_body(body: Option<&str>, issue_number: u64) -> bool {
    body.and_then(|text| reference_digits(text).pop())
        .is_some_and(|digits| digits == issue_number.to_string())
}

fn reference_digits(body: &str) -> Vec<String> {
    let visible = html_comment_pattern().replace_all(body, "");
    reference_pattern()
        .captures_iter(&visible)
        .filter_map(|captures| {
            [1, 4, 5]
                .into_iter()
                .find_map(|group| captures.get(group))
                .map(|digits| digits.as_str().to_owned())
        })
        .collect()
}
