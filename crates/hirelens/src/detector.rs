//! GitHub handle detection in resume text.
//!
//! Handles are 1–39 ASCII alphanumerics or single hyphens, never starting or
//! ending with a hyphen. The regexes match the `alnum(-?alnum)*` shape and
//! [`cap_handle`] enforces the length limit afterwards.

use std::sync::LazyLock;

use regex::Regex;

/// Lines after a "github" mention that may still hold the `@handle`.
const MENTION_WINDOW: usize = 2;

/// Longest handle GitHub accepts.
const MAX_HANDLE_LEN: usize = 39;

static RE_PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)github\.com/([A-Za-z0-9](?:-?[A-Za-z0-9])*)").unwrap()
});
static RE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9](?:-?[A-Za-z0-9])*)").unwrap());

/// Truncates a matched handle to 39 characters without leaving a trailing
/// hyphen. Matches are ASCII, so byte slicing is safe.
fn cap_handle(matched: &str) -> String {
    let end = matched.len().min(MAX_HANDLE_LEN);
    matched[..end].trim_end_matches('-').to_string()
}

/// Returns the first GitHub handle referenced in `text`.
///
/// A `github.com/<handle>` URL anywhere wins. Otherwise each line that
/// mentions "github" is searched, together with the next two lines, for an
/// `@handle`.
pub fn detect(text: &str) -> Option<String> {
    if let Some(caps) = RE_PROFILE_URL.captures(text) {
        return Some(cap_handle(&caps[1]));
    }

    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains("github") {
            continue;
        }
        let end = (idx + MENTION_WINDOW + 1).min(lines.len());
        for candidate in &lines[idx..end] {
            if let Some(caps) = RE_MENTION.captures(candidate) {
                return Some(cap_handle(&caps[1]));
            }
        }
    }

    None
}

/// Canonical profile URL for a handle.
pub fn profile_url(handle: &str) -> String {
    format!("https://github.com/{}", handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_detected() {
        assert_eq!(detect("see github.com/alice123 for code"), Some("alice123".into()));
        assert_eq!(
            detect("Portfolio: https://www.GitHub.com/Jane-Doe/"),
            Some("Jane-Doe".into())
        );
    }

    #[test]
    fn test_first_url_wins() {
        let text = "https://github.com/first\nhttps://github.com/second";
        assert_eq!(detect(text), Some("first".into()));
    }

    #[test]
    fn test_trailing_hyphen_excluded() {
        assert_eq!(detect("github.com/bob-"), Some("bob".into()));
        assert_eq!(detect("github.com/a--b"), Some("a".into()));
    }

    #[test]
    fn test_handle_capped_at_39_chars() {
        let long = "a".repeat(45);
        let found = detect(&format!("github.com/{}", long)).unwrap();
        assert_eq!(found.len(), 39);
    }

    #[test]
    fn test_hyphenated_handle_capped_at_39_chars() {
        let found = detect("github.com/a-b-c-d-e-f-g-h-i-j-k-l-m-n-o-p-q-r-s-t-u").unwrap();
        assert_eq!(found, "a-b-c-d-e-f-g-h-i-j-k-l-m-n-o-p-q-r-s-t");
        assert_eq!(found.len(), 39);

        // The 39th character is a hyphen, which must not end the handle.
        let found = detect("github.com/ab-c-d-e-f-g-h-i-j-k-l-m-n-o-p-q-r-s-t-u").unwrap();
        assert_eq!(found, "ab-c-d-e-f-g-h-i-j-k-l-m-n-o-p-q-r-s-t");
    }

    #[test]
    fn test_long_mention_capped() {
        let text = format!("GitHub\n@{}", "x-y".repeat(20));
        let found = detect(&text).unwrap();
        assert!(found.len() <= 39);
        assert!(!found.ends_with('-'));
    }

    #[test]
    fn test_leading_hyphen_rejected() {
        assert_eq!(detect("github.com/-nope"), None);
    }

    #[test]
    fn test_mention_fallback_within_window() {
        let text = "Links\nGitHub:\n  handle below\n  @octocat\nother";
        assert_eq!(detect(text), Some("octocat".into()));
    }

    #[test]
    fn test_mention_outside_window_ignored() {
        let text = "GitHub\none\ntwo\n@toolate";
        assert_eq!(detect(text), None);
    }

    #[test]
    fn test_mention_without_github_ignored() {
        assert_eq!(detect("Twitter: @someone"), None);
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(detect("Plain resume with no links."), None);
        assert_eq!(detect(""), None);
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(profile_url("octocat"), "https://github.com/octocat");
    }
}
