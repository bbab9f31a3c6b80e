use regex::Regex;

const REVIEW_APP_PATTERN: &str = r"^app-review-([a-zA-Z0-9-]+)\.";

/// Extracts the review app name from a host such as `app-review-foo-123.dev.example.com`.
///
/// The pattern is compiled on every call; nothing is cached between calls.
pub fn review_app_name(host: &str) -> Option<String> {
    let regex = Regex::new(REVIEW_APP_PATTERN).expect("review app pattern is valid");
    let captures = regex.captures(host)?;
    Some(captures.get(1)?.as_str().to_owned())
}
