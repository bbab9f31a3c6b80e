use std::borrow::Cow;

use regex::Regex;

use crate::error::ConfigurationError;

#[derive(Debug)]
pub struct RewriteRule {
    regex: Regex,
    replace: String,
}

impl RewriteRule {
    /// Compiles `pattern` after trimming surrounding whitespace from both inputs.
    pub fn new(pattern: &str, replace: &str) -> Result<Self, ConfigurationError> {
        let regex = Regex::new(pattern.trim()).map_err(|source| ConfigurationError {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(RewriteRule {
            regex,
            replace: replace.trim().to_owned(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replace
    }

    pub fn is_match(&self, host: &str) -> bool {
        self.regex.is_match(host)
    }

    /// Substitutes every match of the pattern in `path`.
    ///
    /// The host pattern is applied to the path text itself, so capture groups refer to
    /// the path, not to the host that satisfied `is_match`.
    pub fn rewrite<'a>(&self, path: &'a str) -> Cow<'a, str> {
        self.regex.replace_all(path, self.replace.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_pattern_and_replacement() {
        let rule = RewriteRule::new("  ^foo\\.  ", "\t/bar  \n").unwrap();
        assert_eq!(rule.pattern(), "^foo\\.");
        assert_eq!(rule.replacement(), "/bar");
    }

    #[test]
    fn invalid_pattern_names_pattern() {
        let err = RewriteRule::new("app-(review", "/x").unwrap_err();
        assert_eq!(err.pattern, "app-(review");
        assert!(err
            .to_string()
            .starts_with("error compiling regular expression app-(review: "));
    }

    #[test]
    fn replaces_all_occurrences() {
        let rule = RewriteRule::new("o", "0").unwrap();
        assert_eq!(rule.rewrite("/foo/boo"), "/f00/b00");
    }

    #[test]
    fn back_references_refer_to_path() {
        let rule = RewriteRule::new("app-review-([a-z0-9]+)", "/env/$1").unwrap();
        assert!(rule.is_match("app-review-foo.dev.example.com"));
        assert_eq!(rule.rewrite("/app-review-bar/x"), "//env/bar/x");
    }

    #[test]
    fn unmatched_path_is_borrowed() {
        let rule = RewriteRule::new(r"^app-review-([a-zA-Z0-9-]+)\.", "/env/$1").unwrap();
        assert!(matches!(rule.rewrite("/api/users"), Cow::Borrowed("/api/users")));
    }
}
