use thiserror::Error;

/// The host pattern of a rewriter could not be compiled.
#[derive(Debug, Error)]
#[error("error compiling regular expression {pattern}: {source}")]
pub struct ConfigurationError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A `%` in a path that does not start a two digit hex escape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathDecodingError {
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
}

/// A request that matched could not be rewritten consistently.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Decode(#[from] PathDecodingError),
    #[error("rewritten path `{target}` is not a valid request target: {source}")]
    RequestTarget {
        target: String,
        #[source]
        source: http::Error,
    },
}
