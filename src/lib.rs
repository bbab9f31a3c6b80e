//! Rewrites request paths for requests whose host matches a regular expression.
//!
//! [`PathRewriter`] is a link in a [`Handler`] chain. When the `Host` of a request matches its
//! pattern, the same pattern is substituted in the escaped request path, the decoded path is
//! recomputed from the result, and the previous path is appended to [`REPLACED_PATH_HEADER`].

pub mod config;
pub mod error;
pub mod handler;
pub mod path;
pub mod response;
pub mod review;
pub mod rewriter;
pub mod rule;
pub mod server;
pub mod service;

pub use self::config::RewriteConfig;
pub use self::error::{ConfigurationError, PathDecodingError, RewriteError};
pub use self::handler::{handler_fn, Handler, ProxyHandler};
pub use self::path::{DecodedPath, REPLACED_PATH_HEADER};
pub use self::rewriter::PathRewriter;
pub use self::rule::RewriteRule;
