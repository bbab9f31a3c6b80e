use futures::future::{self, BoxFuture, FutureExt};
use hyper::Body;

use crate::config::RewriteConfig;
use crate::error::{ConfigurationError, RewriteError};
use crate::handler::Handler;
use crate::path::{self, DecodedPath, REPLACED_PATH_HEADER};
use crate::response;
use crate::rule::RewriteRule;

/// Rewrites the request path when the request host matches a pattern, then forwards to `next`.
///
/// The host pattern is also the pattern substituted in the path, so a host match does not imply
/// the path changes. The original escaped path is still recorded in [`REPLACED_PATH_HEADER`].
#[derive(Debug)]
pub struct PathRewriter<N> {
    rule: RewriteRule,
    next: N,
    name: String,
}

#[derive(Debug)]
struct Rewrite {
    original: String,
    /// `None` when the URI is kept as is.
    target: Option<http::uri::PathAndQuery>,
    decoded: Vec<u8>,
}

impl<N> PathRewriter<N>
where
    N: Handler,
{
    pub fn new(
        config: &RewriteConfig,
        next: N,
        name: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let rule = RewriteRule::new(&config.host_regex, &config.path_replacement)?;
        Ok(PathRewriter {
            rule,
            next,
            name: name.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &RewriteRule {
        &self.rule
    }

    /// Applies the rule to `request` in place, returning whether it matched.
    ///
    /// On error the request is left untouched.
    pub fn rewrite<B>(&self, request: &mut http::Request<B>) -> Result<bool, RewriteError> {
        let Rewrite {
            original,
            target,
            decoded,
        } = match self.plan(request)? {
            Some(rewrite) => rewrite,
            None => return Ok(false),
        };

        let header = http::HeaderValue::from_str(&original).map_err(|err| {
            RewriteError::RequestTarget {
                target: original.clone(),
                source: err.into(),
            }
        })?;
        let uri = match target {
            Some(target) => Some(rebuild_uri(request.uri(), target)?),
            None => None,
        };

        log::debug!(
            "Rewriter `{}` replaced path `{}` with `{}`",
            self.name,
            original,
            uri.as_ref().unwrap_or_else(|| request.uri()).path()
        );
        request.headers_mut().append(REPLACED_PATH_HEADER, header);
        if let Some(uri) = uri {
            *request.uri_mut() = uri;
        }
        request.extensions_mut().insert(DecodedPath::new(decoded));
        Ok(true)
    }

    fn plan<B>(&self, request: &http::Request<B>) -> Result<Option<Rewrite>, RewriteError> {
        let host = path::host(request);
        if self.rule.replacement().is_empty() || !self.rule.is_match(host) {
            log::trace!("Rewriter `{}` skipped host `{}`", self.name, host);
            return Ok(None);
        }

        let original = path::escaped_path(request);
        let mut raw = self.rule.rewrite(&original);
        if raw.is_empty() {
            // Authority-form targets have no path to rewrite into.
            if request.uri().path().is_empty() {
                return Ok(Some(Rewrite {
                    original: original.into_owned(),
                    target: None,
                    decoded: Vec::new(),
                }));
            }
            raw = "/".into();
        }

        let decoded = path::unescape(&raw)?;
        let target = path::request_target(&raw, &decoded, request.uri().query())?;

        Ok(Some(Rewrite {
            original: original.into_owned(),
            target: Some(target),
            decoded,
        }))
    }
}

/// Swaps the request-target of `uri`, keeping scheme and authority of absolute-form URIs.
///
/// Authority-form URIs cannot carry a path, so they become origin-form.
fn rebuild_uri(
    uri: &http::Uri,
    target: http::uri::PathAndQuery,
) -> Result<http::Uri, RewriteError> {
    let mut parts = uri.clone().into_parts();
    if parts.scheme.is_none() {
        parts.authority = None;
    }
    let target_str = target.as_str().to_owned();
    parts.path_and_query = Some(target);
    http::Uri::from_parts(parts).map_err(|err| RewriteError::RequestTarget {
        target: target_str,
        source: err.into(),
    })
}

impl<N> Handler for PathRewriter<N>
where
    N: Handler,
{
    fn handle(&self, mut request: http::Request<Body>) -> BoxFuture<'static, http::Response<Body>> {
        match self.rewrite(&mut request) {
            Ok(_) => self.next.handle(request),
            Err(err) => {
                log::info!(
                    "Rewriter `{}` rejected path `{}`: {}",
                    self.name,
                    request.uri().path(),
                    err
                );
                future::ready(response::text(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    &err.to_string(),
                ))
                .boxed()
            }
        }
    }
}
