use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use http::uri::{PathAndQuery, Uri};
use hyper::client::{Client, HttpConnector};
use hyper::Body;
use once_cell::sync::Lazy;

use crate::handler::Handler;
use crate::response;

/// Forwards requests to an upstream server, joining the request target onto its base path.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    upstream: Uri,
    client: Arc<Client<HttpConnector>>,
}

impl ProxyHandler {
    pub fn new(upstream: Uri) -> Self {
        static CLIENT: Lazy<Arc<Client<HttpConnector>>> =
            Lazy::new(|| Arc::new(Client::builder().build(HttpConnector::new())));

        ProxyHandler {
            upstream,
            client: CLIENT.clone(),
        }
    }

    pub fn upstream(&self) -> &Uri {
        &self.upstream
    }

    fn get_uri(&self, target: Option<&PathAndQuery>) -> http::Result<Uri> {
        let path_and_query = append_target(self.upstream.path_and_query(), target)?;
        let mut parts = self.upstream.clone().into_parts();
        parts.path_and_query = Some(path_and_query);
        Ok(Uri::from_parts(parts)?)
    }
}

impl Handler for ProxyHandler {
    fn handle(&self, mut request: http::Request<Body>) -> BoxFuture<'static, http::Response<Body>> {
        let uri = match self.get_uri(request.uri().path_and_query()) {
            Ok(uri) => uri,
            Err(err) => {
                log::info!("Request `{}` produced invalid uri: {}", request.uri(), err);
                return future::ready(response::from_status(http::StatusCode::BAD_REQUEST))
                    .boxed();
            }
        };

        if let Some(authority) = uri.authority() {
            match http::HeaderValue::from_str(authority.as_str()) {
                Ok(host) => {
                    request.headers_mut().insert(http::header::HOST, host);
                }
                Err(err) => log::warn!("Upstream authority is not a valid header: {}", err),
            }
        }
        *request.uri_mut() = uri;
        log::debug!("Forwarding request to `{}`", request.uri());

        let response = self.client.request(request);
        async move {
            match response.await {
                Ok(response) => response,
                Err(err) => {
                    log::error!("Error making request: {}", err);
                    response::from_status(http::StatusCode::BAD_GATEWAY)
                }
            }
        }
        .boxed()
    }
}

fn append_target(
    base: Option<&PathAndQuery>,
    target: Option<&PathAndQuery>,
) -> Result<PathAndQuery, http::uri::InvalidUri> {
    let path = target.map_or("/", |target| target.path());
    let query = target.and_then(|target| target.query());

    let mut result = String::new();
    if let Some(base) = base {
        result.push_str(base.path());
    }
    if result.ends_with('/') && path.starts_with('/') {
        result.pop();
    } else if !result.ends_with('/') && !path.starts_with('/') {
        result.push('/');
    }
    result.push_str(path);

    let base_query = base.and_then(|base| base.query());
    match (base_query, query) {
        (Some(base_query), Some(query)) => {
            result.push('?');
            result.push_str(base_query);
            result.push('&');
            result.push_str(query);
        }
        (Some(query), None) | (None, Some(query)) => {
            result.push('?');
            result.push_str(query);
        }
        (None, None) => (),
    }

    result.parse()
}
