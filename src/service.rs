use std::any::Any;
use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{FutureExt, TryFutureExt};
use hyper::service::{service_fn, Service};
use hyper::Body;

use crate::handler::Handler;
use crate::response;

/// Adapts a handler chain into a hyper service, turning panics into `500` responses.
pub fn into_service<H>(
    handler: H,
) -> impl Service<
    http::Request<Body>,
    Response = http::Response<Body>,
    Error = Infallible,
    Future = impl Future<Output = Result<http::Response<Body>, Infallible>> + Send,
> + Clone
where
    H: Handler + 'static,
{
    let handler = Arc::new(handler);
    service_fn(move |request: http::Request<Body>| handle(handler.clone(), request).never_error())
}

fn handle<H>(
    handler: Arc<H>,
    request: http::Request<Body>,
) -> impl Future<Output = http::Response<Body>>
where
    H: Handler + 'static,
{
    AssertUnwindSafe(async move { handler.handle(request).await })
        .catch_unwind()
        .unwrap_or_else(|payload| {
            log::error!(
                "Panic while handling request: {}",
                fmt_panic_payload(payload)
            );
            response::from_status(http::StatusCode::INTERNAL_SERVER_ERROR)
        })
}

fn fmt_panic_payload(payload: Box<dyn Any + Send + 'static>) -> impl Display {
    if let Some(string) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(*string)
    } else if let Ok(string) = payload.downcast::<String>() {
        Cow::Owned(*string)
    } else {
        Cow::Borrowed("Box<Any>")
    }
}
