mod proxy;

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use hyper::Body;

pub use self::proxy::ProxyHandler;

/// A link in the request chain: consumes a request and eventually produces a response.
pub trait Handler: Send + Sync {
    fn handle(&self, request: http::Request<Body>) -> BoxFuture<'static, http::Response<Body>>;
}

#[derive(Debug, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

pub fn handler_fn<F, R>(f: F) -> HandlerFn<F>
where
    F: Fn(http::Request<Body>) -> R + Send + Sync,
    R: Future<Output = http::Response<Body>> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, R> Handler for HandlerFn<F>
where
    F: Fn(http::Request<Body>) -> R + Send + Sync,
    R: Future<Output = http::Response<Body>> + Send + 'static,
{
    fn handle(&self, request: http::Request<Body>) -> BoxFuture<'static, http::Response<Body>> {
        (self.f)(request).boxed()
    }
}

impl<H> Handler for Box<H>
where
    H: Handler + ?Sized,
{
    fn handle(&self, request: http::Request<Body>) -> BoxFuture<'static, http::Response<Body>> {
        (**self).handle(request)
    }
}

impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    fn handle(&self, request: http::Request<Body>) -> BoxFuture<'static, http::Response<Body>> {
        (**self).handle(request)
    }
}
