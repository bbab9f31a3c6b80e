use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use futures::{future, FutureExt, TryFutureExt};
use hyper::server::{conn::AddrIncoming, conn::AddrStream, Server};
use hyper::service::{make_service_fn, Service};
use hyper::Body;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub struct Options {
    #[structopt(
        long,
        short = "n",
        value_name = "HOST",
        default_value = "localhost",
        help = "Host to listen on"
    )]
    host: String,
    #[structopt(
        long,
        short = "p",
        value_name = "PORT",
        help = "Port to listen on [default: an OS-assigned port]"
    )]
    port: Option<u16>,
}

/// Serves the rewriting chain in front of `upstream` until SIGINT.
pub async fn run<S>(options: &Options, upstream: &http::Uri, service: S) -> Result<()>
where
    S: Service<http::Request<Body>, Response = http::Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    let incoming = AddrIncoming::bind(&options.resolve_addr().await?)?;
    let addr = incoming.local_addr();

    log::info!("Rewriting requests on http://{} for upstream `{}`", addr, upstream);
    let result = Server::builder(incoming)
        .serve(make_service_fn(move |_: &AddrStream| {
            future::ready(service.clone()).never_error()
        }))
        .with_graceful_shutdown(ctrl_c())
        .await;

    result.with_context(|| format!("proxy for upstream `{}` failed", upstream))
}

impl Options {
    async fn resolve_addr(&self) -> Result<SocketAddr> {
        let error_message = || format!("failed to resolve host `{}`", self.host);
        Ok(
            tokio::net::lookup_host((self.host.as_str(), self.port.unwrap_or(0)))
                .await
                .with_context(error_message)?
                .next()
                .with_context(error_message)?,
        )
    }
}

fn ctrl_c() -> impl Future<Output = ()> {
    tokio::signal::ctrl_c()
        .or_else(|err| {
            log::warn!("Error listening for SIGINT: {:#?}", err);
            future::pending::<Result<(), Infallible>>()
        })
        .map(|_| {
            log::info!("Received SIGINT, draining in-flight requests");
        })
}
