use anyhow::{format_err, Context, Result};
use structopt::StructOpt;

use host_path_rewrite::config::{self, Config};
use host_path_rewrite::handler::{Handler, ProxyHandler};
use host_path_rewrite::{review, server, service, PathRewriter};

const ABOUT: &str = "A proxy that rewrites request paths based on the request host.";

#[derive(Debug, StructOpt)]
#[structopt(about = ABOUT)]
#[structopt(setting = structopt::clap::AppSettings::UnifiedHelpMessage)]
pub enum Options {
    #[structopt(about = "Run the rewriting proxy")]
    Serve {
        #[structopt(flatten)]
        config: config::Options,
        #[structopt(flatten)]
        server: server::Options,
    },
    #[structopt(about = "Print the review app name encoded in a host")]
    ReviewAppName {
        #[structopt(value_name = "HOST", help = "Host to extract the name from")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().filter_or("REWRITE_PROXY_LOG", "info"));
    log_panics::init();
    let options = Options::from_args();
    log::debug!("{:#?}", options);

    match options {
        Options::Serve {
            config: config_options,
            server: server_options,
        } => {
            let config = config::parse(&config_options)?;
            let upstream = config.upstream.clone();
            let handler = build_chain(config)?;
            server::run(&server_options, &upstream, service::into_service(handler)).await
        }
        Options::ReviewAppName { host } => {
            let name = review::review_app_name(&host)
                .ok_or_else(|| format_err!("host `{}` is not a review app", host))?;
            println!("{}", name);
            Ok(())
        }
    }
}

fn build_chain(config: Config) -> Result<Box<dyn Handler>> {
    let mut handler: Box<dyn Handler> = Box::new(ProxyHandler::new(config.upstream));
    for middleware in config.middlewares.into_iter().rev() {
        let rewriter = PathRewriter::new(&middleware.rewrite, handler, middleware.name.as_str())
            .with_context(|| format!("failed to create middleware `{}`", middleware.name))?;
        log::info!(
            "Rewriting paths with `{}` for hosts matching `{}`",
            rewriter.name(),
            rewriter.rule().pattern()
        );
        handler = Box::new(rewriter);
    }
    Ok(handler)
}
