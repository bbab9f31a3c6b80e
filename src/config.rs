use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Result};
use fn_error_context::context;
use serde::Deserialize;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub struct Options {
    #[structopt(
        value_name = "CONFIG_FILE",
        help = "Path to the config file",
        parse(from_os_str)
    )]
    config: PathBuf,
}

#[context("failed to parse config from `{}`", options.config.display())]
pub fn parse(options: &Options) -> Result<Config> {
    let reader = BufReader::new(File::open(&options.config)?);
    let config: Config = serde_yaml::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(with = "http_serde::uri")]
    pub upstream: http::Uri,
    #[serde(default)]
    pub middlewares: Vec<Middleware>,
}

#[derive(Debug, Deserialize)]
pub struct Middleware {
    pub name: String,
    #[serde(flatten)]
    pub rewrite: RewriteConfig,
}

/// Settings for a single host based path rewriter.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RewriteConfig {
    #[serde(default)]
    pub host_regex: String,
    #[serde(default)]
    pub path_replacement: String,
}

impl RewriteConfig {
    pub fn new(host_regex: impl Into<String>, path_replacement: impl Into<String>) -> Self {
        RewriteConfig {
            host_regex: host_regex.into(),
            path_replacement: path_replacement.into(),
        }
    }
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.upstream.scheme().is_none() || self.upstream.authority().is_none() {
            bail!("upstream `{}` must be an absolute uri", self.upstream);
        }
        for middleware in &self.middlewares {
            middleware.validate()?;
        }
        Ok(())
    }
}

impl Middleware {
    #[context("error in middleware `{}`", self.name)]
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("middleware name must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_middlewares() {
        let config: Config = serde_yaml::from_str(
            r#"
upstream: http://127.0.0.1:8080
middlewares:
  - name: review-apps
    HostRegex: '^app-review-([a-zA-Z0-9-]+)\.'
    PathReplacement: '/env/$1'
  - name: defaults
"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.upstream.host(), Some("127.0.0.1"));
        assert_eq!(config.middlewares.len(), 2);
        assert_eq!(config.middlewares[0].name, "review-apps");
        assert_eq!(
            config.middlewares[0].rewrite.host_regex,
            r"^app-review-([a-zA-Z0-9-]+)\."
        );
        assert_eq!(config.middlewares[0].rewrite.path_replacement, "/env/$1");
        assert_eq!(config.middlewares[1].rewrite.host_regex, "");
        assert_eq!(config.middlewares[1].rewrite.path_replacement, "");
    }

    #[test]
    fn relative_upstream_is_rejected() {
        let config: Config = serde_yaml::from_str("upstream: /just/a/path\n").unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "upstream `/just/a/path` must be an absolute uri");
    }
}
