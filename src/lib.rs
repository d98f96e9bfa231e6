//! GraphQL scraper library
//!
//! Introspects a GraphQL endpoint, plans one representative query for every
//! root field, and runs them in two passes: argument-free queries first, then
//! queries whose required arguments are filled with values harvested from the
//! first pass. Mutations are planned and saved but never sent.

use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod core;
pub mod output;

use crate::core::client::{HttpTransport, TransportOptions};
use crate::core::errors::ScraperError;
use crate::core::executor::{DEFAULT_DELAY, RunReport, TwoPassExecutor};
use crate::output::ArtifactWriter;

/// Environment fallbacks for credentials, also read from `.env`
pub const AUTH_TOKEN_ENV: &str = "GRAPHQL_AUTH_TOKEN";
pub const COOKIE_ENV: &str = "GRAPHQL_COOKIE";

pub const DEFAULT_OUTPUT_DIR: &str = "result";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "GraphQL API scraper - generates and executes a query for every field of a GraphQL schema",
    long_about = None
)]
pub struct Args {
    #[arg(
        value_name = "URL",
        help = "GraphQL endpoint URL (e.g. https://api.example.com/graphql)"
    )]
    pub endpoint_url: String,
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, help = "Output directory")]
    pub output_dir: PathBuf,
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_DELAY.as_secs_f64(),
        help = "Delay between queries in seconds"
    )]
    pub delay: f64,
    #[arg(short, long, help = "Authorization bearer token")]
    pub auth_token: Option<String>,
    #[arg(
        short,
        long,
        help = "Cookie string (e.g. \"session=abc123; token=xyz\")"
    )]
    pub cookie: Option<String>,
    #[arg(
        short = 'H',
        long = "header",
        value_name = "NAME: VALUE",
        help = "Extra request header, may be repeated"
    )]
    pub headers: Vec<String>,
    #[arg(long, default_value = "30", help = "Request timeout in seconds")]
    pub timeout: u64,
    #[arg(long, help = "Print the summary without writing any files")]
    pub no_save: bool,
}

/// Settings for one scraping run
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub endpoint: Url,
    pub output_dir: PathBuf,
    pub delay: Duration,
    pub transport: TransportOptions,
    pub save: bool,
}

impl ScraperConfig {
    /// Validate command-line arguments, falling back to the environment for
    /// the auth token and cookie
    pub fn from_args(args: Args) -> Result<Self, ScraperError> {
        let endpoint = validate_url(&args.endpoint_url)?;

        let delay = Duration::try_from_secs_f64(args.delay).map_err(|e| {
            ScraperError::Config(format!("Invalid delay {}: {e}", args.delay))
        })?;

        let auth_token = args.auth_token.or_else(|| env_var(AUTH_TOKEN_ENV));
        let cookies = args
            .cookie
            .or_else(|| env_var(COOKIE_ENV))
            .map(|cookie| parse_cookies(&cookie))
            .unwrap_or_default();
        let headers = args
            .headers
            .iter()
            .map(|header| parse_header(header))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            endpoint,
            output_dir: args.output_dir,
            delay,
            transport: TransportOptions {
                auth_token,
                cookies,
                headers,
                timeout: Duration::from_secs(args.timeout),
            },
            save: !args.no_save,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// The endpoint must be an absolute http(s) URL with a host
pub fn validate_url(endpoint: &str) -> Result<Url, ScraperError> {
    let url = Url::parse(endpoint).map_err(|e| ScraperError::InvalidUrl(format!("{endpoint}: {e}")))?;

    match matches!(url.scheme(), "http" | "https") && url.has_host() {
        true => Ok(url),
        false => Err(ScraperError::InvalidUrl(endpoint.to_string())),
    }
}

/// Split `"k=v; k2=v2"` into pairs, dropping entries without `=`
pub fn parse_cookies(cookie: &str) -> Vec<(String, String)> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Split a `Name: value` header argument
pub fn parse_header(header: &str) -> Result<(String, String), ScraperError> {
    header
        .split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| ScraperError::Config(format!("Header must look like 'Name: value', got {header:?}")))
}

/// Fetch the schema, run every planned operation and, unless disabled, write
/// the artifacts. Nothing is written when the schema fetch fails.
pub async fn scrape(config: &ScraperConfig) -> Result<RunReport, ScraperError> {
    info!(endpoint = %config.endpoint, "Starting GraphQL scraping");

    let transport = HttpTransport::new(config.endpoint.clone(), &config.transport)?;
    let mut executor = TwoPassExecutor::new(transport, config.delay);
    let (fetched, report) = executor.scrape().await?;

    if config.save {
        let writer = ArtifactWriter::create(&config.output_dir)?;
        writer.write_all(&fetched.raw, &report)?;
        info!(dir = %writer.root().display(), "Results saved");
    }

    Ok(report)
}
