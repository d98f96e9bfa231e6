use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graphql_scraper::output::report::print_report;
use graphql_scraper::{Args, ScraperConfig, scrape};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graphql_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = ScraperConfig::from_args(args)?;

    let report = scrape(&config)
        .await
        .with_context(|| format!("Scraping {} failed", config.endpoint))?;

    let saved_to = config.save.then_some(config.output_dir.as_path());
    print_report(&report, saved_to);

    Ok(())
}
