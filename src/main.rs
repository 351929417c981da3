//! Price Scout - resolve a product query to price trends and marketplace links
//!
//! A command-line front end that looks up a product keyword against a price
//! trend dataset, builds domestic and cross-border marketplace search links,
//! and reports current exchange rates.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pricescout::cli::Cli;
use pricescout::config::ScoutConfig;
use pricescout::scout::PriceScout;
use pricescout::ui::ReportView;

/// Sets up log output on stderr so the report on stdout stays clean
fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pricescout=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging();

    let config = match ScoutConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    let scout = PriceScout::new(config);

    let report = scout.lookup(&cli.query_text()).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", ReportView(&report));
    }

    Ok(())
}
