use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod agents;
mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod input;
mod metrics;
mod providers;
mod store;
mod system;

use crate::app::Application;
use crate::cli::Args;
use crate::config::Config;
use crate::core::error::SmartCloudError;

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn build_env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("smartcloud=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), SmartCloudError> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(args.verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::load()?;
    let mut app = Application::new(args, config)?;

    if let Err(e) = app.run().await {
        display::display_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
