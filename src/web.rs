#![cfg(not(tarpaulin_include))]

use boxworks::app;
use boxworks::config::Config;

/// Main entry point for the web application
///
/// Loads `.env` if present, initialises logging (`RUST_LOG`, default `info`),
/// reads the configuration and runs the web server until it is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    app::run(config).await
}
