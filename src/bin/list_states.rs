// Print the state roster the dashboard currently offers, then exit.
// Useful for checking selector drift without kicking off a full scrape.
use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};
use vahanscraper::{config::Config, navigate};

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = Config::from_env()?;
    let states = navigate::list_states(&config).await?;

    println!("{} states selectable:", states.len());
    for state in &states {
        println!("  - {state}");
    }
    Ok(())
}
