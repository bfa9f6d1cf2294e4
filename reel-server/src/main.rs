use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = reel_server::load_config();
    let addr = reel_server::app::listen_addr(&config)?;

    let ax = reel_server::build(&config).await?;
    ax.listen(addr).await?;

    Ok(())
}
