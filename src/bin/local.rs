use clap::Parser;
use subsock::config::Config;
use subsock::local::Local;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.json")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let listener = TcpListener::bind(config.local_addr()).await?;
    tracing::info!("server is at {}", config.server_addr());

    let local = Local::new(config.cipher()?, config.server_addr());
    local.serve(listener).await?;
    Ok(())
}
