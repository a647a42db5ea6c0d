use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use homework_bot::config::{self, Config, Credentials};
use homework_bot::notifier::TelegramNotifier;
use homework_bot::poller::Poller;
use homework_bot::practicum::PracticumClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Relay homework review status changes to a Telegram chat"
)]
struct Args {
    /// Path to YAML settings file (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single polling iteration and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let settings = config::load(args.config.as_deref())?;

    let credentials = Credentials::from_env();
    if let Err(err) = credentials.check() {
        error!(%err, "required tokens are missing; refusing to start");
        return Err(err.into());
    }
    info!("token check passed");

    let cfg = Config::new(settings, credentials)?;
    let api = PracticumClient::from_config(&cfg)?;
    let notifier = TelegramNotifier::from_config(&cfg);
    let mut poller = Poller::new(api, notifier, &cfg.settings.app);

    if args.once {
        let outcome = poller.tick().await?;
        info!(?outcome, cursor = poller.cursor(), "single poll finished");
        return Ok(());
    }

    poller.run().await;
    Ok(())
}
