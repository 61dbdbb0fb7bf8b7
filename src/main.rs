//! bunnyddns - keeps a bunny.net A record pointed at this host's public IPv4
//!
//! Runs once and exits: 0 when the record is current or was updated, 1 on any
//! fatal error. Meant to be scheduled by cron or a systemd timer.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use bunnyddns::bunny::BunnyClient;
use bunnyddns::config::Settings;
use bunnyddns::orchestrator::{redact_secret, Orchestrator};
use bunnyddns::resolver::HttpIpResolver;
use bunnyddns::state::{DdnsState, JsonFileStore, StateLock, StateStore};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

//==============================================================================
// Main
//==============================================================================

#[derive(Debug, Parser)]
#[command(name = "bunnyddns")]
#[command(version = VERSION)]
struct Args {
    /// Optional TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State file path (default: DDNS_BUNNY_CONFIG.json next to the executable)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match Settings::load(args.config, args.state) {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(args.verbose);
            error!("bunnyddns init: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(args.verbose || settings.verbose);

    match run(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", redact_secret(&format!("{:#}", e), &settings.access_key));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(settings: &Settings) -> Result<()> {
    let _lock = StateLock::acquire(&settings.state_file).context("State lock failed")?;

    let store = JsonFileStore::new(settings.state_file.clone());
    debug!("State file {}", store.path().display());
    let loaded = store.load().await.context("State load failed")?;
    let state = DdnsState::initial(loaded, settings).context("DynDNS bunny.net init failed")?;

    let provider = BunnyClient::new(
        settings.access_key.as_str(),
        settings.timeout,
        &settings.api_base,
    )
    .context("bunny.net client failed")?;
    let resolver = HttpIpResolver::new(settings.timeout).context("IP resolver failed")?;

    let orchestrator = Orchestrator::new(&resolver, &provider, &store);
    let (_, outcome) = orchestrator.run(state).await?;
    info!("Done: {}", outcome);

    Ok(())
}
