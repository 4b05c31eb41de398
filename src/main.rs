use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_logo_cache::{
    config::Config,
    services::logo_cache::{LogoRewriteService, ReqwestTransport},
};

#[derive(Parser)]
#[command(name = "epg-logo-cache")]
#[command(version)]
#[command(about = "Cache EPG show logos locally and rewrite schedule documents to use them")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Root directory holding the day-bucket schedule folders
    #[arg(short, long, value_name = "DIR")]
    schedules_dir: Option<PathBuf>,

    /// Root directory for cached logo assets
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Public base URL the output directory is served under
    #[arg(short, long, value_name = "URL")]
    base_url: Option<String>,

    /// Number of concurrent download workers
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

fn init_tracing(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("epg_logo_cache={}", cli.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    info!("Starting EPG logo cache v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;

    // Override config with CLI arguments
    if let Some(schedules_dir) = cli.schedules_dir {
        config.storage.schedules_dir = schedules_dir;
    }
    if let Some(out_dir) = cli.out_dir {
        config.storage.output_dir = out_dir;
    }
    if let Some(base_url) = cli.base_url {
        config.publishing.base_url = base_url;
    }
    if let Some(workers) = cli.workers {
        config.fetch.workers = workers;
    }
    let config = config.validate()?;

    info!(
        "Schedules: {}, assets: {}, public base: {}",
        config.storage.schedules_dir.display(),
        config.storage.output_dir.display(),
        config.publishing.base_url
    );

    let transport = Arc::new(ReqwestTransport::new(&config.fetch)?);
    let service = LogoRewriteService::new(&config, transport)?;
    let summary = service.run().await?;

    if summary.documents_failed > 0 {
        warn!(
            "{} schedule documents could not be persisted and were left unchanged",
            summary.documents_failed
        );
    }
    info!(
        "Done: {} documents rewritten, {} skipped, {} failed; {} logos fetched, {} cached, {} unavailable",
        summary.documents_rewritten,
        summary.documents_skipped,
        summary.documents_failed,
        summary.shows_fetched,
        summary.shows_cached,
        summary.shows_failed
    );

    Ok(())
}
