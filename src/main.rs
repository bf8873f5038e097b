use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_checker::{
    config::{
        Config,
        defaults::{DEFAULT_CONFIG_PATH, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH},
    },
    models::{Catalog, ValidationMode},
    pipeline::CatalogWalker,
    services::{Capabilities, FfmpegPlaybackProber, StreamProber, ensure_required_tools},
    utils::StandardHttpClient,
};

#[derive(Parser)]
#[command(name = "iptv-checker")]
#[command(version)]
#[command(about = "Validates IPTV source catalogs and orders playable sources by latency")]
#[command(long_about = None)]
struct Cli {
    /// Source catalog to check
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Where the filtered catalog is written
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Maximum concurrent validations (overrides config file)
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Validation mode (overrides config file)
    #[arg(short, long, value_enum)]
    mode: Option<ValidationMode>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("iptv_checker={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IPTV checker v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments, then validate the result once
    config.apply_overrides(cli.workers, cli.mode);
    config.validate()?;

    info!(
        "Validation: mode={:?}, workers={}, check_timeout={:?}, batch_deadline={:?}",
        config.validation.mode,
        config.validation.max_workers,
        config.validation.check_timeout,
        config.validation.batch_deadline
    );

    ensure_required_tools(&config.tools, config.validation.mode).await?;

    let capabilities = Capabilities::new(
        Arc::new(StandardHttpClient::new(&config.http)?),
        Arc::new(StreamProber::new(Some(config.tools.ffprobe_command.clone()))),
        Arc::new(FfmpegPlaybackProber::new(
            config.tools.ffmpeg_command.clone(),
            config.tools.playback_run_time,
        )),
    );

    let mut catalog = Catalog::read_from_path(&cli.input).await?;
    info!("Catalog loaded from: {}", cli.input.display());

    let walker = CatalogWalker::from_config(capabilities, &config);
    let summary = walker.walk(&mut catalog).await?;

    catalog.write_to_path(&cli.output).await?;
    info!(
        "Wrote {} valid sources to {}",
        summary.valid_sources,
        cli.output.display()
    );

    Ok(())
}
