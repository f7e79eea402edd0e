//! Unsplash downloader CLI
//!
//! Lists the photos of a user, a user's likes or a collection and downloads
//! them in parallel.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use unsplash_dl::{
    auth::{self, Credentials},
    error::Result,
    models::{Config, ListingQuery, Order, Source},
    pipeline::{self, RunOptions},
    services::PhotoClient,
    utils::{self, http},
};

/// unsplash - Bulk photo downloader
#[derive(Parser, Debug)]
#[command(name = "unsplash", version, about = "Download Unsplash photos in bulk")]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["user", "userlikes", "collection"]),
))]
struct Cli {
    /// Download the photos uploaded by this user
    #[arg(long)]
    user: Option<String>,

    /// Download the photos this user has liked
    #[arg(long)]
    userlikes: Option<String>,

    /// Download the photos of this collection id
    #[arg(long)]
    collection: Option<String>,

    /// Listing order: latest, oldest or popular
    #[arg(long)]
    order: Option<String>,

    /// Target directory for downloaded photos
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Number of parallel downloads
    #[arg(long)]
    parallel: Option<usize>,

    /// Maximum number of photos to download, negative for no limit
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Rotate the desktop wallpaper through the downloaded photos
    #[cfg(feature = "wallpaper")]
    #[arg(long)]
    wallpaper: bool,

    /// Path to the configuration file
    #[arg(short, long, default_value = "unsplash.toml")]
    config: PathBuf,

    /// Static access key, skips the OAuth flow
    #[arg(long)]
    client_id: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn wants_wallpaper(&self) -> bool {
        #[cfg(feature = "wallpaper")]
        return self.wallpaper;
        #[cfg(not(feature = "wallpaper"))]
        return false;
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Apply command line overrides on top of the file configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(order) = &cli.order {
        config.download.order = order.parse::<Order>()?;
    }
    if let Some(dir) = &cli.dir {
        config.download.dir = Some(dir.clone());
    }
    if let Some(parallel) = cli.parallel {
        config.download.parallel = parallel;
    }
    if let Some(limit) = cli.limit {
        config.download.limit = limit;
    }
    if let Some(key) = &cli.client_id {
        config.auth.access_key = Some(key.clone());
    }
    Ok(())
}

/// Where photos go for this run.
///
/// Wallpaper runs without an explicit directory use a fresh directory
/// under the cache dir that outlives the process.
fn target_dir(config: &Config, wallpaper: bool) -> Result<PathBuf> {
    if let Some(dir) = &config.download.dir {
        return Ok(dir.clone());
    }
    if !wallpaper {
        return Ok(utils::default_download_dir());
    }

    let cache = utils::cache_dir();
    std::fs::create_dir_all(&cache)?;
    let dir = tempfile::Builder::new()
        .prefix("wallpaper-")
        .tempdir_in(&cache)?
        .keep();
    Ok(dir)
}

#[cfg(feature = "wallpaper")]
async fn apply_wallpaper(dir: &std::path::Path) -> Result<()> {
    unsplash_dl::wallpaper::set_wallpaper_dir(dir).await
}

#[cfg(not(feature = "wallpaper"))]
async fn apply_wallpaper(_dir: &std::path::Path) -> Result<()> {
    Err(unsplash_dl::error::AppError::wallpaper("built without wallpaper support"))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = Source::select(
        cli.user.clone(),
        cli.userlikes.clone(),
        cli.collection.clone(),
    )?;

    let mut config = Config::load_or_default(&cli.config);
    apply_overrides(&mut config, &cli)?;
    config.validate()?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    let wallpaper = cli.wants_wallpaper();
    let target_dir = target_dir(&config, wallpaper)?;

    let credentials: Credentials = auth::resolve_credentials(&config.auth).await?;
    let photos = PhotoClient::from_config(&config.api, Some(&credentials))?;
    let downloads = http::create_download_client(&config.api)?;

    let options = RunOptions {
        query: ListingQuery::new(source, config.download.order),
        target_dir: target_dir.clone(),
        parallel: config.download.parallel,
        limit: config.download.limit,
    };

    let count = pipeline::run_download(photos, downloads, options)
        .await
        .into_result()?;
    log::info!("Saved {} photos to {}", count, target_dir.display());

    if wallpaper {
        apply_wallpaper(&target_dir).await?;
    }
    Ok(())
}
