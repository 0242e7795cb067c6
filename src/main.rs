use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vibe_server::config::{AppConfig, CliConfig, FileConfig};
use vibe_server::server::{run_server, ServerConfig};
use vibe_server::{RequestsLoggingLevel, SqliteVibeStore, VibeStore};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the vibe database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Cache-Control max-age of trending query responses, in seconds.
    #[clap(long, default_value_t = 60)]
    pub response_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Number of days to retain vibe events before pruning. Set to 0 to disable pruning.
    #[clap(long, default_value_t = 30)]
    pub event_retention_days: u64,

    /// Interval in hours between pruning runs. Only used if event_retention_days > 0.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,

    /// Number of read-only database connections.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            response_cache_age_sec: self.response_cache_age_sec,
            frontend_dir_path: self.frontend_dir_path.clone(),
            event_retention_days: self.event_retention_days,
            prune_interval_hours: self.prune_interval_hours,
            read_pool_size: self.read_pool_size,
        }
    }
}

fn spawn_event_pruning(store: Arc<dyn VibeStore>, retention_days: u64, interval_hours: u64) {
    info!(
        "Event pruning enabled: retaining {} days, pruning every {} hours",
        retention_days, interval_hours
    );

    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours.saturating_mul(60 * 60));
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let retention_ms = i64::try_from(retention_days)
                .unwrap_or(i64::MAX)
                .saturating_mul(DAY_MS);
            let cutoff = chrono::Utc::now()
                .timestamp_millis()
                .saturating_sub(retention_ms);
            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.prune_events_older_than(cutoff)).await
            {
                Ok(Ok(count)) => {
                    if count > 0 {
                        info!("Pruned {} old vibe events", count);
                    }
                }
                Ok(Err(e)) => error!("Failed to prune vibe events: {:#}", e),
                Err(e) => error!("Pruning task failed: {}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening vibe database at {:?}...", config.vibe_db_path());
    let vibe_store: Arc<dyn VibeStore> = Arc::new(SqliteVibeStore::new(
        config.vibe_db_path(),
        config.read_pool_size,
    )?);

    let counts = vibe_store.get_counts()?;
    info!(
        "Loaded {} events over {} locations, {} tracks, {} artists, {} genres",
        counts.events, counts.locations, counts.tracks, counts.artists, counts.genres
    );

    if config.event_retention_days > 0 {
        spawn_event_pruning(
            vibe_store.clone(),
            config.event_retention_days,
            config.prune_interval_hours,
        );
    }

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
        response_cache_age_sec: config.response_cache_age_sec,
        frontend_dir_path: config.frontend_dir_path,
        ranking: config.ranking,
    };

    info!("Ready to serve at port {}!", server_config.port);
    run_server(server_config, vibe_store).await
}
