mod file_config;

pub use file_config::{FileConfig, RankingConfig};

use crate::geo::integer_sqrt;
use crate::ranking::RankingSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

const MAX_EVENT_RETENTION_DAYS: u64 = 100 * 365;
const MAX_PRUNE_INTERVAL_HOURS: u64 = 365 * 24;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub response_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub event_retention_days: u64,
    pub prune_interval_hours: u64,
    pub read_pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub response_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    /// 0 disables pruning.
    pub event_retention_days: u64,
    pub prune_interval_hours: u64,
    pub read_pool_size: usize,

    pub ranking: RankingSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let response_cache_age_sec = file
            .response_cache_age_sec
            .unwrap_or(cli.response_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let event_retention_days = file
            .event_retention_days
            .unwrap_or(cli.event_retention_days);
        let prune_interval_hours = file
            .prune_interval_hours
            .unwrap_or(cli.prune_interval_hours);
        let read_pool_size = file.read_pool_size.unwrap_or(cli.read_pool_size);
        if read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        let ranking = resolve_ranking(file.ranking.unwrap_or_default())?;

        if event_retention_days > 0 {
            if prune_interval_hours == 0 {
                bail!("prune_interval_hours must be at least 1 when pruning is enabled");
            }
            if prune_interval_hours > MAX_PRUNE_INTERVAL_HOURS {
                bail!(
                    "prune_interval_hours must be at most {}, got {}",
                    MAX_PRUNE_INTERVAL_HOURS,
                    prune_interval_hours
                );
            }
            if event_retention_days > MAX_EVENT_RETENTION_DAYS {
                bail!(
                    "event_retention_days must be at most {}, got {}",
                    MAX_EVENT_RETENTION_DAYS,
                    event_retention_days
                );
            }
            // Pruning must never eat into the default ranking window
            if (event_retention_days as f64) < ranking.default_window_days {
                bail!(
                    "event_retention_days ({}) is shorter than default_window_days ({})",
                    event_retention_days,
                    ranking.default_window_days
                );
            }
        }

        Ok(Self {
            db_dir,
            port,
            logging_level,
            response_cache_age_sec,
            frontend_dir_path,
            event_retention_days,
            prune_interval_hours,
            read_pool_size,
            ranking,
        })
    }

    pub fn vibe_db_path(&self) -> PathBuf {
        self.db_dir.join("vibes.db")
    }
}

/// Merge the `[ranking]` table with defaults and check the result.
fn resolve_ranking(file: RankingConfig) -> Result<RankingSettings> {
    let defaults = RankingSettings::default();
    let ranking = RankingSettings {
        default_radius_miles: file
            .default_radius_miles
            .unwrap_or(defaults.default_radius_miles),
        default_window_days: file
            .default_window_days
            .unwrap_or(defaults.default_window_days),
        default_track_limit: file
            .default_track_limit
            .unwrap_or(defaults.default_track_limit),
        per_cell_track_limit: file
            .per_cell_track_limit
            .unwrap_or(defaults.per_cell_track_limit),
        per_cell_genre_limit: file
            .per_cell_genre_limit
            .unwrap_or(defaults.per_cell_genre_limit),
        allowed_divisions: file.allowed_divisions.unwrap_or(defaults.allowed_divisions),
    };

    if !(ranking.default_radius_miles.is_finite() && ranking.default_radius_miles > 0.0) {
        bail!(
            "default_radius_miles must be positive, got {}",
            ranking.default_radius_miles
        );
    }
    if !(ranking.default_window_days.is_finite() && ranking.default_window_days > 0.0) {
        bail!(
            "default_window_days must be positive, got {}",
            ranking.default_window_days
        );
    }
    if ranking.default_track_limit == 0
        || ranking.per_cell_track_limit == 0
        || ranking.per_cell_genre_limit == 0
    {
        bail!("ranking limits must be at least 1");
    }
    if ranking.allowed_divisions.is_empty() {
        bail!("allowed_divisions must not be empty");
    }
    for &divisions in &ranking.allowed_divisions {
        let side = integer_sqrt(divisions);
        if divisions == 0 || side * side != divisions {
            bail!("allowed_divisions must be perfect squares, got {}", divisions);
        }
    }
    Ok(ranking)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_dir(temp_dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            port: 3001,
            read_pool_size: 4,
            event_retention_days: 30,
            prune_interval_hours: 24,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            logging_level: RequestsLoggingLevel::Headers,
            response_cache_age_sec: 30,
            frontend_dir_path: Some("/frontend".to_string()),
            ..cli_with_dir(&temp_dir)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 3001);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.response_cache_age_sec, 30);
        assert_eq!(config.frontend_dir_path, Some("/frontend".to_string()));
        assert_eq!(config.event_retention_days, 30);
        assert_eq!(config.read_pool_size, 4);
        assert_eq!(config.ranking, RankingSettings::default());
        assert_eq!(config.vibe_db_path(), temp_dir.path().join("vibes.db"));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            logging_level: RequestsLoggingLevel::Path,
            ..cli_with_dir(&temp_dir)
        };
        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            ranking: Some(RankingConfig {
                default_track_limit: Some(5),
                allowed_divisions: Some(vec![1, 4, 9, 16, 25]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.ranking.default_track_limit, 5);
        assert_eq!(config.ranking.allowed_divisions, vec![1, 4, 9, 16, 25]);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.prune_interval_hours, 24);
        assert_eq!(config.ranking.per_cell_track_limit, 2);
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            read_pool_size: 1,
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_rejects_non_square_divisions() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            ranking: Some(RankingConfig {
                allowed_divisions: Some(vec![4, 6]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("perfect squares"));
    }

    #[test]
    fn test_resolve_rejects_zero_pool() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            read_pool_size: 0,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_pruning_can_be_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            event_retention_days: 0,
            prune_interval_hours: 0,
            ..cli_with_dir(&temp_dir)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.event_retention_days, 0);
    }

    #[test]
    fn test_resolve_rejects_retention_shorter_than_window() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            event_retention_days: 3,
            ..cli_with_dir(&temp_dir)
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("shorter than default_window_days"));

        // Exactly the window is fine, and so is no pruning at all
        let cli = CliConfig {
            event_retention_days: 7,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_ok());
        let cli = CliConfig {
            event_retention_days: 0,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_ok());

        let file_config = FileConfig {
            ranking: Some(RankingConfig {
                default_window_days: Some(60.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config)).is_err());
    }

    #[test]
    fn test_resolve_rejects_huge_pruning_values() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            prune_interval_hours: u64::MAX,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());

        let cli = CliConfig {
            event_retention_days: u64::MAX,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }
}
