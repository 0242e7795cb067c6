use super::RequestsLoggingLevel;
use crate::ranking::RankingSettings;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Cache-Control max-age for trending query responses. 0 disables it.
    pub response_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub ranking: RankingSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            response_cache_age_sec: 60,
            frontend_dir_path: None,
            ranking: RankingSettings::default(),
        }
    }
}
