mod models;
mod ranker;
mod request;
mod scan;

pub use models::*;
pub use ranker::{rank_rows, VibeRanker};
pub use request::{RankingSettings, ScanRequest, VibeQuery};
pub use scan::ScanOrchestrator;
