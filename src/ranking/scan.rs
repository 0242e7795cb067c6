use std::time::Duration;

use tracing::{debug, info};

use super::models::{CellRanking, RankLimits};
use super::ranker::VibeRanker;
use crate::error::VibeResult;
use crate::geo::{diagonal_miles, BoundingBox, GridPartitioner, GridSpec};

/// Splits a region into a grid and ranks every cell.
#[derive(Clone)]
pub struct ScanOrchestrator {
    ranker: VibeRanker,
}

impl ScanOrchestrator {
    pub fn new(ranker: VibeRanker) -> Self {
        ScanOrchestrator { ranker }
    }

    pub fn scan(
        &self,
        region: &BoundingBox,
        grid: GridSpec,
        window: Duration,
        limits: &RankLimits,
    ) -> VibeResult<Vec<CellRanking>> {
        self.scan_at(
            region,
            grid,
            window,
            limits,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Cells come back in partition order; cells without any event in the
    /// window are left out. The first store failure aborts the whole scan.
    pub fn scan_at(
        &self,
        region: &BoundingBox,
        grid: GridSpec,
        window: Duration,
        limits: &RankLimits,
        now: i64,
    ) -> VibeResult<Vec<CellRanking>> {
        info!(
            "Scanning {} ({:.2} mi diagonal) in {} cells",
            region,
            diagonal_miles(region),
            grid.divisions()
        );

        let mut results = Vec::new();
        for (cell_index, cell) in GridPartitioner::partition_spec(*region, grid).enumerate() {
            let ranking = self.ranker.rank_at(&cell, window, limits, now)?;
            if ranking.is_empty() {
                debug!("Cell {} {} is empty", cell_index, cell);
                continue;
            }
            results.push(CellRanking {
                cell_index,
                cell,
                genres: ranking.genres,
                tracks: ranking.tracks,
            });
        }
        Ok(results)
    }
}
