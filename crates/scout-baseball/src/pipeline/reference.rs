// Established-player reference pool.
//
// A player qualifies when some calendar window of `window_years` years,
// starting at one of their observed seasons, holds at least `min_seasons` of
// their seasons before the cutoff. Every pre-cutoff season of a qualifying
// player is kept, so later stages can replay full trajectories.

use std::collections::HashSet;

use scout_core::config::ReferenceConfig;
use tracing::info;

use crate::season::{SeasonRecord, SeasonTable};

/// Pre-cutoff season rows of established players, ordered by
/// (display name, year, player id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferencePool {
    rows: Vec<SeasonRecord>,
}

impl ReferencePool {
    pub fn rows(&self) -> &[SeasonRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.player_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Pool rows for a single season.
    pub fn season_rows(&self, year: i32) -> Vec<&SeasonRecord> {
        self.rows.iter().filter(|r| r.year == year).collect()
    }
}

impl From<Vec<SeasonRecord>> for ReferencePool {
    fn from(mut rows: Vec<SeasonRecord>) -> Self {
        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.year.cmp(&b.year))
                .then(a.player_id.cmp(&b.player_id))
        });
        Self { rows }
    }
}

/// True when some window `[y, y + width)` starting at an observed year holds
/// at least `min_seasons` distinct observed years.
pub fn has_dense_window(years: &[i32], width: i32, min_seasons: usize) -> bool {
    let mut sorted = years.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.iter().any(|&start| {
        sorted
            .iter()
            .filter(|&&y| y >= start && y < start + width)
            .count()
            >= min_seasons
    })
}

pub fn build_reference_pool(table: &SeasonTable, config: &ReferenceConfig) -> ReferencePool {
    let history = table.before_year(config.cutoff_year);

    let qualifying: HashSet<&str> = history
        .by_player()
        .into_iter()
        .filter(|(_, seasons)| {
            let years: Vec<i32> = seasons.iter().map(|s| s.year).collect();
            has_dense_window(&years, config.window_years, config.min_seasons)
        })
        .map(|(id, _)| id)
        .collect();

    let pool = ReferencePool::from(history.retain_players(&qualifying).rows().to_vec());
    info!(
        "reference pool: {} players, {} seasons before {}",
        pool.player_count(),
        pool.len(),
        config.cutoff_year
    );
    pool
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
