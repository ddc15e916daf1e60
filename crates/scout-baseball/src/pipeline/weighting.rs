// Recency-weighted aggregation of a player's recent seasons.

use scout_core::config::YearWeights;
use tracing::{debug, info};

use crate::season::{MetricVector, SeasonRecord, SeasonTable};

/// One aggregated feature vector per eligible player.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub player_id: String,
    pub name: String,
    pub metrics: MetricVector,
}

/// Normalized weight per weighted season: `weight / Σ weight` over the
/// seasons that appear in `weights`. Empty when no season is weighted.
pub fn weight_ratios(seasons: &[&SeasonRecord], weights: &YearWeights) -> Vec<(i32, f64)> {
    let weighted: Vec<(i32, f64)> = seasons
        .iter()
        .filter_map(|s| weights.get(s.year).map(|w| (s.year, w)))
        .collect();
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    weighted.into_iter().map(|(y, w)| (y, w / total)).collect()
}

/// Collapse each player's seasons into a single weighted profile.
///
/// Only seasons listed in `weights` count. A player with one weighted season
/// keeps that season's values unchanged; players with none are dropped.
/// Output is ordered by player id.
pub fn weighted_profiles(table: &SeasonTable, weights: &YearWeights) -> Vec<CandidateProfile> {
    let mut profiles = Vec::new();

    for (player_id, seasons) in table.by_player() {
        let ratios = weight_ratios(&seasons, weights);
        if ratios.is_empty() {
            debug!("player {player_id} has no weighted seasons, dropping");
            continue;
        }

        let weighted: Vec<&SeasonRecord> = seasons
            .iter()
            .copied()
            .filter(|s| weights.contains(s.year))
            .collect();

        let metrics = MetricVector::from_fn(|metric| {
            weighted
                .iter()
                .zip(&ratios)
                .map(|(season, (_, ratio))| season.metrics.get(metric) * ratio)
                .sum()
        });

        profiles.push(CandidateProfile {
            player_id: player_id.to_string(),
            name: weighted[0].name.clone(),
            metrics,
        });
    }

    info!("aggregated {} candidate profiles", profiles.len());
    profiles
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
