// Breakout candidate eligibility: recent debut, age ceiling, never elite.

use std::collections::{BTreeMap, HashSet};

use scout_core::config::EligibilityConfig;
use tracing::{debug, info};

use crate::season::{Metric, SeasonRecord, SeasonTable};
use crate::stats::percentile;

/// Returns every season of every player who passes all three rules.
///
/// 1. First observed season is at or after `debut_cutoff_year`.
/// 2. Every known age is below `max_age` (all-unknown passes).
/// 3. No season at or above the `elite_percentile` threshold for xwOBA, xBA
///    or xSLG, where thresholds are computed per season over the players that
///    survived rules 1 and 2.
pub fn filter_candidates(table: &SeasonTable, rules: &EligibilityConfig) -> SeasonTable {
    let groups = table.by_player();

    let survivors: HashSet<&str> = groups
        .iter()
        .filter(|(_, seasons)| debuted_recently(seasons, rules.debut_cutoff_year))
        .filter(|(id, seasons)| {
            let ok = ages_below_ceiling(seasons, rules.max_age);
            if !ok {
                debug!("player {id} excluded by age ceiling");
            }
            ok
        })
        .map(|(id, _)| *id)
        .collect();
    let pre_elite = table.retain_players(&survivors);

    let elite = elite_players(&pre_elite, rules.elite_percentile);
    let eligible: HashSet<&str> = survivors
        .iter()
        .copied()
        .filter(|id| !elite.contains(*id))
        .collect();

    info!(
        "eligibility: {} players debuted recently under the age ceiling, {} disqualified as elite, {} eligible",
        survivors.len(),
        elite.len(),
        eligible.len()
    );

    table.retain_players(&eligible)
}

fn debuted_recently(seasons: &[&SeasonRecord], cutoff: i32) -> bool {
    seasons
        .iter()
        .map(|s| s.year)
        .min()
        .is_some_and(|first| first >= cutoff)
}

/// True when every known age is under the ceiling. Unknown ages are ignored,
/// so a player with no known age at all passes.
fn ages_below_ceiling(seasons: &[&SeasonRecord], max_age: f64) -> bool {
    seasons
        .iter()
        .filter_map(|s| s.age)
        .all(|age| age < max_age)
}

/// Player ids that reached the per-season elite threshold in any expected
/// metric.
fn elite_players(table: &SeasonTable, q: f64) -> HashSet<String> {
    let mut by_year: BTreeMap<i32, Vec<&SeasonRecord>> = BTreeMap::new();
    for row in table.rows() {
        by_year.entry(row.year).or_default().push(row);
    }

    let mut elite = HashSet::new();
    for (year, rows) in &by_year {
        for metric in Metric::EXPECTED {
            let values: Vec<f64> = rows.iter().map(|r| r.metrics.get(metric)).collect();
            let Some(threshold) = percentile(&values, q) else {
                continue;
            };
            for row in rows.iter().filter(|r| r.metrics.get(metric) >= threshold) {
                if elite.insert(row.player_id.clone()) {
                    debug!(
                        "player {} elite in {year} {metric} ({:.3} >= {threshold:.3})",
                        row.player_id,
                        row.metrics.get(metric)
                    );
                }
            }
        }
    }
    elite
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
