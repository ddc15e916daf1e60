// Breakout pipeline: eligibility, weighting, reference pool, scoring,
// matching and projection, run in order over one in-memory season table.

pub mod eligibility;
pub mod matching;
pub mod projection;
pub mod reference;
pub mod scoring;
pub mod weighting;

use std::collections::HashMap;

use scout_core::config::Config;
use serde::Serialize;
use tracing::info;

use self::projection::CandidateOutcome;
use self::scoring::{ScoreRecord, ScoringError};
use crate::season::SeasonTable;

/// Row counts per stage, written alongside the output tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub season_rows: usize,
    pub eligible_players: usize,
    pub eligible_rows: usize,
    pub candidates: usize,
    pub reference_players: usize,
    pub reference_rows: usize,
    pub projected: usize,
    pub skipped: usize,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Scored candidates in player-id order, annotated with their match.
    pub scores: Vec<ScoreRecord>,
    /// One outcome per score, same order.
    pub outcomes: Vec<CandidateOutcome>,
    pub summary: RunSummary,
}

impl PipelineOutput {
    pub fn projected(&self) -> impl Iterator<Item = &projection::CandidateProjection> {
        self.outcomes.iter().filter_map(CandidateOutcome::projection)
    }
}

/// Run every stage over `seasons`.
///
/// Deterministic: the same table and config always give the same output.
pub fn run(config: &Config, seasons: &SeasonTable) -> Result<PipelineOutput, ScoringError> {
    info!("pipeline start: {} season rows", seasons.len());

    let eligible = eligibility::filter_candidates(seasons, &config.eligibility);
    let profiles = weighting::weighted_profiles(&eligible, &config.weighting);
    let pool = reference::build_reference_pool(seasons, &config.reference);

    let mut scores = scoring::score_candidates(
        &profiles,
        &pool,
        &config.scoring,
        config.eligibility.elite_percentile,
    )?;

    let outcomes = projection::match_and_project(&scores, &pool, seasons, &config.projection);

    let matches: HashMap<&str, &str> = outcomes
        .iter()
        .filter_map(CandidateOutcome::projection)
        .map(|p| (p.player_id.as_str(), p.match_name.as_str()))
        .collect();
    for score in &mut scores {
        score.matched_player = matches
            .get(score.profile.player_id.as_str())
            .map(|name| name.to_string());
    }

    let projected = matches.len();
    let summary = RunSummary {
        season_rows: seasons.len(),
        eligible_players: eligible.by_player().len(),
        eligible_rows: eligible.len(),
        candidates: scores.len(),
        reference_players: pool.player_count(),
        reference_rows: pool.len(),
        projected,
        skipped: outcomes.len() - projected,
    };
    info!("pipeline done: {summary:?}");

    Ok(PipelineOutput {
        scores,
        outcomes,
        summary,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::{MetricVector, SeasonRecord};

    fn season(id: &str, name: &str, year: i32, age: f64, value: f64) -> SeasonRecord {
        SeasonRecord {
            player_id: id.into(),
            name: name.into(),
            year,
            age: Some(age),
            metrics: MetricVector::from_fn(|_| value),
        }
    }

    /// Five veterans with dense careers, five rookies (the best of whom is
    /// already elite) and one rookie too old to qualify.
    fn league() -> SeasonTable {
        let mut rows = Vec::new();
        for (i, id) in ["v1", "v2", "v3", "v4", "v5"].iter().enumerate() {
            let base = 0.25 + 0.02 * i as f64;
            for (k, year) in (2016..=2021).enumerate() {
                rows.push(season(
                    id,
                    &format!("Vet, {id}"),
                    year,
                    25.0 + k as f64,
                    base + 0.01 * k as f64,
                ));
            }
        }
        for (i, id) in ["r0", "r1", "r2", "r3", "r4"].iter().enumerate() {
            let base = 0.26 + 0.02 * i as f64;
            let name = format!("Rookie, {id}");
            rows.push(season(id, &name, 2023, 22.0, base));
            rows.push(season(id, &name, 2024, 23.0, base + 0.01));
        }
        rows.push(season("old", "Old, Rookie", 2024, 30.0, 0.29));
        SeasonTable::new(rows)
    }

    #[test]
    fn run_scores_and_projects_eligible_players() {
        let output = run(&Config::default(), &league()).unwrap();
        let ids: Vec<&str> = output
            .scores
            .iter()
            .map(|s| s.profile.player_id.as_str())
            .collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3"]);
        assert!(output.scores.iter().all(|s| s.matched_player.is_some()));
        assert_eq!(output.outcomes.len(), 4);
        assert_eq!(output.projected().count(), 4);

        let s = &output.summary;
        assert_eq!(s.season_rows, 41);
        assert_eq!(s.eligible_players, 4);
        assert_eq!(s.candidates, 4);
        assert_eq!(s.reference_players, 5);
        assert_eq!(s.reference_rows, 30);
        assert_eq!(s.skipped, 0);
    }

    #[test]
    fn run_is_deterministic() {
        let a = run(&Config::default(), &league()).unwrap();
        let b = run(&Config::default(), &league()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_table_gives_empty_output() {
        let output = run(&Config::default(), &SeasonTable::default()).unwrap();
        assert!(output.scores.is_empty());
        assert!(output.outcomes.is_empty());
        assert_eq!(output.summary, RunSummary::default());
    }
}
