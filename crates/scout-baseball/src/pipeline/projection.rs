// Multi-year projections from the matched established player's career.
//
// Trajectory replay: deltas measured from the matched player's second
// calendar season are accumulated onto the candidate's current profile.
// Short careers are padded by repeating the last delta; careers without a
// usable baseline fall back to the final year-over-year change; a
// single-season career projects flat.
//
// Regression: an independent least-squares line (year -> value) per metric
// through the matched player's full career.

use std::fmt;

use scout_core::config::ProjectionConfig;
use tracing::{debug, info, warn};

use crate::pipeline::matching::best_match;
use crate::pipeline::reference::ReferencePool;
use crate::pipeline::scoring::ScoreRecord;
use crate::season::{Metric, MetricVector, SeasonRecord, SeasonTable};
use crate::stats::LinearFit;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionMethod {
    TrajectoryReplay,
    Regression,
}

impl ProjectionMethod {
    pub const ALL: [ProjectionMethod; 2] =
        [ProjectionMethod::TrajectoryReplay, ProjectionMethod::Regression];

    pub fn label(self) -> &'static str {
        match self {
            ProjectionMethod::TrajectoryReplay => "Historical",
            ProjectionMethod::Regression => "Regression",
        }
    }
}

impl fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSeason {
    pub year: i32,
    pub metrics: MetricVector,
}

/// Future seasons for one candidate under one method.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSeries {
    pub player_id: String,
    pub name: String,
    pub match_name: String,
    pub method: ProjectionMethod,
    pub seasons: Vec<ProjectedSeason>,
}

/// A matched and projected candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProjection {
    pub player_id: String,
    pub name: String,
    pub match_id: String,
    pub match_name: String,
    pub rank_sum: usize,
    pub trajectory: ProjectionSeries,
    /// Absent when the matched player has fewer than two seasons.
    pub regression: Option<ProjectionSeries>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("reference pool is empty")]
    NoReferencePlayers,

    #[error("matched player {0} has no season history")]
    MissingHistory(String),

    #[error("{method} projection produced a non-finite value")]
    NonFinite { method: ProjectionMethod },
}

/// Per-candidate result of matching and projection.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Projected(CandidateProjection),
    Skipped {
        player_id: String,
        name: String,
        reason: SkipReason,
    },
}

impl CandidateOutcome {
    pub fn player_id(&self) -> &str {
        match self {
            CandidateOutcome::Projected(p) => &p.player_id,
            CandidateOutcome::Skipped { player_id, .. } => player_id,
        }
    }

    pub fn projection(&self) -> Option<&CandidateProjection> {
        match self {
            CandidateOutcome::Projected(p) => Some(p),
            CandidateOutcome::Skipped { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trajectory replay
// ---------------------------------------------------------------------------

/// Per-year deltas to accumulate onto the candidate, exactly `horizon` long.
///
/// `history` must be in ascending year order.
pub fn trajectory_deltas(history: &[&SeasonRecord], horizon: usize) -> Vec<MetricVector> {
    let Some(first) = history.first() else {
        return vec![MetricVector::default(); horizon];
    };
    let base_year = first.year + 1;
    let baseline = history.iter().find(|s| s.year == base_year);
    let later: Vec<&SeasonRecord> = history
        .iter()
        .copied()
        .filter(|s| s.year > base_year)
        .collect();

    if let (Some(base), false) = (baseline, later.is_empty()) {
        let mut deltas: Vec<MetricVector> =
            later.iter().map(|s| s.metrics.sub(&base.metrics)).collect();
        if let Some(&last) = deltas.last() {
            deltas.resize(horizon.max(deltas.len()), last);
        }
        deltas.truncate(horizon);
        return deltas;
    }

    match history.windows(2).last() {
        Some(pair) => vec![pair[1].metrics.sub(&pair[0].metrics); horizon],
        None => vec![MetricVector::default(); horizon],
    }
}

/// Accumulate trajectory deltas onto `current`, one season per year.
pub fn trajectory_replay(
    current: &MetricVector,
    history: &[&SeasonRecord],
    years: &[i32],
) -> Vec<ProjectedSeason> {
    let deltas = trajectory_deltas(history, years.len());
    let mut running = *current;
    years
        .iter()
        .zip(deltas)
        .map(|(&year, delta)| {
            running = running.add(&delta);
            ProjectedSeason {
                year,
                metrics: running,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

/// Per-metric least-squares projection. `None` unless the history holds at
/// least two distinct seasons; a [`SeasonTable`] history always has distinct
/// years, so two rows are enough.
pub fn regression_projection(history: &[&SeasonRecord], years: &[i32]) -> Option<Vec<ProjectedSeason>> {
    let mut fits = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let points: Vec<(f64, f64)> = history
            .iter()
            .map(|s| (f64::from(s.year), s.metrics.get(metric)))
            .collect();
        fits.push(LinearFit::fit(&points)?);
    }

    Some(
        years
            .iter()
            .map(|&year| ProjectedSeason {
                year,
                metrics: MetricVector::from_fn(|m| fits[m.index()].predict(f64::from(year))),
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Per-candidate driver
// ---------------------------------------------------------------------------

fn ensure_finite(seasons: &[ProjectedSeason], method: ProjectionMethod) -> Result<(), SkipReason> {
    if seasons.iter().all(|s| s.metrics.is_finite()) {
        Ok(())
    } else {
        Err(SkipReason::NonFinite { method })
    }
}

/// Match one candidate and build both projections.
pub fn project_candidate(
    score: &ScoreRecord,
    pool: &ReferencePool,
    seasons: &SeasonTable,
    config: &ProjectionConfig,
) -> Result<CandidateProjection, SkipReason> {
    let profile = &score.profile;
    let matched = best_match(&profile.metrics, pool).ok_or(SkipReason::NoReferencePlayers)?;
    let match_id = matched.season.player_id.clone();
    let match_name = matched.season.name.clone();

    let history = seasons.history(&match_id);
    if history.is_empty() {
        return Err(SkipReason::MissingHistory(match_id));
    }
    debug!(
        "{} matched {} (rank sum {}, {} seasons)",
        profile.name,
        match_name,
        matched.rank_sum,
        history.len()
    );

    let years = config.years();

    let replay = trajectory_replay(&profile.metrics, &history, &years);
    ensure_finite(&replay, ProjectionMethod::TrajectoryReplay)?;

    let regression = regression_projection(&history, &years);
    if let Some(reg) = &regression {
        ensure_finite(reg, ProjectionMethod::Regression)?;
    }

    let series = |method, seasons| ProjectionSeries {
        player_id: profile.player_id.clone(),
        name: profile.name.clone(),
        match_name: match_name.clone(),
        method,
        seasons,
    };

    Ok(CandidateProjection {
        player_id: profile.player_id.clone(),
        name: profile.name.clone(),
        match_id: match_id.clone(),
        match_name: match_name.clone(),
        rank_sum: matched.rank_sum,
        trajectory: series(ProjectionMethod::TrajectoryReplay, replay),
        regression: regression.map(|r| series(ProjectionMethod::Regression, r)),
    })
}

/// Match and project every candidate. A failure for one candidate becomes a
/// `Skipped` outcome; the rest are still processed.
pub fn match_and_project(
    scores: &[ScoreRecord],
    pool: &ReferencePool,
    seasons: &SeasonTable,
    config: &ProjectionConfig,
) -> Vec<CandidateOutcome> {
    let outcomes: Vec<CandidateOutcome> = scores
        .iter()
        .map(|score| match project_candidate(score, pool, seasons, config) {
            Ok(projection) => CandidateOutcome::Projected(projection),
            Err(reason) => {
                warn!(
                    "skipping candidate {} ({}): {reason}",
                    score.profile.name, score.profile.player_id
                );
                CandidateOutcome::Skipped {
                    player_id: score.profile.player_id.clone(),
                    name: score.profile.name.clone(),
                    reason,
                }
            }
        })
        .collect();

    let projected = outcomes.iter().filter(|o| o.projection().is_some()).count();
    info!(
        "projected {projected} of {} candidates ({} skipped)",
        outcomes.len(),
        outcomes.len() - projected
    );
    outcomes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
