// Superstar similarity, breakout score and breakout index.
//
// The elite threshold is the per-metric percentile of the reference pool.
// Candidates and the threshold are standardized with the pool's mean and
// standard deviation; similarity is the negative Euclidean distance between
// them in that space. A metric that is constant across the pool is only
// centered, not scaled.

use scout_core::config::{ScoringConfig, ThresholdScope};
use tracing::info;

use crate::pipeline::reference::ReferencePool;
use crate::pipeline::weighting::CandidateProfile;
use crate::season::{Metric, MetricVector, SeasonRecord};
use crate::stats::{compute_pool_stats, percentile, standardize, PoolStats};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScoringError {
    #[error("reference pool is empty; nothing to score candidates against")]
    EmptyReferencePool,

    #[error("reference pool has no rows for threshold season {0}")]
    EmptyThresholdSeason(i32),
}

/// A candidate profile with its derived scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub profile: CandidateProfile,
    /// Negative standardized distance to the elite threshold; 0 is elite.
    pub similarity: f64,
    /// Mean of the raw metric vector.
    pub performance: f64,
    pub composite: f64,
    /// Name of the matched established player, filled in after matching.
    pub matched_player: Option<String>,
}

/// Per-metric pool statistics used to standardize vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    stats: [PoolStats; 7],
}

impl Standardizer {
    pub fn fit(rows: &[&MetricVector]) -> Self {
        let stats = Metric::ALL.map(|metric| {
            let values: Vec<f64> = rows.iter().map(|v| v.get(metric)).collect();
            compute_pool_stats(&values)
        });
        Self { stats }
    }

    pub fn stats(&self, metric: Metric) -> PoolStats {
        self.stats[metric.index()]
    }

    pub fn transform(&self, vector: &MetricVector) -> MetricVector {
        MetricVector::from_fn(|metric| standardize(vector.get(metric), &self.stats(metric)))
    }
}

/// Per-metric elite threshold over the rows selected by `scope`.
pub fn elite_threshold(
    pool: &ReferencePool,
    scope: ThresholdScope,
    q: f64,
) -> Result<MetricVector, ScoringError> {
    let rows: Vec<&SeasonRecord> = match scope {
        ThresholdScope::Pool => pool.rows().iter().collect(),
        ThresholdScope::Season(year) => pool.season_rows(year),
    };
    if rows.is_empty() {
        return Err(match scope {
            ThresholdScope::Pool => ScoringError::EmptyReferencePool,
            ThresholdScope::Season(year) => ScoringError::EmptyThresholdSeason(year),
        });
    }

    Ok(MetricVector::from_fn(|metric| {
        let values: Vec<f64> = rows.iter().map(|r| r.metrics.get(metric)).collect();
        percentile(&values, q).unwrap_or_default()
    }))
}

fn euclidean_distance(a: &MetricVector, b: &MetricVector) -> f64 {
    Metric::ALL
        .iter()
        .map(|&m| (a.get(m) - b.get(m)).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Score every candidate against the reference pool. An empty candidate list
/// yields an empty result without touching the pool.
pub fn score_candidates(
    profiles: &[CandidateProfile],
    pool: &ReferencePool,
    config: &ScoringConfig,
    elite_percentile: f64,
) -> Result<Vec<ScoreRecord>, ScoringError> {
    if profiles.is_empty() {
        return Ok(Vec::new());
    }
    if pool.is_empty() {
        return Err(ScoringError::EmptyReferencePool);
    }

    let threshold = elite_threshold(pool, config.threshold_scope, elite_percentile)?;
    let pool_vectors: Vec<&MetricVector> = pool.rows().iter().map(|r| &r.metrics).collect();
    let scaler = Standardizer::fit(&pool_vectors);
    let threshold_scaled = scaler.transform(&threshold);

    let scores: Vec<ScoreRecord> = profiles
        .iter()
        .map(|profile| {
            let scaled = scaler.transform(&profile.metrics);
            let similarity = -euclidean_distance(&scaled, &threshold_scaled);
            let performance = profile.metrics.mean();
            ScoreRecord {
                profile: profile.clone(),
                similarity,
                performance,
                composite: config.performance_weight * performance
                    + config.similarity_weight * similarity,
                matched_player: None,
            }
        })
        .collect();

    info!("scored {} candidates", scores.len());
    Ok(scores)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn row(id: &str, year: i32, value: f64) -> SeasonRecord {
        SeasonRecord {
            player_id: id.into(),
            name: format!("Ref, {id}"),
            year,
            age: Some(29.0),
            metrics: MetricVector::from_fn(|_| value),
        }
    }

    /// Twenty reference seasons with every metric equal to 1..=20.
    fn pool_1_to_20() -> ReferencePool {
        ReferencePool::from(
            (1..=20)
                .map(|i| row(&format!("r{i:02}"), 2015 + (i % 4), f64::from(i)))
                .collect::<Vec<_>>(),
        )
    }

    fn profile(id: &str, value: f64) -> CandidateProfile {
        CandidateProfile {
            player_id: id.into(),
            name: format!("Kid, {id}"),
            metrics: MetricVector::from_fn(|_| value),
        }
    }

    #[test]
    fn pool_threshold_is_interpolated_95th_percentile() {
        let threshold = elite_threshold(&pool_1_to_20(), ThresholdScope::Pool, 0.95).unwrap();
        for metric in Metric::ALL {
            assert!((threshold.get(metric) - 19.05).abs() < EPS);
        }
    }

    #[test]
    fn season_threshold_uses_one_season() {
        let pool = pool_1_to_20();
        // i % 4 == 0 -> 2015: values 4, 8, 12, 16, 20.
        let threshold = elite_threshold(&pool, ThresholdScope::Season(2015), 0.95).unwrap();
        assert!((threshold.xwoba - 19.2).abs() < EPS);
        assert_eq!(
            elite_threshold(&pool, ThresholdScope::Season(1999), 0.95),
            Err(ScoringError::EmptyThresholdSeason(1999))
        );
    }

    #[test]
    fn standardizer_matches_population_zscores() {
        let a = MetricVector::from_fn(|_| 1.0);
        let b = MetricVector::from_fn(|_| 3.0);
        let scaler = Standardizer::fit(&[&a, &b]);
        let z = scaler.transform(&b);
        assert!((z.xslg - 1.0).abs() < EPS);
        assert!((scaler.stats(Metric::Xba).mean - 2.0).abs() < EPS);
    }

    #[test]
    fn candidate_at_threshold_has_zero_similarity() {
        let scores = score_candidates(
            &[profile("star", 19.05), profile("mid", 10.0)],
            &pool_1_to_20(),
            &ScoringConfig::default(),
            0.95,
        )
        .unwrap();
        assert!(scores[0].similarity.abs() < EPS);
        assert!(scores[1].similarity < scores[0].similarity);
    }

    #[test]
    fn performance_and_composite_blend() {
        let scores = score_candidates(
            &[profile("mid", 10.0)],
            &pool_1_to_20(),
            &ScoringConfig::default(),
            0.95,
        )
        .unwrap();
        let s = &scores[0];
        assert!((s.performance - 10.0).abs() < EPS);
        assert!((s.composite - (0.7 * s.performance + 0.3 * s.similarity)).abs() < EPS);
        assert!(s.matched_player.is_none());

        // Seven metrics each (10 - 19.05) / stdev apart.
        let stdev = scorer_stdev();
        let expected = -((7.0_f64).sqrt() * (19.05 - 10.0) / stdev);
        assert!((s.similarity - expected).abs() < 1e-9);
    }

    fn scorer_stdev() -> f64 {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        compute_pool_stats(&values).stdev
    }

    #[test]
    fn constant_pool_metric_still_separates_candidates() {
        // Launch angle is 12.0 in every reference season; the rest run 1..=20.
        let pool = ReferencePool::from(
            (1..=20)
                .map(|i| {
                    let mut r = row(&format!("r{i:02}"), 2018, f64::from(i));
                    r.metrics.launch_angle_avg = 12.0;
                    r
                })
                .collect::<Vec<_>>(),
        );
        let at_threshold = |launch_angle: f64| {
            let mut p = profile("kid", 19.05);
            p.metrics.launch_angle_avg = launch_angle;
            p
        };

        let scores = score_candidates(
            &[at_threshold(12.0), at_threshold(40.0)],
            &pool,
            &ScoringConfig::default(),
            0.95,
        )
        .unwrap();
        assert!(scores[0].similarity.abs() < 1e-9);
        assert!((scores[1].similarity + 28.0).abs() < 1e-9);
    }

    #[test]
    fn empty_candidates_give_empty_scores_even_without_pool() {
        let scores = score_candidates(
            &[],
            &ReferencePool::default(),
            &ScoringConfig::default(),
            0.95,
        )
        .unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn empty_pool_with_candidates_is_an_error() {
        let err = score_candidates(
            &[profile("a", 1.0)],
            &ReferencePool::default(),
            &ScoringConfig::default(),
            0.95,
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::EmptyReferencePool);
    }
}
