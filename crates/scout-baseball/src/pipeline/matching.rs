// Rank-sum nearest established player.
//
// For each metric, every reference season is ranked by its absolute
// difference from the candidate (competition ranking, 1 = closest). The
// season with the smallest rank total across all metrics is the match.

use crate::pipeline::reference::ReferencePool;
use crate::season::{Metric, MetricVector, SeasonRecord};
use crate::stats::competition_ranks;

/// The winning reference season and its rank total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMatch<'a> {
    pub season: &'a SeasonRecord,
    pub rank_sum: usize,
}

/// Rank totals for every pool row, in pool order.
pub fn rank_sums(candidate: &MetricVector, pool: &ReferencePool) -> Vec<usize> {
    let mut totals = vec![0usize; pool.len()];
    for metric in Metric::ALL {
        let target = candidate.get(metric);
        let diffs: Vec<f64> = pool
            .rows()
            .iter()
            .map(|r| (r.metrics.get(metric) - target).abs())
            .collect();
        for (total, rank) in totals.iter_mut().zip(competition_ranks(&diffs)) {
            *total += rank;
        }
    }
    totals
}

/// The closest reference season, ties going to the earliest in pool order.
/// `None` only when the pool is empty.
pub fn best_match<'a>(candidate: &MetricVector, pool: &'a ReferencePool) -> Option<RankedMatch<'a>> {
    let totals = rank_sums(candidate, pool);
    let (idx, &rank_sum) = totals
        .iter()
        .enumerate()
        .min_by_key(|&(i, &total)| (total, i))?;
    Some(RankedMatch {
        season: &pool.rows()[idx],
        rank_sum,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str, metrics: MetricVector) -> SeasonRecord {
        SeasonRecord {
            player_id: id.into(),
            name: name.into(),
            year: 2019,
            age: Some(28.0),
            metrics,
        }
    }

    fn vector(ev: f64, xwoba: f64) -> MetricVector {
        MetricVector {
            exit_velocity_avg: ev,
            launch_angle_avg: 12.0,
            barrel_batted_rate: 8.0,
            hard_hit_percent: 40.0,
            xwoba,
            xba: 0.250,
            xslg: 0.420,
        }
    }

    fn pool() -> ReferencePool {
        ReferencePool::from(vec![
            row("1", "Alpha, A", vector(88.0, 0.300)),
            row("2", "Bravo, B", vector(91.0, 0.340)),
            row("3", "Charlie, C", vector(94.0, 0.380)),
        ])
    }

    #[test]
    fn identical_candidate_gets_minimum_rank_sum() {
        let pool = pool();
        let candidate = vector(91.0, 0.340);
        let m = best_match(&candidate, &pool).unwrap();
        assert_eq!(m.season.player_id, "2");
        assert_eq!(m.rank_sum, Metric::ALL.len());
    }

    #[test]
    fn shared_ranks_for_equal_differences() {
        // Metrics 2-4 and xba/xslg tie across the pool (all rank 1); exit
        // velocity and xwOBA separate the players.
        let totals = rank_sums(&vector(89.0, 0.310), &pool());
        assert_eq!(totals, vec![7, 9, 11]);
    }

    #[test]
    fn ties_go_to_pool_order() {
        let pool = ReferencePool::from(vec![
            row("9", "Zulu, Z", vector(90.0, 0.320)),
            row("8", "Echo, E", vector(90.0, 0.320)),
        ]);
        let m = best_match(&vector(90.0, 0.320), &pool).unwrap();
        assert_eq!(m.season.name, "Echo, E");
    }

    #[test]
    fn empty_pool_has_no_match() {
        assert!(best_match(&vector(90.0, 0.3), &ReferencePool::default()).is_none());
    }
}
