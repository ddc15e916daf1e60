// Small statistics toolkit: pool stats, z-scores, percentiles, ranks, OLS.

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Location and spread of one metric over the reference seasons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Spreads at or below this are treated as a constant column. Also the
/// minimum `Σ(x - x̄)²` accepted by [`LinearFit::fit`].
const STDEV_EPSILON: f64 = 1e-9;

/// Population mean and standard deviation (divides by N: the reference pool
/// is the whole comparison universe, not a sample of it). An empty slice
/// gives all zeros.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    PoolStats {
        mean,
        stdev: (sum_sq / n).sqrt(),
    }
}

/// Center `value` on the pool mean and scale by the pool spread.
///
/// A constant column keeps unit scale, giving `value - mean`, so a candidate
/// who differs from every reference season on that metric is still measured
/// as different.
pub fn standardize(value: f64, stats: &PoolStats) -> f64 {
    let scale = if stats.stdev <= STDEV_EPSILON {
        1.0
    } else {
        stats.stdev
    };
    (value - stats.mean) / scale
}

// ---------------------------------------------------------------------------
// Percentiles
// ---------------------------------------------------------------------------

/// Percentile by linear interpolation between closest ranks, `q` in [0, 1].
///
/// The position is `q * (n - 1)` over the sorted values, so the 95th
/// percentile of 1..=20 is 19.05. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Competition ("1224") ranking in ascending order: equal values share the
/// smallest rank of their group. Ranks start at 1 and are returned in the
/// input order.
pub fn competition_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0; values.len()];
    let mut group_rank = 1;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && values[idx] != values[order[pos - 1]] {
            group_rank = pos + 1;
        }
        ranks[idx] = group_rank;
    }
    ranks
}

// ---------------------------------------------------------------------------
// Linear regression
// ---------------------------------------------------------------------------

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line through the given points. Returns `None` with fewer than
    /// two points or when every `x` is identical.
    pub fn fit(points: &[(f64, f64)]) -> Option<LinearFit> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
        if sxx < STDEV_EPSILON {
            return None;
        }
        let sxy: f64 = points
            .iter()
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();

        let slope = sxy / sxx;
        Some(LinearFit {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
