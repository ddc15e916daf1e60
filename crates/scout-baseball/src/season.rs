// Season-level batting records and the fixed batted-ball metric set.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// The offensive metrics every record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    ExitVelocity,
    LaunchAngle,
    BarrelRate,
    HardHitRate,
    Xwoba,
    Xba,
    Xslg,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::ExitVelocity,
        Metric::LaunchAngle,
        Metric::BarrelRate,
        Metric::HardHitRate,
        Metric::Xwoba,
        Metric::Xba,
        Metric::Xslg,
    ];

    /// Expected-outcome metrics used by the never-elite eligibility rule.
    pub const EXPECTED: [Metric; 3] = [Metric::Xwoba, Metric::Xba, Metric::Xslg];

    /// Column name used in every input and output table.
    pub fn column(self) -> &'static str {
        match self {
            Metric::ExitVelocity => "exit_velocity_avg",
            Metric::LaunchAngle => "launch_angle_avg",
            Metric::BarrelRate => "barrel_batted_rate",
            Metric::HardHitRate => "hard_hit_percent",
            Metric::Xwoba => "xwoba",
            Metric::Xba => "xba",
            Metric::Xslg => "xslg",
        }
    }

    /// Human-readable label for displays.
    pub fn label(self) -> &'static str {
        match self {
            Metric::ExitVelocity => "Avg Exit Velocity (mph)",
            Metric::LaunchAngle => "Avg Launch Angle (°)",
            Metric::BarrelRate => "Barrel Rate (%)",
            Metric::HardHitRate => "Hard Hit %",
            Metric::Xwoba => "xwOBA",
            Metric::Xba => "xBA",
            Metric::Xslg => "xSLG",
        }
    }

    /// Position within [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_column(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.column() == name)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One value per [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricVector {
    pub exit_velocity_avg: f64,
    pub launch_angle_avg: f64,
    pub barrel_batted_rate: f64,
    pub hard_hit_percent: f64,
    pub xwoba: f64,
    pub xba: f64,
    pub xslg: f64,
}

impl MetricVector {
    /// Build a vector by evaluating `f` once per metric.
    pub fn from_fn(mut f: impl FnMut(Metric) -> f64) -> Self {
        Self {
            exit_velocity_avg: f(Metric::ExitVelocity),
            launch_angle_avg: f(Metric::LaunchAngle),
            barrel_batted_rate: f(Metric::BarrelRate),
            hard_hit_percent: f(Metric::HardHitRate),
            xwoba: f(Metric::Xwoba),
            xba: f(Metric::Xba),
            xslg: f(Metric::Xslg),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ExitVelocity => self.exit_velocity_avg,
            Metric::LaunchAngle => self.launch_angle_avg,
            Metric::BarrelRate => self.barrel_batted_rate,
            Metric::HardHitRate => self.hard_hit_percent,
            Metric::Xwoba => self.xwoba,
            Metric::Xba => self.xba,
            Metric::Xslg => self.xslg,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::ExitVelocity => self.exit_velocity_avg = value,
            Metric::LaunchAngle => self.launch_angle_avg = value,
            Metric::BarrelRate => self.barrel_batted_rate = value,
            Metric::HardHitRate => self.hard_hit_percent = value,
            Metric::Xwoba => self.xwoba = value,
            Metric::Xba => self.xba = value,
            Metric::Xslg => self.xslg = value,
        }
    }

    pub fn values(&self) -> [f64; 7] {
        Metric::ALL.map(|m| self.get(m))
    }

    /// Unweighted arithmetic mean across all metrics.
    pub fn mean(&self) -> f64 {
        self.values().iter().sum::<f64>() / Metric::ALL.len() as f64
    }

    pub fn add(&self, other: &MetricVector) -> MetricVector {
        MetricVector::from_fn(|m| self.get(m) + other.get(m))
    }

    pub fn sub(&self, other: &MetricVector) -> MetricVector {
        MetricVector::from_fn(|m| self.get(m) - other.get(m))
    }

    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Season records
// ---------------------------------------------------------------------------

/// One player's batted-ball profile for one season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRecord {
    pub player_id: String,
    /// "Last, First" form, as the Statcast exports spell it.
    pub name: String,
    pub year: i32,
    pub age: Option<f64>,
    pub metrics: MetricVector,
}

/// The unified season-level table: at most one row per (player, year).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonTable {
    rows: Vec<SeasonRecord>,
}

impl SeasonTable {
    /// Build a table, sorting by (player id, year) and keeping the first row
    /// for any duplicated (player id, year) key.
    pub fn new(mut rows: Vec<SeasonRecord>) -> Self {
        rows.sort_by(|a, b| a.player_id.cmp(&b.player_id).then(a.year.cmp(&b.year)));
        let mut seen: HashSet<(String, i32)> = HashSet::new();
        let before = rows.len();
        rows.retain(|r| seen.insert((r.player_id.clone(), r.year)));
        if rows.len() < before {
            tracing::debug!("dropped {} duplicate (player, year) rows", before - rows.len());
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[SeasonRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows grouped by player id, each group in ascending year order.
    pub fn by_player(&self) -> BTreeMap<&str, Vec<&SeasonRecord>> {
        let mut groups: BTreeMap<&str, Vec<&SeasonRecord>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.player_id.as_str()).or_default().push(row);
        }
        groups
    }

    /// A player's full history in ascending year order.
    pub fn history(&self, player_id: &str) -> Vec<&SeasonRecord> {
        self.rows.iter().filter(|r| r.player_id == player_id).collect()
    }

    /// Keep only rows whose player id is in `ids`.
    pub fn retain_players(&self, ids: &HashSet<&str>) -> SeasonTable {
        SeasonTable {
            rows: self
                .rows
                .iter()
                .filter(|r| ids.contains(r.player_id.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Keep only rows whose season is strictly before `year`.
    pub fn before_year(&self, year: i32) -> SeasonTable {
        SeasonTable {
            rows: self.rows.iter().filter(|r| r.year < year).cloned().collect(),
        }
    }
}

/// Convert "Last, First" into "First Last". Names without a comma are
/// returned unchanged.
pub fn first_last_name(name: &str) -> String {
    let parts: Vec<&str> = name.split(", ").collect();
    parts.into_iter().rev().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
