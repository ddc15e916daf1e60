// Season table loading from the batting, Statcast and supplemental age CSVs.
//
// The primary batting table is outer-merged with one pair of Statcast
// leaderboard exports per season (expected stats + exit velocity). Batting
// values win where both sides carry a metric; Statcast fills the gaps.
// Missing ages are then filled from per-season supplemental files keyed by
// "First Last" name.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use scout_core::config::DataPaths;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::season::{first_last_name, Metric, MetricVector, SeasonRecord, SeasonTable};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Anything that can hand the pipeline a complete season table.
pub trait SeasonSource {
    fn load_seasons(&self) -> Result<SeasonTable, LoadError>;
}

/// An already-built table is its own source.
impl SeasonSource for SeasonTable {
    fn load_seasons(&self) -> Result<SeasonTable, LoadError> {
        Ok(self.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing required column `{column}`")]
    MissingColumn { path: String, column: String },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

const NAME_COLUMN: &str = "last_name, first_name";

/// Primary batting table row. Metric columns are optional; Statcast files
/// fill whatever is absent.
#[derive(Debug, Deserialize)]
struct RawBattingRow {
    player_id: String,
    #[serde(rename = "last_name, first_name")]
    name: String,
    year: i32,
    #[serde(default)]
    player_age: Option<f64>,
    #[serde(default)]
    exit_velocity_avg: Option<f64>,
    #[serde(default)]
    launch_angle_avg: Option<f64>,
    #[serde(default)]
    barrel_batted_rate: Option<f64>,
    #[serde(default)]
    hard_hit_percent: Option<f64>,
    #[serde(default)]
    xwoba: Option<f64>,
    #[serde(default)]
    xba: Option<f64>,
    #[serde(default)]
    xslg: Option<f64>,
}

/// Statcast expected-stats leaderboard row.
#[derive(Debug, Deserialize)]
struct RawExpectedStats {
    player_id: String,
    #[serde(rename = "last_name, first_name")]
    name: String,
    est_woba: Option<f64>,
    est_ba: Option<f64>,
    est_slg: Option<f64>,
}

/// Statcast exit-velocity leaderboard row.
#[derive(Debug, Deserialize)]
struct RawExitVelocity {
    player_id: String,
    #[serde(rename = "last_name, first_name")]
    name: String,
    avg_hit_speed: Option<f64>,
    avg_hit_angle: Option<f64>,
    brl_percent: Option<f64>,
    ev95percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawAgeRow {
    Player: String,
    Age: Option<f64>,
}

// ---------------------------------------------------------------------------
// Partial rows (merge working state)
// ---------------------------------------------------------------------------

/// Merge key: (player id, year, display name).
type SeasonKey = (String, i32, String);

#[derive(Debug, Clone, Default)]
struct PartialSeason {
    age: Option<f64>,
    metrics: BTreeMap<Metric, f64>,
}

impl PartialSeason {
    fn put(&mut self, metric: Metric, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.metrics.insert(metric, v);
        }
    }

    /// Fill metrics (and age) this row is missing from `other`.
    fn fill_from(&mut self, other: &PartialSeason) {
        for (&metric, &value) in &other.metrics {
            self.metrics.entry(metric).or_insert(value);
        }
        if self.age.is_none() {
            self.age = other.age;
        }
    }

    fn complete(&self) -> Option<MetricVector> {
        let mut out = MetricVector::default();
        for metric in Metric::ALL {
            out.set(metric, *self.metrics.get(&metric)?);
        }
        Some(out)
    }
}

fn key(player_id: &str, year: i32, name: &str) -> SeasonKey {
    (player_id.trim().to_string(), year, name.trim().to_string())
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr)
}

fn require_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    label: &str,
    columns: &[&str],
) -> Result<(), LoadError> {
    let headers = reader.headers().map_err(|e| LoadError::Csv {
        path: label.to_string(),
        source: e,
    })?;
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(LoadError::MissingColumn {
                path: label.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn read_batting<R: Read>(
    rdr: R,
    label: &str,
) -> Result<Vec<(SeasonKey, PartialSeason)>, LoadError> {
    let mut reader = csv_reader(rdr);
    require_columns(&mut reader, label, &["player_id", NAME_COLUMN, "year"])?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawBattingRow>() {
        match result {
            Ok(raw) => {
                let mut partial = PartialSeason {
                    age: raw.player_age.filter(|a| a.is_finite()),
                    ..PartialSeason::default()
                };
                partial.put(Metric::ExitVelocity, raw.exit_velocity_avg);
                partial.put(Metric::LaunchAngle, raw.launch_angle_avg);
                partial.put(Metric::BarrelRate, raw.barrel_batted_rate);
                partial.put(Metric::HardHitRate, raw.hard_hit_percent);
                partial.put(Metric::Xwoba, raw.xwoba);
                partial.put(Metric::Xba, raw.xba);
                partial.put(Metric::Xslg, raw.xslg);
                rows.push((key(&raw.player_id, raw.year, &raw.name), partial));
            }
            Err(e) => warn!("skipping malformed batting row in {label}: {e}"),
        }
    }
    Ok(rows)
}

fn read_expected_stats<R: Read>(
    rdr: R,
    label: &str,
    year: i32,
) -> Result<Vec<(SeasonKey, PartialSeason)>, LoadError> {
    let mut reader = csv_reader(rdr);
    require_columns(
        &mut reader,
        label,
        &["player_id", NAME_COLUMN, "est_woba", "est_ba", "est_slg"],
    )?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawExpectedStats>() {
        match result {
            Ok(raw) => {
                let mut partial = PartialSeason::default();
                partial.put(Metric::Xwoba, raw.est_woba);
                partial.put(Metric::Xba, raw.est_ba);
                partial.put(Metric::Xslg, raw.est_slg);
                rows.push((key(&raw.player_id, year, &raw.name), partial));
            }
            Err(e) => warn!("skipping malformed expected-stats row in {label}: {e}"),
        }
    }
    Ok(rows)
}

fn read_exit_velocity<R: Read>(
    rdr: R,
    label: &str,
    year: i32,
) -> Result<Vec<(SeasonKey, PartialSeason)>, LoadError> {
    let mut reader = csv_reader(rdr);
    require_columns(
        &mut reader,
        label,
        &[
            "player_id",
            NAME_COLUMN,
            "avg_hit_speed",
            "avg_hit_angle",
            "brl_percent",
            "ev95percent",
        ],
    )?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawExitVelocity>() {
        match result {
            Ok(raw) => {
                let mut partial = PartialSeason::default();
                partial.put(Metric::ExitVelocity, raw.avg_hit_speed);
                partial.put(Metric::LaunchAngle, raw.avg_hit_angle);
                partial.put(Metric::BarrelRate, raw.brl_percent);
                partial.put(Metric::HardHitRate, raw.ev95percent);
                rows.push((key(&raw.player_id, year, &raw.name), partial));
            }
            Err(e) => warn!("skipping malformed exit-velocity row in {label}: {e}"),
        }
    }
    Ok(rows)
}

/// Returns ("First Last", year) -> age. The first entry wins on duplicates.
fn read_ages<R: Read>(
    rdr: R,
    label: &str,
    year: i32,
) -> Result<HashMap<(String, i32), f64>, LoadError> {
    let mut reader = csv_reader(rdr);
    require_columns(&mut reader, label, &["Player", "Age"])?;

    let mut ages = HashMap::new();
    for result in reader.deserialize::<RawAgeRow>() {
        match result {
            Ok(raw) => {
                let Some(age) = raw.Age.filter(|a| a.is_finite()) else {
                    continue;
                };
                ages.entry((raw.Player.trim().to_string(), year)).or_insert(age);
            }
            Err(e) => warn!("skipping malformed age row in {label}: {e}"),
        }
    }
    Ok(ages)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Accumulates partial rows into one row per merge key.
#[derive(Debug, Default)]
struct SeasonMerger {
    rows: BTreeMap<SeasonKey, PartialSeason>,
}

impl SeasonMerger {
    /// Insert rows, only filling values the existing row lacks.
    fn merge(&mut self, rows: Vec<(SeasonKey, PartialSeason)>) {
        for (key, partial) in rows {
            match self.rows.get_mut(&key) {
                Some(existing) => existing.fill_from(&partial),
                None => {
                    self.rows.insert(key, partial);
                }
            }
        }
    }

    fn fill_ages(&mut self, ages: &HashMap<(String, i32), f64>) {
        let mut filled = 0usize;
        for ((_, year, name), partial) in self.rows.iter_mut() {
            if partial.age.is_some() {
                continue;
            }
            if let Some(&age) = ages.get(&(first_last_name(name), *year)) {
                partial.age = Some(age);
                filled += 1;
            }
        }
        debug!("filled {filled} missing ages from supplemental data");
    }

    /// Drop incomplete rows and build the deduplicated season table.
    fn finish(self, require_age: bool) -> SeasonTable {
        let total = self.rows.len();
        let mut records = Vec::with_capacity(total);
        for ((player_id, year, name), partial) in self.rows {
            let Some(metrics) = partial.complete() else {
                continue;
            };
            if require_age && partial.age.is_none() {
                continue;
            }
            records.push(SeasonRecord {
                player_id,
                name,
                year,
                age: partial.age,
                metrics,
            });
        }
        info!(
            "kept {} of {} merged season rows after completeness filter",
            records.len(),
            total
        );
        SeasonTable::new(records)
    }
}

// ---------------------------------------------------------------------------
// CSV-backed source
// ---------------------------------------------------------------------------

/// Loads the season table from the files named in `[data]`, resolved
/// relative to `base_dir`.
#[derive(Debug, Clone)]
pub struct CsvSeasonSource {
    paths: DataPaths,
    base_dir: PathBuf,
}

impl CsvSeasonSource {
    pub fn new(paths: DataPaths, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            base_dir: base_dir.into(),
        }
    }

    fn open(&self, relative: &str) -> Result<(std::fs::File, String), LoadError> {
        let path = self.base_dir.join(Path::new(relative));
        let label = path.display().to_string();
        let file = std::fs::File::open(&path).map_err(|e| LoadError::Io {
            path: label.clone(),
            source: e,
        })?;
        Ok((file, label))
    }
}

impl SeasonSource for CsvSeasonSource {
    fn load_seasons(&self) -> Result<SeasonTable, LoadError> {
        let mut merger = SeasonMerger::default();

        let (file, label) = self.open(&self.paths.batting)?;
        let batting = read_batting(file, &label)?;
        info!("loaded {} batting rows from {label}", batting.len());
        merger.merge(batting);

        for season in &self.paths.statcast {
            let mut statcast = SeasonMerger::default();
            let (file, label) = self.open(&season.exit_velocity)?;
            statcast.merge(read_exit_velocity(file, &label, season.year)?);
            let (file, label) = self.open(&season.expected_stats)?;
            statcast.merge(read_expected_stats(file, &label, season.year)?);
            info!(
                "merged {} Statcast rows for {}",
                statcast.rows.len(),
                season.year
            );
            merger.merge(statcast.rows.into_iter().collect());
        }

        let mut ages = HashMap::new();
        for age_file in &self.paths.ages {
            let (file, label) = self.open(&age_file.path)?;
            for (k, v) in read_ages(file, &label, age_file.year)? {
                ages.entry(k).or_insert(v);
            }
        }
        merger.fill_ages(&ages);

        let table = merger.finish(self.paths.require_age);
        if table.is_empty() {
            return Err(LoadError::Validation(
                "season data produced zero complete rows".into(),
            ));
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
