// Flat output tables: breakout scores, both projection tables, skipped
// candidates and the run summary.
//
// Column names follow the dashboard's expectations. Every table is written
// with an explicit header row, so even an empty table is self-describing.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pipeline::projection::{CandidateOutcome, ProjectedSeason, ProjectionSeries};
use crate::pipeline::scoring::ScoreRecord;
use crate::pipeline::{PipelineOutput, RunSummary};
use crate::season::MetricVector;

pub const SCORES_FILE: &str = "breakout_candidate_metrics.csv";
pub const HISTORIC_FILE: &str = "historic_projected_breakouts.csv";
pub const REGRESSION_FILE: &str = "linear_reg_projected_breakouts.csv";
pub const SKIPPED_FILE: &str = "skipped_candidates.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row type with a fixed header.
trait TableRow: Serialize + DeserializeOwned {
    const HEADER: &'static [&'static str];
}

/// One row of `breakout_candidate_metrics.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub player_id: String,
    #[serde(rename = "last_name, first_name")]
    pub name: String,
    pub exit_velocity_avg: f64,
    pub launch_angle_avg: f64,
    pub barrel_batted_rate: f64,
    pub hard_hit_percent: f64,
    pub xwoba: f64,
    pub xba: f64,
    pub xslg: f64,
    pub superstar_similarity: f64,
    pub breakout_score: f64,
    pub breakout_index: f64,
    pub match_name: Option<String>,
}

impl TableRow for ScoreRow {
    const HEADER: &'static [&'static str] = &[
        "player_id",
        "last_name, first_name",
        "exit_velocity_avg",
        "launch_angle_avg",
        "barrel_batted_rate",
        "hard_hit_percent",
        "xwoba",
        "xba",
        "xslg",
        "superstar_similarity",
        "breakout_score",
        "breakout_index",
        "match_name",
    ];
}

impl ScoreRow {
    pub fn from_score(score: &ScoreRecord) -> Self {
        let m = &score.profile.metrics;
        Self {
            player_id: score.profile.player_id.clone(),
            name: score.profile.name.clone(),
            exit_velocity_avg: m.exit_velocity_avg,
            launch_angle_avg: m.launch_angle_avg,
            barrel_batted_rate: m.barrel_batted_rate,
            hard_hit_percent: m.hard_hit_percent,
            xwoba: m.xwoba,
            xba: m.xba,
            xslg: m.xslg,
            superstar_similarity: score.similarity,
            breakout_score: score.performance,
            breakout_index: score.composite,
            match_name: score.matched_player.clone(),
        }
    }

    pub fn metrics(&self) -> MetricVector {
        MetricVector {
            exit_velocity_avg: self.exit_velocity_avg,
            launch_angle_avg: self.launch_angle_avg,
            barrel_batted_rate: self.barrel_batted_rate,
            hard_hit_percent: self.hard_hit_percent,
            xwoba: self.xwoba,
            xba: self.xba,
            xslg: self.xslg,
        }
    }
}

/// One projected season in either projection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub player_id: String,
    #[serde(rename = "last_name, first_name")]
    pub name: String,
    pub match_name: String,
    pub year: i32,
    pub exit_velocity_avg: f64,
    pub launch_angle_avg: f64,
    pub barrel_batted_rate: f64,
    pub hard_hit_percent: f64,
    pub xwoba: f64,
    pub xba: f64,
    pub xslg: f64,
}

impl TableRow for ProjectionRow {
    const HEADER: &'static [&'static str] = &[
        "player_id",
        "last_name, first_name",
        "match_name",
        "year",
        "exit_velocity_avg",
        "launch_angle_avg",
        "barrel_batted_rate",
        "hard_hit_percent",
        "xwoba",
        "xba",
        "xslg",
    ];
}

impl ProjectionRow {
    fn from_season(series: &ProjectionSeries, season: &ProjectedSeason) -> Self {
        let m = &season.metrics;
        Self {
            player_id: series.player_id.clone(),
            name: series.name.clone(),
            match_name: series.match_name.clone(),
            year: season.year,
            exit_velocity_avg: m.exit_velocity_avg,
            launch_angle_avg: m.launch_angle_avg,
            barrel_batted_rate: m.barrel_batted_rate,
            hard_hit_percent: m.hard_hit_percent,
            xwoba: m.xwoba,
            xba: m.xba,
            xslg: m.xslg,
        }
    }

    pub fn metrics(&self) -> MetricVector {
        MetricVector {
            exit_velocity_avg: self.exit_velocity_avg,
            launch_angle_avg: self.launch_angle_avg,
            barrel_batted_rate: self.barrel_batted_rate,
            hard_hit_percent: self.hard_hit_percent,
            xwoba: self.xwoba,
            xba: self.xba,
            xslg: self.xslg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub player_id: String,
    #[serde(rename = "last_name, first_name")]
    pub name: String,
    pub reason: String,
}

impl TableRow for SkippedRow {
    const HEADER: &'static [&'static str] = &["player_id", "last_name, first_name", "reason"];
}

fn series_rows(series: &ProjectionSeries) -> impl Iterator<Item = ProjectionRow> + '_ {
    series
        .seasons
        .iter()
        .map(move |season| ProjectionRow::from_season(series, season))
}

// ---------------------------------------------------------------------------
// OutputTables
// ---------------------------------------------------------------------------

/// The persisted form of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTables {
    pub scores: Vec<ScoreRow>,
    pub historic: Vec<ProjectionRow>,
    pub regression: Vec<ProjectionRow>,
    pub skipped: Vec<SkippedRow>,
}

impl OutputTables {
    pub fn from_pipeline(output: &PipelineOutput) -> Self {
        let mut tables = OutputTables {
            scores: output.scores.iter().map(ScoreRow::from_score).collect(),
            ..OutputTables::default()
        };

        for outcome in &output.outcomes {
            match outcome {
                CandidateOutcome::Projected(p) => {
                    tables.historic.extend(series_rows(&p.trajectory));
                    if let Some(reg) = &p.regression {
                        tables.regression.extend(series_rows(reg));
                    }
                }
                CandidateOutcome::Skipped {
                    player_id,
                    name,
                    reason,
                } => tables.skipped.push(SkippedRow {
                    player_id: player_id.clone(),
                    name: name.clone(),
                    reason: reason.to_string(),
                }),
            }
        }
        tables
    }
}

// ---------------------------------------------------------------------------
// Writer-/reader-based helpers (private, testable without temp files)
// ---------------------------------------------------------------------------

fn write_rows<W: Write, T: TableRow>(wtr: W, rows: &[T], label: &str) -> Result<(), OutputError> {
    let csv_err = |source: csv::Error| OutputError::Csv {
        path: label.to_string(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(wtr);
    writer.write_record(T::HEADER).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| OutputError::Io {
        path: label.to_string(),
        source: e,
    })
}

fn read_rows<R: Read, T: TableRow>(rdr: R, label: &str) -> Result<Vec<T>, OutputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| OutputError::Csv {
            path: label.to_string(),
            source,
        })
}

fn write_table<T: TableRow>(dir: &Path, file: &str, rows: &[T]) -> Result<(), OutputError> {
    let path = dir.join(file);
    let label = path.display().to_string();
    let handle = fs::File::create(&path).map_err(|e| OutputError::Io {
        path: label.clone(),
        source: e,
    })?;
    write_rows(handle, rows, &label)?;
    info!("wrote {} rows to {label}", rows.len());
    Ok(())
}

fn read_table<T: TableRow>(dir: &Path, file: &str) -> Result<Vec<T>, OutputError> {
    let path = dir.join(file);
    let label = path.display().to_string();
    let handle = fs::File::open(&path).map_err(|e| OutputError::Io {
        path: label.clone(),
        source: e,
    })?;
    read_rows(handle, &label)
}

// ---------------------------------------------------------------------------
// Public file API
// ---------------------------------------------------------------------------

/// Write all four tables and the run summary into `dir`, creating it if
/// needed. Existing files are overwritten.
pub fn write_tables(dir: &Path, tables: &OutputTables, summary: &RunSummary) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|e| OutputError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    write_table(dir, SCORES_FILE, &tables.scores)?;
    write_table(dir, HISTORIC_FILE, &tables.historic)?;
    write_table(dir, REGRESSION_FILE, &tables.regression)?;
    write_table(dir, SKIPPED_FILE, &tables.skipped)?;

    let path = dir.join(SUMMARY_FILE);
    let label = path.display().to_string();
    let json = serde_json::to_string_pretty(summary).map_err(|e| OutputError::Json {
        path: label.clone(),
        source: e,
    })?;
    fs::write(&path, json + "\n").map_err(|e| OutputError::Io {
        path: label,
        source: e,
    })
}

/// Read the four tables written by [`write_tables`].
pub fn read_tables(dir: &Path) -> Result<OutputTables, OutputError> {
    Ok(OutputTables {
        scores: read_table(dir, SCORES_FILE)?,
        historic: read_table(dir, HISTORIC_FILE)?,
        regression: read_table(dir, REGRESSION_FILE)?,
        skipped: read_table(dir, SKIPPED_FILE)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::projection::{CandidateProjection, ProjectionMethod, SkipReason};
    use crate::pipeline::weighting::CandidateProfile;

    fn score(id: &str, name: &str, matched: Option<&str>) -> ScoreRecord {
        ScoreRecord {
            profile: CandidateProfile {
                player_id: id.into(),
                name: name.into(),
                metrics: MetricVector::from_fn(|m| m.index() as f64 + 0.5),
            },
            similarity: -2.25,
            performance: 3.5,
            composite: 1.775,
            matched_player: matched.map(String::from),
        }
    }

    fn series(method: ProjectionMethod) -> ProjectionSeries {
        ProjectionSeries {
            player_id: "1".into(),
            name: "Kid, Billy".into(),
            match_name: "Vet, Sam".into(),
            method,
            seasons: (2025..2029)
                .map(|year| ProjectedSeason {
                    year,
                    metrics: MetricVector::from_fn(|_| f64::from(year - 2000)),
                })
                .collect(),
        }
    }

    fn sample_output() -> PipelineOutput {
        PipelineOutput {
            scores: vec![
                score("1", "Kid, Billy", Some("Vet, Sam")),
                score("2", "Lost, Larry", None),
            ],
            outcomes: vec![
                CandidateOutcome::Projected(CandidateProjection {
                    player_id: "1".into(),
                    name: "Kid, Billy".into(),
                    match_id: "99".into(),
                    match_name: "Vet, Sam".into(),
                    rank_sum: 12,
                    trajectory: series(ProjectionMethod::TrajectoryReplay),
                    regression: Some(series(ProjectionMethod::Regression)),
                }),
                CandidateOutcome::Skipped {
                    player_id: "2".into(),
                    name: "Lost, Larry".into(),
                    reason: SkipReason::MissingHistory("42".into()),
                },
            ],
            summary: RunSummary::default(),
        }
    }

    #[test]
    fn tables_from_pipeline_output() {
        let tables = OutputTables::from_pipeline(&sample_output());
        assert_eq!(tables.scores.len(), 2);
        assert_eq!(tables.scores[0].breakout_index, 1.775);
        assert_eq!(tables.scores[1].match_name, None);
        assert_eq!(tables.historic.len(), 4);
        assert_eq!(tables.regression.len(), 4);
        assert_eq!(tables.historic[3].year, 2028);
        assert_eq!(tables.historic[0].match_name, "Vet, Sam");
        assert!(tables.historic.iter().all(|r| r.player_id == "1"));
        assert_eq!(tables.regression[0].player_id, "1");
        assert_eq!(tables.skipped.len(), 1);
        assert_eq!(
            tables.skipped[0].reason,
            "matched player 42 has no season history"
        );
    }

    #[test]
    fn score_header_uses_dashboard_columns() {
        let tables = OutputTables::from_pipeline(&sample_output());
        let mut buf = Vec::new();
        write_rows(&mut buf, &tables.scores, "scores").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "player_id,\"last_name, first_name\",exit_velocity_avg,launch_angle_avg,\
             barrel_batted_rate,hard_hit_percent,xwoba,xba,xslg,superstar_similarity,\
             breakout_score,breakout_index,match_name"
        );
        // Unmatched candidates leave match_name empty.
        assert!(text.lines().nth(2).unwrap().ends_with(','));
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut buf = Vec::new();
        write_rows::<_, SkippedRow>(&mut buf, &[], "skipped").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "player_id,\"last_name, first_name\",reason\n"
        );
    }

    #[test]
    fn written_tables_read_back() {
        let tables = OutputTables::from_pipeline(&sample_output());
        let mut buf = Vec::new();
        write_rows(&mut buf, &tables.historic, "historic").unwrap();
        let back: Vec<ProjectionRow> = read_rows(buf.as_slice(), "historic").unwrap();
        assert_eq!(back, tables.historic);
    }

    #[test]
    fn files_written_and_read_from_dir() {
        let dir = std::env::temp_dir().join(format!("scout_output_test_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let output = sample_output();
        let tables = OutputTables::from_pipeline(&output);
        write_tables(&dir, &tables, &output.summary).unwrap();

        for file in [SCORES_FILE, HISTORIC_FILE, REGRESSION_FILE, SKIPPED_FILE, SUMMARY_FILE] {
            assert!(dir.join(file).exists(), "{file} missing");
        }
        let summary = fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("\"candidates\": 0"));

        let back = read_tables(&dir).unwrap();
        assert_eq!(back, tables);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_table_is_an_io_error() {
        let dir = std::env::temp_dir().join("scout_output_test_missing_dir");
        let err = read_tables(&dir).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }
}
