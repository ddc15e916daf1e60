// Read model over the persisted output tables: candidate list, metric cards,
// comparison player, projection series, leaderboards and scatter points.

use std::path::PathBuf;

use crate::output::{read_tables, OutputError, OutputTables, ProjectionRow, ScoreRow};
use crate::pipeline::projection::ProjectionMethod;
use crate::season::{first_last_name, Metric};

/// Anything that can supply a complete set of output tables.
pub trait TableSource {
    fn load_tables(&self) -> Result<OutputTables, OutputError>;
}

impl TableSource for OutputTables {
    fn load_tables(&self) -> Result<OutputTables, OutputError> {
        Ok(self.clone())
    }
}

/// Reads the tables written by the pipeline from one directory.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    dir: PathBuf,
}

impl CsvTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TableSource for CsvTableSource {
    fn load_tables(&self) -> Result<OutputTables, OutputError> {
        read_tables(&self.dir)
    }
}

/// What a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardKey {
    Metric(Metric),
    BreakoutScore,
    Similarity,
    BreakoutIndex,
}

impl LeaderboardKey {
    pub fn label(self) -> &'static str {
        match self {
            LeaderboardKey::Metric(m) => m.label(),
            LeaderboardKey::BreakoutScore => "Breakout Score",
            LeaderboardKey::Similarity => "Superstar Similarity",
            LeaderboardKey::BreakoutIndex => "Breakout Index",
        }
    }

    fn value(self, row: &ScoreRow) -> f64 {
        match self {
            LeaderboardKey::Metric(m) => row.metrics().get(m),
            LeaderboardKey::BreakoutScore => row.breakout_score,
            LeaderboardKey::Similarity => row.superstar_similarity,
            LeaderboardKey::BreakoutIndex => row.breakout_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateView {
    /// "First Last".
    pub display_name: String,
    pub row: ScoreRow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub name: String,
    pub similarity: f64,
    pub performance: f64,
    pub composite: f64,
}

pub struct Viewer {
    candidates: Vec<CandidateView>,
    historic: Vec<ProjectionRow>,
    regression: Vec<ProjectionRow>,
}

impl Viewer {
    /// Candidates are ordered by breakout score, highest first.
    pub fn new(tables: OutputTables) -> Self {
        let mut candidates: Vec<CandidateView> = tables
            .scores
            .into_iter()
            .map(|row| CandidateView {
                display_name: first_last_name(&row.name),
                row,
            })
            .collect();
        candidates.sort_by(|a, b| b.row.breakout_score.total_cmp(&a.row.breakout_score));

        Self {
            candidates,
            historic: tables.historic,
            regression: tables.regression,
        }
    }

    pub fn load(source: &dyn TableSource) -> Result<Self, OutputError> {
        Ok(Self::new(source.load_tables()?))
    }

    pub fn candidates(&self) -> &[CandidateView] {
        &self.candidates
    }

    /// Look a candidate up by either "First Last" or "Last, First".
    pub fn candidate(&self, name: &str) -> Option<&CandidateView> {
        self.candidates
            .iter()
            .find(|c| c.display_name == name || c.row.name == name)
    }

    /// Breakout score, similarity, then the seven metrics.
    pub fn metric_cards(&self, name: &str) -> Option<Vec<MetricCard>> {
        let row = &self.candidate(name)?.row;
        let mut cards = vec![
            MetricCard {
                label: LeaderboardKey::BreakoutScore.label(),
                value: row.breakout_score,
            },
            MetricCard {
                label: LeaderboardKey::Similarity.label(),
                value: row.superstar_similarity,
            },
        ];
        let metrics = row.metrics();
        cards.extend(Metric::ALL.iter().map(|&m| MetricCard {
            label: m.label(),
            value: metrics.get(m),
        }));
        Some(cards)
    }

    /// The matched established player, "First Last".
    pub fn comparison(&self, name: &str) -> Option<String> {
        let candidate = self.candidate(name)?;
        self.historic
            .iter()
            .find(|r| r.player_id == candidate.row.player_id)
            .map(|r| first_last_name(&r.match_name))
    }

    /// (year, value) pairs for one metric under one method, in year order.
    /// Empty when the candidate has no projection of that kind.
    pub fn projection(&self, name: &str, method: ProjectionMethod, metric: Metric) -> Vec<(i32, f64)> {
        let Some(candidate) = self.candidate(name) else {
            return Vec::new();
        };
        let rows = match method {
            ProjectionMethod::TrajectoryReplay => &self.historic,
            ProjectionMethod::Regression => &self.regression,
        };
        let mut points: Vec<(i32, f64)> = rows
            .iter()
            .filter(|r| r.player_id == candidate.row.player_id)
            .map(|r| (r.year, r.metrics().get(metric)))
            .collect();
        points.sort_by_key(|&(year, _)| year);
        points
    }

    /// Top `n` candidates by `key`, highest first. Ties keep candidate order.
    pub fn leaderboard(&self, key: LeaderboardKey, n: usize) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .candidates
            .iter()
            .map(|c| (c.display_name.clone(), key.value(&c.row)))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries.truncate(n);
        entries
    }

    pub fn scatter_points(&self) -> Vec<ScatterPoint> {
        self.candidates
            .iter()
            .map(|c| ScatterPoint {
                name: c.display_name.clone(),
                similarity: c.row.superstar_similarity,
                performance: c.row.breakout_score,
                composite: c.row.breakout_index,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn score(id: &str, name: &str, score: f64, index: f64) -> ScoreRow {
        ScoreRow {
            player_id: id.into(),
            name: name.into(),
            exit_velocity_avg: 90.0 + score,
            launch_angle_avg: 12.0,
            barrel_batted_rate: 9.0,
            hard_hit_percent: 41.0,
            xwoba: 0.320,
            xba: 0.255,
            xslg: 0.430,
            superstar_similarity: -3.0 + index,
            breakout_score: score,
            breakout_index: index,
            match_name: Some("Vet, Sam".into()),
        }
    }

    fn projection(id: &str, name: &str, year: i32, xwoba: f64) -> ProjectionRow {
        ProjectionRow {
            player_id: id.into(),
            name: name.into(),
            match_name: "Vet, Sam".into(),
            year,
            exit_velocity_avg: 90.0,
            launch_angle_avg: 12.0,
            barrel_batted_rate: 9.0,
            hard_hit_percent: 41.0,
            xwoba,
            xba: 0.255,
            xslg: 0.430,
        }
    }

    fn tables() -> OutputTables {
        OutputTables {
            scores: vec![
                score("1", "Low, Larry", 10.0, 3.0),
                score("2", "High, Harry", 30.0, 1.0),
                score("3", "Mid, Mike", 20.0, 2.0),
            ],
            historic: vec![
                projection("2", "High, Harry", 2026, 0.340),
                projection("2", "High, Harry", 2025, 0.330),
            ],
            regression: vec![projection("2", "High, Harry", 2025, 0.335)],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn candidates_sorted_by_breakout_score_with_first_last_names() {
        let viewer = Viewer::new(tables());
        let names: Vec<&str> = viewer
            .candidates()
            .iter()
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Harry High", "Mike Mid", "Larry Low"]);
    }

    #[test]
    fn candidate_lookup_accepts_both_name_forms() {
        let viewer = Viewer::new(tables());
        assert_eq!(viewer.candidate("Mike Mid").unwrap().row.player_id, "3");
        assert_eq!(viewer.candidate("Mid, Mike").unwrap().row.player_id, "3");
        assert!(viewer.candidate("Nobody").is_none());
    }

    #[test]
    fn metric_cards_lead_with_scores() {
        let viewer = Viewer::new(tables());
        let cards = viewer.metric_cards("Harry High").unwrap();
        assert_eq!(cards.len(), 9);
        assert_eq!(cards[0].label, "Breakout Score");
        assert_eq!(cards[0].value, 30.0);
        assert_eq!(cards[1].label, "Superstar Similarity");
        assert_eq!(cards[2].label, "Avg Exit Velocity (mph)");
        assert_eq!(cards[2].value, 120.0);
    }

    #[test]
    fn comparison_uses_first_last_form() {
        let viewer = Viewer::new(tables());
        assert_eq!(viewer.comparison("Harry High").as_deref(), Some("Sam Vet"));
        assert_eq!(viewer.comparison("Larry Low"), None);
    }

    #[test]
    fn projection_series_in_year_order() {
        let viewer = Viewer::new(tables());
        let series = viewer.projection("Harry High", ProjectionMethod::TrajectoryReplay, Metric::Xwoba);
        assert_eq!(series, vec![(2025, 0.330), (2026, 0.340)]);
        let reg = viewer.projection("Harry High", ProjectionMethod::Regression, Metric::Xwoba);
        assert_eq!(reg, vec![(2025, 0.335)]);
        assert!(viewer
            .projection("Larry Low", ProjectionMethod::Regression, Metric::Xba)
            .is_empty());
    }

    #[test]
    fn shared_name_keeps_series_apart() {
        let mut other = projection("9", "High, Harry", 2025, 0.250);
        other.match_name = "Else, Eddie".into();
        let mut tables = tables();
        tables.scores.push(score("9", "High, Harry", 5.0, 0.5));
        tables.historic.push(other.clone());
        tables.regression.push(other);
        let viewer = Viewer::new(tables);

        assert_eq!(viewer.candidate("Harry High").unwrap().row.player_id, "2");
        assert_eq!(viewer.comparison("Harry High").as_deref(), Some("Sam Vet"));
        let series = viewer.projection("Harry High", ProjectionMethod::TrajectoryReplay, Metric::Xwoba);
        assert_eq!(series, vec![(2025, 0.330), (2026, 0.340)]);
        let reg = viewer.projection("Harry High", ProjectionMethod::Regression, Metric::Xwoba);
        assert_eq!(reg, vec![(2025, 0.335)]);
    }

    #[test]
    fn leaderboard_by_index_and_metric() {
        let viewer = Viewer::new(tables());
        let top = viewer.leaderboard(LeaderboardKey::BreakoutIndex, 2);
        assert_eq!(
            top,
            vec![("Larry Low".to_string(), 3.0), ("Mike Mid".to_string(), 2.0)]
        );
        let ev = viewer.leaderboard(LeaderboardKey::Metric(Metric::ExitVelocity), 1);
        assert_eq!(ev[0].0, "Harry High");
    }

    #[test]
    fn scatter_points_cover_every_candidate() {
        let points = Viewer::new(tables()).scatter_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].name, "Harry High");
        assert_eq!(points[0].composite, 1.0);
        assert_eq!(points[0].similarity, -2.0);
    }

    #[test]
    fn load_from_in_memory_source() {
        let viewer = Viewer::load(&tables()).unwrap();
        assert_eq!(viewer.candidates().len(), 3);
    }
}
