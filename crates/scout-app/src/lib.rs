// Breakout scout application layer: load seasons, run the pipeline, persist
// the tables and render the console leaderboard.

use std::path::Path;

use anyhow::Context;
use scout_baseball::loader::SeasonSource;
use scout_baseball::output::{write_tables, OutputTables};
use scout_baseball::pipeline::{self, PipelineOutput};
use scout_baseball::viewer::{LeaderboardKey, Viewer};
use scout_core::config::Config;
use tracing::info;

/// Load the season table from `source` and run every pipeline stage.
pub fn run_pipeline(config: &Config, source: &dyn SeasonSource) -> anyhow::Result<PipelineOutput> {
    let seasons = source
        .load_seasons()
        .context("failed to load season data")?;
    info!("Loaded {} season rows", seasons.len());

    let output = pipeline::run(config, &seasons).context("breakout pipeline failed")?;
    info!(
        "Pipeline produced {} scores, {} projected, {} skipped",
        output.scores.len(),
        output.summary.projected,
        output.summary.skipped
    );
    Ok(output)
}

/// Write every output table plus the run summary into `dir`.
pub fn write_outputs(dir: &Path, output: &PipelineOutput) -> anyhow::Result<OutputTables> {
    let tables = OutputTables::from_pipeline(output);
    write_tables(dir, &tables, &output.summary)
        .with_context(|| format!("failed to write outputs to {}", dir.display()))?;
    Ok(tables)
}

/// Plain-text top-`n` leaderboard.
pub fn render_leaderboard(viewer: &Viewer, key: LeaderboardKey, n: usize) -> String {
    let entries = viewer.leaderboard(key, n);
    let mut out = String::new();
    out.push_str(&format!("Top {} by {}\n", entries.len(), key.label()));
    for (rank, (name, value)) in entries.iter().enumerate() {
        out.push_str(&format!("{:>3}. {:<28} {:>9.3}\n", rank + 1, name, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_baseball::output::ScoreRow;

    fn row(name: &str, index: f64) -> ScoreRow {
        ScoreRow {
            player_id: name.into(),
            name: name.into(),
            exit_velocity_avg: 0.0,
            launch_angle_avg: 0.0,
            barrel_batted_rate: 0.0,
            hard_hit_percent: 0.0,
            xwoba: 0.0,
            xba: 0.0,
            xslg: 0.0,
            superstar_similarity: 0.0,
            breakout_score: 0.0,
            breakout_index: index,
            match_name: None,
        }
    }

    #[test]
    fn leaderboard_text_is_ranked() {
        let tables = OutputTables {
            scores: vec![row("Low, Al", 1.0), row("Top, Bo", 2.5)],
            ..OutputTables::default()
        };
        let text = render_leaderboard(&Viewer::new(tables), LeaderboardKey::BreakoutIndex, 10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Top 2 by Breakout Index");
        assert!(lines[1].starts_with("  1. Bo Top"));
        assert!(lines[1].ends_with("2.500"));
        assert!(lines[2].starts_with("  2. Al Low"));
        assert_eq!(lines.len(), 3);
        assert!(text.ends_with('\n'));
    }
}
