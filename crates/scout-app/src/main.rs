// Breakout scout entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout is reserved for the leaderboard)
// 2. Load config
// 3. Load season data and run the pipeline
// 4. Write output tables
// 5. Reload the written tables and print the leaderboard

use anyhow::Context;
use scout_app::{render_leaderboard, run_pipeline, write_outputs};
use scout_baseball::loader::CsvSeasonSource;
use scout_baseball::viewer::{CsvTableSource, LeaderboardKey, Viewer};
use scout_core::config;
use tracing::info;

const LEADERBOARD_SIZE: usize = 10;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Breakout scout starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: debut cutoff {}, reference cutoff {}, projecting {:?}",
        config.eligibility.debut_cutoff_year,
        config.reference.cutoff_year,
        config.projection.years()
    );

    // 3. Load season data and run the pipeline
    let base_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let source = CsvSeasonSource::new(config.data_paths.clone(), base_dir.clone());
    let output = run_pipeline(&config, &source)?;

    // 4. Write output tables
    let out_dir = base_dir.join(&config.output_dir);
    write_outputs(&out_dir, &output)?;
    info!("Outputs written to {}", out_dir.display());

    // 5. Reload and print the leaderboard
    let viewer = Viewer::load(&CsvTableSource::new(out_dir.clone()))
        .context("failed to reload output tables")?;
    print!(
        "{}",
        render_leaderboard(&viewer, LeaderboardKey::BreakoutIndex, LEADERBOARD_SIZE)
    );
    if output.summary.skipped > 0 {
        println!(
            "{} candidate(s) skipped, see {}",
            output.summary.skipped,
            out_dir
                .join(scout_baseball::output::SKIPPED_FILE)
                .display()
        );
    }

    info!("Breakout scout finished");
    Ok(())
}

/// Initialize tracing to log to a file.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("breakout-scout.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scout_app=info,scout_baseball=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
