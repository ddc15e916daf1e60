// Configuration loading and parsing (pipeline.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the single configuration file under `config/` and `defaults/`.
pub const CONFIG_FILE_NAME: &str = "pipeline.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub eligibility: EligibilityConfig,
    pub weighting: YearWeights,
    pub reference: ReferenceConfig,
    pub scoring: ScoringConfig,
    pub projection: ProjectionConfig,
    pub data_paths: DataPaths,
    pub output_dir: String,
}

/// Built-in values matching `defaults/pipeline.toml`, minus the data files.
impl Default for Config {
    fn default() -> Self {
        Self {
            eligibility: EligibilityConfig::default(),
            weighting: YearWeights::default(),
            reference: ReferenceConfig::default(),
            scoring: ScoringConfig::default(),
            projection: ProjectionConfig::default(),
            data_paths: DataPaths::default(),
            output_dir: "output".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// pipeline.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire pipeline.toml file.
#[derive(Debug, Clone, Deserialize)]
struct PipelineFile {
    eligibility: EligibilityConfig,
    weighting: WeightingSection,
    reference: ReferenceConfig,
    scoring: ScoringConfig,
    projection: ProjectionConfig,
    data: DataPaths,
    output: OutputSection,
}

/// TOML keys are strings, so season years arrive as `"2023"` and are parsed
/// into [`YearWeights`] during loading.
#[derive(Debug, Clone, Deserialize)]
struct WeightingSection {
    years: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputSection {
    dir: String,
}

/// Rules deciding which recent debuts count as breakout candidates.
#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityConfig {
    pub debut_cutoff_year: i32,
    pub max_age: f64,
    pub elite_percentile: f64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            debut_cutoff_year: 2023,
            max_age: 27.0,
            elite_percentile: 0.95,
        }
    }
}

/// Season year -> recency weight.
#[derive(Debug, Clone, PartialEq)]
pub struct YearWeights(pub BTreeMap<i32, f64>);

impl YearWeights {
    pub fn get(&self, year: i32) -> Option<f64> {
        self.0.get(&year).copied()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.0.contains_key(&year)
    }
}

impl Default for YearWeights {
    fn default() -> Self {
        Self(BTreeMap::from([(2023, 0.4), (2024, 0.6)]))
    }
}

/// Established-player pool selection.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    pub cutoff_year: i32,
    pub window_years: i32,
    pub min_seasons: usize,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            cutoff_year: 2024,
            window_years: 6,
            min_seasons: 4,
        }
    }
}

/// Which reference seasons feed the elite threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdScope {
    /// Every season in the reference pool.
    Pool,
    /// Only the reference pool's rows for one season.
    Season(i32),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub threshold_scope: ThresholdScope,
    pub performance_weight: f64,
    pub similarity_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold_scope: ThresholdScope::Pool,
            performance_weight: 0.7,
            similarity_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionConfig {
    pub start_year: i32,
    pub horizon_years: usize,
}

impl ProjectionConfig {
    /// The labelled future seasons shared by both projection methods.
    pub fn years(&self) -> Vec<i32> {
        (0..self.horizon_years as i32)
            .map(|i| self.start_year + i)
            .collect()
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            start_year: 2025,
            horizon_years: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub batting: String,
    #[serde(default = "default_require_age")]
    pub require_age: bool,
    #[serde(default)]
    pub statcast: Vec<StatcastFiles>,
    #[serde(default)]
    pub ages: Vec<AgeFile>,
}

fn default_require_age() -> bool {
    true
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            batting: "data/batting.csv".to_string(),
            require_age: true,
            statcast: Vec::new(),
            ages: Vec::new(),
        }
    }
}

/// One season's pair of Statcast leaderboard exports.
#[derive(Debug, Clone, Deserialize)]
pub struct StatcastFiles {
    pub year: i32,
    pub expected_stats: String,
    pub exit_velocity: String,
}

/// Supplemental per-season ages keyed by "First Last" names.
#[derive(Debug, Clone, Deserialize)]
pub struct AgeFile {
    pub year: i32,
    pub path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/pipeline.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate the contents of a pipeline.toml file. `path` is only
/// used for error reporting.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: PipelineFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut years = BTreeMap::new();
    for (key, weight) in file.weighting.years {
        let year = key.trim().parse::<i32>().map_err(|_| ConfigError::ValidationError {
            field: format!("weighting.years.{key}"),
            message: "season key must be an integer year".into(),
        })?;
        years.insert(year, weight);
    }

    let config = Config {
        eligibility: file.eligibility,
        weighting: YearWeights(years),
        reference: file.reference,
        scoring: file.scoring,
        projection: file.projection,
        data_paths: file.data,
        output_dir: file.output.dir,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` from `defaults/`, never overwriting a file the user already
/// has. Returns the files that were copied. `.example` files stay behind.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, true) => return Ok(Vec::new()),
        (false, false) => {
            return Err(copy_error(format!(
                "neither defaults/ nor config/ directory found in {}",
                base_dir.display()
            )))
        }
        _ => {}
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
    {
        let path = entry
            .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let is_example = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_example {
            sources.push(path);
        }
    }
    // read_dir order is platform-dependent.
    sources.sort();

    let mut copied = Vec::new();
    for source in sources {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_missing(&source, &target)? {
            tracing::info!("Seeded {} from defaults", target.display());
            copied.push(target);
        }
    }
    Ok(copied)
}

/// `Ok(false)` when `target` already exists.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    use std::io::Write;

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}: {e}", target.display()))),
    };
    let content = std::fs::read(source)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
    dest.write_all(&content)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let elig = &config.eligibility;
    if !(elig.elite_percentile > 0.0 && elig.elite_percentile <= 1.0) {
        return Err(invalid(
            "eligibility.elite_percentile",
            format!("must be in (0.0, 1.0], got {}", elig.elite_percentile),
        ));
    }
    if elig.max_age <= 0.0 {
        return Err(invalid(
            "eligibility.max_age",
            format!("must be > 0, got {}", elig.max_age),
        ));
    }

    if config.weighting.0.is_empty() {
        return Err(invalid("weighting.years", "at least one season weight is required"));
    }
    for (year, weight) in &config.weighting.0 {
        if !(weight.is_finite() && *weight > 0.0) {
            return Err(invalid(
                &format!("weighting.years.{year}"),
                format!("must be > 0, got {weight}"),
            ));
        }
    }

    let reference = &config.reference;
    if reference.window_years <= 0 {
        return Err(invalid("reference.window_years", "must be > 0"));
    }
    if reference.min_seasons == 0 {
        return Err(invalid("reference.min_seasons", "must be > 0"));
    }
    if reference.min_seasons > reference.window_years as usize {
        return Err(invalid(
            "reference.min_seasons",
            format!(
                "cannot exceed window_years ({} > {})",
                reference.min_seasons, reference.window_years
            ),
        ));
    }

    let scoring = &config.scoring;
    let blend: &[(&str, f64)] = &[
        ("scoring.performance_weight", scoring.performance_weight),
        ("scoring.similarity_weight", scoring.similarity_weight),
    ];
    for (name, val) in blend {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }

    if config.projection.horizon_years == 0 {
        return Err(invalid("projection.horizon_years", "must be > 0"));
    }

    if config.data_paths.batting.trim().is_empty() {
        return Err(invalid("data.batting", "path must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
