//! Configuration Module
//! TOML settings for the merge and analysis pipelines, with defaults matching
//! the original quarterly card-spending workflow.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "yearwise.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Calendar years to bucket rows into.
    pub years: Vec<i32>,
    pub merge: MergeConfig,
    pub analysis: AnalysisConfig,
    pub charts: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            years: vec![2018, 2020, 2023],
            merge: MergeConfig::default(),
            analysis: AnalysisConfig::default(),
            charts: ChartConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub quarter_column: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
            quarter_column: "CRTR_QURTR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub processed_dir: PathBuf,
    pub income_column: String,
    /// Substrings that must all appear in the card-amount column name.
    pub card_markers: Vec<String>,
    pub telesales_column: String,
    pub cs_advance_column: String,
    pub labels: LabelConfig,
    pub scatter: ScatterConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            processed_dir: PathBuf::from("data/processed"),
            income_column: "MM_INCM".to_string(),
            card_markers: vec!["CARD".to_string(), "GRAMT".to_string()],
            telesales_column: "CR_NTSL_USE_GRAMT_AVG".to_string(),
            cs_advance_column: "CSADVC_USE_GRAMT_AVG".to_string(),
            labels: LabelConfig::default(),
            scatter: ScatterConfig::default(),
        }
    }
}

/// Human-readable names the analysis columns are renamed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub income: String,
    pub card: String,
    pub telesales: String,
    pub cs_advance: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            income: "Monthly Income".to_string(),
            card: "Avg Card Spend".to_string(),
            telesales: "Avg Telesales Spend".to_string(),
            cs_advance: "Avg CS Advance Spend".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub income_bin: f64,
    pub card_bin: f64,
    /// Binned card spend above this is dropped from the scatter and pie charts.
    pub card_cap: f64,
    pub x_jitter: f64,
    pub y_jitter: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub hist_bins: (usize, usize),
    pub seed: Option<u64>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            income_bin: 1000.0,
            card_bin: 2000.0,
            card_cap: 300_000.0,
            x_jitter: 400.0,
            y_jitter: 800.0,
            x_max: 340_000.0,
            y_max: 300_000.0,
            hist_bins: (170, 150),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub font: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            font: "sans-serif".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `yearwise.toml` in the
    /// working directory is used when present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !local.is_file() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                local
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check values the pipelines cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(ConfigError::Invalid("at least one year is required".into()));
        }
        if let Some(bad) = self.years.iter().find(|y| !(1000..=9999).contains(*y)) {
            return Err(ConfigError::Invalid(format!(
                "year {bad} is not a four-digit year"
            )));
        }
        if self.merge.quarter_column.is_empty() {
            return Err(ConfigError::Invalid("quarter_column is empty".into()));
        }
        if self.analysis.card_markers.is_empty() {
            return Err(ConfigError::Invalid("card_markers is empty".into()));
        }

        let s = &self.analysis.scatter;
        for (name, value) in [
            ("income_bin", s.income_bin),
            ("card_bin", s.card_bin),
            ("x_max", s.x_max),
            ("y_max", s.y_max),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if s.x_jitter < 0.0 || s.y_jitter < 0.0 {
            return Err(ConfigError::Invalid("jitter must not be negative".into()));
        }
        if s.hist_bins.0 == 0 || s.hist_bins.1 == 0 {
            return Err(ConfigError::Invalid("hist_bins must be non-zero".into()));
        }
        let l = &self.analysis.labels;
        let labels = [&l.income, &l.card, &l.telesales, &l.cs_advance];
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() || label.as_str() == "YEAR" || labels[..i].contains(label) {
                return Err(ConfigError::Invalid(format!(
                    "label {label:?} must be non-empty, unique and not YEAR"
                )));
            }
        }
        if self.charts.width < 200 || self.charts.height < 200 {
            return Err(ConfigError::Invalid(
                "chart size must be at least 200x200".into(),
            ));
        }
        Ok(())
    }
}
