//! Pipeline configuration
//!
//! Defaults match the layout otoole generates: `config.yaml` next to a
//! `data_csv` directory. Values can be loaded from a YAML settings file and
//! then overridden from the command line.

use anyhow::{Context, Result};
use sand_interface::YearRange;
use sand_schema::{IndexSetPolicy, SAND_CONFIG_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings shared by every `sandtool` subcommand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First model year
    pub start_year: i32,
    /// Last model year, inclusive
    pub end_year: i32,
    /// otoole config describing the full model
    pub config_path: PathBuf,
    /// File name of the reconciled config, written next to `config_path`
    pub sand_config_name: String,
    /// CSV data directory, relative to the config's directory
    pub csv_dir_name: String,
    pub index_policy: IndexSetPolicy,
    /// Delete CSV files of non-required fields after reconciling
    pub prune_csv: bool,
}

impl PipelineConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from YAML; missing keys keep their defaults
    ///
    /// # Errors
    /// Fails if the file cannot be read or is not valid YAML
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// # Errors
    /// Fails on invalid YAML or unknown values
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[inline]
    #[must_use]
    pub fn with_years(mut self, start: i32, end: i32) -> Self {
        self.start_year = start;
        self.end_year = end;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_sand_config_name(mut self, name: impl Into<String>) -> Self {
        self.sand_config_name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_csv_dir_name(mut self, name: impl Into<String>) -> Self {
        self.csv_dir_name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_index_policy(mut self, policy: IndexSetPolicy) -> Self {
        self.index_policy = policy;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_prune_csv(mut self, prune: bool) -> Self {
        self.prune_csv = prune;
        self
    }

    /// # Errors
    /// Fails if `start_year > end_year`
    pub fn years(&self) -> Result<YearRange> {
        Ok(YearRange::new(self.start_year, self.end_year)?)
    }

    /// Directory holding `config_path`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn sand_config_path(&self) -> PathBuf {
        self.config_dir().join(&self.sand_config_name)
    }

    #[must_use]
    pub fn csv_dir(&self) -> PathBuf {
        self.config_dir().join(&self.csv_dir_name)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let years = YearRange::default();
        Self {
            start_year: years.start(),
            end_year: years.end(),
            config_path: PathBuf::from("./config.yaml"),
            sand_config_name: SAND_CONFIG_FILE.to_string(),
            csv_dir_name: "data_csv".to_string(),
            index_policy: IndexSetPolicy::default(),
            prune_csv: true,
        }
    }
}
