use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_default()
        .join("gallery")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub loader: LoaderSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Row height the justified layout aims for, in pixels.
    #[serde(default = "default_target_row_height")]
    pub target_row_height: f64,
    /// Horizontal margin on each side of a photo.
    #[serde(default = "default_margin")]
    pub margin: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct LoaderSettings {
    /// Page size of every fetch.
    #[serde(default = "default_load_increment")]
    pub load_increment: usize,
    /// Items kept loaded on each side of a photo opened with `load_around`.
    #[serde(default = "default_context")]
    pub context: usize,
    /// Estimated height of a freshly created placeholder run.
    #[serde(default = "default_placeholder_height")]
    pub placeholder_height: f64,
    #[serde(default = "default_max_searches_retained")]
    pub max_searches_retained: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            target_row_height: default_target_row_height(),
            margin: default_margin(),
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            load_increment: default_load_increment(),
            context: default_context(),
            placeholder_height: default_placeholder_height(),
            max_searches_retained: default_max_searches_retained(),
        }
    }
}

fn default_target_row_height() -> f64 { 300.0 }

fn default_margin() -> f64 { 2.0 }

fn default_load_increment() -> usize { 10 }

fn default_context() -> usize { 10 }

fn default_placeholder_height() -> f64 { 100.0 }

fn default_max_searches_retained() -> usize { 10 }

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.target_row_height <= 0.0 {
            issues.push(format!(
                "layout.target_row_height must be positive, got {}",
                self.target_row_height
            ));
        }

        if self.margin < 0.0 {
            issues.push(format!("layout.margin must be non-negative, got {}", self.margin));
        }

        issues
    }
}

impl LoaderSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.load_increment == 0 {
            issues.push("loader.load_increment must be at least 1".to_string());
        }

        if self.placeholder_height < 0.0 {
            issues.push(format!(
                "loader.placeholder_height must be non-negative, got {}",
                self.placeholder_height
            ));
        }

        if self.max_searches_retained == 0 {
            issues.push("loader.max_searches_retained must be at least 1".to_string());
        }

        issues
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, falling back to the defaults otherwise.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.loader.validate());
        issues
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = match toml::from_str(buf) {
            Ok(config) => config,
            Err(e) => bail!("{e}"),
        };
        let issues = config.validate();
        if !issues.is_empty() {
            bail!("invalid config:\n  {}", issues.join("\n  "));
        }
        Ok(config)
    }
}
