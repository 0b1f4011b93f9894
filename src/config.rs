use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::data::model::YearRange;

/// Config file picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "invest_dash.json";

/// Dashboard configuration, mirrors `assets/config/default.json`.
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub data: DataSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    pub path: PathBuf,
    /// Field delimiter; a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    pub min_year: i32,
    pub max_year: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    pub title: String,
    /// Short indicator name used in headers and metric labels, e.g. "INV".
    pub indicator_label: String,
    /// Raw values are divided by this before display (1e9 → billions).
    pub unit_divisor: f64,
    pub unit_suffix: String,
    pub metric_columns: usize,
    #[serde(default)]
    pub default_countries: Vec<String>,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl DashboardConfig {
    /// The configuration compiled into the binary.
    pub fn load_default() -> Result<Self> {
        let config_str = include_str!("../assets/config/default.json");
        Self::from_json(config_str).context("parsing embedded default config")
    }

    /// Load from `path`, or from [`LOCAL_CONFIG_FILE`] if it exists, or fall
    /// back to the embedded default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let local = Path::new(LOCAL_CONFIG_FILE);
        let path = match path {
            Some(p) => p,
            None if local.exists() => local,
            None => return Self::load_default(),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.year_range()?;
        self.delimiter()?;
        let divisor = self.display.unit_divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            bail!("unit_divisor must be a positive number, got {divisor}");
        }
        if self.display.metric_columns == 0 {
            bail!("metric_columns must be at least 1");
        }
        Ok(())
    }

    pub fn year_range(&self) -> Result<YearRange> {
        YearRange::new(self.data.min_year, self.data.max_year).context("invalid min_year/max_year")
    }

    pub fn delimiter(&self) -> Result<u8> {
        match self.data.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => bail!(
                "delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            ),
        }
    }
}
