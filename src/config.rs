use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::period::Period;
use crate::DashboardMode;

/// Operational settings for building a dashboard.
///
/// Formula constants (aging threshold, weekly bins, score weights) are not
/// configurable; these knobs only choose windows and list sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Created-date window applied before computing metrics. `None` keeps all tasks.
    pub period: Option<String>,
    pub mode: DashboardMode,
    pub trend_months: usize,
    pub trend_top_keys: usize,
    pub early_warning_limit: usize,
    pub blocker_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            period: Some("30d".to_string()),
            mode: DashboardMode::Projects,
            trend_months: 6,
            trend_top_keys: 3,
            early_warning_limit: 6,
            blocker_limit: 5,
        }
    }
}

impl DashboardConfig {
    /// Default config location (`~/.taskpulse/config.json`).
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".taskpulse");
        Ok(dir.join("config.json"))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            Ok(path) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                log::warn!("{e}; using default configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.period()?;
        if self.trend_months == 0 {
            return Err(Error::Config("trend_months must be at least 1".into()));
        }
        Ok(())
    }

    /// The configured filter period, parsed.
    pub fn period(&self) -> Result<Option<Period>> {
        self.period
            .as_deref()
            .map(|p| Period::parse(p).map_err(|e| Error::Config(format!("period: {e}"))))
            .transpose()
    }
}
