pub mod calendar_config;
#[cfg(feature = "cli")]
pub mod cli;
pub mod goals_config;
pub mod sources_config;

use crate::domain::model::Location;
use crate::utils::error::{KpiError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use calendar_config::{CalendarConfig, Holiday, LocationSchedule};
pub use goals_config::{GoalsConfig, Thresholds, WeeklyGoals};
pub use sources_config::{
    BillingColumns, ColumnConfig, DatasetConfig, FrontOfficeColumns, ProviderConfig, SourcesConfig,
};

/// One value per practice location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerLocation<T> {
    pub baytown: T,
    pub humble: T,
}

impl<T> PerLocation<T> {
    pub fn get(&self, location: Location) -> &T {
        match location {
            Location::Baytown => &self.baytown,
            Location::Humble => &self.humble,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, &T)> {
        [(Location::Baytown, &self.baytown), (Location::Humble, &self.humble)].into_iter()
    }
}

/// 替換環境變數 (例如 ${SHEET_BASE_URL})
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| KpiError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

/// 解析 TOML 字串（先做環境變數替換）
pub fn parse_toml<T: DeserializeOwned>(content: &str, document: &str) -> Result<T> {
    let processed = substitute_env_vars(content)?;
    toml::from_str(&processed).map_err(|e| KpiError::ConfigValidationError {
        field: document.to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

pub fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P, document: &str) -> Result<T> {
    let content = std::fs::read_to_string(&path).map_err(|e| KpiError::ConfigError {
        message: format!(
            "Cannot read {} document '{}': {}",
            document,
            path.as_ref().display(),
            e
        ),
    })?;
    parse_toml(&content, document)
}

/// Everything the service reads at start-up. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiConfig {
    pub calendar: CalendarConfig,
    pub goals: GoalsConfig,
    #[serde(default)]
    pub datasets: DatasetConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
}

impl KpiConfig {
    pub fn new(calendar: CalendarConfig, goals: GoalsConfig) -> Self {
        Self {
            calendar,
            goals,
            datasets: DatasetConfig::default(),
            columns: ColumnConfig::default(),
        }
    }

    /// 從行事曆與目標兩份文件載入並驗證
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(calendar_path: P, goals_path: Q) -> Result<Self> {
        let config = Self::new(
            CalendarConfig::from_file(calendar_path)?,
            GoalsConfig::from_file(goals_path)?,
        );
        config.validate()?;
        Ok(config)
    }

    /// Takes dataset aliases and column names from a sources document.
    pub fn with_sources(mut self, sources: &SourcesConfig) -> Self {
        self.datasets = sources.datasets.clone();
        self.columns = sources.columns.clone();
        self
    }
}

impl Validate for KpiConfig {
    fn validate(&self) -> Result<()> {
        self.calendar.validate()?;
        self.goals.validate()?;
        self.datasets.validate()?;
        self.columns.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("KPI_TEST_SHEET_HOST", "sheets.example.com");
        let out = substitute_env_vars("url = \"https://${KPI_TEST_SHEET_HOST}/export\"").unwrap();
        assert_eq!(out, "url = \"https://sheets.example.com/export\"");

        let untouched = substitute_env_vars("x = \"${KPI_TEST_UNSET_VARIABLE}\"").unwrap();
        assert_eq!(untouched, "x = \"${KPI_TEST_UNSET_VARIABLE}\"");
        std::env::remove_var("KPI_TEST_SHEET_HOST");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = KpiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.datasets.alias_for_billing(Location::Humble), "humble_eod");
    }

    #[test]
    fn test_per_location_lookup() {
        let values = PerLocation {
            baytown: 1,
            humble: 2,
        };
        assert_eq!(*values.get(Location::Humble), 2);
        assert_eq!(values.iter().count(), 2);
    }
}
