use crate::domain::model::Location;
use crate::utils::error::{KpiError, Result};
use crate::utils::validation::{validate_path, Validate};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "kpi-core")]
#[command(about = "Daily practice KPIs from end-of-day and front-office sheets")]
pub struct CliConfig {
    #[arg(long, default_value = "config/calendar.toml")]
    pub calendar: String,

    #[arg(long, default_value = "config/goals.toml")]
    pub goals: String,

    #[arg(long, default_value = "config/sources.toml")]
    pub sources: String,

    /// baytown or humble; every location when omitted
    #[arg(long)]
    pub location: Option<Location>,

    /// YYYY-MM-DD, defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Last day of an inclusive range starting at --date
    #[arg(long, requires = "date")]
    pub end_date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, help = "Pretty-print the JSON output")]
    pub pretty: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("calendar", &self.calendar)?;
        validate_path("goals", &self.goals)?;
        validate_path("sources", &self.sources)?;

        if let (Some(start), Some(end)) = (self.date, self.end_date) {
            if end < start {
                return Err(KpiError::InvalidConfigValueError {
                    field: "end_date".to_string(),
                    value: end.to_string(),
                    reason: format!("End date must not be before {}", start),
                });
            }
            if self.location.is_none() {
                return Err(KpiError::MissingConfigError {
                    field: "location".to_string(),
                });
            }
        }
        Ok(())
    }
}
