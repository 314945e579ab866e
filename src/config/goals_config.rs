use crate::config::{load_toml, parse_toml, PerLocation};
use crate::utils::error::{KpiError, Result};
use crate::utils::validation::{validate_ordered, Validate};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsConfig {
    pub production: PerLocation<WeeklyGoals>,
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// Daily production goal per weekday, in dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGoals {
    pub default_goal: f64,
    pub monday: Option<f64>,
    pub tuesday: Option<f64>,
    pub wednesday: Option<f64>,
    pub thursday: Option<f64>,
    pub friday: Option<f64>,
    pub saturday: Option<f64>,
    pub sunday: Option<f64>,
}

impl WeeklyGoals {
    pub fn flat(goal: f64) -> Self {
        Self {
            default_goal: goal,
            monday: None,
            tuesday: None,
            wednesday: None,
            thursday: None,
            friday: None,
            saturday: None,
            sunday: None,
        }
    }

    pub fn for_weekday(&self, weekday: Weekday) -> f64 {
        let specific = match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        };
        specific.unwrap_or(self.default_goal)
    }

    fn entries(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("default_goal", Some(self.default_goal)),
            ("monday", self.monday),
            ("tuesday", self.tuesday),
            ("wednesday", self.wednesday),
            ("thursday", self.thursday),
            ("friday", self.friday),
            ("saturday", self.saturday),
            ("sunday", self.sunday),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub production_high_ratio: f64,
    pub production_low_ratio: f64,
    pub collection_rate_warn_min: f64,
    pub collection_rate_warn_max: f64,
    pub collection_rate_target_min: f64,
    pub collection_rate_target_max: f64,
    pub case_acceptance_warn_max: f64,
    pub hygiene_min: f64,
    pub hygiene_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            production_high_ratio: 1.5,
            production_low_ratio: 0.3,
            collection_rate_warn_min: 50.0,
            collection_rate_warn_max: 110.0,
            collection_rate_target_min: 98.0,
            collection_rate_target_max: 100.0,
            case_acceptance_warn_max: 100.0,
            hygiene_min: 0.0,
            hygiene_max: 100.0,
        }
    }
}

impl GoalsConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_toml(path, "goals")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content, "goals")
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            production: PerLocation {
                baytown: WeeklyGoals {
                    monday: Some(7620.0),
                    tuesday: Some(7620.0),
                    wednesday: Some(7620.0),
                    thursday: Some(7620.0),
                    friday: Some(6200.0),
                    saturday: Some(4500.0),
                    ..WeeklyGoals::flat(7000.0)
                },
                humble: WeeklyGoals {
                    monday: Some(5500.0),
                    tuesday: Some(5500.0),
                    wednesday: Some(5500.0),
                    thursday: Some(5500.0),
                    ..WeeklyGoals::flat(5000.0)
                },
            },
            thresholds: Thresholds::default(),
        }
    }
}

impl Validate for GoalsConfig {
    fn validate(&self) -> Result<()> {
        for (location, goals) in self.production.iter() {
            for (day, goal) in goals.entries() {
                if let Some(goal) = goal {
                    if !goal.is_finite() || goal < 0.0 {
                        return Err(KpiError::InvalidConfigValueError {
                            field: format!("production.{}.{}", location, day),
                            value: goal.to_string(),
                            reason: "Goal must be a non-negative amount".to_string(),
                        });
                    }
                }
            }
        }

        let t = &self.thresholds;
        validate_ordered(
            "thresholds.production_low_ratio..production_high_ratio",
            t.production_low_ratio,
            t.production_high_ratio,
        )?;
        validate_ordered(
            "thresholds.collection_rate_warn_min..collection_rate_warn_max",
            t.collection_rate_warn_min,
            t.collection_rate_warn_max,
        )?;
        validate_ordered(
            "thresholds.collection_rate_target_min..collection_rate_target_max",
            t.collection_rate_target_min,
            t.collection_rate_target_max,
        )?;
        validate_ordered("thresholds.hygiene_min..hygiene_max", t.hygiene_min, t.hygiene_max)?;
        if !t.case_acceptance_warn_max.is_finite() {
            return Err(KpiError::InvalidConfigValueError {
                field: "thresholds.case_acceptance_warn_max".to_string(),
                value: t.case_acceptance_warn_max.to_string(),
                reason: "Threshold must be finite".to_string(),
            });
        }
        Ok(())
    }
}
