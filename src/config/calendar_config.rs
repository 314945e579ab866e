use crate::config::{load_toml, parse_toml, PerLocation};
use crate::domain::model::Location;
use crate::utils::error::{KpiError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SATURDAY_CYCLE_DAYS: u32 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub locations: PerLocation<LocationSchedule>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSchedule {
    /// 每週固定營業日（週日一律不營業）
    pub open_weekdays: Vec<Weekday>,
    /// 一個已知有營業的週六；設定後週六改為隔週營業
    pub alternating_saturday_reference: Option<NaiveDate>,
    #[serde(default = "default_cycle_days")]
    pub cycle_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    /// 未指定時套用到所有診所
    #[serde(default)]
    pub locations: Option<Vec<Location>>,
}

impl Holiday {
    pub fn applies_to(&self, location: Location) -> bool {
        self.locations
            .as_ref()
            .map_or(true, |locations| locations.contains(&location))
    }
}

fn default_cycle_days() -> u32 {
    DEFAULT_SATURDAY_CYCLE_DAYS
}

impl LocationSchedule {
    pub fn weekdays(days: &[Weekday]) -> Self {
        Self {
            open_weekdays: days.to_vec(),
            alternating_saturday_reference: None,
            cycle_days: DEFAULT_SATURDAY_CYCLE_DAYS,
        }
    }

    pub fn with_alternating_saturdays(mut self, reference: NaiveDate) -> Self {
        self.alternating_saturday_reference = Some(reference);
        self
    }

    fn validate_for(&self, location: Location) -> Result<()> {
        let field = |name: &str| format!("locations.{}.{}", location, name);

        if self.open_weekdays.contains(&Weekday::Sun) {
            return Err(KpiError::InvalidConfigValueError {
                field: field("open_weekdays"),
                value: "Sun".to_string(),
                reason: "Sunday is always closed and cannot be listed as open".to_string(),
            });
        }

        if let Some(reference) = self.alternating_saturday_reference {
            if reference.weekday() != Weekday::Sat {
                return Err(KpiError::InvalidConfigValueError {
                    field: field("alternating_saturday_reference"),
                    value: reference.to_string(),
                    reason: format!("Reference date must be a Saturday, got {}", reference.weekday()),
                });
            }
            if self.open_weekdays.contains(&Weekday::Sat) {
                return Err(KpiError::InvalidConfigValueError {
                    field: field("open_weekdays"),
                    value: "Sat".to_string(),
                    reason: "Saturday cannot be both weekly and alternating".to_string(),
                });
            }
            if self.cycle_days < 7 || self.cycle_days % 7 != 0 {
                return Err(KpiError::InvalidConfigValueError {
                    field: field("cycle_days"),
                    value: self.cycle_days.to_string(),
                    reason: "Cycle must be a positive whole number of weeks".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl CalendarConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_toml(path, "calendar")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content, "calendar")
    }

    pub fn schedule(&self, location: Location) -> &LocationSchedule {
        self.locations.get(location)
    }

    pub fn holiday_on(&self, location: Location, date: NaiveDate) -> Option<&Holiday> {
        self.holidays
            .iter()
            .find(|h| h.date == date && h.applies_to(location))
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        use Weekday::*;
        Self {
            locations: PerLocation {
                baytown: LocationSchedule::weekdays(&[Mon, Tue, Wed, Thu, Fri])
                    .with_alternating_saturdays(
                        NaiveDate::from_ymd_opt(2025, 1, 4).unwrap_or_default(),
                    ),
                humble: LocationSchedule::weekdays(&[Mon, Tue, Wed, Thu]),
            },
            holidays: Vec::new(),
        }
    }
}

impl Validate for CalendarConfig {
    fn validate(&self) -> Result<()> {
        for (location, schedule) in self.locations.iter() {
            schedule.validate_for(location)?;
        }
        for holiday in &self.holidays {
            validate_non_empty_string(&format!("holidays.{}.name", holiday.date), &holiday.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALENDAR_TOML: &str = r#"
[locations.baytown]
open_weekdays = ["Mon", "Tue", "Wed", "Thu", "Fri"]
alternating_saturday_reference = "2025-01-04"

[locations.humble]
open_weekdays = ["Monday", "Tuesday", "Wednesday", "Thursday"]

[[holidays]]
date = "2025-12-25"
name = "Christmas Day"

[[holidays]]
date = "2025-11-28"
name = "Day after Thanksgiving"
locations = ["baytown"]
"#;

    #[test]
    fn test_parse_calendar_document() {
        let config = CalendarConfig::from_toml_str(CALENDAR_TOML).unwrap();
        assert!(config.validate().is_ok());

        let baytown = config.schedule(Location::Baytown);
        assert_eq!(baytown.open_weekdays.len(), 5);
        assert_eq!(baytown.cycle_days, 14);
        assert_eq!(
            baytown.alternating_saturday_reference,
            NaiveDate::from_ymd_opt(2025, 1, 4)
        );

        let humble = config.schedule(Location::Humble);
        assert_eq!(humble.open_weekdays, vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu]);
        assert!(humble.alternating_saturday_reference.is_none());
        assert_eq!(config.holidays.len(), 2);
    }

    #[test]
    fn test_holiday_scope() {
        let config = CalendarConfig::from_toml_str(CALENDAR_TOML).unwrap();
        let black_friday = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
        assert!(config.holiday_on(Location::Baytown, black_friday).is_some());
        assert!(config.holiday_on(Location::Humble, black_friday).is_none());

        let christmas = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        assert!(config.holiday_on(Location::Humble, christmas).is_some());
    }

    #[test]
    fn test_reference_must_be_saturday() {
        let mut config = CalendarConfig::default();
        config.locations.baytown.alternating_saturday_reference = NaiveDate::from_ymd_opt(2025, 1, 5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sunday_cannot_be_open() {
        let mut config = CalendarConfig::default();
        config.locations.humble.open_weekdays.push(Weekday::Sun);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cycle_must_be_whole_weeks() {
        let mut config = CalendarConfig::default();
        config.locations.baytown.cycle_days = 10;
        assert!(config.validate().is_err());
    }
}
