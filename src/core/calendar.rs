use crate::config::CalendarConfig;
use crate::domain::model::Location;
use chrono::{Datelike, NaiveDate, Weekday};

/// Outcome of the open/closed rule for one location and day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayStatus {
    Open,
    ClosedSunday,
    ClosedWeekday(Weekday),
    ClosedAlternatingSaturday,
    ClosedHoliday(String),
}

impl DayStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, DayStatus::Open)
    }

    pub fn closure_reason(&self) -> Option<String> {
        match self {
            DayStatus::Open => None,
            DayStatus::ClosedSunday => Some("Sunday".to_string()),
            DayStatus::ClosedWeekday(day) => Some(format!("{} closure", weekday_name(*day))),
            DayStatus::ClosedAlternatingSaturday => {
                Some("alternating Saturday — closed this week".to_string())
            }
            DayStatus::ClosedHoliday(name) => Some(format!("Holiday: {}", name)),
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// 隔週週六判斷：以參考日為第 0 週，週數落在循環起點即營業
pub fn alternating_saturday_open(date: NaiveDate, reference: NaiveDate, cycle_days: u32) -> bool {
    let cycle_weeks = i64::from((cycle_days / 7).max(1));
    let weeks = (date - reference).num_days().div_euclid(7);
    weeks.rem_euclid(cycle_weeks) == 0
}

/// Open/closed rules per location. Read-only after construction.
#[derive(Debug, Clone)]
pub struct BusinessCalendar {
    config: CalendarConfig,
}

impl BusinessCalendar {
    pub fn new(config: CalendarConfig) -> Self {
        Self { config }
    }

    pub fn day_status(&self, location: Location, date: NaiveDate) -> DayStatus {
        let weekday = date.weekday();
        if weekday == Weekday::Sun {
            return DayStatus::ClosedSunday;
        }

        if let Some(holiday) = self.config.holiday_on(location, date) {
            return DayStatus::ClosedHoliday(holiday.name.clone());
        }

        let schedule = self.config.schedule(location);
        if weekday == Weekday::Sat {
            if let Some(reference) = schedule.alternating_saturday_reference {
                return if alternating_saturday_open(date, reference, schedule.cycle_days) {
                    DayStatus::Open
                } else {
                    DayStatus::ClosedAlternatingSaturday
                };
            }
        }

        if schedule.open_weekdays.contains(&weekday) {
            DayStatus::Open
        } else {
            DayStatus::ClosedWeekday(weekday)
        }
    }

    pub fn is_business_day(&self, location: Location, date: NaiveDate) -> bool {
        self.day_status(location, date).is_open()
    }

    pub fn get_expected_closure_reason(&self, location: Location, date: NaiveDate) -> Option<String> {
        self.day_status(location, date).closure_reason()
    }
}
