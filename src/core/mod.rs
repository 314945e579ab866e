pub mod calculator;
pub mod calendar;
pub mod service;
pub mod transformer;
pub mod validation_rules;

pub use calendar::{BusinessCalendar, DayStatus};
pub use service::{FetchedDatasets, KpiService};
pub use transformer::SheetsToKpiInputs;
pub use validation_rules::KpiValidationRules;

pub use crate::domain::contracts::{KpiResponse, KpiValue, ResponseStatus, UnavailableReason};
pub use crate::domain::model::{Location, Record};
pub use crate::domain::ports::DataProvider;
pub use crate::utils::error::Result;
