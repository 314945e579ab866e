pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, LogFormat};

pub use adapters::{build_provider, CsvDirectoryProvider, HttpCsvProvider, InMemoryProvider};
pub use config::{KpiConfig, SourcesConfig};
pub use core::{BusinessCalendar, KpiService};
pub use domain::contracts::{KpiResponse, KpiValue, ResponseStatus, UnavailableReason};
pub use domain::model::{KpiField, Location, Record};
pub use domain::ports::DataProvider;
pub use utils::error::{KpiError, Result};
