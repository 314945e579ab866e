use crate::utils::error::KpiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One of the two practice locations. Drives every calendar, goal and dataset lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Baytown,
    Humble,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::Baytown, Location::Humble];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Baytown => "baytown",
            Location::Humble => "humble",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = KpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baytown" => Ok(Location::Baytown),
            "humble" => Ok(Location::Humble),
            other => Err(KpiError::InvalidConfigValueError {
                field: "location".to_string(),
                value: other.to_string(),
                reason: "Expected 'baytown' or 'humble'".to_string(),
            }),
        }
    }
}

/// A single spreadsheet row as delivered by a [`DataProvider`](crate::domain::ports::DataProvider).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.data.get(column)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.data.contains_key(column)
    }
}

/// The five daily KPIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiField {
    ProductionTotal,
    CollectionRate,
    NewPatients,
    CaseAcceptance,
    HygieneReappointment,
}

impl KpiField {
    pub const ALL: [KpiField; 5] = [
        KpiField::ProductionTotal,
        KpiField::CollectionRate,
        KpiField::NewPatients,
        KpiField::CaseAcceptance,
        KpiField::HygieneReappointment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiField::ProductionTotal => "production_total",
            KpiField::CollectionRate => "collection_rate",
            KpiField::NewPatients => "new_patients",
            KpiField::CaseAcceptance => "case_acceptance",
            KpiField::HygieneReappointment => "hygiene_reappointment",
        }
    }

    /// Which dataset family feeds this KPI.
    pub fn source(&self) -> DatasetKind {
        match self {
            KpiField::ProductionTotal | KpiField::CollectionRate | KpiField::NewPatients => {
                DatasetKind::Billing
            }
            KpiField::CaseAcceptance | KpiField::HygieneReappointment => DatasetKind::FrontOffice,
        }
    }
}

impl fmt::Display for KpiField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// End-of-day financial sheet.
    Billing,
    /// Scheduling and hygiene sheet.
    FrontOffice,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Billing => f.write_str("billing"),
            DatasetKind::FrontOffice => f.write_str("front_office"),
        }
    }
}
