//! Value objects handed out by the KPI service.
//!
//! Every type here checks its own invariants when it is built, both through
//! the constructors and when it is deserialized, so a value that exists is a
//! value that is consistent.

use crate::domain::model::{KpiField, Location};
use crate::utils::error::{KpiError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a KPI could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    ExpectedClosure,
    DataNotReady,
    InfrastructureError,
    ZeroProduction,
    NegativeCount,
    ZeroPresented,
    ZeroAppointments,
}

impl UnavailableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnavailableReason::ExpectedClosure => "expected_closure",
            UnavailableReason::DataNotReady => "data_not_ready",
            UnavailableReason::InfrastructureError => "infrastructure_error",
            UnavailableReason::ZeroProduction => "zero_production",
            UnavailableReason::NegativeCount => "negative_count",
            UnavailableReason::ZeroPresented => "zero_presented",
            UnavailableReason::ZeroAppointments => "zero_appointments",
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one calculator function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    value: Option<f64>,
    can_calculate: bool,
    reason: Option<UnavailableReason>,
    warnings: Vec<String>,
}

impl CalculationResult {
    pub fn ok(value: f64) -> Self {
        Self::ok_with_warnings(value, Vec::new())
    }

    pub fn ok_with_warnings(value: f64, warnings: Vec<String>) -> Self {
        Self {
            value: Some(value),
            can_calculate: true,
            reason: None,
            warnings,
        }
    }

    pub fn blocked(reason: UnavailableReason) -> Self {
        Self {
            value: None,
            can_calculate: false,
            reason: Some(reason),
            warnings: Vec::new(),
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn can_calculate(&self) -> bool {
        self.can_calculate
    }

    pub fn reason(&self) -> Option<UnavailableReason> {
        self.reason
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub field: KpiField,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(severity: Severity, field: KpiField, message: impl Into<String>) -> Self {
        Self {
            severity,
            field,
            message: message.into(),
        }
    }

    pub fn info(field: KpiField, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, field, message)
    }

    pub fn warning(field: KpiField, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, field, message)
    }

    pub fn error(field: KpiField, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, field, message)
    }
}

/// One metric for one day, as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKpiValue")]
pub struct KpiValue {
    value: Option<f64>,
    available: bool,
    unavailable_reason: Option<UnavailableReason>,
    validation_issues: Vec<ValidationIssue>,
}

#[derive(Deserialize)]
struct RawKpiValue {
    value: Option<f64>,
    available: bool,
    unavailable_reason: Option<UnavailableReason>,
    #[serde(default)]
    validation_issues: Vec<ValidationIssue>,
}

impl TryFrom<RawKpiValue> for KpiValue {
    type Error = KpiError;

    fn try_from(raw: RawKpiValue) -> Result<Self> {
        KpiValue::new(
            raw.value,
            raw.available,
            raw.unavailable_reason,
            raw.validation_issues,
        )
    }
}

impl KpiValue {
    pub fn new(
        value: Option<f64>,
        available: bool,
        unavailable_reason: Option<UnavailableReason>,
        validation_issues: Vec<ValidationIssue>,
    ) -> Result<Self> {
        match (available, value, unavailable_reason) {
            (true, Some(v), None) if v.is_finite() => {}
            (true, Some(v), None) => {
                return Err(KpiError::ContractViolation {
                    message: format!("available KPI value must be finite, got {}", v),
                })
            }
            (true, None, _) => {
                return Err(KpiError::ContractViolation {
                    message: "available KPI value requires a value".to_string(),
                })
            }
            (true, _, Some(reason)) => {
                return Err(KpiError::ContractViolation {
                    message: format!("available KPI value cannot carry reason '{}'", reason),
                })
            }
            (false, None, Some(_)) => {}
            (false, Some(_), _) => {
                return Err(KpiError::ContractViolation {
                    message: "unavailable KPI value must not carry a value".to_string(),
                })
            }
            (false, None, None) => {
                return Err(KpiError::ContractViolation {
                    message: "unavailable KPI value requires a reason".to_string(),
                })
            }
        }

        Ok(Self {
            value,
            available,
            unavailable_reason,
            validation_issues,
        })
    }

    pub fn available(value: f64, validation_issues: Vec<ValidationIssue>) -> Result<Self> {
        Self::new(Some(value), true, None, validation_issues)
    }

    pub fn unavailable(reason: UnavailableReason) -> Self {
        Self {
            value: None,
            available: false,
            unavailable_reason: Some(reason),
            validation_issues: Vec::new(),
        }
    }

    pub fn with_issues(mut self, issues: impl IntoIterator<Item = ValidationIssue>) -> Self {
        self.validation_issues.extend(issues);
        self
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn unavailable_reason(&self) -> Option<UnavailableReason> {
        self.unavailable_reason
    }

    pub fn validation_issues(&self) -> &[ValidationIssue] {
        &self.validation_issues
    }

    /// Highest severity among attached issues.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.validation_issues.iter().map(|i| i.severity).max()
    }
}

/// The five KPIs for one location and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiValues {
    pub production_total: KpiValue,
    pub collection_rate: KpiValue,
    pub new_patients: KpiValue,
    pub case_acceptance: KpiValue,
    pub hygiene_reappointment: KpiValue,
}

impl KpiValues {
    pub fn all_unavailable(reason: UnavailableReason) -> Self {
        Self {
            production_total: KpiValue::unavailable(reason),
            collection_rate: KpiValue::unavailable(reason),
            new_patients: KpiValue::unavailable(reason),
            case_acceptance: KpiValue::unavailable(reason),
            hygiene_reappointment: KpiValue::unavailable(reason),
        }
    }

    pub fn get(&self, field: KpiField) -> &KpiValue {
        match field {
            KpiField::ProductionTotal => &self.production_total,
            KpiField::CollectionRate => &self.collection_rate,
            KpiField::NewPatients => &self.new_patients,
            KpiField::CaseAcceptance => &self.case_acceptance,
            KpiField::HygieneReappointment => &self.hygiene_reappointment,
        }
    }

    pub fn set(&mut self, field: KpiField, value: KpiValue) {
        match field {
            KpiField::ProductionTotal => self.production_total = value,
            KpiField::CollectionRate => self.collection_rate = value,
            KpiField::NewPatients => self.new_patients = value,
            KpiField::CaseAcceptance => self.case_acceptance = value,
            KpiField::HygieneReappointment => self.hygiene_reappointment = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (KpiField, &KpiValue)> + '_ {
        KpiField::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    pub fn available_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_available()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFreshness {
    pub source_date: Option<NaiveDate>,
    pub last_updated: Option<NaiveDateTime>,
    pub is_current: bool,
}

impl DataFreshness {
    pub fn new(
        source_date: Option<NaiveDate>,
        last_updated: Option<NaiveDateTime>,
        requested: NaiveDate,
    ) -> Self {
        Self {
            source_date,
            last_updated,
            is_current: source_date == Some(requested),
        }
    }

    /// No data was read.
    pub fn unknown() -> Self {
        Self {
            source_date: None,
            last_updated: None,
            is_current: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Open,
    Closed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKpiResponse")]
pub struct KpiResponse {
    location: Location,
    date: NaiveDate,
    status: ResponseStatus,
    closure_reason: Option<String>,
    values: KpiValues,
    freshness: DataFreshness,
}

#[derive(Deserialize)]
struct RawKpiResponse {
    location: Location,
    date: NaiveDate,
    status: ResponseStatus,
    closure_reason: Option<String>,
    values: KpiValues,
    freshness: DataFreshness,
}

impl TryFrom<RawKpiResponse> for KpiResponse {
    type Error = KpiError;

    fn try_from(raw: RawKpiResponse) -> Result<Self> {
        KpiResponse::new(
            raw.location,
            raw.date,
            raw.status,
            raw.closure_reason,
            raw.values,
            raw.freshness,
        )
    }
}

impl KpiResponse {
    pub fn new(
        location: Location,
        date: NaiveDate,
        status: ResponseStatus,
        closure_reason: Option<String>,
        values: KpiValues,
        freshness: DataFreshness,
    ) -> Result<Self> {
        match status {
            ResponseStatus::Closed => {
                if closure_reason.is_none() {
                    return Err(KpiError::ContractViolation {
                        message: "closed response requires a closure reason".to_string(),
                    });
                }
                if let Some((field, _)) = values.iter().find(|(_, v)| {
                    v.unavailable_reason() != Some(UnavailableReason::ExpectedClosure)
                }) {
                    return Err(KpiError::ContractViolation {
                        message: format!("closed response has non-closure value for {}", field),
                    });
                }
            }
            ResponseStatus::Error => {
                if values.available_count() > 0 {
                    return Err(KpiError::ContractViolation {
                        message: "error response cannot carry available values".to_string(),
                    });
                }
            }
            ResponseStatus::Open => {
                if closure_reason.is_some() {
                    return Err(KpiError::ContractViolation {
                        message: "open response cannot carry a closure reason".to_string(),
                    });
                }
            }
        }

        Ok(Self {
            location,
            date,
            status,
            closure_reason,
            values,
            freshness,
        })
    }

    /// Closed-day response; cannot fail because the values are built here.
    pub fn closed(location: Location, date: NaiveDate, closure_reason: String) -> Self {
        Self {
            location,
            date,
            status: ResponseStatus::Closed,
            closure_reason: Some(closure_reason),
            values: KpiValues::all_unavailable(UnavailableReason::ExpectedClosure),
            freshness: DataFreshness::unknown(),
        }
    }

    pub fn error(location: Location, date: NaiveDate, reason: UnavailableReason) -> Self {
        Self {
            location,
            date,
            status: ResponseStatus::Error,
            closure_reason: None,
            values: KpiValues::all_unavailable(reason),
            freshness: DataFreshness::unknown(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn closure_reason(&self) -> Option<&str> {
        self.closure_reason.as_deref()
    }

    pub fn values(&self) -> &KpiValues {
        &self.values
    }

    pub fn freshness(&self) -> &DataFreshness {
        &self.freshness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn test_calculation_result_blocked_has_no_value() {
        let result = CalculationResult::blocked(UnavailableReason::ZeroProduction);
        assert!(!result.can_calculate());
        assert_eq!(result.value(), None);
        assert_eq!(result.reason(), Some(UnavailableReason::ZeroProduction));
    }

    #[test]
    fn test_kpi_value_invariants() {
        assert!(KpiValue::new(None, false, None, vec![]).is_err());
        assert!(KpiValue::new(Some(1.0), false, Some(UnavailableReason::DataNotReady), vec![]).is_err());
        assert!(KpiValue::new(None, true, None, vec![]).is_err());
        assert!(KpiValue::available(f64::NAN, vec![]).is_err());
        assert!(KpiValue::available(f64::INFINITY, vec![]).is_err());

        let value = KpiValue::available(42.0, vec![]).unwrap();
        assert!(value.is_available());
        assert_eq!(value.value(), Some(42.0));

        let missing = KpiValue::unavailable(UnavailableReason::DataNotReady);
        assert!(!missing.is_available());
        assert_eq!(missing.value(), None);
    }

    #[test]
    fn test_kpi_value_deserialization_checks_invariants() {
        let ok = r#"{"value":null,"available":false,"unavailable_reason":"data_not_ready","validation_issues":[]}"#;
        let parsed: KpiValue = serde_json::from_str(ok).unwrap();
        assert_eq!(parsed.unavailable_reason(), Some(UnavailableReason::DataNotReady));

        let broken = r#"{"value":12.5,"available":false,"unavailable_reason":"data_not_ready"}"#;
        assert!(serde_json::from_str::<KpiValue>(broken).is_err());
    }

    #[test]
    fn test_worst_severity() {
        let value = KpiValue::available(10.0, vec![])
            .unwrap()
            .with_issues([
                ValidationIssue::info(KpiField::CollectionRate, "below target"),
                ValidationIssue::warning(KpiField::CollectionRate, "low"),
            ]);
        assert_eq!(value.worst_severity(), Some(Severity::Warning));
    }

    #[test]
    fn test_closed_response_invariant() {
        let closed = KpiResponse::closed(Location::Humble, day(), "Friday closure".to_string());
        assert_eq!(closed.status(), ResponseStatus::Closed);
        assert!(closed.values().iter().all(|(_, v)| !v.is_available()));

        let bad = KpiResponse::new(
            Location::Humble,
            day(),
            ResponseStatus::Closed,
            Some("Sunday".to_string()),
            KpiValues::all_unavailable(UnavailableReason::DataNotReady),
            DataFreshness::unknown(),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_response_json_roundtrip_keeps_invariants() {
        let response = KpiResponse::closed(Location::Baytown, day(), "Sunday".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"closed\""));
        assert!(json.contains("\"expected_closure\""));

        let back: KpiResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_freshness_is_current() {
        let fresh = DataFreshness::new(Some(day()), None, day());
        assert!(fresh.is_current);
        let stale = DataFreshness::new(day().pred_opt(), None, day());
        assert!(!stale.is_current);
    }
}
