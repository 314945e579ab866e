//! Turns loosely typed sheet rows into calculator inputs.
//!
//! This is the only place raw cell values are interpreted. Bad cells never
//! fail the request: they fall back to a default and leave a warning behind.

use crate::config::{BillingColumns, ColumnConfig, FrontOfficeColumns};
use crate::domain::model::{DatasetKind, Record};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%b %d, %Y"];
const DATETIME_FORMATS: [&str; 5] = [
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Inputs plus the data-quality warnings raised while reading them.
/// `inputs` is `None` when the KPI's primary figure is blank, missing or unreadable.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub inputs: Option<T>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionInputs {
    pub production: f64,
    pub adjustments: f64,
    pub writeoffs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionInputs {
    pub production: f64,
    pub adjustments: f64,
    pub writeoffs: f64,
    pub patient_income: f64,
    pub unearned_income: f64,
    pub insurance_income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewPatientInputs {
    pub count: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseAcceptanceInputs {
    pub presented: f64,
    pub scheduled: f64,
    pub same_day: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HygieneInputs {
    pub total: f64,
    pub not_reappointed: f64,
}

/// Parses a human-entered number: `$3,669.00`, `(45.00)`, `($45.00)`, `12%`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 會計格式：括號代表負數
    let (negative, inner) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    let number = cleaned.strip_suffix('%').unwrap_or(&cleaned);

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value.abs() } else { value })
}

/// Reads a date cell. Accepts ISO, US `M/D/YYYY` (two-digit years are 20xx),
/// a leading date in timestamps, and sheet serial numbers.
pub fn parse_sheet_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            if let Some(ts) = parse_sheet_datetime_str(raw) {
                return Some(ts.date());
            }
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(expand_two_digit_year)
        }
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        _ => None,
    }
}

pub fn parse_sheet_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(raw) => parse_sheet_datetime_str(raw.trim()),
        _ => None,
    }
}

fn parse_sheet_datetime_str(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| expand_two_digit_year(ts.date()).and_time(ts.time()))
}

fn expand_two_digit_year(date: NaiveDate) -> NaiveDate {
    use chrono::Datelike;
    if date.year() < 100 {
        date.with_year(date.year() + 2000).unwrap_or(date)
    } else {
        date
    }
}

/// 試算表序號日期（1899-12-30 為第 0 天）
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Spreadsheet-to-calculator bridge for one set of column names.
#[derive(Debug, Clone, Default)]
pub struct SheetsToKpiInputs {
    columns: ColumnConfig,
}

impl SheetsToKpiInputs {
    pub fn new(columns: ColumnConfig) -> Self {
        Self { columns }
    }

    pub fn billing_columns(&self) -> &BillingColumns {
        &self.columns.billing
    }

    pub fn front_office_columns(&self) -> &FrontOfficeColumns {
        &self.columns.front_office
    }

    fn date_column(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Billing => &self.columns.billing.date,
            DatasetKind::FrontOffice => &self.columns.front_office.date,
        }
    }

    fn timestamp_column(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Billing => &self.columns.billing.timestamp,
            DatasetKind::FrontOffice => &self.columns.front_office.timestamp,
        }
    }

    /// Numeric cell with fallback. Blank cells take `default` quietly; a
    /// missing column or an unreadable value takes `default` and records why.
    pub fn safe_extract(
        row: &Record,
        column: &str,
        default: Option<f64>,
        warnings: &mut Vec<String>,
    ) -> Option<f64> {
        let Some(cell) = row.get(column) else {
            tracing::warn!("⚠️ Column '{}' missing from row, using default", column);
            warnings.push(format!("Column '{}' is missing; used default", column));
            return default;
        };

        let parsed = match cell {
            Value::Null => return default,
            Value::String(raw) if raw.trim().is_empty() => return default,
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(raw) => parse_numeric(raw),
            _ => None,
        };

        match parsed {
            Some(value) => Some(value),
            None => {
                tracing::warn!("⚠️ Unparseable value {} in column '{}', using default", cell, column);
                warnings.push(format!(
                    "Could not read {} in column '{}'; used default",
                    cell, column
                ));
                default
            }
        }
    }

    /// Secondary figure; a blank or bad cell counts as zero.
    fn amount(row: &Record, column: &str, warnings: &mut Vec<String>) -> f64 {
        Self::safe_extract(row, column, Some(0.0), warnings).unwrap_or(0.0)
    }

    /// Primary figure of a KPI; without it the KPI is not ready.
    fn required(row: &Record, column: &str, warnings: &mut Vec<String>) -> Option<f64> {
        Self::safe_extract(row, column, None, warnings)
    }

    /// Last row dated `date`; later rows correct earlier entries for the same day.
    pub fn select_day_row<'a>(
        &self,
        kind: DatasetKind,
        rows: &'a [Record],
        date: NaiveDate,
    ) -> Option<&'a Record> {
        let column = self.date_column(kind);
        rows.iter()
            .rev()
            .find(|row| row.get(column).and_then(parse_sheet_date) == Some(date))
    }

    pub fn latest_source_date(&self, kind: DatasetKind, rows: &[Record]) -> Option<NaiveDate> {
        let column = self.date_column(kind);
        rows.iter()
            .filter_map(|row| row.get(column).and_then(parse_sheet_date))
            .max()
    }

    pub fn row_date(&self, kind: DatasetKind, row: &Record) -> Option<NaiveDate> {
        row.get(self.date_column(kind)).and_then(parse_sheet_date)
    }

    pub fn row_timestamp(&self, kind: DatasetKind, row: &Record) -> Option<NaiveDateTime> {
        row.get(self.timestamp_column(kind))
            .and_then(parse_sheet_datetime)
    }

    pub fn production_inputs(&self, row: &Record) -> Extraction<ProductionInputs> {
        let cols = &self.columns.billing;
        let mut warnings = Vec::new();
        let production = Self::required(row, &cols.production, &mut warnings);
        let adjustments = Self::amount(row, &cols.adjustments, &mut warnings);
        let writeoffs = Self::amount(row, &cols.writeoffs, &mut warnings);
        let inputs = production.map(|production| ProductionInputs {
            production,
            adjustments,
            writeoffs,
        });
        Extraction { inputs, warnings }
    }

    pub fn collection_inputs(&self, row: &Record) -> Extraction<CollectionInputs> {
        let Extraction {
            inputs: production,
            mut warnings,
        } = self.production_inputs(row);
        let cols = &self.columns.billing;
        let patient_income = Self::amount(row, &cols.patient_income, &mut warnings);
        let unearned_income = Self::amount(row, &cols.unearned_income, &mut warnings);
        let insurance_income = Self::amount(row, &cols.insurance_income, &mut warnings);
        let inputs = production.map(|p| CollectionInputs {
            production: p.production,
            adjustments: p.adjustments,
            writeoffs: p.writeoffs,
            patient_income,
            unearned_income,
            insurance_income,
        });
        Extraction { inputs, warnings }
    }

    pub fn new_patient_inputs(&self, row: &Record) -> Extraction<NewPatientInputs> {
        let mut warnings = Vec::new();
        let inputs = Self::required(row, &self.columns.billing.new_patients, &mut warnings)
            .map(|count| NewPatientInputs { count });
        Extraction { inputs, warnings }
    }

    pub fn case_acceptance_inputs(&self, row: &Record) -> Extraction<CaseAcceptanceInputs> {
        let cols = &self.columns.front_office;
        let mut warnings = Vec::new();
        let presented = Self::required(row, &cols.treatments_presented, &mut warnings);
        let scheduled = Self::amount(row, &cols.treatments_scheduled, &mut warnings);
        let same_day = Self::amount(row, &cols.same_day_treatment, &mut warnings);
        let inputs = presented.map(|presented| CaseAcceptanceInputs {
            presented,
            scheduled,
            same_day,
        });
        Extraction { inputs, warnings }
    }

    pub fn hygiene_inputs(&self, row: &Record) -> Extraction<HygieneInputs> {
        let cols = &self.columns.front_office;
        let mut warnings = Vec::new();
        let total = Self::required(row, &cols.total_hygiene_appointments, &mut warnings);
        let not_reappointed = Self::amount(row, &cols.not_reappointed, &mut warnings);
        let inputs = total.map(|total| HygieneInputs {
            total,
            not_reappointed,
        });
        Extraction { inputs, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn billing_row() -> Record {
        Record::from_pairs([
            ("Date", json!("1/6/2025")),
            ("Timestamp", json!("1/6/2025 18:02:11")),
            ("Total Production Income", json!("$8,000.00")),
            ("Adjustments Today", json!("200")),
            ("Write-offs Today", json!("($500.00)")),
            ("Patient Income Today", json!("$1,250.50")),
            ("Unearned Income Today", json!("")),
            ("Insurance Income Today", json!(4100)),
            ("New Patients Today", json!("3")),
        ])
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("$3,669.00"), Some(3669.00));
        assert_eq!(parse_numeric("($45.00)"), Some(-45.00));
        assert_eq!(parse_numeric("(45.00)"), Some(-45.00));
        assert_eq!(parse_numeric("  1,200  "), Some(1200.0));
        assert_eq!(parse_numeric("-$12.50"), Some(-12.5));
        assert_eq!(parse_numeric("87.5%"), Some(87.5));
        assert_eq!(parse_numeric("garbage"), None);
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("$"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }

    #[test]
    fn test_safe_extract_defaults_and_warnings() {
        let row = Record::from_pairs([
            ("Good", json!("$3,669.00")),
            ("Negative", json!("($45.00)")),
            ("Bad", json!("garbage")),
            ("Blank", json!("  ")),
            ("Null", Value::Null),
            ("Number", json!(12.5)),
            ("Flag", json!(true)),
        ]);
        let mut warnings = Vec::new();

        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Good", Some(0.0), &mut warnings), Some(3669.0));
        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Negative", Some(0.0), &mut warnings), Some(-45.0));
        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Number", None, &mut warnings), Some(12.5));
        assert!(warnings.is_empty());

        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Blank", Some(7.0), &mut warnings), Some(7.0));
        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Null", None, &mut warnings), None);
        assert!(warnings.is_empty());

        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Bad", Some(0.0), &mut warnings), Some(0.0));
        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Flag", None, &mut warnings), None);
        assert_eq!(SheetsToKpiInputs::safe_extract(&row, "Absent", Some(1.0), &mut warnings), Some(1.0));
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("garbage"));
        assert!(warnings[2].contains("Absent"));
    }

    #[test]
    fn test_parse_sheet_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 6);
        assert_eq!(parse_sheet_date(&json!("2025-01-06")), expected);
        assert_eq!(parse_sheet_date(&json!("1/6/2025")), expected);
        assert_eq!(parse_sheet_date(&json!("01/06/2025")), expected);
        assert_eq!(parse_sheet_date(&json!("1/6/25")), expected);
        assert_eq!(parse_sheet_date(&json!("06-Jan-2025")), expected);
        assert_eq!(parse_sheet_date(&json!("1/6/2025 17:42:10")), expected);
        assert_eq!(parse_sheet_date(&json!(45663)), expected);
        assert_eq!(parse_sheet_date(&json!("next monday")), None);
        assert_eq!(parse_sheet_date(&Value::Null), None);
    }

    #[test]
    fn test_select_day_row_prefers_latest_entry() {
        let transformer = SheetsToKpiInputs::default();
        let rows = vec![
            Record::from_pairs([("Date", json!("1/3/2025")), ("Total Production Income", json!("100"))]),
            Record::from_pairs([("Date", json!("1/6/2025")), ("Total Production Income", json!("200"))]),
            Record::from_pairs([("Date", json!("2025-01-06")), ("Total Production Income", json!("300"))]),
            Record::from_pairs([("Date", json!("")), ("Total Production Income", json!("999"))]),
        ];
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let row = transformer
            .select_day_row(DatasetKind::Billing, &rows, day)
            .unwrap();
        assert_eq!(row.get("Total Production Income"), Some(&json!("300")));

        let missing = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        assert!(transformer.select_day_row(DatasetKind::Billing, &rows, missing).is_none());
        assert_eq!(transformer.latest_source_date(DatasetKind::Billing, &rows), Some(day));
    }

    #[test]
    fn test_billing_extractors() {
        let transformer = SheetsToKpiInputs::default();
        let row = billing_row();

        let production = transformer.production_inputs(&row);
        assert_eq!(
            production.inputs,
            Some(ProductionInputs {
                production: 8000.0,
                adjustments: 200.0,
                writeoffs: -500.0,
            })
        );
        assert!(production.warnings.is_empty());

        let collection = transformer.collection_inputs(&row).inputs.unwrap();
        assert_eq!(collection.patient_income, 1250.5);
        assert_eq!(collection.unearned_income, 0.0);
        assert_eq!(collection.insurance_income, 4100.0);

        assert_eq!(
            transformer.new_patient_inputs(&row).inputs,
            Some(NewPatientInputs { count: 3.0 })
        );

        let timestamp = transformer.row_timestamp(DatasetKind::Billing, &row).unwrap();
        assert_eq!(timestamp.to_string(), "2025-01-06 18:02:11");
    }

    #[test]
    fn test_front_office_extractors_with_bad_cells() {
        let transformer = SheetsToKpiInputs::default();
        let row = Record::from_pairs([
            ("Date", json!("1/6/2025")),
            ("Treatments Presented", json!("12")),
            ("Treatments Scheduled", json!("N/A")),
            ("Same Day Treatment", json!("2")),
            ("Total Hygiene Appointments", json!("10")),
        ]);

        let case = transformer.case_acceptance_inputs(&row);
        let case_inputs = case.inputs.unwrap();
        assert_eq!(case_inputs.presented, 12.0);
        assert_eq!(case_inputs.scheduled, 0.0);
        assert_eq!(case.warnings.len(), 1);

        let hygiene = transformer.hygiene_inputs(&row);
        let hygiene_inputs = hygiene.inputs.unwrap();
        assert_eq!(hygiene_inputs.total, 10.0);
        assert_eq!(hygiene_inputs.not_reappointed, 0.0);
        assert_eq!(hygiene.warnings.len(), 1);
        assert!(hygiene.warnings[0].contains("Patients Not Reappointed"));
    }

    #[test]
    fn test_blank_day_row_has_no_inputs() {
        let transformer = SheetsToKpiInputs::default();
        // 已預填日期但尚未輸入數字
        let row = Record::from_pairs([
            ("Date", json!("1/6/2025")),
            ("Total Production Income", json!("")),
            ("Adjustments Today", json!("")),
            ("New Patients Today", Value::Null),
            ("Treatments Presented", json!("  ")),
            ("Total Hygiene Appointments", json!("")),
        ]);

        let production = transformer.production_inputs(&row);
        assert_eq!(production.inputs, None);
        assert!(production.warnings.is_empty());
        assert_eq!(transformer.collection_inputs(&row).inputs, None);
        assert_eq!(transformer.new_patient_inputs(&row).inputs, None);
        assert_eq!(transformer.case_acceptance_inputs(&row).inputs, None);
        assert_eq!(transformer.hygiene_inputs(&row).inputs, None);
    }

    #[test]
    fn test_missing_primary_column_has_no_inputs() {
        let transformer = SheetsToKpiInputs::default();
        let row = Record::from_pairs([("Date", json!("1/6/2025"))]);

        let new_patients = transformer.new_patient_inputs(&row);
        assert_eq!(new_patients.inputs, None);
        assert_eq!(new_patients.warnings.len(), 1);
        assert!(new_patients.warnings[0].contains("New Patients Today"));

        let production = transformer.production_inputs(&row);
        assert_eq!(production.inputs, None);
        assert_eq!(production.warnings.len(), 3);
    }
}
