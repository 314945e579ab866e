use crate::config::{DatasetConfig, KpiConfig};
use crate::core::calculator;
use crate::core::calendar::BusinessCalendar;
use crate::core::transformer::{Extraction, SheetsToKpiInputs};
use crate::core::validation_rules::KpiValidationRules;
use crate::domain::contracts::{
    CalculationResult, DataFreshness, KpiResponse, KpiValue, KpiValues, ResponseStatus,
    Severity, UnavailableReason, ValidationIssue,
};
use crate::domain::model::{DatasetKind, KpiField, Location, Record};
use crate::domain::ports::DataProvider;
use chrono::NaiveDate;

/// Rows of both datasets for one location. `None` means the fetch failed.
#[derive(Debug, Clone, Default)]
pub struct FetchedDatasets {
    pub billing: Option<Vec<Record>>,
    pub front_office: Option<Vec<Record>>,
}

impl FetchedDatasets {
    pub fn get(&self, kind: DatasetKind) -> Option<&[Record]> {
        match kind {
            DatasetKind::Billing => self.billing.as_deref(),
            DatasetKind::FrontOffice => self.front_office.as_deref(),
        }
    }

    pub fn is_total_failure(&self) -> bool {
        self.billing.is_none() && self.front_office.is_none()
    }
}

/// What one dataset can offer for the requested day.
#[derive(Debug, Clone, Copy)]
enum DayData<'a> {
    Ready(&'a Record),
    NotReady,
    Unreachable,
}

/// Orchestrates calendar check, fetch, transform, calculate and validate.
///
/// Holds no per-request state; one instance can serve every request.
pub struct KpiService<P: DataProvider> {
    provider: P,
    calendar: BusinessCalendar,
    transformer: SheetsToKpiInputs,
    rules: KpiValidationRules,
    datasets: DatasetConfig,
}

impl<P: DataProvider> KpiService<P> {
    pub fn new(provider: P, config: &KpiConfig) -> Self {
        Self {
            provider,
            calendar: BusinessCalendar::new(config.calendar.clone()),
            transformer: SheetsToKpiInputs::new(config.columns.clone()),
            rules: KpiValidationRules::new(config.goals.clone()),
            datasets: config.datasets.clone(),
        }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn rules(&self) -> &KpiValidationRules {
        &self.rules
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn get_kpis(&self, location: Location, date: NaiveDate) -> KpiResponse {
        tracing::info!("📊 KPI request: {} on {}", location, date);

        if let Some(reason) = self.calendar.get_expected_closure_reason(location, date) {
            tracing::info!("🚪 {} closed on {}: {}", location, date, reason);
            return Self::create_closed_response(location, date, reason);
        }

        let fetched = self.fetch_datasets(location).await;
        let response = self.compute_day(location, date, &fetched);
        tracing::info!(
            "✅ {} {}: status {:?}, {}/5 KPIs available",
            location,
            date,
            response.status(),
            response.values().available_count()
        );
        response
    }

    pub async fn get_kpis_for_all_locations(&self, date: NaiveDate) -> Vec<KpiResponse> {
        let mut responses = Vec::with_capacity(Location::ALL.len());
        for location in Location::ALL {
            responses.push(self.get_kpis(location, date).await);
        }
        responses
    }

    /// One response per day in `start..=end`; datasets are fetched at most once.
    pub async fn get_kpis_range(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<KpiResponse> {
        let mut fetched: Option<FetchedDatasets> = None;
        let mut responses = Vec::new();

        for date in start.iter_days().take_while(|d| *d <= end) {
            if let Some(reason) = self.calendar.get_expected_closure_reason(location, date) {
                responses.push(Self::create_closed_response(location, date, reason));
                continue;
            }
            if fetched.is_none() {
                fetched = Some(self.fetch_datasets(location).await);
            }
            if let Some(datasets) = &fetched {
                responses.push(self.compute_day(location, date, datasets));
            }
        }

        tracing::info!(
            "📅 {} range {}..={}: {} responses",
            location,
            start,
            end,
            responses.len()
        );
        responses
    }

    pub async fn fetch_datasets(&self, location: Location) -> FetchedDatasets {
        FetchedDatasets {
            billing: self.fetch_dataset(DatasetKind::Billing, location).await,
            front_office: self.fetch_dataset(DatasetKind::FrontOffice, location).await,
        }
    }

    async fn fetch_dataset(&self, kind: DatasetKind, location: Location) -> Option<Vec<Record>> {
        let alias = self.datasets.alias_for(kind, location);

        if !self.provider.validate_alias(&alias) {
            tracing::warn!("📡 Dataset alias '{}' is not known to the provider", alias);
            return None;
        }

        tracing::debug!("📡 Fetching {} dataset '{}'", kind, alias);
        match self.provider.fetch(&alias).await {
            Ok(rows) => {
                tracing::debug!("📡 '{}' returned {} rows", alias, rows.len());
                Some(rows)
            }
            Err(e) => {
                tracing::warn!(
                    "❌ Fetching '{}' failed: {} (Severity: {:?})",
                    alias,
                    e,
                    e.severity()
                );
                None
            }
        }
    }

    /// Transform, calculate, validate and assemble for one open day.
    pub fn compute_day(&self, location: Location, date: NaiveDate, fetched: &FetchedDatasets) -> KpiResponse {
        if fetched.is_total_failure() {
            tracing::error!("❌ No dataset reachable for {}", location);
            return Self::create_error_response(location, date, UnavailableReason::InfrastructureError);
        }

        let billing = self.day_data(DatasetKind::Billing, fetched, date);
        let front_office = self.day_data(DatasetKind::FrontOffice, fetched, date);

        let mut values = KpiValues::all_unavailable(UnavailableReason::DataNotReady);
        for field in KpiField::ALL {
            let day = match field.source() {
                DatasetKind::Billing => billing,
                DatasetKind::FrontOffice => front_office,
            };
            let value = match day {
                DayData::Unreachable => KpiValue::unavailable(UnavailableReason::InfrastructureError),
                DayData::NotReady => KpiValue::unavailable(UnavailableReason::DataNotReady),
                DayData::Ready(row) => match self.calculate(field, row) {
                    (Some(result), data_warnings) => {
                        self.create_kpi_value(&result, field, location, date, data_warnings)
                    }
                    (None, data_warnings) => {
                        tracing::debug!("⏳ {} inputs not filled in for {}", field, date);
                        KpiValue::unavailable(UnavailableReason::DataNotReady).with_issues(
                            data_warnings
                                .into_iter()
                                .map(|message| ValidationIssue::warning(field, message)),
                        )
                    }
                },
            };
            values.set(field, value);
        }

        let freshness = self.freshness(fetched, [billing, front_office], date);
        KpiResponse::new(location, date, ResponseStatus::Open, None, values, freshness).unwrap_or_else(|e| {
            tracing::error!("❌ Could not assemble response: {}", e);
            Self::create_error_response(location, date, UnavailableReason::InfrastructureError)
        })
    }

    fn day_data<'a>(&self, kind: DatasetKind, fetched: &'a FetchedDatasets, date: NaiveDate) -> DayData<'a> {
        match fetched.get(kind) {
            None => DayData::Unreachable,
            Some(rows) => match self.transformer.select_day_row(kind, rows, date) {
                Some(row) => DayData::Ready(row),
                None => {
                    tracing::debug!("⏳ No {} row for {} yet", kind, date);
                    DayData::NotReady
                }
            },
        }
    }

    /// Runs the KPI's calculator when its primary input is present.
    fn calculate(&self, field: KpiField, row: &Record) -> (Option<CalculationResult>, Vec<String>) {
        let t = &self.transformer;
        match field {
            KpiField::ProductionTotal => {
                let Extraction { inputs, warnings } = t.production_inputs(row);
                let result = inputs.map(|i| {
                    calculator::compute_production_total(i.production, i.adjustments, i.writeoffs)
                });
                (result, warnings)
            }
            KpiField::CollectionRate => {
                let Extraction { inputs, warnings } = t.collection_inputs(row);
                let result = inputs.map(|i| {
                    calculator::compute_collection_rate(
                        i.production,
                        i.adjustments,
                        i.writeoffs,
                        i.patient_income,
                        i.unearned_income,
                        i.insurance_income,
                    )
                });
                (result, warnings)
            }
            KpiField::NewPatients => {
                let Extraction { inputs, warnings } = t.new_patient_inputs(row);
                (inputs.map(|i| calculator::compute_new_patients(i.count)), warnings)
            }
            KpiField::CaseAcceptance => {
                let Extraction { inputs, warnings } = t.case_acceptance_inputs(row);
                let result = inputs.map(|i| {
                    calculator::compute_case_acceptance(i.presented, i.scheduled, i.same_day)
                });
                (result, warnings)
            }
            KpiField::HygieneReappointment => {
                let Extraction { inputs, warnings } = t.hygiene_inputs(row);
                let result = inputs
                    .map(|i| calculator::compute_hygiene_reappointment(i.total, i.not_reappointed));
                (result, warnings)
            }
        }
    }

    /// Turns a calculator result into the public value, attaching data-quality
    /// warnings, calculator warnings and, for available values, the goal-based
    /// validation issues.
    pub fn create_kpi_value(
        &self,
        result: &CalculationResult,
        field: KpiField,
        location: Location,
        date: NaiveDate,
        data_warnings: Vec<String>,
    ) -> KpiValue {
        let mut issues: Vec<ValidationIssue> = data_warnings
            .into_iter()
            .map(|message| ValidationIssue::warning(field, message))
            .collect();

        let value = match (result.value(), result.can_calculate()) {
            (Some(value), true) => value,
            _ => {
                let reason = result.reason().unwrap_or(UnavailableReason::DataNotReady);
                return KpiValue::unavailable(reason).with_issues(issues);
            }
        };

        let rule_issues = self.rules.validate(field, value, location, date);
        // 收款率與接受率的計算警告和規則檢查重疊，規則已警告時不重複
        let covered_by_rules = matches!(field, KpiField::CollectionRate | KpiField::CaseAcceptance)
            && rule_issues.iter().any(|i| i.severity >= Severity::Warning);
        for warning in result.warnings() {
            tracing::debug!("🧮 {}: {}", field, warning);
            if !covered_by_rules {
                issues.push(ValidationIssue::warning(field, warning.clone()));
            }
        }

        issues.extend(rule_issues);
        KpiValue::available(value, issues).unwrap_or_else(|e| {
            tracing::warn!("⚠️ {} rejected: {}", field, e);
            KpiValue::unavailable(UnavailableReason::DataNotReady)
        })
    }

    pub fn create_closed_response(location: Location, date: NaiveDate, reason: String) -> KpiResponse {
        KpiResponse::closed(location, date, reason)
    }

    pub fn create_error_response(location: Location, date: NaiveDate, reason: UnavailableReason) -> KpiResponse {
        KpiResponse::error(location, date, reason)
    }

    fn freshness(&self, fetched: &FetchedDatasets, days: [DayData<'_>; 2], date: NaiveDate) -> DataFreshness {
        let kinds = [DatasetKind::Billing, DatasetKind::FrontOffice];
        let selected: Vec<(DatasetKind, &Record)> = kinds
            .into_iter()
            .zip(days)
            .filter_map(|(kind, day)| match day {
                DayData::Ready(row) => Some((kind, row)),
                _ => None,
            })
            .collect();

        let source_date = if selected.is_empty() {
            kinds
                .into_iter()
                .filter_map(|kind| {
                    fetched
                        .get(kind)
                        .and_then(|rows| self.transformer.latest_source_date(kind, rows))
                })
                .max()
        } else {
            selected
                .iter()
                .filter_map(|(kind, row)| self.transformer.row_date(*kind, row))
                .max()
        };

        let last_updated = selected
            .iter()
            .filter_map(|(kind, row)| self.transformer.row_timestamp(*kind, row))
            .max();

        DataFreshness::new(source_date, last_updated, date)
    }
}
