use crate::config::{GoalsConfig, Thresholds};
use crate::core::calendar::weekday_name;
use crate::domain::contracts::ValidationIssue;
use crate::domain::model::{KpiField, Location};
use chrono::{Datelike, NaiveDate};

/// Goal-based sanity checks on calculated KPIs.
#[derive(Debug, Clone)]
pub struct KpiValidationRules {
    goals: GoalsConfig,
}

impl KpiValidationRules {
    pub fn new(goals: GoalsConfig) -> Self {
        Self { goals }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.goals.thresholds
    }

    pub fn get_daily_production_goal(&self, location: Location, date: NaiveDate) -> f64 {
        self.goals
            .production
            .get(location)
            .for_weekday(date.weekday())
    }

    pub fn validate(
        &self,
        field: KpiField,
        value: f64,
        location: Location,
        date: NaiveDate,
    ) -> Vec<ValidationIssue> {
        match field {
            KpiField::ProductionTotal => self.validate_production(value, location, date),
            KpiField::CollectionRate => self.validate_collection_rate(value),
            KpiField::NewPatients => self.validate_new_patients(value),
            KpiField::CaseAcceptance => self.validate_case_acceptance(value),
            KpiField::HygieneReappointment => self.validate_hygiene_reappointment(value),
        }
    }

    pub fn validate_production(&self, value: f64, location: Location, date: NaiveDate) -> Vec<ValidationIssue> {
        let goal = self.get_daily_production_goal(location, date);
        if goal <= 0.0 {
            return Vec::new();
        }

        let t = self.thresholds();
        let day = weekday_name(date.weekday());
        let mut issues = Vec::new();
        if value > goal * t.production_high_ratio {
            issues.push(ValidationIssue::warning(
                KpiField::ProductionTotal,
                format!(
                    "Production ${:.2} is more than {:.0}% of the {} goal (${:.2})",
                    value,
                    t.production_high_ratio * 100.0,
                    day,
                    goal
                ),
            ));
        } else if value < goal * t.production_low_ratio {
            issues.push(ValidationIssue::warning(
                KpiField::ProductionTotal,
                format!(
                    "Production ${:.2} is below {:.0}% of the {} goal (${:.2})",
                    value,
                    t.production_low_ratio * 100.0,
                    day,
                    goal
                ),
            ));
        }
        issues
    }

    pub fn validate_collection_rate(&self, value: f64) -> Vec<ValidationIssue> {
        let t = self.thresholds();
        let field = KpiField::CollectionRate;

        if value < t.collection_rate_warn_min || value > t.collection_rate_warn_max {
            vec![ValidationIssue::warning(
                field,
                format!(
                    "Collection rate {:.1}% is outside the expected {:.0}-{:.0}% range",
                    value, t.collection_rate_warn_min, t.collection_rate_warn_max
                ),
            )]
        } else if value < t.collection_rate_target_min || value > t.collection_rate_target_max {
            vec![ValidationIssue::info(
                field,
                format!(
                    "Collection rate {:.1}% is off the {:.0}-{:.0}% target",
                    value, t.collection_rate_target_min, t.collection_rate_target_max
                ),
            )]
        } else {
            Vec::new()
        }
    }

    pub fn validate_case_acceptance(&self, value: f64) -> Vec<ValidationIssue> {
        let max = self.thresholds().case_acceptance_warn_max;
        if value > max {
            vec![ValidationIssue::warning(
                KpiField::CaseAcceptance,
                format!("Case acceptance {:.1}% exceeds {:.0}%; check scheduled vs presented counts", value, max),
            )]
        } else {
            Vec::new()
        }
    }

    /// The calculator already clamps; an out-of-range value here means a bug upstream.
    pub fn validate_hygiene_reappointment(&self, value: f64) -> Vec<ValidationIssue> {
        let t = self.thresholds();
        if value < t.hygiene_min || value > t.hygiene_max {
            vec![ValidationIssue::error(
                KpiField::HygieneReappointment,
                format!(
                    "Hygiene reappointment {:.1}% is outside {:.0}-{:.0}%",
                    value, t.hygiene_min, t.hygiene_max
                ),
            )]
        } else {
            Vec::new()
        }
    }

    pub fn validate_new_patients(&self, value: f64) -> Vec<ValidationIssue> {
        if value < 0.0 {
            vec![ValidationIssue::error(
                KpiField::NewPatients,
                format!("New patient count {} is negative", value),
            )]
        } else {
            Vec::new()
        }
    }
}
