//! Pure KPI formulas. Inputs are already sanitized; nothing here panics or errors.

use crate::domain::contracts::{CalculationResult, UnavailableReason};

pub const COLLECTION_RATE_HIGH_WARNING: f64 = 110.0;
pub const COLLECTION_RATE_LOW_WARNING: f64 = 50.0;
pub const CASE_ACCEPTANCE_HIGH_WARNING: f64 = 100.0;

pub fn net_production(production: f64, adjustments: f64, writeoffs: f64) -> f64 {
    production + adjustments - writeoffs
}

pub fn compute_production_total(production: f64, adjustments: f64, writeoffs: f64) -> CalculationResult {
    let total = net_production(production, adjustments, writeoffs);
    let mut warnings = Vec::new();
    if total < 0.0 {
        warnings.push(format!("Net production is negative (${:.2})", total));
    }
    CalculationResult::ok_with_warnings(total, warnings)
}

pub fn compute_collection_rate(
    production: f64,
    adjustments: f64,
    writeoffs: f64,
    patient_income: f64,
    unearned_income: f64,
    insurance_income: f64,
) -> CalculationResult {
    let net = net_production(production, adjustments, writeoffs);
    if net == 0.0 {
        return CalculationResult::blocked(UnavailableReason::ZeroProduction);
    }

    let collections = patient_income + unearned_income + insurance_income;
    let rate = collections / net * 100.0;

    let mut warnings = Vec::new();
    if rate > COLLECTION_RATE_HIGH_WARNING {
        warnings.push(format!("Collection rate {:.1}% is above {}%", rate, COLLECTION_RATE_HIGH_WARNING));
    } else if rate < COLLECTION_RATE_LOW_WARNING {
        warnings.push(format!("Collection rate {:.1}% is below {}%", rate, COLLECTION_RATE_LOW_WARNING));
    }
    CalculationResult::ok_with_warnings(rate, warnings)
}

pub fn compute_new_patients(count: f64) -> CalculationResult {
    if count < 0.0 {
        return CalculationResult::blocked(UnavailableReason::NegativeCount);
    }
    CalculationResult::ok(count)
}

pub fn compute_case_acceptance(presented: f64, scheduled: f64, same_day: f64) -> CalculationResult {
    if presented == 0.0 {
        return CalculationResult::blocked(UnavailableReason::ZeroPresented);
    }

    let rate = (scheduled + same_day) / presented * 100.0;
    let mut warnings = Vec::new();
    if rate > CASE_ACCEPTANCE_HIGH_WARNING {
        warnings.push(format!("Case acceptance {:.1}% exceeds 100%", rate));
    }
    CalculationResult::ok_with_warnings(rate, warnings)
}

pub fn compute_hygiene_reappointment(total: f64, not_reappointed: f64) -> CalculationResult {
    if total <= 0.0 {
        return CalculationResult::blocked(UnavailableReason::ZeroAppointments);
    }

    // 來源資料可能出現「未預約數 > 總數」
    let clamped = not_reappointed.min(total).max(0.0);
    let mut warnings = Vec::new();
    if clamped != not_reappointed {
        warnings.push(format!(
            "Not-reappointed count {} clamped to {} (total {})",
            not_reappointed, clamped, total
        ));
    }

    let rate = ((total - clamped) / total * 100.0).clamp(0.0, 100.0);
    CalculationResult::ok_with_warnings(rate, warnings)
}
