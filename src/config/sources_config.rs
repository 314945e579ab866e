use crate::config::{load_toml, parse_toml};
use crate::domain::model::{DatasetKind, Location};
use crate::utils::error::{KpiError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Where datasets come from and how their columns are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub datasets: DatasetConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// 本機目錄中的 CSV 檔案，alias 對應到檔名
    CsvDir {
        base_path: String,
        aliases: BTreeMap<String, String>,
    },
    /// 試算表發佈的 CSV 匯出網址
    HttpCsv {
        aliases: BTreeMap<String, String>,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

fn default_timeout_seconds() -> u64 {
    30
}

impl ProviderConfig {
    pub fn aliases(&self) -> &BTreeMap<String, String> {
        match self {
            ProviderConfig::CsvDir { aliases, .. } | ProviderConfig::HttpCsv { aliases, .. } => aliases,
        }
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<()> {
        if self.aliases().is_empty() {
            return Err(KpiError::MissingConfigError {
                field: "provider.aliases".to_string(),
            });
        }

        match self {
            ProviderConfig::CsvDir { base_path, aliases } => {
                validate_path("provider.base_path", base_path)?;
                validate_file_extensions("provider.aliases", aliases.values(), &["csv"])?;
            }
            ProviderConfig::HttpCsv {
                aliases,
                timeout_seconds,
                ..
            } => {
                validate_positive_number("provider.timeout_seconds", *timeout_seconds, 1)?;
                for (alias, url) in aliases {
                    validate_url(&format!("provider.aliases.{}", alias), url)?;
                }
            }
        }
        Ok(())
    }
}

/// Alias templates; `{location}` is replaced by the location id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub billing_alias: String,
    pub front_office_alias: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            billing_alias: "{location}_eod".to_string(),
            front_office_alias: "{location}_front".to_string(),
        }
    }
}

impl DatasetConfig {
    pub fn alias_for(&self, kind: DatasetKind, location: Location) -> String {
        let template = match kind {
            DatasetKind::Billing => &self.billing_alias,
            DatasetKind::FrontOffice => &self.front_office_alias,
        };
        template.replace("{location}", location.as_str())
    }

    pub fn alias_for_billing(&self, location: Location) -> String {
        self.alias_for(DatasetKind::Billing, location)
    }

    pub fn alias_for_front_office(&self, location: Location) -> String {
        self.alias_for(DatasetKind::FrontOffice, location)
    }
}

impl Validate for DatasetConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("datasets.billing_alias", &self.billing_alias)?;
        validate_non_empty_string("datasets.front_office_alias", &self.front_office_alias)?;
        if self.billing_alias == self.front_office_alias {
            return Err(KpiError::InvalidConfigValueError {
                field: "datasets.front_office_alias".to_string(),
                value: self.front_office_alias.clone(),
                reason: "Billing and front-office datasets must use different aliases".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub billing: BillingColumns,
    pub front_office: FrontOfficeColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingColumns {
    pub date: String,
    pub timestamp: String,
    pub production: String,
    pub adjustments: String,
    pub writeoffs: String,
    pub patient_income: String,
    pub unearned_income: String,
    pub insurance_income: String,
    pub new_patients: String,
}

impl Default for BillingColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            timestamp: "Timestamp".to_string(),
            production: "Total Production Income".to_string(),
            adjustments: "Adjustments Today".to_string(),
            writeoffs: "Write-offs Today".to_string(),
            patient_income: "Patient Income Today".to_string(),
            unearned_income: "Unearned Income Today".to_string(),
            insurance_income: "Insurance Income Today".to_string(),
            new_patients: "New Patients Today".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontOfficeColumns {
    pub date: String,
    pub timestamp: String,
    pub treatments_presented: String,
    pub treatments_scheduled: String,
    pub same_day_treatment: String,
    pub total_hygiene_appointments: String,
    pub not_reappointed: String,
}

impl Default for FrontOfficeColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            timestamp: "Timestamp".to_string(),
            treatments_presented: "Treatments Presented".to_string(),
            treatments_scheduled: "Treatments Scheduled".to_string(),
            same_day_treatment: "Same Day Treatment".to_string(),
            total_hygiene_appointments: "Total Hygiene Appointments".to_string(),
            not_reappointed: "Patients Not Reappointed".to_string(),
        }
    }
}

impl Validate for ColumnConfig {
    fn validate(&self) -> Result<()> {
        let b = &self.billing;
        let f = &self.front_office;
        let columns = [
            ("columns.billing.date", &b.date),
            ("columns.billing.production", &b.production),
            ("columns.billing.adjustments", &b.adjustments),
            ("columns.billing.writeoffs", &b.writeoffs),
            ("columns.billing.patient_income", &b.patient_income),
            ("columns.billing.unearned_income", &b.unearned_income),
            ("columns.billing.insurance_income", &b.insurance_income),
            ("columns.billing.new_patients", &b.new_patients),
            ("columns.front_office.date", &f.date),
            ("columns.front_office.treatments_presented", &f.treatments_presented),
            ("columns.front_office.treatments_scheduled", &f.treatments_scheduled),
            ("columns.front_office.same_day_treatment", &f.same_day_treatment),
            (
                "columns.front_office.total_hygiene_appointments",
                &f.total_hygiene_appointments,
            ),
            ("columns.front_office.not_reappointed", &f.not_reappointed),
        ];
        for (field, value) in columns {
            validate_non_empty_string(field, value)?;
        }
        Ok(())
    }
}

impl SourcesConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_toml(path, "sources")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content, "sources")
    }
}

impl Validate for SourcesConfig {
    fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.datasets.validate()?;
        self.columns.validate()
    }
}
