use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Dataset '{alias}' not found")]
    DataSourceNotFound { alias: String },

    #[error("Access to dataset '{alias}' was denied: {message}")]
    DataSourceAuth { alias: String, message: String },

    #[error("Fetching dataset '{alias}' timed out after {seconds}s")]
    DataSourceTimeout { alias: String, seconds: u64 },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Data contract violated: {message}")]
    ContractViolation { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Infrastructure,
    Configuration,
    DataContract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl KpiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            KpiError::DataSourceNotFound { .. }
            | KpiError::DataSourceAuth { .. }
            | KpiError::DataSourceTimeout { .. }
            | KpiError::ApiError(_)
            | KpiError::CsvError(_)
            | KpiError::IoError(_)
            | KpiError::SerializationError(_) => ErrorCategory::Infrastructure,
            KpiError::ConfigError { .. }
            | KpiError::ConfigValidationError { .. }
            | KpiError::InvalidConfigValueError { .. }
            | KpiError::MissingConfigError { .. } => ErrorCategory::Configuration,
            KpiError::ContractViolation { .. } => ErrorCategory::DataContract,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 逾時通常可以重試
            KpiError::DataSourceTimeout { .. } | KpiError::ApiError(_) => ErrorSeverity::Medium,
            KpiError::DataSourceNotFound { .. }
            | KpiError::CsvError(_)
            | KpiError::SerializationError(_)
            | KpiError::ContractViolation { .. } => ErrorSeverity::High,
            KpiError::DataSourceAuth { .. }
            | KpiError::IoError(_)
            | KpiError::ConfigError { .. }
            | KpiError::ConfigValidationError { .. }
            | KpiError::InvalidConfigValueError { .. }
            | KpiError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 是否屬於資料來源層級的錯誤（會讓服務回傳 infrastructure_error）
    pub fn is_infrastructure(&self) -> bool {
        self.category() == ErrorCategory::Infrastructure
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            KpiError::DataSourceNotFound { alias } => format!(
                "Check that dataset '{}' is listed under [provider.aliases] and the file or sheet exists",
                alias
            ),
            KpiError::DataSourceAuth { .. } => {
                "Verify the sheet sharing settings or the credentials in the source URL".to_string()
            }
            KpiError::DataSourceTimeout { .. } => {
                "Retry later or raise provider.timeout_seconds".to_string()
            }
            KpiError::ApiError(_) => "Check network connectivity and the source URL".to_string(),
            KpiError::CsvError(_) => {
                "Make sure the dataset is exported as CSV with a header row".to_string()
            }
            KpiError::IoError(_) => "Check file paths and permissions".to_string(),
            KpiError::SerializationError(_) => "Inspect the dataset for malformed content".to_string(),
            KpiError::ConfigError { .. }
            | KpiError::ConfigValidationError { .. }
            | KpiError::InvalidConfigValueError { .. }
            | KpiError::MissingConfigError { .. } => {
                "Fix the configuration file and restart".to_string()
            }
            KpiError::ContractViolation { .. } => {
                "This indicates a bug in value construction; report it with the input data".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Infrastructure => format!("Could not read practice data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::DataContract => format!("Internal data error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, KpiError>;
