use crate::utils::error::{KpiError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(KpiError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions<'a, I>(field_name: &str, files: I, allowed_extensions: &[&str]) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension) => {}
            Some(extension) => {
                return Err(KpiError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(KpiError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 檢查 `low <= high`，用於門檻區間
pub fn validate_ordered(field_name: &str, low: f64, high: f64) -> Result<()> {
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(KpiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("{}..{}", low, high),
            reason: "Lower bound must be finite and not exceed the upper bound".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("provider.aliases.baytown_eod", "https://example.com/export?format=csv").is_ok());
        assert!(validate_url("provider.aliases.baytown_eod", "http://example.com").is_ok());
        assert!(validate_url("provider.aliases.baytown_eod", "").is_err());
        assert!(validate_url("provider.aliases.baytown_eod", "invalid-url").is_err());
        assert!(validate_url("provider.aliases.baytown_eod", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("provider.timeout_seconds", 30, 1).is_ok());
        assert!(validate_positive_number("provider.timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["baytown_eod.csv".to_string(), "humble_front.csv".to_string()];
        assert!(validate_file_extensions("provider.aliases", &files, &["csv"]).is_ok());

        let invalid_files = vec!["baytown_eod.xlsx".to_string()];
        assert!(validate_file_extensions("provider.aliases", &invalid_files, &["csv"]).is_err());

        let no_extension = vec!["baytown_eod".to_string()];
        assert!(validate_file_extensions("provider.aliases", &no_extension, &["csv"]).is_err());
    }

    #[test]
    fn test_validate_ordered() {
        assert!(validate_ordered("thresholds.collection_rate_warn", 50.0, 110.0).is_ok());
        assert!(validate_ordered("thresholds.collection_rate_warn", 110.0, 50.0).is_err());
        assert!(validate_ordered("thresholds.collection_rate_warn", f64::NAN, 50.0).is_err());
    }
}
