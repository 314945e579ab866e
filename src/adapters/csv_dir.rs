use crate::adapters::parse_csv_records;
use crate::domain::model::Record;
use crate::domain::ports::DataProvider;
use crate::utils::error::{KpiError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Reads each alias from a CSV file under `base_path`.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    base_path: PathBuf,
    aliases: BTreeMap<String, String>,
}

impl CsvDirectoryProvider {
    pub fn new(base_path: impl Into<PathBuf>, aliases: BTreeMap<String, String>) -> Self {
        Self {
            base_path: base_path.into(),
            aliases,
        }
    }

    pub fn path_for(&self, alias: &str) -> Option<PathBuf> {
        self.aliases.get(alias).map(|file| self.base_path.join(file))
    }
}

#[async_trait]
impl DataProvider for CsvDirectoryProvider {
    async fn fetch(&self, alias: &str) -> Result<Vec<Record>> {
        let path = self.path_for(alias).ok_or_else(|| KpiError::DataSourceNotFound {
            alias: alias.to_string(),
        })?;

        tracing::debug!("📂 Reading {} from {}", alias, path.display());
        let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => KpiError::DataSourceNotFound {
                alias: alias.to_string(),
            },
            ErrorKind::PermissionDenied => KpiError::DataSourceAuth {
                alias: alias.to_string(),
                message: format!("cannot read {}", path.display()),
            },
            _ => KpiError::IoError(e),
        })?;

        parse_csv_records(&data)
    }

    fn list_available_aliases(&self) -> Vec<String> {
        self.aliases.keys().cloned().collect()
    }
}
