use crate::domain::model::Record;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of named tabular datasets (one per sheet tab or export).
///
/// Implementations own retries and timeouts. A failed `fetch` is reported
/// once and the caller decides how to degrade.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch(&self, alias: &str) -> Result<Vec<Record>>;

    fn list_available_aliases(&self) -> Vec<String>;

    fn validate_alias(&self, alias: &str) -> bool {
        self.list_available_aliases().iter().any(|a| a == alias)
    }
}

#[async_trait]
impl<P: DataProvider + ?Sized> DataProvider for std::sync::Arc<P> {
    async fn fetch(&self, alias: &str) -> Result<Vec<Record>> {
        (**self).fetch(alias).await
    }

    fn list_available_aliases(&self) -> Vec<String> {
        (**self).list_available_aliases()
    }

    fn validate_alias(&self, alias: &str) -> bool {
        (**self).validate_alias(alias)
    }
}

#[async_trait]
impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    async fn fetch(&self, alias: &str) -> Result<Vec<Record>> {
        (**self).fetch(alias).await
    }

    fn list_available_aliases(&self) -> Vec<String> {
        (**self).list_available_aliases()
    }

    fn validate_alias(&self, alias: &str) -> bool {
        (**self).validate_alias(alias)
    }
}
