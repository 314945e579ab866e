use crate::domain::model::Record;
use crate::domain::ports::DataProvider;
use crate::utils::error::{KpiError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFailure {
    NotFound,
    Auth,
    Timeout,
}

/// Provider backed by rows held in memory. Used for demos and tests.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    datasets: BTreeMap<String, Vec<Record>>,
    failures: BTreeMap<String, SimulatedFailure>,
    fetches: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, alias: impl Into<String>, rows: Vec<Record>) -> Self {
        self.datasets.insert(alias.into(), rows);
        self
    }

    /// 讓指定 alias 在 fetch 時失敗
    pub fn with_failure(mut self, alias: impl Into<String>, failure: SimulatedFailure) -> Self {
        self.failures.insert(alias.into(), failure);
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    async fn fetch(&self, alias: &str) -> Result<Vec<Record>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = self.failures.get(alias) {
            return Err(match failure {
                SimulatedFailure::NotFound => KpiError::DataSourceNotFound {
                    alias: alias.to_string(),
                },
                SimulatedFailure::Auth => KpiError::DataSourceAuth {
                    alias: alias.to_string(),
                    message: "simulated permission failure".to_string(),
                },
                SimulatedFailure::Timeout => KpiError::DataSourceTimeout {
                    alias: alias.to_string(),
                    seconds: 0,
                },
            });
        }

        self.datasets
            .get(alias)
            .cloned()
            .ok_or_else(|| KpiError::DataSourceNotFound {
                alias: alias.to_string(),
            })
    }

    fn list_available_aliases(&self) -> Vec<String> {
        self.datasets
            .keys()
            .chain(self.failures.keys())
            .cloned()
            .collect()
    }
}
