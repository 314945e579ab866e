use crate::adapters::parse_csv_records;
use crate::domain::model::Record;
use crate::domain::ports::DataProvider;
use crate::utils::error::{KpiError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;

/// Fetches each alias from a published CSV export URL.
pub struct HttpCsvProvider {
    client: Client,
    aliases: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    timeout_seconds: u64,
}

impl HttpCsvProvider {
    pub fn new(
        aliases: BTreeMap<String, String>,
        timeout_seconds: u64,
        headers: BTreeMap<String, String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            aliases,
            headers,
            timeout_seconds,
        })
    }
}

#[async_trait]
impl DataProvider for HttpCsvProvider {
    async fn fetch(&self, alias: &str) -> Result<Vec<Record>> {
        let url = self.aliases.get(alias).ok_or_else(|| KpiError::DataSourceNotFound {
            alias: alias.to_string(),
        })?;

        // 構建請求並添加自定義標頭
        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        tracing::debug!("🌐 Requesting {} from {}", alias, url);
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                KpiError::DataSourceTimeout {
                    alias: alias.to_string(),
                    seconds: self.timeout_seconds,
                }
            } else {
                KpiError::ApiError(e)
            }
        })?;

        let status = response.status();
        tracing::debug!("🌐 {} responded with {}", alias, status);
        match status {
            StatusCode::NOT_FOUND => {
                return Err(KpiError::DataSourceNotFound {
                    alias: alias.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(KpiError::DataSourceAuth {
                    alias: alias.to_string(),
                    message: format!("server answered {}", status),
                })
            }
            _ => {}
        }
        let response = response.error_for_status()?;

        // 未公開的試算表會回傳登入頁面（HTML）而不是 CSV
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            return Err(KpiError::DataSourceAuth {
                alias: alias.to_string(),
                message: "received an HTML page instead of CSV; is the sheet published?".to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                KpiError::DataSourceTimeout {
                    alias: alias.to_string(),
                    seconds: self.timeout_seconds,
                }
            } else {
                KpiError::ApiError(e)
            }
        })?;
        parse_csv_records(&body)
    }

    fn list_available_aliases(&self) -> Vec<String> {
        self.aliases.keys().cloned().collect()
    }
}
