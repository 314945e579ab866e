// Adapters layer: concrete DataProvider implementations (csv directory, http csv export, memory).

pub mod csv_dir;
pub mod http_csv;
pub mod in_memory;

use crate::config::ProviderConfig;
use crate::domain::model::Record;
use crate::domain::ports::DataProvider;
use crate::utils::error::Result;
use std::collections::HashMap;

pub use csv_dir::CsvDirectoryProvider;
pub use http_csv::HttpCsvProvider;
pub use in_memory::{InMemoryProvider, SimulatedFailure};

/// Parses CSV bytes with a header row into records. Blank cells become null
/// and rows with no content at all are dropped.
pub fn parse_csv_records(data: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut data = HashMap::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            let value = if cell.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::String(cell.to_string())
            };
            data.insert(header.to_string(), value);
        }
        records.push(Record { data });
    }

    Ok(records)
}

/// 依設定建立對應的 DataProvider
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn DataProvider>> {
    match config {
        ProviderConfig::CsvDir { base_path, aliases } => {
            tracing::info!("📂 Using CSV directory provider at {}", base_path);
            Ok(Box::new(CsvDirectoryProvider::new(base_path, aliases.clone())))
        }
        ProviderConfig::HttpCsv {
            aliases,
            timeout_seconds,
            headers,
        } => {
            tracing::info!("🌐 Using HTTP CSV provider with {} aliases", aliases.len());
            Ok(Box::new(HttpCsvProvider::new(
                aliases.clone(),
                *timeout_seconds,
                headers.clone(),
            )?))
        }
    }
}
