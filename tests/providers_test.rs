use chrono::NaiveDate;
use httpmock::prelude::*;
use kpi_core::config::ProviderConfig;
use kpi_core::{
    build_provider, CsvDirectoryProvider, HttpCsvProvider, KpiConfig, KpiService, Location,
    ResponseStatus, UnavailableReason,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

const BILLING_CSV: &str = "\
Timestamp,Date,Total Production Income,Adjustments Today,Write-offs Today,Patient Income Today,Unearned Income Today,Insurance Income Today,New Patients Today
1/6/2025 18:05:00,1/6/2025,\"$8,000.00\",$200.00,$500.00,\"$3,000.00\",$0.00,\"$4,623.00\",4
";

const FRONT_CSV: &str = "\
Timestamp,Date,Treatments Presented,Treatments Scheduled,Same Day Treatment,Total Hygiene Appointments,Patients Not Reappointed
1/6/2025 17:30:00,1/6/2025,\"$10,000.00\",\"$6,000.00\",\"$2,000.00\",20,3
";

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

fn aliases(pairs: &[(&str, String)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(alias, target)| (alias.to_string(), target.clone()))
        .collect()
}

#[tokio::test]
async fn test_end_to_end_with_csv_directory() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("baytown_eod.csv"), BILLING_CSV).unwrap();
    std::fs::write(temp_dir.path().join("baytown_front.csv"), FRONT_CSV).unwrap();

    let provider = CsvDirectoryProvider::new(
        temp_dir.path(),
        aliases(&[
            ("baytown_eod", "baytown_eod.csv".to_string()),
            ("baytown_front", "baytown_front.csv".to_string()),
        ]),
    );
    let service = KpiService::new(provider, &KpiConfig::default());

    let response = service.get_kpis(Location::Baytown, monday()).await;
    assert_eq!(response.status(), ResponseStatus::Open);
    assert_eq!(response.values().available_count(), 5);
    assert_eq!(response.values().production_total.value(), Some(7700.0));
    assert!(response.freshness().is_current);

    // Humble 沒有設定任何 alias
    let humble = service.get_kpis(Location::Humble, monday()).await;
    assert_eq!(humble.status(), ResponseStatus::Error);
}

#[tokio::test]
async fn test_end_to_end_with_http_exports() {
    let server = MockServer::start();
    let billing_mock = server.mock(|when, then| {
        when.method(GET).path("/humble/eod");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body(BILLING_CSV);
    });
    let front_mock = server.mock(|when, then| {
        when.method(GET).path("/humble/front");
        then.status(403);
    });

    let provider = HttpCsvProvider::new(
        aliases(&[
            ("humble_eod", server.url("/humble/eod")),
            ("humble_front", server.url("/humble/front")),
        ]),
        5,
        BTreeMap::new(),
    )
    .unwrap();
    let service = KpiService::new(provider, &KpiConfig::default());

    let response = service.get_kpis(Location::Humble, monday()).await;
    billing_mock.assert();
    front_mock.assert();

    // 只有前台資料失敗：狀態仍為 open
    assert_eq!(response.status(), ResponseStatus::Open);
    let values = response.values();
    assert!(values.production_total.is_available());
    assert!(values.collection_rate.is_available());
    assert_eq!(
        values.case_acceptance.unavailable_reason(),
        Some(UnavailableReason::InfrastructureError)
    );
    assert_eq!(
        values.hygiene_reappointment.unavailable_reason(),
        Some(UnavailableReason::InfrastructureError)
    );
}

#[tokio::test]
async fn test_built_provider_drives_service() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("eod.csv"), BILLING_CSV).unwrap();
    std::fs::write(temp_dir.path().join("front.csv"), FRONT_CSV).unwrap();

    let config = ProviderConfig::CsvDir {
        base_path: temp_dir.path().to_string_lossy().to_string(),
        aliases: aliases(&[
            ("baytown_eod", "eod.csv".to_string()),
            ("baytown_front", "front.csv".to_string()),
        ]),
    };
    let provider = build_provider(&config).unwrap();
    let service = KpiService::new(provider, &KpiConfig::default());

    let response = service.get_kpis(Location::Baytown, monday()).await;
    assert_eq!(response.values().available_count(), 5);
}
