use anyhow::Context;
use clap::Parser;
use kpi_core::utils::error::ErrorSeverity;
use kpi_core::utils::{logger, validation::Validate};
use kpi_core::{
    build_provider, CliConfig, KpiConfig, KpiError, KpiResponse, KpiService, LogFormat, SourcesConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    match config.log_format {
        LogFormat::Text => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }

    tracing::info!("🚀 Starting kpi-core");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let (kpi_config, sources) = match load_configuration(&config) {
        Ok(loaded) => loaded,
        Err(e) => exit_with(&e),
    };
    tracing::info!("✅ Configuration loaded and validated successfully");

    let provider = match build_provider(&sources.provider) {
        Ok(provider) => provider,
        Err(e) => exit_with(&e),
    };
    let service = KpiService::new(provider, &kpi_config);

    let date = config
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let responses: Vec<KpiResponse> = match (config.location, config.end_date) {
        (Some(location), Some(end)) => service.get_kpis_range(location, date, end).await,
        (Some(location), None) => vec![service.get_kpis(location, date).await],
        (None, _) => service.get_kpis_for_all_locations(date).await,
    };

    let output = if config.pretty {
        serde_json::to_string_pretty(&responses)
    } else {
        serde_json::to_string(&responses)
    }
    .context("Failed to serialize KPI responses")?;
    println!("{}", output);

    Ok(())
}

fn load_configuration(config: &CliConfig) -> kpi_core::Result<(KpiConfig, SourcesConfig)> {
    tracing::info!("📁 Loading calendar from {} and goals from {}", config.calendar, config.goals);
    let kpi_config = KpiConfig::load(&config.calendar, &config.goals)?;

    tracing::info!("📁 Loading sources from {}", config.sources);
    let sources = SourcesConfig::from_file(&config.sources)?;
    sources.validate()?;

    Ok((kpi_config.with_sources(&sources), sources))
}

fn exit_with(e: &KpiError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
