use clap::Parser;
use dm_price_etl::config::CliArgs;
use dm_price_etl::core::ConfigProvider;
use dm_price_etl::utils::{logger, validation::Validate};
use dm_price_etl::{EtlEngine, EtlError, LocalStorage, ProductPipeline, TomlConfig};

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

fn load_config(args: &CliArgs) -> Result<TomlConfig, EtlError> {
    let mut config = match &args.config {
        Some(path) => TomlConfig::from_file(path)?,
        None => TomlConfig::default(),
    };

    // 應用命令列覆蓋設定
    if let Some(output_path) = &args.output_path {
        config.load.output_path = output_path.clone();
    }

    Ok(config)
}

fn display_config_summary(config: &TomlConfig) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Source: {}", config.api_endpoint());
    println!("  Output: {}", config.output_path());
    println!(
        "  Categories: {}",
        config
            .categories()
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Name filter: {}", config.name_filter());
    println!();
}

fn perform_dry_run(pipeline: &ProductPipeline<LocalStorage, TomlConfig>) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Requests:");
    for url in pipeline.planned_requests() {
        println!("  GET {}", url);
    }

    println!();
    println!("💾 Files:");
    for file in pipeline.planned_outputs() {
        println!("  {}/{}", pipeline.config().output_path(), file);
    }

    println!();
    println!("✅ Dry run analysis complete. Nothing was fetched or written.");
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 載入配置
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(args.verbose, None);
            exit_with(&e);
        }
    };

    // 初始化日誌
    logger::init_cli_logger(args.verbose, config.log_level());

    tracing::info!("🚀 Starting dm-price-etl");
    if let Some(path) = &args.config {
        tracing::info!("📁 Configuration loaded from: {}", path);
    }
    tracing::debug!("Config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    display_config_summary(&config);

    let monitor_enabled = args.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = match ProductPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(&e),
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&pipeline);
        return;
    }

    // 創建ETL引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            let output_path = engine.pipeline().config().output_path();
            for file in report.files() {
                println!("📁 {}/{}", output_path, file);
            }
        }
        Err(e) => exit_with(&e),
    }
}
