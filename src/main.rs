use clap::Parser;
use pickup_geocoder::core::{ConfigProvider, GeocodePlan, GeocodeSummary};
use pickup_geocoder::utils::{confirm, logger, validation::Validate};
use pickup_geocoder::{
    CliConfig, GeocodeError, GeocodingEngine, GeocodingPipeline, GoogleGeocoder, LocalStorage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting pickup-geocoder CLI");
    if config.verbose {
        tracing::debug!("Input: {}, output: {}", config.input, config.output_path);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let dry_run = config.dry_run;
    let skip_prompt = config.yes;

    // dry run 沒有金鑰也可以建立用戶端，因為不會送出請求
    let geocoder = match GoogleGeocoder::with_timeout(
        config.api_endpoint(),
        config.api_key().unwrap_or_default(),
        config.request_timeout(),
    ) {
        Ok(geocoder) => geocoder,
        Err(e) => exit_with(&e),
    };

    let storage = LocalStorage::default();
    let pipeline = GeocodingPipeline::new(storage, config, geocoder);
    let engine = GeocodingEngine::new(pipeline);

    let plan = match engine.preview().await {
        Ok(plan) => plan,
        Err(e) => exit_with(&e),
    };
    display_plan(&plan, dry_run);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests were sent");
        return Ok(());
    }

    if plan.cost.requests > 0 && !skip_prompt {
        let accepted = match confirm::confirm("Proceed with geocoding?") {
            Ok(accepted) => accepted,
            Err(e) => exit_with(&GeocodeError::IoError(e)),
        };
        if !accepted {
            println!("🛑 Cancelled, no requests were sent.");
            return Ok(());
        }
    }

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Geocoding completed successfully!");
            println!("✅ Geocoding completed successfully!");
            display_summary(&report.summary);
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &GeocodeError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Geocoding failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code())
}

fn display_plan(plan: &GeocodePlan, list_queries: bool) {
    println!("📋 Geocoding Plan:");
    println!("  Records: {}", plan.lookups.len());
    println!("  Requests: {}", plan.cost.requests);
    println!("  Estimated cost: {}", plan.cost);

    if list_queries {
        println!();
        for lookup in &plan.lookups {
            match &lookup.query {
                Some(query) => println!("  {} -> {}", lookup.id, query),
                None => println!("  {} -> (skipped, empty address)", lookup.id),
            }
        }
    }

    println!();
}

fn display_summary(summary: &GeocodeSummary) {
    println!("📊 Summary:");
    println!("  Total: {}", summary.total);
    println!("  Geocoded: {}", summary.geocoded);
    println!("  Skipped: {}", summary.skipped);
    println!("  Unresolved: {}", summary.unresolved);
}
