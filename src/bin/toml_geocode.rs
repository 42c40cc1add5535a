use clap::Parser;
use pickup_geocoder::core::{ConfigProvider, GeocodePlan, GeocodeSummary};
use pickup_geocoder::utils::{confirm, logger};
use pickup_geocoder::{
    GeocodeError, GeocodingEngine, GeocodingPipeline, GoogleGeocoder, LocalStorage, TomlConfig,
};

#[derive(Parser)]
#[command(name = "toml-geocode")]
#[command(about = "Geocode passenger addresses with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "geocode-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Skip the cost confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Dry run - show cleaned queries and estimated cost without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based geocoder");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置；dry run 不需要金鑰
    if let Err(e) = config.validate_config(!args.dry_run) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

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
    display_plan(&plan, args.dry_run);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests were sent");
        return Ok(());
    }

    if plan.cost.requests > 0 && !args.yes && !confirm::confirm("Proceed with geocoding?")? {
        println!("🛑 Cancelled, no requests were sent.");
        return Ok(());
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", config.input_path());
    println!("  Endpoint: {}", config.api_endpoint());
    println!(
        "  Output: {} ({})",
        config.output_path(),
        config.output_format()
    );
    println!("  Pacing: {:?}", config.pacing());
    println!("  Price per request: ${}", config.price_per_request());

    if let Some(timeout) = config.request_timeout() {
        println!("  Request timeout: {}s", timeout.as_secs());
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn display_plan(plan: &GeocodePlan, list_queries: bool) {
    println!("🔍 Geocoding Plan:");
    println!(
        "  Requests: {} of {} records",
        plan.cost.requests,
        plan.lookups.len()
    );
    println!("  Estimated cost: {}", plan.cost);

    if list_queries {
        println!();
        println!("🧹 Cleaned queries:");
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
