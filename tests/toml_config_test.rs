use httpmock::prelude::*;
use pickup_geocoder::core::{ConfigProvider, OutputFormat, PacingPolicy};
use pickup_geocoder::utils::validation::Validate;
use pickup_geocoder::{
    GeocodingEngine, GeocodingPipeline, GoogleGeocoder, LocalStorage, TomlConfig,
};
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, endpoint: &str) -> anyhow::Result<std::path::PathBuf> {
    let input = dir.path().join("passengers.csv");
    std::fs::write(
        &input,
        "\u{feff}Id, Name ,Address,City\n\
         7,Dana,\"Dirección: Calle 45 #12, Torre B, 3er Piso\",Cali\n\
         ,,,\n\
         8,Eli,Carrera 7 20,Cali\n",
    )?;

    let config_path = dir.path().join("geocode-config.toml");
    let content = format!(
        r#"
[geocoding]
endpoint = "{endpoint}"
api_key = "${{PICKUP_GEOCODER_IT_KEY}}"
request_timeout_seconds = 5

[pacing]
every = 1
delay_ms = 0

[input]
path = "{input}"

[output]
path = "{output}"
format = "csv"
"#,
        endpoint = endpoint,
        input = input.display(),
        output = dir.path().join("out").display(),
    );
    std::fs::write(&config_path, content)?;
    Ok(config_path)
}

#[tokio::test]
async fn test_toml_configured_run() -> anyhow::Result<()> {
    std::env::set_var("PICKUP_GEOCODER_IT_KEY", "toml-key");

    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/geocode/json")
            .query_param("key", "toml-key");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "status": "OK",
                "results": [{"geometry": {"location": {"lat": 3.45, "lng": -76.53}}}]
            }));
    });

    let config_path = write_config(&temp_dir, &server.base_url())?;
    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;

    assert_eq!(config.output_format(), OutputFormat::Csv);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    assert_eq!(
        config.pacing(),
        PacingPolicy::FixedInterval {
            every: 1,
            delay: Duration::ZERO
        }
    );

    let geocoder = GoogleGeocoder::with_timeout(
        config.api_endpoint(),
        config.api_key().unwrap_or_default(),
        config.request_timeout(),
    )?;
    let pipeline = GeocodingPipeline::new(LocalStorage::default(), config, geocoder);
    let engine = GeocodingEngine::new(pipeline);

    let plan = tokio_test::assert_ok!(engine.preview().await);
    assert_eq!(plan.lookups.len(), 2);
    assert_eq!(plan.lookups[0].query.as_deref(), Some("Calle 45, Cali"));
    assert_eq!(plan.lookups[1].query.as_deref(), Some("Carrera 7 20, Cali"));

    let report = tokio_test::assert_ok!(engine.run().await);

    api_mock.assert_hits(2);
    assert_eq!(report.summary.geocoded, 2);

    let content = std::fs::read_to_string(&report.output_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "7,Dana,\"Dirección: Calle 45 #12, Torre B, 3er Piso\",Cali,3.45,-76.53"
    );

    std::env::remove_var("PICKUP_GEOCODER_IT_KEY");
    Ok(())
}

#[test]
fn test_token_bucket_pacing_from_toml() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = write_config(&temp_dir, "http://localhost:1/maps/api")?;

    let mut content = std::fs::read_to_string(&config_path)?;
    content = content.replace(
        "[pacing]\nevery = 1\ndelay_ms = 0",
        "[pacing]\nstrategy = \"token_bucket\"\nrate_per_second = 50.0\nburst = 5",
    );
    let config = TomlConfig::from_toml_str(&content)?;

    assert_eq!(
        config.pacing(),
        PacingPolicy::TokenBucket {
            rate_per_second: 50.0,
            burst: 5
        }
    );
    assert!(config.validate_config(false).is_ok());

    Ok(())
}
