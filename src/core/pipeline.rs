use crate::core::aggregator::{geocode_records, plan_lookups};
use crate::core::cleaner::AddressCleaner;
use crate::core::spreadsheet::{export_file_name, parse_records, write_records};
use crate::core::{
    ConfigProvider, GeocodePlan, GeocodeResult, Geocoder, PassengerRecord, Pipeline, Storage,
};
use crate::utils::error::Result;
use chrono::Utc;

pub struct GeocodingPipeline<S: Storage, C: ConfigProvider, G: Geocoder> {
    storage: S,
    config: C,
    geocoder: G,
    cleaner: AddressCleaner,
}

impl<S: Storage, C: ConfigProvider, G: Geocoder> GeocodingPipeline<S, C, G> {
    pub fn new(storage: S, config: C, geocoder: G) -> Self {
        Self {
            storage,
            config,
            geocoder,
            cleaner: AddressCleaner::default(),
        }
    }

    pub fn with_cleaner(mut self, cleaner: AddressCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, G: Geocoder> Pipeline for GeocodingPipeline<S, C, G> {
    async fn extract(&self) -> Result<Vec<PassengerRecord>> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input file: {}", input_path);

        let data = self.storage.read_file(input_path).await?;
        let records = parse_records(input_path, &data)?;

        tracing::info!("📂 Loaded {} passengers from {}", records.len(), input_path);
        Ok(records)
    }

    async fn transform(&self, records: Vec<PassengerRecord>) -> Result<GeocodeResult> {
        // 每次執行建立新的節流器，狀態不跨執行保留
        let mut pacer = self.config.pacing().build();
        let result =
            geocode_records(&records, &self.cleaner, &self.geocoder, pacer.as_mut()).await;
        Ok(result)
    }

    async fn load(&self, result: &GeocodeResult) -> Result<String> {
        let format = self.config.output_format();
        let file_name = export_file_name(format, Utc::now().date_naive());
        let output_path = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            file_name
        );

        let data = write_records(&result.records, format)?;
        tracing::debug!("Writing {} ({} bytes)", output_path, data.len());
        self.storage.write_file(&output_path, &data).await?;

        Ok(output_path)
    }

    fn plan(&self, records: &[PassengerRecord]) -> GeocodePlan {
        plan_lookups(records, &self.cleaner, self.config.price_per_request())
    }
}
