use crate::domain::model::{
    GeocodeOutcome, GeocodePlan, GeocodeResult, OutputFormat, PacingPolicy, PassengerRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn output_format(&self) -> OutputFormat;
    fn pacing(&self) -> PacingPolicy;
    fn request_timeout(&self) -> Option<Duration>;
    fn price_per_request(&self) -> f64;
}

/// 地理編碼服務；所有失敗都以 `GeocodeOutcome` 回報
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> GeocodeOutcome;
}

#[async_trait]
pub trait Pacer: Send {
    /// 在第 `index` 筆請求送出前呼叫
    async fn pace(&mut self, index: usize);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<PassengerRecord>>;
    async fn transform(&self, records: Vec<PassengerRecord>) -> Result<GeocodeResult>;
    async fn load(&self, result: &GeocodeResult) -> Result<String>;
    fn plan(&self, records: &[PassengerRecord]) -> GeocodePlan;
}
