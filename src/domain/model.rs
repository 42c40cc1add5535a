use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 一筆乘客上車點資料，地理編碼成功後才會帶有座標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PassengerRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            city: city.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(&self, coordinates: Coordinates) -> Self {
        Self {
            latitude: Some(coordinates.lat),
            longitude: Some(coordinates.lng),
            ..self.clone()
        }
    }

    pub fn is_geocoded(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// 單次地理編碼請求的結果；失敗不會往上拋錯
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Found(Coordinates),
    ZeroResults,
    Failed { reason: String },
}

impl GeocodeOutcome {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeocodeOutcome::Found(coordinates) => Some(*coordinates),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeocodeSummary {
    pub total: usize,
    pub geocoded: usize,
    /// 清理後地址為空的筆數，不會送出請求
    pub skipped: usize,
    /// 查無結果或請求失敗
    pub unresolved: usize,
}

#[derive(Debug, Clone)]
pub struct GeocodeResult {
    pub records: Vec<PassengerRecord>,
    pub summary: GeocodeSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLookup {
    pub id: String,
    /// 清理後地址為空時為 `None`，該筆會被略過
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    pub requests: usize,
    pub price_per_request: f64,
    pub total_usd: f64,
}

impl CostEstimate {
    pub fn new(requests: usize, price_per_request: f64) -> Self {
        Self {
            requests,
            price_per_request,
            total_usd: requests as f64 * price_per_request,
        }
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "USD ${:.2} ({} requests x ${})",
            self.total_usd, self.requests, self.price_per_request
        )
    }
}

#[derive(Debug, Clone)]
pub struct GeocodePlan {
    pub lookups: Vec<PlannedLookup>,
    pub cost: CostEstimate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!(
                "unsupported output format '{}', expected xlsx or csv",
                other
            )),
        }
    }
}

pub const DEFAULT_PACE_EVERY: usize = 10;
pub const DEFAULT_PACE_DELAY: Duration = Duration::from_millis(100);

/// 請求節流策略
#[derive(Debug, Clone, PartialEq)]
pub enum PacingPolicy {
    /// 每 `every` 筆請求前暫停 `delay`
    FixedInterval { every: usize, delay: Duration },
    TokenBucket { rate_per_second: f64, burst: u32 },
}

impl Default for PacingPolicy {
    fn default() -> Self {
        PacingPolicy::FixedInterval {
            every: DEFAULT_PACE_EVERY,
            delay: DEFAULT_PACE_DELAY,
        }
    }
}
