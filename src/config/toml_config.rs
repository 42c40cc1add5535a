use crate::core::geocoder::DEFAULT_GEOCODING_ENDPOINT;
use crate::core::spreadsheet::SUPPORTED_INPUT_EXTENSIONS;
use crate::core::pacing::{MAX_RATE_PER_SECOND, MIN_RATE_PER_SECOND};
use crate::core::{ConfigProvider, OutputFormat, PacingPolicy};
use crate::domain::model::{DEFAULT_PACE_DELAY, DEFAULT_PACE_EVERY};
use crate::utils::error::{GeocodeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|e| panic!("invalid env var pattern: {}", e))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub cost: CostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            request_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStrategy {
    #[default]
    Fixed,
    TokenBucket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default)]
    pub strategy: PacingStrategy,
    pub every: Option<usize>,
    pub delay_ms: Option<u64>,
    pub rate_per_second: Option<f64>,
    pub burst: Option<u32>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            strategy: PacingStrategy::Fixed,
            every: None,
            delay_ms: None,
            rate_per_second: None,
            burst: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_price_per_request")]
    pub price_per_request: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            price_per_request: default_price_per_request(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_GEOCODING_ENDPOINT.to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_price_per_request() -> f64 {
    0.005
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GeocodeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GeocodeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEOCODING_API_KEY})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 尚未替換的 `${VAR}` 視為沒有金鑰
    fn resolved_api_key(&self) -> Option<&str> {
        self.geocoding
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !ENV_VAR_PATTERN.is_match(key))
    }

    pub fn validate_config(&self, require_api_key: bool) -> Result<()> {
        validation::validate_url("geocoding.endpoint", &self.geocoding.endpoint)?;
        validation::validate_non_empty_string("input.path", &self.input.path)?;
        validation::validate_file_extension(
            "input.path",
            &self.input.path,
            &SUPPORTED_INPUT_EXTENSIONS,
        )?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_range(
            "cost.price_per_request",
            self.cost.price_per_request,
            0.0,
            100.0,
        )?;

        match self.pacing.strategy {
            PacingStrategy::Fixed => {
                if let Some(delay_ms) = self.pacing.delay_ms {
                    validation::validate_range("pacing.delay_ms", delay_ms, 0, 60_000)?;
                }
            }
            PacingStrategy::TokenBucket => {
                let rate = self.pacing.rate_per_second.ok_or_else(|| {
                    GeocodeError::MissingConfigError {
                        field: "pacing.rate_per_second".to_string(),
                    }
                })?;
                if !rate.is_finite() {
                    return Err(GeocodeError::InvalidConfigValueError {
                        field: "pacing.rate_per_second".to_string(),
                        value: rate.to_string(),
                        reason: "Rate must be a finite number".to_string(),
                    });
                }
                validation::validate_range(
                    "pacing.rate_per_second",
                    rate,
                    MIN_RATE_PER_SECOND,
                    MAX_RATE_PER_SECOND,
                )?;
            }
        }

        if require_api_key {
            validation::validate_api_key("geocoding.api_key", self.resolved_api_key())?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn api_endpoint(&self) -> &str {
        &self.geocoding.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.resolved_api_key()
    }

    fn output_format(&self) -> OutputFormat {
        self.output.format
    }

    fn pacing(&self) -> PacingPolicy {
        match self.pacing.strategy {
            PacingStrategy::Fixed => PacingPolicy::FixedInterval {
                every: self.pacing.every.unwrap_or(DEFAULT_PACE_EVERY),
                delay: self
                    .pacing
                    .delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_PACE_DELAY),
            },
            PacingStrategy::TokenBucket => PacingPolicy::TokenBucket {
                rate_per_second: self.pacing.rate_per_second.unwrap_or(1.0),
                burst: self.pacing.burst.unwrap_or(1),
            },
        }
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.geocoding.request_timeout_seconds.map(Duration::from_secs)
    }

    fn price_per_request(&self) -> f64 {
        self.cost.price_per_request
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config(true)
    }
}
