pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::core::geocoder::DEFAULT_GEOCODING_ENDPOINT;
    use crate::core::spreadsheet::SUPPORTED_INPUT_EXTENSIONS;
    use crate::core::{ConfigProvider, OutputFormat, PacingPolicy};
    use crate::domain::model::{DEFAULT_PACE_DELAY, DEFAULT_PACE_EVERY};
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use std::time::Duration;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pickup-geocoder")]
    #[command(about = "Clean and geocode passenger pickup addresses from a spreadsheet")]
    pub struct CliConfig {
        /// Input spreadsheet with id, name, address and city columns
        #[arg(short, long)]
        pub input: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, default_value = DEFAULT_GEOCODING_ENDPOINT)]
        pub api_endpoint: String,

        #[arg(long, env = "GEOCODING_API_KEY", hide_env_values = true)]
        pub api_key: Option<String>,

        /// Pause before every N-th request (0 disables pacing)
        #[arg(long, default_value_t = DEFAULT_PACE_EVERY)]
        pub pace_every: usize,

        #[arg(long, default_value_t = DEFAULT_PACE_DELAY.as_millis() as u64)]
        pub pace_delay_ms: u64,

        /// Output format: xlsx or csv
        #[arg(long, default_value = "xlsx")]
        pub format: OutputFormat,

        #[arg(long, default_value = "0.005")]
        pub price_per_request: f64,

        #[arg(long)]
        pub request_timeout_seconds: Option<u64>,

        /// Skip the cost confirmation prompt
        #[arg(short, long)]
        pub yes: bool,

        /// Show cleaned queries and estimated cost without calling the API
        #[arg(long)]
        pub dry_run: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn api_key(&self) -> Option<&str> {
            self.api_key.as_deref()
        }

        fn output_format(&self) -> OutputFormat {
            self.format
        }

        fn pacing(&self) -> PacingPolicy {
            PacingPolicy::FixedInterval {
                every: self.pace_every,
                delay: Duration::from_millis(self.pace_delay_ms),
            }
        }

        fn request_timeout(&self) -> Option<Duration> {
            self.request_timeout_seconds.map(Duration::from_secs)
        }

        fn price_per_request(&self) -> f64 {
            self.price_per_request
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_non_empty_string("input", &self.input)?;
            validation::validate_file_extension("input", &self.input, &SUPPORTED_INPUT_EXTENSIONS)?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_url("api_endpoint", &self.api_endpoint)?;
            validation::validate_range("pace_delay_ms", self.pace_delay_ms, 0, 60_000)?;
            validation::validate_range("price_per_request", self.price_per_request, 0.0, 100.0)?;
            if let Some(timeout) = self.request_timeout_seconds {
                validation::validate_positive_number("request_timeout_seconds", timeout as usize, 1)?;
            }

            // dry run 不打 API，不需要金鑰
            if !self.dry_run {
                validation::validate_api_key("api_key", self.api_key.as_deref())?;
            }
            Ok(())
        }
    }

}
