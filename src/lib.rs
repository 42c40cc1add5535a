pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    cleaner::{clean_address, AddressCleaner},
    etl::{GeocodingEngine, RunReport},
    geocoder::GoogleGeocoder,
    pipeline::GeocodingPipeline,
};
pub use utils::error::{GeocodeError, Result};
