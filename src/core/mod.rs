pub mod aggregator;
pub mod cleaner;
pub mod etl;
pub mod geocoder;
pub mod pacing;
pub mod pipeline;
pub mod spreadsheet;

pub use crate::domain::model::{
    Coordinates, CostEstimate, GeocodeOutcome, GeocodePlan, GeocodeResult, GeocodeSummary,
    OutputFormat, PacingPolicy, PassengerRecord, PlannedLookup,
};
pub use crate::domain::ports::{ConfigProvider, Geocoder, Pacer, Pipeline, Storage};
pub use crate::utils::error::Result;
