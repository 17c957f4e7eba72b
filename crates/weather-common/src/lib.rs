//! Common types shared across the weather relay services.
//!
//! Holds the inbound observation document as published by the collector,
//! the reduced summary accepted by the ingestion API, and the transform
//! between the two.

pub mod error;
pub mod observation;
pub mod summary;
pub mod transform;

pub use error::{TransformError, TransformResult};
pub use observation::{
    Clouds, ConditionDescriptor, Coordinates, Measurements, Precipitation, StationInfo,
    WeatherObservation, WindVector,
};
pub use summary::{SummaryCoordinates, SummaryWind, WeatherCondition, WeatherSummary};
pub use transform::{decode_observation, transform};
