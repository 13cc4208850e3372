//! Weather and terrain data sources.

pub mod open_meteo;

use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;
use vfr_core::{GeoPoint, WeatherSample};

pub use open_meteo::{OpenMeteoElevation, OpenMeteoWeather};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("provider response missing {0}")]
    MissingField(&'static str),
    #[error("provider returned {actual} values for {expected} points")]
    CountMismatch { expected: usize, actual: usize },
    #[error("provider URL is not configured")]
    Unconfigured,
}

/// Forecast weather for a position at a given time.
pub trait WeatherProvider {
    fn fetch_weather(
        &self,
        position: GeoPoint,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<WeatherSample, ProviderError>> + Send;
}

/// Terrain elevation in meters MSL, one entry per input point.
///
/// Entries are `None` where the provider had no usable value.
pub trait ElevationProvider {
    fn fetch_elevations(
        &self,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<Vec<Option<f64>>, ProviderError>> + Send;
}
