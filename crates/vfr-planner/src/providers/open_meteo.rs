//! Open-Meteo forecast and elevation clients.

use super::{ElevationProvider, ProviderError, WeatherProvider};
use crate::cache::ElevationCache;
use crate::config::Config;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use vfr_core::vertical_wind::{PressureLevel, PRESSURE_LEVELS};
use vfr_core::{GeoPoint, HourlyForecast, LevelComponents, WeatherSample, WindComponents};

const SURFACE_VARIABLES: &[&str] = &[
    "temperature_2m",
    "dew_point_2m",
    "relative_humidity_2m",
    "pressure_msl",
    "cloud_cover",
    "visibility",
    "precipitation",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

/// Cloud cover (percent) at which a base is derived at all.
const CLOUD_COVER_BASE_PCT: f64 = 50.0;
/// Convective cloud base estimate: meters per degree C of dew-point spread.
const BASE_M_PER_SPREAD_C: f64 = 125.0;
/// Lowest derived base; saturated air reports fog rather than clear sky.
const MIN_CLOUD_BASE_M: f64 = 30.0;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(flatten)]
    series: HashMap<String, Vec<Option<f64>>>,
}

impl HourlyBlock {
    fn value(&self, name: &str, hour: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|values| values.get(hour).copied().flatten())
            .filter(|v| v.is_finite())
    }

    /// Table labels of the pressure levels this response carries wind for.
    fn declared_levels(&self) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = self
            .series
            .keys()
            .filter_map(|key| {
                let level = key
                    .strip_prefix("wind_speed_")
                    .or_else(|| key.strip_prefix("wind_u_component_"))?
                    .strip_suffix("hPa")?;
                let hpa: u16 = level.parse().ok()?;
                vfr_core::vertical_wind::level_by_hpa(hpa).map(|l| l.label)
            })
            .collect();
        if self.series.contains_key("wind_speed_10m") {
            labels.push("surface");
        }
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    fn level_wind(&self, level: &PressureLevel, hour: usize) -> Option<WindComponents> {
        let Some(hpa) = level.hpa else {
            return self.speed_direction("wind_speed_10m", "wind_direction_10m", hour);
        };
        let u = self.value(&format!("wind_u_component_{hpa}hPa"), hour);
        let v = self.value(&format!("wind_v_component_{hpa}hPa"), hour);
        match (u, v) {
            (Some(u), Some(v)) => Some(WindComponents::new(u, v)),
            _ => self.speed_direction(
                &format!("wind_speed_{hpa}hPa"),
                &format!("wind_direction_{hpa}hPa"),
                hour,
            ),
        }
    }

    fn speed_direction(&self, speed: &str, direction: &str, hour: usize) -> Option<WindComponents> {
        let speed_kt = self.value(speed, hour)?;
        let direction_deg = self.value(direction, hour)?;
        Some(WindComponents::from_speed_direction(speed_kt, direction_deg))
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, ProviderError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|err| ProviderError::Decode(format!("bad timestamp {raw:?}: {err}")))
}

/// Estimated cloud base in meters AGL.
///
/// `None` only when cover is known to be below the threshold. Overcast or
/// unknown cover without a usable dew-point spread gets the lowest base.
fn estimate_cloud_base_m(cloud_cover_pct: Option<f64>, temperature_c: Option<f64>, dew_point_c: Option<f64>) -> Option<f64> {
    if cloud_cover_pct.is_some_and(|cover| cover < CLOUD_COVER_BASE_PCT) {
        return None;
    }
    let base_m = match (temperature_c, dew_point_c) {
        (Some(t), Some(d)) => ((t - d).max(0.0) * BASE_M_PER_SPREAD_C).max(MIN_CLOUD_BASE_M),
        _ => MIN_CLOUD_BASE_M,
    };
    Some(base_m)
}

fn parse_hourly(block: &HourlyBlock) -> Result<HourlyForecast, ProviderError> {
    let declared = block.declared_levels();
    let mut samples = Vec::with_capacity(block.time.len());

    for (hour, raw_time) in block.time.iter().enumerate() {
        let mut sample = WeatherSample::new(parse_time(raw_time)?);
        sample.wind_speed_kt = block.value("wind_speed_10m", hour);
        sample.wind_direction_deg = block.value("wind_direction_10m", hour);
        sample.gust_kt = block.value("wind_gusts_10m", hour);
        sample.temperature_c = block.value("temperature_2m", hour);
        sample.dew_point_c = block.value("dew_point_2m", hour);
        sample.pressure_hpa = block.value("pressure_msl", hour);
        sample.humidity_pct = block.value("relative_humidity_2m", hour);
        sample.visibility_km = block.value("visibility", hour).map(|m| m / 1000.0);
        sample.precipitation_mm = block.value("precipitation", hour);
        sample.cloud_base_m = estimate_cloud_base_m(
            block.value("cloud_cover", hour),
            sample.temperature_c,
            sample.dew_point_c,
        );

        let levels = LevelComponents::collect(&declared, |level| block.level_wind(level, hour));
        sample.vertical_winds = levels.to_vertical_samples();
        samples.push(sample);
    }

    Ok(HourlyForecast::new(samples))
}

fn hourly_variables() -> String {
    let mut variables: Vec<String> = SURFACE_VARIABLES.iter().map(|v| v.to_string()).collect();
    for hpa in PRESSURE_LEVELS.iter().filter_map(|level| level.hpa) {
        variables.push(format!("wind_speed_{hpa}hPa"));
        variables.push(format!("wind_direction_{hpa}hPa"));
    }
    variables.join(",")
}

#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoWeather {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.weather_provider_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_s.max(3)),
        }
    }
}

impl WeatherProvider for OpenMeteoWeather {
    async fn fetch_weather(&self, position: GeoPoint, at: DateTime<Utc>) -> Result<WeatherSample, ProviderError> {
        if self.base_url.trim().is_empty() {
            return Err(ProviderError::Unconfigured);
        }
        let start = (at - ChronoDuration::hours(1)).format("%Y-%m-%d").to_string();
        let end = (at + ChronoDuration::hours(1)).format("%Y-%m-%d").to_string();

        tracing::debug!("Fetching forecast for {:.4},{:.4} at {}", position.lat, position.lon, at);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", format!("{:.6}", position.lat)),
                ("longitude", format!("{:.6}", position.lon)),
                ("hourly", hourly_variables()),
                ("wind_speed_unit", "kn".to_string()),
                ("timezone", "GMT".to_string()),
                ("start_date", start),
                ("end_date", end),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body = response.bytes().await?;
        decode_forecast(&body, at)
    }
}

fn decode_forecast(body: &[u8], at: DateTime<Utc>) -> Result<WeatherSample, ProviderError> {
    let payload: ForecastResponse =
        serde_json::from_slice(body).map_err(|err| ProviderError::Decode(err.to_string()))?;
    let hourly = payload.hourly.ok_or(ProviderError::MissingField("hourly"))?;
    parse_hourly(&hourly)?
        .sample_at(at)
        .ok_or(ProviderError::MissingField("hourly.time"))
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    elevation: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoElevation {
    client: Client,
    base_url: String,
    timeout: Duration,
    max_points: usize,
    cache: Arc<ElevationCache>,
}

impl OpenMeteoElevation {
    pub fn new(client: Client, config: &Config, cache: Arc<ElevationCache>) -> Self {
        Self {
            client,
            base_url: config.elevation_provider_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_s.max(3)),
            max_points: config.elevation_max_points_per_request.max(1),
            cache,
        }
    }

    async fn fetch_chunk(&self, chunk: &[GeoPoint]) -> Result<Vec<Option<f64>>, ProviderError> {
        let latitudes = join_params(chunk.iter().map(|p| p.lat));
        let longitudes = join_params(chunk.iter().map(|p| p.lon));

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("latitude", latitudes), ("longitude", longitudes)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body = response.bytes().await?;
        decode_elevations(&body)
    }
}

fn decode_elevations(body: &[u8]) -> Result<Vec<Option<f64>>, ProviderError> {
    let payload: ElevationResponse =
        serde_json::from_slice(body).map_err(|err| ProviderError::Decode(err.to_string()))?;
    let values = payload.elevation.ok_or(ProviderError::MissingField("elevation"))?;
    Ok(values
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()))
        .collect())
}

impl ElevationProvider for OpenMeteoElevation {
    async fn fetch_elevations(&self, points: &[GeoPoint]) -> Result<Vec<Option<f64>>, ProviderError> {
        if self.base_url.trim().is_empty() {
            return Err(ProviderError::Unconfigured);
        }
        fetch_uncached(points, &self.cache, self.max_points, |chunk| async move {
            self.fetch_chunk(&chunk).await
        })
        .await
    }
}

/// Serve cached points locally and fetch the rest in chunks of `max_points`.
///
/// A failed chunk leaves its points empty. The call fails only when every
/// chunk failed and no point has an elevation.
async fn fetch_uncached<F, Fut>(
    points: &[GeoPoint],
    cache: &ElevationCache,
    max_points: usize,
    mut fetch_chunk: F,
) -> Result<Vec<Option<f64>>, ProviderError>
where
    F: FnMut(Vec<GeoPoint>) -> Fut,
    Fut: Future<Output = Result<Vec<Option<f64>>, ProviderError>>,
{
    let mut elevations: Vec<Option<f64>> = points.iter().map(|p| cache.get(*p)).collect();
    let missing: Vec<usize> = (0..points.len())
        .filter(|idx| elevations[*idx].is_none() && points[*idx].is_finite())
        .collect();
    if missing.is_empty() {
        return Ok(elevations);
    }

    let mut failures = 0usize;
    let mut last_error = None;
    let chunks: Vec<&[usize]> = missing.chunks(max_points.max(1)).collect();
    for indices in &chunks {
        let chunk: Vec<GeoPoint> = indices.iter().map(|idx| points[*idx]).collect();
        let result = fetch_chunk(chunk).await.and_then(|values| {
            if values.len() == indices.len() {
                Ok(values)
            } else {
                Err(ProviderError::CountMismatch {
                    expected: indices.len(),
                    actual: values.len(),
                })
            }
        });
        match result {
            Ok(values) => {
                for (idx, value) in indices.iter().zip(values) {
                    if let Some(elevation_m) = value {
                        cache.insert(points[*idx], elevation_m);
                    }
                    elevations[*idx] = value;
                }
            }
            Err(err) => {
                tracing::warn!("Elevation chunk of {} points failed: {}", indices.len(), err);
                failures += 1;
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) if failures == chunks.len() && elevations.iter().all(Option::is_none) => Err(err),
        _ => Ok(elevations),
    }
}

fn join_params(values: impl Iterator<Item = f64>) -> String {
    let mut buf = String::new();
    for (idx, value) in values.enumerate() {
        if idx > 0 {
            buf.push(',');
        }
        buf.push_str(&format!("{:.6}", value));
    }
    buf
}
