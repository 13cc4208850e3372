//! Time interpolation over an hourly forecast series.

use crate::interpolation::{bracket, lerp, lerp_angle};
use crate::models::WeatherSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forecast samples for one location, sorted by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    samples: Vec<WeatherSample>,
}

impl HourlyForecast {
    pub fn new(mut samples: Vec<WeatherSample>) -> Self {
        samples.sort_by_key(|sample| sample.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    /// Forecast at `target`, interpolated between the surrounding hours.
    ///
    /// The result is always stamped with `target`. Targets outside the series
    /// clamp to its first or last hour. Cloud base
    /// is only averaged when both hours have one; otherwise the nearer hour
    /// decides whether there is a base at all. The vertical wind profile is
    /// taken from the nearer hour.
    pub fn sample_at(&self, target: DateTime<Utc>) -> Option<WeatherSample> {
        let times: Vec<f64> = self
            .samples
            .iter()
            .map(|s| s.timestamp.timestamp_millis() as f64 / 1000.0)
            .collect();
        if times.is_empty() {
            return None;
        }

        let target_s = target.timestamp_millis() as f64 / 1000.0;
        let b = bracket(&times, target_s);
        let lo = &self.samples[b.lower];
        if !b.needs_interpolation {
            return Some(WeatherSample {
                timestamp: target,
                ..lo.clone()
            });
        }
        let hi = &self.samples[b.upper];
        let t = b.fraction;
        let nearest = &self.samples[b.nearest()];

        let wind_direction_deg = match (lo.wind_direction_deg, hi.wind_direction_deg) {
            (Some(a), Some(b)) => Some(lerp_angle(a, b, t)),
            (a, b) => a.or(b),
        };
        let cloud_base_m = match (lo.cloud_base_m, hi.cloud_base_m) {
            (Some(_), Some(_)) => lerp(lo.cloud_base_m, hi.cloud_base_m, t),
            _ => nearest.cloud_base_m,
        };

        Some(WeatherSample {
            timestamp: target,
            wind_speed_kt: lerp(lo.wind_speed_kt, hi.wind_speed_kt, t),
            wind_direction_deg,
            wind_level: nearest.wind_level.clone(),
            gust_kt: lerp(lo.gust_kt, hi.gust_kt, t),
            temperature_c: lerp(lo.temperature_c, hi.temperature_c, t),
            dew_point_c: lerp(lo.dew_point_c, hi.dew_point_c, t),
            pressure_hpa: lerp(lo.pressure_hpa, hi.pressure_hpa, t),
            cloud_base_m,
            humidity_pct: lerp(lo.humidity_pct, hi.humidity_pct, t),
            visibility_km: lerp(lo.visibility_km, hi.visibility_km, t),
            precipitation_mm: lerp(lo.precipitation_mm, hi.precipitation_mm, t),
            vertical_winds: nearest.vertical_winds.clone(),
        })
    }
}
