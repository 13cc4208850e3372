//! Forecast wind at arbitrary altitude from discrete pressure levels.

use crate::interpolation::{bracket, lerp, lerp_angle, normalize_degrees};
use crate::models::{VerticalWindSample, WeatherSample, MPS_TO_KNOTS};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A forecast pressure level and its standard-atmosphere altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PressureLevel {
    pub label: &'static str,
    /// Nominal pressure; `None` for the surface entry
    pub hpa: Option<u16>,
    pub altitude_ft: f64,
}

const fn level(label: &'static str, hpa: u16, altitude_ft: f64) -> PressureLevel {
    PressureLevel {
        label,
        hpa: Some(hpa),
        altitude_ft,
    }
}

/// Surface plus the standard ladder up to the lower stratosphere, ascending.
pub const PRESSURE_LEVELS: &[PressureLevel] = &[
    PressureLevel {
        label: "surface",
        hpa: None,
        altitude_ft: 0.0,
    },
    level("1000h", 1000, 364.0),
    level("975h", 975, 1_050.0),
    level("950h", 950, 1_773.0),
    level("925h", 925, 2_500.0),
    level("900h", 900, 3_243.0),
    level("850h", 850, 4_781.0),
    level("800h", 800, 6_394.0),
    level("700h", 700, 9_882.0),
    level("600h", 600, 13_801.0),
    level("500h", 500, 18_289.0),
    level("400h", 400, 23_574.0),
    level("300h", 300, 30_065.0),
    level("250h", 250, 33_999.0),
    level("200h", 200, 38_662.0),
    level("150h", 150, 44_647.0),
    level("100h", 100, 53_083.0),
];

pub fn level_by_label(label: &str) -> Option<&'static PressureLevel> {
    PRESSURE_LEVELS.iter().find(|level| level.label == label)
}

pub fn level_by_hpa(hpa: u16) -> Option<&'static PressureLevel> {
    PRESSURE_LEVELS.iter().find(|level| level.hpa == Some(hpa))
}

/// Two adjacent table levels around an altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelBracket {
    pub lower: &'static PressureLevel,
    pub upper: &'static PressureLevel,
    pub fraction: f64,
}

/// Find the table levels bracketing `altitude_ft`.
///
/// Below the second entry the lowest pair is used with a clamped fraction.
/// Above the top entry the top pair is returned with fraction 1.0; there is
/// no extrapolation beyond the table.
pub fn bracket_levels(altitude_ft: f64) -> LevelBracket {
    let table = PRESSURE_LEVELS;
    let last = table.len() - 1;

    if altitude_ft >= table[last].altitude_ft {
        return LevelBracket {
            lower: &table[last - 1],
            upper: &table[last],
            fraction: 1.0,
        };
    }

    let idx = table
        .windows(2)
        .position(|pair| altitude_ft < pair[1].altitude_ft)
        .unwrap_or(0);
    let lower = &table[idx];
    let upper = &table[idx + 1];
    let span = upper.altitude_ft - lower.altitude_ft;
    let fraction = ((altitude_ft - lower.altitude_ft) / span).clamp(0.0, 1.0);
    LevelBracket {
        lower,
        upper,
        fraction: if fraction.is_nan() { 0.0 } else { fraction },
    }
}

/// Wind resolved at a specific altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWind {
    pub speed_kt: f64,
    pub direction_deg: f64,
    /// Observed level nearest to the requested altitude
    pub level: String,
}

/// Interpolate forecast wind at `altitude_ft` from per-level samples.
///
/// Outside the observed range the nearest level is returned as-is. Speed is
/// interpolated linearly and direction along the shorter arc.
pub fn resolve_wind_at_altitude(
    samples: &[VerticalWindSample],
    altitude_ft: f64,
) -> Option<ResolvedWind> {
    let mut sorted: Vec<&VerticalWindSample> = samples
        .iter()
        .filter(|s| s.altitude_ft.is_finite() && s.speed_kt.is_finite() && s.direction_deg.is_finite())
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.altitude_ft.partial_cmp(&b.altitude_ft).unwrap_or(Ordering::Equal));

    let altitudes: Vec<f64> = sorted.iter().map(|s| s.altitude_ft).collect();
    let b = bracket(&altitudes, altitude_ft);
    let lo = sorted[b.lower];
    let hi = sorted[b.upper];

    if !b.needs_interpolation {
        return Some(ResolvedWind {
            speed_kt: lo.speed_kt,
            direction_deg: lo.direction_deg,
            level: lo.level.clone(),
        });
    }

    let speed = lerp(Some(lo.speed_kt), Some(hi.speed_kt), b.fraction).unwrap_or(lo.speed_kt);
    let direction = lerp_angle(lo.direction_deg, hi.direction_deg, b.fraction);
    let nearest = if b.nearest() == b.lower { lo } else { hi };
    Some(ResolvedWind {
        speed_kt: speed,
        direction_deg: direction,
        level: nearest.level.clone(),
    })
}

/// Replace the sample's wind with the wind resolved at `altitude_ft`.
///
/// Leaves the surface wind untouched when the sample has no vertical profile.
pub fn apply_altitude_wind(sample: &mut WeatherSample, altitude_ft: f64) -> bool {
    match resolve_wind_at_altitude(&sample.vertical_winds, altitude_ft) {
        Some(resolved) => {
            sample.wind_speed_kt = Some(resolved.speed_kt);
            sample.wind_direction_deg = Some(resolved.direction_deg);
            sample.wind_level = Some(resolved.level);
            true
        }
        None => false,
    }
}

/// Eastward (u) and northward (v) wind components in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindComponents {
    pub u_mps: f64,
    pub v_mps: f64,
}

impl WindComponents {
    pub fn new(u_mps: f64, v_mps: f64) -> Self {
        Self { u_mps, v_mps }
    }

    /// Components of a wind blowing from `direction_deg` at `speed_kt`.
    pub fn from_speed_direction(speed_kt: f64, direction_deg: f64) -> Self {
        let speed_mps = speed_kt / MPS_TO_KNOTS;
        let rad = direction_deg.to_radians();
        Self {
            u_mps: -speed_mps * rad.sin(),
            v_mps: -speed_mps * rad.cos(),
        }
    }

    pub fn speed_kt(&self) -> f64 {
        self.u_mps.hypot(self.v_mps) * MPS_TO_KNOTS
    }

    /// Direction the wind blows from, meteorological convention.
    pub fn direction_deg(&self) -> f64 {
        normalize_degrees((-self.u_mps).atan2(-self.v_mps).to_degrees() + 360.0)
    }
}

/// Typed mapping of pressure level to wind components for one forecast hour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelComponents {
    pairs: Vec<(&'static PressureLevel, WindComponents)>,
}

impl LevelComponents {
    /// Collect components for the levels a provider declares.
    ///
    /// Declared labels not in the level table are ignored. If the declared
    /// set yields no pairs, every table level is tried instead.
    pub fn collect<F>(declared: &[&str], mut lookup: F) -> Self
    where
        F: FnMut(&PressureLevel) -> Option<WindComponents>,
    {
        let declared_levels: Vec<&'static PressureLevel> =
            declared.iter().filter_map(|label| level_by_label(label)).collect();
        let mut pairs = collect_pairs(declared_levels, &mut lookup);
        if pairs.is_empty() {
            pairs = collect_pairs(PRESSURE_LEVELS.iter().collect(), &mut lookup);
        }
        pairs.sort_by(|a, b| {
            a.0.altitude_ft
                .partial_cmp(&b.0.altitude_ft)
                .unwrap_or(Ordering::Equal)
        });
        Self { pairs }
    }

    pub fn get(&self, label: &str) -> Option<WindComponents> {
        self.pairs
            .iter()
            .find(|(level, _)| level.label == label)
            .map(|(_, components)| *components)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Decode into per-level samples, ascending by altitude.
    pub fn to_vertical_samples(&self) -> Vec<VerticalWindSample> {
        self.pairs
            .iter()
            .map(|(level, components)| VerticalWindSample {
                level: level.label.to_string(),
                altitude_ft: level.altitude_ft,
                speed_kt: components.speed_kt(),
                direction_deg: components.direction_deg(),
            })
            .collect()
    }
}

fn collect_pairs<F>(
    levels: Vec<&'static PressureLevel>,
    lookup: &mut F,
) -> Vec<(&'static PressureLevel, WindComponents)>
where
    F: FnMut(&PressureLevel) -> Option<WindComponents>,
{
    let mut pairs: Vec<(&'static PressureLevel, WindComponents)> = Vec::new();
    for level in levels {
        if pairs.iter().any(|(seen, _)| seen.label == level.label) {
            continue;
        }
        if let Some(components) = lookup(level).filter(|c| c.u_mps.is_finite() && c.v_mps.is_finite()) {
            pairs.push((level, components));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(level: &str, altitude_ft: f64, speed_kt: f64, direction_deg: f64) -> VerticalWindSample {
        VerticalWindSample {
            level: level.to_string(),
            altitude_ft,
            speed_kt,
            direction_deg,
        }
    }

    #[test]
    fn table_is_ascending() {
        for pair in PRESSURE_LEVELS.windows(2) {
            assert!(pair[0].altitude_ft < pair[1].altitude_ft);
        }
        assert_eq!(level_by_hpa(850).unwrap().label, "850h");
        assert!(level_by_label("surface").unwrap().hpa.is_none());
    }

    #[test]
    fn bracket_levels_contains_altitude() {
        let top = PRESSURE_LEVELS.last().unwrap().altitude_ft;
        let mut altitude = 0.0;
        while altitude <= top {
            let b = bracket_levels(altitude);
            assert!(b.lower.altitude_ft <= altitude, "{altitude}");
            assert!(altitude <= b.upper.altitude_ft, "{altitude}");
            assert!((0.0..=1.0).contains(&b.fraction));
            altitude += 137.0;
        }
    }

    #[test]
    fn bracket_levels_edges() {
        let low = bracket_levels(-500.0);
        assert_eq!(low.lower.label, "surface");
        assert_eq!(low.upper.label, "1000h");
        assert_eq!(low.fraction, 0.0);

        let high = bracket_levels(60_000.0);
        assert_eq!(high.lower.label, "150h");
        assert_eq!(high.upper.label, "100h");
        assert_eq!(high.fraction, 1.0);

        let mid = bracket_levels(5_000.0);
        assert_eq!(mid.lower.label, "850h");
        assert_eq!(mid.upper.label, "800h");
    }

    #[test]
    fn resolve_wind_interpolates_between_levels() {
        let samples = vec![
            sample("800h", 6_394.0, 30.0, 10.0),
            sample("850h", 4_781.0, 20.0, 350.0),
        ];
        let mid_alt = (4_781.0 + 6_394.0) / 2.0;
        let wind = resolve_wind_at_altitude(&samples, mid_alt).unwrap();
        assert!((wind.speed_kt - 25.0).abs() < 1e-9);
        assert!(wind.direction_deg < 1e-6 || wind.direction_deg > 360.0 - 1e-6);
    }

    #[test]
    fn resolve_wind_clamps_outside_range() {
        let samples = vec![
            sample("850h", 4_781.0, 20.0, 270.0),
            sample("700h", 9_882.0, 40.0, 300.0),
        ];
        let below = resolve_wind_at_altitude(&samples, 1_000.0).unwrap();
        assert_eq!(below.speed_kt, 20.0);
        assert_eq!(below.level, "850h");

        let above = resolve_wind_at_altitude(&samples, 20_000.0).unwrap();
        assert_eq!(above.speed_kt, 40.0);
        assert_eq!(above.direction_deg, 300.0);
    }

    #[test]
    fn resolve_wind_single_level_and_empty() {
        assert!(resolve_wind_at_altitude(&[], 3_000.0).is_none());

        let single = vec![sample("925h", 2_500.0, 12.0, 45.0)];
        let wind = resolve_wind_at_altitude(&single, 8_000.0).unwrap();
        assert_eq!(wind, ResolvedWind { speed_kt: 12.0, direction_deg: 45.0, level: "925h".into() });
    }

    #[test]
    fn apply_altitude_wind_overrides_surface() {
        let mut wx = WeatherSample::new(Utc::now());
        wx.wind_speed_kt = Some(5.0);
        wx.wind_direction_deg = Some(180.0);
        assert!(!apply_altitude_wind(&mut wx, 4_000.0));
        assert_eq!(wx.wind_speed_kt, Some(5.0));

        wx.vertical_winds = vec![sample("850h", 4_781.0, 22.0, 250.0)];
        assert!(apply_altitude_wind(&mut wx, 4_000.0));
        assert_eq!(wx.wind_speed_kt, Some(22.0));
        assert_eq!(wx.wind_level.as_deref(), Some("850h"));
    }

    #[test]
    fn component_decoding_uses_from_convention() {
        // Westerly wind blows toward the east: u > 0, v = 0.
        let west = WindComponents::new(10.0, 0.0);
        assert!((west.direction_deg() - 270.0).abs() < 1e-9);
        assert!((west.speed_kt() - 19.43844).abs() < 1e-4);

        // Northerly wind blows toward the south.
        let north = WindComponents::new(0.0, -5.0);
        assert!(north.direction_deg().abs() < 1e-9);

        let south_west = WindComponents::new(3.0, 4.0);
        assert!((south_west.speed_kt() - 5.0 * MPS_TO_KNOTS).abs() < 1e-9);
        assert!((south_west.direction_deg() - 216.869_897_6).abs() < 1e-6);
    }

    #[test]
    fn components_from_speed_direction_decode_back() {
        let c = WindComponents::from_speed_direction(25.0, 135.0);
        assert!((c.speed_kt() - 25.0).abs() < 1e-9);
        assert!((c.direction_deg() - 135.0).abs() < 1e-9);
    }

    #[test]
    fn level_components_use_declared_levels() {
        let table = LevelComponents::collect(&["700h", "850h", "bogus"], |level| match level.label {
            "850h" => Some(WindComponents::new(5.0, 0.0)),
            "700h" => Some(WindComponents::new(0.0, 5.0)),
            "500h" => Some(WindComponents::new(1.0, 1.0)),
            _ => None,
        });
        assert_eq!(table.len(), 2);
        let samples = table.to_vertical_samples();
        assert_eq!(samples[0].level, "850h");
        assert_eq!(samples[1].level, "700h");
        assert!(table.get("500h").is_none());
    }

    #[test]
    fn level_components_fall_back_to_known_levels() {
        let table = LevelComponents::collect(&["9999h"], |level| {
            (level.hpa == Some(500)).then(|| WindComponents::new(-3.0, 0.0))
        });
        assert_eq!(table.len(), 1);
        assert!((table.get("500h").unwrap().u_mps + 3.0).abs() < 1e-12);
    }
}
