//! VFR condition thresholds and per-point classification.

use crate::models::{Condition, ConditionTier, ProfilePoint, WeatherSample, WindReading};
use serde::{Deserialize, Serialize};

/// Poor/marginal limits for each check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VfrMinimums {
    /// Wind limits in knots, applied at departure and arrival only
    pub wind_poor_kt: f64,
    pub wind_marginal_kt: f64,
    /// Gust limits in knots, applied at departure and arrival only
    pub gust_poor_kt: f64,
    pub gust_marginal_kt: f64,
    /// Ceiling limits in feet AGL
    pub ceiling_poor_ft: f64,
    pub ceiling_marginal_ft: f64,
    /// Visibility limits in kilometers
    pub visibility_poor_km: f64,
    pub visibility_marginal_km: f64,
    /// Precipitation limits in millimeters
    pub precipitation_poor_mm: f64,
    pub precipitation_marginal_mm: f64,
    /// Altitude above terrain, feet
    pub terrain_clearance_poor_ft: f64,
    pub terrain_clearance_marginal_ft: f64,
    /// Distance below cloud base, feet
    pub cloud_clearance_poor_ft: f64,
    pub cloud_clearance_marginal_ft: f64,
}

impl Default for VfrMinimums {
    fn default() -> Self {
        Self {
            wind_poor_kt: 25.0,
            wind_marginal_kt: 20.0,
            gust_poor_kt: 35.0,
            gust_marginal_kt: 30.0,
            ceiling_poor_ft: 1500.0,
            ceiling_marginal_ft: 2000.0,
            visibility_poor_km: 5.0,
            visibility_marginal_km: 8.0,
            precipitation_poor_mm: 5.0,
            precipitation_marginal_mm: 2.0,
            terrain_clearance_poor_ft: 500.0,
            terrain_clearance_marginal_ft: 1000.0,
            cloud_clearance_poor_ft: 200.0,
            cloud_clearance_marginal_ft: 500.0,
        }
    }
}

pub const MISSING_WIND_REASON: &str = "Missing wind data";
pub const IMC_REASON: &str = "Aircraft above cloud base (IMC)";

/// Accumulates independent poor/marginal flags and their reasons.
#[derive(Debug, Default)]
struct Assessment {
    poor: bool,
    marginal: bool,
    reasons: Vec<String>,
}

impl Assessment {
    /// Flag `value` exceeding the limits (strictly greater).
    fn above(&mut self, value: f64, poor: f64, marginal: f64, poor_reason: String, marginal_reason: String) {
        if value > poor {
            self.poor = true;
            self.reasons.push(poor_reason);
        } else if value > marginal {
            self.marginal = true;
            self.reasons.push(marginal_reason);
        }
    }

    /// Flag `value` falling short of the limits (strictly less).
    fn below(&mut self, value: f64, poor: f64, marginal: f64, poor_reason: String, marginal_reason: String) {
        if value < poor {
            self.poor = true;
            self.reasons.push(poor_reason);
        } else if value < marginal {
            self.marginal = true;
            self.reasons.push(marginal_reason);
        }
    }

    fn finish(self) -> Condition {
        if self.poor {
            Condition::new(ConditionTier::Poor, self.reasons)
        } else if self.marginal {
            Condition::new(ConditionTier::Marginal, self.reasons)
        } else {
            Condition::new(ConditionTier::Good, Vec::new())
        }
    }
}

/// Classify one profile point with the default minimums.
pub fn classify(
    point: &ProfilePoint,
    planned_altitude_ft: f64,
    weather: Option<&WeatherSample>,
    is_terminal: bool,
) -> Condition {
    classify_with_minimums(point, planned_altitude_ft, weather, is_terminal, &VfrMinimums::default())
}

/// Classify one profile point.
///
/// Calm wind (exactly 0 kt) is reported as missing wind data, same as an
/// absent reading. Gust, visibility and precipitation default to benign
/// values when absent. Cloud checks only run when the point has a cloud base.
pub fn classify_with_minimums(
    point: &ProfilePoint,
    planned_altitude_ft: f64,
    weather: Option<&WeatherSample>,
    is_terminal: bool,
    minimums: &VfrMinimums,
) -> Condition {
    let wind_kt = match point.wind {
        WindReading::Measured(speed) => speed,
        WindReading::Unknown | WindReading::Calm => {
            return Condition::new(ConditionTier::Unknown, vec![MISSING_WIND_REASON.to_string()]);
        }
    };

    if let Some(base) = point.cloud_base_ft {
        if planned_altitude_ft >= base {
            return Condition::new(ConditionTier::Poor, vec![IMC_REASON.to_string()]);
        }
    }

    let mut a = Assessment::default();

    if is_terminal {
        a.above(
            wind_kt,
            minimums.wind_poor_kt,
            minimums.wind_marginal_kt,
            format!("Strong wind ({wind_kt:.0} kt)"),
            format!("Elevated wind ({wind_kt:.0} kt)"),
        );
        if let Some(gust) = weather.and_then(|w| w.gust_kt).filter(|g| g.is_finite()) {
            a.above(
                gust,
                minimums.gust_poor_kt,
                minimums.gust_marginal_kt,
                format!("Strong gusts ({gust:.0} kt)"),
                format!("Gusty conditions ({gust:.0} kt)"),
            );
        }
    }

    if let Some(base) = point.cloud_base_ft {
        let ceiling = base - point.terrain_ft.unwrap_or(0.0);
        a.below(
            ceiling,
            minimums.ceiling_poor_ft,
            minimums.ceiling_marginal_ft,
            format!("Low ceiling ({ceiling:.0} ft AGL)"),
            format!("Marginal ceiling ({ceiling:.0} ft AGL)"),
        );
    }

    if let Some(visibility) = weather.and_then(|w| w.visibility_km).filter(|v| v.is_finite()) {
        a.below(
            visibility,
            minimums.visibility_poor_km,
            minimums.visibility_marginal_km,
            format!("Poor visibility ({visibility:.1} km)"),
            format!("Reduced visibility ({visibility:.1} km)"),
        );
    }

    if let Some(precip) = weather.and_then(|w| w.precipitation_mm).filter(|p| p.is_finite()) {
        a.above(
            precip,
            minimums.precipitation_poor_mm,
            minimums.precipitation_marginal_mm,
            format!("Heavy precipitation ({precip:.1} mm)"),
            format!("Moderate precipitation ({precip:.1} mm)"),
        );
    }

    if let Some(terrain) = point.terrain_ft {
        let clearance = planned_altitude_ft - terrain;
        a.below(
            clearance,
            minimums.terrain_clearance_poor_ft,
            minimums.terrain_clearance_marginal_ft,
            format!("Insufficient terrain clearance ({clearance:.0} ft)"),
            format!("Low terrain clearance ({clearance:.0} ft)"),
        );
    }

    if let Some(base) = point.cloud_base_ft {
        let clearance = base - planned_altitude_ft;
        a.below(
            clearance,
            minimums.cloud_clearance_poor_ft,
            minimums.cloud_clearance_marginal_ft,
            format!("Too close to cloud base ({clearance:.0} ft below)"),
            format!("Limited cloud clearance ({clearance:.0} ft below)"),
        );
    }

    a.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use chrono::Utc;

    fn point(wind: WindReading) -> ProfilePoint {
        ProfilePoint {
            position: GeoPoint::new(0.0, 0.0),
            distance_nm: 0.0,
            altitude_ft: 4500.0,
            terrain_ft: None,
            cloud_base_ft: None,
            cloud_top_ft: None,
            headwind_kt: 0.0,
            crosswind_kt: 0.0,
            wind,
            wind_direction_deg: 0.0,
            waypoint_id: Some("WP".to_string()),
            condition: None,
        }
    }

    #[test]
    fn missing_or_calm_wind_is_unknown() {
        for wind in [WindReading::Unknown, WindReading::Calm] {
            let mut p = point(wind);
            // Would be IMC if checks ran
            p.cloud_base_ft = Some(1000.0);
            let c = classify(&p, 4500.0, None, true);
            assert_eq!(c.tier, ConditionTier::Unknown);
            assert_eq!(c.reasons, vec![MISSING_WIND_REASON.to_string()]);
        }
    }

    #[test]
    fn imc_short_circuits() {
        let mut p = point(WindReading::Measured(40.0));
        p.cloud_base_ft = Some(2000.0);
        p.terrain_ft = Some(2400.0);
        let mut wx = WeatherSample::new(Utc::now());
        wx.visibility_km = Some(1.0);

        let c = classify(&p, 2500.0, Some(&wx), true);
        assert_eq!(c.tier, ConditionTier::Poor);
        assert_eq!(c.reasons.len(), 1);
        assert!(c.reasons[0].contains("IMC"));

        // Exactly at the base is also IMC.
        assert_eq!(classify(&p, 2000.0, Some(&wx), false).reasons, vec![IMC_REASON.to_string()]);
    }

    #[test]
    fn wind_thresholds_are_strict_and_terminal_only() {
        let p = point(WindReading::Measured(25.0));
        let c = classify(&p, 4500.0, None, true);
        assert_eq!(c.tier, ConditionTier::Marginal);
        assert_eq!(c.reasons.len(), 1);
        assert!(c.reasons[0].contains("Elevated wind"));

        let strong = point(WindReading::Measured(26.0));
        assert_eq!(classify(&strong, 4500.0, None, true).tier, ConditionTier::Poor);
        assert_eq!(classify(&strong, 4500.0, None, false).tier, ConditionTier::Good);

        let at_marginal = point(WindReading::Measured(20.0));
        assert_eq!(classify(&at_marginal, 4500.0, None, true).tier, ConditionTier::Good);
    }

    #[test]
    fn gusts_only_checked_when_present() {
        let p = point(WindReading::Measured(10.0));
        let mut wx = WeatherSample::new(Utc::now());
        assert_eq!(classify(&p, 4500.0, Some(&wx), true).tier, ConditionTier::Good);

        wx.gust_kt = Some(32.0);
        let c = classify(&p, 4500.0, Some(&wx), true);
        assert_eq!(c.tier, ConditionTier::Marginal);
        assert!(c.reasons[0].contains("Gusty"));

        wx.gust_kt = Some(36.0);
        assert_eq!(classify(&p, 4500.0, Some(&wx), true).tier, ConditionTier::Poor);
        assert_eq!(classify(&p, 4500.0, Some(&wx), false).tier, ConditionTier::Good);
    }

    #[test]
    fn no_cloud_base_skips_cloud_checks() {
        let mut p = point(WindReading::Measured(10.0));
        p.terrain_ft = Some(0.0);
        let c = classify(&p, 1200.0, None, false);
        assert_eq!(c.tier, ConditionTier::Good);
        assert!(c.reasons.is_empty());
    }

    #[test]
    fn reasons_accumulate_in_check_order() {
        let mut p = point(WindReading::Measured(22.0));
        p.terrain_ft = Some(1600.0);
        p.cloud_base_ft = Some(2800.0);
        let mut wx = WeatherSample::new(Utc::now());
        wx.visibility_km = Some(6.0);
        wx.precipitation_mm = Some(6.0);

        let c = classify(&p, 2400.0, Some(&wx), true);
        assert_eq!(c.tier, ConditionTier::Poor);
        let expected_prefixes = [
            "Elevated wind",
            "Low ceiling",
            "Reduced visibility",
            "Heavy precipitation",
            "Low terrain clearance",
            "Limited cloud clearance",
        ];
        assert_eq!(c.reasons.len(), expected_prefixes.len());
        for (reason, prefix) in c.reasons.iter().zip(expected_prefixes) {
            assert!(reason.starts_with(prefix), "{reason} vs {prefix}");
        }
    }

    #[test]
    fn poor_terrain_and_cloud_clearance() {
        let mut p = point(WindReading::Measured(5.0));
        p.terrain_ft = Some(2100.0);
        p.cloud_base_ft = Some(6000.0);
        let c = classify(&p, 2500.0, None, false);
        assert_eq!(c.tier, ConditionTier::Poor);
        assert!(c.reasons[0].starts_with("Insufficient terrain clearance"));

        let mut near_cloud = point(WindReading::Measured(5.0));
        near_cloud.cloud_base_ft = Some(4600.0);
        let c = classify(&near_cloud, 4500.0, None, false);
        assert_eq!(c.tier, ConditionTier::Poor);
        assert!(c.reasons.iter().any(|r| r.starts_with("Too close to cloud base")));
    }

    #[test]
    fn custom_minimums_apply() {
        let p = point(WindReading::Measured(15.0));
        let minimums = VfrMinimums {
            wind_marginal_kt: 10.0,
            ..VfrMinimums::default()
        };
        let c = classify_with_minimums(&p, 4500.0, None, true, &minimums);
        assert_eq!(c.tier, ConditionTier::Marginal);
    }
}
