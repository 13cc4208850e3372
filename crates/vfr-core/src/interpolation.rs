//! Series bracketing and interpolation helpers.
//!
//! Shared by the time axis (hourly forecasts), the vertical axis (pressure
//! levels) and the along-route axis (cumulative distance).

use serde::{Deserialize, Serialize};

/// Position of a target value within an ascending series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    /// Position between `lower` and `upper`, in `[0, 1)`
    pub fraction: f64,
    pub needs_interpolation: bool,
}

impl Bracket {
    const fn at(index: usize) -> Self {
        Self {
            lower: index,
            upper: index,
            fraction: 0.0,
            needs_interpolation: false,
        }
    }

    /// Index of the series entry closest to the target.
    pub fn nearest(&self) -> usize {
        if self.fraction < 0.5 {
            self.lower
        } else {
            self.upper
        }
    }
}

/// Locate `target` in an ascending `series`.
///
/// Targets at or before the first entry clamp to index 0, targets at or past
/// the last entry clamp to the last index; neither case interpolates.
pub fn bracket(series: &[f64], target: f64) -> Bracket {
    let Some((&first, &last)) = series.first().zip(series.last()) else {
        return Bracket::at(0);
    };
    if target.is_nan() || target <= first {
        return Bracket::at(0);
    }
    if target >= last {
        return Bracket::at(series.len() - 1);
    }

    // first < target < last, so 1 <= idx <= len - 1
    let idx = series.partition_point(|value| *value <= target);
    let lower = idx - 1;
    let upper = idx;
    let span = series[upper] - series[lower];
    let fraction = if span > 0.0 {
        (target - series[lower]) / span
    } else {
        0.0
    };

    Bracket {
        lower,
        upper,
        fraction,
        needs_interpolation: fraction > 0.0 && fraction < 1.0,
    }
}

/// Linear interpolation that tolerates missing inputs.
///
/// If one side is absent or NaN the other is returned unchanged; if both are,
/// the result is `None`.
pub fn lerp(v0: Option<f64>, v1: Option<f64>, t: f64) -> Option<f64> {
    match (v0.filter(|v| !v.is_nan()), v1.filter(|v| !v.is_nan())) {
        (Some(a), Some(b)) => Some(a + (b - a) * t),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Interpolate between two bearings along the shorter arc. Result in `[0, 360)`.
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    let mut delta = (b - a).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    normalize_degrees(a + delta * t)
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_clamps_below_and_above() {
        let series = [1000.0, 2000.0, 3000.0];
        assert_eq!(bracket(&series, 500.0), Bracket::at(0));
        assert_eq!(bracket(&series, 1000.0), Bracket::at(0));
        assert_eq!(bracket(&series, 4000.0), Bracket::at(2));
        assert_eq!(bracket(&series, 3000.0), Bracket::at(2));
    }

    #[test]
    fn bracket_interpolates_inside_range() {
        let series = [1000.0, 2000.0, 3000.0];
        let b = bracket(&series, 1500.0);
        assert_eq!((b.lower, b.upper), (0, 1));
        assert!((b.fraction - 0.5).abs() < 1e-12);
        assert!(b.needs_interpolation);

        let b = bracket(&series, 2750.0);
        assert_eq!((b.lower, b.upper), (1, 2));
        assert!((b.fraction - 0.75).abs() < 1e-12);
    }

    #[test]
    fn bracket_on_interior_entry_does_not_interpolate() {
        let b = bracket(&[1000.0, 2000.0, 3000.0], 2000.0);
        assert_eq!(b.lower, 1);
        assert_eq!(b.fraction, 0.0);
        assert!(!b.needs_interpolation);
    }

    #[test]
    fn bracket_empty_and_nan() {
        assert_eq!(bracket(&[], 10.0), Bracket::at(0));
        assert_eq!(bracket(&[1.0, 2.0], f64::NAN), Bracket::at(0));
        assert_eq!(bracket(&[5.0], 7.0), Bracket::at(0));
    }

    #[test]
    fn lerp_is_null_safe() {
        assert_eq!(lerp(None, Some(5.0), 0.5), Some(5.0));
        assert_eq!(lerp(Some(3.0), None, 0.5), Some(3.0));
        assert_eq!(lerp(Some(f64::NAN), Some(4.0), 0.5), Some(4.0));
        assert_eq!(lerp(None, None, 0.5), None);
        assert_eq!(lerp(Some(f64::NAN), Some(f64::NAN), 0.5), None);
        assert_eq!(lerp(Some(10.0), Some(20.0), 0.25), Some(12.5));
    }

    #[test]
    fn lerp_angle_crosses_north() {
        let mid = lerp_angle(350.0, 10.0, 0.5);
        assert!(mid < 1e-9 || (360.0 - mid) < 1e-9, "got {mid}");

        let quarter = lerp_angle(10.0, 350.0, 0.25);
        assert!((quarter - 5.0).abs() < 1e-9);

        let plain = lerp_angle(90.0, 180.0, 0.5);
        assert!((plain - 135.0).abs() < 1e-9);
    }

    #[test]
    fn lerp_angle_stays_in_range() {
        for (a, b) in [(0.0, 359.0), (359.9, 0.1), (180.0, 0.0), (-20.0, 400.0)] {
            for step in 0..=10 {
                let value = lerp_angle(a, b, step as f64 / 10.0);
                assert!((0.0..360.0).contains(&value), "{a}->{b} gave {value}");
            }
        }
    }
}
