pub mod conditions;
pub mod error;
pub mod forecast;
pub mod interpolation;
pub mod models;
pub mod navigation;
pub mod profile;
pub mod sampler;
pub mod vertical_wind;

pub use conditions::{classify, classify_with_minimums, VfrMinimums};
pub use error::RouteError;
pub use forecast::HourlyForecast;
pub use interpolation::{bracket, lerp, lerp_angle, Bracket};
pub use models::{
    Condition, ConditionTier, GeoPoint, Leg, ProfilePoint, Route, VerticalWindSample,
    WaypointKind, WeatherSample, WeatherSnapshot, Waypoint, WindReading,
};
pub use navigation::{
    bearing_deg, crosswind_component, distance_nm, ground_speed, headwind_component,
    interpolate_great_circle, recompute_legs, route_totals, RouteTotals,
};
pub use profile::{fuse_profile, fuse_profile_with_minimums, summarize, ProfileSummary};
pub use sampler::{attach_elevations, sample_positions, sample_route, SampledPoint};
pub use vertical_wind::{
    apply_altitude_wind, resolve_wind_at_altitude, LevelComponents, ResolvedWind, WindComponents,
};
