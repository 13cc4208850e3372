//! Provider clients and planning orchestration around `vfr-core`.

pub mod cache;
pub mod config;
pub mod planner;
pub mod providers;

pub use config::Config;
pub use planner::{waypoint_etas, PlanError, PlanReport, PlanRequest, Planner, WaypointReport};
pub use providers::{ElevationProvider, ProviderError, WeatherProvider};
