//! Error types for structurally invalid calls.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("sampling interval must be at least 0.01 nautical miles, got {0}")]
    InvalidInterval(f64),
}
