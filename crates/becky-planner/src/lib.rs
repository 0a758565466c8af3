pub mod doctor;
pub mod draft;
pub mod geo;

use serde::Deserialize;

pub use doctor::{Issue, IssueKind, PlanError};
pub use draft::MissionDraft;
pub use geo::RouteSummary;

/// Bounds the editor enforces before a draft may be uploaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanLimits {
    pub min_alt_m: f32,
    pub max_alt_m: f32,
    pub max_speed_ms: f32,
    pub max_waypoints: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            min_alt_m: 0.0,
            max_alt_m: 120.0,
            max_speed_ms: 25.0,
            max_waypoints: 100,
        }
    }
}
