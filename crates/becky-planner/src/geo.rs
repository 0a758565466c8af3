use becky_proto::{Mission, Waypoint, WaypointAction};
use serde::Serialize;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat/2.0).sin().powi(2) + lat1.to_radians().cos()*lat2.to_radians().cos()*(dlon/2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0-a).sqrt());
    EARTH_RADIUS_M * c
}

fn leg_m(a: &Waypoint, b: &Waypoint) -> f64 {
    haversine_m(a.lat, a.lng, b.lat, b.lng)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub waypoints: usize,
    pub legs: usize,
    /// Horizontal path length, ignoring climb.
    pub total_m: f64,
    pub longest_leg_m: f64,
    pub max_alt_m: f32,
    pub starts_with_takeoff: bool,
    pub ends_with: WaypointAction,
}

impl RouteSummary {
    pub fn of(mission: &Mission) -> Self {
        let wps = mission.waypoints();
        let legs: Vec<f64> = wps.windows(2).map(|w| leg_m(&w[0], &w[1])).collect();
        Self {
            waypoints: wps.len(),
            legs: legs.len(),
            total_m: legs.iter().sum(),
            longest_leg_m: legs.iter().copied().fold(0.0, f64::max),
            max_alt_m: wps.iter().map(|w| w.alt).fold(f32::MIN, f32::max),
            starts_with_takeoff: wps[0].action == WaypointAction::Takeoff,
            // Mission is never empty.
            ends_with: wps[wps.len() - 1].action,
        }
    }
}
