use std::collections::HashSet;
use std::fmt;

use becky_proto::{MissionError, Waypoint, WaypointAction};

use crate::PlanLimits;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IssueKind {
    #[error("mission has no waypoints")]
    Empty,
    #[error("too many waypoints ({count} > {max})")]
    TooMany { count: usize, max: usize },
    #[error("id is empty")]
    BlankId,
    #[error("id used more than once")]
    DuplicateId,
    #[error("latitude {0} outside -90..90")]
    Latitude(f64),
    #[error("longitude {0} outside -180..180")]
    Longitude(f64),
    #[error("altitude {alt}m outside {min}..{max}m")]
    Altitude { alt: f32, min: f32, max: f32 },
    #[error("speed {speed}m/s outside (0, {max}]")]
    Speed { speed: f32, max: f32 },
    #[error("{action} needs param1 ({meaning}) > 0")]
    Param { action: WaypointAction, meaning: &'static str },
    #[error("follows terminal {0} waypoint")]
    AfterTerminal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// `None` for mission-wide problems.
    pub waypoint: Option<String>,
    pub kind: IssueKind,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.waypoint {
            Some(id) => write!(f, "waypoint {}: {}", id, self.kind),
            None => write!(f, "mission: {}", self.kind),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("mission draft rejected with {} issue(s)", .0.len())]
    Invalid(Vec<Issue>),
    #[error(transparent)]
    Mission(#[from] MissionError),
}

/// Parameter the action cannot fly without, and what it means.
fn required_param1(action: WaypointAction) -> Option<&'static str> {
    match action {
        WaypointAction::Loiter => Some("loiter radius m"),
        WaypointAction::SurveyGrid => Some("line spacing m"),
        WaypointAction::SprayStart => Some("spray rate"),
        _ => None,
    }
}

pub fn check_waypoint(wp: &Waypoint, limits: &PlanLimits) -> Vec<IssueKind> {
    let mut out = Vec::new();
    if wp.id.trim().is_empty() {
        out.push(IssueKind::BlankId);
    }
    if !wp.lat.is_finite() || wp.lat.abs() > 90.0 {
        out.push(IssueKind::Latitude(wp.lat));
    }
    if !wp.lng.is_finite() || wp.lng.abs() > 180.0 {
        out.push(IssueKind::Longitude(wp.lng));
    }
    if !wp.alt.is_finite() || wp.alt < limits.min_alt_m || wp.alt > limits.max_alt_m {
        out.push(IssueKind::Altitude { alt: wp.alt, min: limits.min_alt_m, max: limits.max_alt_m });
    }
    if let Some(speed) = wp.speed {
        if !(speed > 0.0 && speed <= limits.max_speed_ms) {
            out.push(IssueKind::Speed { speed, max: limits.max_speed_ms });
        }
    }
    if let Some(meaning) = required_param1(wp.action) {
        if !wp.param1.map(|p| p > 0.0).unwrap_or(false) {
            out.push(IssueKind::Param { action: wp.action, meaning });
        }
    }
    out
}

/// Every problem that would make `waypoints` unfit for upload, in order.
pub fn check_mission(waypoints: &[Waypoint], limits: &PlanLimits) -> Vec<Issue> {
    let mut issues = Vec::new();
    if waypoints.is_empty() {
        issues.push(Issue { waypoint: None, kind: IssueKind::Empty });
        return issues;
    }
    if waypoints.len() > limits.max_waypoints {
        issues.push(Issue {
            waypoint: None,
            kind: IssueKind::TooMany { count: waypoints.len(), max: limits.max_waypoints },
        });
    }

    let mut seen = HashSet::new();
    let mut terminal: Option<&str> = None;
    for wp in waypoints {
        let at = || Some(wp.id.clone());
        if !seen.insert(wp.id.as_str()) {
            issues.push(Issue { waypoint: at(), kind: IssueKind::DuplicateId });
        }
        if let Some(t) = terminal {
            issues.push(Issue { waypoint: at(), kind: IssueKind::AfterTerminal(t.to_string()) });
        } else if wp.action.is_terminal() {
            terminal = Some(wp.id.as_str());
        }
        for kind in check_waypoint(wp, limits) {
            issues.push(Issue { waypoint: at(), kind });
        }
    }
    issues
}

pub fn check_limits(limits: &PlanLimits) -> anyhow::Result<()> {
    anyhow::ensure!(limits.min_alt_m >= 0.0, "planner.min_alt_m must be >= 0");
    anyhow::ensure!(limits.max_alt_m > limits.min_alt_m, "planner.max_alt_m must exceed min_alt_m");
    anyhow::ensure!(limits.max_speed_ms > 0.0, "planner.max_speed_ms must be > 0");
    anyhow::ensure!(limits.max_waypoints >= 1, "planner.max_waypoints must be >= 1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(id: &str, action: WaypointAction) -> Waypoint {
        Waypoint::new(id, 47.3769, 8.5417, 50.0, action)
    }

    fn kinds(issues: &[Issue]) -> Vec<&IssueKind> {
        issues.iter().map(|i| &i.kind).collect()
    }

    #[test]
    fn test_clean_mission_has_no_issues() {
        let mut loiter = wp("3", WaypointAction::Loiter);
        loiter.param1 = Some(15.0);
        let ws = vec![wp("1", WaypointAction::Takeoff), wp("2", WaypointAction::Waypoint), loiter, wp("4", WaypointAction::Rtl)];
        assert!(check_mission(&ws, &PlanLimits::default()).is_empty());
    }

    #[test]
    fn test_empty_mission() {
        let issues = check_mission(&[], &PlanLimits::default());
        assert_eq!(kinds(&issues), [&IssueKind::Empty]);
        assert_eq!(issues[0].to_string(), "mission: mission has no waypoints");
    }

    #[test]
    fn test_duplicate_ids_reported_on_second_use() {
        let issues = check_mission(&[wp("a", WaypointAction::Waypoint), wp("a", WaypointAction::Waypoint)], &PlanLimits::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateId);
        assert_eq!(issues[0].waypoint.as_deref(), Some("a"));
    }

    #[test]
    fn test_coordinate_and_altitude_bounds() {
        let mut w = wp("x", WaypointAction::Waypoint);
        w.lat = 91.0;
        w.lng = -181.0;
        w.alt = 500.0;
        let got = check_waypoint(&w, &PlanLimits::default());
        assert_eq!(got, vec![
            IssueKind::Latitude(91.0),
            IssueKind::Longitude(-181.0),
            IssueKind::Altitude { alt: 500.0, min: 0.0, max: 120.0 },
        ]);

        w.lat = f64::NAN;
        w.lng = 0.0;
        w.alt = 10.0;
        assert!(matches!(check_waypoint(&w, &PlanLimits::default())[..], [IssueKind::Latitude(_)]));
    }

    #[test]
    fn test_speed_bounds() {
        let mut w = wp("x", WaypointAction::Waypoint);
        w.speed = Some(0.0);
        assert_eq!(check_waypoint(&w, &PlanLimits::default()), vec![IssueKind::Speed { speed: 0.0, max: 25.0 }]);
        w.speed = Some(25.0);
        assert!(check_waypoint(&w, &PlanLimits::default()).is_empty());
    }

    #[test]
    fn test_action_params() {
        for action in [WaypointAction::Loiter, WaypointAction::SurveyGrid, WaypointAction::SprayStart] {
            let mut w = wp("p", action);
            assert!(matches!(check_waypoint(&w, &PlanLimits::default())[..], [IssueKind::Param { .. }]), "{action}");
            w.param1 = Some(-1.0);
            assert_eq!(check_waypoint(&w, &PlanLimits::default()).len(), 1);
            w.param1 = Some(3.0);
            assert!(check_waypoint(&w, &PlanLimits::default()).is_empty());
        }
        // SPRAY_STOP and the servo actions take no parameters.
        assert!(check_waypoint(&wp("s", WaypointAction::SprayStop), &PlanLimits::default()).is_empty());
        assert!(check_waypoint(&wp("s", WaypointAction::ServoOpen), &PlanLimits::default()).is_empty());
    }

    #[test]
    fn test_nothing_after_land() {
        let ws = [wp("1", WaypointAction::Takeoff), wp("2", WaypointAction::Land), wp("3", WaypointAction::Waypoint), wp("4", WaypointAction::Rtl)];
        let issues = check_mission(&ws, &PlanLimits::default());
        let ids: Vec<_> = issues.iter().map(|i| i.waypoint.as_deref().unwrap()).collect();
        assert_eq!(ids, ["3", "4"]);
        assert_eq!(issues[0].kind, IssueKind::AfterTerminal("2".into()));
        assert_eq!(issues[0].to_string(), "waypoint 3: follows terminal 2 waypoint");
    }

    #[test]
    fn test_too_many() {
        let limits = PlanLimits { max_waypoints: 2, ..Default::default() };
        let ws: Vec<_> = ["a", "b", "c"].iter().map(|id| wp(id, WaypointAction::Waypoint)).collect();
        assert_eq!(kinds(&check_mission(&ws, &limits)), [&IssueKind::TooMany { count: 3, max: 2 }]);
    }

    #[test]
    fn test_check_limits() {
        assert!(check_limits(&PlanLimits::default()).is_ok());
        assert!(check_limits(&PlanLimits { max_alt_m: 0.0, ..Default::default() }).is_err());
        assert!(check_limits(&PlanLimits { max_speed_ms: 0.0, ..Default::default() }).is_err());
    }
}
