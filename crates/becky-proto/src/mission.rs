use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaypointAction {
    #[default]
    Waypoint,
    Takeoff,
    Land,
    Rtl,
    ServoOpen,
    ServoClose,
    Loiter,
    SurveyGrid,
    SprayStart,
    SprayStop,
}

impl WaypointAction {
    pub const ALL: [WaypointAction; 10] = [
        WaypointAction::Waypoint,
        WaypointAction::Takeoff,
        WaypointAction::Land,
        WaypointAction::Rtl,
        WaypointAction::ServoOpen,
        WaypointAction::ServoClose,
        WaypointAction::Loiter,
        WaypointAction::SurveyGrid,
        WaypointAction::SprayStart,
        WaypointAction::SprayStop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WaypointAction::Waypoint => "WAYPOINT",
            WaypointAction::Takeoff => "TAKEOFF",
            WaypointAction::Land => "LAND",
            WaypointAction::Rtl => "RTL",
            WaypointAction::ServoOpen => "SERVO_OPEN",
            WaypointAction::ServoClose => "SERVO_CLOSE",
            WaypointAction::Loiter => "LOITER",
            WaypointAction::SurveyGrid => "SURVEY_GRID",
            WaypointAction::SprayStart => "SPRAY_START",
            WaypointAction::SprayStop => "SPRAY_STOP",
        }
    }

    /// LAND and RTL end the flight; nothing can be flown after them.
    pub fn is_terminal(self) -> bool {
        matches!(self, WaypointAction::Land | WaypointAction::Rtl)
    }
}

impl fmt::Display for WaypointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown waypoint action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for WaypointAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        WaypointAction::ALL
            .into_iter()
            .find(|a| a.as_str() == norm)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// Metres above home.
    pub alt: f32,
    #[serde(default)]
    pub action: WaypointAction,
    /// m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    // Meaning depends on action: loiter radius, grid spacing, spray rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param1: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param2: Option<f32>,
    /// Editor-only flag. Never meaningful once a mission is uploaded.
    #[serde(default, skip_serializing)]
    pub is_editing: bool,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, alt: f32, action: WaypointAction) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            alt,
            action,
            speed: None,
            param1: None,
            param2: None,
            is_editing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissionError {
    #[error("mission has no waypoints")]
    Empty,
    #[error("duplicate waypoint id {0:?}")]
    DuplicateId(String),
}

/// An ordered, non-empty waypoint sequence with unique ids.
///
/// There is no way to edit a `Mission` in place: callers build a new one and
/// replace the old one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Waypoint>", into = "Vec<Waypoint>")]
pub struct Mission {
    waypoints: Vec<Waypoint>,
}

impl Mission {
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, MissionError> {
        if waypoints.is_empty() {
            return Err(MissionError::Empty);
        }
        let mut seen = HashSet::with_capacity(waypoints.len());
        for wp in &waypoints {
            if !seen.insert(wp.id.as_str()) {
                return Err(MissionError::DuplicateId(wp.id.clone()));
            }
        }
        Ok(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|wp| wp.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }
}

impl TryFrom<Vec<Waypoint>> for Mission {
    type Error = MissionError;

    fn try_from(waypoints: Vec<Waypoint>) -> Result<Self, Self::Error> {
        Mission::new(waypoints)
    }
}

impl From<Mission> for Vec<Waypoint> {
    fn from(m: Mission) -> Self {
        m.waypoints
    }
}

impl<'a> IntoIterator for &'a Mission {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    #[default]
    Idle,
    Uploaded,
    Running,
    Completed,
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissionStatus::Idle => "IDLE",
            MissionStatus::Uploaded => "UPLOADED",
            MissionStatus::Running => "RUNNING",
            MissionStatus::Completed => "COMPLETED",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(id: &str) -> Waypoint {
        Waypoint::new(id, 47.39, 8.54, 40.0, WaypointAction::Waypoint)
    }

    #[test]
    fn test_mission_rejects_empty() {
        assert_eq!(Mission::new(vec![]), Err(MissionError::Empty));
    }

    #[test]
    fn test_mission_rejects_duplicate_ids() {
        let err = Mission::new(vec![wp("a"), wp("b"), wp("a")]).unwrap_err();
        assert_eq!(err, MissionError::DuplicateId("a".into()));
    }

    #[test]
    fn test_mission_preserves_order() {
        let m = Mission::new(vec![wp("c"), wp("a"), wp("b")]).unwrap();
        let ids: Vec<&str> = m.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(m.get("a").map(|w| w.id.as_str()), Some("a"));
    }

    #[test]
    fn test_mission_deserialize_enforces_invariants() {
        let json = r#"[
            {"id":"1","lat":1.0,"lng":2.0,"alt":30.0,"action":"TAKEOFF"},
            {"id":"1","lat":1.0,"lng":2.1,"alt":30.0}
        ]"#;
        assert!(serde_json::from_str::<Mission>(json).is_err());

        let json = r#"[{"id":"1","lat":1.0,"lng":2.0,"alt":30.0,"action":"SURVEY_GRID","param1":12.5}]"#;
        let m: Mission = serde_json::from_str(json).unwrap();
        assert_eq!(m.waypoints()[0].action, WaypointAction::SurveyGrid);
        assert_eq!(m.waypoints()[0].param1, Some(12.5));
    }

    #[test]
    fn test_editing_flag_not_serialized() {
        let mut w = wp("x");
        w.is_editing = true;
        let s = serde_json::to_string(&w).unwrap();
        assert!(!s.contains("is_editing"));
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("spray-start".parse::<WaypointAction>().unwrap(), WaypointAction::SprayStart);
        assert_eq!("rtl".parse::<WaypointAction>().unwrap(), WaypointAction::Rtl);
        assert!("hover".parse::<WaypointAction>().is_err());
        for a in WaypointAction::ALL {
            assert_eq!(a.to_string().parse::<WaypointAction>().unwrap(), a);
        }
    }

    #[test]
    fn test_terminal_actions() {
        assert!(WaypointAction::Land.is_terminal());
        assert!(WaypointAction::Rtl.is_terminal());
        assert!(!WaypointAction::Loiter.is_terminal());
    }
}
