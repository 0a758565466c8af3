use becky_proto::{Mission, Waypoint, WaypointAction};
use tracing::debug;

use crate::doctor::{check_mission, Issue, PlanError};
use crate::PlanLimits;

const ID_PREFIX: &str = "WP-";

/// The editor's working copy of a mission.
///
/// Nothing here touches the active mission. A draft only becomes a
/// [`Mission`] through [`MissionDraft::finalize`], after validation.
#[derive(Debug, Clone, Default)]
pub struct MissionDraft {
    waypoints: Vec<Waypoint>,
    next_id: u64,
}

impl MissionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from existing waypoints. Ids are kept; generated ids continue past
    /// the highest `WP-<n>` already present. Numbers outside `u32` are not
    /// counted, so the counter cannot run out.
    pub fn from_waypoints(waypoints: Vec<Waypoint>) -> Self {
        let next_id = waypoints
            .iter()
            .filter_map(|w| w.id.strip_prefix(ID_PREFIX)?.parse::<u32>().ok())
            .map(u64::from)
            .max()
            .unwrap_or(0);
        Self { waypoints, next_id }
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
        self.waypoints.iter().find(|w| w.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.waypoints.iter().position(|w| w.id == id)
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("{}{}", ID_PREFIX, self.next_id);
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    /// Append a waypoint and return its generated id.
    pub fn push(&mut self, lat: f64, lng: f64, alt: f32, action: WaypointAction) -> String {
        let id = self.fresh_id();
        self.waypoints.push(Waypoint::new(id.clone(), lat, lng, alt, action));
        id
    }

    /// Insert before `index`; an index past the end appends.
    pub fn insert(&mut self, index: usize, lat: f64, lng: f64, alt: f32, action: WaypointAction) -> String {
        let id = self.fresh_id();
        let index = index.min(self.waypoints.len());
        self.waypoints.insert(index, Waypoint::new(id.clone(), lat, lng, alt, action));
        id
    }

    pub fn remove(&mut self, id: &str) -> Option<Waypoint> {
        let i = self.position(id)?;
        Some(self.waypoints.remove(i))
    }

    pub fn move_up(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(i) if i > 0 => { self.waypoints.swap(i, i - 1); true }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(i) if i + 1 < self.waypoints.len() => { self.waypoints.swap(i, i + 1); true }
            _ => false,
        }
    }

    pub fn begin_edit(&mut self, id: &str) -> bool {
        self.set_editing(id, true)
    }

    pub fn commit_edit(&mut self, id: &str) -> bool {
        self.set_editing(id, false)
    }

    fn set_editing(&mut self, id: &str, on: bool) -> bool {
        match self.waypoints.iter_mut().find(|w| w.id == id) {
            Some(w) => { w.is_editing = on; true }
            None => false,
        }
    }

    /// Apply `f` to one waypoint. The id cannot be changed this way.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut Waypoint)) -> bool {
        let Some(w) = self.waypoints.iter_mut().find(|w| w.id == id) else { return false; };
        f(w);
        w.id = id.to_string();
        true
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub fn check(&self, limits: &PlanLimits) -> Vec<Issue> {
        check_mission(&self.waypoints, limits)
    }

    /// Validate and produce an uploadable mission. Open edits are committed.
    pub fn finalize(&self, limits: &PlanLimits) -> Result<Mission, PlanError> {
        let issues = self.check(limits);
        if !issues.is_empty() {
            debug!("draft: {} issue(s)", issues.len());
            return Err(PlanError::Invalid(issues));
        }
        let waypoints = self
            .waypoints
            .iter()
            .cloned()
            .map(|mut w| { w.is_editing = false; w })
            .collect();
        Ok(Mission::new(waypoints)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(d: &MissionDraft) -> Vec<&str> {
        d.waypoints().iter().map(|w| w.id.as_str()).collect()
    }

    fn three() -> MissionDraft {
        let mut d = MissionDraft::new();
        d.push(47.0, 8.0, 20.0, WaypointAction::Takeoff);
        d.push(47.001, 8.0, 40.0, WaypointAction::Waypoint);
        d.push(47.002, 8.0, 40.0, WaypointAction::Rtl);
        d
    }

    #[test]
    fn test_push_generates_sequential_ids() {
        assert_eq!(ids(&three()), ["WP-1", "WP-2", "WP-3"]);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut d = three();
        assert!(d.remove("WP-3").is_some());
        let id = d.push(47.0, 8.0, 30.0, WaypointAction::Land);
        assert_eq!(id, "WP-4");
        assert!(d.remove("WP-3").is_none());
    }

    #[test]
    fn test_from_waypoints_continues_numbering() {
        let mut d = MissionDraft::from_waypoints(vec![
            Waypoint::new("WP-7", 1.0, 1.0, 10.0, WaypointAction::Takeoff),
            Waypoint::new("home", 1.0, 1.0, 10.0, WaypointAction::Waypoint),
        ]);
        assert_eq!(d.push(1.0, 1.0, 10.0, WaypointAction::Land), "WP-8");
    }

    #[test]
    fn test_numbering_past_u32_ids() {
        let mut d = MissionDraft::from_waypoints(vec![
            Waypoint::new("WP-4294967295", 1.0, 1.0, 10.0, WaypointAction::Takeoff),
            Waypoint::new("WP-4294967296", 1.0, 1.0, 10.0, WaypointAction::Waypoint),
            Waypoint::new("WP-99999999999999999999999", 1.0, 1.0, 10.0, WaypointAction::Waypoint),
        ]);
        assert_eq!(d.push(1.0, 1.0, 10.0, WaypointAction::Land), "WP-4294967297");
        assert_eq!(d.len(), 4);
        assert!(d.check(&PlanLimits::default()).iter().all(|i| !matches!(i.kind, crate::IssueKind::DuplicateId)));
    }

    #[test]
    fn test_insert_and_reorder() {
        let mut d = three();
        let id = d.insert(1, 47.0005, 8.0, 30.0, WaypointAction::ServoOpen);
        assert_eq!(ids(&d), ["WP-1", "WP-4", "WP-2", "WP-3"]);

        assert!(d.move_down(&id));
        assert_eq!(ids(&d), ["WP-1", "WP-2", "WP-4", "WP-3"]);
        assert!(d.move_up("WP-2"));
        assert_eq!(ids(&d), ["WP-2", "WP-1", "WP-4", "WP-3"]);

        assert!(!d.move_up("WP-2"));
        assert!(!d.move_down("WP-3"));
        assert!(!d.move_down("nope"));

        d.insert(99, 47.0, 8.0, 30.0, WaypointAction::Land);
        assert_eq!(d.waypoints().last().map(|w| w.id.as_str()), Some("WP-5"));
    }

    #[test]
    fn test_update_keeps_id() {
        let mut d = three();
        assert!(d.update("WP-2", |w| {
            w.alt = 55.0;
            w.speed = Some(8.0);
            w.id = "hijack".into();
        }));
        let w = d.get("WP-2").unwrap();
        assert_eq!(w.alt, 55.0);
        assert_eq!(w.speed, Some(8.0));
        assert!(!d.update("missing", |_| {}));
    }

    #[test]
    fn test_finalize_commits_open_edits() {
        let mut d = three();
        assert!(d.begin_edit("WP-2"));
        assert!(d.get("WP-2").unwrap().is_editing);

        let m = d.finalize(&PlanLimits::default()).unwrap();
        assert_eq!(m.len(), 3);
        assert!(m.iter().all(|w| !w.is_editing));
        // The draft itself is untouched.
        assert!(d.get("WP-2").unwrap().is_editing);
        assert!(d.commit_edit("WP-2"));
        assert!(!d.get("WP-2").unwrap().is_editing);
    }

    #[test]
    fn test_finalize_rejects_invalid() {
        let mut d = MissionDraft::new();
        assert!(matches!(d.finalize(&PlanLimits::default()), Err(PlanError::Invalid(ref v)) if v.len() == 1));

        d.push(47.0, 8.0, 20.0, WaypointAction::Loiter);
        d.push(47.0, 8.0, 500.0, WaypointAction::Waypoint);
        match d.finalize(&PlanLimits::default()) {
            Err(PlanError::Invalid(issues)) => assert_eq!(issues.len(), 2),
            other => panic!("expected invalid, got {:?}", other),
        }
    }
}
