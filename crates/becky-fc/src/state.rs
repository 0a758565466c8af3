use becky_proto::telemetry::ControlFields;
use becky_proto::{FlightMode, Mission, MissionStatus};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::mission::{MissionAction, MissionCoordinator, Transition};
use crate::mode::FlightModeRegister;
use crate::FcConfig;

/// One consistent view of the console: mission, status and mode together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleState {
    /// Bumped on every published change.
    pub revision: u64,
    pub coordinator: MissionCoordinator,
    pub modes: FlightModeRegister,
}

impl ConsoleState {
    pub fn mission(&self) -> Option<&Mission> {
        self.coordinator.mission()
    }

    pub fn status(&self) -> MissionStatus {
        self.coordinator.status()
    }

    pub fn mode(&self) -> FlightMode {
        self.modes.current()
    }

    pub fn control_fields(&self) -> ControlFields {
        ControlFields {
            flight_mode: self.mode(),
            active_mission: self.mission().cloned(),
            mission_status: self.status(),
        }
    }
}

/// Single writer for the console state.
///
/// Every operation builds a complete new [`ConsoleState`] and publishes it in
/// one step, so a reader holding a `watch::Receiver` sees either the old
/// state or the new one. `Console` is deliberately not `Clone`; hand readers
/// a receiver from [`Console::subscribe`] instead.
#[derive(Debug)]
pub struct Console {
    tx: watch::Sender<ConsoleState>,
}

impl Console {
    pub fn new(cfg: &FcConfig) -> Self {
        let initial = ConsoleState {
            modes: FlightModeRegister::new(cfg.initial_mode.unwrap_or_default()),
            ..Default::default()
        };
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn snapshot(&self) -> ConsoleState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConsoleState> {
        self.tx.subscribe()
    }

    pub fn upload(&mut self, mission: Mission) -> Transition {
        let t = self.commit(|s| s.coordinator.upload(mission));
        info!("mission: {:?}", t);
        t
    }

    pub fn action(&mut self, action: MissionAction) -> Transition {
        let t = self.commit(|s| s.coordinator.action(action, &mut s.modes));
        match &t {
            Transition::NoMission => warn!("mission: {:?} ignored, nothing loaded", action),
            Transition::AlreadyRunning => debug!("mission: already running"),
            Transition::Deleted { reverted_from: Some(from) } => {
                info!("mission: deleted, mode {} -> {}", from, FlightMode::Loiter)
            }
            other => info!("mission: {:?} -> {:?}", action, other),
        }
        t
    }

    pub fn set_mode(&mut self, mode: FlightMode) -> Transition {
        let t = self.commit(|s| s.modes.set_mode(mode));
        if let Transition::ModeChanged { from, to } = t {
            info!("mode: {} -> {} (operator)", from, to);
        }
        t
    }

    /// Completion hook for a mission-progress source.
    pub fn mission_finished(&mut self) -> Transition {
        let t = self.commit(|s| s.coordinator.mission_finished());
        match t {
            Transition::Completed => info!("mission: completed"),
            _ => debug!("mission: completion signal ignored (not running)"),
        }
        t
    }

    fn commit(&mut self, apply: impl FnOnce(&mut ConsoleState) -> Transition) -> Transition {
        let mut next = self.snapshot();
        let t = apply(&mut next);
        if t.changed_state() {
            next.revision += 1;
            self.tx.send_replace(next);
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use becky_proto::{Waypoint, WaypointAction};

    fn one_leg() -> Mission {
        Mission::new(vec![Waypoint::new("1", 47.0, 8.0, 40.0, WaypointAction::Takeoff)]).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let console = Console::new(&FcConfig::default());
        let s = console.snapshot();
        assert_eq!(s.revision, 0);
        assert_eq!(s.mode(), FlightMode::Loiter);
        assert_eq!(s.status(), MissionStatus::Idle);
        assert!(s.mission().is_none());
    }

    #[test]
    fn test_initial_mode_from_config() {
        let console = Console::new(&FcConfig { initial_mode: Some(FlightMode::Stabilize) });
        assert_eq!(console.snapshot().mode(), FlightMode::Stabilize);
    }

    #[test]
    fn test_noop_does_not_bump_revision() {
        let mut console = Console::new(&FcConfig::default());
        console.action(MissionAction::Execute);
        console.mission_finished();
        assert_eq!(console.snapshot().revision, 0);

        console.upload(one_leg());
        console.action(MissionAction::Execute);
        console.action(MissionAction::Execute);
        assert_eq!(console.snapshot().revision, 2);
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut console = Console::new(&FcConfig::default());
        let before = console.snapshot();
        console.upload(one_leg());
        assert!(before.mission().is_none());
        assert_eq!(console.snapshot().mission(), Some(&one_leg()));
    }

    #[test]
    fn test_control_fields_projection() {
        let mut console = Console::new(&FcConfig::default());
        console.upload(one_leg());
        console.action(MissionAction::Execute);
        let f = console.snapshot().control_fields();
        assert_eq!(f.flight_mode, FlightMode::Auto);
        assert_eq!(f.mission_status, MissionStatus::Running);
        assert_eq!(f.active_mission, Some(one_leg()));
    }
}
