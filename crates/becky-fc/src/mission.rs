use std::sync::Arc;

use becky_proto::{FlightMode, Mission, MissionStatus};

use crate::mode::FlightModeRegister;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionAction {
    Execute,
    Delete,
}

/// What an operation actually did. Operations never fail; callers that care
/// about no-ops inspect this instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Uploaded { waypoints: usize, replaced: bool },
    Started,
    /// EXECUTE from COMPLETED: the same mission is flown again.
    Restarted,
    AlreadyRunning,
    /// EXECUTE with nothing loaded. The operator surface keeps this unreachable.
    NoMission,
    /// `reverted_from` is the mode that was replaced by LOITER, if any.
    Deleted { reverted_from: Option<FlightMode> },
    Completed,
    NotRunning,
    ModeChanged { from: FlightMode, to: FlightMode },
}

impl Transition {
    /// False for the no-op outcomes, which leave state untouched.
    pub fn changed_state(&self) -> bool {
        !matches!(self, Transition::AlreadyRunning | Transition::NoMission | Transition::NotRunning)
    }
}

/// Active mission plus its lifecycle status.
///
/// `mission` is `None` exactly when `status` is IDLE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionCoordinator {
    mission: Option<Arc<Mission>>,
    status: MissionStatus,
}

impl MissionCoordinator {
    pub fn mission(&self) -> Option<&Mission> {
        self.mission.as_deref()
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    pub fn has_mission(&self) -> bool {
        self.mission.is_some()
    }

    /// Replaces whatever was loaded. Flight mode is not touched.
    pub fn upload(&mut self, mission: Mission) -> Transition {
        let waypoints = mission.len();
        let replaced = self.mission.replace(Arc::new(mission)).is_some();
        self.status = MissionStatus::Uploaded;
        Transition::Uploaded { waypoints, replaced }
    }

    pub fn action(&mut self, action: MissionAction, modes: &mut FlightModeRegister) -> Transition {
        match action {
            MissionAction::Execute => self.execute(modes),
            MissionAction::Delete => self.delete(modes),
        }
    }

    fn execute(&mut self, modes: &mut FlightModeRegister) -> Transition {
        if self.mission.is_none() {
            return Transition::NoMission;
        }
        // AUTO is set once on entry; a later operator override must stick.
        let outcome = match self.status {
            MissionStatus::Running => return Transition::AlreadyRunning,
            MissionStatus::Completed => Transition::Restarted,
            MissionStatus::Uploaded | MissionStatus::Idle => Transition::Started,
        };
        self.status = MissionStatus::Running;
        modes.force(FlightMode::Auto);
        outcome
    }

    fn delete(&mut self, modes: &mut FlightModeRegister) -> Transition {
        self.mission = None;
        self.status = MissionStatus::Idle;
        // AUTO without a mission is not a valid combination.
        let reverted_from = if modes.current() == FlightMode::Auto {
            Some(modes.force(FlightMode::Loiter))
        } else {
            None
        };
        Transition::Deleted { reverted_from }
    }

    /// Last waypoint reached. Only meaningful while RUNNING.
    pub fn mission_finished(&mut self) -> Transition {
        if self.status != MissionStatus::Running {
            return Transition::NotRunning;
        }
        self.status = MissionStatus::Completed;
        Transition::Completed
    }
}
