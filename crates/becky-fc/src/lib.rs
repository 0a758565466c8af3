pub mod mission;
pub mod mode;
pub mod state;

use becky_proto::FlightMode;
use serde::Deserialize;

pub use mission::{MissionAction, MissionCoordinator, Transition};
pub use mode::{FlightModeRegister, ModeInfo, Tone};
pub use state::{Console, ConsoleState};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FcConfig {
    /// Mode the register starts in. LOITER when unset.
    pub initial_mode: Option<FlightMode>,
}
