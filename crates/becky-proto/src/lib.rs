pub mod mission;
pub mod mode;
pub mod telemetry;

pub use mission::{Mission, MissionError, MissionStatus, ParseActionError, Waypoint, WaypointAction};
pub use mode::{FlightMode, ParseModeError};
