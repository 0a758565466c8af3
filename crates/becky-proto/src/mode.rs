use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightMode {
    Stabilize,
    AltHold,
    /// Position hold. The safe fallback when nothing else is commanding.
    #[default]
    Loiter,
    Auto,
    Guided,
    Rtl,
    Land,
    Circle,
}

impl FlightMode {
    /// Selector order, as the mode switch lists them.
    pub const ALL: [FlightMode; 8] = [
        FlightMode::Stabilize,
        FlightMode::AltHold,
        FlightMode::Loiter,
        FlightMode::Auto,
        FlightMode::Guided,
        FlightMode::Rtl,
        FlightMode::Land,
        FlightMode::Circle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FlightMode::Stabilize => "STABILIZE",
            FlightMode::AltHold => "ALT_HOLD",
            FlightMode::Loiter => "LOITER",
            FlightMode::Auto => "AUTO",
            FlightMode::Guided => "GUIDED",
            FlightMode::Rtl => "RTL",
            FlightMode::Land => "LAND",
            FlightMode::Circle => "CIRCLE",
        }
    }
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flight mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for FlightMode {
    type Err = ParseModeError;

    // Accepts ALT_HOLD, alt_hold and alt-hold alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        FlightMode::ALL
            .into_iter()
            .find(|m| m.as_str() == norm)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}
