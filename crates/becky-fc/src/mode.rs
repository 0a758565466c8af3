use std::collections::BTreeMap;
use std::fmt;

use becky_proto::FlightMode;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::mission::Transition;

/// Styling key for the mode badge. Carries no control meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Purple,
    Blue,
    Emerald,
    Indigo,
    Amber,
    Rose,
    Teal,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Purple => "purple",
            Tone::Blue => "blue",
            Tone::Emerald => "emerald",
            Tone::Indigo => "indigo",
            Tone::Amber => "amber",
            Tone::Rose => "rose",
            Tone::Teal => "teal",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub label: &'static str,
    pub tone: Tone,
    pub description: &'static str,
}

static CATALOG: Lazy<BTreeMap<FlightMode, ModeInfo>> = Lazy::new(|| {
    let entry = |label: &'static str, tone: Tone, description: &'static str| ModeInfo { label, tone, description };
    BTreeMap::from([
        (FlightMode::Stabilize, entry("STABILIZE", Tone::Purple, "Manual control with self-leveling.")),
        (FlightMode::AltHold, entry("ALT_HOLD", Tone::Blue, "Manual control with altitude maintenance.")),
        (FlightMode::Loiter, entry("LOITER", Tone::Emerald, "GPS position and altitude hold.")),
        (FlightMode::Auto, entry("AUTO", Tone::Indigo, "Executing autonomous mission.")),
        (FlightMode::Guided, entry("GUIDED", Tone::Indigo, "External navigation control (GCS).")),
        (FlightMode::Rtl, entry("RTL", Tone::Amber, "Returning to launch coordinates.")),
        (FlightMode::Land, entry("LAND", Tone::Rose, "Executing vertical landing.")),
        (FlightMode::Circle, entry("CIRCLE", Tone::Teal, "Orbiting current point.")),
    ])
});

/// Display metadata for `mode`.
///
/// Every variant has an entry; a miss here is a bug in the table above.
pub fn info(mode: FlightMode) -> &'static ModeInfo {
    &CATALOG[&mode]
}

/// The whole catalog in selector order.
pub fn catalog() -> impl Iterator<Item = (FlightMode, &'static ModeInfo)> {
    FlightMode::ALL.into_iter().map(|m| (m, info(m)))
}

/// Holds the single active flight mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightModeRegister {
    current: FlightMode,
}

impl FlightModeRegister {
    pub fn new(initial: FlightMode) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> FlightMode {
        self.current
    }

    pub fn info(&self) -> &'static ModeInfo {
        info(self.current)
    }

    /// Operator override. Mission status is deliberately not consulted.
    pub fn set_mode(&mut self, mode: FlightMode) -> Transition {
        let from = self.current;
        self.current = mode;
        Transition::ModeChanged { from, to: mode }
    }

    pub(crate) fn force(&mut self, mode: FlightMode) -> FlightMode {
        std::mem::replace(&mut self.current, mode)
    }
}
