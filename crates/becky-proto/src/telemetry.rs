use serde::{Deserialize, Serialize};

use crate::{FlightMode, Mission, MissionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    #[serde(rename = "4G")]
    FourG,
    #[serde(rename = "5G")]
    FiveG,
    #[serde(rename = "LTE")]
    Lte,
    #[serde(rename = "WiFi")]
    WiFi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(rename = "type")]
    pub kind: NetworkType,
    pub latency_ms: u32,
    pub signal_strength_dbm: i16,
    /// Percent of packets lost over the last reporting window.
    pub packet_loss: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceHardwareStatus {
    pub id: String,
    pub name: String,
    pub battery: u8,
    pub temperature_c: f32,
    pub camera_active: bool,
    pub flashlight: bool,
    pub network: NetworkInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

/// The part of a telemetry frame that comes from the vehicle, not the console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub altitude: f32,
    pub ground_speed: f32,
    pub air_speed: f32,
    pub throttle: u8,
    pub battery: u8,
    pub hdop: f32,
    pub satellites: u8,
    #[serde(default)]
    pub attitude: Attitude,
}

/// Vehicle-side inputs merged into every [`TelemetryData`] frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFeed {
    pub kinematics: Kinematics,
    pub mavlink_heartbeat: bool,
    pub onboard_device: DeviceHardwareStatus,
    pub gcs_device: DeviceHardwareStatus,
}

/// Console-side fields. Only the mission coordinator produces these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFields {
    pub flight_mode: FlightMode,
    pub active_mission: Option<Mission>,
    pub mission_status: MissionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryData {
    pub ts_unix_ms: i64,
    #[serde(flatten)]
    pub kinematics: Kinematics,
    pub mavlink_heartbeat: bool,
    pub flight_mode: FlightMode,
    pub onboard_device: DeviceHardwareStatus,
    pub gcs_device: DeviceHardwareStatus,
    pub fpv_control_active: bool,
    pub active_mission: Option<Mission>,
    pub mission_status: MissionStatus,
}

impl TelemetryData {
    pub fn assemble(ts_unix_ms: i64, feed: VehicleFeed, control: ControlFields, fpv_control_active: bool) -> Self {
        Self {
            ts_unix_ms,
            kinematics: feed.kinematics,
            mavlink_heartbeat: feed.mavlink_heartbeat,
            flight_mode: control.flight_mode,
            onboard_device: feed.onboard_device,
            gcs_device: feed.gcs_device,
            fpv_control_active,
            active_mission: control.active_mission,
            mission_status: control.mission_status,
        }
    }
}
