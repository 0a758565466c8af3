use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use becky_fc::ConsoleState;
use becky_proto::telemetry::{
    Attitude, DeviceHardwareStatus, Kinematics, NetworkInfo, NetworkType, TelemetryData, VehicleFeed,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

fn now_unix_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Merge the console's control fields with the vehicle-side feed.
pub fn frame(state: &ConsoleState, feed: &VehicleFeed, fpv: bool) -> TelemetryData {
    TelemetryData::assemble(now_unix_ms(), feed.clone(), state.control_fields(), fpv)
}

/// Fixed stand-in for the vehicle link, used when `[telemetry]` is absent.
pub fn default_feed() -> VehicleFeed {
    VehicleFeed {
        kinematics: Kinematics {
            altitude: 0.0,
            ground_speed: 0.0,
            air_speed: 0.0,
            throttle: 0,
            battery: 100,
            hdop: 0.9,
            satellites: 14,
            attitude: Attitude::default(),
        },
        mavlink_heartbeat: true,
        onboard_device: DeviceHardwareStatus {
            id: "onboard-01".into(),
            name: "Companion Computer".into(),
            battery: 100,
            temperature_c: 45.0,
            camera_active: true,
            flashlight: false,
            network: NetworkInfo { kind: NetworkType::FiveG, latency_ms: 32, signal_strength_dbm: -78, packet_loss: 0.0 },
        },
        gcs_device: DeviceHardwareStatus {
            id: "gcs-01".into(),
            name: "Ground Station".into(),
            battery: 100,
            temperature_c: 35.0,
            camera_active: false,
            flashlight: false,
            network: NetworkInfo { kind: NetworkType::WiFi, latency_ms: 8, signal_strength_dbm: -52, packet_loss: 0.0 },
        },
    }
}

/// Display refresh loop. Reads published console state on its own schedule and
/// never writes it. Ends when the console is dropped.
pub fn spawn_refresh(
    mut rx: watch::Receiver<ConsoleState>,
    feed: VehicleFeed,
    fpv: Arc<AtomicBool>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        let mut shown_rev = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = rx.changed() => {
                    if changed.is_err() { break; }
                }
            }
            // Clone out so the watch lock is not held while formatting.
            let state = rx.borrow_and_update().clone();
            let t = frame(&state, &feed, fpv.load(Ordering::Relaxed));
            if shown_rev != Some(state.revision) {
                shown_rev = Some(state.revision);
                info!(
                    rev = state.revision,
                    mode = %t.flight_mode,
                    status = %t.mission_status,
                    waypoints = t.active_mission.as_ref().map(|m| m.len()).unwrap_or(0),
                    "display"
                );
            } else {
                debug!(alt = t.kinematics.altitude, sats = t.kinematics.satellites, fpv = t.fpv_control_active, "display tick");
            }
        }
        debug!("display: console closed, refresh stopped");
    })
}
