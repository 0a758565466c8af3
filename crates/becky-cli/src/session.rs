use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use becky_fc::{mode, Console, MissionAction, Transition};
use becky_planner::{MissionDraft, PlanError, PlanLimits, RouteSummary};
use becky_proto::telemetry::VehicleFeed;
use becky_proto::{FlightMode, WaypointAction};
use tracing::{info, warn};

use crate::display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Dashboard,
    MissionPlanner,
    AiAnalyst,
    Settings,
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "dashboard" | "dash" => ViewMode::Dashboard,
            "mission" | "planner" | "mission_planner" => ViewMode::MissionPlanner,
            "analyst" | "ai" | "ai_analyst" => ViewMode::AiAnalyst,
            "settings" => ViewMode::Settings,
            other => bail!("unknown view: {}", other),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    Help,
    Status,
    Modes,
    Mode(FlightMode),
    Draft,
    Add { lat: f64, lng: f64, alt: f32, action: WaypointAction, param1: Option<f32> },
    Remove(String),
    Up(String),
    Down(String),
    Clear,
    Upload,
    Execute,
    Delete,
    Complete,
    Fpv,
    View(ViewMode),
    Quit,
}

impl FromStr for OperatorCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else { bail!("empty command"); };
        let mut arg = |name: &str| parts.next().with_context(|| format!("{} expects <{}>", verb, name));

        let cmd = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => OperatorCommand::Help,
            "status" => OperatorCommand::Status,
            "modes" => OperatorCommand::Modes,
            "mode" => OperatorCommand::Mode(arg("mode")?.parse()?),
            "draft" => OperatorCommand::Draft,
            "add" => {
                let lat = arg("lat")?.parse::<f64>().context("lat")?;
                let lng = arg("lng")?.parse::<f64>().context("lng")?;
                let alt = arg("alt")?.parse::<f32>().context("alt")?;
                let action = match parts.next() {
                    Some(a) => a.parse()?,
                    None => WaypointAction::Waypoint,
                };
                let param1 = parts.next().map(str::parse::<f32>).transpose().context("param1")?;
                OperatorCommand::Add { lat, lng, alt, action, param1 }
            }
            "rm" | "remove" => OperatorCommand::Remove(arg("id")?.to_string()),
            "up" => OperatorCommand::Up(arg("id")?.to_string()),
            "down" => OperatorCommand::Down(arg("id")?.to_string()),
            "clear" => OperatorCommand::Clear,
            "upload" => OperatorCommand::Upload,
            "execute" | "exec" => OperatorCommand::Execute,
            "delete" => OperatorCommand::Delete,
            "complete" => OperatorCommand::Complete,
            "fpv" => OperatorCommand::Fpv,
            "view" => OperatorCommand::View(arg("view")?.parse()?),
            "quit" | "exit" => OperatorCommand::Quit,
            other => bail!("unknown command: {} (try `help`)", other),
        };
        Ok(cmd)
    }
}

#[derive(Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Quit,
}

const HELP: &str = "\
status                      telemetry frame as JSON
modes | mode <MODE>         list modes / switch mode
draft                       show the mission draft
add <lat> <lng> <alt> [ACTION] [param1]
rm|up|down <id>             edit the draft
clear                       empty the draft
upload                      validate draft and upload it
execute | delete            mission actions
complete                    signal mission finished
fpv                         toggle joystick override
view <dashboard|mission|analyst|settings>
quit";

/// The presentation side of the console: owns the [`Console`] and only ever
/// changes it through upload, the two mission actions, and mode selection.
pub struct OperatorSession {
    console: Console,
    draft: MissionDraft,
    limits: PlanLimits,
    feed: VehicleFeed,
    fpv: Arc<AtomicBool>,
    view: ViewMode,
}

impl OperatorSession {
    pub fn new(console: Console, draft: MissionDraft, limits: PlanLimits, feed: VehicleFeed, fpv: Arc<AtomicBool>) -> Self {
        Self { console, draft, limits, feed, fpv, view: ViewMode::Dashboard }
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    #[cfg(test)]
    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn handle(&mut self, cmd: OperatorCommand) -> Result<Reply> {
        let text = match cmd {
            OperatorCommand::Help => HELP.to_string(),
            OperatorCommand::Quit => return Ok(Reply::Quit),
            OperatorCommand::Status => {
                let frame = display::frame(&self.console.snapshot(), &self.feed, self.fpv.load(Ordering::Relaxed));
                serde_json::to_string_pretty(&frame).context("encode telemetry frame")?
            }
            OperatorCommand::Modes => self.render_modes(),
            OperatorCommand::Mode(m) => {
                self.console.set_mode(m);
                let s = self.console.snapshot();
                format!("mode {}: {}", s.mode(), s.modes.info().description)
            }
            OperatorCommand::Draft => self.render_draft(),
            OperatorCommand::Add { lat, lng, alt, action, param1 } => {
                self.view = ViewMode::MissionPlanner;
                let id = self.draft.push(lat, lng, alt, action);
                self.draft.update(&id, |w| w.param1 = param1);
                format!("added {} ({} in draft)", id, self.draft.len())
            }
            OperatorCommand::Remove(id) => self.edit(&id, |d, id| d.remove(id).is_some()),
            OperatorCommand::Up(id) => self.edit(&id, MissionDraft::move_up),
            OperatorCommand::Down(id) => self.edit(&id, MissionDraft::move_down),
            OperatorCommand::Clear => {
                self.view = ViewMode::MissionPlanner;
                let n = self.draft.len();
                self.draft.clear();
                format!("cleared {} waypoint(s)", n)
            }
            OperatorCommand::Upload => self.upload(),
            OperatorCommand::Execute => {
                if !self.console.snapshot().coordinator.has_mission() {
                    warn!("session: EXECUTE refused, no mission loaded");
                    return Ok(Reply::Text("EXECUTE unavailable: no mission loaded".into()));
                }
                self.console.action(MissionAction::Execute);
                self.render_state()
            }
            OperatorCommand::Delete => {
                self.console.action(MissionAction::Delete);
                self.render_state()
            }
            OperatorCommand::Complete => match self.console.mission_finished() {
                Transition::Completed => self.render_state(),
                _ => "no mission running".to_string(),
            },
            OperatorCommand::Fpv => {
                let on = !self.fpv.fetch_xor(true, Ordering::Relaxed);
                info!(fpv = on, "session: joystick override toggled");
                format!("JOYSTICK OVERRIDE {}", if on { "on" } else { "off" })
            }
            OperatorCommand::View(v) => {
                self.view = v;
                format!("view {:?}", v)
            }
        };
        Ok(Reply::Text(text))
    }

    fn upload(&mut self) -> String {
        match self.draft.finalize(&self.limits) {
            Ok(mission) => {
                let summary = RouteSummary::of(&mission);
                self.console.upload(mission);
                self.view = ViewMode::Dashboard;
                format!("uploaded {} waypoints, {:.0} m route\n{}", summary.waypoints, summary.total_m, self.render_state())
            }
            Err(PlanError::Invalid(issues)) => {
                warn!("session: upload refused, {} issue(s) in draft", issues.len());
                let mut out = String::from("upload refused:");
                for i in issues {
                    let _ = write!(out, "\n  {}", i);
                }
                out
            }
            Err(e) => {
                warn!("session: upload refused: {}", e);
                format!("upload refused: {}", e)
            }
        }
    }

    fn edit(&mut self, id: &str, op: impl FnOnce(&mut MissionDraft, &str) -> bool) -> String {
        self.view = ViewMode::MissionPlanner;
        if op(&mut self.draft, id) {
            self.render_draft()
        } else {
            format!("no change for {}", id)
        }
    }

    fn render_state(&self) -> String {
        let s = self.console.snapshot();
        let n = s.mission().map(|m| m.len()).unwrap_or(0);
        format!("status={} mode={} waypoints={}", s.status(), s.mode(), n)
    }

    fn render_modes(&self) -> String {
        let current = self.console.snapshot().mode();
        let mut out = String::new();
        for (m, meta) in mode::catalog() {
            let mark = if m == current { '*' } else { ' ' };
            let _ = writeln!(out, "{} {:<10} {}", mark, meta.label, meta.description);
        }
        out.trim_end().to_string()
    }

    fn render_draft(&self) -> String {
        if self.draft.is_empty() {
            return "draft is empty".into();
        }
        let mut out = String::new();
        for (i, w) in self.draft.waypoints().iter().enumerate() {
            let _ = write!(out, "{:>2} {:<6} {:<11} {:.6},{:.6} {}m", i + 1, w.id, w.action.to_string(), w.lat, w.lng, w.alt);
            if let Some(p) = w.param1 {
                let _ = write!(out, " p1={}", p);
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}
