mod display;
mod session;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use becky_fc::{mode, Console, FcConfig};
use becky_planner::{doctor as plan_doctor, MissionDraft, PlanError, PlanLimits, RouteSummary};
use becky_proto::telemetry::VehicleFeed;
use becky_proto::Waypoint;

use session::{OperatorCommand, OperatorSession, Reply};

#[derive(Debug, Parser)]
#[command(name = "becky", version, about = "BECKY - tactical UAV operator console")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check the config and the draft mission without starting a session.
    Doctor,
    /// List flight modes with their descriptions.
    Modes,
    Plan { #[command(subcommand)] cmd: PlanCmd },
    /// Interactive operator session on stdin.
    Run,
}

#[derive(Debug, Subcommand)]
enum PlanCmd {
    /// Validate `[[mission.waypoints]]` and print a route summary.
    Check,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    console: ConsoleCfg,
    #[serde(default)]
    fc: FcConfig,
    #[serde(default)]
    planner: PlanLimits,
    #[serde(default)]
    mission: MissionCfg,
    telemetry: Option<VehicleFeed>,
    link: Option<LinkCfg>,
}

#[derive(Debug, serde::Deserialize)]
struct ConsoleCfg {
    unit_id: String,
    refresh_ms: Option<u64>,
}

impl ConsoleCfg {
    /// Display refresh period; the interval timer needs a non-zero period.
    fn refresh_period(&self) -> Result<Duration> {
        let ms = self.refresh_ms.unwrap_or(1000);
        anyhow::ensure!(ms >= 50, "console.refresh_ms should be >= 50 (got {})", ms);
        Ok(Duration::from_millis(ms))
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct MissionCfg {
    #[serde(default)]
    waypoints: Vec<Waypoint>,
}

/// Where a real command link would connect. Checked, never dialled.
#[derive(Debug, serde::Deserialize)]
struct LinkCfg {
    server_url: String,
    access_code: Option<String>,
    group_id: Option<String>,
    #[serde(default)]
    is_local: bool,
    port: String,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Modes => print_modes(),
        Command::Plan { cmd } => plan_cmd(&cfg, cmd)?,
        Command::Run => run(&cfg).await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    anyhow::ensure!(!cfg.console.unit_id.trim().is_empty(), "console.unit_id missing");
    cfg.console.refresh_period()?;
    plan_doctor::check_limits(&cfg.planner)?;

    if cfg.mission.waypoints.is_empty() {
        info!("doctor: no draft mission configured (OK)");
    } else {
        let issues = plan_doctor::check_mission(&cfg.mission.waypoints, &cfg.planner);
        for i in &issues {
            warn!("doctor: {}", i);
        }
        anyhow::ensure!(issues.is_empty(), "draft mission has {} issue(s)", issues.len());
    }

    if let Some(link) = &cfg.link {
        check_link(link)?;
    } else {
        info!("doctor: no [link] section, console runs offline");
    }

    info!("doctor: OK");
    Ok(())
}

fn check_link(link: &LinkCfg) -> Result<()> {
    let port: u16 = link.port.trim().parse().with_context(|| format!("link.port invalid: {}", link.port))?;
    anyhow::ensure!(port > 0, "link.port must be non-zero");
    if !link.is_local {
        anyhow::ensure!(
            ["https://", "wss://"].iter().any(|p| link.server_url.starts_with(p)),
            "link.server_url must be https:// or wss:// unless link.is_local"
        );
        anyhow::ensure!(
            link.access_code.as_ref().map(|s| !s.is_empty()).unwrap_or(false),
            "link.access_code required for remote links"
        );
    }
    if link.group_id.is_none() {
        warn!("doctor: link.group_id not set");
    }
    Ok(())
}

fn print_modes() {
    for (m, meta) in mode::catalog() {
        println!("{:<10} {:<8} {}", m.as_str(), meta.tone, meta.description);
    }
}

fn plan_cmd(cfg: &Config, cmd: PlanCmd) -> Result<()> {
    match cmd {
        PlanCmd::Check => {
            let draft = MissionDraft::from_waypoints(cfg.mission.waypoints.clone());
            match draft.finalize(&cfg.planner) {
                Ok(m) => {
                    let s = RouteSummary::of(&m);
                    println!("OK: {} waypoints, {} legs", s.waypoints, s.legs);
                    println!("route={:.0}m longest_leg={:.0}m max_alt={}m", s.total_m, s.longest_leg_m, s.max_alt_m);
                    println!("starts_with_takeoff={} ends_with={}", s.starts_with_takeoff, s.ends_with);
                    Ok(())
                }
                Err(PlanError::Invalid(issues)) => {
                    for i in &issues {
                        println!("{}", i);
                    }
                    anyhow::bail!("draft mission has {} issue(s)", issues.len())
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

async fn run(cfg: &Config) -> Result<()> {
    let every = cfg.console.refresh_period()?;
    info!("run: starting console {}", cfg.console.unit_id);

    let console = Console::new(&cfg.fc);
    let fpv = Arc::new(AtomicBool::new(false));
    let feed = cfg.telemetry.clone().unwrap_or_else(display::default_feed);

    let refresh = display::spawn_refresh(console.subscribe(), feed.clone(), fpv.clone(), every);
    let draft = MissionDraft::from_waypoints(cfg.mission.waypoints.clone());
    let mut session = OperatorSession::new(console, draft, cfg.planner.clone(), feed, fpv);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let prompt = format!("{} [{:?}]> ", cfg.console.unit_id, session.view());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let line = tokio::select! {
            l = lines.next_line() => l.context("read operator input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break; };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = line.parse::<OperatorCommand>().and_then(|cmd| session.handle(cmd));
        match reply {
            Ok(Reply::Quit) => break,
            Ok(Reply::Text(t)) => println!("{}", t),
            Err(e) => println!("error: {:#}", e),
        }
    }

    // Dropping the session drops the console, which ends the refresh task.
    drop(session);
    refresh.await.context("display task")?;
    info!("run: stopped");
    Ok(())
}
