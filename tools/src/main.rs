//! sim-runner: headless runner for the quake simulator.
//!
//! Usage:
//!   sim-runner --data-dir ./data --mode envelope --lat 35.7 --lon 139.7 --depth 10 --mag 6.0
//!   sim-runner --mode multi --swarm 5 --seed 42 --seconds 180
//!   sim-runner --ipc-mode --mode instantaneous
//!   sim-runner --merge candidates.json --out merged.json

use anyhow::Result;
use quakesim_core::{
    command::SimCommand,
    engine::{IntensityModel, SimEngine},
    event::SimEvent,
    geocoder::Lang,
    placement::PlacementDraft,
    projection::MapBounds,
    scenario::{aftershock_swarm, SwarmParams},
    snapshot::IntensitySnapshot,
    station::{RegionLabel, StationNetwork},
    trigger::{AlertEvent, TriggerState},
    types::{Epoch, Tick},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        #[serde(default = "one")]
        count: u64,
        #[serde(default = "default_dt")]
        dt: f64,
    },
    Command {
        command: SimCommand,
    },
    Quit,
}

fn one() -> u64 { 1 }
fn default_dt() -> f64 { 0.1 }

#[derive(serde::Serialize)]
struct UiState<'a> {
    tick:          Tick,
    paused:        bool,
    time_scale:    f64,
    setting_mode:  bool,
    epoch:         Option<Epoch>,
    draft:         PlacementDraft,
    epicenter:     &'a str,
    snapshot:      &'a IntensitySnapshot,
    labels:        Vec<RegionLabel>,
    alerts:        &'a [AlertEvent],
    triggers:      Option<&'a TriggerState>,
    events:        &'a [SimEvent],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");

    if let Some(candidates) = str_arg(&args, "--merge") {
        let out = str_arg(&args, "--out").unwrap_or("merged_stations.json");
        return run_merge(data_dir, candidates, out);
    }

    let model: IntensityModel = str_arg(&args, "--mode")
        .unwrap_or("instantaneous")
        .parse()?;
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let mut engine = SimEngine::build(data_dir, model)?;

    if ipc_mode {
        return run_ipc_loop(&mut engine);
    }

    let defaults = PlacementDraft::default();
    let draft = PlacementDraft::new(
        parse_arg(&args, "--lat", defaults.lat),
        parse_arg(&args, "--lon", defaults.lon),
        parse_arg(&args, "--depth", defaults.depth),
        parse_arg(&args, "--mag", defaults.magnitude),
    );
    let seconds = parse_arg(&args, "--seconds", 120.0f64);
    let dt = parse_arg(&args, "--dt", 0.1f64);
    let swarm = parse_arg(&args, "--swarm", 0usize);
    let seed = parse_arg(&args, "--seed", 42u64);

    println!("quakesim sim-runner");
    println!("  mode:      {}", model.name());
    println!("  data_dir:  {data_dir}");
    println!("  stations:  {}", engine.network().len());
    println!("  source:    M{:.1} {:.0}km ({:.3}, {:.3})", draft.magnitude, draft.depth, draft.lat, draft.lon);
    println!("  seconds:   {seconds}  dt: {dt}");
    println!();

    let mut events = engine.place(draft)?;
    if swarm > 0 {
        let params = SwarmParams { count: swarm, ..SwarmParams::default() };
        for shock in aftershock_swarm(&draft, &params, seed) {
            events.extend(engine.add_source(shock.placement, shock.delay)?);
        }
    }

    let ticks = if dt > 0.0 { (seconds / dt).ceil() as u64 } else { 0 };
    events.extend(engine.run_ticks(ticks, dt)?);

    print_summary(&engine, &events);
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("ipc: unreadable command: {e}");
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let events = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Ok(Vec::new()),
            IpcCommand::Tick { count, dt } => engine.run_ticks(count, dt),
            IpcCommand::Command { command } => engine.apply(command),
        };

        match events {
            Ok(events) => {
                engine.expire_alerts();
                let state = build_ui_state(engine, &events);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            Err(e) => write_error(&mut stdout, &e.to_string())?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    writeln!(out, "{}", serde_json::json!({ "error": message }))?;
    out.flush()?;
    Ok(())
}

fn build_ui_state<'a>(engine: &'a SimEngine, events: &'a [SimEvent]) -> UiState<'a> {
    UiState {
        tick:         engine.clock.current_tick,
        paused:       engine.clock.paused,
        time_scale:   engine.clock.time_scale,
        setting_mode: engine.is_setting_mode(),
        epoch:        engine.current_epoch(),
        draft:        engine.draft,
        epicenter:    engine.epicenter_name(Lang::Native),
        snapshot:     engine.snapshot(),
        labels:       engine.region_labels(),
        alerts:       engine.pending_alerts(),
        triggers:     engine.session().map(|s| &s.triggers),
        events,
    }
}

fn print_summary(engine: &SimEngine, events: &[SimEvent]) {
    let snap = engine.snapshot();

    println!("=== RUN SUMMARY ===");
    println!("  epicenter:      {}", engine.epicenter_name(Lang::Native));
    println!("  ticks run:      {}", engine.clock.current_tick);
    println!("  elapsed:        {:.1}s", snap.elapsed);
    println!("  felt now:       {}", snap.felt_count());
    println!(
        "  peak:           {:.2} (shindo {}) at {}",
        snap.peak_intensity,
        snap.peak_scale(),
        snap.peak_location
    );
    if let Some(mgr) = engine.session().and_then(|s| s.manager()) {
        println!("  sources:        {} ({} active)", mgr.sources().len(), mgr.active_count());
    }

    println!();
    println!("=== TRIGGERS ===");
    for event in events {
        match event {
            SimEvent::SoundTriggered { cue, at, max_intensity, .. } => {
                println!("  t={at:>6.1}s  sound {cue:?} (max {max_intensity:.2})");
            }
            SimEvent::AlertRaised { alert, .. } => {
                let name = engine
                    .network()
                    .get(alert.station_id)
                    .map_or("", |s| s.region_name());
                println!(
                    "  t={:>6.1}s  alert shindo {} at station {} {name}",
                    alert.triggered_at, alert.scale, alert.station_id
                );
            }
            SimEvent::SourceAdded { source_id, magnitude, at, .. } => {
                println!("  t={at:>6.1}s  source {source_id} M{magnitude:.1}");
            }
            _ => {}
        }
    }

    println!();
    println!("=== REGION MAXIMA (final tick) ===");
    let labels = engine.region_labels();
    if labels.is_empty() {
        let mut maxima: Vec<_> = snap.region_max.iter().collect();
        maxima.sort_by(|a, b| b.1.total_cmp(a.1));
        for (code, value) in maxima.iter().take(10) {
            println!("  {code:<8} {value:.2}");
        }
    } else {
        for label in labels {
            println!("  {:<8} {:.2} ({})", label.code, label.intensity, label.scale);
        }
    }
}

fn run_merge(data_dir: &str, candidates_path: &str, out: &str) -> Result<()> {
    let config = quakesim_core::config::SimConfig::load(data_dir)?;
    let mut network = StationNetwork::load(&config.data_path(data_dir, &config.files.stations))?;
    let candidates = StationNetwork::load(candidates_path)?;

    let before = network.len();
    let offered = candidates.len();
    let added = network.merge_missing(
        candidates.stations().to_vec(),
        quakesim_core::station::DEFAULT_MERGE_TOLERANCE_DEG,
        &MapBounds::default(),
    );
    std::fs::write(out, network.to_json()?)
        .map_err(|e| anyhow::anyhow!("Cannot write {out}: {e}"))?;

    println!("=== MERGE ===");
    println!("  existing:   {before}");
    println!("  candidates: {offered}");
    println!("  added:      {added}");
    println!("  written:    {out}");
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
