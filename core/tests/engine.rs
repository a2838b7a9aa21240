//! Engine tests.
//!
//! Tests cover: session lifecycle and epochs, tick validation, pause and
//! time scale, one-shot triggers across resets, alert policies per model,
//! multi-source sessions, snapshot consistency, commands and events.

use quakesim_core::{
    command::SimCommand,
    config::SimConfig,
    engine::{IntensityModel, SimEngine},
    error::SimError,
    event::SimEvent,
    geocoder::{EpicenterLocator, Lang},
    geometry::{parse_features, Shape},
    placement::PlacementDraft,
    station::{Region, RegionSet, Station, StationNetwork},
    trigger::SoundCue,
};

fn network() -> StationNetwork {
    StationNetwork::new(vec![
        Station::new(35.7, 139.7, "350", "Tokyo", 1.0),    // epicentre
        Station::new(35.7, 140.2, "340", "Chiba", 1.0),    // 45 km
        Station::new(35.7, 141.7, "300", "Offshore", 1.0), // 180 km
        Station::new(36.4, 139.0, "321", "Gunma", 1.2),
    ])
}

fn build(model: IntensityModel) -> SimEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    SimEngine::with_stations(SimConfig::default(), model, network())
}

fn m6() -> PlacementDraft {
    PlacementDraft::new(35.7, 139.7, 10.0, 6.0)
}

fn count_sounds(events: &[SimEvent], wanted: SoundCue) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SimEvent::SoundTriggered { cue, .. } if *cue == wanted))
        .count()
}

fn alerts(events: &[SimEvent]) -> Vec<&quakesim_core::trigger::AlertEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            SimEvent::AlertRaised { alert, .. } => Some(alert),
            _ => None,
        })
        .collect()
}

// ── Lifecycle ──────────────────────────────────────────────────────────────

#[test]
fn idle_engine_ticks_to_nothing() {
    let mut engine = build(IntensityModel::Instantaneous);
    assert!(engine.is_setting_mode());
    let events = engine.tick(0.1).unwrap();
    assert!(events.is_empty());
    assert_eq!(engine.clock.current_tick, 0, "no session, no ticks counted");
    assert!(engine.snapshot().stations.is_empty());
}

#[test]
fn bad_time_steps_are_rejected() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    for dt in [-0.1, f64::NAN, f64::INFINITY] {
        assert!(
            matches!(engine.tick(dt), Err(SimError::InvalidTimeStep { .. })),
            "dt={dt} must be rejected"
        );
    }
    assert_eq!(engine.session().unwrap().elapsed(), 0.0);
}

#[test]
fn each_placement_is_a_new_epoch() {
    let mut engine = build(IntensityModel::Instantaneous);

    let events = engine.place(m6()).unwrap();
    assert!(matches!(events[0], SimEvent::SessionStarted { epoch: 1, .. }));
    engine.run_ticks(20, 0.1).unwrap();
    assert!(engine.session().unwrap().triggers.intensity4_played);

    let events = engine.place(PlacementDraft::new(36.0, 140.0, 30.0, 5.0)).unwrap();
    assert!(matches!(events[0], SimEvent::SessionStarted { epoch: 2, .. }));

    let session = engine.session().unwrap();
    assert_eq!(session.epoch, 2);
    assert_eq!(session.elapsed(), 0.0);
    assert!(!session.triggers.intensity4_played, "new session, fresh trigger state");
    assert!(session.alerts().is_empty());
    assert_eq!(engine.snapshot().epoch, 2);
    assert_eq!(engine.snapshot().peak_intensity, 0.0);
}

#[test]
fn invalid_placement_leaves_engine_untouched() {
    let mut engine = build(IntensityModel::Instantaneous);
    let err = engine.place(PlacementDraft::new(35.0, 139.0, 800.0, 6.0)).unwrap_err();
    assert!(matches!(err, SimError::InvalidPlacement { field: "depth", .. }));
    assert!(engine.is_setting_mode());
    assert_eq!(engine.current_epoch(), None);
}

#[test]
fn reset_returns_to_setting_mode() {
    let mut engine = build(IntensityModel::EnvelopeSingle);
    engine.place(m6()).unwrap();
    engine.run_ticks(10, 0.1).unwrap();

    let events = engine.reset();
    assert_eq!(events, vec![SimEvent::SessionReset { epoch: 1 }]);
    assert!(engine.is_setting_mode());
    assert!(engine.snapshot().stations.is_empty());
    assert!(engine.reset().is_empty(), "second reset is a no-op");

    // Epochs keep counting across resets.
    let events = engine.place(m6()).unwrap();
    assert!(matches!(events[0], SimEvent::SessionStarted { epoch: 2, .. }));
}

// ── Clock ──────────────────────────────────────────────────────────────────

#[test]
fn paused_ticks_do_nothing() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    engine.clock.pause();

    assert!(engine.run_ticks(10, 0.1).unwrap().is_empty());
    assert_eq!(engine.clock.current_tick, 0);
    assert_eq!(engine.session().unwrap().elapsed(), 0.0);

    engine.clock.resume();
    engine.tick(0.1).unwrap();
    assert_eq!(engine.clock.current_tick, 1);
}

#[test]
fn time_scale_multiplies_the_step() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    assert_eq!(engine.clock.speed_up(), 1.5);
    engine.tick(0.1).unwrap();
    let elapsed = engine.session().unwrap().elapsed();
    assert!((elapsed - 0.15).abs() < 1e-12, "got {elapsed}");
}

#[test]
fn time_scale_is_bounded() {
    let mut engine = build(IntensityModel::Instantaneous);
    for _ in 0..20 {
        engine.clock.speed_up();
    }
    assert_eq!(engine.clock.time_scale, 10.0);
    for _ in 0..40 {
        engine.clock.slow_down();
    }
    assert_eq!(engine.clock.time_scale, 0.1);
    engine.clock.set_time_scale(f64::NAN);
    assert_eq!(engine.clock.time_scale, 0.1);
}

// ── Triggers ───────────────────────────────────────────────────────────────

#[test]
fn intensity4_sound_plays_once_per_session() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    let events = engine.run_ticks(600, 0.1).unwrap();
    assert_eq!(count_sounds(&events, SoundCue::Intensity4), 1);
    assert_eq!(count_sounds(&events, SoundCue::Intensity7), 0, "M6 peaks at 5+");

    engine.reset();
    engine.place(m6()).unwrap();
    let events = engine.run_ticks(10, 0.1).unwrap();
    assert_eq!(count_sounds(&events, SoundCue::Intensity4), 1, "re-armed by the new session");
}

#[test]
fn great_quake_plays_both_sounds() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(PlacementDraft::new(35.7, 139.7, 0.0, 9.5)).unwrap();
    let events = engine.run_ticks(50, 0.1).unwrap();
    assert_eq!(count_sounds(&events, SoundCue::Intensity4), 1);
    assert_eq!(count_sounds(&events, SoundCue::Intensity7), 1);
}

#[test]
fn baseline_alerts_only_rise() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    let events = engine.run_ticks(600, 0.1).unwrap();
    let raised = alerts(&events);

    assert!(!raised.is_empty());
    assert_eq!(raised[0].station_id, 0, "epicentre station crosses first");
    assert_eq!(raised[0].scale.label(), "5+");
    for pair in raised.windows(2) {
        assert!(pair[1].intensity > pair[0].intensity, "watermark must rise");
    }
}

#[test]
fn realtime_alert_fires_exactly_once() {
    for model in [IntensityModel::EnvelopeSingle, IntensityModel::EnvelopeMulti] {
        let mut engine = build(model);
        engine.place(m6()).unwrap();
        let events = engine.run_ticks(600, 0.1).unwrap();
        assert_eq!(alerts(&events).len(), 1, "{} must alert once", model.name());
        assert!(engine.session().unwrap().triggers.alert_fired_once);
    }
}

#[test]
fn weak_event_never_alerts() {
    let mut engine = build(IntensityModel::EnvelopeSingle);
    engine.place(PlacementDraft::new(35.7, 139.7, 50.0, 3.0)).unwrap();
    let events = engine.run_ticks(300, 0.1).unwrap();
    assert!(alerts(&events).is_empty());
    assert_eq!(count_sounds(&events, SoundCue::Intensity4), 0);
}

#[test]
fn alerts_expire_after_display_time() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    engine.tick(0.1).unwrap();
    assert_eq!(engine.pending_alerts().len(), 1);
    assert_eq!(engine.expire_alerts(), 0, "still on screen");

    engine.run_ticks(10, 0.1).unwrap();
    assert_eq!(engine.expire_alerts(), 1);
    assert!(engine.pending_alerts().is_empty());
}

// ── Snapshot ───────────────────────────────────────────────────────────────

#[test]
fn snapshot_is_consistent_with_stations() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    engine.run_ticks(150, 0.1).unwrap();
    let snap = engine.snapshot();

    assert_eq!(snap.stations.len(), engine.network().len());
    for (code, &max) in &snap.region_max {
        let expected = snap
            .felt()
            .filter(|(id, _)| engine.network().get(*id).map(|s| s.region_code()) == Some(code.as_str()))
            .map(|(_, o)| o.intensity)
            .fold(0.0, f64::max);
        assert_eq!(max, expected, "region {code}");
    }
    let tick_max = snap.felt().map(|(_, o)| o.intensity).fold(0.0, f64::max);
    assert_eq!(snap.tick_max, tick_max);
    assert_eq!(snap.wave_circles.len(), 1);
    assert!(snap.wave_circles[0].p_radius >= snap.wave_circles[0].s_radius);
}

#[test]
fn peak_survives_decay_in_realtime_mode() {
    let mut engine = build(IntensityModel::EnvelopeSingle);
    engine.place(m6()).unwrap();
    engine.run_ticks(1200, 0.1).unwrap();
    let snap = engine.snapshot();

    assert!(snap.peak_intensity > 5.0, "peak {} should be ~5.44", snap.peak_intensity);
    assert!(snap.tick_max < snap.peak_intensity, "shaking has decayed");
    assert_eq!(snap.peak_location, "Tokyo");
    assert_eq!(snap.peak_scale().label(), "5+");
}

#[test]
fn s_front_colour_follows_the_peak() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.place(m6()).unwrap();
    engine.tick(0.1).unwrap();
    let snap = engine.snapshot();
    assert_eq!(snap.s_front_color, Some(snap.peak_scale().badge_color()));
}

// ── Multi-source ───────────────────────────────────────────────────────────

#[test]
fn add_source_needs_multi_mode() {
    let mut engine = build(IntensityModel::EnvelopeSingle);
    engine.place(m6()).unwrap();
    let err = engine.add_source(m6(), 0.0).unwrap_err();
    assert!(matches!(err, SimError::UnsupportedByModel { op: "add_source", .. }));
}

#[test]
fn added_sources_join_without_reset() {
    let mut engine = build(IntensityModel::EnvelopeMulti);
    engine.place(m6()).unwrap();
    engine.run_ticks(10, 0.1).unwrap();

    let events = engine
        .add_source(PlacementDraft::new(36.0, 140.0, 20.0, 5.5), 3.0)
        .unwrap();
    match &events[0] {
        SimEvent::SourceAdded { epoch, source_id, at, .. } => {
            assert_eq!((*epoch, *source_id), (1, 1));
            assert!((at - 4.0).abs() < 1e-9, "starts 3 s after t=1, got {at}");
        }
        other => panic!("expected SourceAdded, got {other:?}"),
    }
    assert_eq!(engine.current_epoch(), Some(1), "same session");

    engine.run_ticks(10, 0.1).unwrap();
    assert_eq!(engine.session().unwrap().manager().unwrap().active_count(), 1);
    engine.run_ticks(25, 0.1).unwrap();
    assert_eq!(engine.session().unwrap().manager().unwrap().active_count(), 2);
    assert_eq!(engine.snapshot().wave_circles.len(), 2);
}

#[test]
fn add_source_without_session_starts_one() {
    let mut engine = build(IntensityModel::EnvelopeMulti);
    let events = engine.add_source(m6(), 0.0).unwrap();
    assert!(matches!(events[0], SimEvent::SessionStarted { epoch: 1, .. }));
    assert!(!engine.is_setting_mode());
}

// ── Commands, naming, regions ──────────────────────────────────────────────

#[test]
fn commands_drive_the_draft_and_session() {
    let mut engine = build(IntensityModel::Instantaneous);
    engine.apply(SimCommand::MoveDraft { lat: 36.0, lon: 140.0 }).unwrap();
    engine.apply(SimCommand::NudgeMagnitude { steps: 5 }).unwrap();
    engine.apply(SimCommand::NudgeDepth { steps: 3 }).unwrap();
    assert_eq!(engine.draft, PlacementDraft::new(36.0, 140.0, 40.0, 6.5));

    let events = engine.apply(SimCommand::Start).unwrap();
    match &events[0] {
        SimEvent::SessionStarted { magnitude, depth, .. } => {
            assert_eq!((*magnitude, *depth), (6.5, 40.0));
        }
        other => panic!("expected SessionStarted, got {other:?}"),
    }

    engine.apply(SimCommand::TogglePause).unwrap();
    assert!(engine.clock.paused);
    engine.apply(SimCommand::Reset).unwrap();
    assert!(!engine.clock.paused, "reset unpauses");
    engine.apply(SimCommand::ResetDraft).unwrap();
    assert_eq!(engine.draft, PlacementDraft::default());
}

#[test]
fn commands_and_events_use_tagged_json() {
    let cmd: SimCommand = serde_json::from_str(
        r#"{"cmd":"place","placement":{"lat":35.7,"lon":139.7,"depth":10.0,"magnitude":6.0}}"#,
    )
    .unwrap();
    assert_eq!(cmd, SimCommand::Place { placement: m6() });

    let cmd: SimCommand = serde_json::from_str(
        r#"{"cmd":"add_source","placement":{"lat":35.7,"lon":139.7,"depth":10.0,"magnitude":6.0}}"#,
    )
    .unwrap();
    assert_eq!(cmd, SimCommand::AddSource { placement: m6(), delay: 0.0 });

    let json = serde_json::to_value(SimEvent::SessionReset { epoch: 3 }).unwrap();
    assert_eq!(json["type"], "session_reset");
    assert_eq!(json["epoch"], 3);
}

#[test]
fn epicentre_is_named_in_every_language() {
    let features = parse_features(
        r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "properties":{"id":"350","name":"東京都２３区","name_en":"Tokyo 23 Wards"},
            "geometry":{"type":"Polygon","coordinates":[[[139.5,35.5],[139.9,35.5],[139.9,35.9],[139.5,35.9],[139.5,35.5]]]}}]}"#,
    )
    .unwrap();
    let mut engine = SimEngine::new(
        SimConfig::default(),
        IntensityModel::Instantaneous,
        network(),
        RegionSet::default(),
        EpicenterLocator::from_features(features),
    );

    // Draft position before any session.
    assert_eq!(engine.epicenter_name(Lang::En), "Tokyo 23 Wards");

    let events = engine.place(PlacementDraft::new(30.0, 135.0, 10.0, 5.0)).unwrap();
    match &events[0] {
        SimEvent::SessionStarted { location, .. } => assert_eq!(location, "Unknown area"),
        other => panic!("expected SessionStarted, got {other:?}"),
    }
    assert_eq!(engine.epicenter_name(Lang::Native), "Unknown area");
}

#[test]
fn region_labels_follow_the_snapshot() {
    let square = Shape::new(vec![vec![[139.2, 35.2], [140.2, 35.2], [140.2, 36.2], [139.2, 36.2]]]);
    let regions = RegionSet::new(vec![Region { code: "350".into(), name: "Tokyo".into(), shape: square }]);
    let mut engine = SimEngine::new(
        SimConfig::default(),
        IntensityModel::Instantaneous,
        network(),
        regions,
        EpicenterLocator::default(),
    );
    assert!(engine.region_labels().is_empty());

    engine.place(m6()).unwrap();
    engine.tick(0.1).unwrap();
    let labels = engine.region_labels();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].code, "350");
    assert!((labels[0].anchor.lat - 35.7).abs() < 1e-9);
}

// ── Data loading ───────────────────────────────────────────────────────────

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn builds_from_the_sample_data() {
    let mut engine = SimEngine::build(&data_dir(), IntensityModel::EnvelopeSingle)
        .expect("sample data loads");
    assert_eq!(engine.network().len(), 15);
    assert!(!engine.regions().is_empty());
    assert!(!engine.locator().is_empty());
    assert_eq!(engine.epicenter_name(Lang::En), "Tokyo 23 Wards");

    engine.start().unwrap();
    engine.run_ticks(100, 0.1).unwrap();
    assert!(engine.snapshot().felt_count() > 0, "an M6 under Tokyo is felt within 10 s");
    assert!(!engine.region_labels().is_empty());
}

#[test]
fn config_file_is_optional_but_must_be_valid() {
    let dir = std::env::temp_dir().join(format!("quakesim-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let dir_str = dir.to_str().unwrap();

    let config = SimConfig::load(dir_str).unwrap();
    assert_eq!(config, SimConfig::default(), "missing file means defaults");

    std::fs::write(dir.join("sim_config.json"), r#"{"thresholds":{"alert":4.0}}"#).unwrap();
    let config = SimConfig::load(dir_str).unwrap();
    assert_eq!(config.thresholds.alert, 4.0);
    assert_eq!(config.thresholds.noise_floor, 0.5, "unset fields keep defaults");

    std::fs::write(dir.join("sim_config.json"), "{ not json").unwrap();
    assert!(SimConfig::load(dir_str).is_err());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn model_names_parse() {
    assert_eq!("instantaneous".parse::<IntensityModel>().unwrap(), IntensityModel::Instantaneous);
    assert_eq!("envelope".parse::<IntensityModel>().unwrap(), IntensityModel::EnvelopeSingle);
    assert_eq!("multi".parse::<IntensityModel>().unwrap(), IntensityModel::EnvelopeMulti);
    assert!("quantum".parse::<IntensityModel>().is_err());
}
