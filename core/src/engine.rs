//! The simulation engine: one session at a time, advanced tick by tick.
//!
//! PER TICK (fixed order):
//!   1. Clock: skip if paused, scale the real delta by the speed multiplier.
//!   2. Advance the session's source(s).
//!   3. Station pass: one observation per station, in id order, using the
//!      model chosen at construction (instantaneous or envelope).
//!   4. Reduce: region maxima, tick maximum, session peak.
//!   5. Triggers: sound cues, then at most one alert.
//!   6. Publish the snapshot and the tick's events.
//!
//! RULES:
//!   - Nothing is carried between ticks except the session's `TriggerState`
//!     and its pending alerts.
//!   - A new placement replaces the whole `Session` value; there is no
//!     partial reset.
//!   - Numeric edge cases clamp; only bad input (time step, placement) errors.

use crate::{
    aggregator::{aggregate, instantaneous_observation, TickAggregate},
    clock::SimClock,
    command::SimCommand,
    config::SimConfig,
    envelope::{envelope_multi, envelope_single, EnvelopeParams, MultiSourceManager},
    error::{SimError, SimResult},
    event::SimEvent,
    geocoder::{EpicenterLocator, Lang},
    intensity::s_front_color,
    placement::PlacementDraft,
    projection::{Projection, Viewport},
    snapshot::{IntensitySnapshot, Observation, Phase, WaveCircle},
    station::{RegionLabel, RegionSet, Station, StationNetwork},
    trigger::{AlertEvent, AlertPolicy, TriggerState},
    types::{Epoch, GeoPoint, Seconds},
    wavefront::Source,
};
use serde::{Deserialize, Serialize};

/// How station intensity is produced. Fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityModel {
    /// Full value once a front has passed the station, nothing before.
    Instantaneous,
    /// Rise/decay envelope around each arrival, one source.
    EnvelopeSingle,
    /// Rise/decay envelope, several independently timed sources.
    EnvelopeMulti,
}

impl IntensityModel {
    pub fn name(self) -> &'static str {
        match self {
            Self::Instantaneous  => "instantaneous",
            Self::EnvelopeSingle => "envelope_single",
            Self::EnvelopeMulti  => "envelope_multi",
        }
    }

    pub fn default_alert_policy(self) -> AlertPolicy {
        match self {
            Self::Instantaneous => AlertPolicy::FirstRising,
            Self::EnvelopeSingle | Self::EnvelopeMulti => AlertPolicy::PeakOnce,
        }
    }
}

impl std::str::FromStr for IntensityModel {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instantaneous" | "baseline" => Ok(Self::Instantaneous),
            "envelope" | "envelope_single" => Ok(Self::EnvelopeSingle),
            "multi" | "envelope_multi" => Ok(Self::EnvelopeMulti),
            other => Err(SimError::Other(anyhow::anyhow!("unknown intensity model '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
enum ActiveSources {
    Single(Source),
    Multi(MultiSourceManager),
}

impl ActiveSources {
    fn advance(&mut self, dt: Seconds, stations: &[Station], params: &EnvelopeParams) {
        match self {
            Self::Single(src) => src.advance(dt),
            Self::Multi(mgr) => {
                mgr.advance(dt);
                mgr.retire_settled(stations, params);
            }
        }
    }

    fn elapsed(&self) -> Seconds {
        match self {
            Self::Single(src) => src.elapsed(),
            Self::Multi(mgr) => mgr.elapsed(),
        }
    }

    fn wave_circles(&self) -> Vec<WaveCircle> {
        match self {
            Self::Single(src) => vec![WaveCircle {
                epicenter: src.epicenter,
                p_radius:  src.p_radius(),
                s_radius:  src.s_radius(),
            }],
            Self::Multi(mgr) => mgr.wave_circles(),
        }
    }
}

/// Everything that belongs to one placed event.
#[derive(Debug, Clone)]
pub struct Session {
    pub epoch:    Epoch,
    pub origin:   Source,
    pub triggers: TriggerState,
    sources:      ActiveSources,
    alerts:       Vec<AlertEvent>,
}

impl Session {
    fn new(epoch: Epoch, origin: Source, sources: ActiveSources) -> Self {
        Self { epoch, origin, triggers: TriggerState::default(), sources, alerts: Vec::new() }
    }

    pub fn elapsed(&self) -> Seconds { self.sources.elapsed() }

    /// The single source, when not in multi mode.
    pub fn source(&self) -> Option<&Source> {
        match &self.sources {
            ActiveSources::Single(src) => Some(src),
            ActiveSources::Multi(_) => None,
        }
    }

    pub fn manager(&self) -> Option<&MultiSourceManager> {
        match &self.sources {
            ActiveSources::Single(_) => None,
            ActiveSources::Multi(mgr) => Some(mgr),
        }
    }

    pub fn alerts(&self) -> &[AlertEvent] { &self.alerts }
}

fn envelope_observation((intensity, is_s): (f64, bool), noise_floor: f64) -> Option<Observation> {
    (intensity >= noise_floor).then(|| Observation::new(intensity, if is_s { Phase::S } else { Phase::P }))
}

pub struct SimEngine {
    pub clock:    SimClock,
    pub draft:    PlacementDraft,
    pub viewport: Viewport,
    config:       SimConfig,
    model:        IntensityModel,
    alert_policy: AlertPolicy,
    projection:   Projection,
    network:      StationNetwork,
    regions:      RegionSet,
    locator:      EpicenterLocator,
    session:      Option<Session>,
    last_epoch:   Epoch,
    snapshot:     IntensitySnapshot,
}

impl SimEngine {
    pub fn new(
        config:  SimConfig,
        model:   IntensityModel,
        network: StationNetwork,
        regions: RegionSet,
        locator: EpicenterLocator,
    ) -> Self {
        let projection = config.projection.build();
        let vp = config.viewport;
        Self {
            clock: SimClock::new(config.clock),
            draft: PlacementDraft::default(),
            viewport: Viewport::new(projection, vp.bounds, vp.width_px, vp.height_px),
            alert_policy: config.alert_policy.unwrap_or_else(|| model.default_alert_policy()),
            locator: locator.with_fallback(config.unknown_location.clone()),
            config,
            model,
            projection,
            network,
            regions,
            session: None,
            last_epoch: 0,
            snapshot: IntensitySnapshot::default(),
        }
    }

    /// Engine over stations only; no region polygons, no epicentre names.
    pub fn with_stations(config: SimConfig, model: IntensityModel, network: StationNetwork) -> Self {
        Self::new(config, model, network, RegionSet::default(), EpicenterLocator::default())
    }

    /// Load config and data from `data_dir`. The station list is required;
    /// region and epicentre polygons are optional.
    pub fn build(data_dir: &str, model: IntensityModel) -> anyhow::Result<Self> {
        let config = SimConfig::load(data_dir)?;
        let network = StationNetwork::load(&config.data_path(data_dir, &config.files.stations))?;

        let regions_path = config.data_path(data_dir, &config.files.regions);
        let regions = if std::path::Path::new(&regions_path).exists() {
            RegionSet::load(&regions_path)?
        } else {
            log::warn!("{regions_path} not found, region layer disabled");
            RegionSet::default()
        };

        let epicenters_path = config.data_path(data_dir, &config.files.epicenters);
        let locator = if std::path::Path::new(&epicenters_path).exists() {
            EpicenterLocator::load(&epicenters_path)?
        } else {
            log::warn!("{epicenters_path} not found, epicenters will be unnamed");
            EpicenterLocator::default()
        };

        Ok(Self::new(config, model, network, regions, locator))
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig { &self.config }
    pub fn model(&self) -> IntensityModel { self.model }
    pub fn alert_policy(&self) -> AlertPolicy { self.alert_policy }
    pub fn projection(&self) -> &Projection { &self.projection }
    pub fn network(&self) -> &StationNetwork { &self.network }
    pub fn regions(&self) -> &RegionSet { &self.regions }
    pub fn locator(&self) -> &EpicenterLocator { &self.locator }
    pub fn session(&self) -> Option<&Session> { self.session.as_ref() }
    pub fn snapshot(&self) -> &IntensitySnapshot { &self.snapshot }
    pub fn current_epoch(&self) -> Option<Epoch> { self.session.as_ref().map(|s| s.epoch) }

    /// No session running: the user is editing the placement draft.
    pub fn is_setting_mode(&self) -> bool { self.session.is_none() }

    pub fn pending_alerts(&self) -> &[AlertEvent] {
        self.session.as_ref().map_or(&[], |s| s.alerts.as_slice())
    }

    // ── Session lifecycle ─────────────────────────────────────

    fn open_session(&mut self, origin: Source, sources: ActiveSources) -> SimEvent {
        self.last_epoch += 1;
        let epoch = self.last_epoch;
        let location = self
            .locator
            .location_name(origin.epicenter.lon, origin.epicenter.lat, Lang::Native)
            .to_string();

        log::info!(
            "session {epoch} ({}): M{:.1} {:.0}km at ({:.3}, {:.3}) {location}",
            self.model.name(),
            origin.magnitude,
            origin.depth,
            origin.epicenter.lat,
            origin.epicenter.lon,
        );

        let event = SimEvent::SessionStarted {
            epoch,
            model: self.model,
            epicenter: origin.epicenter,
            depth: origin.depth,
            magnitude: origin.magnitude,
            location,
        };
        self.session = Some(Session::new(epoch, origin, sources));
        self.snapshot = IntensitySnapshot { epoch, ..IntensitySnapshot::default() };
        event
    }

    /// Start a new session from `draft`, replacing any running one.
    pub fn place(&mut self, draft: PlacementDraft) -> SimResult<Vec<SimEvent>> {
        let source = draft.commit(self.projection)?;
        self.draft = draft;
        let sources = match self.model {
            IntensityModel::EnvelopeMulti => {
                let mut mgr = MultiSourceManager::new(self.config.retire_radius_km);
                mgr.add(source.clone());
                ActiveSources::Multi(mgr)
            }
            IntensityModel::Instantaneous | IntensityModel::EnvelopeSingle => {
                ActiveSources::Single(source.clone())
            }
        };
        Ok(vec![self.open_session(source, sources)])
    }

    /// Commit the current draft.
    pub fn start(&mut self) -> SimResult<Vec<SimEvent>> {
        self.place(self.draft)
    }

    /// Multi-source mode only: add a source to the running session without
    /// resetting it. Starts a session if none is running.
    pub fn add_source(&mut self, draft: PlacementDraft, delay: Seconds) -> SimResult<Vec<SimEvent>> {
        if self.model != IntensityModel::EnvelopeMulti {
            return Err(SimError::UnsupportedByModel { op: "add_source", model: self.model.name() });
        }
        let source = draft.commit(self.projection)?;

        let Some(session) = self.session.as_mut() else {
            let mut mgr = MultiSourceManager::new(self.config.retire_radius_km);
            mgr.add_delayed(source.clone(), delay);
            return Ok(vec![self.open_session(source, ActiveSources::Multi(mgr))]);
        };

        let ActiveSources::Multi(mgr) = &mut session.sources else {
            return Err(SimError::UnsupportedByModel { op: "add_source", model: self.model.name() });
        };
        let source_id = mgr.add_delayed(source.clone(), delay);
        log::info!(
            "session {}: source {source_id} M{:.1} added, starts in {delay:.1}s",
            session.epoch,
            source.magnitude
        );
        Ok(vec![SimEvent::SourceAdded {
            epoch: session.epoch,
            source_id,
            epicenter: source.epicenter,
            depth: source.depth,
            magnitude: source.magnitude,
            at: mgr.elapsed() + delay.max(0.0),
        }])
    }

    /// End the running session. Back to setting mode.
    pub fn reset(&mut self) -> Vec<SimEvent> {
        self.snapshot = IntensitySnapshot::default();
        self.clock.resume();
        match self.session.take() {
            Some(session) => {
                log::info!("session {} reset", session.epoch);
                vec![SimEvent::SessionReset { epoch: session.epoch }]
            }
            None => Vec::new(),
        }
    }

    pub fn apply(&mut self, command: SimCommand) -> SimResult<Vec<SimEvent>> {
        match command {
            SimCommand::Pause       => self.clock.pause(),
            SimCommand::Resume      => self.clock.resume(),
            SimCommand::TogglePause => { self.clock.toggle_pause(); }
            SimCommand::SpeedUp     => { self.clock.speed_up(); }
            SimCommand::SlowDown    => { self.clock.slow_down(); }
            SimCommand::MoveDraft { lat, lon } => self.draft.move_to(lat, lon),
            SimCommand::NudgeDepth { steps } => self.draft.nudge_depth(steps),
            SimCommand::NudgeMagnitude { steps } => self.draft.nudge_magnitude(steps),
            SimCommand::ResetDraft  => self.draft = PlacementDraft::default(),
            SimCommand::Start       => return self.start(),
            SimCommand::Place { placement } => return self.place(placement),
            SimCommand::AddSource { placement, delay } => return self.add_source(placement, delay),
            SimCommand::Reset       => return Ok(self.reset()),
        }
        Ok(Vec::new())
    }

    // ── Tick ──────────────────────────────────────────────────

    /// Advance by `real_dt` seconds of wall time.
    pub fn tick(&mut self, real_dt: Seconds) -> SimResult<Vec<SimEvent>> {
        if !real_dt.is_finite() || real_dt < 0.0 {
            return Err(SimError::InvalidTimeStep { dt: real_dt });
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(Vec::new());
        };
        let Some(sim_dt) = self.clock.advance(real_dt) else {
            return Ok(Vec::new());
        };
        let th = self.config.thresholds;
        let params = self.config.envelope;
        let stations = self.network.stations();

        session.sources.advance(sim_dt, stations, &params);

        let agg: TickAggregate = match (&session.sources, self.model) {
            (ActiveSources::Single(src), IntensityModel::Instantaneous) => {
                let (p_radius, s_radius) = (src.p_radius(), src.s_radius());
                aggregate(stations, |st| {
                    instantaneous_observation(src, st, p_radius, s_radius, th.noise_floor)
                })
            }
            (ActiveSources::Single(src), _) => aggregate(stations, |st| {
                envelope_observation(envelope_single(src, st, &params), th.noise_floor)
            }),
            (ActiveSources::Multi(mgr), _) => aggregate(stations, |st| {
                envelope_observation(envelope_multi(mgr, st, &params), th.noise_floor)
            }),
        };

        let now = session.sources.elapsed();
        let epoch = session.epoch;
        let mut events = Vec::new();

        session.triggers.record_peak(agg.tick_max, &agg.tick_max_location);

        let peak = session.triggers.peak_intensity;
        for cue in session.triggers.evaluate_sounds(peak, &th) {
            log::info!("session {epoch}: sound {cue:?} at t={now:.2} (max {peak:.2})");
            events.push(SimEvent::SoundTriggered { epoch, cue, at: now, max_intensity: peak });
        }

        if let Some(alert) =
            session.triggers.evaluate_alert(self.alert_policy, &agg.observations, stations, now, &th)
        {
            log::debug!(
                "session {epoch}: alert {} at station {} t={now:.2}",
                alert.scale,
                alert.station_id
            );
            session.alerts.push(alert.clone());
            events.push(SimEvent::AlertRaised { epoch, alert });
        }

        let felt = agg.observations.iter().filter(|o| o.is_some()).count();
        self.snapshot = IntensitySnapshot {
            epoch,
            tick: self.clock.current_tick,
            elapsed: now,
            stations: agg.observations,
            region_max: agg.region_max,
            tick_max: agg.tick_max,
            tick_max_location: agg.tick_max_location,
            peak_intensity: peak,
            peak_location: session.triggers.peak_location.clone(),
            wave_circles: session.sources.wave_circles(),
            s_front_color: Some(s_front_color(peak)),
        };

        log::debug!(
            "tick={} t={now:.2} felt={felt} max={:.2} peak={peak:.2}",
            self.clock.current_tick,
            self.snapshot.tick_max
        );

        events.push(SimEvent::TickCompleted {
            tick: self.clock.current_tick,
            elapsed: now,
            felt,
            tick_max: self.snapshot.tick_max,
            peak_scale: self.snapshot.peak_scale(),
        });
        Ok(events)
    }

    /// Run `n` ticks of `dt` each. Used by tests and the runner.
    pub fn run_ticks(&mut self, n: u64, dt: Seconds) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(self.tick(dt)?);
        }
        Ok(events)
    }

    // ── Alerts & presentation helpers ─────────────────────────

    /// Drop alerts whose display time has passed. Returns how many.
    pub fn expire_alerts(&mut self) -> usize {
        let duration = self.config.alert_display_secs;
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let now = session.sources.elapsed();
        let before = session.alerts.len();
        session.alerts.retain(|a| !a.is_expired(now, duration));
        before - session.alerts.len()
    }

    pub fn region_labels(&self) -> Vec<RegionLabel> {
        self.regions.labels(&self.snapshot.region_max, self.config.region_label_min)
    }

    /// Where the running session started, or the draft position.
    pub fn epicenter(&self) -> GeoPoint {
        self.session
            .as_ref()
            .map_or(GeoPoint::new(self.draft.lat, self.draft.lon), |s| s.origin.epicenter)
    }

    pub fn epicenter_name(&self, lang: Lang) -> &str {
        let at = self.epicenter();
        self.locator.location_name(at.lon, at.lat, lang)
    }
}
