//! Real-time ("EEW") envelope intensity.
//!
//! Instead of switching on when a front arrives, each phase follows an
//! envelope around its arrival time `t_a` (with `τ = t − t_a`):
//!
//! ```text
//!   τ < −rise          0
//!   −rise ≤ τ < 0      target · smoothstep((τ + rise) / rise)
//!   τ ≥ 0              target − (2 / ln 10) · τ / T      (floored at 0)
//! ```
//!
//! The decay is an exponential amplitude decay with time constant `T`
//! expressed in intensity units (`I = 2 log10(A) + c`). `T` grows with
//! magnitude and hypocentral distance; P decays faster than S.
//!
//! The multi-source manager runs several independently timed sources and a
//! station reports the strongest contribution among them.

use crate::{
    aggregator::p_from_s,
    intensity::{calc_jma_intensity, clamp_intensity, site_term},
    snapshot::WaveCircle,
    station::Station,
    types::Seconds,
    wavefront::Source,
};
use serde::{Deserialize, Serialize};

/// Intensity lost per time constant of amplitude decay: 2 · log10(e).
const DECAY_PER_TIME_CONSTANT: f64 = 2.0 / std::f64::consts::LN_10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    /// Seconds of ramp before each arrival.
    pub rise_secs:         f64,
    /// Lower bound of the S time constant.
    pub min_duration_secs: f64,
    /// Extra time constant per km of hypocentral distance.
    pub distance_coeff:    f64,
    /// P time constant as a fraction of S.
    pub p_duration_ratio:  f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            rise_secs:         2.0,
            min_duration_secs: 4.0,
            distance_coeff:    0.05,
            p_duration_ratio:  0.5,
        }
    }
}

impl EnvelopeParams {
    /// S-phase time constant for a source of `magnitude` at `hypo_km`.
    pub fn s_duration(&self, magnitude: f64, hypo_km: f64) -> Seconds {
        let magnitude_term = 10f64.powf(0.5 * magnitude - 2.0);
        (magnitude_term + self.distance_coeff * hypo_km).max(self.min_duration_secs)
    }
}

/// Envelope value for one phase. `tau` is time since arrival.
pub fn phase_envelope(tau: Seconds, target: f64, rise: Seconds, duration: Seconds) -> f64 {
    if target <= 0.0 || duration <= 0.0 {
        return 0.0;
    }
    if tau >= 0.0 {
        return (target - DECAY_PER_TIME_CONSTANT * tau / duration).max(0.0);
    }
    if rise <= 0.0 || tau < -rise {
        return 0.0;
    }
    let u = (tau + rise) / rise;
    target * u * u * (3.0 - 2.0 * u)
}

/// Current envelope intensity at `station` and whether the S phase dominates.
pub fn envelope_single(source: &Source, station: &Station, params: &EnvelopeParams) -> (f64, bool) {
    let dist = source.epicentral_distance(station.lat, station.lon);
    let hypo = dist.hypot(source.depth);

    let s_target = calc_jma_intensity(source.magnitude, source.depth, dist, site_term(station.amp));
    let p_target = p_from_s(s_target).max(0.0);

    let s_duration = params.s_duration(source.magnitude, hypo);
    let p_duration = s_duration * params.p_duration_ratio;

    let t = source.elapsed();
    let p_env = phase_envelope(
        t - source.p_arrival_time(station.lat, station.lon),
        p_target,
        params.rise_secs,
        p_duration,
    );
    let s_env = phase_envelope(
        t - source.s_arrival_time(station.lat, station.lon),
        s_target,
        params.rise_secs,
        s_duration,
    );

    // The S ramp counts toward intensity, but S is only flagged once its
    // front has reached the station.
    let s_arrived = t >= source.s_arrival_time(station.lat, station.lon);
    if s_arrived && s_env > 0.0 && s_env >= p_env {
        (clamp_intensity(s_env), true)
    } else {
        (clamp_intensity(p_env.max(s_env)), false)
    }
}

// ── Multi-source manager ─────────────────────────────────────────────────────

pub const DEFAULT_RETIRE_RADIUS_KM: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedSource {
    pub id:       u32,
    pub source:   Source,
    /// Manager time at which this source's clock starts.
    pub start_at: Seconds,
    pub retired:  bool,
}

impl ManagedSource {
    pub fn is_active(&self, manager_elapsed: Seconds) -> bool {
        !self.retired && manager_elapsed >= self.start_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSourceManager {
    sources:          Vec<ManagedSource>,
    elapsed:          Seconds,
    retire_radius_km: f64,
    next_id:          u32,
}

impl Default for MultiSourceManager {
    fn default() -> Self {
        Self::new(DEFAULT_RETIRE_RADIUS_KM)
    }
}

impl MultiSourceManager {
    pub fn new(retire_radius_km: f64) -> Self {
        Self { sources: Vec::new(), elapsed: 0.0, retire_radius_km, next_id: 0 }
    }

    pub fn elapsed(&self) -> Seconds { self.elapsed }

    /// Start `source` now, with its own clock at 0.
    pub fn add(&mut self, source: Source) -> u32 {
        self.add_delayed(source, 0.0)
    }

    /// Start `source` `delay` seconds from now.
    pub fn add_delayed(&mut self, mut source: Source, delay: Seconds) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        source.set_elapsed(0.0);
        self.sources.push(ManagedSource {
            id,
            source,
            start_at: self.elapsed + delay.max(0.0),
            retired: false,
        });
        id
    }

    pub fn advance(&mut self, dt: Seconds) {
        if dt <= 0.0 {
            return;
        }
        let before = self.elapsed;
        let after = before + dt;
        for managed in self.sources.iter_mut().filter(|m| !m.retired) {
            // A pending source only runs for the part of `dt` after its start.
            if after > managed.start_at {
                managed.source.advance(after - before.max(managed.start_at));
            }
        }
        self.elapsed = after;
    }

    /// Retire every running source whose S front is past the retire radius
    /// and whose envelope has died out at all of `stations`.
    pub fn retire_settled(&mut self, stations: &[Station], params: &EnvelopeParams) {
        let now = self.elapsed;
        let radius = self.retire_radius_km;
        for managed in self.sources.iter_mut().filter(|m| m.is_active(now)) {
            if managed.source.s_radius() <= radius {
                continue;
            }
            let quiet = stations
                .iter()
                .all(|st| envelope_single(&managed.source, st, params).0 <= 0.0);
            if quiet {
                managed.retired = true;
                log::debug!("multi: source {} retired at t={now:.1}", managed.id);
            }
        }
    }

    pub fn sources(&self) -> &[ManagedSource] { &self.sources }

    pub fn active_sources(&self) -> impl Iterator<Item = &ManagedSource> {
        let now = self.elapsed;
        self.sources.iter().filter(move |m| m.is_active(now))
    }

    pub fn active_count(&self) -> usize { self.active_sources().count() }

    /// True once every source has started and retired.
    pub fn is_idle(&self) -> bool { self.sources.iter().all(|m| m.retired) }

    pub fn wave_circles(&self) -> Vec<WaveCircle> {
        self.active_sources()
            .map(|m| WaveCircle {
                epicenter: m.source.epicenter,
                p_radius:  m.source.p_radius(),
                s_radius:  m.source.s_radius(),
            })
            .collect()
    }
}

/// Strongest contribution over all active sources; the first source wins ties.
pub fn envelope_multi(
    manager: &MultiSourceManager,
    station: &Station,
    params:  &EnvelopeParams,
) -> (f64, bool) {
    manager
        .active_sources()
        .map(|m| envelope_single(&m.source, station, params))
        .fold((0.0, false), |best, cur| if cur.0 > best.0 { cur } else { best })
}
