//! Aftershock swarm generator.
//!
//! Given a mainshock placement and a seed, produce follow-up placements for
//! multi-source mode. Same seed and mainshock, same swarm.

use crate::{
    placement::{PlacementDraft, MAX_DEPTH_KM, MIN_DEPTH_KM, MIN_MAGNITUDE},
    rng::{RngBank, StreamSlot},
    types::Seconds,
};
use serde::{Deserialize, Serialize};

/// Båth's law: the largest aftershock is about 1.2 units below the mainshock.
pub const BATH_GAP: f64 = 1.2;

const KM_PER_DEG_LAT: f64 = 111.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmParams {
    pub count:          usize,
    /// Maximum epicentre offset from the mainshock.
    pub radius_km:      f64,
    /// Start delays are spread over this many seconds.
    pub window_secs:    Seconds,
    /// Mean of the exponential magnitude deficit below `M − 1.2`.
    pub magnitude_mean: f64,
    pub depth_jitter_km: f64,
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            count:           5,
            radius_km:       30.0,
            window_secs:     60.0,
            magnitude_mean:  0.4,
            depth_jitter_km: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aftershock {
    pub placement: PlacementDraft,
    /// Seconds after the mainshock.
    pub delay:     Seconds,
}

/// Generate the swarm, ordered by delay.
pub fn aftershock_swarm(mainshock: &PlacementDraft, params: &SwarmParams, seed: u64) -> Vec<Aftershock> {
    let bank = RngBank::new(seed);
    let mut position  = bank.stream(StreamSlot::Position);
    let mut magnitude = bank.stream(StreamSlot::Magnitude);
    let mut depth     = bank.stream(StreamSlot::Depth);
    let mut timing    = bank.stream(StreamSlot::Timing);

    let km_per_deg_lon = KM_PER_DEG_LAT * mainshock.lat.to_radians().cos().max(0.01);

    let mut swarm: Vec<Aftershock> = (0..params.count)
        .map(|_| {
            // sqrt keeps points uniform over the disc
            let r = params.radius_km * position.next_f64().sqrt();
            let theta = position.uniform(0.0, std::f64::consts::TAU);
            let lat = mainshock.lat + r * theta.sin() / KM_PER_DEG_LAT;
            let lon = mainshock.lon + r * theta.cos() / km_per_deg_lon;

            let m = (mainshock.magnitude - BATH_GAP - magnitude.exponential(params.magnitude_mean))
                .max(MIN_MAGNITUDE);
            let m = (m * 10.0).round() / 10.0;

            let d = (mainshock.depth + depth.uniform(-params.depth_jitter_km, params.depth_jitter_km))
                .clamp(MIN_DEPTH_KM, MAX_DEPTH_KM);

            Aftershock {
                placement: PlacementDraft::new(lat, lon, d, m),
                delay: timing.uniform(0.0, params.window_secs.max(0.0)),
            }
        })
        .collect();

    swarm.sort_by(|a, b| a.delay.total_cmp(&b.delay));
    log::debug!(
        "swarm seed={seed}: {} aftershocks around ({:.2}, {:.2})",
        swarm.len(),
        mainshock.lat,
        mainshock.lon
    );
    swarm
}
