//! Per-tick intensity snapshot: what rendering, audio and alert
//! animation read after every tick.
//!
//! Rebuilt from scratch every tick. Only `peak_*` carries session history,
//! copied from the session's `TriggerState`.

use crate::{
    intensity::{Rgb, ShindoScale},
    types::{Epoch, GeoPoint, Seconds, StationId, Tick},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    P,
    S,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub intensity: f64,
    pub phase:     Phase,
}

impl Observation {
    pub fn new(intensity: f64, phase: Phase) -> Self {
        Self { intensity, phase }
    }

    pub fn is_s_phase(&self) -> bool { self.phase == Phase::S }

    pub fn scale(&self) -> ShindoScale { ShindoScale::from_intensity(self.intensity) }
}

/// One source's fronts, in km on the projection plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveCircle {
    pub epicenter: GeoPoint,
    pub p_radius:  f64,
    pub s_radius:  f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensitySnapshot {
    pub epoch:             Epoch,
    pub tick:              Tick,
    pub elapsed:           Seconds,
    /// Indexed by `StationId`; `None` = nothing felt this tick.
    pub stations:          Vec<Option<Observation>>,
    /// Region code → maximum this tick.
    pub region_max:        BTreeMap<String, f64>,
    /// Maximum over all stations this tick.
    pub tick_max:          f64,
    pub tick_max_location: String,
    /// Session high-water mark.
    pub peak_intensity:    f64,
    pub peak_location:     String,
    pub wave_circles:      Vec<WaveCircle>,
    pub s_front_color:     Option<Rgb>,
}

impl IntensitySnapshot {
    pub fn observation(&self, id: StationId) -> Option<&Observation> {
        self.stations.get(id)?.as_ref()
    }

    /// `(id, observation)` for every station that felt something.
    pub fn felt(&self) -> impl Iterator<Item = (StationId, &Observation)> {
        self.stations
            .iter()
            .enumerate()
            .filter_map(|(id, obs)| obs.as_ref().map(|o| (id, o)))
    }

    pub fn felt_count(&self) -> usize {
        self.stations.iter().filter(|o| o.is_some()).count()
    }

    pub fn peak_scale(&self) -> ShindoScale {
        ShindoScale::from_intensity(self.peak_intensity)
    }
}
