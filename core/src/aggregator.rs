//! Station/region aggregation: one pass over every station per tick.
//!
//! The pass is generic over how a station's observation is produced, so the
//! instantaneous arrival model and the envelope models share the reduction
//! (region maxima, tick maximum) without sharing anything else.

use crate::{
    intensity::{calc_jma_intensity, site_term},
    snapshot::{Observation, Phase},
    station::Station,
    wavefront::Source,
};
use std::collections::BTreeMap;

/// P-phase estimate from the eventual S-phase intensity.
pub fn p_from_s(s_intensity: f64) -> f64 {
    s_intensity / 1.5 - 0.5
}

/// Arrived-or-not model: the full S intensity once the S front has passed
/// the station, a reduced P estimate between the fronts, nothing before.
/// Values under `noise_floor` are not reported.
pub fn instantaneous_observation(
    source:      &Source,
    station:     &Station,
    p_radius:    f64,
    s_radius:    f64,
    noise_floor: f64,
) -> Option<Observation> {
    let dist = source.epicentral_distance(station.lat, station.lon);
    let s_intensity = calc_jma_intensity(source.magnitude, source.depth, dist, site_term(station.amp));
    let p_intensity = p_from_s(s_intensity);

    if dist <= s_radius && s_intensity >= noise_floor {
        Some(Observation::new(s_intensity, Phase::S))
    } else if dist <= p_radius && p_intensity >= noise_floor {
        Some(Observation::new(p_intensity, Phase::P))
    } else {
        None
    }
}

/// Result of one station pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickAggregate {
    /// Indexed by station id.
    pub observations:      Vec<Option<Observation>>,
    pub region_max:        BTreeMap<String, f64>,
    pub tick_max:          f64,
    pub tick_max_location: String,
}

/// Run `observe` for every station in id order and reduce.
pub fn aggregate<F>(stations: &[Station], mut observe: F) -> TickAggregate
where
    F: FnMut(&Station) -> Option<Observation>,
{
    let mut agg = TickAggregate {
        observations: Vec::with_capacity(stations.len()),
        ..TickAggregate::default()
    };

    for station in stations {
        let obs = observe(station);
        if let Some(o) = &obs {
            let entry = agg.region_max.entry(station.region_code().to_string()).or_insert(o.intensity);
            if o.intensity > *entry {
                *entry = o.intensity;
            }
            if o.intensity > agg.tick_max {
                agg.tick_max = o.intensity;
                agg.tick_max_location = station.region_name().to_string();
            }
        }
        agg.observations.push(obs);
    }
    agg
}
