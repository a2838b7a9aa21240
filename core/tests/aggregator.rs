//! Station pass tests.
//!
//! Tests cover: the instantaneous arrival model (nothing / P / S), noise
//! floor, region maxima and the tick maximum.

use quakesim_core::{
    aggregator::{aggregate, instantaneous_observation, p_from_s},
    intensity::calc_jma_intensity,
    snapshot::{Observation, Phase},
    station::{Station, StationNetwork},
    wavefront::Source,
};

const NOISE_FLOOR: f64 = 0.5;

fn source() -> Source {
    Source::new(35.7, 139.7, 10.0, 6.0)
}

/// 45 km east of the epicentre.
fn near() -> Station {
    Station::new(35.7, 140.2, "340", "Chiba", 1.0)
}

fn observe(src: &Source, st: &Station) -> Option<Observation> {
    instantaneous_observation(src, st, src.p_radius(), src.s_radius(), NOISE_FLOOR)
}

#[test]
fn p_estimate_from_s() {
    assert!((p_from_s(5.44) - 3.1267).abs() < 1e-3);
    assert!(p_from_s(0.3) < 0.0);
}

#[test]
fn station_sees_nothing_then_p_then_s() {
    let st = near();
    let mut src = source();
    let tp = src.p_arrival_time(st.lat, st.lon);
    let ts = src.s_arrival_time(st.lat, st.lon);
    let s_target = calc_jma_intensity(6.0, 10.0, src.epicentral_distance(st.lat, st.lon), 1.0);

    src.set_elapsed(tp - 0.1);
    assert!(observe(&src, &st).is_none(), "nothing before the P front");

    src.set_elapsed(tp + 0.1);
    let obs = observe(&src, &st).expect("P phase between the fronts");
    assert_eq!(obs.phase, Phase::P);
    assert!((obs.intensity - p_from_s(s_target)).abs() < 1e-9);

    src.set_elapsed(ts + 0.1);
    let obs = observe(&src, &st).expect("S phase after the S front");
    assert!(obs.is_s_phase());
    assert!((obs.intensity - s_target).abs() < 1e-9);
}

#[test]
fn weak_shaking_is_below_noise_floor() {
    // 500 km out: zero intensity even after S has passed.
    let far = Station::new(35.7, 139.7 + 500.0 / 90.0, "999", "Far", 1.0);
    let mut src = source();
    src.set_elapsed(src.s_arrival_time(far.lat, far.lon) + 1.0);
    assert!(observe(&src, &far).is_none());
}

#[test]
fn aggregate_reduces_regions_and_tick_max() {
    let net = StationNetwork::new(vec![
        Station::new(35.7, 139.7, "350", "Tokyo", 1.0),
        Station::new(35.7, 139.8, "350", "Tokyo", 1.0),
        Station::new(35.7, 140.2, "340", "Chiba", 1.0),
        Station::new(35.7, 145.0, "999", "Far", 1.0),
    ]);
    let mut src = source();
    src.set_elapsed(60.0);

    let agg = aggregate(net.stations(), |st| observe(&src, st));

    assert_eq!(agg.observations.len(), 4, "one slot per station");
    assert!(agg.observations[3].is_none());

    let tokyo = agg.region_max["350"];
    let expected = agg.observations[0].unwrap().intensity.max(agg.observations[1].unwrap().intensity);
    assert_eq!(tokyo, expected, "region max is the max over its stations");
    assert!(!agg.region_max.contains_key("999"), "unfelt regions are absent");

    assert_eq!(agg.tick_max, tokyo);
    assert_eq!(agg.tick_max_location, "Tokyo");
}

#[test]
fn empty_network_aggregates_to_nothing() {
    let src = source();
    let agg = aggregate(&[], |st| observe(&src, st));
    assert!(agg.observations.is_empty());
    assert!(agg.region_max.is_empty());
    assert_eq!(agg.tick_max, 0.0);
}
