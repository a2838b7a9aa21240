//! Intensity calculator and scale tests.
//!
//! Tests cover: concrete values, clamping, distance monotonicity,
//! scale bin boundaries, site term.

use quakesim_core::intensity::{
    calc_jma_intensity, clamp_intensity, intensity_from_pga, intensity_to_scale, s_front_color,
    site_term, ShindoScale,
};

fn close(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() < tol
}

#[test]
fn m6_depth10_at_epicentre_is_five_upper() {
    let i = calc_jma_intensity(6.0, 10.0, 0.0, 1.0);
    assert!(close(i, 5.4416, 1e-3), "expected ~5.44, got {i}");
    assert_eq!(intensity_to_scale(i), "5+");
}

#[test]
fn known_values_along_distance() {
    let cases = [
        (20.0, 4.796),
        (50.0, 3.979),
        (100.0, 3.114),
        (200.0, 1.999),
        (300.0, 1.153),
    ];
    for (dist, expected) in cases {
        let i = calc_jma_intensity(6.0, 10.0, dist, 1.0);
        assert!(close(i, expected, 0.01), "M6 at {dist} km: expected {expected}, got {i}");
    }
    assert_eq!(calc_jma_intensity(6.0, 10.0, 500.0, 1.0), 0.0);
}

#[test]
fn known_values_across_magnitude_and_depth() {
    assert!(close(calc_jma_intensity(5.0, 10.0, 0.0, 1.0), 4.387, 0.01));
    assert!(close(calc_jma_intensity(7.0, 10.0, 0.0, 1.0), 6.213, 0.01));
    assert!(close(calc_jma_intensity(7.0, 10.0, 100.0, 1.0), 4.337, 0.01));
    assert!(close(calc_jma_intensity(8.0, 700.0, 0.0, 1.0), 3.93, 0.01), "deep-source branch");
    assert_eq!(calc_jma_intensity(9.5, 0.0, 0.0, 1.0), 7.0, "must saturate at 7");
}

#[test]
fn site_amplification_raises_intensity() {
    let bai = site_term(1.5);
    assert!(close(bai, 1.65, 1e-12));
    let amplified = calc_jma_intensity(6.0, 10.0, 30.0, bai);
    let plain = calc_jma_intensity(6.0, 10.0, 30.0, 1.0);
    assert!(close(plain, 4.4667, 0.01));
    assert!(close(amplified, 4.8946, 0.01));
    assert_eq!(site_term(1.0), 1.0);
}

#[test]
fn output_always_in_range() {
    let magnitudes = [-1.0, 0.0, 0.5, 3.0, 6.0, 9.5, 12.0, f64::NAN];
    let depths = [0.0, 10.0, 154.0, 155.0, 700.0, 5000.0];
    let distances = [0.0, 1.0, 100.0, 1e6, f64::INFINITY];
    let bais = [0.0, 0.5, 1.0, 3.0];
    for &m in &magnitudes {
        for &d in &depths {
            for &r in &distances {
                for &b in &bais {
                    let i = calc_jma_intensity(m, d, r, b);
                    assert!(
                        (0.0..=7.0).contains(&i),
                        "out of range for M{m} depth {d} dist {r} bai {b}: {i}"
                    );
                }
            }
        }
    }
    assert_eq!(calc_jma_intensity(-1.0, 10.0, 0.0, 1.0), 0.0);
    assert_eq!(calc_jma_intensity(3.0, 10.0, 1e6, 1.0), 0.0);
}

#[test]
fn intensity_falls_with_distance() {
    // The two regression branches meet near 4 with a step of ~0.03.
    let mut last = f64::INFINITY;
    for step in 0..80 {
        let dist = step as f64 * 10.0;
        let i = calc_jma_intensity(6.5, 30.0, dist, 1.0);
        assert!(i <= last + 0.05, "intensity rose between {} and {dist} km", dist - 10.0);
        last = i;
    }
}

#[test]
fn scale_bin_boundaries() {
    assert_eq!(intensity_to_scale(0.49999), "0");
    assert_eq!(intensity_to_scale(0.5), "1");
    assert_eq!(intensity_to_scale(4.49999), "4");
    assert_eq!(intensity_to_scale(4.5), "5-");
    assert_eq!(intensity_to_scale(5.0), "5+");
    assert_eq!(intensity_to_scale(5.5), "6-");
    assert_eq!(intensity_to_scale(6.49999), "6+");
    assert_eq!(intensity_to_scale(6.5), "7");
    assert_eq!(intensity_to_scale(7.0), "7");
    assert_eq!(intensity_to_scale(-3.0), "0");
    assert_eq!(intensity_to_scale(f64::NAN), "0");
}

#[test]
fn scale_is_ordered_and_indexed() {
    for (idx, pair) in ShindoScale::ALL.windows(2).enumerate() {
        assert!(pair[0] < pair[1]);
        assert_eq!(pair[0].index(), idx);
    }
    assert_eq!(ShindoScale::Seven.index(), 9);
    assert_eq!(ShindoScale::FiveLower.to_string(), "5-");
    assert_eq!(serde_json::to_string(&ShindoScale::SixUpper).unwrap(), "\"6+\"");
}

#[test]
fn clamp_handles_nan_and_extremes() {
    assert_eq!(clamp_intensity(f64::NAN), 0.0);
    assert_eq!(clamp_intensity(-2.0), 0.0);
    assert_eq!(clamp_intensity(9.0), 7.0);
    assert_eq!(clamp_intensity(3.3), 3.3);
}

#[test]
fn pga_conversion() {
    assert!(close(intensity_from_pga(100.0), 4.94, 1e-12));
    assert_eq!(intensity_from_pga(0.0), 0.0);
    assert_eq!(intensity_from_pga(-5.0), 0.0);
}

#[test]
fn s_front_is_grey_until_felt() {
    assert_eq!(s_front_color(0.2), (128, 128, 128));
    assert_eq!(s_front_color(5.44), ShindoScale::FiveUpper.badge_color());
}
