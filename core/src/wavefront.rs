//! Wavefront model: one earthquake source and its P/S fronts.
//!
//! Radii are epicentral (surface) distances. A front has radius 0 until the
//! distance it has travelled exceeds the depth, i.e. until it breaks the
//! surface above the hypocentre. The arrival-time functions are the exact
//! algebraic inverses of the radius functions.

use crate::{
    projection::Projection,
    types::{GeoPoint, Seconds},
};
use serde::{Deserialize, Serialize};

/// km/s
pub const P_WAVE_SPEED: f64 = 6.5;
/// km/s
pub const S_WAVE_SPEED: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub epicenter: GeoPoint,
    /// km, ≥ 0
    pub depth:     f64,
    pub magnitude: f64,
    /// Seconds since origin. Never decreases while the source is live.
    elapsed:       Seconds,
    projection:    Projection,
}

impl Source {
    pub fn new(lat: f64, lon: f64, depth: f64, magnitude: f64) -> Self {
        Self::with_projection(lat, lon, depth, magnitude, Projection::default())
    }

    pub fn with_projection(
        lat: f64,
        lon: f64,
        depth: f64,
        magnitude: f64,
        projection: Projection,
    ) -> Self {
        Self {
            epicenter: GeoPoint::new(lat, lon),
            depth: depth.max(0.0),
            magnitude,
            elapsed: 0.0,
            projection,
        }
    }

    pub fn elapsed(&self) -> Seconds { self.elapsed }

    pub fn projection(&self) -> &Projection { &self.projection }

    /// Advance by `dt` seconds. Negative steps are ignored.
    pub fn advance(&mut self, dt: Seconds) {
        if dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Jump to an absolute time. Used by tooling and tests; clamps at 0.
    pub fn set_elapsed(&mut self, t: Seconds) {
        self.elapsed = t.max(0.0);
    }

    // ── Radii ────────────────────────────────────────────────

    pub fn p_radius(&self) -> f64 { self.p_radius_at(self.elapsed) }

    pub fn s_radius(&self) -> f64 { self.s_radius_at(self.elapsed) }

    pub fn p_radius_at(&self, t: Seconds) -> f64 {
        surface_radius(P_WAVE_SPEED * t + self.depth, self.depth)
    }

    /// The S phase is timed as if it left the hypocentre `depth / v_p` early,
    /// which is what makes it lag P by the right amount at the surface.
    pub fn s_radius_at(&self, t: Seconds) -> f64 {
        surface_radius(S_WAVE_SPEED * t + self.s_depth_offset(), self.depth)
    }

    fn s_depth_offset(&self) -> f64 {
        self.depth * S_WAVE_SPEED / P_WAVE_SPEED
    }

    // ── Distances ────────────────────────────────────────────

    pub fn epicentral_distance(&self, lat: f64, lon: f64) -> f64 {
        self.projection.distance_km(self.epicenter, GeoPoint::new(lat, lon))
    }

    pub fn hypocentral_distance(&self, lat: f64, lon: f64) -> f64 {
        self.epicentral_distance(lat, lon).hypot(self.depth)
    }

    // ── Arrival times ────────────────────────────────────────

    pub fn p_arrival_time(&self, lat: f64, lon: f64) -> Seconds {
        (self.hypocentral_distance(lat, lon) - self.depth) / P_WAVE_SPEED
    }

    pub fn s_arrival_time(&self, lat: f64, lon: f64) -> Seconds {
        (self.hypocentral_distance(lat, lon) - self.s_depth_offset()) / S_WAVE_SPEED
    }

    /// Time at which the S front breaks the surface above the hypocentre.
    pub fn s_surface_time(&self) -> Seconds {
        self.depth * (1.0 - S_WAVE_SPEED / P_WAVE_SPEED) / S_WAVE_SPEED
    }

    /// Fraction of the wait until the S front surfaces, for the "preparing"
    /// ring drawn around the epicentre. `None` outside `(0, s_surface_time)`.
    pub fn s_preparation_progress(&self) -> Option<f64> {
        let surface = self.s_surface_time();
        if self.elapsed > 0.0 && self.elapsed < surface {
            Some((self.elapsed / surface).min(1.0))
        } else {
            None
        }
    }
}

fn surface_radius(total_dist: f64, depth: f64) -> f64 {
    if total_dist <= depth {
        return 0.0;
    }
    (total_dist * total_dist - depth * depth).max(0.0).sqrt()
}
