//! Geographic ↔ planar-kilometre projection.
//!
//! Longitude maps linearly to x; latitude goes through the Mercator term
//! `0.5 * ln((1 + sin φ) / (1 - sin φ))`. With `y_scale = x_km_per_deg * 180 / π`
//! the mapping is conformal, so Euclidean distance in the plane is the
//! distance the wave and intensity formulas use and wavefronts stay circles.
//!
//! The `Viewport` maps that plane onto a pixel window with a single uniform
//! scale (same px/km on both axes).

use crate::types::GeoPoint;
use serde::{Deserialize, Serialize};

/// `sin φ` is kept inside this band so `1 ± sin φ` never reaches zero.
const SIN_LAT_LIMIT: f64 = 0.999_999_999_999;

/// Spans below this (km) are treated as degenerate.
const MIN_SPAN_KM: f64 = 1e-6;

pub const DEFAULT_REF_LAT: f64 = 36.0;
pub const DEFAULT_REF_LON: f64 = 138.0;
pub const DEFAULT_X_KM_PER_DEG: f64 = 90.0;

fn mercator_lat_term(lat_deg: f64) -> f64 {
    let sin_phi = lat_deg
        .to_radians()
        .sin()
        .clamp(-SIN_LAT_LIMIT, SIN_LAT_LIMIT);
    0.5 * ((1.0 + sin_phi) / (1.0 - sin_phi)).ln()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub ref_lat:      f64,
    pub ref_lon:      f64,
    pub x_km_per_deg: f64,
    pub y_scale:      f64,
    ref_term:         f64,
}

impl Projection {
    pub fn new(ref_lat: f64, ref_lon: f64, x_km_per_deg: f64) -> Self {
        Self {
            ref_lat,
            ref_lon,
            x_km_per_deg,
            y_scale: x_km_per_deg * 180.0 / std::f64::consts::PI,
            ref_term: mercator_lat_term(ref_lat),
        }
    }

    /// Degrees → plane (km).
    pub fn to_plane(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x_km = (lon - self.ref_lon) * self.x_km_per_deg;
        let y_km = (mercator_lat_term(lat) - self.ref_term) * self.y_scale;
        (x_km, y_km)
    }

    /// Plane (km) → degrees. Exact inverse of `to_plane` away from the poles.
    pub fn to_geo(&self, x_km: f64, y_km: f64) -> (f64, f64) {
        let lon = x_km / self.x_km_per_deg + self.ref_lon;
        // merc = atanh(sin φ)  ⇒  φ = asin(tanh(merc))
        let merc = y_km / self.y_scale + self.ref_term;
        let sin_phi = merc.tanh().clamp(-1.0, 1.0);
        (sin_phi.asin().to_degrees(), lon)
    }

    pub fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let (x0, y0) = self.to_plane(a.lat, a.lon);
        let (x1, y1) = self.to_plane(b.lat, b.lon);
        (x1 - x0).hypot(y1 - y0)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(DEFAULT_REF_LAT, DEFAULT_REF_LON, DEFAULT_X_KM_PER_DEG)
    }
}

// ── Viewport ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self { min_lat: 24.0, max_lat: 46.0, min_lon: 122.0, max_lon: 154.0 }
    }
}

impl MapBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Km-plane extent of the current view and its pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    pub x_min_km:      f64,
    pub x_max_km:      f64,
    pub y_min_km:      f64,
    pub y_max_km:      f64,
    pub pixels_per_km: f64,
    pub x_offset_px:   f64,
    pub y_offset_px:   f64,
}

impl ViewParams {
    fn x_span(&self) -> f64 { (self.x_max_km - self.x_min_km).max(MIN_SPAN_KM) }
    fn y_span(&self) -> f64 { (self.y_max_km - self.y_min_km).max(MIN_SPAN_KM) }
}

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct Viewport {
    pub projection: Projection,
    pub bounds:     MapBounds,
    pub width_px:   f64,
    pub height_px:  f64,
    pub zoom_level: f64,
}

impl Viewport {
    pub fn new(projection: Projection, bounds: MapBounds, width_px: f64, height_px: f64) -> Self {
        Self { projection, bounds, width_px, height_px, zoom_level: MIN_ZOOM }
    }

    pub fn params(&self) -> ViewParams {
        let p = &self.projection;
        let (x_min_km, _) = p.to_plane(0.0, self.bounds.min_lon);
        let (x_max_km, _) = p.to_plane(0.0, self.bounds.max_lon);
        let (_, y_min_km) = p.to_plane(self.bounds.min_lat, 0.0);
        let (_, y_max_km) = p.to_plane(self.bounds.max_lat, 0.0);

        let x_span = (x_max_km - x_min_km).max(MIN_SPAN_KM);
        let y_span = (y_max_km - y_min_km).max(MIN_SPAN_KM);
        let pixels_per_km = (self.width_px / x_span).min(self.height_px / y_span);

        // Uniform scale leaves a margin on one axis; centre the map in it.
        ViewParams {
            x_min_km,
            x_max_km,
            y_min_km,
            y_max_km,
            pixels_per_km,
            x_offset_px: (self.width_px - x_span * pixels_per_km) / 2.0,
            y_offset_px: (self.height_px - y_span * pixels_per_km) / 2.0,
        }
    }

    pub fn geo_to_screen(&self, lat: f64, lon: f64) -> (f64, f64) {
        let v = self.params();
        let (x_km, y_km) = self.projection.to_plane(lat, lon);
        (
            v.x_offset_px + (x_km - v.x_min_km) * v.pixels_per_km,
            v.y_offset_px + (v.y_max_km - y_km) * v.pixels_per_km,
        )
    }

    pub fn screen_to_geo(&self, x_px: f64, y_px: f64) -> (f64, f64) {
        let v = self.params();
        let x_km = v.x_min_km + (x_px - v.x_offset_px) / v.pixels_per_km;
        let y_km = v.y_max_km - (y_px - v.y_offset_px) / v.pixels_per_km;
        self.projection.to_geo(x_km, y_km)
    }

    pub fn km_to_px(&self, km: f64) -> f64 {
        km * self.params().pixels_per_km
    }

    /// Zoom by `factor` keeping the km point under `anchor_px` fixed.
    /// Returns `false` (and changes nothing) when the new zoom level would
    /// leave [`MIN_ZOOM`, `MAX_ZOOM`].
    pub fn zoom_at(&mut self, anchor_px: (f64, f64), factor: f64) -> bool {
        let new_zoom = self.zoom_level * factor;
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&new_zoom) || factor <= 0.0 {
            return false;
        }

        let v = self.params();
        let (x_span, y_span) = (v.x_span(), v.y_span());
        let map_w_px = x_span * v.pixels_per_km;
        let map_h_px = y_span * v.pixels_per_km;
        if map_w_px <= MIN_SPAN_KM || map_h_px <= MIN_SPAN_KM {
            return false;
        }

        let rx = ((anchor_px.0 - v.x_offset_px) / map_w_px).clamp(0.0, 1.0);
        let ry = ((anchor_px.1 - v.y_offset_px) / map_h_px).clamp(0.0, 1.0);
        let anchor_x_km = v.x_min_km + rx * x_span;
        let anchor_y_km = v.y_max_km - ry * y_span;

        let new_x_span = x_span / factor;
        let new_y_span = y_span / factor;
        let new_x_min = anchor_x_km - rx * new_x_span;
        let new_y_max = anchor_y_km + ry * new_y_span;

        let (min_lat, _) = self.projection.to_geo(0.0, new_y_max - new_y_span);
        let (max_lat, _) = self.projection.to_geo(0.0, new_y_max);
        let (_, min_lon) = self.projection.to_geo(new_x_min, 0.0);
        let (_, max_lon) = self.projection.to_geo(new_x_min + new_x_span, 0.0);

        self.bounds = MapBounds { min_lat, max_lat, min_lon, max_lon };
        self.zoom_level = new_zoom;
        true
    }
}
