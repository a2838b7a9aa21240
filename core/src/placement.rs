//! Epicentre placement draft: edited in setting mode, committed into a
//! `Source` when the user starts the event.

use crate::{
    error::{SimError, SimResult},
    projection::Projection,
    wavefront::Source,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LAT: f64 = 35.7;
pub const DEFAULT_LON: f64 = 139.7;
pub const DEFAULT_DEPTH_KM: f64 = 10.0;
pub const DEFAULT_MAGNITUDE: f64 = 6.0;

pub const MIN_DEPTH_KM: f64 = 0.0;
pub const MAX_DEPTH_KM: f64 = 700.0;
pub const DEPTH_STEP_KM: f64 = 10.0;

pub const MIN_MAGNITUDE: f64 = 1.0;
pub const MAX_MAGNITUDE: f64 = 9.5;
pub const MAGNITUDE_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementDraft {
    pub lat:       f64,
    pub lon:       f64,
    pub depth:     f64,
    pub magnitude: f64,
}

impl Default for PlacementDraft {
    fn default() -> Self {
        Self {
            lat:       DEFAULT_LAT,
            lon:       DEFAULT_LON,
            depth:     DEFAULT_DEPTH_KM,
            magnitude: DEFAULT_MAGNITUDE,
        }
    }
}

impl PlacementDraft {
    pub fn new(lat: f64, lon: f64, depth: f64, magnitude: f64) -> Self {
        Self { lat, lon, depth, magnitude }
    }

    pub fn move_to(&mut self, lat: f64, lon: f64) {
        self.lat = lat;
        self.lon = lon;
    }

    /// Step depth by `steps` × 10 km, kept in [0, 700].
    pub fn nudge_depth(&mut self, steps: i32) {
        self.depth = (self.depth + f64::from(steps) * DEPTH_STEP_KM).clamp(MIN_DEPTH_KM, MAX_DEPTH_KM);
    }

    /// Step magnitude by `steps` × 0.1, kept in [1.0, 9.5]. Rounded to one
    /// decimal so repeated steps do not drift.
    pub fn nudge_magnitude(&mut self, steps: i32) {
        let m = (self.magnitude + f64::from(steps) * MAGNITUDE_STEP).clamp(MIN_MAGNITUDE, MAX_MAGNITUDE);
        self.magnitude = (m * 10.0).round() / 10.0;
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(SimError::InvalidPlacement { field: "lat", value: self.lat });
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(SimError::InvalidPlacement { field: "lon", value: self.lon });
        }
        if !(MIN_DEPTH_KM..=MAX_DEPTH_KM).contains(&self.depth) {
            return Err(SimError::InvalidPlacement { field: "depth", value: self.depth });
        }
        if !self.magnitude.is_finite() {
            return Err(SimError::InvalidPlacement { field: "magnitude", value: self.magnitude });
        }
        Ok(())
    }

    pub fn commit(&self, projection: Projection) -> SimResult<Source> {
        self.validate()?;
        Ok(Source::with_projection(self.lat, self.lon, self.depth, self.magnitude, projection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nudges_stay_in_range() {
        let mut d = PlacementDraft::default();
        d.nudge_depth(-5);
        assert_eq!(d.depth, 0.0);
        d.nudge_depth(100);
        assert_eq!(d.depth, 700.0);

        d.nudge_magnitude(100);
        assert_eq!(d.magnitude, 9.5);
        d.nudge_magnitude(-200);
        assert_eq!(d.magnitude, 1.0);
    }

    #[test]
    fn magnitude_steps_do_not_drift() {
        let mut d = PlacementDraft::default();
        for _ in 0..7 {
            d.nudge_magnitude(1);
        }
        assert_eq!(d.magnitude, 6.7);
    }

    #[test]
    fn out_of_range_placement_is_rejected() {
        let d = PlacementDraft::new(f64::NAN, 139.0, 10.0, 6.0);
        assert!(matches!(d.validate(), Err(SimError::InvalidPlacement { field: "lat", .. })));
        let d = PlacementDraft::new(35.0, 139.0, 800.0, 6.0);
        assert!(d.commit(Projection::default()).is_err());
    }
}
