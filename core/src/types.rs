//! Shared primitive types used across the entire simulation.

/// A simulation tick. One tick = one call to `SimEngine::tick`.
pub type Tick = u64;

/// Simulated seconds since a source (or session) started.
pub type Seconds = f64;

/// Stable station identifier. Doubles as the index into the station list,
/// so per-tick arrays can be dense and iterate in a fixed order.
pub type StationId = usize;

/// Session epoch. Incremented on every new placement; never reused.
pub type Epoch = u64;

/// Geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}
