//! Station list and region polygons: loaded once, read-only afterwards.
//!
//! Station ids are dense indices assigned in load order, so every per-tick
//! structure can be a plain `Vec` indexed by `StationId`.

use crate::{
    geometry::{self, Shape},
    intensity::ShindoScale,
    projection::MapBounds,
    types::{GeoPoint, StationId},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Two stations closer than this (degrees, per axis) are the same site.
pub const DEFAULT_MERGE_TOLERANCE_DEG: f64 = 0.01;

fn default_amp() -> f64 { 1.0 }

fn code_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid area code: {other}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(deserialize_with = "code_from_any")]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(default)]
    pub id:   StationId,
    pub lat:  f64,
    pub lon:  f64,
    pub area: Area,
    /// Site amplification factor, > 0.
    #[serde(default = "default_amp")]
    pub amp:  f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Station {
    pub fn new(lat: f64, lon: f64, region_code: &str, region_name: &str, amp: f64) -> Self {
        Self {
            id: 0,
            lat,
            lon,
            area: Area { code: region_code.to_string(), name: region_name.to_string() },
            amp,
            name: None,
        }
    }

    pub fn position(&self) -> GeoPoint { GeoPoint::new(self.lat, self.lon) }

    pub fn region_code(&self) -> &str { &self.area.code }

    pub fn region_name(&self) -> &str { &self.area.name }

    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
            && self.amp.is_finite()
            && self.amp > 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct StationNetwork {
    stations: Vec<Station>,
}

impl StationNetwork {
    /// Takes ownership and renumbers ids to match positions. Invalid entries
    /// (out-of-range coordinates, non-positive `amp`) are dropped.
    pub fn new(stations: Vec<Station>) -> Self {
        let mut net = Self { stations: Vec::with_capacity(stations.len()) };
        for station in stations {
            net.push(station);
        }
        net
    }

    fn push(&mut self, mut station: Station) -> bool {
        if !station.is_valid() {
            log::warn!(
                "station at ({}, {}) amp={} rejected",
                station.lat, station.lon, station.amp
            );
            return false;
        }
        station.id = self.stations.len();
        self.stations.push(station);
        true
    }

    pub fn parse(json: &str) -> anyhow::Result<Self> {
        let raw: Vec<Value> = serde_json::from_str(json)?;
        let mut net = Self { stations: Vec::with_capacity(raw.len()) };
        for (idx, value) in raw.into_iter().enumerate() {
            let file_id = value.get("id").and_then(Value::as_u64);
            let station = match serde_json::from_value::<Station>(value) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("station entry #{idx} skipped: {e}");
                    continue;
                }
            };
            let assigned = net.stations.len();
            // Ids always follow load order.
            if !net.push(station) {
                continue;
            }
            if let Some(id) = file_id.filter(|&id| id != assigned as u64) {
                log::warn!("station entry #{idx}: id {id} replaced by {assigned}");
            }
        }
        Ok(net)
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let net = Self::parse(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::info!("loaded {} stations from {path}", net.len());
        Ok(net)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.stations)
    }

    pub fn stations(&self) -> &[Station] { &self.stations }

    pub fn get(&self, id: StationId) -> Option<&Station> { self.stations.get(id) }

    pub fn len(&self) -> usize { self.stations.len() }

    pub fn is_empty(&self) -> bool { self.stations.is_empty() }

    /// Append candidates that are inside `bounds` and not within
    /// `tolerance_deg` of an existing station. Returns how many were added.
    pub fn merge_missing(
        &mut self,
        candidates: impl IntoIterator<Item = Station>,
        tolerance_deg: f64,
        bounds: &MapBounds,
    ) -> usize {
        let mut added = 0;
        for candidate in candidates {
            if !bounds.contains(candidate.lat, candidate.lon) {
                continue;
            }
            let exists = self.stations.iter().any(|s| {
                (s.lat - candidate.lat).abs() < tolerance_deg
                    && (s.lon - candidate.lon).abs() < tolerance_deg
            });
            if !exists && self.push(candidate) {
                added += 1;
            }
        }
        log::info!("merge: {added} stations added, {} total", self.stations.len());
        added
    }
}

// ── Regions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Region {
    pub code:  String,
    pub name:  String,
    pub shape: Shape,
}

/// Label position for a region whose maximum is at least shindo 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionLabel {
    pub code:      String,
    pub anchor:    GeoPoint,
    pub intensity: f64,
    pub scale:     ShindoScale,
}

#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let features = geometry::load_features(path)?;
        let regions: Vec<Region> = features
            .into_iter()
            .filter_map(|f| {
                let code = f.prop_str("code")?;
                Some(Region { name: f.prop_str("name").unwrap_or_default(), code, shape: f.shape })
            })
            .collect();
        log::info!("loaded {} regions from {path}", regions.len());
        Ok(Self::new(regions))
    }

    pub fn regions(&self) -> &[Region] { &self.regions }

    pub fn len(&self) -> usize { self.regions.len() }

    pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    pub fn labels(&self, maxima: &BTreeMap<String, f64>, min_intensity: f64) -> Vec<RegionLabel> {
        self.regions
            .iter()
            .filter_map(|region| {
                let intensity = *maxima.get(&region.code)?;
                if intensity < min_intensity {
                    return None;
                }
                Some(RegionLabel {
                    code: region.code.clone(),
                    anchor: region.shape.vertex_centroid()?,
                    intensity,
                    scale: ShindoScale::from_intensity(intensity),
                })
            })
            .collect()
    }
}
