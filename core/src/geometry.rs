//! Polygon rings and GeoJSON feature loading.
//!
//! Only the outer ring of each polygon is kept; holes are ignored, which is
//! all the region layers need. Coordinates are GeoJSON order: `[lon, lat]`.

use crate::types::GeoPoint;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One closed ring, `[lon, lat]` pairs.
pub type Ring = Vec<[f64; 2]>;

/// Horizontal-ray crossing test.
pub fn point_in_ring(lon: f64, lat: f64, ring: &[[f64; 2]]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        // The straddle check guarantees yi != yj before dividing.
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// A Polygon or MultiPolygon reduced to its outer rings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub rings: Vec<Ring>,
}

impl Shape {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.rings.iter().any(|ring| point_in_ring(lon, lat, ring))
    }

    /// Mean of all ring vertices. Used as a label anchor, not a true centroid.
    pub fn vertex_centroid(&self) -> Option<GeoPoint> {
        let (mut sum_lat, mut sum_lon, mut n) = (0.0, 0.0, 0usize);
        for [lon, lat] in self.rings.iter().flatten() {
            sum_lat += lat;
            sum_lon += lon;
            n += 1;
        }
        (n > 0).then(|| GeoPoint::new(sum_lat / n as f64, sum_lon / n as f64))
    }
}

/// A feature with a usable shape and its raw properties.
#[derive(Debug, Clone)]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub shape:      Shape,
}

impl Feature {
    /// String property, also accepting numeric codes.
    pub fn prop_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<Value>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry:   RawGeometry,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter_map(|p| match p.as_slice() {
            [lon, lat, ..] => Some([*lon, *lat]),
            _ => None,
        })
        .collect()
}

impl RawGeometry {
    fn into_shape(self) -> Shape {
        let rings = match self {
            Self::Polygon { coordinates } => {
                coordinates.first().map(|outer| to_ring(outer)).into_iter().collect()
            }
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|poly| poly.first().map(|outer| to_ring(outer)))
                .collect(),
        };
        Shape::new(rings)
    }
}

/// Parse a FeatureCollection. Features that are not (Multi)Polygons or are
/// otherwise malformed are skipped with a warning.
pub fn parse_features(json: &str) -> anyhow::Result<Vec<Feature>> {
    let collection: RawCollection = serde_json::from_str(json)?;
    let mut out = Vec::with_capacity(collection.features.len());

    for (idx, value) in collection.features.into_iter().enumerate() {
        match serde_json::from_value::<RawFeature>(value) {
            Ok(raw) => {
                let shape = raw.geometry.into_shape();
                if shape.rings.iter().all(|r| r.len() < 3) {
                    log::warn!("feature #{idx}: no ring with 3+ vertices, skipped");
                    continue;
                }
                out.push(Feature { properties: raw.properties.unwrap_or_default(), shape });
            }
            Err(e) => log::warn!("feature #{idx} skipped: {e}"),
        }
    }
    Ok(out)
}

pub fn load_features(path: &str) -> anyhow::Result<Vec<Feature>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    parse_features(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Ring {
        vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]
    }

    #[test]
    fn ray_crossing_inside_and_outside() {
        assert!(point_in_ring(1.0, 1.0, &square()));
        assert!(!point_in_ring(3.0, 1.0, &square()));
        assert!(!point_in_ring(1.0, -0.5, &square()));
    }

    #[test]
    fn degenerate_ring_contains_nothing() {
        assert!(!point_in_ring(0.0, 0.0, &[[0.0, 0.0], [1.0, 1.0]]));
    }

    #[test]
    fn unsupported_geometry_is_skipped() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"code":"1"},"geometry":{"type":"Point","coordinates":[1,2]}},
            {"type":"Feature","properties":{"code":"2"},"geometry":{"type":"Polygon",
             "coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}
        ]}"#;
        let features = parse_features(json).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].prop_str("code").as_deref(), Some("2"));
    }
}
