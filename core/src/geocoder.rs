//! Epicentre naming: which named region contains a point.
//!
//! First region (in load order) whose polygon contains the point wins.

use crate::geometry::{self, Feature, Shape};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK_NAME: &str = "Unknown area";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    /// The source data's own `name` (Japanese for JMA data).
    #[default]
    Native,
    Zh,
    En,
}

#[derive(Debug, Clone)]
pub struct NamedRegion {
    pub id:      String,
    pub name:    String,
    pub name_zh: String,
    pub name_en: String,
    pub shape:   Shape,
}

impl NamedRegion {
    pub fn name_in(&self, lang: Lang) -> &str {
        let localized = match lang {
            Lang::Native => &self.name,
            Lang::Zh => &self.name_zh,
            Lang::En => &self.name_en,
        };
        if localized.is_empty() { &self.name } else { localized }
    }

    fn from_feature(feature: Feature) -> Self {
        let name = feature.prop_str("name").unwrap_or_default();
        Self {
            id:      feature.prop_str("id").unwrap_or_default(),
            name_zh: feature.prop_str("name_zh-cn").unwrap_or_else(|| name.clone()),
            name_en: feature.prop_str("name_en").unwrap_or_default(),
            name,
            shape:   feature.shape,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpicenterLocator {
    regions:  Vec<NamedRegion>,
    fallback: String,
}

impl Default for EpicenterLocator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EpicenterLocator {
    pub fn new(regions: Vec<NamedRegion>) -> Self {
        Self { regions, fallback: DEFAULT_FALLBACK_NAME.to_string() }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn from_features(features: Vec<Feature>) -> Self {
        Self::new(features.into_iter().map(NamedRegion::from_feature).collect())
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let locator = Self::from_features(geometry::load_features(path)?);
        log::info!("loaded {} epicenter regions from {path}", locator.regions.len());
        Ok(locator)
    }

    pub fn len(&self) -> usize { self.regions.len() }

    pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    pub fn locate(&self, lon: f64, lat: f64) -> Option<&NamedRegion> {
        self.regions.iter().find(|r| r.shape.contains(lon, lat))
    }

    /// Region name for the point, or the fallback label.
    pub fn location_name(&self, lon: f64, lat: f64, lang: Lang) -> &str {
        self.locate(lon, lat)
            .map_or(self.fallback.as_str(), |r| r.name_in(lang))
    }
}
