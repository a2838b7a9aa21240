use crate::{
    envelope::{EnvelopeParams, DEFAULT_RETIRE_RADIUS_KM},
    geocoder::DEFAULT_FALLBACK_NAME,
    projection::{
        MapBounds, Projection, DEFAULT_REF_LAT, DEFAULT_REF_LON, DEFAULT_X_KM_PER_DEG,
    },
    trigger::AlertPolicy,
};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "sim_config.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub ref_lat:      f64,
    pub ref_lon:      f64,
    pub x_km_per_deg: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            ref_lat:      DEFAULT_REF_LAT,
            ref_lon:      DEFAULT_REF_LON,
            x_km_per_deg: DEFAULT_X_KM_PER_DEG,
        }
    }
}

impl ProjectionConfig {
    pub fn build(&self) -> Projection {
        Projection::new(self.ref_lat, self.ref_lon, self.x_km_per_deg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub bounds:    MapBounds,
    pub width_px:  f64,
    pub height_px: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { bounds: MapBounds::default(), width_px: 1200.0, height_px: 800.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerThresholds {
    /// Observations below this are not reported.
    pub noise_floor:      f64,
    pub sound_intensity4: f64,
    pub sound_intensity7: f64,
    pub alert:            f64,
}

impl Default for TriggerThresholds {
    fn default() -> Self {
        Self {
            noise_floor:      0.5,
            sound_intensity4: 3.5,
            sound_intensity7: 6.5,
            alert:            3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub min_time_scale: f64,
    pub max_time_scale: f64,
    /// Multiplier applied by one speed-up / slow-down step.
    pub scale_step:     f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { min_time_scale: 0.1, max_time_scale: 10.0, scale_step: 1.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub stations:   String,
    pub regions:    String,
    pub epicenters: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            stations:   "stations.json".into(),
            regions:    "regions.geojson".into(),
            epicenters: "epicenters.geojson".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub projection:           ProjectionConfig,
    pub viewport:             ViewportConfig,
    pub thresholds:           TriggerThresholds,
    pub clock:                ClockConfig,
    pub envelope:             EnvelopeParams,
    /// Seconds an alert ring stays on screen.
    pub alert_display_secs:   f64,
    /// Multi-source mode: a source retires once its S front passes this radius.
    pub retire_radius_km:     f64,
    /// Overrides the model's default alert policy.
    pub alert_policy:         Option<AlertPolicy>,
    /// Regions below this maximum get no label.
    pub region_label_min:     f64,
    pub unknown_location:     String,
    pub files:                DataFiles,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            projection:         ProjectionConfig::default(),
            viewport:           ViewportConfig::default(),
            thresholds:         TriggerThresholds::default(),
            clock:              ClockConfig::default(),
            envelope:           EnvelopeParams::default(),
            alert_display_secs: 0.8,
            retire_radius_km:   DEFAULT_RETIRE_RADIUS_KM,
            alert_policy:       None,
            region_label_min:   1.0,
            unknown_location:   DEFAULT_FALLBACK_NAME.into(),
            files:              DataFiles::default(),
        }
    }
}

impl SimConfig {
    /// Load `{data_dir}/sim_config.json`. A missing file means defaults;
    /// a present but malformed file is an error.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/{CONFIG_FILE}");
        if !std::path::Path::new(&path).exists() {
            log::info!("{path} not found, using default config");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    pub fn data_path(&self, data_dir: &str, file: &str) -> String {
        format!("{data_dir}/{file}")
    }
}
