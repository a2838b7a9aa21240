//! One-shot sound cues, alert watermark and the alert queue entries.
//!
//! All per-session trigger state lives in `TriggerState`. A new session gets
//! a fresh `TriggerState::default()`; nothing is ever cleared field by field.

use crate::{
    config::TriggerThresholds,
    intensity::ShindoScale,
    snapshot::Observation,
    station::Station,
    types::{Seconds, StationId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Global maximum reached shindo 4 territory (≥ 3.5).
    Intensity4,
    /// Global maximum reached shindo 7 territory (≥ 6.5).
    Intensity7,
}

/// How the visual alert picks its station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// First station in id order whose value crosses the threshold and beats
    /// the watermark. May fire again on later ticks as values climb.
    FirstRising,
    /// Fire exactly once per session, on the strongest station of that tick.
    PeakOnce,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub station_id:   StationId,
    pub lat:          f64,
    pub lon:          f64,
    pub triggered_at: Seconds,
    pub intensity:    f64,
    pub scale:        ShindoScale,
}

/// Expanding, fading ring for a live alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPulse {
    /// 0.0 at trigger, 1.0 at expiry.
    pub progress:  f64,
    pub radius_px: f64,
    pub alpha:     u8,
}

const PULSE_START_RADIUS_PX: f64 = 10.0;
const PULSE_GROWTH_PX: f64 = 50.0;

impl AlertEvent {
    pub fn is_expired(&self, now: Seconds, duration: Seconds) -> bool {
        now - self.triggered_at > duration
    }

    pub fn pulse(&self, now: Seconds, duration: Seconds) -> Option<AlertPulse> {
        let elapsed = now - self.triggered_at;
        if elapsed > duration || duration <= 0.0 {
            return None;
        }
        let progress = (elapsed / duration).clamp(0.0, 1.0);
        Some(AlertPulse {
            progress,
            radius_px: PULSE_START_RADIUS_PX + PULSE_GROWTH_PX * progress,
            alpha: (255.0 * (1.0 - progress)).round() as u8,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerState {
    pub intensity4_played: bool,
    pub intensity7_played: bool,
    pub alert_fired_once:  bool,
    /// Highest intensity an alert has fired for. Never decreases.
    pub alert_watermark:   f64,
    /// Session high-water mark of the global maximum.
    pub peak_intensity:    f64,
    /// Region name where `peak_intensity` was observed.
    pub peak_location:     String,
}

impl TriggerState {
    /// Raise the session peak. Returns `true` if it moved.
    pub fn record_peak(&mut self, intensity: f64, location: &str) -> bool {
        if intensity > self.peak_intensity {
            self.peak_intensity = intensity;
            self.peak_location = location.to_string();
            true
        } else {
            false
        }
    }

    /// Sound cues that fire for the first time at `global_max`.
    pub fn evaluate_sounds(&mut self, global_max: f64, th: &TriggerThresholds) -> Vec<SoundCue> {
        let mut cues = Vec::new();
        if !self.intensity4_played && global_max >= th.sound_intensity4 {
            self.intensity4_played = true;
            cues.push(SoundCue::Intensity4);
        }
        if !self.intensity7_played && global_max >= th.sound_intensity7 {
            self.intensity7_played = true;
            cues.push(SoundCue::Intensity7);
        }
        cues
    }

    /// At most one new alert per call. `observations` is indexed by station id.
    pub fn evaluate_alert(
        &mut self,
        policy:       AlertPolicy,
        observations: &[Option<Observation>],
        stations:     &[Station],
        now:          Seconds,
        th:           &TriggerThresholds,
    ) -> Option<AlertEvent> {
        let (station_id, intensity) = match policy {
            AlertPolicy::FirstRising => observations
                .iter()
                .enumerate()
                .find_map(|(id, obs)| {
                    let obs = obs.as_ref()?;
                    (obs.intensity >= th.alert && obs.intensity > self.alert_watermark)
                        .then_some((id, obs.intensity))
                })?,
            AlertPolicy::PeakOnce => {
                if self.alert_fired_once || self.peak_intensity < th.alert {
                    return None;
                }
                // Strongest this tick; strict `>` keeps the first on ties.
                let mut best: Option<(StationId, f64)> = None;
                for (id, obs) in observations.iter().enumerate() {
                    if let Some(obs) = obs {
                        if best.map_or(true, |(_, i)| obs.intensity > i) {
                            best = Some((id, obs.intensity));
                        }
                    }
                }
                best?
            }
        };

        let station = stations.get(station_id)?;
        self.alert_watermark = self.alert_watermark.max(intensity);
        self.alert_fired_once = true;

        Some(AlertEvent {
            station_id,
            lat: station.lat,
            lon: station.lon,
            triggered_at: now,
            intensity,
            scale: ShindoScale::from_intensity(intensity),
        })
    }
}
