//! Events emitted by the engine, one list per tick.
//!
//! Consumers (audio, alert animation, the runner's log) react to these
//! instead of diffing snapshots.

use crate::{
    engine::IntensityModel,
    intensity::ShindoScale,
    trigger::{AlertEvent, SoundCue},
    types::{Epoch, GeoPoint, Seconds, Tick},
};
use serde::{Deserialize, Serialize};

/// Variants are appended, never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Session lifecycle ──────────────────────────
    SessionStarted {
        epoch:     Epoch,
        model:     IntensityModel,
        epicenter: GeoPoint,
        depth:     f64,
        magnitude: f64,
        location:  String,
    },
    SourceAdded {
        epoch:     Epoch,
        source_id: u32,
        epicenter: GeoPoint,
        depth:     f64,
        magnitude: f64,
        at:        Seconds,
    },
    SessionReset {
        epoch: Epoch,
    },

    // ── Triggers ───────────────────────────────────
    SoundTriggered {
        epoch:         Epoch,
        cue:           SoundCue,
        at:            Seconds,
        max_intensity: f64,
    },
    AlertRaised {
        epoch: Epoch,
        alert: AlertEvent,
    },

    // ── Tick ───────────────────────────────────────
    TickCompleted {
        tick:       Tick,
        elapsed:    Seconds,
        felt:       usize,
        tick_max:   f64,
        peak_scale: ShindoScale,
    },
}

impl SimEvent {
    /// Stable name for logs and the runner's output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::SourceAdded { .. }    => "source_added",
            Self::SessionReset { .. }   => "session_reset",
            Self::SoundTriggered { .. } => "sound_triggered",
            Self::AlertRaised { .. }    => "alert_raised",
            Self::TickCompleted { .. }  => "tick_completed",
        }
    }
}
