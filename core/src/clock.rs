//! Simulation clock: owns tick count, speed multiplier, and pause.

use crate::{
    config::ClockConfig,
    types::{Seconds, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    pub current_tick: Tick,
    pub time_scale:   f64,
    pub paused:       bool,
    limits:           ClockConfig,
}

impl SimClock {
    pub fn new(limits: ClockConfig) -> Self {
        Self {
            current_tick: 0,
            time_scale: 1.0,
            paused: false,
            limits,
        }
    }

    /// Count one tick and return the simulated seconds it covers,
    /// or `None` while paused (paused ticks are not counted).
    pub fn advance(&mut self, real_dt: Seconds) -> Option<Seconds> {
        if self.paused {
            return None;
        }
        self.current_tick += 1;
        Some(real_dt * self.time_scale)
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn speed_up(&mut self) -> f64 {
        self.time_scale = (self.time_scale * self.limits.scale_step).min(self.limits.max_time_scale);
        self.time_scale
    }

    pub fn slow_down(&mut self) -> f64 {
        self.time_scale = (self.time_scale / self.limits.scale_step).max(self.limits.min_time_scale);
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            return;
        }
        self.time_scale = scale.clamp(self.limits.min_time_scale, self.limits.max_time_scale);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}
