use crate::placement::PlacementDraft;
use serde::{Deserialize, Serialize};

/// Everything a front end can ask the engine to do besides ticking.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SimCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    TogglePause,
    SpeedUp,
    SlowDown,

    // ── Placement draft ───────────────────────────
    MoveDraft { lat: f64, lon: f64 },
    NudgeDepth { steps: i32 },
    NudgeMagnitude { steps: i32 },
    ResetDraft,

    // ── Session ───────────────────────────────────
    /// Commit the current draft as a new session.
    Start,
    /// Start a new session from an explicit placement.
    Place { placement: PlacementDraft },
    /// Multi-source mode: add to the running session.
    AddSource {
        placement: PlacementDraft,
        #[serde(default)]
        delay: f64,
    },
    Reset,
}
