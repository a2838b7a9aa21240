//! JMA instrumental intensity ("shindo") from magnitude, depth and distance.
//!
//! Every intermediate that feeds a `log`/`log10` is floored at 0.001 first,
//! so the calculator never produces NaN and never fails: the result is
//! always a finite value in [0, 7].

use serde::{Deserialize, Serialize};

pub const MIN_INTENSITY: f64 = 0.0;
pub const MAX_INTENSITY: f64 = 7.0;

const FLOOR: f64 = 0.001;

/// Above this depth (km) the depth term uses the quadratic saturation fit.
const DEEP_SOURCE_KM: f64 = 154.609_339_438_205;

/// Instrumental intensity for a site `epicentral_distance` km from the
/// epicentre. `bai` is the transformed site-amplification term (1.0 = none).
pub fn calc_jma_intensity(magnitude: f64, depth: f64, epicentral_distance: f64, bai: f64) -> f64 {
    if magnitude <= 0.0 || magnitude.is_nan() {
        return MIN_INTENSITY;
    }

    let kyori = epicentral_distance.hypot(depth).max(FLOOR);

    let dep_eff = if depth < DEEP_SOURCE_KM {
        depth
    } else {
        1.505_324_359_113_294 + 1.134_669_118_102_571_2 * depth
            - 0.000_934_001_968_432_340_3 * depth * depth
    };

    let bai = bai.max(FLOOR);
    let m_half = 10f64.powf(0.5 * magnitude);

    let denom = (kyori + 0.0028 * m_half).max(FLOOR);
    let log_base = 0.58 * magnitude + 0.0038 * dep_eff - 1.29 - denom.log10() - 0.002 * kyori;
    let base = 10f64.powf(log_base);

    let bai_term = (bai * (2.0 + 0.183_358_435_8 * bai.ln())).max(FLOOR);
    let strength = (base * 10f64.powf(2.367 - 0.852 * (400.0 / bai_term).log10())).max(FLOOR);

    // Quadratic in the strong-motion regime, linear below it.
    let l = strength.log10();
    let intensity_hi = 2.002 + 2.603 * l - 0.213 * l * l;
    let intensity_lo = 2.165 + 2.262 * l;
    let intensity = if intensity_hi > 4.0 { intensity_hi } else { intensity_lo };

    clamp_intensity(intensity)
}

/// `I = 2 log10(PGA) + 0.94`, PGA in gal. Independent of the regression above.
pub fn intensity_from_pga(pga: f64) -> f64 {
    if pga <= 0.0 || pga.is_nan() {
        return MIN_INTENSITY;
    }
    2.0 * pga.log10() + 0.94
}

/// Station amplification factor → the `bai` term the calculator expects.
pub fn site_term(amp: f64) -> f64 {
    (amp * 4.0 + amp * amp) / 5.0
}

/// Clamp to [0, 7]; NaN collapses to 0.
pub fn clamp_intensity(intensity: f64) -> f64 {
    if intensity.is_nan() {
        return MIN_INTENSITY;
    }
    intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

// ── Scale ────────────────────────────────────────────────────────────────────

pub type Rgb = (u8, u8, u8);

/// The ten JMA intensity classes, in severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShindoScale {
    #[serde(rename = "0")]  Zero,
    #[serde(rename = "1")]  One,
    #[serde(rename = "2")]  Two,
    #[serde(rename = "3")]  Three,
    #[serde(rename = "4")]  Four,
    #[serde(rename = "5-")] FiveLower,
    #[serde(rename = "5+")] FiveUpper,
    #[serde(rename = "6-")] SixLower,
    #[serde(rename = "6+")] SixUpper,
    #[serde(rename = "7")]  Seven,
}

impl ShindoScale {
    pub const ALL: [ShindoScale; 10] = [
        Self::Zero, Self::One, Self::Two, Self::Three, Self::Four,
        Self::FiveLower, Self::FiveUpper, Self::SixLower, Self::SixUpper, Self::Seven,
    ];

    /// Half-open bins: `[.., 0.5) → 0`, `[0.5, 1.5) → 1`, … `[6.5, ..) → 7`.
    pub fn from_intensity(intensity: f64) -> Self {
        match intensity {
            i if i < 0.5 => Self::Zero,
            i if i < 1.5 => Self::One,
            i if i < 2.5 => Self::Two,
            i if i < 3.5 => Self::Three,
            i if i < 4.5 => Self::Four,
            i if i < 5.0 => Self::FiveLower,
            i if i < 5.5 => Self::FiveUpper,
            i if i < 6.0 => Self::SixLower,
            i if i < 6.5 => Self::SixUpper,
            i if i.is_nan() => Self::Zero,
            _ => Self::Seven,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Zero      => "0",
            Self::One       => "1",
            Self::Two       => "2",
            Self::Three     => "3",
            Self::Four      => "4",
            Self::FiveLower => "5-",
            Self::FiveUpper => "5+",
            Self::SixLower  => "6-",
            Self::SixUpper  => "6+",
            Self::Seven     => "7",
        }
    }

    /// Position in the ordered scale, 0..=9. Also the icon index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Station/marker palette.
    pub fn color(self) -> Rgb {
        match self {
            Self::Zero      => (200, 200, 200),
            Self::One       => (100, 150, 200),
            Self::Two       => (50, 180, 50),
            Self::Three     => (200, 200, 0),
            Self::Four      => (255, 150, 0),
            Self::FiveLower => (255, 80, 0),
            Self::FiveUpper => (255, 0, 0),
            Self::SixLower  => (180, 0, 50),
            Self::SixUpper  => (150, 0, 100),
            Self::Seven     => (100, 0, 100),
        }
    }

    /// Header badge / S-front palette. Scale 0 has no badge of its own.
    pub fn badge_color(self) -> Rgb {
        match self {
            Self::One       => (0x21, 0x99, 0xFA),
            Self::Two       => (0x37, 0xCD, 0x33),
            Self::Zero | Self::Three => (0xED, 0xAA, 0x00),
            Self::Four      => (0xFB, 0x6E, 0x00),
            Self::FiveLower => (0xF9, 0x10, 0x10),
            Self::FiveUpper => (0xFB, 0x6E, 0x00),
            Self::SixLower  => (0xE9, 0x3D, 0x80),
            Self::SixUpper  => (0xC4, 0x35, 0x7A),
            Self::Seven     => (0x95, 0x00, 0xB0),
        }
    }
}

impl std::fmt::Display for ShindoScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn intensity_to_scale(intensity: f64) -> &'static str {
    ShindoScale::from_intensity(intensity).label()
}

/// Colour of the S front. Pinned to the event's peak so it does not flicker
/// as per-tick values decay; grey until anything is felt.
pub fn s_front_color(peak_intensity: f64) -> Rgb {
    if peak_intensity >= 0.5 {
        ShindoScale::from_intensity(peak_intensity).badge_color()
    } else {
        (128, 128, 128)
    }
}
