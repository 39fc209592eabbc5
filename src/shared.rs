// Cycle geometry and the small enums that every layer of the engine agrees on.
//
// A "step" is a 16th note. The engine always works on a 4-bar cycle:
//
//   bar 0: steps  0..16
//   bar 1: steps 16..32   (last beat, 28..=31, is the short fill window)
//   bar 2: steps 32..48
//   bar 3: steps 48..64   (last two beats, 56..=63, is the long fill window)

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const STEPS_PER_BAR: usize = 16;
pub const BARS_PER_CYCLE: usize = 4;
pub const STEPS_PER_CYCLE: usize = STEPS_PER_BAR * BARS_PER_CYCLE;

pub const SHORT_FILL: RangeInclusive<usize> = 28..=31;
pub const LONG_FILL: RangeInclusive<usize> = 56..=63;

pub const MAX_VARIATION: u8 = 9;
pub const MAX_SWING: f32 = 0.33;

/// True when `step` (absolute, 0..64) lies in one of the fixed fill windows.
pub fn is_fill_step(step: usize) -> bool {
    SHORT_FILL.contains(&step) || LONG_FILL.contains(&step)
}

/// Whole samples in one 16th note: `floor(60 / bpm / 4 * rate)`.
pub fn samples_per_step(bpm: f32, sample_rate: u32) -> usize {
    if bpm <= 0.0 {
        return 0;
    }
    let step_duration = 60.0 / bpm / 4.0;
    (step_duration * sample_rate as f32) as usize
}

/// Length of the 4-bar buffer; always an exact multiple of `samples_per_step`.
pub fn pattern_length(bpm: f32, sample_rate: u32) -> usize {
    samples_per_step(bpm, sample_rate) * STEPS_PER_CYCLE
}

// bar 1 normal, bar 2 a touch softer, bars 3 and 4 build up
pub fn dynamic_curve(bar: usize) -> f32 {
    match bar {
        0 => 1.0,
        1 => 0.95,
        2 => 1.05,
        3 => 1.1,
        _ => 1.0,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStyle {
    #[default]
    Amen,
    Jungle,
    BoomBap,
    Techno,
}

impl PatternStyle {
    pub const ALL: [PatternStyle; 4] = [
        PatternStyle::Amen,
        PatternStyle::Jungle,
        PatternStyle::BoomBap,
        PatternStyle::Techno,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternStyle::Amen => "amen",
            PatternStyle::Jungle => "jungle",
            PatternStyle::BoomBap => "boom_bap",
            PatternStyle::Techno => "techno",
        }
    }
}

impl fmt::Display for PatternStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "amen" => Ok(PatternStyle::Amen),
            "jungle" => Ok(PatternStyle::Jungle),
            "boom_bap" | "boombap" => Ok(PatternStyle::BoomBap),
            "techno" => Ok(PatternStyle::Techno),
            other => Err(format!("unknown pattern style `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatinStyle {
    #[default]
    Samba,
    Bossa,
    Salsa,
}

impl LatinStyle {
    pub fn name(self) -> &'static str {
        match self {
            LatinStyle::Samba => "samba",
            LatinStyle::Bossa => "bossa",
            LatinStyle::Salsa => "salsa",
        }
    }
}

impl fmt::Display for LatinStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LatinStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "samba" => Ok(LatinStyle::Samba),
            "bossa" => Ok(LatinStyle::Bossa),
            "salsa" => Ok(LatinStyle::Salsa),
            other => Err(format!("unknown latin style `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_timing_at_120_bpm() {
        assert_eq!(samples_per_step(120.0, 44_100), 5512);
        assert_eq!(pattern_length(120.0, 44_100), 352_768);
        assert_eq!(pattern_length(134.0, 44_100) % samples_per_step(134.0, 44_100), 0);
    }

    #[test]
    fn fill_windows() {
        assert!(is_fill_step(28) && is_fill_step(31));
        assert!(is_fill_step(56) && is_fill_step(63));
        assert!(!is_fill_step(27) && !is_fill_step(32) && !is_fill_step(55));
    }

    #[test]
    fn parses_style_names() {
        assert_eq!("Boom-Bap".parse::<PatternStyle>(), Ok(PatternStyle::BoomBap));
        assert_eq!("salsa".parse::<LatinStyle>(), Ok(LatinStyle::Salsa));
        assert!("polka".parse::<PatternStyle>().is_err());
    }
}
