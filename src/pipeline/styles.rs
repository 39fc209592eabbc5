// Rhythm content. Each main style is a one-bar base layer (hats, backbeat)
// plus ten variation layers that move the kick and add colour. The bar is
// repeated four times by the generator; fills are injected separately.

use crate::loader::Category;
use crate::shared::{LatinStyle, PatternStyle, STEPS_PER_BAR};

use Category::{Crash, Hihat, Kick, Ride, Roll, Snare, Tom};

/// One candidate trigger within a bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub step: u8,
    pub category: Category,
    pub name: &'static str, // sample-name filter, "" for any
    pub gain: f32,
    pub spread: f32, // random extra gain in [0, spread)
    pub chance: f32,
}

const fn hit(step: u8, category: Category, name: &'static str, gain: f32, spread: f32) -> Hit {
    Hit { step, category, name, gain, spread, chance: 1.0 }
}

const fn maybe(step: u8, category: Category, name: &'static str, gain: f32, spread: f32, chance: f32) -> Hit {
    Hit { step, category, name, gain, spread, chance }
}

pub struct StyleDef {
    pub base: &'static [Hit],
    pub variations: [&'static [Hit]; 10],
    pub ghost: (Category, &'static str),
}

impl StyleDef {
    pub fn hits(&self, variation: u8) -> impl Iterator<Item = &'static Hit> {
        let layer = self.variations[(variation as usize).min(9)];
        self.base.iter().chain(layer.iter())
    }

    /// Bitmask of bar steps touched by any template hit; ghosts go elsewhere.
    pub fn occupied(&self, variation: u8) -> u16 {
        self.hits(variation).fold(0u16, |mask, h| mask | 1 << h.step)
    }
}

pub fn style(style: PatternStyle) -> &'static StyleDef {
    match style {
        PatternStyle::Amen => &AMEN,
        PatternStyle::Jungle => &JUNGLE,
        PatternStyle::BoomBap => &BOOM_BAP,
        PatternStyle::Techno => &TECHNO,
    }
}

/// Absolute steps (0..64) where `category` is certain to be triggered.
pub fn template_steps(pattern: PatternStyle, variation: u8, category: Category) -> Vec<usize> {
    let def = style(pattern);
    let mut steps: Vec<usize> = (0..4)
        .flat_map(|bar| {
            def.hits(variation)
                .filter(move |h| h.category == category && h.chance >= 1.0)
                .map(move |h| bar * STEPS_PER_BAR + h.step as usize)
        })
        .collect();
    steps.sort_unstable();
    steps.dedup();
    steps
}

// ── AMEN ──────────────────────────────────────────────────────────

static AMEN: StyleDef = StyleDef {
    base: &[
        hit(0, Hihat, "C", 0.4, 0.3),
        hit(2, Hihat, "A", 0.25, 0.25),
        hit(4, Snare, "", 0.9, 0.2),
        hit(4, Hihat, "C", 0.4, 0.3),
        hit(6, Hihat, "A", 0.2, 0.25),
        hit(8, Hihat, "C", 0.4, 0.3),
        hit(10, Hihat, "A", 0.25, 0.3),
        hit(12, Snare, "", 0.9, 0.2),
        hit(12, Hihat, "O", 0.35, 0.3),
        hit(13, Roll, "H", 0.6, 0.35),
        hit(14, Snare, "Stick", 0.5, 0.35),
    ],
    variations: [
        &[hit(0, Kick, "", 0.95, 0.15), hit(8, Kick, "", 0.75, 0.25), hit(10, Kick, "", 0.55, 0.3), hit(15, Kick, "", 0.6, 0.3)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(10, Kick, "", 0.7, 0.25), hit(15, Kick, "", 0.6, 0.3), maybe(7, Snare, "Stick", 0.3, 0.2, 0.6)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(2, Kick, "", 0.6, 0.25), hit(10, Kick, "", 0.7, 0.25)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(8, Kick, "", 0.75, 0.25), hit(11, Kick, "", 0.55, 0.3), maybe(6, Roll, "", 0.35, 0.25, 0.5)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(3, Kick, "", 0.55, 0.25), hit(10, Kick, "", 0.7, 0.25), hit(15, Kick, "", 0.6, 0.3)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(6, Kick, "", 0.6, 0.25), hit(10, Kick, "", 0.7, 0.25)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(8, Kick, "", 0.75, 0.25), hit(9, Kick, "", 0.5, 0.25), hit(15, Kick, "", 0.6, 0.3), hit(11, Snare, "Stick", 0.35, 0.25)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(10, Kick, "", 0.75, 0.25), maybe(7, Snare, "", 0.3, 0.2, 0.7), maybe(9, Snare, "", 0.3, 0.2, 0.7)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(5, Kick, "", 0.55, 0.25), hit(8, Kick, "", 0.75, 0.25), maybe(15, Kick, "", 0.5, 0.3, 0.6)],
        &[hit(0, Kick, "", 0.95, 0.15), hit(2, Kick, "", 0.6, 0.2), hit(8, Kick, "", 0.75, 0.25), hit(10, Kick, "", 0.55, 0.3), hit(15, Kick, "", 0.6, 0.3), maybe(0, Crash, "", 0.3, 0.2, 0.25)],
    ],
    ghost: (Snare, "Stick"),
};

// ── JUNGLE ────────────────────────────────────────────────────────

static JUNGLE: StyleDef = StyleDef {
    base: &[
        hit(0, Hihat, "C", 0.48, 0.3),
        hit(2, Hihat, "A", 0.24, 0.15),
        hit(4, Snare, "", 0.85, 0.3),
        hit(4, Hihat, "C", 0.48, 0.3),
        hit(6, Hihat, "A", 0.24, 0.15),
        hit(8, Hihat, "C", 0.48, 0.3),
        hit(10, Hihat, "A", 0.24, 0.15),
        hit(12, Snare, "", 0.85, 0.3),
        hit(12, Hihat, "C", 0.48, 0.3),
        hit(14, Hihat, "A", 0.24, 0.15),
        hit(15, Hihat, "C", 0.4, 0.3),
        maybe(14, Roll, "", 0.4, 0.35, 0.6),
    ],
    variations: [
        &[hit(0, Kick, "", 0.7, 0.4), hit(6, Kick, "", 0.7, 0.4), hit(10, Kick, "", 0.7, 0.4), hit(13, Kick, "", 0.7, 0.4)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(10, Kick, "", 0.75, 0.3), maybe(7, Hihat, "A", 0.15, 0.25, 0.5)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(3, Kick, "", 0.6, 0.3), hit(10, Kick, "", 0.75, 0.3), hit(13, Kick, "", 0.6, 0.3)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(6, Kick, "", 0.7, 0.3), hit(11, Kick, "", 0.7, 0.3)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(2, Kick, "", 0.6, 0.3), hit(10, Kick, "", 0.75, 0.3), hit(11, Kick, "", 0.55, 0.3)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(7, Kick, "", 0.65, 0.3), hit(10, Kick, "", 0.75, 0.3), maybe(11, Hihat, "A", 0.15, 0.25, 0.5)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(6, Kick, "", 0.7, 0.3), hit(9, Kick, "", 0.6, 0.3), hit(13, Kick, "", 0.6, 0.3)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(10, Kick, "", 0.75, 0.3), hit(14, Kick, "", 0.6, 0.3), hit(7, Snare, "", 0.35, 0.2)],
        &[hit(0, Kick, "", 0.8, 0.3), hit(3, Kick, "", 0.6, 0.3), hit(6, Kick, "", 0.65, 0.3), hit(10, Kick, "", 0.75, 0.3)],
        &[hit(0, Kick, "", 0.7, 0.4), hit(6, Kick, "", 0.7, 0.4), hit(10, Kick, "", 0.7, 0.4), hit(13, Kick, "", 0.7, 0.4), hit(15, Snare, "", 0.5, 0.25)],
    ],
    ghost: (Hihat, "A"),
};

// ── BOOM BAP ──────────────────────────────────────────────────────

static BOOM_BAP: StyleDef = StyleDef {
    base: &[
        hit(0, Hihat, "C", 0.35, 0.3),
        hit(2, Hihat, "C", 0.35, 0.3),
        hit(4, Snare, "H", 0.85, 0.3),
        hit(4, Hihat, "C", 0.35, 0.3),
        hit(6, Hihat, "C", 0.35, 0.3),
        hit(8, Hihat, "C", 0.35, 0.3),
        hit(10, Hihat, "C", 0.35, 0.3),
        hit(12, Snare, "H", 0.85, 0.3),
        hit(12, Hihat, "C", 0.35, 0.3),
        hit(14, Hihat, "C", 0.35, 0.3),
        hit(15, Hihat, "C", 0.5, 0.3),
        maybe(6, Kick, "L", 0.25, 0.3, 0.7),
        maybe(14, Kick, "L", 0.35, 0.3, 0.7),
    ],
    variations: [
        &[hit(0, Kick, "H", 0.9, 0.25), hit(8, Kick, "H", 0.9, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(7, Kick, "H", 0.6, 0.25), hit(8, Kick, "H", 0.85, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(3, Kick, "H", 0.6, 0.25), hit(8, Kick, "H", 0.85, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(8, Kick, "H", 0.85, 0.25), hit(10, Kick, "H", 0.7, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(9, Kick, "H", 0.85, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(2, Kick, "H", 0.6, 0.25), hit(8, Kick, "H", 0.85, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(8, Kick, "H", 0.85, 0.25), hit(11, Kick, "H", 0.65, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(5, Kick, "H", 0.55, 0.25), hit(8, Kick, "H", 0.85, 0.25), hit(13, Kick, "H", 0.55, 0.25)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(10, Kick, "H", 0.85, 0.25), maybe(7, Hihat, "O", 0.15, 0.25, 0.6)],
        &[hit(0, Kick, "H", 0.9, 0.25), hit(3, Kick, "H", 0.6, 0.25), hit(8, Kick, "H", 0.85, 0.25), hit(11, Kick, "H", 0.65, 0.25)],
    ],
    ghost: (Hihat, "O"),
};

// ── TECHNO ────────────────────────────────────────────────────────

const TECHNO_OFFBEAT_HATS: [Hit; 8] = [
    maybe(1, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(3, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(5, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(7, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(9, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(11, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(13, Hihat, "C", 0.2, 0.25, 0.7),
    maybe(15, Hihat, "C", 0.2, 0.25, 0.7),
];

static TECHNO: StyleDef = StyleDef {
    base: &[
        hit(0, Kick, "H", 0.9, 0.2),
        hit(4, Kick, "H", 0.9, 0.2),
        hit(8, Kick, "H", 0.9, 0.2),
        hit(12, Kick, "H", 0.9, 0.2),
        hit(4, Snare, "", 0.55, 0.3),
        hit(12, Snare, "", 0.55, 0.3),
        hit(2, Hihat, "C", 0.35, 0.3),
        hit(6, Hihat, "C", 0.35, 0.3),
        hit(10, Hihat, "C", 0.35, 0.3),
        hit(14, Hihat, "C", 0.35, 0.3),
        hit(15, Hihat, "O", 0.5, 0.3),
        maybe(6, Hihat, "O", 0.3, 0.3, 0.6),
    ],
    variations: [
        &TECHNO_OFFBEAT_HATS,
        &[hit(0, Ride, "", 0.2, 0.25), hit(8, Ride, "", 0.2, 0.25)],
        &[hit(14, Kick, "H", 0.5, 0.2), maybe(3, Hihat, "C", 0.2, 0.2, 0.8), maybe(11, Hihat, "C", 0.2, 0.2, 0.8)],
        &[maybe(3, Hihat, "C", 0.25, 0.2, 0.8), maybe(7, Hihat, "C", 0.25, 0.2, 0.8), maybe(11, Hihat, "C", 0.25, 0.2, 0.8)],
        &[hit(2, Ride, "", 0.2, 0.2), hit(10, Ride, "", 0.2, 0.2), maybe(7, Snare, "", 0.3, 0.2, 0.5)],
        &[hit(3, Kick, "H", 0.5, 0.2), hit(11, Kick, "H", 0.5, 0.2)],
        &[hit(8, Snare, "", 0.4, 0.2), maybe(13, Hihat, "C", 0.2, 0.2, 0.7)],
        &[hit(14, Tom, "", 0.45, 0.2), maybe(13, Tom, "", 0.35, 0.2, 0.6)],
        &[hit(1, Hihat, "A", 0.2, 0.2), hit(5, Hihat, "A", 0.2, 0.2), hit(9, Hihat, "A", 0.2, 0.2), hit(13, Hihat, "A", 0.2, 0.2)],
        &[hit(7, Kick, "H", 0.45, 0.2), hit(0, Ride, "", 0.25, 0.2), maybe(11, Roll, "", 0.3, 0.2, 0.5)],
    ],
    ghost: (Hihat, "C"),
};

// ── LATIN ─────────────────────────────────────────────────────────

/// Latin trigger with a priority weight; low weights drop out first as the
/// fill amount goes down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatinHit {
    pub step: u8,
    pub weight: u8,
    pub gain: f32,
    pub spread: f32,
}

const fn latin(step: u8, weight: u8, gain: f32, spread: f32) -> LatinHit {
    LatinHit { step, weight, gain, spread }
}

static SAMBA: [LatinHit; 10] = [
    latin(0, 10, 0.9, 0.0),
    latin(2, 5, 0.5, 0.2),
    latin(4, 9, 0.9, 0.0),
    latin(6, 6, 0.5, 0.2),
    latin(7, 3, 0.5, 0.2),
    latin(9, 4, 0.5, 0.2),
    latin(11, 7, 0.5, 0.2),
    latin(13, 2, 0.5, 0.2),
    latin(14, 8, 0.5, 0.2),
    latin(15, 1, 0.5, 0.2),
];

static BOSSA: [LatinHit; 7] = [
    latin(0, 10, 0.7, 0.0),
    latin(3, 8, 0.4, 0.2),
    latin(6, 7, 0.4, 0.2),
    latin(8, 9, 0.7, 0.0),
    latin(11, 6, 0.4, 0.2),
    latin(13, 4, 0.4, 0.2),
    latin(15, 2, 0.4, 0.2),
];

static SALSA: [LatinHit; 6] = [
    latin(0, 10, 0.85, 0.0),
    latin(3, 7, 0.5, 0.2),
    latin(7, 9, 0.85, 0.0),
    latin(10, 6, 0.5, 0.2),
    latin(12, 8, 0.5, 0.2),
    latin(15, 3, 0.5, 0.2),
];

/// Template in step order.
pub fn latin_template(style: LatinStyle) -> &'static [LatinHit] {
    match style {
        LatinStyle::Samba => &SAMBA,
        LatinStyle::Bossa => &BOSSA,
        LatinStyle::Salsa => &SALSA,
    }
}
