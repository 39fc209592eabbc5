// Live parameters, shared between the control thread (setters) and the audio
// thread (one snapshot per chunk).
//
// Both the parameter struct and the voice overdub list are published as
// immutable snapshots through `ArcSwap`: a setter copies the current struct,
// changes one field and swaps the whole thing in, so the audio thread can
// only ever see a complete struct and never waits on a lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, Guard};
use serde::{Deserialize, Serialize};

use crate::shared::{LatinStyle, PatternStyle, MAX_SWING, MAX_VARIATION};

pub const MIN_BPM: f32 = 40.0;
pub const MAX_BPM: f32 = 300.0;

/// Every user-adjustable knob. Always read and written as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeParams {
    pub bpm: f32,
    pub pattern_style: PatternStyle,
    pub pattern_variation: u8, // 0-9, ten variations per style
    pub latin_style: LatinStyle,
    pub latin_enabled: bool,
    pub latin_fill_amount: f32,
    pub rest_probability: f32,
    pub swing_amount: f32, // fraction of a step, 0-0.33
    pub ghost_notes: f32,
    pub voice_enabled: bool,

    pub comp_enabled: bool,
    pub comp_peak_reduction: f32,
    pub comp_gain_db: f32,
    pub comp_mix: f32,
}

impl Default for RealtimeParams {
    fn default() -> Self {
        Self {
            bpm: 134.0,
            pattern_style: PatternStyle::Amen,
            pattern_variation: 0,
            latin_style: LatinStyle::Samba,
            latin_enabled: false,
            latin_fill_amount: 1.0,
            rest_probability: 0.0,
            swing_amount: 0.0,
            ghost_notes: 0.1,
            voice_enabled: false,
            comp_enabled: false,
            comp_peak_reduction: 0.0,
            comp_gain_db: 0.0,
            comp_mix: 1.0,
        }
    }
}

impl RealtimeParams {
    /// Pull every field back into its legal range (used for loaded configs).
    pub fn clamped(mut self) -> Self {
        self.bpm = clamp_or(self.bpm, MIN_BPM, MAX_BPM, 134.0);
        self.pattern_variation = self.pattern_variation.min(MAX_VARIATION);
        self.latin_fill_amount = clamp_or(self.latin_fill_amount, 0.0, 1.0, 1.0);
        self.rest_probability = clamp_or(self.rest_probability, 0.0, 1.0, 0.0);
        self.swing_amount = clamp_or(self.swing_amount, 0.0, MAX_SWING, 0.0);
        self.ghost_notes = clamp_or(self.ghost_notes, 0.0, 1.0, 0.1);
        self.comp_peak_reduction = clamp_or(self.comp_peak_reduction, 0.0, 1.0, 0.0);
        self.comp_gain_db = clamp_or(self.comp_gain_db, -20.0, 20.0, 0.0);
        self.comp_mix = clamp_or(self.comp_mix, 0.0, 1.0, 1.0);
        self
    }

    /// True when `other` would need the drums rolled again. Voice and
    /// compressor settings don't count, and neither do the latin knobs
    /// while the latin layer is off.
    pub fn structure_differs(&self, other: &RealtimeParams) -> bool {
        let latin_differs = self.latin_enabled != other.latin_enabled
            || (self.latin_enabled
                && (self.latin_style != other.latin_style
                    || self.latin_fill_amount != other.latin_fill_amount));

        self.bpm != other.bpm
            || self.pattern_style != other.pattern_style
            || self.pattern_variation != other.pattern_variation
            || latin_differs
            || self.rest_probability != other.rest_probability
            || self.swing_amount != other.swing_amount
            || self.ghost_notes != other.ghost_notes
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}

/// A one-shot overdub anchored to an absolute step (0..64) of the cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceSegment {
    pub step: usize,
    pub audio: Vec<f32>,
}

impl VoiceSegment {
    pub fn new(step: usize, audio: Vec<f32>) -> Self {
        Self { step, audio }
    }
}

/// Cloneable control-side handle. Every setter clamps, never rejects.
#[derive(Clone, Debug)]
pub struct EngineControls {
    params: Arc<ArcSwap<RealtimeParams>>,
    voices: Arc<ArcSwap<Vec<VoiceSegment>>>,
    voice_version: Arc<AtomicU64>, // bumped after every voice swap
}

impl Default for EngineControls {
    fn default() -> Self {
        Self::new(RealtimeParams::default())
    }
}

impl EngineControls {
    pub fn new(initial: RealtimeParams) -> Self {
        Self {
            params: Arc::new(ArcSwap::from_pointee(initial.clamped())),
            voices: Arc::new(ArcSwap::from_pointee(Vec::new())),
            voice_version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current parameters as one consistent value.
    pub fn snapshot(&self) -> RealtimeParams {
        **self.params.load()
    }

    /// Borrow the current overdub set without touching the refcount.
    pub fn voice_segments(&self) -> Guard<Arc<Vec<VoiceSegment>>> {
        self.voices.load()
    }

    /// Changes whenever the overdub set is replaced or cleared.
    pub fn voice_version(&self) -> u64 {
        self.voice_version.load(Ordering::Acquire)
    }

    // copy, edit, publish; retried if another setter raced us
    fn update(&self, edit: impl Fn(&mut RealtimeParams)) {
        self.params.rcu(|current| {
            let mut next = **current;
            edit(&mut next);
            next
        });
    }

    pub fn set_params(&self, params: RealtimeParams) {
        self.params.store(Arc::new(params.clamped()));
    }

    pub fn set_bpm(&self, bpm: f32) {
        if bpm.is_nan() {
            return;
        }
        self.update(|p| p.bpm = bpm.clamp(MIN_BPM, MAX_BPM));
    }

    pub fn set_pattern_style(&self, style: PatternStyle) {
        self.update(|p| p.pattern_style = style);
    }

    pub fn set_pattern_variation(&self, variation: i32) {
        let v = variation.clamp(0, MAX_VARIATION as i32) as u8;
        self.update(|p| p.pattern_variation = v);
    }

    pub fn set_latin_style(&self, style: LatinStyle) {
        self.update(|p| p.latin_style = style);
    }

    pub fn set_latin_enabled(&self, enabled: bool) {
        self.update(|p| p.latin_enabled = enabled);
    }

    pub fn set_latin_fill_amount(&self, amount: f32) {
        self.update(|p| p.latin_fill_amount = clamp_or(amount, 0.0, 1.0, p.latin_fill_amount));
    }

    pub fn set_rest_probability(&self, probability: f32) {
        self.update(|p| p.rest_probability = clamp_or(probability, 0.0, 1.0, p.rest_probability));
    }

    pub fn set_swing_amount(&self, amount: f32) {
        self.update(|p| p.swing_amount = clamp_or(amount, 0.0, MAX_SWING, p.swing_amount));
    }

    pub fn set_ghost_notes(&self, density: f32) {
        self.update(|p| p.ghost_notes = clamp_or(density, 0.0, 1.0, p.ghost_notes));
    }

    pub fn set_voice_enabled(&self, enabled: bool) {
        self.update(|p| p.voice_enabled = enabled);
    }

    pub fn set_voice_segments(&self, segments: Vec<VoiceSegment>) {
        self.voices.store(Arc::new(segments));
        self.voice_version.fetch_add(1, Ordering::Release);
    }

    pub fn clear_voice_segments(&self) {
        self.set_voice_segments(Vec::new());
    }

    pub fn set_comp_enabled(&self, enabled: bool) {
        self.update(|p| p.comp_enabled = enabled);
    }

    pub fn set_comp_peak_reduction(&self, amount: f32) {
        self.update(|p| p.comp_peak_reduction = clamp_or(amount, 0.0, 1.0, p.comp_peak_reduction));
    }

    pub fn set_comp_gain(&self, db: f32) {
        self.update(|p| p.comp_gain_db = clamp_or(db, -20.0, 20.0, p.comp_gain_db));
    }

    pub fn set_comp_mix(&self, mix: f32) {
        self.update(|p| p.comp_mix = clamp_or(mix, 0.0, 1.0, p.comp_mix));
    }
}
