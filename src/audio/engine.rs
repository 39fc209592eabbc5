use std::collections::BTreeSet;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::loader::SampleLibrary;
use crate::params::{EngineControls, RealtimeParams, VoiceSegment};
use crate::pipeline::{rest, LatinPatternGenerator, PatternGenerator};
use crate::shared::{samples_per_step, LatinStyle, PatternStyle, STEPS_PER_BAR};

use super::compressor::Compressor;

/// The sequencer. Owned by whoever pulls audio; parameter changes arrive
/// through [`EngineControls`] and are picked up at bar boundaries.
pub struct BreakbeatEngine {
    sample_rate: u32,
    library: SampleLibrary,
    controls: EngineControls,
    compressor: Compressor,
    rng: ChaCha8Rng,

    drums: Vec<f32>,   // dry main layer, before overdubs and rests
    pattern: Vec<f32>, // what plays: drums + voice, rest-masked, normalized
    latin: Vec<f32>,
    rests: BTreeSet<usize>,
    rest_probability: Option<f32>, // what `rests` was drawn for

    built_with: Option<RealtimeParams>, // None until the first chunk
    voice_state: (bool, u64),           // (enabled, version) baked into `pattern`
    samples_per_step: usize,
    position: usize,
    bar_count: u64,
    comp_settings: (f32, f32, f32),
}

impl BreakbeatEngine {
    /// Load every sample in `sample_dir` and seed from OS entropy.
    pub fn new(sample_dir: &Path, sample_rate: u32) -> Result<Self> {
        let library = SampleLibrary::load(sample_dir, sample_rate)?;
        Ok(Self::with_library(library, sample_rate, None))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let library = SampleLibrary::load(&config.sample_dir, config.sample_rate)?;
        let engine = Self::with_library(library, config.sample_rate, config.seed);
        engine.controls.set_params(config.params);
        Ok(engine)
    }

    /// Build around an already prepared library. A seed makes every
    /// generated pattern reproducible.
    pub fn with_library(library: SampleLibrary, sample_rate: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        info!(samples = library.len(), sample_rate, ?seed, "breakbeat engine ready");

        let mut compressor = Compressor::new(sample_rate);
        let defaults = RealtimeParams::default();
        compressor.set_peak_reduction(defaults.comp_peak_reduction);
        compressor.set_gain(defaults.comp_gain_db);
        compressor.set_mix(defaults.comp_mix);

        Self {
            sample_rate,
            library,
            controls: EngineControls::default(),
            compressor,
            rng,
            drums: Vec::new(),
            pattern: Vec::new(),
            latin: Vec::new(),
            rests: BTreeSet::new(),
            rest_probability: None,
            built_with: None,
            voice_state: (false, 0),
            samples_per_step: 0,
            position: 0,
            bar_count: 0,
            comp_settings: (defaults.comp_peak_reduction, defaults.comp_gain_db, defaults.comp_mix),
        }
    }

    /// A handle for another thread to turn the knobs with.
    pub fn controls(&self) -> EngineControls {
        self.controls.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bars completed since construction.
    pub fn bar_count(&self) -> u64 {
        self.bar_count
    }

    pub fn params(&self) -> RealtimeParams {
        self.controls.snapshot()
    }

    pub fn library(&self) -> &SampleLibrary {
        &self.library
    }

    pub fn gain_reduction_db(&self) -> f32 {
        self.compressor.gain_reduction_db()
    }

    /// The main layer currently playing, overdubs included (empty before the
    /// first chunk).
    pub fn pattern(&self) -> &[f32] {
        &self.pattern
    }

    pub fn rest_steps(&self) -> &BTreeSet<usize> {
        &self.rests
    }

    pub fn samples_per_step(&self) -> usize {
        self.samples_per_step
    }

    /// Read cursor into the current cycle, in samples.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Fill `out` with the next `out.len()` mono samples. Never blocks and
    /// always writes every sample. Pattern and overdub changes land on the
    /// next bar line.
    pub fn get_audio_chunk(&mut self, out: &mut [f32]) {
        let mut params = self.controls.snapshot();
        if self.built_with.is_none() {
            self.regenerate(&params, "initial");
        }

        let mut written = 0;
        while written < out.len() {
            if self.samples_per_step == 0 {
                out[written..].fill(0.0);
                break;
            }

            let bar_len = self.samples_per_step * STEPS_PER_BAR;
            if self.position % bar_len == 0 {
                params = self.controls.snapshot();
                let reason = if self.position >= self.pattern.len() {
                    Some("cycle")
                } else if self.built_with.is_some_and(|b| b.structure_differs(&params)) {
                    Some("params")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    self.regenerate(&params, reason);
                    // the step length may have changed
                    continue;
                }
                if self.voice_state != (params.voice_enabled, self.controls.voice_version()) {
                    self.compose(&params);
                }
            }

            let to_boundary = bar_len - self.position % bar_len;
            let n = to_boundary.min(out.len() - written);
            let span = &mut out[written..written + n];

            span.copy_from_slice(&self.pattern[self.position..self.position + n]);
            if params.latin_enabled && self.latin.len() == self.pattern.len() {
                for (o, l) in span.iter_mut().zip(&self.latin[self.position..self.position + n]) {
                    *o += l;
                }
            }

            self.position += n;
            written += n;
            if self.position % bar_len == 0 {
                self.bar_count += 1;
            }
        }

        if params.comp_enabled {
            self.sync_compressor(&params);
            self.compressor.process(out);
        }
    }

    fn sync_compressor(&mut self, params: &RealtimeParams) {
        let wanted = (params.comp_peak_reduction, params.comp_gain_db, params.comp_mix);
        if wanted != self.comp_settings {
            self.compressor.set_peak_reduction(wanted.0);
            self.compressor.set_gain(wanted.1);
            self.compressor.set_mix(wanted.2);
            self.comp_settings = wanted;
        }
    }

    fn regenerate(&mut self, params: &RealtimeParams, reason: &'static str) {
        debug!(
            reason,
            bpm = params.bpm,
            style = %params.pattern_style,
            variation = params.pattern_variation,
            "regenerating pattern"
        );

        self.samples_per_step = samples_per_step(params.bpm, self.sample_rate);

        if self.rest_probability != Some(params.rest_probability) {
            self.rests = rest::generate(params.rest_probability, &mut self.rng);
            self.rest_probability = Some(params.rest_probability);
        }

        PatternGenerator::new(&self.library, self.sample_rate).render_drums(params, &mut self.rng, &mut self.drums);
        self.compose(params);
        if params.latin_enabled {
            LatinPatternGenerator::new(&self.library, self.sample_rate).generate(
                params,
                &self.rests,
                &mut self.rng,
                &mut self.latin,
            );
        } else {
            self.latin.clear();
        }

        self.position = 0;
        self.built_with = Some(*params);
    }

    // Rebuild the playing layer from the dry drums: no new randomness, so the
    // groove stays put while overdubs come and go.
    fn compose(&mut self, params: &RealtimeParams) {
        let version = self.controls.voice_version();
        let voices = self.controls.voice_segments();
        let active: &[VoiceSegment] = if params.voice_enabled { voices.as_slice() } else { &[] };

        self.pattern.clear();
        self.pattern.extend_from_slice(&self.drums);
        PatternGenerator::new(&self.library, self.sample_rate).finish(&mut self.pattern, active, params, &self.rests);

        self.voice_state = (params.voice_enabled, version);
    }

    // Setters, forwarded to the shared controls.

    pub fn set_bpm(&self, bpm: f32) {
        self.controls.set_bpm(bpm);
    }

    pub fn set_pattern_style(&self, style: PatternStyle) {
        self.controls.set_pattern_style(style);
    }

    pub fn set_pattern_variation(&self, variation: i32) {
        self.controls.set_pattern_variation(variation);
    }

    pub fn set_latin_style(&self, style: LatinStyle) {
        self.controls.set_latin_style(style);
    }

    pub fn set_latin_enabled(&self, enabled: bool) {
        self.controls.set_latin_enabled(enabled);
    }

    pub fn set_latin_fill_amount(&self, amount: f32) {
        self.controls.set_latin_fill_amount(amount);
    }

    pub fn set_rest_probability(&self, probability: f32) {
        self.controls.set_rest_probability(probability);
    }

    pub fn set_swing_amount(&self, amount: f32) {
        self.controls.set_swing_amount(amount);
    }

    pub fn set_ghost_notes(&self, density: f32) {
        self.controls.set_ghost_notes(density);
    }

    pub fn set_voice_enabled(&self, enabled: bool) {
        self.controls.set_voice_enabled(enabled);
    }

    pub fn set_voice_segments(&self, segments: Vec<VoiceSegment>) {
        self.controls.set_voice_segments(segments);
    }

    pub fn clear_voice_segments(&self) {
        self.controls.clear_voice_segments();
    }

    pub fn set_comp_enabled(&self, enabled: bool) {
        self.controls.set_comp_enabled(enabled);
    }

    pub fn set_comp_peak_reduction(&self, amount: f32) {
        self.controls.set_comp_peak_reduction(amount);
    }

    pub fn set_comp_gain(&self, db: f32) {
        self.controls.set_comp_gain(db);
    }

    pub fn set_comp_mix(&self, mix: f32) {
        self.controls.set_comp_mix(mix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Category;
    use crate::shared::MAX_SWING;

    const RATE: u32 = 1600; // 120 bpm -> 200 samples per step

    fn engine(seed: u64) -> BreakbeatEngine {
        let mut lib = SampleLibrary::new();
        lib.insert("1_Kick_H", vec![1.0; 20], Category::Kick);
        let engine = BreakbeatEngine::with_library(lib, RATE, Some(seed));
        engine.set_bpm(120.0);
        engine.set_ghost_notes(0.0);
        engine
    }

    fn pull(engine: &mut BreakbeatEngine, len: usize, chunk: usize) -> Vec<f32> {
        let mut all = Vec::with_capacity(len);
        let mut buf = vec![0.0; chunk];
        while all.len() < len {
            engine.get_audio_chunk(&mut buf);
            all.extend_from_slice(&buf);
        }
        all.truncate(len);
        all
    }

    #[test]
    fn first_chunk_builds_the_pattern() {
        let mut e = engine(1);
        assert!(e.pattern().is_empty());
        let mut out = [0.0f32; 64];
        e.get_audio_chunk(&mut out);
        assert_eq!(e.samples_per_step(), 200);
        assert_eq!(e.pattern().len(), 200 * 64);
        assert_eq!(&out[..], &e.pattern()[..64]);
    }

    #[test]
    fn chunk_size_does_not_change_the_output() {
        let a = pull(&mut engine(9), 200 * 64, 100);
        let b = pull(&mut engine(9), 200 * 64, 333);
        assert_eq!(a, b);
    }

    #[test]
    fn counts_completed_bars() {
        let mut e = engine(2);
        pull(&mut e, 200 * 16 * 5 + 10, 256);
        assert_eq!(e.bar_count(), 5);
    }

    #[test]
    fn tempo_change_waits_for_the_bar_line() {
        let mut e = engine(3);
        let mut out = vec![0.0f32; 200 * 8];
        e.get_audio_chunk(&mut out);
        e.set_bpm(150.0);

        // rest of bar 1 still plays at the old tempo
        e.get_audio_chunk(&mut out);
        assert_eq!(e.samples_per_step(), 200);

        e.get_audio_chunk(&mut out[..1]);
        assert_eq!(e.samples_per_step(), samples_per_step(150.0, RATE));
        assert_eq!(e.bar_count(), 1);
    }

    #[test]
    fn mix_only_changes_do_not_regenerate() {
        let mut e = engine(4);
        let mut out = vec![0.0f32; 200 * 16];
        e.get_audio_chunk(&mut out);
        let before = e.pattern().to_vec();
        e.set_comp_mix(0.5);
        e.set_voice_enabled(true);
        e.get_audio_chunk(&mut out);
        assert_eq!(e.pattern(), &before[..]);
    }

    #[test]
    fn cycle_end_regenerates_but_keeps_the_rests() {
        let mut e = engine(2);
        e.set_rest_probability(0.5);
        pull(&mut e, 200 * 64, 640);
        assert_eq!(e.position(), 200 * 64);
        assert_eq!(e.bar_count(), 4);
        let rests = e.rest_steps().clone();
        assert!(!rests.is_empty());

        pull(&mut e, 10, 10);
        assert_eq!(e.position(), 10);
        assert_eq!(e.bar_count(), 4);
        assert_eq!(e.rest_steps(), &rests);
    }

    #[test]
    fn voice_on_a_rest_step_stays_silent() {
        let rests = {
            let mut first_pass = engine(12);
            first_pass.set_rest_probability(0.5);
            pull(&mut first_pass, 1, 1);
            first_pass.rest_steps().clone()
        };
        assert!(!rests.is_empty());

        // one overdub on each rest, one just before it (its tail crosses in), one on step 0
        let mut segments = vec![VoiceSegment::new(0, vec![1.0; 300])];
        for &r in &rests {
            segments.push(VoiceSegment::new(r, vec![1.0; 300]));
            if r > 0 {
                segments.push(VoiceSegment::new(r - 1, vec![1.0; 300]));
            }
        }
        let mut e = engine(12);
        e.set_rest_probability(0.5);
        e.set_voice_segments(segments);
        e.set_voice_enabled(true);
        let out = pull(&mut e, 200 * 64, 512);
        assert_eq!(e.rest_steps(), &rests);

        for &r in &rests {
            assert!(out[r * 200..(r + 1) * 200].iter().all(|&s| s == 0.0), "rest step {r}");
        }
        let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= crate::pipeline::pattern::MAIN_PEAK + 1e-6, "peak {peak}");
    }

    #[test]
    fn voice_change_lands_on_the_next_bar_without_rerolling() {
        let mut e = engine(5);
        e.set_voice_segments(vec![VoiceSegment::new(18, vec![0.5; 10])]);
        pull(&mut e, 200 * 8, 200 * 8);
        let before = e.pattern().to_vec();
        e.set_voice_enabled(true);

        pull(&mut e, 200 * 8, 200 * 8);
        assert_eq!(e.pattern()[18 * 200], 0.0);

        let out = pull(&mut e, 1, 1);
        assert_eq!(e.position(), 200 * 16 + 1);
        let after = e.pattern();
        assert!(after[18 * 200] > 0.0);
        assert_eq!(out[0], after[16 * 200]);
        for i in (0..before.len()).filter(|i| !(18 * 200..18 * 200 + 10).contains(i)) {
            assert_eq!(before[i] != 0.0, after[i] != 0.0, "sample {i}");
        }
    }

    #[test]
    fn swing_moves_odd_voice_segments() {
        let mut e = engine(6);
        e.set_swing_amount(MAX_SWING);
        e.set_voice_segments(vec![VoiceSegment::new(1, vec![1.0; 1])]);
        e.set_voice_enabled(true);
        pull(&mut e, 200 * 4, 200 * 4);
        let shifted = 200 + crate::audio::mix::swing_offset(1, MAX_SWING, 200);
        assert!(e.pattern()[200..shifted].iter().all(|&s| s == 0.0));
        assert!(e.pattern()[shifted] > 0.0);
    }

    #[test]
    fn empty_library_still_fills_the_buffer() {
        let mut e = BreakbeatEngine::with_library(SampleLibrary::new(), RATE, Some(0));
        let mut out = vec![1.0f32; 4096];
        e.get_audio_chunk(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn compressor_follows_params() {
        let mut e = engine(7);
        e.set_comp_enabled(true);
        e.set_comp_peak_reduction(1.0);
        // amen opens on a kick; stop while its release is still high
        pull(&mut e, 100, 100);
        assert!(e.gain_reduction_db() > 0.0);

        e.set_comp_enabled(false);
        let mut out = [0.0f32; 100];
        e.get_audio_chunk(&mut out);
        assert_eq!(&out[..], &e.pattern()[100..200]);
    }
}
