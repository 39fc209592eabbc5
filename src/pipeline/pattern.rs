use std::collections::BTreeSet;

use rand::Rng;

use crate::audio::mix::{normalize_to, place_hit, swing_offset};
use crate::loader::{Category, SampleLibrary};
use crate::params::{RealtimeParams, VoiceSegment};
use crate::shared::{dynamic_curve, samples_per_step, BARS_PER_CYCLE, STEPS_PER_BAR, STEPS_PER_CYCLE};

use super::{fill, rest, styles};

/// Peak level of the finished main layer.
pub const MAIN_PEAK: f32 = 0.7;

/// Voice overdubs are summed into the drums at this gain, ahead of the rest
/// mask and normalization.
pub const VOICE_GAIN: f32 = 0.8;

const GHOST_GAIN: f32 = 0.15;
const GHOST_SPREAD: f32 = 0.2;

// Step to sample offset, swing included.
#[derive(Clone, Copy, Debug)]
struct Grid {
    samples_per_step: usize,
    swing: f32,
}

impl Grid {
    fn start(self, step: usize) -> usize {
        step * self.samples_per_step + swing_offset(step, self.swing, self.samples_per_step)
    }
}

/// Builds the 4-bar main drum layer.
pub struct PatternGenerator<'a> {
    library: &'a SampleLibrary,
    sample_rate: u32,
}

impl<'a> PatternGenerator<'a> {
    pub fn new(library: &'a SampleLibrary, sample_rate: u32) -> Self {
        Self { library, sample_rate }
    }

    /// Render the finished layer (no overdubs) into `out`, resized to
    /// `samples_per_step * 64`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        params: &RealtimeParams,
        rests: &BTreeSet<usize>,
        rng: &mut R,
        out: &mut Vec<f32>,
    ) {
        self.render_drums(params, rng, out);
        self.finish(out, &[], params, rests);
    }

    /// The dry drums: style template (swing applied at placement), ghost
    /// notes and fills. No rests, no normalization.
    pub fn render_drums<R: Rng + ?Sized>(&self, params: &RealtimeParams, rng: &mut R, out: &mut Vec<f32>) {
        let sps = samples_per_step(params.bpm, self.sample_rate);
        out.clear();
        out.resize(sps * STEPS_PER_CYCLE, 0.0);
        if sps == 0 {
            return;
        }
        let grid = Grid { samples_per_step: sps, swing: params.swing_amount };

        let def = styles::style(params.pattern_style);
        let occupied = def.occupied(params.pattern_variation);
        let (ghost_category, ghost_name) = def.ghost;

        for bar in 0..BARS_PER_CYCLE {
            let offset = bar * STEPS_PER_BAR;
            let curve = dynamic_curve(bar);

            for hit in def.hits(params.pattern_variation) {
                if hit.chance < 1.0 && rng.random::<f32>() >= hit.chance {
                    continue;
                }
                let gain = hit.gain + rng.random::<f32>() * hit.spread;
                self.place(out, grid, offset + hit.step as usize, (hit.category, hit.name), gain * curve, rng);
            }

            if params.ghost_notes > 0.0 {
                for step in 0..STEPS_PER_BAR {
                    if occupied & (1 << step) != 0 {
                        continue;
                    }
                    if rng.random::<f32>() < params.ghost_notes {
                        let gain = GHOST_GAIN + rng.random::<f32>() * GHOST_SPREAD;
                        self.place(out, grid, offset + step, (ghost_category, ghost_name), gain * curve, rng);
                    }
                }
            }
        }

        fill::inject(out, sps, params.swing_amount, self.library, rng);
    }

    /// Turn dry drums into the playing layer: sum the overdubs, cut the
    /// rests (so neither drums nor voice sound inside one), normalize.
    /// Draws no randomness, so it can be rerun when only the overdubs change.
    pub fn finish(&self, buf: &mut [f32], voices: &[VoiceSegment], params: &RealtimeParams, rests: &BTreeSet<usize>) {
        let sps = samples_per_step(params.bpm, self.sample_rate);
        if sps == 0 {
            return;
        }
        let grid = Grid { samples_per_step: sps, swing: params.swing_amount };

        for seg in voices.iter().filter(|s| s.step < STEPS_PER_CYCLE) {
            place_hit(buf, grid.start(seg.step), &seg.audio, VOICE_GAIN);
        }

        let fade = (rest::REST_FADE_SECONDS * self.sample_rate as f32) as usize;
        rest::apply(buf, sps, rests, fade);

        normalize_to(buf, MAIN_PEAK);
    }

    fn place<R: Rng + ?Sized>(
        &self,
        out: &mut [f32],
        grid: Grid,
        step: usize,
        (category, name): (Category, &str),
        gain: f32,
        rng: &mut R,
    ) {
        let Some(sample) = self.library.get(category, name, rng) else {
            return; // empty category: skip the hit
        };
        place_hit(out, grid.start(step), &sample.audio, gain);
    }
}
