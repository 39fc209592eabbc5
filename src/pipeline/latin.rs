use std::collections::BTreeSet;

use rand::Rng;

use crate::audio::mix::{normalize_to, place_hit_mono, swing_offset};
use crate::loader::{Category, DrumSample, SampleLibrary};
use crate::params::RealtimeParams;
use crate::shared::{samples_per_step, LatinStyle, BARS_PER_CYCLE, STEPS_PER_BAR, STEPS_PER_CYCLE};

use super::{rest, styles};

/// Peak level of the latin layer, well under the main layer.
pub const LATIN_PEAK: f32 = 0.25;

/// Bar steps left active at `fill_amount`, in step order. The set only
/// grows as the amount rises: steps are ranked by weight, never re-rolled.
pub fn active_steps(style: LatinStyle, fill_amount: f32) -> Vec<u8> {
    let template = styles::latin_template(style);
    let keep = (fill_amount.clamp(0.0, 1.0) * template.len() as f32).round() as usize;

    let mut ranked: Vec<_> = template.iter().collect();
    ranked.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.step.cmp(&b.step)));

    let mut steps: Vec<u8> = ranked.into_iter().take(keep).map(|h| h.step).collect();
    steps.sort_unstable();
    steps
}

/// Secondary percussion layer drawn from snares and toms; monophonic, so
/// each hit cuts the one before it.
pub struct LatinPatternGenerator<'a> {
    library: &'a SampleLibrary,
    sample_rate: u32,
}

impl<'a> LatinPatternGenerator<'a> {
    pub fn new(library: &'a SampleLibrary, sample_rate: u32) -> Self {
        Self { library, sample_rate }
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        params: &RealtimeParams,
        rests: &BTreeSet<usize>,
        rng: &mut R,
        out: &mut Vec<f32>,
    ) {
        let sps = samples_per_step(params.bpm, self.sample_rate);
        out.clear();
        out.resize(sps * STEPS_PER_CYCLE, 0.0);

        let voices: Vec<&DrumSample> = self
            .library
            .category(Category::Snare)
            .chain(self.library.category(Category::Tom))
            .collect();
        if voices.is_empty() || sps == 0 {
            return;
        }

        let active = active_steps(params.latin_style, params.latin_fill_amount);
        let template = styles::latin_template(params.latin_style);

        for bar in 0..BARS_PER_CYCLE {
            for hit in template.iter().filter(|h| active.contains(&h.step)) {
                let step = bar * STEPS_PER_BAR + hit.step as usize;
                let sample = voices[rng.random_range(0..voices.len())];
                let gain = hit.gain + rng.random::<f32>() * hit.spread;
                let start = step * sps + swing_offset(step, params.swing_amount, sps);
                place_hit_mono(out, start, &sample.audio, gain);
            }
        }

        let fade = (rest::REST_FADE_SECONDS * self.sample_rate as f32) as usize;
        rest::apply(out, sps, rests, fade);

        normalize_to(out, LATIN_PEAK);
    }
}
