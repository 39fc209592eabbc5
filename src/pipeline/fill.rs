// Fixed fills: a snare pickup on the last beat of bar 2 and a mixed
// snare/tom/kick run over the last two beats of bar 4, capped by a crash.
// Both windows are wiped first, whatever the style put there.

use rand::Rng;

use crate::audio::mix::{clear_steps, place_hit, swing_offset};
use crate::loader::{Category, SampleLibrary};
use crate::shared::{LONG_FILL, SHORT_FILL};

const SHORT_FILL_CHANCE: f32 = 0.7;
const LONG_FILL_CHANCE: f32 = 0.85;
const CRASH_CHANCE: f32 = 0.8;
const CRASH_GAIN: f32 = 0.6;
const LONG_FILL_VOICES: [Category; 3] = [Category::Snare, Category::Tom, Category::Kick];

pub fn inject<R: Rng + ?Sized>(
    buf: &mut [f32],
    samples_per_step: usize,
    swing: f32,
    library: &SampleLibrary,
    rng: &mut R,
) {
    let place = |buf: &mut [f32], step: usize, audio: &[f32], gain: f32| {
        let start = step * samples_per_step + swing_offset(step, swing, samples_per_step);
        place_hit(buf, start, audio, gain);
    };

    clear_steps(buf, samples_per_step, SHORT_FILL);
    for step in SHORT_FILL {
        if rng.random::<f32>() < SHORT_FILL_CHANCE {
            if let Some(sample) = library.get(Category::Snare, "", rng) {
                let gain = 0.65 + rng.random::<f32>() * 0.25;
                place(buf, step, &sample.audio, gain);
            }
        }
    }

    clear_steps(buf, samples_per_step, LONG_FILL);
    for step in LONG_FILL {
        if rng.random::<f32>() < LONG_FILL_CHANCE {
            let category = LONG_FILL_VOICES[rng.random_range(0..LONG_FILL_VOICES.len())];
            if let Some(sample) = library.get(category, "", rng) {
                let gain = 0.7 + rng.random::<f32>() * 0.3;
                place(buf, step, &sample.audio, gain);
            }
        }
    }

    if rng.random::<f32>() < CRASH_CHANCE {
        if let Some(crash) = library.get(Category::Crash, "", rng) {
            place(buf, *LONG_FILL.end(), &crash.audio, CRASH_GAIN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SPS: usize = 8;

    fn step_energy(buf: &[f32], step: usize) -> f32 {
        buf[step * SPS..(step + 1) * SPS].iter().map(|s| s.abs()).sum()
    }

    #[test]
    fn windows_are_wiped_before_filling() {
        // nothing to fill with, so the windows must end up silent
        let lib = SampleLibrary::new();
        let mut buf = vec![1.0f32; SPS * 64];
        inject(&mut buf, SPS, 0.0, &lib, &mut ChaCha8Rng::seed_from_u64(1));

        for step in 0..64 {
            let e = step_energy(&buf, step);
            if SHORT_FILL.contains(&step) || LONG_FILL.contains(&step) {
                assert_eq!(e, 0.0, "step {step}");
            } else {
                assert_eq!(e, SPS as f32, "step {step}");
            }
        }
    }

    #[test]
    fn short_fill_uses_snares_in_range() {
        let mut lib = SampleLibrary::new();
        lib.insert("2_SN_a", vec![1.0; 2], Category::Snare);
        let mut hits = 0;
        for seed in 0..40 {
            let mut buf = vec![0.0f32; SPS * 64];
            inject(&mut buf, SPS, 0.0, &lib, &mut ChaCha8Rng::seed_from_u64(seed));
            for step in SHORT_FILL {
                let onset = buf[step * SPS];
                if onset != 0.0 {
                    hits += 1;
                    assert!((0.65..=0.90).contains(&onset), "gain {onset}");
                }
            }
        }
        // 70% of 160 rolls, give or take
        assert!((80..=140).contains(&hits), "{hits}");
    }

    #[test]
    fn crash_lands_on_the_last_step() {
        let mut lib = SampleLibrary::new();
        lib.insert("5_Crash", vec![1.0; 4], Category::Crash);
        let mut crashes = 0;
        for seed in 0..20 {
            let mut buf = vec![0.0f32; SPS * 64];
            inject(&mut buf, SPS, 0.0, &lib, &mut ChaCha8Rng::seed_from_u64(seed));
            if buf[63 * SPS] != 0.0 {
                assert!((buf[63 * SPS] - CRASH_GAIN).abs() < 1e-6);
                crashes += 1;
            }
            assert!(buf[..63 * SPS].iter().all(|&s| s == 0.0));
        }
        assert!(crashes > 0);
    }

    #[test]
    fn swing_pushes_odd_fill_steps() {
        let mut lib = SampleLibrary::new();
        lib.insert("2_SN_a", vec![1.0], Category::Snare);
        for seed in 0..10 {
            let mut buf = vec![0.0f32; SPS * 64];
            inject(&mut buf, SPS, 0.25, &lib, &mut ChaCha8Rng::seed_from_u64(seed));
            // odd steps never start on the grid
            assert_eq!(buf[29 * SPS], 0.0);
            assert_eq!(buf[31 * SPS], 0.0);
        }
    }
}
