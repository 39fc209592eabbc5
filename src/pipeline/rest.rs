use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::shared::{is_fill_step, BARS_PER_CYCLE, STEPS_PER_BAR};

const WEAK_BEATS: [usize; 8] = [1, 3, 5, 7, 9, 11, 13, 15];
const STRONG_BEATS: [usize; 8] = [0, 2, 4, 6, 8, 10, 12, 14];

/// Fade applied on each side of a rest so the cut never clicks.
pub const REST_FADE_SECONDS: f32 = 0.003;

/// Draw `floor(16 * probability)` bar steps from a pool where weak beats
/// count twice. Duplicates are possible; they collapse in [`generate`].
pub fn one_bar_template<R: Rng + ?Sized>(probability: f32, rng: &mut R) -> Vec<usize> {
    let num_rests = (STEPS_PER_BAR as f32 * probability.clamp(0.0, 1.0)) as usize;
    if num_rests == 0 {
        return Vec::new();
    }

    let mut pool: Vec<usize> = Vec::with_capacity(24);
    pool.extend_from_slice(&WEAK_BEATS);
    pool.extend_from_slice(&WEAK_BEATS); // 2x weight
    pool.extend_from_slice(&STRONG_BEATS);
    pool.shuffle(rng);
    pool.truncate(num_rests);
    pool
}

/// The one-bar template repeated over the cycle, minus the fill windows.
pub fn generate<R: Rng + ?Sized>(probability: f32, rng: &mut R) -> BTreeSet<usize> {
    let template = one_bar_template(probability, rng);
    (0..BARS_PER_CYCLE)
        .flat_map(|bar| template.iter().map(move |&s| bar * STEPS_PER_BAR + s))
        .filter(|&step| !is_fill_step(step))
        .collect()
}

/// Silence every rest step, with a short linear fade-out before and
/// fade-in after it.
pub fn apply(buf: &mut [f32], samples_per_step: usize, rests: &BTreeSet<usize>, fade_samples: usize) {
    let len = buf.len();
    for &step in rests {
        let start = (step * samples_per_step).min(len);
        let end = (start + samples_per_step).min(len);

        if fade_samples > 0 {
            let fade_start = start.saturating_sub(fade_samples);
            for i in fade_start..start {
                buf[i] *= (start - i) as f32 / fade_samples as f32;
            }
            let fade_end = (end + fade_samples).min(len);
            for i in end..fade_end {
                buf[i] *= (i - end) as f32 / fade_samples as f32;
            }
        }

        buf[start..end].fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rest_count_follows_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(one_bar_template(0.5, &mut rng).len(), 8);
        assert_eq!(one_bar_template(0.99, &mut rng).len(), 15);
        assert!(one_bar_template(0.05, &mut rng).is_empty());
        assert!(generate(0.0, &mut rng).is_empty());
    }

    #[test]
    fn rests_avoid_fill_windows() {
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rests = generate(1.0, &mut rng);
            assert!(!rests.is_empty());
            assert!(rests.iter().all(|&s| s < 64 && !is_fill_step(s)));
        }
    }

    #[test]
    fn template_repeats_in_every_bar() {
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);
        let template = one_bar_template(0.5, &mut a);
        let rests = generate(0.5, &mut b);
        for &s in &template {
            assert!(rests.contains(&s));
            assert!(rests.contains(&(s + 32)));
        }
    }

    #[test]
    fn same_seed_same_rests() {
        let a = generate(0.4, &mut ChaCha8Rng::seed_from_u64(9));
        let b = generate(0.4, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn silences_with_fades() {
        let mut buf = vec![1.0f32; 40];
        let rests: BTreeSet<usize> = [1].into_iter().collect();
        apply(&mut buf, 10, &rests, 4);
        assert!(buf[10..20].iter().all(|&s| s == 0.0));
        assert_eq!(buf[6], 1.0);
        assert!(buf[7] < 1.0 && buf[9] < buf[7]);
        assert_eq!(buf[20], 0.0);
        assert!(buf[21] > 0.0 && buf[21] < 1.0);
        assert_eq!(buf[24], 1.0);
    }
}
