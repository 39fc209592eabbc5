// Optical-style compressor, "compress" mode only: fixed 3:1 ratio, 10 ms
// attack and a two-stage release that slides from fast to slow as the
// envelope falls below threshold. Gain is computed from the envelope, never
// from the instantaneous sample, then run through a soft tanh saturator.

const RATIO: f32 = 3.0;
const ATTACK_MS: f32 = 10.0;
const RELEASE_FAST_MS: f32 = 60.0;
const RELEASE_SLOW_MS: f32 = 1500.0;

const MIN_GAIN_DB: f32 = -20.0;
const MAX_GAIN_DB: f32 = 20.0;

#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

// exp(-1 / (seconds * rate))
fn time_coeff(ms: f32, sample_rate: u32) -> f32 {
    let samples = (ms / 1000.0) * sample_rate.max(1) as f32;
    (-1.0 / samples).exp()
}

#[derive(Clone, Debug)]
pub struct Compressor {
    peak_reduction: f32,
    threshold: f32,
    makeup: f32,
    mix: f32,

    attack_coeff: f32,
    release_fast_coeff: f32,
    release_slow_coeff: f32,

    envelope: f32,
    gain_reduction_db: f32,
}

impl Compressor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            peak_reduction: 0.0,
            threshold: 1.0, // 0% peak reduction: nothing below full scale is touched
            makeup: 1.0,
            mix: 1.0,
            attack_coeff: time_coeff(ATTACK_MS, sample_rate),
            release_fast_coeff: time_coeff(RELEASE_FAST_MS, sample_rate),
            release_slow_coeff: time_coeff(RELEASE_SLOW_MS, sample_rate),
            envelope: 0.0,
            gain_reduction_db: 0.0,
        }
    }

    /// 0.0 leaves the threshold at 0 dBFS, 1.0 drops it to -40 dBFS.
    pub fn set_peak_reduction(&mut self, amount: f32) {
        self.peak_reduction = amount.clamp(0.0, 1.0);
        self.threshold = db_to_linear(-40.0 * self.peak_reduction);
    }

    /// Makeup gain in dB, clamped to [-20, 20].
    pub fn set_gain(&mut self, db: f32) {
        self.makeup = db_to_linear(db.clamp(MIN_GAIN_DB, MAX_GAIN_DB));
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn peak_reduction(&self) -> f32 {
        self.peak_reduction
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Current reduction in dB (positive numbers mean attenuation), for metering.
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain_reduction_db = 0.0;
    }

    fn gain_for(&self, level: f32) -> f32 {
        if level <= self.threshold {
            return 1.0;
        }
        let over_db = 20.0 * (level / self.threshold).log10();
        let reduction_db = over_db - over_db / RATIO;
        db_to_linear(-reduction_db)
    }

    pub fn process(&mut self, buf: &mut [f32]) {
        for sample in buf.iter_mut() {
            let dry = *sample;
            let level = dry.abs();

            if level > self.envelope {
                self.envelope = self.attack_coeff * self.envelope + (1.0 - self.attack_coeff) * level;
            } else {
                let blend = (self.envelope / self.threshold).clamp(0.0, 1.0);
                let coeff = self.release_fast_coeff * blend + self.release_slow_coeff * (1.0 - blend);
                self.envelope = coeff * self.envelope + (1.0 - coeff) * level;
            }

            let gain = self.gain_for(self.envelope);
            self.gain_reduction_db = -20.0 * gain.log10();

            let wet = ((dry * gain * self.makeup) * 0.5).tanh() * 2.0;
            *sample = dry * (1.0 - self.mix) + wet * self.mix;
        }
    }
}
