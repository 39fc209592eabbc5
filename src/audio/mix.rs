// Buffer-level helpers shared by every generator. None of these allocate
// except `pitch_shift`, which is an offline utility.

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Forward offset (in samples) for a step; only odd steps are swung.
pub fn swing_offset(step: usize, swing: f32, samples_per_step: usize) -> usize {
    if step % 2 == 1 && swing > 0.0 {
        (swing * samples_per_step as f32) as usize
    } else {
        0
    }
}

/// Sum `audio * gain` into `buf` starting at `start`, clipped to the buffer end.
pub fn place_hit(buf: &mut [f32], start: usize, audio: &[f32], gain: f32) {
    if start >= buf.len() {
        return;
    }
    let len = audio.len().min(buf.len() - start);
    for (out, s) in buf[start..start + len].iter_mut().zip(audio) {
        *out += s * gain;
    }
}

/// Like `place_hit` but replaces what was there (monophonic cut).
pub fn place_hit_mono(buf: &mut [f32], start: usize, audio: &[f32], gain: f32) {
    if start >= buf.len() {
        return;
    }
    let len = audio.len().min(buf.len() - start);
    for (out, s) in buf[start..start + len].iter_mut().zip(audio) {
        *out = s * gain;
    }
}

/// Zero every sample belonging to `steps`.
pub fn clear_steps(buf: &mut [f32], samples_per_step: usize, steps: impl IntoIterator<Item = usize>) {
    for step in steps {
        let start = (step * samples_per_step).min(buf.len());
        let end = ((step + 1) * samples_per_step).min(buf.len());
        buf[start..end].fill(0.0);
    }
}

/// Scale so the loudest sample sits at `target`; silent buffers stay silent.
pub fn normalize_to(buf: &mut [f32], target: f32) {
    let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        let scale = target / peak;
        for s in buf.iter_mut() {
            *s *= scale;
        }
    }
}

/// Resample by `2^(semitones / 12)`; +12 halves the length, -12 doubles it.
pub fn pitch_shift(audio: &[f32], semitones: f32) -> Vec<f32> {
    if audio.is_empty() || semitones.abs() < 0.01 {
        return audio.to_vec();
    }
    let ratio = 2.0f32.powf(semitones / 12.0);
    let new_len = (audio.len() as f32 / ratio) as usize;
    if new_len == 0 {
        return audio.to_vec();
    }

    (0..new_len)
        .map(|i| {
            let pos = i as f32 * ratio;
            let idx = pos as usize;
            let frac = pos - idx as f32;
            match (audio.get(idx), audio.get(idx + 1)) {
                (Some(&a), Some(&b)) => lerp(a, b, frac),
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}
