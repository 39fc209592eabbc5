use std::path::{Path, PathBuf};

use crate::error::{BreakbeatError, Result};

// Load a WAV from disk and prepare it for the library: mono, target rate,
// peak at 1.0. This runs once at startup, never on the audio thread.
pub fn load(path: &Path, target_rate: u32) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader // float, just pass it through
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => { // int, convert to float
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(BreakbeatError::UnsupportedFormat(format!(
                    "{} bits per sample",
                    spec.bits_per_sample
                )));
            }
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mut mono = downmix(&samples, channels);
    if spec.sample_rate != target_rate {
        mono = resample_linear(&mono, spec.sample_rate, target_rate);
    }
    normalize_peak(&mut mono);
    Ok(mono)
}

// Every *.wav in the directory, sorted by file name so seeded runs line up.
pub fn index_wav_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BreakbeatError::SampleDir(dir.to_path_buf()));
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

// interleaved -> mono by averaging the channels of each frame
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || source_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (samples.len() as f64 * ratio) as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        // read position in the source, split into sample index and blend weight
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        let a = samples[idx.min(samples.len() - 1)];
        let b = samples.get(idx + 1).copied().unwrap_or(a);
        out.push(a * (1.0 - frac) + b * frac);
    }
    out
}

pub fn normalize_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, rate: u32, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn stereo_file_becomes_normalized_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2_SN_test.wav");
        // L/R pairs: averages are 0.25, -0.5 of full scale
        write_wav(&path, 44_100, 2, &[16384, 0, -16384, -16384]);

        let mono = load(&path, 44_100).unwrap();
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-3);
        assert!((mono[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn resamples_to_target_rate() {
        let input = vec![0.0, 1.0, 0.0, -1.0];
        let out = resample_linear(&input, 22_050, 44_100);
        assert_eq!(out.len(), 8);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(resample_linear(&input, 44_100, 44_100), input);
    }

    #[test]
    fn indexes_only_wav_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("b.wav"), 44_100, 1, &[1]);
        write_wav(&dir.path().join("a.WAV"), 44_100, 1, &[1]);
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

        let paths = index_wav_in_dir(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.WAV", "b.wav"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = index_wav_in_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, BreakbeatError::SampleDir(_)));
    }
}
