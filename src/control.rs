// Line-oriented control surface: one `key value` command per line, applied to
// the shared engine controls from whatever thread reads them.
//
//   bpm 140        style jungle      variation 3
//   latin on       latin-style salsa latin-fill 0.5
//   rest 0.25      swing 0.2         ghost 0.1
//   comp on        comp-peak 0.6     comp-gain 3     comp-mix 0.8
//   voice on       voice-load 8 take.wav             voice-clear
//   status         quit

use std::path::PathBuf;

use crate::error::{BreakbeatError, Result};
use crate::loader::sample_loader;
use crate::params::{EngineControls, VoiceSegment};
use crate::shared::{LatinStyle, PatternStyle, STEPS_PER_CYCLE};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Bpm(f32),
    Style(PatternStyle),
    Variation(i32),
    LatinEnabled(bool),
    LatinStyle(LatinStyle),
    LatinFill(f32),
    Rest(f32),
    Swing(f32),
    Ghost(f32),
    VoiceEnabled(bool),
    VoiceLoad { step: usize, path: PathBuf },
    VoiceClear,
    CompEnabled(bool),
    CompPeak(f32),
    CompGain(f32),
    CompMix(f32),
    Status,
    Quit,
}

/// What the caller should do after a command has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    ShowStatus,
    Quit,
}

impl Command {
    /// Parse one line. Blank lines and `#` comments give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let key = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();

        let cmd = match key.as_str() {
            "bpm" => Command::Bpm(number(&key, arg)?),
            "style" => Command::Style(word(&key, arg)?.parse().map_err(BreakbeatError::Command)?),
            "variation" | "var" => Command::Variation(number(&key, arg)?),
            "latin" => Command::LatinEnabled(switch(&key, arg)?),
            "latin-style" => Command::LatinStyle(word(&key, arg)?.parse().map_err(BreakbeatError::Command)?),
            "latin-fill" => Command::LatinFill(number(&key, arg)?),
            "rest" => Command::Rest(number(&key, arg)?),
            "swing" => Command::Swing(number(&key, arg)?),
            "ghost" => Command::Ghost(number(&key, arg)?),
            "voice" => Command::VoiceEnabled(switch(&key, arg)?),
            "voice-load" => {
                let step: usize = number(&key, arg)?;
                if step >= STEPS_PER_CYCLE {
                    return Err(BreakbeatError::Command(format!("voice step {step} is past the cycle")));
                }
                let path = PathBuf::from(word(&key, words.next())?);
                Command::VoiceLoad { step, path }
            }
            "voice-clear" => Command::VoiceClear,
            "comp" => Command::CompEnabled(switch(&key, arg)?),
            "comp-peak" => Command::CompPeak(number(&key, arg)?),
            "comp-gain" => Command::CompGain(number(&key, arg)?),
            "comp-mix" => Command::CompMix(number(&key, arg)?),
            "status" => Command::Status,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(BreakbeatError::Command(format!("unknown command `{other}`"))),
        };
        Ok(Some(cmd))
    }

    /// Apply to the live controls. `voice-load` decodes the file here, at
    /// `sample_rate`, and adds it to the current overdub set.
    pub fn apply(self, controls: &EngineControls, sample_rate: u32) -> Result<Flow> {
        match self {
            Command::Bpm(v) => controls.set_bpm(v),
            Command::Style(s) => controls.set_pattern_style(s),
            Command::Variation(v) => controls.set_pattern_variation(v),
            Command::LatinEnabled(on) => controls.set_latin_enabled(on),
            Command::LatinStyle(s) => controls.set_latin_style(s),
            Command::LatinFill(v) => controls.set_latin_fill_amount(v),
            Command::Rest(v) => controls.set_rest_probability(v),
            Command::Swing(v) => controls.set_swing_amount(v),
            Command::Ghost(v) => controls.set_ghost_notes(v),
            Command::VoiceEnabled(on) => controls.set_voice_enabled(on),
            Command::VoiceLoad { step, path } => {
                let audio = sample_loader::load(&path, sample_rate)?;
                let mut segments = controls.voice_segments().to_vec();
                segments.retain(|s| s.step != step);
                segments.push(VoiceSegment::new(step, audio));
                controls.set_voice_segments(segments);
                tracing::info!(step, path = %path.display(), "voice segment loaded");
            }
            Command::VoiceClear => controls.clear_voice_segments(),
            Command::CompEnabled(on) => controls.set_comp_enabled(on),
            Command::CompPeak(v) => controls.set_comp_peak_reduction(v),
            Command::CompGain(v) => controls.set_comp_gain(v),
            Command::CompMix(v) => controls.set_comp_mix(v),
            Command::Status => return Ok(Flow::ShowStatus),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

fn word<'a>(key: &str, arg: Option<&'a str>) -> Result<&'a str> {
    arg.ok_or_else(|| BreakbeatError::Command(format!("`{key}` needs a value")))
}

fn number<T: std::str::FromStr>(key: &str, arg: Option<&str>) -> Result<T> {
    let raw = word(key, arg)?;
    raw.parse()
        .map_err(|_| BreakbeatError::Command(format!("`{key}`: `{raw}` is not a number")))
}

fn switch(key: &str, arg: Option<&str>) -> Result<bool> {
    match word(key, arg)?.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        other => Err(BreakbeatError::Command(format!("`{key}` takes on/off, got `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(controls: &EngineControls, line: &str) -> Flow {
        Command::parse(line).unwrap().unwrap().apply(controls, 44_100).unwrap()
    }

    #[test]
    fn parses_knobs() {
        assert_eq!(Command::parse("bpm 140").unwrap(), Some(Command::Bpm(140.0)));
        assert_eq!(Command::parse("  STYLE boom-bap ").unwrap(), Some(Command::Style(PatternStyle::BoomBap)));
        assert_eq!(Command::parse("latin off").unwrap(), Some(Command::LatinEnabled(false)));
        assert_eq!(
            Command::parse("voice-load 8 take.wav").unwrap(),
            Some(Command::VoiceLoad { step: 8, path: PathBuf::from("take.wav") })
        );
        assert_eq!(Command::parse("# a comment").unwrap(), None);
        assert_eq!(Command::parse("").unwrap(), None);
    }

    #[test]
    fn rejects_bad_lines() {
        for line in ["bpm", "bpm fast", "style polka", "comp maybe", "voice-load 64 a.wav", "dance 1"] {
            assert!(matches!(Command::parse(line), Err(BreakbeatError::Command(_))), "{line}");
        }
    }

    #[test]
    fn applies_through_the_setters() {
        let controls = EngineControls::default();
        assert_eq!(run(&controls, "variation 42"), Flow::Continue);
        assert_eq!(run(&controls, "swing 1"), Flow::Continue);
        assert_eq!(run(&controls, "comp on"), Flow::Continue);
        assert_eq!(run(&controls, "latin-style samba"), Flow::Continue);

        let p = controls.snapshot();
        assert_eq!(p.pattern_variation, 9);
        assert_eq!(p.swing_amount, crate::shared::MAX_SWING);
        assert!(p.comp_enabled);
        assert_eq!(p.latin_style, LatinStyle::Samba);

        assert_eq!(run(&controls, "status"), Flow::ShowStatus);
        assert_eq!(run(&controls, "quit"), Flow::Quit);
    }

    #[test]
    fn voice_load_replaces_the_same_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut w = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.1f32, -0.5, 0.25] {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();

        let controls = EngineControls::default();
        let line = format!("voice-load 4 {}", path.display());
        run(&controls, &line);
        run(&controls, &line);
        let segments = controls.voice_segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].step, 4);
        assert_eq!(segments[0].audio.len(), 3);

        run(&controls, "voice-clear");
        assert!(controls.voice_segments().is_empty());
    }
}
