use breakbeat::loader::Category;
use breakbeat::pipeline::styles;
use breakbeat::shared::{is_fill_step, samples_per_step, PatternStyle, STEPS_PER_CYCLE};
use breakbeat::{BreakbeatEngine, SampleLibrary};

const RATE: u32 = 8_000;

fn kick_engine(seed: u64) -> BreakbeatEngine {
    let mut lib = SampleLibrary::new();
    lib.insert("1_Kick_Heavy", vec![1.0; 40], Category::Kick);
    let engine = BreakbeatEngine::with_library(lib, RATE, Some(seed));
    engine.set_bpm(134.0);
    engine.set_pattern_style(PatternStyle::Amen);
    engine.set_pattern_variation(0);
    engine.set_ghost_notes(0.0);
    engine
}

fn pull_cycle(engine: &mut BreakbeatEngine, chunk: usize) -> Vec<f32> {
    let sps = samples_per_step(engine.params().bpm, RATE);
    let len = sps * STEPS_PER_CYCLE;
    let mut out = Vec::with_capacity(len);
    let mut buf = vec![0.0f32; chunk];
    while out.len() < len {
        let n = chunk.min(len - out.len());
        engine.get_audio_chunk(&mut buf[..n]);
        out.extend_from_slice(&buf[..n]);
    }
    out
}

fn step_slice(buf: &[f32], sps: usize, step: usize) -> &[f32] {
    &buf[step * sps..(step + 1) * sps]
}

#[test]
fn kicks_land_on_the_template() {
    let mut engine = kick_engine(11);
    let out = pull_cycle(&mut engine, 441);
    let sps = samples_per_step(134.0, RATE);
    assert_eq!(engine.pattern().len(), sps * STEPS_PER_CYCLE);

    let kicks = styles::template_steps(PatternStyle::Amen, 0, Category::Kick);
    assert!(!kicks.is_empty());
    for step in kicks.into_iter().filter(|&s| !is_fill_step(s)) {
        assert!(step_slice(&out, sps, step).iter().any(|&s| s != 0.0), "kick missing at step {step}");
    }
    assert_eq!(engine.bar_count(), 4);
}

#[test]
fn rest_steps_stay_silent() {
    let mut engine = kick_engine(12);
    engine.set_rest_probability(0.5);
    let out = pull_cycle(&mut engine, 256);
    let sps = samples_per_step(134.0, RATE);

    let rests = engine.rest_steps().clone();
    assert!(!rests.is_empty());
    for &step in &rests {
        assert!(!is_fill_step(step));
        assert!(step_slice(&out, sps, step).iter().all(|&s| s == 0.0), "sound in rest step {step}");
    }
}

#[test]
fn tempo_change_lands_on_a_bar_line() {
    let mut engine = kick_engine(13);
    let old_sps = samples_per_step(134.0, RATE);
    let bar = old_sps * 16;

    let mut buf = vec![0.0f32; bar / 2];
    engine.get_audio_chunk(&mut buf);
    let controls = engine.controls();
    std::thread::spawn(move || controls.set_bpm(90.0)).join().unwrap();

    let mut rest_of_bar = vec![0.0f32; bar - bar / 2];
    engine.get_audio_chunk(&mut rest_of_bar);
    assert_eq!(engine.samples_per_step(), old_sps);

    let mut next = vec![0.0f32; 16];
    engine.get_audio_chunk(&mut next);
    let new_sps = samples_per_step(90.0, RATE);
    assert_eq!(engine.samples_per_step(), new_sps);
    assert_eq!(engine.pattern().len() % new_sps, 0);
    assert_eq!(&next[..], &engine.pattern()[..16]);
}

#[test]
fn empty_library_plays_silence() {
    let mut engine = BreakbeatEngine::with_library(SampleLibrary::new(), RATE, Some(0));
    engine.set_latin_enabled(true);
    let mut buf = vec![0.5f32; 1000];
    for _ in 0..20 {
        engine.get_audio_chunk(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }
}

#[test]
fn seeded_engines_agree() {
    let a = pull_cycle(&mut kick_engine(99), 128);
    let b = pull_cycle(&mut kick_engine(99), 1000);
    assert_eq!(a, b);
}
