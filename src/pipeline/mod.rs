// Pattern construction: everything that turns parameters into buffers.
// Runs on the audio thread, but only at bar boundaries.

pub mod fill;
pub mod latin;
pub mod pattern;
pub mod rest;
pub mod styles;

pub use latin::LatinPatternGenerator;
pub use pattern::PatternGenerator;
