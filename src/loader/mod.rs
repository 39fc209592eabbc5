pub mod library;
pub mod sample_loader;

pub use library::{Category, DrumSample, SampleLibrary};
