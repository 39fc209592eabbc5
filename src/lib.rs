//! Procedural breakbeat sequencer: style templates, rests, fills and a Latin
//! layer rendered into a 4-bar loop, pulled chunk by chunk from an audio
//! callback while another thread turns the knobs.

pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod loader;
pub mod params;
pub mod pipeline;
pub mod shared;

pub use audio::{BreakbeatEngine, Compressor};
pub use config::EngineConfig;
pub use error::{BreakbeatError, Result};
pub use loader::{Category, DrumSample, SampleLibrary};
pub use params::{EngineControls, RealtimeParams, VoiceSegment};
pub use shared::{LatinStyle, PatternStyle};
