// Session config: where the samples live, the engine rate, an optional RNG
// seed, and the knob positions to start from. Stored as pretty JSON.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::RealtimeParams;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_dir: PathBuf,
    pub sample_rate: u32,
    pub seed: Option<u64>, // None: reseed from OS entropy
    pub params: RealtimeParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_dir: PathBuf::from("samples"),
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: None,
            params: RealtimeParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut config: EngineConfig = serde_json::from_str(&data)?;
        config.params = config.params.clamped();
        Ok(config)
    }

    // Save the config, making the parent directories if they don't exist already
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
