use std::path::PathBuf;

/// Result alias that carries [`BreakbeatError`].
pub type Result<T> = std::result::Result<T, BreakbeatError>;

/// Errors surfaced by the non-realtime parts of the engine (loading, config).
/// The audio path itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum BreakbeatError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    /// The sample directory is missing or not a directory.
    #[error("sample directory `{}` is not readable", .0.display())]
    SampleDir(PathBuf),
    /// A control line that could not be parsed.
    #[error("bad command: {0}")]
    Command(String),
}
