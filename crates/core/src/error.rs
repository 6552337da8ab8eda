/// Result alias that carries the custom [`MetronomeError`] type.
pub type Result<T> = std::result::Result<T, MetronomeError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    /// Free-form message surfaced by front ends.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// A configuration document parsed but describes an unusable metronome.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The host refused to play the beat cue.
    #[error("beat cue playback failed: {0}")]
    Playback(String),
}

impl MetronomeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for MetronomeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MetronomeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
