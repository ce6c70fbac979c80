use thiserror::Error;

/// Errors raised while resolving or compiling a rhythm pattern.
///
/// None of these are fatal: the worst outcome is that no notes spawn until
/// the host selects another pattern or falls back to the built-in library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("pattern '{id}' has no playable tracks")]
    NoTracks { id: String },

    #[error("pattern '{id}' has invalid BPM {bpm}")]
    InvalidBpm { id: String, bpm: f64 },

    #[error("pattern '{id}' has invalid track key '{key}' (expected 0..=3)")]
    InvalidTrack { id: String, key: String },

    #[error("pattern '{id}' has malformed time signature '{value}'")]
    InvalidTimeSignature { id: String, value: String },

    #[error("unknown pattern id: {0}")]
    UnknownPatternId(String),

    #[error("pattern data not loaded")]
    NotLoaded,
}

impl PatternError {
    /// True for malformed pattern data, false for lookup failures.
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(
            self,
            Self::NoTracks { .. }
                | Self::InvalidBpm { .. }
                | Self::InvalidTrack { .. }
                | Self::InvalidTimeSignature { .. }
        )
    }
}
