use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TRACK_COUNT;
use crate::error::PatternError;

/// BPM used when a pattern document omits `bpm`.
pub const DEFAULT_BPM: f64 = 120.0;

/// Difficulty label shown by the pattern selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time signature parsed from the `"N/M"` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub beats_per_measure: u32,
    pub note_value: u32,
}

impl TimeSignature {
    pub const COMMON: Self = Self {
        beats_per_measure: 4,
        note_value: 4,
    };

    /// Parse `"N/M"`. Both parts must be positive integers.
    pub fn parse(s: &str) -> Option<Self> {
        let (beats, value) = s.trim().split_once('/')?;
        let beats_per_measure: u32 = beats.trim().parse().ok()?;
        let note_value: u32 = value.trim().parse().ok()?;
        if beats_per_measure == 0 || note_value == 0 {
            return None;
        }
        Some(Self {
            beats_per_measure,
            note_value,
        })
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_measure, self.note_value)
    }
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

fn default_time_signature() -> String {
    TimeSignature::COMMON.to_string()
}

/// A named rhythm pattern as stored in the pattern library document.
///
/// Track notation uses one character per eighth-note slot:
/// `X` strong note, `x` weak note, `-` rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhythmPattern {
    /// Library key; filled in when the document is decoded.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    /// Track index string ("0".."3") to notation string
    #[serde(default)]
    pub tracks: BTreeMap<String, String>,
    #[serde(default)]
    pub description: String,
}

impl RhythmPattern {
    pub fn new(
        id: &str,
        name: &str,
        difficulty: Difficulty,
        bpm: f64,
        tracks: [&str; TRACK_COUNT],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            difficulty,
            bpm,
            time_signature: default_time_signature(),
            tracks: tracks
                .iter()
                .enumerate()
                .map(|(i, notation)| (i.to_string(), notation.to_string()))
                .collect(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Parsed time signature.
    pub fn signature(&self) -> Result<TimeSignature, PatternError> {
        TimeSignature::parse(&self.time_signature).ok_or_else(|| {
            PatternError::InvalidTimeSignature {
                id: self.id.clone(),
                value: self.time_signature.clone(),
            }
        })
    }

    /// Notation per track index. Tracks absent from the document are empty.
    ///
    /// Fails when a key is not a track index or when every track is empty.
    pub fn track_notations(&self) -> Result<[&str; TRACK_COUNT], PatternError> {
        let mut notations = [""; TRACK_COUNT];
        for (key, notation) in &self.tracks {
            let track = key
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&t| t < TRACK_COUNT)
                .ok_or_else(|| PatternError::InvalidTrack {
                    id: self.id.clone(),
                    key: key.clone(),
                })?;
            notations[track] = notation.as_str();
        }
        if notations.iter().all(|n| n.is_empty()) {
            return Err(PatternError::NoTracks {
                id: self.id.clone(),
            });
        }
        Ok(notations)
    }

    pub fn summary(&self) -> PatternSummary {
        PatternSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            difficulty: self.difficulty,
            bpm: self.bpm,
            time_signature: self.time_signature.clone(),
            description: self.description.clone(),
        }
    }
}

/// Listing entry for the pattern selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSummary {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub bpm: f64,
    pub time_signature: String,
    pub description: String,
}
