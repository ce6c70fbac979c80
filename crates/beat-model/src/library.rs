use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::TRACK_COUNT;
use crate::pattern::{Difficulty, RhythmPattern};

/// Track colors used when the document has no visualization block.
pub const DEFAULT_TRACK_COLORS: [&str; TRACK_COUNT] = ["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4"];

/// Color for tracks outside `0..TRACK_COUNT`.
pub const FALLBACK_TRACK_COLOR: &str = "#FFFFFF";

/// Rendering hints carried by the pattern library document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Visualization {
    /// Notation symbol to human-readable label
    pub symbols: BTreeMap<String, String>,
    /// Track index string to `#RRGGBB`
    pub colors: BTreeMap<String, String>,
}

impl Visualization {
    pub fn builtin() -> Self {
        let symbols = [("X", "strong note"), ("x", "weak note"), ("-", "rest")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let colors = DEFAULT_TRACK_COLORS
            .iter()
            .enumerate()
            .map(|(i, c)| (i.to_string(), c.to_string()))
            .collect();
        Self { symbols, colors }
    }

    /// Color for a track, if the document defines one.
    pub fn color(&self, track: usize) -> Option<&str> {
        self.colors.get(&track.to_string()).map(String::as_str)
    }
}

/// The persisted pattern library document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternLibrary {
    pub rhythm_library: BTreeMap<String, RhythmPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
}

impl PatternLibrary {
    pub fn new(patterns: Vec<RhythmPattern>, visualization: Option<Visualization>) -> Self {
        let rhythm_library = patterns.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            rhythm_library,
            visualization,
        }
    }

    /// Decode a library document. Pattern ids are taken from the map keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut library: Self =
            serde_json::from_str(json).context("Failed to parse pattern library")?;
        for (id, pattern) in library.rhythm_library.iter_mut() {
            pattern.id = id.clone();
        }
        Ok(library)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pattern library")
    }

    /// Library used when no document can be loaded.
    pub fn builtin() -> Self {
        let basic = RhythmPattern::new(
            "basic",
            "Basic Four-Beat",
            Difficulty::Easy,
            120.0,
            [
                "X---X---X---X---",
                "----X---X---X---",
                "--------X---X---",
                "------------X---",
            ],
        )
        .with_description("Quarter notes, each track entering one beat later");
        let eighth = RhythmPattern::new(
            "eighth",
            "Eighth Notes",
            Difficulty::Medium,
            140.0,
            [
                "X-X-X-X-X-X-X-X-",
                "-X-X-X-X-X-X-X-X",
                "X---X---X---X---",
                "----X---X---X---",
            ],
        )
        .with_description("Eighth notes mixed with quarter notes");
        Self::new(vec![basic, eighth], Some(Visualization::builtin()))
    }

    pub fn get(&self, id: &str) -> Option<&RhythmPattern> {
        self.rhythm_library.get(id)
    }

    pub fn len(&self) -> usize {
        self.rhythm_library.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhythm_library.is_empty()
    }
}
