use std::path::Path;

use anyhow::{Context, Result};
use beat_model::{LaneModifier, RhythmType};
use serde::{Deserialize, Serialize};

/// Lowest BPM the host may select.
pub const BPM_MIN: f64 = 40.0;
/// Highest BPM the host may select.
pub const BPM_MAX: f64 = 200.0;

pub const DEFAULT_PATTERN: &str = "basic";

/// Play settings. Out-of-range values are clamped by `validate()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayConfig {
    /// Time from spawn until a note reaches the judgment line (ms)
    pub lead_time_ms: i64,
    /// Distance past the zone bottom before a note is auto-missed
    pub overshoot_margin: f32,
    pub note_height: f32,
    /// Used to derive the default judge zone
    pub screen_height: f32,
    /// Maximum number of in-flight notes
    pub arena_capacity: usize,
    pub default_pattern: String,
    pub lane_modifier: LaneModifier,
    /// Generated rhythm used when the library has no patterns
    pub rhythm_type: RhythmType,
    pub rhythm_seed: u64,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            lead_time_ms: 2000,
            overshoot_margin: 50.0,
            note_height: 20.0,
            screen_height: 720.0,
            arena_capacity: 256,
            default_pattern: DEFAULT_PATTERN.to_string(),
            lane_modifier: LaneModifier::Off,
            rhythm_type: RhythmType::Quarter,
            rhythm_seed: 0,
        }
    }
}

impl PlayConfig {
    pub fn validate(&mut self) {
        let defaults = Self::default();

        self.lead_time_ms = self.lead_time_ms.clamp(100, 10_000);
        self.overshoot_margin =
            clamp_f32(self.overshoot_margin, 0.0, 1000.0, defaults.overshoot_margin);
        self.note_height = clamp_f32(self.note_height, 1.0, 200.0, defaults.note_height);
        self.screen_height =
            clamp_f32(self.screen_height, 100.0, 10_000.0, defaults.screen_height);
        self.arena_capacity = self.arena_capacity.clamp(16, 4096);
        self.lane_modifier = self.lane_modifier.normalized();

        if self.default_pattern.trim().is_empty() {
            self.default_pattern = defaults.default_pattern;
        }
    }

    /// Read config from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: PlayConfig = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate();
        Ok(config)
    }

    /// Write config to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Clamp a BPM into the selectable range. Non-finite input yields `None`.
pub fn clamp_bpm(bpm: f64) -> Option<f64> {
    bpm.is_finite().then(|| bpm.clamp(BPM_MIN, BPM_MAX))
}

fn clamp_f32(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PlayConfig::default();
        assert_eq!(c.lead_time_ms, 2000);
        assert_eq!(c.overshoot_margin, 50.0);
        assert_eq!(c.note_height, 20.0);
        assert_eq!(c.screen_height, 720.0);
        assert_eq!(c.arena_capacity, 256);
        assert_eq!(c.default_pattern, "basic");
        assert_eq!(c.lane_modifier, LaneModifier::Off);
        assert_eq!(c.rhythm_type, RhythmType::Quarter);
    }

    #[test]
    fn validate_clamps() {
        let mut c = PlayConfig {
            lead_time_ms: 5,
            overshoot_margin: -3.0,
            note_height: 1000.0,
            screen_height: f32::NAN,
            arena_capacity: 1_000_000,
            default_pattern: "   ".to_string(),
            lane_modifier: LaneModifier::Mirror,
            rhythm_type: RhythmType::Mixed,
            rhythm_seed: 7,
        };
        c.validate();
        assert_eq!(c.lead_time_ms, 100);
        assert_eq!(c.overshoot_margin, 0.0);
        assert_eq!(c.note_height, 200.0);
        assert_eq!(c.screen_height, 720.0);
        assert_eq!(c.arena_capacity, 4096);
        assert_eq!(c.default_pattern, "basic");
        assert_eq!(c.lane_modifier, LaneModifier::Mirror);
        assert_eq!(c.rhythm_type, RhythmType::Mixed);
    }

    #[test]
    fn validate_keeps_in_range_values() {
        let mut c = PlayConfig::default();
        c.lead_time_ms = 1500;
        c.default_pattern = "eighth".to_string();
        let before = c.clone();
        c.validate();
        assert_eq!(c, before);
    }

    #[test]
    fn bpm_range() {
        assert_eq!(clamp_bpm(10.0), Some(40.0));
        assert_eq!(clamp_bpm(120.0), Some(120.0));
        assert_eq!(clamp_bpm(999.0), Some(200.0));
        assert_eq!(clamp_bpm(f64::NAN), None);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let c: PlayConfig =
            serde_json::from_str(
                r#"{"leadTimeMs":1200,"laneModifier":{"type":"mirror"},"rhythmType":"sixteenth"}"#,
            )
            .unwrap();
        assert_eq!(c.lead_time_ms, 1200);
        assert_eq!(c.lane_modifier, LaneModifier::Mirror);
        assert_eq!(c.arena_capacity, 256);
        assert_eq!(c.rhythm_type, RhythmType::Sixteenth);
    }

    #[test]
    fn read_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("play.json");
        let mut c = PlayConfig::default();
        c.lane_modifier = LaneModifier::Random { seed: 99 };
        c.note_height = 32.0;
        c.write(&path).unwrap();
        let back = PlayConfig::read(&path).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn read_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("play.json");
        std::fs::write(&path, r#"{"arenaCapacity":2}"#).unwrap();
        assert_eq!(PlayConfig::read(&path).unwrap().arena_capacity, 16);
    }

    #[test]
    fn huge_rotate_offset_is_reduced() {
        let mut c: PlayConfig = serde_json::from_str(
            r#"{"laneModifier":{"type":"rotate","offset":18446744073709551615}}"#,
        )
        .unwrap();
        c.validate();
        assert_eq!(c.lane_modifier, LaneModifier::Rotate { offset: 3 });
    }

    #[test]
    fn read_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlayConfig::read(&dir.path().join("missing.json")).is_err());
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        assert!(PlayConfig::read(&path).is_err());
    }
}
