use anyhow::Result;
use log::{info, warn};

use crate::error::PatternError;
use crate::library::{DEFAULT_TRACK_COLORS, FALLBACK_TRACK_COLOR, PatternLibrary, Visualization};
use crate::pattern::{Difficulty, PatternSummary, RhythmPattern};
use crate::source::PatternSource;

/// Holds the loaded pattern library and the currently selected pattern.
#[derive(Debug, Default)]
pub struct PatternStore {
    library: Option<PatternLibrary>,
    current: Option<String>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a source, replacing any previous library.
    /// Returns the number of patterns.
    pub fn load(&mut self, source: &dyn PatternSource) -> Result<usize> {
        let library = source.load()?;
        info!("loaded {} patterns from {}", library.len(), source.describe());
        Ok(self.load_library(library))
    }

    /// Install a decoded library. Clears the current selection.
    pub fn load_library(&mut self, library: PatternLibrary) -> usize {
        let count = library.len();
        self.library = Some(library);
        self.current = None;
        count
    }

    /// Load from a source, installing the built-in library on failure.
    pub fn load_or_builtin(&mut self, source: &dyn PatternSource) -> usize {
        match self.load(source) {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    "failed to load patterns from {}: {e:#}; using built-in patterns",
                    source.describe()
                );
                self.load_library(PatternLibrary::builtin())
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// Summaries of every pattern, sorted by id. Empty before load.
    pub fn list_available(&self) -> Vec<PatternSummary> {
        self.patterns().map(RhythmPattern::summary).collect()
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<PatternSummary> {
        self.patterns()
            .filter(|p| p.difficulty == difficulty)
            .map(RhythmPattern::summary)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&RhythmPattern> {
        self.library.as_ref()?.get(id)
    }

    /// Select the current pattern. On error the previous selection is kept.
    pub fn set_current(&mut self, id: &str) -> Result<&RhythmPattern, PatternError> {
        let library = self.library.as_ref().ok_or(PatternError::NotLoaded)?;
        let pattern = library
            .get(id)
            .ok_or_else(|| PatternError::UnknownPatternId(id.to_string()))?;
        self.current = Some(id.to_string());
        Ok(pattern)
    }

    pub fn current(&self) -> Option<&RhythmPattern> {
        self.get(self.current.as_deref()?)
    }

    pub fn visualization(&self) -> Option<&Visualization> {
        self.library.as_ref()?.visualization.as_ref()
    }

    /// Display color for a track.
    pub fn track_color(&self, track: usize) -> &str {
        if let Some(color) = self.visualization().and_then(|v| v.color(track)) {
            return color;
        }
        DEFAULT_TRACK_COLORS
            .get(track)
            .copied()
            .unwrap_or(FALLBACK_TRACK_COLOR)
    }

    /// Drop the library and the selection.
    pub fn reset(&mut self) {
        self.library = None;
        self.current = None;
    }

    fn patterns(&self) -> impl Iterator<Item = &RhythmPattern> {
        self.library
            .iter()
            .flat_map(|lib| lib.rhythm_library.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;

    struct FailingSource;

    impl PatternSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn load(&self) -> Result<PatternLibrary> {
            anyhow::bail!("unreachable host")
        }
    }

    fn loaded() -> PatternStore {
        let mut store = PatternStore::new();
        store.load(&StaticSource::builtin()).unwrap();
        store
    }

    #[test]
    fn not_loaded_behaviour() {
        let mut store = PatternStore::new();
        assert!(!store.is_loaded());
        assert!(store.list_available().is_empty());
        assert!(store.get("basic").is_none());
        assert!(store.current().is_none());
        assert_eq!(store.set_current("basic"), Err(PatternError::NotLoaded));
    }

    #[test]
    fn load_and_list_sorted() {
        let store = loaded();
        assert!(store.is_loaded());
        let ids: Vec<_> = store.list_available().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["basic", "eighth"]);
    }

    #[test]
    fn filter_by_difficulty() {
        let store = loaded();
        let easy = store.by_difficulty(Difficulty::Easy);
        assert_eq!(easy.len(), 1);
        assert_eq!(easy[0].id, "basic");
        assert!(store.by_difficulty(Difficulty::Expert).is_empty());
    }

    #[test]
    fn set_current_unknown_keeps_previous() {
        let mut store = loaded();
        assert_eq!(store.set_current("eighth").unwrap().bpm, 140.0);
        assert_eq!(
            store.set_current("nope"),
            Err(PatternError::UnknownPatternId("nope".into()))
        );
        assert_eq!(store.current().unwrap().id, "eighth");
    }

    #[test]
    fn reload_clears_selection() {
        let mut store = loaded();
        store.set_current("basic").unwrap();
        store.load(&StaticSource::builtin()).unwrap();
        assert!(store.current().is_none());
    }

    #[test]
    fn failing_source() {
        let mut store = PatternStore::new();
        assert!(store.load(&FailingSource).is_err());
        assert!(!store.is_loaded());
        assert_eq!(store.load_or_builtin(&FailingSource), 2);
        assert!(store.get("basic").is_some());
    }

    #[test]
    fn track_colors() {
        let mut store = PatternStore::new();
        assert_eq!(store.track_color(0), "#FF6B6B");
        assert_eq!(store.track_color(3), "#96CEB4");
        assert_eq!(store.track_color(4), "#FFFFFF");

        let lib = PatternLibrary::from_json(
            r##"{"rhythmLibrary":{},"visualization":{"colors":{"1":"#123456"}}}"##,
        )
        .unwrap();
        store.load_library(lib);
        assert_eq!(store.track_color(1), "#123456");
        assert_eq!(store.track_color(0), "#FF6B6B");
        assert_eq!(store.track_color(9), "#FFFFFF");
    }

    #[test]
    fn reset_unloads() {
        let mut store = loaded();
        store.set_current("basic").unwrap();
        store.reset();
        assert!(!store.is_loaded());
        assert!(store.current().is_none());
        assert!(store.visualization().is_none());
    }
}
