// Rhythm pattern model: pattern library document, notation compiler, pattern store,
// procedural rhythm generator

mod compiler;
mod error;
mod generator;
mod lane_modifier;
mod library;
mod note_event;
mod pattern;
pub mod source;
mod store;

pub use compiler::{CompiledPattern, PatternCompiler, REST_SYMBOL, SUBDIVISIONS_PER_BEAT};
pub use error::PatternError;
pub use generator::{
    BeatGenerator, GENERATOR_START_BPM, GeneratedStep, RAMP_BPM_CAP, RAMP_BPM_STEP, RhythmType,
};
pub use lane_modifier::LaneModifier;
pub use library::{DEFAULT_TRACK_COLORS, FALLBACK_TRACK_COLOR, PatternLibrary, Visualization};
pub use note_event::{Intensity, NoteEvent};
pub use pattern::{Difficulty, PatternSummary, RhythmPattern, TimeSignature};
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use source::{FileSource, PatternSource, StaticSource};
pub use store::PatternStore;

/// Number of input tracks. Fixed for every pattern.
pub const TRACK_COUNT: usize = 4;
