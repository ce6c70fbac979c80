use log::{debug, warn};

use crate::TRACK_COUNT;
use crate::error::PatternError;
use crate::note_event::{Intensity, NoteEvent, sort_events};
use crate::pattern::RhythmPattern;

/// Notation characters per beat (eighth-note grid).
pub const SUBDIVISIONS_PER_BEAT: u32 = 2;

/// Notation character for an empty slot.
pub const REST_SYMBOL: char = '-';

/// A pattern compiled into absolute note timings for one loop.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPattern {
    pub pattern_id: String,
    /// BPM the timings were computed with
    pub bpm: f64,
    /// Duration of one notation character in milliseconds
    pub unit_ms: f64,
    /// Length of the longest track notation
    pub slot_count: usize,
    /// Loop length: `slot_count * unit_ms`
    pub duration_ms: f64,
    /// Sorted by timing, ties by track
    pub events: Vec<NoteEvent>,
}

impl CompiledPattern {
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Compiles per-track notation into note events.
pub struct PatternCompiler;

impl PatternCompiler {
    /// Duration of one notation character at `bpm`.
    pub fn unit_duration_ms(bpm: f64) -> f64 {
        (60_000.0 / bpm) / f64::from(SUBDIVISIONS_PER_BEAT)
    }

    /// Compile with the pattern's own BPM.
    pub fn compile(pattern: &RhythmPattern) -> Result<CompiledPattern, PatternError> {
        Self::compile_with_bpm(pattern, pattern.bpm)
    }

    /// Compile with a BPM override.
    pub fn compile_with_bpm(
        pattern: &RhythmPattern,
        bpm: f64,
    ) -> Result<CompiledPattern, PatternError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(PatternError::InvalidBpm {
                id: pattern.id.clone(),
                bpm,
            });
        }
        pattern.signature()?;
        let notations = pattern.track_notations()?;

        let unit_ms = Self::unit_duration_ms(bpm);
        let mut events = Vec::new();
        let mut slot_count = 0usize;

        for (track, notation) in notations.iter().enumerate().take(TRACK_COUNT) {
            let mut len = 0usize;
            for (slot, c) in notation.chars().enumerate() {
                len = slot + 1;
                match Intensity::from_symbol(c) {
                    Some(intensity) => events.push(NoteEvent {
                        track,
                        slot,
                        timing_ms: slot as f64 * unit_ms,
                        intensity,
                    }),
                    None if c == REST_SYMBOL => {}
                    None => warn!(
                        "pattern '{}' track {}: unknown symbol '{}' at slot {} treated as rest",
                        pattern.id, track, c, slot
                    ),
                }
            }
            slot_count = slot_count.max(len);
        }

        sort_events(&mut events);

        let compiled = CompiledPattern {
            pattern_id: pattern.id.clone(),
            bpm,
            unit_ms,
            slot_count,
            duration_ms: slot_count as f64 * unit_ms,
            events,
        };
        debug!(
            "compiled pattern '{}': {} events, {} slots, {:.1} ms at {} BPM",
            compiled.pattern_id,
            compiled.event_count(),
            compiled.slot_count,
            compiled.duration_ms,
            bpm
        );
        Ok(compiled)
    }
}
