// Procedural rhythm generation, used when no pattern is selected
//
// The generator walks short lane figures one step at a time. A step lasts one
// quarter, eighth or sixteenth note at the current BPM. Eighth and sixteenth
// play thin out steps by a density roll, and the tempo ramps up over time.

use std::fmt;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;
use crate::note_event::{Intensity, NoteEvent};

/// BPM a generated run starts at unless the host overrides it.
pub const GENERATOR_START_BPM: f64 = 60.0;
/// BPM added at each ramp point.
pub const RAMP_BPM_STEP: f64 = 5.0;
/// The ramp stops adding once the tempo reaches this.
pub const RAMP_BPM_CAP: f64 = 120.0;

/// Steps a mixed run stays on one subdivision.
const MIXED_SWITCH_STEPS: u32 = 8;

/// Figures are read one character per step; digits are tracks, `-` rests.
/// Quarter figures come in three tiers of three, easy to hard.
const QUARTER_FIGURES: [&str; 9] = [
    "0123", "0213", "1302", //
    "0012", "1123", "0221", //
    "010213", "203120", "123012",
];
const EIGHTH_FIGURES: [&str; 4] = ["0-1-2-3-", "01-2-3-0", "0-0-1-23", "-0-1-2-3"];
const SIXTEENTH_FIGURES: [&str; 5] = [
    "0-1-2-3-", "01-2-30-", "0-01-213", "-01-2-31", "012-30-2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhythmType {
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
    /// Cycles quarter, eighth, sixteenth every few steps.
    Mixed,
}

impl RhythmType {
    pub const ALL: [RhythmType; 4] = [Self::Quarter, Self::Eighth, Self::Sixteenth, Self::Mixed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quarter => "quarter",
            Self::Eighth => "eighth",
            Self::Sixteenth => "sixteenth",
            Self::Mixed => "mixed",
        }
    }

    /// Steps per beat.
    fn subdivisions(self) -> u32 {
        match self {
            Self::Quarter | Self::Mixed => 1,
            Self::Eighth => 2,
            Self::Sixteenth => 4,
        }
    }

    fn initial_density(self) -> f64 {
        match self {
            Self::Eighth => 0.7,
            Self::Sixteenth => 0.6,
            Self::Quarter | Self::Mixed => 1.0,
        }
    }

    fn next_mixed(self) -> Self {
        match self {
            Self::Quarter => Self::Eighth,
            Self::Eighth => Self::Sixteenth,
            Self::Sixteenth | Self::Mixed => Self::Quarter,
        }
    }
}

impl fmt::Display for RhythmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generator step: an optional note at its start, then `duration_ms` of
/// time before the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratedStep {
    pub note: Option<(usize, Intensity)>,
    pub duration_ms: f64,
}

/// Seeded step generator. The same type, BPM and seed always produce the
/// same sequence.
#[derive(Debug, Clone)]
pub struct BeatGenerator {
    rhythm_type: RhythmType,
    seed: u64,
    start_bpm: f64,
    rng: StdRng,
    bpm: f64,
    /// Subdivision in play; only differs from `rhythm_type` for mixed runs
    current: RhythmType,
    step_count: u64,
    mixed_steps: u32,
    figure: usize,
    position: usize,
    density: f64,
}

impl BeatGenerator {
    pub fn new(rhythm_type: RhythmType, bpm: f64, seed: u64) -> Result<Self, PatternError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(PatternError::InvalidBpm {
                id: rhythm_type.as_str().to_string(),
                bpm,
            });
        }
        let mut generator = Self {
            rhythm_type,
            seed,
            start_bpm: bpm,
            rng: StdRng::seed_from_u64(seed),
            bpm,
            current: rhythm_type,
            step_count: 0,
            mixed_steps: 0,
            figure: 0,
            position: 0,
            density: 1.0,
        };
        generator.reset();
        Ok(generator)
    }

    /// Rewind to the first step with the starting BPM and seed.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.bpm = self.start_bpm;
        self.current = match self.rhythm_type {
            RhythmType::Mixed => RhythmType::Quarter,
            other => other,
        };
        self.step_count = 0;
        self.mixed_steps = 0;
        self.figure = 0;
        self.position = 0;
        self.density = self.current.initial_density();
    }

    pub fn rhythm_type(&self) -> RhythmType {
        self.rhythm_type
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current tempo, including any ramp so far.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn start_bpm(&self) -> f64 {
        self.start_bpm
    }

    /// Subdivision the next step uses.
    pub fn current_type(&self) -> RhythmType {
        self.current
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn next_step(&mut self) -> GeneratedStep {
        let subdivisions = self.current.subdivisions();
        let duration_ms = 60_000.0 / self.bpm / f64::from(subdivisions);
        let on_beat = self.step_count % u64::from(subdivisions) == 0;

        let note = self.next_track().map(|track| {
            let intensity = if on_beat {
                Intensity::Strong
            } else {
                Intensity::Weak
            };
            (track, intensity)
        });

        self.step_count += 1;
        self.progress();
        GeneratedStep { note, duration_ms }
    }

    /// The first `steps` steps of a fresh run as timed events. `slot` is the
    /// step index.
    pub fn preview(&self, steps: usize) -> Vec<NoteEvent> {
        let mut generator = self.clone();
        generator.reset();
        let mut at_ms = 0.0;
        let mut events = Vec::new();
        for slot in 0..steps {
            let step = generator.next_step();
            if let Some((track, intensity)) = step.note {
                events.push(NoteEvent {
                    track,
                    slot,
                    timing_ms: at_ms,
                    intensity,
                });
            }
            at_ms += step.duration_ms;
        }
        events
    }

    fn next_track(&mut self) -> Option<usize> {
        let figures: &[&str] = match self.current {
            RhythmType::Quarter | RhythmType::Mixed => &QUARTER_FIGURES,
            RhythmType::Eighth => &EIGHTH_FIGURES,
            RhythmType::Sixteenth => &SIXTEENTH_FIGURES,
        };
        if self.density < 1.0 && !self.rng.gen_bool(self.density) {
            return None;
        }
        let figure = figures[self.figure % figures.len()].as_bytes();
        let symbol = figure[self.position % figure.len()];
        self.position += 1;
        char::from(symbol)
            .to_digit(10)
            .and_then(|d| usize::try_from(d).ok())
    }

    fn progress(&mut self) {
        let count = self.step_count;
        match self.current {
            RhythmType::Quarter | RhythmType::Mixed if count % 16 == 0 => {
                self.ramp_bpm();
                let tier = usize::try_from((count / 32).min(2)).unwrap_or(2);
                self.figure = tier * 3 + self.rng.gen_range(0..3);
                self.position = 0;
            }
            RhythmType::Eighth if count % 32 == 0 => {
                self.ramp_bpm();
                self.figure = usize::try_from(count / 64).unwrap_or(0) % EIGHTH_FIGURES.len();
                self.position = 0;
                self.density = (self.density + 0.1).min(0.9);
            }
            RhythmType::Sixteenth if count % 64 == 0 => {
                self.ramp_bpm();
                self.figure =
                    usize::try_from(count / 128).unwrap_or(0) % SIXTEENTH_FIGURES.len();
                self.position = 0;
                self.density = (self.density + 0.1).min(0.8);
            }
            _ => {}
        }

        if self.rhythm_type == RhythmType::Mixed {
            self.mixed_steps += 1;
            if self.mixed_steps >= MIXED_SWITCH_STEPS {
                self.current = self.current.next_mixed();
                self.mixed_steps = 0;
                self.figure = 0;
                self.position = 0;
                self.density = self.current.initial_density();
                debug!("mixed rhythm switched to {}", self.current);
            }
        }
    }

    fn ramp_bpm(&mut self) {
        if self.bpm < RAMP_BPM_CAP {
            self.bpm = (self.bpm + RAMP_BPM_STEP).min(RAMP_BPM_CAP);
            debug!("generated rhythm tempo now {} BPM", self.bpm);
        }
    }
}
