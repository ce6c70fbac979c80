use beat_model::{
    BeatGenerator, CompiledPattern, LaneModifier, NoteEvent, PatternCompiler, PatternError,
    RhythmPattern,
};
use log::{debug, info};

/// Default fall time from spawn to the judgment line.
pub const DEFAULT_LEAD_TIME_MS: i64 = 2000;

/// A note due for spawning and the wall-clock time it reaches the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub event: NoteEvent,
    pub hit_at_ms: i64,
}

/// Turns a compiled pattern plus wall-clock time into spawn requests.
///
/// Pattern time wraps at the loop duration. Every event is emitted exactly
/// once per loop, `lead_time_ms` ahead of its timing so the note has time to
/// fall to the judgment line. Events due when a loop begins are emitted
/// together but keep their own hit times.
///
/// Without a pattern, a `BeatGenerator` can drive the schedule instead; its
/// steps run back to back with no loop.
#[derive(Debug)]
pub struct BeatScheduler {
    pattern: Option<RhythmPattern>,
    compiled: Option<CompiledPattern>,
    /// Per-event spawn flags for the current loop
    generated: Vec<bool>,
    generator: Option<BeatGenerator>,
    /// Hit time of the next generator step
    next_step_ms: f64,
    next_step_slot: usize,
    pattern_start_ms: Option<i64>,
    last_offset_ms: f64,
    lead_time_ms: i64,
    loop_count: u32,
    bpm_override: Option<f64>,
    lane_modifier: LaneModifier,
}

impl Default for BeatScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_LEAD_TIME_MS)
    }
}

impl BeatScheduler {
    pub fn new(lead_time_ms: i64) -> Self {
        Self {
            pattern: None,
            compiled: None,
            generated: Vec::new(),
            generator: None,
            next_step_ms: 0.0,
            next_step_slot: 0,
            pattern_start_ms: None,
            last_offset_ms: 0.0,
            lead_time_ms,
            loop_count: 0,
            bpm_override: None,
            lane_modifier: LaneModifier::Off,
        }
    }

    /// Compile and install a pattern at its own BPM. Replaces any generator.
    ///
    /// On error nothing is installed and `advance` returns no events.
    pub fn load(&mut self, pattern: &RhythmPattern) -> Result<(), PatternError> {
        self.bpm_override = None;
        self.pattern = None;
        self.compiled = None;
        self.generator = None;
        self.reset();
        self.compiled = Some(self.compile(pattern)?);
        self.pattern = Some(pattern.clone());
        self.reset();
        info!(
            "scheduler loaded '{}' ({} events)",
            pattern.id,
            self.event_count()
        );
        Ok(())
    }

    /// Drive spawns from a procedural generator. Drops any loaded pattern.
    pub fn load_generator(&mut self, generator: BeatGenerator) {
        self.pattern = None;
        self.compiled = None;
        self.bpm_override = None;
        info!(
            "scheduler generating {} rhythm at {} BPM",
            generator.rhythm_type(),
            generator.start_bpm()
        );
        self.generator = Some(generator);
        self.reset();
    }

    /// Override the BPM and recompile. Restarts timing.
    /// On error the previous BPM stays in effect.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<(), PatternError> {
        if let Some(generator) = self.generator.as_ref() {
            let replacement = BeatGenerator::new(generator.rhythm_type(), bpm, generator.seed())?;
            self.generator = Some(replacement);
            self.reset();
            return Ok(());
        }
        let previous = self.bpm_override.replace(bpm);
        if let Err(e) = self.recompile() {
            self.bpm_override = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Remap tracks and recompile. Restarts timing.
    pub fn set_lane_modifier(&mut self, modifier: LaneModifier) -> Result<(), PatternError> {
        let previous = std::mem::replace(&mut self.lane_modifier, modifier);
        if let Err(e) = self.recompile() {
            self.lane_modifier = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Back to the uninitialized state; the next `advance` starts a new run.
    pub fn reset(&mut self) {
        self.pattern_start_ms = None;
        self.last_offset_ms = 0.0;
        self.loop_count = 0;
        self.next_step_ms = 0.0;
        self.next_step_slot = 0;
        if let Some(generator) = self.generator.as_mut() {
            generator.reset();
        }
        self.generated.clear();
        self.generated
            .resize(self.compiled.as_ref().map_or(0, |c| c.events.len()), false);
    }

    /// Drop the pattern or generator entirely.
    pub fn unload(&mut self) {
        self.pattern = None;
        self.compiled = None;
        self.generator = None;
        self.bpm_override = None;
        self.reset();
    }

    /// Notes due for spawning at `now_ms`, in timing order.
    pub fn advance(&mut self, now_ms: i64) -> Vec<ScheduledNote> {
        if self.compiled.is_none() && self.generator.is_none() {
            return Vec::new();
        }
        if self.compiled.as_ref().is_some_and(|c| c.duration_ms <= 0.0) {
            return Vec::new();
        }

        let Some(start) = self.pattern_start_ms else {
            self.pattern_start_ms = Some(now_ms);
            self.last_offset_ms = 0.0;
            self.generated.iter_mut().for_each(|g| *g = false);
            self.next_step_ms = (now_ms + self.lead_time_ms) as f64;
            debug!("scheduler started at {now_ms} ms");
            return Vec::new();
        };

        if self.generator.is_some() {
            return self.advance_generated(start, now_ms);
        }
        self.advance_pattern(start, now_ms)
    }

    fn advance_pattern(&mut self, start: i64, now_ms: i64) -> Vec<ScheduledNote> {
        let Some(compiled) = self.compiled.as_ref() else {
            return Vec::new();
        };

        let offset = ((now_ms - start) as f64).rem_euclid(compiled.duration_ms);
        if offset < self.last_offset_ms {
            self.generated.iter_mut().for_each(|g| *g = false);
            self.loop_count += 1;
            debug!("pattern loop {} begins", self.loop_count);
        }

        let loop_start_ms = now_ms as f64 - offset;
        let horizon = offset + self.lead_time_ms as f64;
        let mut due = Vec::new();
        for (event, generated) in compiled.events.iter().zip(self.generated.iter_mut()) {
            if !*generated && horizon >= event.timing_ms {
                *generated = true;
                due.push(ScheduledNote {
                    event: *event,
                    hit_at_ms: (loop_start_ms + event.timing_ms).round() as i64,
                });
            }
        }

        self.last_offset_ms = offset;
        due
    }

    fn advance_generated(&mut self, start: i64, now_ms: i64) -> Vec<ScheduledNote> {
        let mapping = self.lane_modifier.mapping();
        let horizon = (now_ms + self.lead_time_ms) as f64;
        // steps this far in the past are consumed without spawning
        let stale = (now_ms - self.lead_time_ms) as f64;
        let Some(generator) = self.generator.as_mut() else {
            return Vec::new();
        };

        let mut due = Vec::new();
        while self.next_step_ms <= horizon {
            let step = generator.next_step();
            let hit_at_ms = self.next_step_ms;
            if let Some((track, intensity)) = step.note {
                if hit_at_ms >= stale {
                    due.push(ScheduledNote {
                        event: NoteEvent {
                            track: mapping.get(track).copied().unwrap_or(track),
                            slot: self.next_step_slot,
                            timing_ms: hit_at_ms - start as f64,
                            intensity,
                        },
                        hit_at_ms: hit_at_ms.round() as i64,
                    });
                }
            }
            self.next_step_ms += step.duration_ms;
            self.next_step_slot += 1;
        }
        due
    }

    pub fn lead_time_ms(&self) -> i64 {
        self.lead_time_ms
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn is_ready(&self) -> bool {
        self.compiled.is_some() || self.generator.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.pattern_start_ms.is_some()
    }

    pub fn pattern(&self) -> Option<&RhythmPattern> {
        self.pattern.as_ref()
    }

    pub fn compiled(&self) -> Option<&CompiledPattern> {
        self.compiled.as_ref()
    }

    pub fn generator(&self) -> Option<&BeatGenerator> {
        self.generator.as_ref()
    }

    /// Effective BPM of the pattern or generator.
    pub fn bpm(&self) -> Option<f64> {
        match (self.compiled.as_ref(), self.generator.as_ref()) {
            (Some(c), _) => Some(c.bpm),
            (None, Some(g)) => Some(g.bpm()),
            (None, None) => None,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.compiled.as_ref().map_or(0.0, |c| c.duration_ms)
    }

    /// Events per loop. Generated rhythms have no loop and report 0.
    pub fn event_count(&self) -> usize {
        self.compiled.as_ref().map_or(0, CompiledPattern::event_count)
    }

    pub fn lane_modifier(&self) -> LaneModifier {
        self.lane_modifier
    }

    fn compile(&self, pattern: &RhythmPattern) -> Result<CompiledPattern, PatternError> {
        let bpm = self.bpm_override.unwrap_or(pattern.bpm);
        let mut compiled = PatternCompiler::compile_with_bpm(pattern, bpm)?;
        self.lane_modifier.apply(&mut compiled.events);
        Ok(compiled)
    }

    fn recompile(&mut self) -> Result<(), PatternError> {
        if let Some(pattern) = self.pattern.as_ref() {
            let compiled = self.compile(pattern)?;
            self.compiled = Some(compiled);
        }
        self.reset();
        Ok(())
    }
}
