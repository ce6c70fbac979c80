use beat_model::{
    BeatGenerator, GENERATOR_START_BPM, Intensity, LaneModifier, PatternError, PatternLibrary,
    PatternSource, PatternStore, RhythmPattern, RhythmType,
};
use beat_rule::{
    FallingNote, GameStats, HitOutcome, JudgeZone, JudgmentEngine, NoteId, ScoreState,
};
use log::{debug, info, warn};

use crate::arena::NoteArena;
use crate::config::{PlayConfig, clamp_bpm};
use crate::scheduler::BeatScheduler;
use crate::time::TimeProvider;

/// Pattern installed when the selected one fails to compile.
const FALLBACK_PATTERN: &str = "basic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
}

/// What happened during an update, for the host to render and play sounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Spawned {
        id: NoteId,
        track: usize,
        intensity: Intensity,
        /// When the note reaches the judgment line
        hit_at_ms: i64,
    },
    Judged {
        id: NoteId,
        track: usize,
        outcome: HitOutcome,
    },
    Missed {
        id: NoteId,
        track: usize,
    },
    LoopStarted {
        loop_count: u32,
    },
}

/// Owns every gameplay component and drives them in a fixed order.
///
/// Per update: scheduler advance, spawn into the arena, position
/// projection, missed-note sweep.
pub struct GameSession<T: TimeProvider> {
    clock: T,
    config: PlayConfig,
    store: PatternStore,
    scheduler: BeatScheduler,
    engine: JudgmentEngine,
    score: ScoreState,
    arena: NoteArena,
    zone: JudgeZone,
    state: SessionState,
    /// Judgments made between updates
    pending: Vec<SessionEvent>,
}

impl<T: TimeProvider> GameSession<T> {
    pub fn new(mut config: PlayConfig, clock: T) -> Self {
        config.validate();
        let mut scheduler = BeatScheduler::new(config.lead_time_ms);
        if let Err(e) = scheduler.set_lane_modifier(config.lane_modifier) {
            warn!("lane modifier rejected: {e}");
        }
        Self {
            clock,
            store: PatternStore::new(),
            scheduler,
            engine: JudgmentEngine::new(config.overshoot_margin),
            score: ScoreState::new(),
            arena: NoteArena::new(config.arena_capacity, config.lead_time_ms),
            zone: JudgeZone::for_screen(config.screen_height),
            state: SessionState::Idle,
            pending: Vec::new(),
            config,
        }
    }

    /// Load patterns (built-in on failure) and select the configured default.
    ///
    /// An empty library leaves the configured generated rhythm in charge.
    pub fn init(&mut self, source: &dyn PatternSource) -> Result<(), PatternError> {
        let count = self.store.load_or_builtin(source);
        info!("session initialized with {count} patterns");

        let default = self.config.default_pattern.clone();
        match self.select_pattern(&default) {
            Err(PatternError::UnknownPatternId(_)) => {
                let first = self.store.list_available().into_iter().next();
                let Some(first) = first else {
                    warn!("pattern library is empty; generating rhythm instead");
                    return self.set_rhythm_type(self.config.rhythm_type);
                };
                warn!("default pattern '{default}' not found, using '{}'", first.id);
                self.select_pattern(&first.id)
            }
            other => other,
        }
    }

    /// Switch patterns. In-flight notes are discarded.
    ///
    /// If the pattern fails to compile the built-in basic pattern is
    /// installed instead and the compile error is returned.
    pub fn select_pattern(&mut self, id: &str) -> Result<(), PatternError> {
        let pattern = self.store.set_current(id)?.clone();
        self.arena.clear();
        if let Err(e) = self.scheduler.load(&pattern) {
            warn!("pattern '{id}' rejected: {e}; falling back to '{FALLBACK_PATTERN}'");
            self.install_fallback();
            return Err(e);
        }
        info!("selected pattern '{}' at {} BPM", pattern.id, pattern.bpm);
        Ok(())
    }

    /// Play a generated rhythm instead of a pattern, starting at
    /// `GENERATOR_START_BPM`. In-flight notes are discarded.
    pub fn set_rhythm_type(&mut self, rhythm_type: RhythmType) -> Result<(), PatternError> {
        let generator =
            BeatGenerator::new(rhythm_type, GENERATOR_START_BPM, self.config.rhythm_seed)?;
        self.arena.clear();
        self.scheduler.load_generator(generator);
        self.config.rhythm_type = rhythm_type;
        Ok(())
    }

    fn install_fallback(&mut self) {
        let library = PatternLibrary::builtin();
        let Some(fallback) = library.get(FALLBACK_PATTERN) else {
            return;
        };
        if let Err(e) = self.scheduler.load(fallback) {
            warn!("fallback pattern rejected: {e}");
            return;
        }
        if self.store.set_current(FALLBACK_PATTERN).is_err() {
            debug!("library has no '{FALLBACK_PATTERN}'; using the built-in copy");
        }
    }

    /// Clamp to the selectable range and recompile. Discards in-flight
    /// notes. Returns the BPM in effect afterwards.
    pub fn set_bpm(&mut self, bpm: f64) -> Option<f64> {
        let Some(bpm) = clamp_bpm(bpm) else {
            warn!("ignoring non-finite BPM");
            return self.scheduler.bpm();
        };
        if let Err(e) = self.scheduler.set_bpm(bpm) {
            warn!("BPM change rejected: {e}");
        }
        self.arena.clear();
        info!("BPM set to {bpm}");
        self.scheduler.bpm()
    }

    pub fn set_lane_modifier(&mut self, modifier: LaneModifier) {
        match self.scheduler.set_lane_modifier(modifier) {
            Ok(()) => self.config.lane_modifier = modifier,
            Err(e) => warn!("lane modifier rejected: {e}"),
        }
        self.arena.clear();
    }

    /// Start a fresh play of the current pattern.
    pub fn start(&mut self) {
        self.score.reset();
        self.arena.clear();
        self.scheduler.reset();
        self.pending.clear();
        self.state = SessionState::Playing;
        match (self.scheduler.pattern(), self.scheduler.generator()) {
            (Some(pattern), _) => info!("session started: {}", pattern.id),
            (None, Some(generator)) => {
                info!("session started: generated {}", generator.rhythm_type())
            }
            (None, None) => info!("session started with nothing to play"),
        }
    }

    /// Run one frame at `now_ms`.
    pub fn update(&mut self, now_ms: i64) -> Vec<SessionEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.state != SessionState::Playing {
            return events;
        }

        let loop_before = self.scheduler.loop_count();
        let due = self.scheduler.advance(now_ms);
        if self.scheduler.loop_count() != loop_before {
            events.push(SessionEvent::LoopStarted {
                loop_count: self.scheduler.loop_count(),
            });
        }

        for note in due {
            let event = note.event;
            match self.arena.allocate(event.track, event.intensity, note.hit_at_ms) {
                Some(id) => events.push(SessionEvent::Spawned {
                    id,
                    track: event.track,
                    intensity: event.intensity,
                    hit_at_ms: note.hit_at_ms,
                }),
                None => warn!(
                    "note arena full ({}), dropping note on track {}",
                    self.arena.capacity(),
                    event.track
                ),
            }
        }

        let notes = self.falling_notes(now_ms);
        for id in self.engine.sweep_missed(&notes, &self.zone) {
            if let Some(note) = self.arena.release(id) {
                self.score.record_hit(HitOutcome::Miss);
                debug!("note {id:?} on track {} missed", note.track);
                events.push(SessionEvent::Missed {
                    id,
                    track: note.track,
                });
            }
        }

        events
    }

    /// `update` at the session clock's current time.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let now = self.clock.now_ms();
        self.update(now)
    }

    /// Judge an input on `track` at `timestamp_ms`.
    ///
    /// `None` when no note is in reach; the score is left untouched.
    pub fn submit_hit(&mut self, track: usize, timestamp_ms: i64) -> Option<HitOutcome> {
        if self.state != SessionState::Playing {
            return None;
        }
        let notes = self.falling_notes(timestamp_ms);
        let (id, outcome) = self.engine.judge_input(track, &notes, &self.zone)?;
        self.arena.release(id)?;
        self.score.record_hit(outcome);
        self.pending.push(SessionEvent::Judged { id, track, outcome });
        Some(outcome)
    }

    /// `submit_hit` at the session clock's current time.
    pub fn press(&mut self, track: usize) -> Option<HitOutcome> {
        let now = self.clock.now_ms();
        self.submit_hit(track, now)
    }

    /// Live notes projected to `now_ms`, for rendering.
    pub fn falling_notes(&self, now_ms: i64) -> Vec<FallingNote> {
        self.arena.falling_notes(now_ms, &self.zone, self.config.note_height)
    }

    pub fn stats(&self) -> GameStats {
        self.score.stats()
    }

    /// Replace the judge zone, e.g. after a resize. Invalid geometry is
    /// rejected and the current zone kept.
    pub fn set_judge_zone(&mut self, zone: JudgeZone) -> bool {
        if !zone.is_valid() {
            warn!("rejecting judge zone {zone:?}");
            return false;
        }
        self.zone = zone;
        true
    }

    /// Stop playing and clear score and notes. Patterns stay loaded.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.score.reset();
        self.arena.clear();
        self.scheduler.reset();
        self.pending.clear();
    }

    /// Release everything; `init` must be called again before playing.
    pub fn teardown(&mut self) {
        self.reset();
        self.scheduler.unload();
        self.store.reset();
        info!("session torn down");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn judge_zone(&self) -> &JudgeZone {
        &self.zone
    }

    pub fn current_pattern(&self) -> Option<&RhythmPattern> {
        self.scheduler.pattern()
    }

    pub fn bpm(&self) -> Option<f64> {
        self.scheduler.bpm()
    }

    /// Generated rhythm in play, if no pattern is.
    pub fn rhythm_type(&self) -> Option<RhythmType> {
        self.scheduler.generator().map(BeatGenerator::rhythm_type)
    }

    /// Notes spawned per pattern loop.
    pub fn event_count(&self) -> usize {
        self.scheduler.event_count()
    }

    pub fn live_note_count(&self) -> usize {
        self.arena.len()
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockTimeProvider;
    use beat_model::{Difficulty, StaticSource};

    fn session() -> GameSession<MockTimeProvider> {
        let mut s = GameSession::new(PlayConfig::default(), MockTimeProvider::new());
        s.init(&StaticSource::builtin()).unwrap();
        s
    }

    fn library_with(pattern: RhythmPattern) -> StaticSource {
        let mut lib = PatternLibrary::builtin();
        lib.rhythm_library.insert(pattern.id.clone(), pattern);
        StaticSource::new(lib)
    }

    #[test]
    fn init_selects_default() {
        let s = session();
        assert_eq!(s.current_pattern().unwrap().id, "basic");
        assert_eq!(s.bpm(), Some(120.0));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.event_count(), 4 + 3 + 2 + 1);
    }

    #[test]
    fn init_falls_back_to_first_pattern() {
        let config = PlayConfig {
            default_pattern: "missing".to_string(),
            ..PlayConfig::default()
        };
        let mut s = GameSession::new(config, MockTimeProvider::new());
        s.init(&StaticSource::builtin()).unwrap();
        assert_eq!(s.current_pattern().unwrap().id, "basic");
    }

    #[test]
    fn idle_session_does_nothing() {
        let mut s = session();
        assert!(s.update(0).is_empty());
        assert!(s.update(5_000).is_empty());
        assert_eq!(s.submit_hit(0, 5_000), None);
        assert_eq!(s.live_note_count(), 0);
    }

    #[test]
    fn spawns_then_perfect_hit() {
        let mut s = session();
        s.start();
        assert!(s.update(0).is_empty());
        let events = s.update(0);
        // basic at 120 BPM with a 2000 ms lead: slots 0..=8 are due
        let spawned: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Spawned { track, .. } => Some(*track),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec![0, 0, 1, 0, 1, 2]);

        // first track-0 note reaches the line after the lead time
        assert_eq!(s.submit_hit(0, 2000), Some(HitOutcome::Perfect));
        let stats = s.stats();
        assert_eq!(stats.perfect_hits, 1);
        assert_eq!(stats.score, 330);

        let events = s.update(2000);
        assert!(matches!(
            events.first(),
            Some(SessionEvent::Judged {
                track: 0,
                outcome: HitOutcome::Perfect,
                ..
            })
        ));
    }

    #[test]
    fn first_batch_keeps_rhythm() {
        let mut s = session();
        s.start();
        s.update(0);
        let hits: Vec<_> = s
            .update(0)
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Spawned {
                    track: 0,
                    hit_at_ms,
                    ..
                } => Some(*hit_at_ms),
                _ => None,
            })
            .collect();
        // basic track 0 hits every 1000 ms
        assert_eq!(hits, vec![0, 1000, 2000]);

        let tops: Vec<_> = s
            .falling_notes(1500)
            .iter()
            .filter(|n| n.track == 0)
            .map(|n| n.top)
            .collect();
        assert_eq!(tops.len(), 3);
        assert!(tops[0] > tops[1] && tops[1] > tops[2]);

        // only one note is on the line at 2000
        assert_eq!(s.submit_hit(0, 2000), Some(HitOutcome::Perfect));
        assert_eq!(s.submit_hit(0, 2000), None);
    }

    #[test]
    fn huge_rotate_offset_config() {
        let config: PlayConfig = serde_json::from_str(
            r#"{"laneModifier":{"type":"rotate","offset":18446744073709551615}}"#,
        )
        .unwrap();
        let s = GameSession::new(config, MockTimeProvider::new());
        assert_eq!(s.config().lane_modifier, LaneModifier::Rotate { offset: 3 });
    }

    #[test]
    fn generated_rhythm_plays() {
        let mut s = session();
        s.set_rhythm_type(RhythmType::Quarter).unwrap();
        assert!(s.current_pattern().is_none());
        assert_eq!(s.rhythm_type(), Some(RhythmType::Quarter));
        assert_eq!(s.bpm(), Some(GENERATOR_START_BPM));

        s.start();
        s.update(0);
        let spawned: Vec<_> = s
            .update(0)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Spawned { track, hit_at_ms, .. } => Some((track, hit_at_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec![(0, 2000)]);
        assert_eq!(s.submit_hit(0, 2000), Some(HitOutcome::Perfect));

        assert_eq!(s.set_bpm(90.0), Some(90.0));
        assert_eq!(s.rhythm_type(), Some(RhythmType::Quarter));

        s.select_pattern("eighth").unwrap();
        assert_eq!(s.rhythm_type(), None);
    }

    #[test]
    fn empty_library_generates() {
        let config = PlayConfig {
            rhythm_type: RhythmType::Mixed,
            ..PlayConfig::default()
        };
        let mut s = GameSession::new(config, MockTimeProvider::new());
        s.init(&StaticSource::new(PatternLibrary::new(Vec::new(), None)))
            .unwrap();
        assert!(s.current_pattern().is_none());
        assert_eq!(s.rhythm_type(), Some(RhythmType::Mixed));
    }

    #[test]
    fn empty_track_press_is_noop() {
        let mut s = session();
        s.start();
        s.update(0);
        s.update(0);
        assert_eq!(s.submit_hit(3, 2000), None);
        assert_eq!(s.stats().total_hits, 0);
    }

    #[test]
    fn unhit_notes_are_missed() {
        let mut s = session();
        s.start();
        s.update(0);
        s.update(0);
        let spawned = s.live_note_count();
        let mut missed = 0;
        // well past the zone for the first batch
        for t in (0..=4000).step_by(16) {
            missed += s
                .update(t)
                .iter()
                .filter(|e| matches!(e, SessionEvent::Missed { .. }))
                .count();
        }
        assert!(missed > 0);
        assert!(missed <= spawned + s.event_count());
        assert_eq!(s.stats().miss_hits as usize, missed);
        assert_eq!(s.stats().combo, 0);
    }

    #[test]
    fn set_bpm_clamps_and_clears() {
        let mut s = session();
        s.start();
        s.update(0);
        s.update(0);
        assert!(s.live_note_count() > 0);
        assert_eq!(s.set_bpm(500.0), Some(200.0));
        assert_eq!(s.live_note_count(), 0);
        assert_eq!(s.set_bpm(1.0), Some(40.0));
        assert_eq!(s.set_bpm(f64::NAN), Some(40.0));
    }

    #[test]
    fn select_unknown_keeps_current() {
        let mut s = session();
        assert_eq!(
            s.select_pattern("nope"),
            Err(PatternError::UnknownPatternId("nope".into()))
        );
        assert_eq!(s.current_pattern().unwrap().id, "basic");
        s.select_pattern("eighth").unwrap();
        assert_eq!(s.bpm(), Some(140.0));
    }

    #[test]
    fn broken_pattern_installs_fallback() {
        let broken =
            RhythmPattern::new("broken", "Broken", Difficulty::Hard, 0.0, ["X", "", "", ""]);
        let mut s = GameSession::new(PlayConfig::default(), MockTimeProvider::new());
        s.init(&library_with(broken)).unwrap();
        s.select_pattern("eighth").unwrap();
        let err = s.select_pattern("broken").unwrap_err();
        assert!(err.is_invalid_pattern());
        assert_eq!(s.current_pattern().unwrap().id, "basic");
        assert_eq!(s.store().current().unwrap().id, "basic");
    }

    #[test]
    fn invalid_zone_rejected() {
        let mut s = session();
        let mut zone = JudgeZone::for_screen(720.0);
        zone.perfect_zone_top = 0.0;
        assert!(!s.set_judge_zone(zone));
        assert_eq!(*s.judge_zone(), JudgeZone::for_screen(720.0));
        assert!(s.set_judge_zone(JudgeZone::for_screen(1080.0)));
        assert_eq!(s.judge_zone().perfect_center, 720.0);
    }

    #[test]
    fn reset_and_teardown() {
        let mut s = session();
        s.start();
        s.update(0);
        s.update(0);
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.live_note_count(), 0);
        assert!(s.store().is_loaded());

        s.teardown();
        assert!(!s.store().is_loaded());
        assert!(s.current_pattern().is_none());
        s.start();
        s.update(0);
        assert!(s.update(100).is_empty());

        s.init(&StaticSource::builtin()).unwrap();
        assert_eq!(s.current_pattern().unwrap().id, "basic");
    }

    #[test]
    fn clock_driven_tick_and_press() {
        let clock = MockTimeProvider::new();
        let mut s = GameSession::new(PlayConfig::default(), &clock);
        s.init(&StaticSource::builtin()).unwrap();
        s.start();
        s.tick();
        assert!(!s.tick().is_empty());
        clock.set_time(2000);
        assert_eq!(s.press(0), Some(HitOutcome::Perfect));
    }
}
