use log::debug;

use crate::TRACK_COUNT;
use crate::falling_note::{FallingNote, NoteId};
use crate::hit_outcome::HitOutcome;
use crate::judge_zone::JudgeZone;

/// Distance past the bottom of the zone after which a note counts as missed.
pub const DEFAULT_OVERSHOOT_MARGIN: f32 = 50.0;

/// Stateless judgment over a snapshot of falling notes.
///
/// The engine never mutates notes; callers apply the returned decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgmentEngine {
    pub overshoot_margin: f32,
}

impl Default for JudgmentEngine {
    fn default() -> Self {
        Self::new(DEFAULT_OVERSHOOT_MARGIN)
    }
}

impl JudgmentEngine {
    pub fn new(overshoot_margin: f32) -> Self {
        Self { overshoot_margin }
    }

    /// Pick the note on `track` to judge for an input.
    ///
    /// Candidates are active notes whose extent overlaps the zone. The one
    /// whose center is closest to the judgment line wins; on a tie the
    /// earlier spawn wins.
    pub fn select_best_candidate<'a>(
        &self,
        track: usize,
        notes: &'a [FallingNote],
        zone: &JudgeZone,
    ) -> Option<&'a FallingNote> {
        if track >= TRACK_COUNT {
            return None;
        }
        notes
            .iter()
            .filter(|n| n.active && n.track == track && zone.overlaps(n.top, n.height))
            .min_by(|a, b| {
                let da = (a.center() - zone.perfect_center).abs();
                let db = (b.center() - zone.perfect_center).abs();
                da.total_cmp(&db).then(a.spawn_seq.cmp(&b.spawn_seq))
            })
    }

    /// Classify a note by where its center sits.
    pub fn classify(&self, note: &FallingNote, zone: &JudgeZone) -> HitOutcome {
        let center = note.center();
        if zone.perfect_contains(center) {
            HitOutcome::Perfect
        } else if zone.contains(center) {
            HitOutcome::Good
        } else {
            HitOutcome::Miss
        }
    }

    /// Select and classify in one step. `None` when no note is in reach.
    pub fn judge_input(
        &self,
        track: usize,
        notes: &[FallingNote],
        zone: &JudgeZone,
    ) -> Option<(NoteId, HitOutcome)> {
        let note = self.select_best_candidate(track, notes, zone)?;
        let outcome = self.classify(note, zone);
        debug!(
            "track {} hit note {:?} center {:.1}: {}",
            track,
            note.id,
            note.center(),
            outcome
        );
        Some((note.id, outcome))
    }

    /// Active notes that fell past the zone by more than the margin.
    pub fn sweep_missed(&self, notes: &[FallingNote], zone: &JudgeZone) -> Vec<NoteId> {
        let limit = zone.zone_bottom() + self.overshoot_margin;
        notes
            .iter()
            .filter(|n| n.active && n.top > limit)
            .map(|n| n.id)
            .collect()
    }
}
