use serde::{Deserialize, Serialize};

use crate::hit_outcome::HitOutcome;

/// Upper bound of the combo multiplier.
pub const MAX_COMBO_MULTIPLIER: f64 = 3.0;

/// Multiplier in tenths: 10 + combo, capped at 30.
const MAX_MULTIPLIER_TENTHS: u64 = 30;

/// Score and combo counters for one play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub miss_hits: u32,
}

/// Snapshot handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub miss_hits: u32,
    /// Percentage of non-miss hits, one decimal place
    pub accuracy: f64,
    pub total_hits: u32,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `min(1 + combo * 0.1, 3.0)`; reaches the cap at combo 20.
    pub fn combo_multiplier(combo: u32) -> f64 {
        Self::multiplier_tenths(combo) as f64 / 10.0
    }

    fn multiplier_tenths(combo: u32) -> u64 {
        (10 + u64::from(combo)).min(MAX_MULTIPLIER_TENTHS)
    }

    /// Points a hit is worth at `combo`, the combo including this hit.
    pub fn points_for(outcome: HitOutcome, combo: u32) -> u64 {
        outcome.base_points() * Self::multiplier_tenths(combo) / 10
    }

    pub fn record_hit(&mut self, outcome: HitOutcome) {
        match outcome {
            HitOutcome::Perfect => {
                self.combo += 1;
                self.score += Self::points_for(outcome, self.combo);
                self.perfect_hits += 1;
            }
            HitOutcome::Good => {
                self.combo += 1;
                self.score += Self::points_for(outcome, self.combo);
                self.good_hits += 1;
            }
            HitOutcome::Miss => {
                self.combo = 0;
                self.miss_hits += 1;
            }
        }

        self.max_combo = self.max_combo.max(self.combo);
    }

    pub fn total_hits(&self) -> u32 {
        self.perfect_hits + self.good_hits + self.miss_hits
    }

    /// Percentage of non-miss hits rounded to one decimal. 0 before any hit.
    pub fn accuracy(&self) -> f64 {
        let total = self.total_hits();
        if total == 0 {
            return 0.0;
        }
        let pct = f64::from(self.perfect_hits + self.good_hits) / f64::from(total) * 100.0;
        (pct * 10.0).round() / 10.0
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            score: self.score,
            combo: self.combo,
            max_combo: self.max_combo,
            perfect_hits: self.perfect_hits,
            good_hits: self.good_hits,
            miss_hits: self.miss_hits,
            accuracy: self.accuracy(),
            total_hits: self.total_hits(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
