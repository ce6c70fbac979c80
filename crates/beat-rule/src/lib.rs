// Hit-zone judgment, falling-note view, score and combo state

mod falling_note;
mod hit_outcome;
mod judge_zone;
mod judgment;
mod score_state;

pub use falling_note::{FallingNote, NoteId};
pub use hit_outcome::HitOutcome;
pub use judge_zone::JudgeZone;
pub use judgment::{DEFAULT_OVERSHOOT_MARGIN, JudgmentEngine};
pub use score_state::{GameStats, MAX_COMBO_MULTIPLIER, ScoreState};

pub use beat_model::TRACK_COUNT;
